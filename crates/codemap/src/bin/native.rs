fn main() -> eframe::Result<()> {
    codemap::native::run()
}
