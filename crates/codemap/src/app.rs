use crate::camera::{Camera, handle_zoom};
use crate::config::AppConfig;
use crate::file_backend::JsonFileBackend;
use codegraph::highlight::{Emphasis, NodeOverlay, node_overlays};
use codegraph::model::CODE_NODE_SIZE;
use codegraph::scan::EntryKind;
use codegraph::settings::SPACING_RANGE;
use codegraph::{
    Action, AnnotationEdit, Backend, EdgeKind, FileTree, GraphNode, GraphStore,
    NavKey, NodeKind, Point, Size, State, Tag,
};
use eframe::egui::{self, Color32, FontId, Pos2, Sense, Stroke, Vec2};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

// UI Constants
const LABEL_FONT_SIZE: f32 = 14.0;
const NODE_PADDING: f32 = 12.0;
const NODE_ROUNDING: f32 = 6.0;
const COMMENT_EDITOR_WIDTH: f32 = 200.0;
const SOURCE_EXTENSIONS: &[&str] = &["py", "m", "cpp", "h"];

fn palette(c: colorous::Color) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

fn kind_color(kind: NodeKind) -> Color32 {
    let i = match kind {
        NodeKind::File => 7,
        NodeKind::Class => 0,
        NodeKind::Method => 9,
        NodeKind::Function => 4,
        NodeKind::Comment => 5,
    };
    palette(colorous::TABLEAU10[i])
}

fn tag_color(tag: Tag) -> Color32 {
    match tag {
        Tag::None => Color32::from_gray(90),
        Tag::Todo => palette(colorous::SET2[5]),
        Tag::Bug => palette(colorous::SET2[1]),
        Tag::Refactor => palette(colorous::SET2[2]),
        Tag::Review => palette(colorous::SET2[3]),
        Tag::Done => palette(colorous::SET2[0]),
    }
}

fn emphasis_stroke(emphasis: Emphasis) -> Stroke {
    match emphasis {
        Emphasis::Component => Stroke::new(3.0, Color32::from_rgb(80, 220, 120)),
        Emphasis::CurrentMatch => Stroke::new(3.0, Color32::from_rgb(255, 150, 40)),
        Emphasis::Match => Stroke::new(2.0, Color32::from_rgb(240, 210, 90)),
        Emphasis::None | Emphasis::Dimmed => Stroke::new(1.0, Color32::from_gray(40)),
    }
}

/// Text and title being typed into a comment editor. `seen_*` hold the
/// store values the draft was last synced from.
#[derive(Debug, Clone, Default)]
struct CommentDraft {
    title: String,
    text: String,
    seen_title: String,
    seen_text: String,
}

impl CommentDraft {
    fn sync(&mut self, title: &str, text: &str) {
        if self.seen_title != title {
            self.title = title.to_string();
            self.seen_title = title.to_string();
        }
        if self.seen_text != text {
            self.text = text.to_string();
            self.seen_text = text.to_string();
        }
    }
}

enum CanvasDrag {
    Node(String),
    Pan,
}

pub struct CodeMapApp {
    state: State<JsonFileBackend>,
    camera: Camera,
    config: AppConfig,
    file_tree: Option<FileTree>,
    query: String,
    drafts: HashMap<String, CommentDraft>,
    drag: Option<CanvasDrag>,
}

impl CodeMapApp {
    pub fn new(config: AppConfig, initial_file: Option<PathBuf>) -> Self {
        let store = GraphStore::new(config.builder_settings(), config.layout);
        let backend = JsonFileBackend::new(config.project_root.clone());
        let mut state = State::new(store, backend)
            .with_rescan_interval(config.rescan_interval());

        let file_tree = config.project_root.as_deref().and_then(|root| {
            match state.backend_mut().scan_folder(root) {
                Ok(tree) => Some(tree),
                Err(e) => {
                    log::warn!("cannot list {}: {e}", root.display());
                    None
                }
            }
        });

        if let Some(path) = initial_file {
            state.dispatch(Action::OpenFile {
                path,
                project_root: config.project_root.clone(),
            });
        }

        Self {
            state,
            camera: Camera::default(),
            config,
            file_tree,
            query: String::new(),
            drafts: HashMap::new(),
            drag: None,
        }
    }

    fn open_file(&self, path: PathBuf, actions: &mut Vec<Action>) {
        actions.push(Action::OpenFile {
            path,
            project_root: self.config.project_root.clone(),
        });
    }

    fn open_folder(&mut self, folder: PathBuf, actions: &mut Vec<Action>) {
        match self.state.backend_mut().scan_folder(&folder) {
            Ok(tree) => {
                self.file_tree = Some(tree);
                self.config.project_root = Some(folder);
            }
            Err(e) => actions.push(Action::ScanFailed {
                path: folder,
                message: e.to_string(),
            }),
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open file…").clicked() {
                        ui.close();
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Source", SOURCE_EXTENSIONS)
                            .pick_file()
                        {
                            self.open_file(path, actions);
                        }
                    }

                    if ui.button("Open folder…").clicked() {
                        ui.close();
                        if let Some(folder) = rfd::FileDialog::new().pick_folder() {
                            self.open_folder(folder, actions);
                        }
                    }
                });
            });
        });
    }

    fn toolbar(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let store = &self.state.store;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let search = ui.add(
                    egui::TextEdit::singleline(&mut self.query)
                        .hint_text("Search nodes")
                        .desired_width(220.0),
                );
                if search.changed() {
                    actions.push(Action::SetQuery {
                        query: self.query.clone(),
                    });
                }

                let (down, up, enter, escape) = ui.input(|i| {
                    (
                        i.key_pressed(egui::Key::ArrowDown),
                        i.key_pressed(egui::Key::ArrowUp),
                        i.key_pressed(egui::Key::Enter),
                        i.key_pressed(egui::Key::Escape),
                    )
                });
                if search.has_focus() {
                    if down {
                        actions.push(Action::KeyPressed { key: NavKey::Down });
                    }
                    if up {
                        actions.push(Action::KeyPressed { key: NavKey::Up });
                    }
                }
                // Enter ends a single-line edit; keep the field focused.
                if search.lost_focus() && enter {
                    actions.push(Action::KeyPressed { key: NavKey::Enter });
                    search.request_focus();
                }
                if escape {
                    self.query.clear();
                    actions.push(Action::KeyPressed {
                        key: NavKey::Escape,
                    });
                }

                let count = store.search.matches(store.nodes()).len();
                if store.search.is_active() {
                    let current = store.search.current_index(count).map_or(0, |i| i + 1);
                    ui.label(format!("{current}/{count}"));
                }

                ui.separator();
                if ui.button("Clean workspace").clicked() {
                    actions.push(Action::CleanWorkspace);
                }
                let can_rescan = store.source_path.is_some();
                if ui
                    .add_enabled(can_rescan, egui::Button::new("Rescan"))
                    .clicked()
                {
                    actions.push(Action::Rescan);
                }

                let mut auto_update = store.auto_update;
                if ui.checkbox(&mut auto_update, "Auto-update").changed() {
                    actions.push(Action::SetAutoUpdate {
                        enabled: auto_update,
                    });
                }

                let mut spacing = store.builder_settings.spacing;
                let slider = ui.add(
                    egui::Slider::new(
                        &mut spacing,
                        SPACING_RANGE.min..=SPACING_RANGE.max,
                    )
                    .step_by(SPACING_RANGE.step as f64)
                    .text("Spacing"),
                );
                if slider.changed() {
                    actions.push(Action::SetSpacing { spacing });
                }
                // Rebuild once the value settles, not on every drag step.
                let settled = slider.drag_stopped() || (slider.changed() && !slider.dragged());
                if settled && can_rescan {
                    actions.push(Action::Rescan);
                }
            });
        });
    }

    fn file_tree_panel(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let Some(tree) = &self.file_tree else {
            return;
        };
        let current = self.state.store.source_path.clone();
        let mut picked = None;
        egui::SidePanel::left("file_tree")
            .default_width(220.0)
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(8.0))
            .show(ctx, |ui| {
                ui.heading("Files");
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    file_tree_ui(ui, tree, current.as_deref(), &mut picked);
                });
            });
        if let Some(path) = picked {
            self.open_file(path, actions);
        }
    }

    fn signature_panel(&self, ctx: &egui::Context) {
        let store = &self.state.store;
        egui::TopBottomPanel::bottom("signature").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&store.display_name).strong());
                ui.separator();
                match &store.active_signature {
                    Some(signature) => {
                        ui.label(egui::RichText::new(signature).monospace());
                    }
                    None => {
                        ui.weak("Click a node to see its signature");
                    }
                }
            });
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        self.camera.set_viewport(rect);
        painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);
        handle_zoom(ui, &response, &mut self.camera);
        self.pointer_input(ui, &response, actions);

        let store = &self.state.store;

        let font = FontId::proportional(LABEL_FONT_SIZE);
        let sizes: Vec<(String, Size)> = store
            .nodes()
            .iter()
            .filter(|n| n.size.is_none() && !n.kind.is_comment())
            .map(|n| {
                let galley =
                    painter.layout_no_wrap(n.label.clone(), font.clone(), Color32::WHITE);
                let width = (galley.size().x + 2.0 * NODE_PADDING)
                    .max(CODE_NODE_SIZE.width);
                (n.id.clone(), Size::new(width, CODE_NODE_SIZE.height))
            })
            .collect();
        if !sizes.is_empty() {
            actions.push(Action::NodesMeasured { sizes });
        }

        let overlays = node_overlays(store);
        let index: HashMap<&str, usize> = store
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        draw_edges(&painter, &self.camera, store, &overlays, &index);
        for (node, overlay) in store.nodes().iter().zip(&overlays) {
            if !node.kind.is_comment() {
                draw_code_node(&painter, &self.camera, node, overlay);
            }
        }

        self.comment_editors(ui.ctx(), &overlays, actions);
    }

    fn pointer_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        actions: &mut Vec<Action>,
    ) {
        let store = &self.state.store;
        let hit = response
            .interact_pointer_pos()
            .and_then(|pos| code_node_at(store, &self.camera, pos))
            .map(|n| n.id.clone());

        if response.clicked() {
            actions.push(match hit.clone() {
                Some(id) => Action::NodeClicked {
                    id,
                    at: Instant::now(),
                },
                None => Action::CanvasClicked,
            });
        }
        if response.double_clicked()
            && let Some(id) = hit.clone()
        {
            actions.push(Action::NativeDoubleClick { id });
        }
        if response.secondary_clicked()
            && let Some(parent_id) = hit
        {
            actions.push(Action::CreateAnnotation { parent_id });
        }

        if response.drag_started() {
            let origin = ui.input(|i| i.pointer.press_origin());
            self.drag = Some(
                match origin.and_then(|pos| code_node_at(store, &self.camera, pos)) {
                    Some(node) => CanvasDrag::Node(node.id.clone()),
                    None => CanvasDrag::Pan,
                },
            );
        }
        if response.dragged() {
            let delta = response.drag_delta();
            match &self.drag {
                Some(CanvasDrag::Node(id)) => {
                    if let Some(node) = store.node(id) {
                        actions.push(Action::MoveNode {
                            id: id.clone(),
                            position: offset(node.position, delta / self.camera.zoom()),
                        });
                    }
                }
                _ => self.camera.pan_by(delta),
            }
        }
        if response.drag_stopped() {
            self.drag = None;
        }
    }

    fn comment_editors(
        &mut self,
        ctx: &egui::Context,
        overlays: &[NodeOverlay],
        actions: &mut Vec<Action>,
    ) {
        let store = &self.state.store;
        self.drafts.retain(|id, _| store.contains(id));
        let zoom = self.camera.zoom();

        for (node, overlay) in store.nodes().iter().zip(overlays) {
            let Some(meta) = node.comment() else {
                continue;
            };
            if !self.camera.is_visible(node.position, node.footprint()) {
                continue;
            }
            let screen = self.camera.to_screen(node.position);
            let draft = self.drafts.entry(node.id.clone()).or_default();
            draft.sync(&meta.title, &node.label);

            let fill = tag_color(meta.tag).gamma_multiply(overlay.opacity);
            let area = egui::Area::new(egui::Id::new(("comment", &node.id)))
                .fixed_pos(screen)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style())
                        .fill(ui.visuals().panel_fill.gamma_multiply(overlay.opacity))
                        .stroke(Stroke::new(2.0, fill))
                        .show(ui, |ui| {
                            ui.set_width(COMMENT_EDITOR_WIDTH);
                            ui.horizontal(|ui| {
                                let handle = ui.add(
                                    egui::Label::new("⠿").sense(Sense::drag()),
                                );
                                if handle.dragged() {
                                    actions.push(Action::MoveNode {
                                        id: node.id.clone(),
                                        position: offset(
                                            node.position,
                                            handle.drag_delta() / zoom,
                                        ),
                                    });
                                }

                                let title = ui.add(
                                    egui::TextEdit::singleline(&mut draft.title)
                                        .hint_text("Title")
                                        .desired_width(90.0),
                                );
                                if title.lost_focus() {
                                    actions.push(Action::CommitAnnotation {
                                        id: node.id.clone(),
                                        edit: AnnotationEdit::Title(draft.title.clone()),
                                    });
                                }

                                ui.menu_button(meta.tag.as_str(), |ui| {
                                    for tag in Tag::ALL {
                                        let label = egui::RichText::new(tag.as_str())
                                            .color(tag_color(tag));
                                        if ui.button(label).clicked() {
                                            actions.push(Action::CommitAnnotation {
                                                id: node.id.clone(),
                                                edit: AnnotationEdit::Tag(tag),
                                            });
                                            ui.close();
                                        }
                                    }
                                });

                                if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                                    actions.push(Action::DeleteAnnotation {
                                        id: node.id.clone(),
                                    });
                                }
                            });

                            let text = ui.add(
                                egui::TextEdit::multiline(&mut draft.text)
                                    .hint_text("Comment")
                                    .desired_rows(2)
                                    .desired_width(f32::INFINITY),
                            );
                            if meta.is_new && ctx.memory(|m| m.focused().is_none()) {
                                text.request_focus();
                            }
                            if text.lost_focus() {
                                actions.push(Action::CommitAnnotation {
                                    id: node.id.clone(),
                                    edit: AnnotationEdit::Text(draft.text.clone()),
                                });
                            }
                        });
                });

            let measured = area.response.rect.size() / zoom;
            let current = node.footprint();
            if (measured.x - current.width).abs() > 2.0
                || (measured.y - current.height).abs() > 2.0
            {
                actions.push(Action::NodesMeasured {
                    sizes: vec![(node.id.clone(), Size::new(measured.x, measured.y))],
                });
            }
        }
    }

    fn source_window(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let Some(view) = &self.state.store.source_view else {
            return;
        };
        let mut open = true;
        egui::Window::new(format!("Source: {}", view.label))
            .open(&mut open)
            .default_size([600.0, 400.0])
            .show(ctx, |ui| {
                egui::ScrollArea::both().show(ui, |ui| {
                    ui.add(
                        egui::Label::new(egui::RichText::new(&view.code).monospace())
                            .extend(),
                    );
                });
            });
        if !open {
            actions.push(Action::CloseSourceView);
        }
    }

    fn notification_window(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        if let Some(message) = &self.state.store.notification {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        actions.push(Action::ClearNotification);
                    }
                });
        }
    }
}

impl eframe::App for CodeMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let mut actions = Vec::new();

        self.menu_bar(ctx, &mut actions);
        self.toolbar(ctx, &mut actions);
        self.signature_panel(ctx);
        self.file_tree_panel(ctx, &mut actions);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.canvas(ui, &mut actions));
        self.source_window(ctx, &mut actions);
        self.notification_window(ctx, &mut actions);

        for action in actions {
            self.state.dispatch(action);
        }
        self.state.tick(now);
        self.state.process(&mut self.camera);

        let dt = ctx.input(|i| i.stable_dt);
        if self.camera.animate(dt) {
            ctx.request_repaint();
        }
        if let Some(wakeup) = self.state.next_wakeup() {
            ctx.request_repaint_after(wakeup.saturating_duration_since(now));
        }
    }
}

fn offset(point: Point, delta: Vec2) -> Point {
    Point::new(point.x + delta.x, point.y + delta.y)
}

/// Topmost code node under a screen position. Comments are egui areas and
/// take their own input.
fn code_node_at<'a>(
    store: &'a GraphStore,
    camera: &Camera,
    pos: Pos2,
) -> Option<&'a GraphNode> {
    store
        .nodes()
        .iter()
        .rev()
        .filter(|n| !n.kind.is_comment())
        .find(|n| camera.screen_rect(n.position, n.footprint()).contains(pos))
}

fn draw_code_node(
    painter: &egui::Painter,
    camera: &Camera,
    node: &GraphNode,
    overlay: &NodeOverlay,
) {
    let rect = camera.screen_rect(node.position, node.footprint());
    let fill = kind_color(node.kind).gamma_multiply(overlay.opacity);
    let stroke = emphasis_stroke(overlay.emphasis);
    let stroke = Stroke::new(stroke.width, stroke.color.gamma_multiply(overlay.opacity));
    painter.rect(
        rect,
        NODE_ROUNDING * camera.zoom(),
        fill,
        stroke,
        egui::StrokeKind::Outside,
    );
    if camera.zoom() > 0.25 {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            &node.label,
            FontId::proportional(LABEL_FONT_SIZE * camera.zoom()),
            Color32::WHITE.gamma_multiply(overlay.opacity),
        );
    }
}

fn draw_edges(
    painter: &egui::Painter,
    camera: &Camera,
    store: &GraphStore,
    overlays: &[NodeOverlay],
    index: &HashMap<&str, usize>,
) {
    let nodes = store.nodes();
    for edge in store.edges() {
        let (Some(&s), Some(&t)) =
            (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
        else {
            continue;
        };
        let (source, target) = (&nodes[s], &nodes[t]);
        let opacity = overlays[s].opacity.min(overlays[t].opacity);

        let source_rect = camera.screen_rect(source.position, source.footprint());
        let target_rect = camera.screen_rect(target.position, target.footprint());
        let (from, to) = if source_rect.right() <= target_rect.left() {
            (source_rect.right_center(), target_rect.left_center())
        } else {
            (source_rect.center(), target_rect.center())
        };

        let (color, width) = match edge.kind {
            EdgeKind::Containment => (Color32::from_gray(150), 1.5),
            EdgeKind::Reference => (Color32::from_gray(110), 1.0),
            EdgeKind::CallDependency => (Color32::from_rgb(110, 160, 255), 1.5),
            EdgeKind::AnnotationLink => (tag_color(Tag::Todo), 1.0),
        };
        let stroke = Stroke::new(width, color.gamma_multiply(opacity));
        match edge.kind {
            EdgeKind::CallDependency => painter.arrow(from, to - from, stroke),
            EdgeKind::AnnotationLink | EdgeKind::Reference => {
                painter.extend(egui::Shape::dashed_line(&[from, to], stroke, 6.0, 4.0));
            }
            EdgeKind::Containment => {
                painter.line_segment([from, to], stroke);
            }
        }
    }
}

fn file_tree_ui(
    ui: &mut egui::Ui,
    tree: &FileTree,
    current: Option<&std::path::Path>,
    picked: &mut Option<PathBuf>,
) {
    match tree.kind {
        EntryKind::Folder => {
            egui::CollapsingHeader::new(&tree.name)
                .id_salt(&tree.path)
                .default_open(current.is_some_and(|c| c.starts_with(&tree.path)))
                .show(ui, |ui| {
                    for child in &tree.children {
                        file_tree_ui(ui, child, current, picked);
                    }
                });
        }
        EntryKind::File => {
            let selected = current == Some(tree.path.as_path());
            if ui.selectable_label(selected, &tree.name).clicked() {
                *picked = Some(tree.path.clone());
            }
        }
    }
}
