use codegraph::{Bounds, Point, Viewport};
use eframe::egui::{self, Pos2, Rect, Vec2};

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 4.0;
/// Exponential approach rate of animated moves, per second.
const EASING_RATE: f32 = 10.0;
const SETTLE_EPSILON: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct View {
    zoom: f32,
    /// Screen offset of the graph origin from the viewport centre.
    pan: Vec2,
}

/// Pan/zoom transform between graph space and the canvas.
#[derive(Debug, Clone)]
pub struct Camera {
    view: View,
    target: Option<View>,
    viewport: Rect,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: View {
                zoom: 1.0,
                pan: Vec2::ZERO,
            },
            target: None,
            viewport: Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        }
    }
}

impl Camera {
    pub fn zoom(&self) -> f32 {
        self.view.zoom
    }

    /// Called every frame with the canvas rect.
    pub fn set_viewport(&mut self, rect: Rect) {
        self.viewport = rect;
    }

    pub fn to_screen(&self, point: Point) -> Pos2 {
        self.viewport.center()
            + self.view.pan
            + Vec2::new(point.x, point.y) * self.view.zoom
    }

    pub fn to_graph(&self, pos: Pos2) -> Point {
        let offset = pos - self.viewport.center() - self.view.pan;
        Point::new(offset.x / self.view.zoom, offset.y / self.view.zoom)
    }

    pub fn screen_rect(&self, min: Point, size: codegraph::Size) -> Rect {
        Rect::from_min_size(
            self.to_screen(min),
            Vec2::new(size.width, size.height) * self.view.zoom,
        )
    }

    /// True when any part of the footprint falls inside the viewport.
    pub fn is_visible(&self, min: Point, size: codegraph::Size) -> bool {
        self.screen_rect(min, size).intersects(self.viewport)
    }

    /// Manual pan; cancels any running animation.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.target = None;
        self.view.pan += delta;
    }

    /// Zoom keeping the graph point under `anchor` fixed.
    pub fn zoom_around(&mut self, factor: f32, anchor: Pos2) {
        self.target = None;
        let under = self.to_graph(anchor);
        self.view.zoom = (self.view.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let moved = self.to_screen(under);
        self.view.pan += anchor - moved;
    }

    /// Advance a running animation. Returns true while still moving.
    pub fn animate(&mut self, dt: f32) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let t = 1.0 - (-dt * EASING_RATE).exp();
        self.view.zoom += (target.zoom - self.view.zoom) * t;
        self.view.pan += (target.pan - self.view.pan) * t;

        let settled = (target.pan - self.view.pan).length() < SETTLE_EPSILON
            && (target.zoom - self.view.zoom).abs() < 1e-3;
        if settled {
            self.view = target;
            self.target = None;
        }
        !settled
    }

    fn move_to(&mut self, view: View, animate: bool) {
        if animate {
            self.target = Some(view);
        } else {
            self.view = view;
            self.target = None;
        }
    }
}

impl Viewport for Camera {
    fn fit_bounds(&mut self, bounds: Bounds, padding: f32, animate: bool) {
        let free = (1.0 - padding).clamp(0.1, 1.0);
        let available = self.viewport.size() * free;
        let width = bounds.width().max(1.0);
        let height = bounds.height().max(1.0);
        let zoom = (available.x / width)
            .min(available.y / height)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        let center = bounds.center();
        let view = View {
            zoom,
            pan: -Vec2::new(center.x, center.y) * zoom,
        };
        self.move_to(view, animate);
    }

    fn center_on(&mut self, point: Point, zoom: f32, animate: bool) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let view = View {
            zoom,
            pan: -Vec2::new(point.x, point.y) * zoom,
        };
        self.move_to(view, animate);
    }
}

/// Scroll and pinch input over the canvas.
pub fn handle_zoom(ui: &egui::Ui, response: &egui::Response, camera: &mut Camera) {
    if !response.hovered() {
        return;
    }
    let (zoom_delta, scroll, pointer) =
        ui.input(|i| (i.zoom_delta(), i.smooth_scroll_delta, i.pointer.hover_pos()));
    let Some(pointer) = pointer else {
        return;
    };
    if (zoom_delta - 1.0).abs() > f32::EPSILON {
        camera.zoom_around(zoom_delta, pointer);
    } else if scroll.y.abs() > f32::EPSILON {
        camera.zoom_around((scroll.y * 0.002).exp(), pointer);
    }
}
