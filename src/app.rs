use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

use crate::atlas::{Atlas, AtlasEvent};
use crate::globe::{self, PinHit, Rotation, Star, SURFACE_SIZE};
use crate::places;

const KEY_SPIN_NUDGE: f64 = 0.01;
const KEY_TILT_NUDGE: f64 = 0.05;

/// Cell region of the terminal the globe surface is mapped onto. Written
/// back by the renderer each frame so mouse coordinates can be translated
/// into surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x
            && column < self.x + self.width
            && row >= self.y
            && row < self.y + self.height
    }

    pub fn cell_to_surface(&self, column: u16, row: u16) -> (f64, f64) {
        let sx = (column as f64 - self.x as f64 + 0.5) * SURFACE_SIZE / self.width as f64;
        let sy = (row as f64 - self.y as f64 + 0.5) * SURFACE_SIZE / self.height as f64;
        (sx, sy)
    }

    pub fn surface_to_cell(&self, sx: f64, sy: f64) -> Option<(u16, u16)> {
        if !(0.0..SURFACE_SIZE).contains(&sx) || !(0.0..SURFACE_SIZE).contains(&sy) {
            return None;
        }
        let column = self.x + (sx * self.width as f64 / SURFACE_SIZE) as u16;
        let row = self.y + (sy * self.height as f64 / SURFACE_SIZE) as u16;
        Some((column.min(self.x + self.width - 1), row.min(self.y + self.height - 1)))
    }
}

pub struct App {
    pub should_quit: bool,
    pub rotation: Rotation,
    pub dragging: bool,
    drag_last_x: f64,
    pub velocity: f64,
    pub pointer: Option<(f64, f64)>,
    pub atlas: Atlas,
    pub stars: Vec<Star>,
    pub tick_count: u64,
    pub viewport: Option<Viewport>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            rotation: Rotation::default(),
            dragging: false,
            drag_last_x: 0.0,
            velocity: 0.0,
            pointer: None,
            atlas: Atlas::default(),
            stars: globe::scatter_stars(globe::STAR_COUNT, &mut rand::thread_rng()),
            tick_count: 0,
            viewport: None,
        }
    }

    /// Advance one frame: constant auto-spin plus the inertial velocity,
    /// then friction. The velocity shrinks geometrically and never lands
    /// exactly on zero.
    pub fn tick(&mut self) {
        self.rotation.spin += globe::AUTO_SPIN + self.velocity;
        self.velocity *= globe::FRICTION;
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left => self.velocity -= KEY_SPIN_NUDGE,
            KeyCode::Right => self.velocity += KEY_SPIN_NUDGE,
            KeyCode::Up => self.rotation.tilt -= KEY_TILT_NUDGE,
            KeyCode::Down => self.rotation.tilt += KEY_TILT_NUDGE,
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some(viewport) = self.viewport else {
            return;
        };
        let inside = viewport.contains(mouse.column, mouse.row);
        let (sx, sy) = viewport.cell_to_surface(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if inside => self.pointer_down(sx, sy),
            // Drags keep steering the globe even once the pointer leaves
            // the viewport, matching how a grab should feel.
            MouseEventKind::Drag(MouseButton::Left) => self.pointer_drag(sx, sy),
            MouseEventKind::Up(MouseButton::Left) => self.pointer_up(),
            MouseEventKind::Moved => {
                if inside {
                    self.pointer_moved(sx, sy);
                } else {
                    self.pointer = None;
                }
            }
            _ => {}
        }
    }

    pub fn pointer_down(&mut self, sx: f64, sy: f64) {
        self.dragging = true;
        self.drag_last_x = sx;
        self.velocity = 0.0;
        self.pointer = Some((sx, sy));
    }

    pub fn pointer_drag(&mut self, sx: f64, sy: f64) {
        if !self.dragging {
            return;
        }
        let delta = sx - self.drag_last_x;
        self.velocity = -delta * globe::DRAG_SENSITIVITY;
        self.rotation.spin += self.velocity;
        self.drag_last_x = sx;
        self.pointer = Some((sx, sy));
    }

    pub fn pointer_up(&mut self) {
        // Velocity is retained so the spin coasts and decays.
        self.dragging = false;
    }

    pub fn pointer_moved(&mut self, sx: f64, sy: f64) {
        self.pointer = Some((sx, sy));
    }

    pub fn handle_atlas_event(&mut self, event: AtlasEvent) {
        match event {
            AtlasEvent::Loaded(rings) => self.atlas = Atlas::Ready(rings),
            AtlasEvent::Failed(_) => self.atlas = Atlas::Failed,
        }
    }

    /// The pin under the pointer this frame, if any. Suppressed while a
    /// drag is in progress.
    pub fn hover(&self) -> Option<PinHit> {
        if self.dragging {
            return None;
        }
        globe::hover_pick(&places::VISITED, self.rotation, self.pointer?)
    }
}
