/// Interactive terminal viewer: fly the camera, pick objects, drag them with the gizmo
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute, queue, terminal,
};
use nalgebra::{Point3, Vector3};
use pp3d_core::{
    geometry::Color, Camera, Gizmo, Handle, ObjectId, Projection, Ray, Scene, SharedSelection, ViewerConfig,
    Viewport,
};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub mod renderer;

pub use renderer::{AsciiRenderer, PIXELS_PER_ROW};

/// Apparent gizmo arm length in screen pixels
const GIZMO_PIXELS: f64 = 14.0;

/// Degrees of orbit per key press
const ORBIT_STEP: f64 = 5.0;

struct Drag {
    handle: Handle,
    /// Object location minus the grabbed point
    grab_offset: Vector3<f64>,
}

/// Main application struct for the terminal viewer
pub struct TerminalApp {
    config: ViewerConfig,
    scene: Scene,
    camera: Camera,
    projection: Projection,
    selection: SharedSelection,
    renderer: AsciiRenderer,
    pivot: Point3<f64>,
    drag: Option<Drag>,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

/// Projection viewport for a terminal of `columns` x `rows` cells
pub fn viewport_for(columns: u16, rows: u16) -> Result<Viewport> {
    let height = (f64::from(rows.max(1)) * PIXELS_PER_ROW) as u32;
    Ok(Viewport::new(u32::from(columns), height)?)
}

/// `projection` rebuilt for a terminal of `columns` x `rows` cells
pub fn resized_projection(projection: &Projection, columns: u16, rows: u16) -> Result<Projection> {
    Ok(projection.rebuild_for(viewport_for(columns, rows)?)?)
}

impl TerminalApp {
    pub fn new(config: ViewerConfig, scene: Scene) -> Result<Self> {
        let (columns, rows) = terminal::size().context("querying terminal size")?;
        let (camera, projection) = config
            .build(viewport_for(columns, rows)?)
            .context("building camera and projection")?;

        Ok(Self {
            config,
            scene,
            camera,
            projection,
            selection: SharedSelection::new(),
            renderer: AsciiRenderer::new(columns as usize, rows as usize),
            pivot: Point3::origin(),
            drag: None,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Drain pending input before drawing
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event)?;
            }

            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => self.resize(columns, rows),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, KeyEvent { code, .. }: KeyEvent) {
        let speed = self.config.move_speed;
        let turn = self.config.turn_speed;

        self.camera = match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                return;
            }
            KeyCode::Char('w') => self.camera.move_forward(speed),
            KeyCode::Char('s') => self.camera.move_forward(-speed),
            KeyCode::Char('a') => self.camera.move_left(speed),
            KeyCode::Char('d') => self.camera.move_left(-speed),
            KeyCode::Char(' ') => self.camera.move_up_world(speed),
            KeyCode::Char('c') => self.camera.move_up_world(-speed),
            KeyCode::Char('e') => self.camera.move_up(speed),
            KeyCode::Char('x') => self.camera.move_up(-speed),
            KeyCode::Left => self.camera.turn(-turn),
            KeyCode::Right => self.camera.turn(turn),
            KeyCode::Up => self.camera.pitch(turn),
            KeyCode::Down => self.camera.pitch(-turn),
            KeyCode::Char('j') => self.camera.orbit_around_point(&self.pivot, -ORBIT_STEP, 0.0),
            KeyCode::Char('l') => self.camera.orbit_around_point(&self.pivot, ORBIT_STEP, 0.0),
            KeyCode::Char('i') => self.camera.orbit_around_point(&self.pivot, 0.0, ORBIT_STEP),
            KeyCode::Char('k') => self.camera.orbit_around_point(&self.pivot, 0.0, -ORBIT_STEP),
            KeyCode::Char('L') => self.look_at_pivot(),
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.focus_selection();
                self.look_at_pivot()
            }
            KeyCode::Char('0') => self.camera.set_yaw_and_pitch(0.0, 0.0),
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.toggle_projection();
                return;
            }
            _ => return,
        };
    }

    fn look_at_pivot(&self) -> Camera {
        match self.camera.look_at(&self.pivot) {
            Ok(camera) => camera,
            Err(err) => {
                warn!(%err, "cannot look at pivot");
                self.camera
            }
        }
    }

    /// Makes the selected object the orbit pivot.
    fn focus_selection(&mut self) {
        let selected = self.selection.snapshot().selected;
        if let Some(object) = selected.and_then(|id| self.scene.get(id)) {
            self.pivot = object.location();
            debug!(id = %object.id(), "focused");
        }
    }

    fn toggle_projection(&mut self) {
        let config = self.projection.config().toggled();
        match config.build(self.projection.viewport()) {
            Ok(projection) => {
                info!(mode = ?projection.mode(), "projection switched");
                self.config.projection = config;
                self.projection = projection;
            }
            Err(err) => warn!(%err, "projection switch rejected"),
        }
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        match resized_projection(&self.projection, columns, rows) {
            Ok(projection) => {
                self.projection = projection;
                self.renderer = AsciiRenderer::new(columns as usize, rows as usize);
            }
            Err(err) => warn!(%err, columns, rows, "resize ignored; keeping previous projection"),
        }
    }

    /// Ray through the center of a terminal cell
    fn ray_at(&self, column: u16, row: u16) -> Option<Ray> {
        let x = f64::from(column) + 0.5;
        let y = (f64::from(row) + 0.5) * PIXELS_PER_ROW;
        self.projection.screen_to_ray(&self.camera, x, y)
    }

    fn gizmo_for(&self, id: ObjectId) -> Option<Gizmo> {
        let location = self.scene.get(id)?.location();
        let multiplier = self.projection.projected_size_multiplier(&self.camera, &location);
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return None;
        }
        Some(Gizmo::new(location, GIZMO_PIXELS / multiplier))
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        let Some(ray) = self.ray_at(column, row) else {
            return;
        };

        match kind {
            MouseEventKind::Moved => {
                let hovered = self.scene.pick(&ray);
                self.selection.update(|s| s.hovered = hovered);
            }
            MouseEventKind::Down(MouseButton::Left) => self.press(&ray),
            MouseEventKind::Drag(MouseButton::Left) => self.drag_to(&ray),
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag = None;
                self.selection.update(|s| s.active_handle = None);
            }
            _ => {}
        }
    }

    /// Starts a gizmo drag when a handle is hit, otherwise (de)selects.
    fn press(&mut self, ray: &Ray) {
        let selected = self.selection.snapshot().selected;

        if let Some((id, gizmo)) = selected.and_then(|id| Some((id, self.gizmo_for(id)?))) {
            if let Some(handle) = gizmo.pick_handle(ray) {
                let grabbed = gizmo.drag_point(ray, handle, &self.camera.forward());
                if let (Some(point), Some(object)) = (grabbed, self.scene.get(id)) {
                    self.drag = Some(Drag {
                        handle,
                        grab_offset: object.location() - point,
                    });
                    self.selection.update(|s| s.active_handle = Some(handle));
                    debug!(?handle, %id, "drag started");
                    return;
                }
            }
        }

        let picked = self.scene.pick(ray);
        self.drag = None;
        self.selection.update(|s| s.select(picked));
        info!(?picked, "selection changed");
    }

    fn drag_to(&mut self, ray: &Ray) {
        let Some(drag) = &self.drag else {
            return;
        };
        let Some(id) = self.selection.snapshot().selected else {
            return;
        };
        let Some(gizmo) = self.gizmo_for(id) else {
            return;
        };

        if let Some(point) = gizmo.drag_point(ray, drag.handle, &self.camera.forward()) {
            let location = point + drag.grab_offset;
            if let Some(object) = self.scene.get_mut(id) {
                object.set_location(location);
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        self.renderer.clear();
        let state = self.selection.snapshot();

        // Painter's order: farthest first
        let world_faces = self.scene.world_faces();
        let faces: Vec<_> = world_faces.iter().map(|(_, face)| face.clone()).collect();
        let mut projected = self.projection.project_faces(&self.camera, &faces);
        projected.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let eye = -self.camera.forward();
        for face in &projected {
            let (id, world_face) = &world_faces[face.source_index];
            let brightness = 0.25 + 0.75 * world_face.normal().dot(&eye).max(0.0);
            let color = if state.selected == Some(*id) { Color::YELLOW } else { face.color };
            self.renderer.fill_face(face, AsciiRenderer::shade(brightness), color);
        }

        if let Some(object) = state.hovered.and_then(|id| self.scene.get(id)) {
            for edge in object.bounds().edges() {
                if let Some(line) = self.projection.project_line_segment(&self.camera, &edge) {
                    self.renderer.draw_line(&line, '+', Color::WHITE);
                }
            }
        }

        if let Some(gizmo) = state.selected.and_then(|id| self.gizmo_for(id)) {
            self.draw_gizmo(&gizmo, state.active_handle);
        }

        let selected = state
            .selected
            .and_then(|id| self.scene.get(id))
            .map(|o| {
                let l = o.location();
                format!("{} {} at ({:.0}, {:.0}, {:.0})", o.name(), o.id(), l.x, l.y, l.z)
            })
            .unwrap_or_else(|| "nothing selected".to_string());
        let status = format!(
            "PP3D | {:.1} fps | {:?} | yaw {:.0} pitch {:.0} | {}",
            self.fps,
            self.projection.mode(),
            self.camera.yaw(),
            self.camera.pitch_angle(),
            selected
        );
        self.renderer.draw_text(0, 0, &status, Color::YELLOW);
        self.renderer.draw_text(
            0,
            1,
            "WASD/Space/C move | arrows look | IJKL orbit | Shift+L look at | F focus | P lens | Q quit",
            Color::LIGHT_GRAY,
        );

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;
        stdout.flush()?;
        Ok(())
    }

    fn draw_gizmo(&mut self, gizmo: &Gizmo, active: Option<Handle>) {
        for handle in Handle::ALL {
            let color = if active == Some(handle) { Color::WHITE } else { handle.color() };

            let segments = if let Some(axis) = handle.axis() {
                vec![gizmo.axis_segment(&axis)]
            } else if let Some((a, b)) = handle.plane_axes() {
                let square = gizmo.plane_square(&a, &b);
                (0..4)
                    .map(|i| pp3d_core::LineSegment::new(square[i], square[(i + 1) % 4]))
                    .collect()
            } else {
                continue;
            };

            for segment in segments {
                if let Some(line) = self.projection.project_line_segment(&self.camera, &segment) {
                    self.renderer.draw_line(&line, '*', color);
                }
            }
        }

        if let Some(center) = self.projection.project(&self.camera, &gizmo.origin(), true) {
            let line = pp3d_core::LineSegment::new(center, center);
            let color = if active == Some(Handle::All) { Color::WHITE } else { Handle::All.color() };
            self.renderer.draw_line(&line, 'O', color);
        }
    }
}

/// A few cubes around the origin and a light marker above them
pub fn demo_scene() -> Scene {
    use pp3d_core::{Mesh, ObjectKind};

    let mut scene = Scene::new();
    let cubes = [
        ("center", Point3::new(0.0, 0.0, 0.0), 200.0, Color::LIGHT_GRAY),
        ("left", Point3::new(-350.0, 0.0, -100.0), 150.0, Color::RED),
        ("right", Point3::new(350.0, 50.0, 100.0), 150.0, Color::GREEN),
        ("back", Point3::new(0.0, 100.0, -500.0), 250.0, Color::BLUE),
    ];
    for (name, location, size, color) in cubes {
        scene.add(name, ObjectKind::Mesh, Mesh::cube(1.0).with_color(color), location, size);
    }
    scene.add(
        "light",
        ObjectKind::Marker,
        Mesh::cube(1.0).with_color(Color::WHITE),
        Point3::new(200.0, 400.0, 300.0),
        40.0,
    );
    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_corrects_cell_aspect() {
        let viewport = viewport_for(80, 24).unwrap();
        assert_eq!((viewport.width(), viewport.height()), (80, 48));
        assert!(viewport_for(0, 24).is_err());
    }

    #[test]
    fn test_resize_to_zero_columns_is_rejected() {
        let (_, projection) = ViewerConfig::default().build(viewport_for(80, 24).unwrap()).unwrap();

        assert!(resized_projection(&projection, 0, 24).is_err());

        let wider = resized_projection(&projection, 120, 24).unwrap();
        assert_eq!(wider.viewport().width(), 120);
        assert_eq!(wider.config(), projection.config());
    }

    #[test]
    fn test_demo_scene_is_pickable() {
        let scene = demo_scene();
        assert_eq!(scene.objects().len(), 5);

        let ray = Ray::new(Point3::new(0.0, 0.0, 1000.0), -Vector3::z(), 10_000.0).unwrap();
        let picked = scene.pick(&ray).and_then(|id| scene.get(id)).map(|o| o.name().to_string());
        assert_eq!(picked.as_deref(), Some("center"));
    }
}
