/// Terminal viewer for a rotary engine assembly
use crossterm::{
    cursor,
    event::{self, Event, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use rotary_core::{AnimationClock, Camera, ExplodeLayout, PartRegistry, PartRole};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub mod controls;
pub mod renderer;

pub use controls::{Command, KeyMap, VisibilityToggle};
pub use renderer::{AsciiRenderer, Frame};

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: u32 = 2;

/// Main application struct for the terminal engine viewer
pub struct ViewerApp {
    registry: PartRegistry,
    clock: AnimationClock,
    layout: ExplodeLayout,
    keys: KeyMap,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl ViewerApp {
    pub fn new(registry: PartRegistry, clock: AnimationClock, layout: ExplodeLayout) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_viewport(
            registry,
            clock,
            layout,
            width as usize,
            height as usize,
        ))
    }

    /// Build the viewer for a fixed cell grid without touching the terminal
    pub fn with_viewport(
        registry: PartRegistry,
        clock: AnimationClock,
        layout: ExplodeLayout,
        width: usize,
        height: usize,
    ) -> Self {
        let mut camera = Camera::new(width as u32, height as u32 * CELL_ASPECT);
        if let Some(bounds) = registry.bounds() {
            camera.fit(&bounds);
        }

        Self {
            keys: KeyMap::for_registry(&registry),
            registry,
            clock,
            layout,
            camera,
            renderer: AsciiRenderer::new(width, height),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn registry(&self) -> &PartRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::ZERO)? {
                self.handle_event(event::read()?);
            }

            // Update
            self.clock.poll(&mut self.registry, Instant::now());

            // Render
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

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => {
                if let Some(command) = self.keys.command(code) {
                    self.apply(command, Instant::now());
                }
            }
            Event::Resize(width, height) => {
                self.renderer.resize(width as usize, height as usize);
                self.camera
                    .set_viewport(width as u32, height as u32 * CELL_ASPECT);
            }
            _ => {}
        }
    }

    /// Apply one user command to the assembly or the view
    pub fn apply(&mut self, command: Command, now: Instant) {
        match command {
            Command::ToggleAnimation => {
                self.clock.toggle(&mut self.registry, now);
            }
            Command::AdjustSpeed(change) => {
                let delta = self.clock.nudge_speed(change);
                debug!(delta, "speed changed");
            }
            Command::ToggleExplode => {
                let exploded = !self.clock.state().exploded;
                let moved = self.layout.apply(&mut self.registry, exploded);
                self.clock.set_exploded(exploded);
                info!(exploded, moved, "explode view toggled");
            }
            Command::ToggleVisibility(toggle) => {
                if let Some(visible) = toggle.apply(&mut self.registry) {
                    debug!(part = toggle.part.index(), visible, "visibility toggled");
                }
            }
            Command::Orbit { yaw, pitch } => self.camera.orbit(yaw, pitch),
            Command::Zoom(factor) => self.camera.zoom(factor),
            Command::ToggleProjection => self.camera.toggle_mode(),
            Command::Quit => self.running = false,
        }
    }

    /// Rasterize every visible part into the renderer's buffers
    pub fn rasterize(&mut self) {
        self.renderer.clear();
        let frame = Frame::new(&self.camera);

        let mut rotor_index = 0;
        for part in self.registry.iter() {
            let tint = match part.role() {
                PartRole::Shaft => Color::Yellow,
                PartRole::Rotor => {
                    rotor_index += 1;
                    if rotor_index % 2 == 1 {
                        Color::Cyan
                    } else {
                        Color::Magenta
                    }
                }
                PartRole::Static => Color::Grey,
            };
            if part.visible {
                self.renderer.render_mesh(&part.mesh, &frame, tint);
            }
        }
    }

    /// Overlay lines: status, then one checkbox row per part
    pub fn overlay(&self) -> Vec<String> {
        let state = self.clock.state();
        let mut lines = vec![format!(
            "Rotary Engine | {} | {:.0} deg/step | theta {:.0} | {} | FPS: {:.1}",
            if state.running { "running" } else { "stopped" },
            state.delta,
            state.theta,
            if state.exploded { "exploded" } else { "assembled" },
            self.fps
        )];
        lines.push(
            "SPACE=Animate +/-=Speed X=Explode 1-9=Parts WASD/Arrows=Orbit Z/C=Zoom P=Projection Q=Quit"
                .to_string(),
        );

        for part in self.registry.iter() {
            let key = self
                .keys
                .hotkey(part.id())
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let check = if part.visible { 'x' } else { ' ' };
            lines.push(format!("{key} [{check}] {}", part.label()));
        }
        lines
    }

    fn render(&mut self) -> io::Result<()> {
        self.rasterize();

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        for (row, line) in self.overlay().iter().enumerate() {
            if row >= self.renderer.height() {
                break;
            }
            let line: String = line.chars().take(self.renderer.width()).collect();
            queue!(
                stdout,
                cursor::MoveTo(0, row as u16),
                terminal::Clear(ClearType::UntilNewLine),
                SetForegroundColor(if row == 0 { Color::Yellow } else { Color::White }),
                Print(line),
                ResetColor
            )?;
        }

        stdout.flush()?;
        Ok(())
    }
}
