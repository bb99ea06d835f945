/// Terminal host: loads a mesh and spins it with an ASCII rasterizer
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, stdout, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use stlview_core::{stl, Animator, DecodedModel, ViewerConfig};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Rotation applied per key press, in radians
const NUDGE: f32 = 0.1;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: u32 = 2;

/// Read a binary STL file and fit it into the view volume
pub fn load_stl_file(path: &Path, fit_extent: f32) -> Result<DecodedModel> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read STL file {}", path.display()))?;
    let mut model = stl::parse_stl(&data)
        .with_context(|| format!("Failed to parse STL file {}", path.display()))?;
    model.fit_to(fit_extent);

    tracing::info!(
        path = %path.display(),
        facets = model.facet_count(),
        colored = model.has_colors(),
        "loaded STL"
    );
    Ok(model)
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    model: DecodedModel,
    animator: Animator,
    renderer: AsciiRenderer,
    running: bool,
    needs_clear: bool,
    target_frame_time: Duration,
    started: Instant,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(model: DecodedModel, config: &ViewerConfig, target_fps: u32) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(model, config, target_fps, width, height))
    }

    fn with_size(
        model: DecodedModel,
        config: &ViewerConfig,
        target_fps: u32,
        width: u16,
        height: u16,
    ) -> Self {
        let now = Instant::now();
        Self {
            model,
            animator: Animator::new(config, width as u32, height as u32 * CELL_ASPECT),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            running: true,
            needs_clear: true,
            target_frame_time: Duration::from_millis(1000 / u64::from(target_fps.max(1))),
            started: now,
            last_fps_sample: now,
            frame_count: 0,
            fps: 0.0,
        }
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
        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
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
            }) => self.handle_key(code),
            Event::Resize(width, height) => {
                self.renderer.resize(width as usize, height as usize);
                self.animator.resize(width as u32, height as u32 * CELL_ASPECT);
                self.needs_clear = true;
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => self.animator.nudge(NUDGE, 0.0, 0.0),
            KeyCode::Char('s') | KeyCode::Down => self.animator.nudge(-NUDGE, 0.0, 0.0),
            KeyCode::Char('a') | KeyCode::Left => self.animator.nudge(0.0, -NUDGE, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.animator.nudge(0.0, NUDGE, 0.0),
            KeyCode::Char('e') => self.animator.nudge(0.0, 0.0, NUDGE),
            KeyCode::Char('r') => self.animator.nudge(0.0, 0.0, -NUDGE),
            KeyCode::Char(' ') => self.animator.toggle_pause(),
            _ => {}
        }
    }

    fn draw_frame(&mut self) {
        let frame = self.animator.tick(self.started.elapsed().as_secs_f64());
        self.renderer.clear();
        self.renderer.render_model(&self.model, &frame);
    }

    fn status_line(&self) -> String {
        format!(
            "stlview | {} facets | FPS: {:.1}{} | WASD/Arrows=Rotate E/R=Roll Space=Pause Q=Quit",
            self.model.facet_count(),
            self.fps,
            if self.animator.is_paused() { " (paused)" } else { "" },
        )
    }

    fn render(&mut self) -> io::Result<()> {
        self.draw_frame();

        let mut stdout = stdout();
        if std::mem::take(&mut self.needs_clear) {
            queue!(stdout, terminal::Clear(ClearType::All))?;
        }
        self.renderer.draw(&mut stdout)?;

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(self.status_line()),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
