use crate::input::{Role, key_event};
use crate::screen::{EvaluatorScreen, ParticipantScreen};
use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use splitscreen_core::{Decision, SessionOutcome};
use splitscreen_experiment::{
    DisplayConfig, ResultSink, SessionError, SessionEvent, Step, TrialStateMachine,
};
use splitscreen_render::{FontVec, SurfaceRenderer, load_font};
use splitscreen_timing::HighPrecisionTimer;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Fullscreen, Window, WindowId},
};

pub type WindowedMachine =
    TrialStateMachine<HighPrecisionTimer, ParticipantScreen, EvaluatorScreen, ResultSink>;

/// One window with its frame buffer and software renderer.
struct Surface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    renderer: SurfaceRenderer,
}

impl Surface {
    fn open(
        event_loop: &ActiveEventLoop,
        title: &str,
        monitor: usize,
        config: &DisplayConfig,
        font: Option<Arc<FontVec>>,
    ) -> Result<Self> {
        let monitor_handle = event_loop.available_monitors().nth(monitor);
        if monitor_handle.is_none() {
            warn!(monitor, "monitor not found, opening a plain window");
        }
        let fullscreen = monitor_handle
            .filter(|_| config.fullscreen)
            .map(|m| Fullscreen::Borderless(Some(m)));

        let attributes = Window::default_attributes()
            .with_title(title)
            .with_inner_size(LogicalSize::new(1024.0, 768.0))
            .with_fullscreen(fullscreen);
        let window = Arc::new(event_loop.create_window(attributes)?);

        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let texture = SurfaceTexture::new(width, height, window.clone());
        let pixels = Pixels::new(width, height, texture)
            .with_context(|| format!("creating frame buffer for {title} window"))?;
        let renderer = SurfaceRenderer::new(
            width,
            height,
            font,
            config.stimulus_font_px,
            config.control_font_px,
        )?;
        info!(title, width, height, monitor, "window opened");

        Ok(Self {
            window,
            pixels,
            renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Err(e) = self.pixels.resize_surface(size.width, size.height) {
            warn!(error = %e, "surface resize failed");
        }
        if let Err(e) = self.pixels.resize_buffer(size.width, size.height) {
            warn!(error = %e, "buffer resize failed");
        }
        self.renderer.resize(size.width, size.height);
        self.window.request_redraw();
    }

    fn present(&mut self) -> Result<()> {
        self.renderer.copy_to(self.pixels.frame_mut())?;
        self.pixels.render()?;
        Ok(())
    }
}

/// Display resources that can fail to load. Built before the result file is
/// opened, so a bad font path never costs an earlier session's results.
pub struct WindowedRunner {
    display: DisplayConfig,
    font: Option<Arc<FontVec>>,
}

impl WindowedRunner {
    pub fn new(display: DisplayConfig) -> Result<Self> {
        let font = match &display.font_path {
            Some(path) => Some(Arc::new(load_font(path)?)),
            None => {
                info!("no font configured, words are shown in window titles");
                None
            }
        };
        Ok(Self { display, font })
    }

    /// Runs the event loop until the session terminates or the windows go
    /// away. Either way the session ends through the machine's close path.
    pub fn run(self, machine: WindowedMachine) -> Result<SessionOutcome> {
        let mut app = App {
            machine,
            display: self.display,
            font: self.font,
            participant: None,
            evaluator: None,
            cursor: None,
            error: None,
        };
        let event_loop = match EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(e) => {
                app.close_quietly();
                return Err(e.into());
            }
        };
        if let Err(e) = event_loop.run_app(&mut app) {
            app.error.get_or_insert(e.into());
        }

        if let Some(e) = app.error.take() {
            app.close_quietly();
            return Err(e);
        }
        Ok(app.machine.abort()?)
    }
}

/// Windowed session: the participant and evaluator each get a window, and
/// the machine's coordinator decides what both show.
struct App {
    machine: WindowedMachine,
    display: DisplayConfig,
    font: Option<Arc<FontVec>>,
    participant: Option<Surface>,
    evaluator: Option<Surface>,
    cursor: Option<PhysicalPosition<f64>>,
    error: Option<anyhow::Error>,
}

impl App {
    fn close_quietly(&mut self) {
        if let Err(close) = self.machine.abort() {
            warn!(error = %close, "result file could not be closed cleanly");
        }
    }

    fn open_windows(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let participant = Surface::open(
            event_loop,
            "participant",
            self.display.participant_monitor,
            &self.display,
            self.font.clone(),
        )?;
        participant.window.set_cursor_visible(false);
        let evaluator = Surface::open(
            event_loop,
            "evaluator",
            self.display.evaluator_monitor,
            &self.display,
            self.font.clone(),
        )?;
        self.participant = Some(participant);
        self.evaluator = Some(evaluator);
        Ok(())
    }

    fn role(&self, id: WindowId) -> Option<Role> {
        if self.participant.as_ref().is_some_and(|s| s.window.id() == id) {
            Some(Role::Participant)
        } else if self.evaluator.as_ref().is_some_and(|s| s.window.id() == id) {
            Some(Role::Evaluator)
        } else {
            None
        }
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, event: SessionEvent) {
        debug!(?event, "input");
        let step = self.machine.handle(event);
        self.settle(event_loop, step);
    }

    fn settle(&mut self, event_loop: &ActiveEventLoop, step: Result<Step, SessionError>) {
        match step {
            Ok(Step::Terminate(outcome)) => {
                info!(%outcome, "session over");
                event_loop.exit();
            }
            Ok(Step::Continue | Step::Ignored) => {}
            Err(e) => self.fail(event_loop, e.into()),
        }
        self.request_redraws();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{e:#}");
        self.error.get_or_insert(e);
        event_loop.exit();
    }

    fn request_redraws(&mut self) {
        let coordinator = &mut self.machine.coordinator;
        if coordinator.participant_mut().take_dirty() {
            if let Some(surface) = &self.participant {
                if !surface.renderer.has_font() {
                    surface.window.set_title(&coordinator.participant().view().caption());
                }
                surface.window.request_redraw();
            }
        }
        if coordinator.evaluator_mut().take_dirty() {
            if let Some(surface) = &self.evaluator {
                if !surface.renderer.has_font() {
                    surface.window.set_title(&coordinator.evaluator().view().caption());
                }
                surface.window.request_redraw();
            }
        }
    }

    fn redraw(&mut self, role: Role) -> Result<()> {
        let coordinator = &self.machine.coordinator;
        match role {
            Role::Participant => {
                if let Some(surface) = self.participant.as_mut() {
                    surface.renderer.draw_participant(coordinator.participant().view());
                    surface.present()?;
                }
            }
            Role::Evaluator => {
                if let Some(surface) = self.evaluator.as_mut() {
                    surface.renderer.draw_evaluator(coordinator.evaluator().view());
                    surface.present()?;
                }
            }
        }
        Ok(())
    }

    fn click(&mut self, event_loop: &ActiveEventLoop, role: Role) {
        let event = match role {
            Role::Participant => Some(SessionEvent::StimulusConsumed),
            Role::Evaluator => self.evaluator_hit().map(SessionEvent::Decision),
        };
        if let Some(event) = event {
            self.dispatch(event_loop, event);
        }
    }
}

impl App {
    /// Hit test against what the evaluator screen holds now. A click can
    /// arrive between a stage change and the redraw that shows it.
    fn evaluator_hit(&self) -> Option<Decision> {
        let position = self.cursor?;
        let renderer = &self.evaluator.as_ref()?.renderer;
        self.machine.coordinator.evaluator().hit_test(
            renderer.width(),
            renderer.height(),
            position.x as f32,
            position.y as f32,
        )
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.participant.is_some() {
            return;
        }
        if let Err(e) = self.open_windows(event_loop) {
            self.fail(event_loop, e.context("opening session windows"));
            return;
        }
        let step = self.machine.start();
        self.settle(event_loop, step);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(role) = self.role(id) else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => self.dispatch(event_loop, SessionEvent::CloseRequested),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(role) {
                    self.fail(event_loop, e.context("drawing frame"));
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if let Some(event) = key_event(role, key) {
                        self.dispatch(event_loop, event);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } if role == Role::Evaluator => {
                self.cursor = Some(position);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.click(event_loop, role),
            WindowEvent::Resized(size) => {
                let surface = match role {
                    Role::Participant => self.participant.as_mut(),
                    Role::Evaluator => self.evaluator.as_mut(),
                };
                if let Some(surface) = surface {
                    surface.resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.machine.feedback_remaining().is_some_and(|d| d.is_zero()) {
            self.dispatch(event_loop, SessionEvent::FeedbackElapsed);
        }
        match self.machine.feedback_remaining() {
            Some(remaining) => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + remaining))
            }
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
