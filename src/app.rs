use std::error::Error;
use std::sync::Arc;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::daynight::DayNightState;
use crate::pet::animation::PetAnimation;
use crate::pet::timer::FrameTimers;
use crate::pet::{DisplaySettings, FrameInput, PetController};
use crate::platform::{self, Desktop};
use crate::render::instance::PetInstance;
use crate::render::GpuState;

/// Target simulation tick rate (seconds per tick).
const TICK_RATE: f64 = 1.0 / 60.0;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// How often to log FPS (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;
/// Hotkey that toggles follow-the-mouse mode.
const FOLLOW_KEY: KeyCode = KeyCode::KeyF;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frame_time_max: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frame_time_max: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt: f64, pet: &PetController<FrameTimers>) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt;
        self.frame_time_max = self.frame_time_max.max(dt);

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= FPS_LOG_INTERVAL {
            let avg_ms = (self.frame_time_sum / self.frames_since_log as f64) * 1000.0;
            let fps = self.frames_since_log as f64 / elapsed;
            let sprite = pet.sprite();
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | max: {:.2}ms | pet: {} ({}) at x={:.0}, goal x={:.0}{} | total frames: {}",
                fps,
                avg_ms,
                self.frame_time_max * 1000.0,
                sprite.clip.label(),
                pet_activity(pet),
                sprite.position.x,
                pet.goal().x,
                if pet.follow_mouse() { " (following)" } else { "" },
                self.frame_count,
            );
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frame_time_max = 0.0;
            self.frames_since_log = 0;
        }
    }
}

fn pet_activity(pet: &PetController<FrameTimers>) -> &'static str {
    match (pet.on_movement(), pet.is_resting()) {
        (true, true) => "heading to rest",
        (true, false) => "moving",
        (false, true) => "resting",
        (false, false) => "waiting",
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    desktop: Box<dyn Desktop>,
    pet: Option<PetController<FrameTimers>>,

    day_night: DayNightState,
    host_focused: bool,
    /// Last cursor position reported by winit (viewport pixels).
    cursor: Vec2,

    // Fixed timestep
    last_frame_time: Option<Instant>,
    accumulator: f64,
    tick_count: u64,

    // Render interpolation + clip playback
    prev_position: Vec2,
    shown_clip: PetAnimation,
    clip_time: f32,

    frame_stats: FrameStats,
    instance_buf: Vec<PetInstance>,

    /// Startup failure to report once the event loop returns.
    fatal: Option<Box<dyn Error>>,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            gpu: None,
            desktop: Box::new(platform::NullDesktop),
            pet: None,
            day_night: DayNightState::new(),
            host_focused: false,
            cursor: Vec2::ZERO,
            last_frame_time: None,
            accumulator: 0.0,
            tick_count: 0,
            prev_position: Vec2::ZERO,
            shown_clip: PetAnimation::Idle,
            clip_time: 0.0,
            frame_stats: FrameStats::new(),
            instance_buf: Vec::with_capacity(1),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Box<dyn Error>) {
        log::error!("Startup failed: {err}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    /// Mouse position in viewport pixels.
    fn mouse_position(&self, aspect_relation: f32) -> Vec2 {
        match self.desktop.cursor_position() {
            Some((x, y)) => Vec2::new(x as f32, y as f32) / aspect_relation,
            None => self.cursor,
        }
    }

    /// Run fixed-timestep simulation ticks.
    fn run_fixed_update(&mut self, dt: f64) {
        self.accumulator += dt;

        if self.accumulator > MAX_ACCUMULATOR {
            self.accumulator = MAX_ACCUMULATOR;
        }

        let Some(aspect_relation) = self.pet.as_ref().map(|p| p.settings().aspect_relation)
        else {
            return;
        };

        // Clock and mouse once per frame (not per tick)
        self.day_night.update();
        let input = FrameInput {
            dt: TICK_RATE as f32,
            night: self.day_night.is_night(),
            mouse: self.mouse_position(aspect_relation),
            host_focused: self.host_focused,
        };

        let Some(pet) = self.pet.as_mut() else {
            return;
        };
        while self.accumulator >= TICK_RATE {
            self.prev_position = pet.sprite().position;
            pet.advance_timers(input.dt);
            pet.update(&input, self.desktop.as_ref());

            self.accumulator -= TICK_RATE;
            self.tick_count += 1;
        }

        let clip = pet.sprite().clip;
        if clip == self.shown_clip {
            self.clip_time += dt as f32;
        } else {
            log::debug!("Clip {} -> {}", self.shown_clip.label(), clip.label());
            self.shown_clip = clip;
            self.clip_time = 0.0;
        }
    }

    /// Interpolation alpha for rendering between ticks.
    fn interpolation_alpha(&self) -> f32 {
        (self.accumulator / TICK_RATE) as f32
    }

    /// Build instance buffer from the pet sprite for rendering.
    fn build_instances(&mut self) {
        self.instance_buf.clear();
        let alpha = self.interpolation_alpha();

        if let Some(pet) = &self.pet {
            self.instance_buf.push(PetInstance::from_sprite(
                &pet.sprite(),
                self.prev_position,
                alpha,
                self.clip_time,
            ));
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: PhysicalKey) {
        match key {
            PhysicalKey::Code(FOLLOW_KEY) => {
                if let Some(pet) = &mut self.pet {
                    pet.toggle_follow();
                }
            }
            PhysicalKey::Code(KeyCode::Escape) => {
                log::info!("ESC pressed, exiting");
                event_loop.exit();
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let Some(monitor) = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
        else {
            self.fail(event_loop, "no monitor found".into());
            return;
        };
        let screen_size = monitor.size();

        // No with_transparent(true): WS_EX_LAYERED conflicts with the
        // DirectComposition swapchain. Start hidden so DWM doesn't cache a
        // frame from before the overlay styles are applied.
        let attrs = WindowAttributes::default()
            .with_title("DeskPet")
            .with_decorations(false)
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(screen_size)
            .with_position(winit::dpi::PhysicalPosition::new(0, 0));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        };

        #[cfg(windows)]
        {
            match platform::win32::setup_overlay(&window) {
                Ok(hwnd) => self.desktop = Box::new(platform::win32::Win32Desktop::new(hwnd)),
                Err(e) => log::warn!("Overlay setup failed, window tracking disabled: {e}"),
            }
        }

        let size = window.inner_size();
        let viewport = Vec2::new(size.width as f32, size.height as f32);
        let settings = DisplaySettings::new(screen_size.width as f32, viewport.x);

        log::info!(
            "Overlay window created: {}x{} on {:?} (aspect relation {:.2})",
            size.width,
            size.height,
            monitor.name().unwrap_or_default(),
            settings.aspect_relation,
        );

        match GpuState::new(window.clone()) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        }
        log::info!("wgpu + sprite pipeline initialized");

        let pet = PetController::new(settings, viewport, FrameTimers::new());
        self.prev_position = pet.sprite().position;
        self.pet = Some(pet);

        event_loop.set_control_flow(ControlFlow::Poll);

        // Show only once styles and GPU resources are ready.
        window.set_visible(true);

        self.window = Some(window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                if let Some(pet) = &mut self.pet {
                    pet.resize(Vec2::new(new_size.width as f32, new_size.height as f32));
                }
            }
            WindowEvent::Focused(focused) => {
                self.host_focused = focused;
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    self.handle_key(event_loop, event.physical_key);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if let Some(last) = self.last_frame_time {
                    let dt = now.duration_since(last).as_secs_f64();
                    self.run_fixed_update(dt);

                    if let Some(pet) = &self.pet {
                        self.frame_stats.record_frame(dt, pet);
                    }
                }
                self.last_frame_time = Some(now);

                self.build_instances();

                if let Some(gpu) = &mut self.gpu {
                    gpu.update_instances(&self.instance_buf);
                    gpu.render_frame();
                }
            }
            _ => {}
        }
    }
}

/// Entry point - create event loop and run.
pub fn run() -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    log::info!("Exited after {} ticks", app.tick_count);
    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
