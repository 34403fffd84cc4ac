pub mod animation;
pub mod timer;

use std::time::Duration;

use glam::Vec2;

use crate::platform::{Desktop, ScreenRect, WindowHandle};
use animation::PetAnimation;
use timer::{FrameTimers, PetTimer, Scheduler};

/// Horizontal speed in viewport pixels/second (walk and run alike).
const SPEED: f32 = 100.0;
/// Closer than this to the goal counts as arrived.
const ARRIVE_DISTANCE: f32 = 5.0;
/// New window goals closer than this to the pet are ignored.
const MIN_GOAL_SHIFT: f32 = 10.0;
/// Idle time after a trick before heading to the rest corner.
const REST_DELAY: Duration = Duration::from_secs(5);
/// Idle time at the rest corner before sitting down.
const SIT_DELAY: Duration = Duration::from_secs(5);

/// Display geometry fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct DisplaySettings {
    /// Physical screen pixels per viewport pixel.
    pub aspect_relation: f32,
    /// Idle frame size, used to keep goals on-screen.
    pub base_sprite_size: Vec2,
}

impl DisplaySettings {
    pub fn new(screen_w: f32, viewport_w: f32) -> Self {
        let aspect_relation = if viewport_w > 0.0 && screen_w > 0.0 {
            screen_w / viewport_w
        } else {
            1.0
        };
        Self {
            aspect_relation,
            base_sprite_size: PetAnimation::Idle.frame_size(),
        }
    }
}

/// Everything the host gathers for one controller update.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// Seconds since the previous update.
    pub dt: f32,
    pub night: bool,
    /// Mouse position in viewport pixels.
    pub mouse: Vec2,
    pub host_focused: bool,
}

/// What the renderer needs to draw the pet this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PetSprite {
    /// Sprite centre in viewport pixels.
    pub position: Vec2,
    pub clip: PetAnimation,
    /// True when facing right (sprite art faces left).
    pub flip_h: bool,
}

/// Movement and animation state machine for the desktop pet.
pub struct PetController<S: Scheduler> {
    settings: DisplaySettings,
    viewport: Vec2,
    scheduler: S,

    position: Vec2,
    goal: Vec2,
    clip: PetAnimation,
    flip_h: bool,

    on_movement: bool,
    is_resting: bool,
    follow_mouse: bool,
    last_active_window: WindowHandle,
}

impl<S: Scheduler> PetController<S> {
    /// Place the pet idle in the middle of the floor.
    pub fn new(settings: DisplaySettings, viewport: Vec2, scheduler: S) -> Self {
        let mut pet = Self {
            settings,
            viewport,
            scheduler,
            position: Vec2::new(viewport.x / 2.0, 0.0),
            goal: Vec2::ZERO,
            clip: PetAnimation::Idle,
            flip_h: false,
            on_movement: false,
            is_resting: false,
            follow_mouse: false,
            last_active_window: WindowHandle::NONE,
        };
        pet.show(PetAnimation::Idle);
        pet
    }

    pub fn sprite(&self) -> PetSprite {
        PetSprite {
            position: self.position,
            clip: self.clip,
            flip_h: self.flip_h,
        }
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    pub fn goal(&self) -> Vec2 {
        self.goal
    }

    pub fn on_movement(&self) -> bool {
        self.on_movement
    }

    pub fn is_resting(&self) -> bool {
        self.is_resting
    }

    pub fn follow_mouse(&self) -> bool {
        self.follow_mouse
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Viewport changed size. Pulls position and goal back inside the new
    /// width and re-anchors the sprite to the new floor.
    pub fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        self.position.x = self.position.x.min(self.max_goal_x());
        self.goal.x = self.clamp_goal_x(self.goal.x);
        self.show(self.clip);
    }

    /// Follow-mode hotkey pressed.
    pub fn toggle_follow(&mut self) {
        self.follow_mouse = !self.follow_mouse;
        log::info!(
            "Follow mouse {}",
            if self.follow_mouse { "on" } else { "off" }
        );
    }

    /// A scheduled timer fired.
    pub fn on_timer(&mut self, timer: PetTimer) {
        match timer {
            PetTimer::Rest => {
                log::debug!("Rest timer fired, heading to rest corner");
                self.is_resting = true;
                self.on_movement = true;
            }
            PetTimer::Sit => {
                if self.is_resting {
                    log::debug!("Sitting down");
                    self.show(PetAnimation::Sit);
                    self.scheduler.cancel(PetTimer::Rest);
                }
            }
        }
    }

    /// Advance the state machine by one frame.
    pub fn update(&mut self, input: &FrameInput, desktop: &dyn Desktop) {
        self.detect_new_window(desktop);

        if input.night {
            if self.on_movement {
                self.move_to_rest_corner(input.dt);
            } else {
                self.show(PetAnimation::Sleep);
            }
            return;
        }

        if self.follow_mouse && input.host_focused {
            let goal_x = self.clamp_goal_x(input.mouse.x);
            self.goal = Vec2::new(goal_x, self.floor_y(PetAnimation::Run));
            self.start_movement();
        }

        if self.on_movement {
            if self.is_resting {
                self.move_to_rest_corner(input.dt);
            } else {
                self.move_to_goal(input.dt);
            }
        }
    }

    /// Pick a new goal when the foreground window changes.
    fn detect_new_window(&mut self, desktop: &dyn Desktop) {
        let current = desktop.foreground_window();
        if current.is_none() || current == self.last_active_window {
            return;
        }
        self.last_active_window = current;

        let rect = match desktop.window_rect(current) {
            Ok(rect) => rect,
            Err(e) => {
                log::debug!("Ignoring window change: {e}");
                return;
            }
        };

        let Some(corner) = self.nearest_bottom_corner(&rect) else {
            return;
        };
        let goal_x = self.clamp_goal_x(corner.x);
        if (self.position.x - goal_x).abs() < MIN_GOAL_SHIFT {
            return;
        }

        log::debug!("New foreground window {:?}, running to x={goal_x:.0}", current);
        self.goal = Vec2::new(goal_x, self.floor_y(PetAnimation::Run));
        self.start_movement();
    }

    /// Nearer of the window's bottom corners in viewport space, or `None`
    /// when the window reaches past either horizontal viewport edge.
    fn nearest_bottom_corner(&self, rect: &ScreenRect) -> Option<Vec2> {
        let scale = self.settings.aspect_relation;
        let left = rect.left as f32 / scale;
        let right = rect.right as f32 / scale;
        let bottom = rect.bottom as f32 / scale;
        if left < 0.0 || right > self.viewport.x {
            return None;
        }

        let bottom_left = Vec2::new(left, bottom);
        let bottom_right = Vec2::new(right, bottom);
        if self.position.distance(bottom_left) <= self.position.distance(bottom_right) {
            Some(bottom_left)
        } else {
            Some(bottom_right)
        }
    }

    fn move_to_goal(&mut self, dt: f32) {
        if (self.goal.x - self.position.x).abs() < ARRIVE_DISTANCE {
            log::debug!("Arrived at x={:.0}", self.position.x);
            self.show(PetAnimation::Trick);
            self.scheduler.schedule_once(PetTimer::Rest, REST_DELAY);
            self.on_movement = false;
        } else {
            self.show(PetAnimation::Run);
            self.step_toward_goal(dt);
        }
    }

    fn move_to_rest_corner(&mut self, dt: f32) {
        self.goal = Vec2::new(self.rest_corner_x(), self.floor_y(PetAnimation::Walk));
        if (self.goal.x - self.position.x).abs() < ARRIVE_DISTANCE {
            log::debug!("Reached rest corner");
            self.show(PetAnimation::Idle);
            self.flip_h = false;
            self.scheduler.schedule_once(PetTimer::Sit, SIT_DELAY);
            self.on_movement = false;
        } else {
            self.show(PetAnimation::Walk);
            self.step_toward_goal(dt);
        }
    }

    /// Move horizontally toward the goal without passing it.
    fn step_toward_goal(&mut self, dt: f32) {
        let dx = self.goal.x - self.position.x;
        let step = (SPEED * dt).min(dx.abs());
        self.position.x += dx.signum() * step;
        self.flip_h = dx > 0.0;
    }

    /// Commit to a fresh goal: pending rest/sit transitions no longer apply.
    fn start_movement(&mut self) {
        self.on_movement = true;
        self.is_resting = false;
        self.scheduler.cancel(PetTimer::Rest);
        self.scheduler.cancel(PetTimer::Sit);
    }

    /// Play a clip, snapping floor-anchored clips onto the floor line.
    fn show(&mut self, clip: PetAnimation) {
        self.clip = clip;
        if let Some(y) = clip.floor_y(self.viewport.y) {
            self.position.y = y;
        }
    }

    fn floor_y(&self, clip: PetAnimation) -> f32 {
        clip.floor_y(self.viewport.y).unwrap_or(self.position.y)
    }

    fn max_goal_x(&self) -> f32 {
        (self.viewport.x - self.settings.base_sprite_size.x).max(0.0)
    }

    fn clamp_goal_x(&self, x: f32) -> f32 {
        x.clamp(0.0, self.max_goal_x())
    }

    /// Bottom-right resting spot, as far right as a goal may go.
    fn rest_corner_x(&self) -> f32 {
        self.clamp_goal_x(self.viewport.x - self.settings.base_sprite_size.x / 2.0)
    }
}

impl PetController<FrameTimers> {
    /// Count the frame timers down and deliver whichever fired.
    pub fn advance_timers(&mut self, dt: f32) {
        for timer in self.scheduler.advance(dt) {
            self.on_timer(timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;

    const DT: f32 = 1.0 / 60.0;

    struct FakeDesktop {
        foreground: WindowHandle,
        rect: Option<ScreenRect>,
    }

    impl FakeDesktop {
        fn empty() -> Self {
            Self {
                foreground: WindowHandle::NONE,
                rect: None,
            }
        }

        fn with_window(raw: usize, left: i32, top: i32, right: i32, bottom: i32) -> Self {
            Self {
                foreground: WindowHandle::from_raw(raw),
                rect: Some(ScreenRect {
                    left,
                    top,
                    right,
                    bottom,
                }),
            }
        }
    }

    impl Desktop for FakeDesktop {
        fn foreground_window(&self) -> WindowHandle {
            self.foreground
        }

        fn window_rect(&self, handle: WindowHandle) -> Result<ScreenRect, PlatformError> {
            self.rect.ok_or(PlatformError::WindowRect {
                handle,
                message: "gone".into(),
            })
        }

        fn cursor_position(&self) -> Option<(i32, i32)> {
            None
        }
    }

    fn pet() -> PetController<FrameTimers> {
        let settings = DisplaySettings {
            aspect_relation: 1.0,
            base_sprite_size: Vec2::new(64.0, 49.0),
        };
        PetController::new(settings, Vec2::new(800.0, 600.0), FrameTimers::new())
    }

    fn day() -> FrameInput {
        FrameInput {
            dt: DT,
            night: false,
            mouse: Vec2::ZERO,
            host_focused: false,
        }
    }

    fn night() -> FrameInput {
        FrameInput {
            night: true,
            ..day()
        }
    }

    /// Tick until the pet stops moving (or give up).
    fn run_until_stopped(pet: &mut PetController<FrameTimers>, input: &FrameInput) -> usize {
        let desktop = FakeDesktop::empty();
        for frame in 0..100_000 {
            if !pet.on_movement() {
                return frame;
            }
            pet.update(input, &desktop);
        }
        panic!("pet never stopped");
    }

    #[test]
    fn display_settings_scale_screen_to_viewport() {
        let settings = DisplaySettings::new(3840.0, 1920.0);
        assert_eq!(settings.aspect_relation, 2.0);
        assert_eq!(settings.base_sprite_size, Vec2::new(64.0, 49.0));
        assert_eq!(DisplaySettings::new(1920.0, 0.0).aspect_relation, 1.0);
    }

    #[test]
    fn starts_idle_on_the_floor() {
        let pet = pet();
        let sprite = pet.sprite();
        assert_eq!(sprite.clip, PetAnimation::Idle);
        assert_eq!(sprite.position, Vec2::new(400.0, 547.0));
        assert!(!pet.on_movement());
    }

    #[test]
    fn new_window_sends_pet_to_nearest_corner() {
        let mut pet = pet();
        let desktop = FakeDesktop::with_window(7, 100, 50, 300, 500);

        pet.update(&day(), &desktop);

        assert_eq!(pet.goal(), Vec2::new(300.0, 550.0));
        assert!(pet.on_movement());
        assert!(!pet.is_resting());
        let sprite = pet.sprite();
        assert_eq!(sprite.clip, PetAnimation::Run);
        assert_eq!(sprite.position.y, 550.0);
        assert!(sprite.position.x < 400.0);
        assert!(!sprite.flip_h);
    }

    #[test]
    fn new_window_cancels_pending_timers() {
        let mut pet = pet();
        pet.scheduler_mut().schedule_once(PetTimer::Rest, REST_DELAY);
        pet.scheduler_mut().schedule_once(PetTimer::Sit, SIT_DELAY);

        pet.update(&day(), &FakeDesktop::with_window(7, 100, 50, 300, 500));

        assert!(!pet.scheduler().is_pending(PetTimer::Rest));
        assert!(!pet.scheduler().is_pending(PetTimer::Sit));
    }

    #[test]
    fn corner_tie_goes_bottom_left() {
        let mut pet = pet();
        pet.update(&day(), &FakeDesktop::with_window(7, 300, 0, 500, 400));
        assert_eq!(pet.goal().x, 300.0);
    }

    #[test]
    fn aspect_relation_scales_window_rect() {
        let settings = DisplaySettings {
            aspect_relation: 2.0,
            base_sprite_size: Vec2::new(64.0, 49.0),
        };
        let mut pet = PetController::new(settings, Vec2::new(800.0, 600.0), FrameTimers::new());

        // Right edge 1200 would be past the 800px viewport without scaling.
        pet.update(&day(), &FakeDesktop::with_window(7, 400, 0, 1200, 1000));

        assert_eq!(pet.goal().x, 200.0);
    }

    #[test]
    fn off_screen_windows_are_ignored() {
        let mut pet = pet();
        pet.update(&day(), &FakeDesktop::with_window(7, -20, 0, 300, 500));
        assert!(!pet.on_movement());

        pet.update(&day(), &FakeDesktop::with_window(8, 100, 0, 801, 500));
        assert!(!pet.on_movement());
        assert_eq!(pet.sprite().clip, PetAnimation::Idle);
    }

    #[test]
    fn nearby_corner_is_ignored() {
        let mut pet = pet();
        pet.update(&day(), &FakeDesktop::with_window(7, 405, 0, 780, 500));
        assert!(!pet.on_movement());
        assert_eq!(pet.goal(), Vec2::ZERO);
    }

    #[test]
    fn same_window_twice_is_noop() {
        let mut pet = pet();
        let desktop = FakeDesktop::with_window(7, 100, 50, 300, 500);
        pet.update(&day(), &desktop);
        run_until_stopped(&mut pet, &day());
        assert_eq!(pet.sprite().clip, PetAnimation::Trick);

        pet.update(&day(), &desktop);
        assert!(!pet.on_movement());
        assert_eq!(pet.sprite().clip, PetAnimation::Trick);
    }

    #[test]
    fn failed_rect_query_keeps_state() {
        let mut pet = pet();
        let desktop = FakeDesktop {
            foreground: WindowHandle::from_raw(9),
            rect: None,
        };
        let before = pet.sprite();

        pet.update(&day(), &desktop);

        assert_eq!(pet.sprite(), before);
        assert!(!pet.on_movement());
    }

    #[test]
    fn goal_is_clamped_into_viewport() {
        let pet = pet();
        assert_eq!(pet.clamp_goal_x(-50.0), 0.0);
        assert_eq!(pet.clamp_goal_x(790.0), 736.0);
        assert_eq!(pet.clamp_goal_x(300.0), 300.0);
    }

    #[test]
    fn right_edge_corner_clamps_to_max_goal() {
        let mut pet = pet();
        pet.position.x = 700.0;
        pet.update(&day(), &FakeDesktop::with_window(7, 500, 0, 800, 500));
        assert_eq!(pet.goal().x, 736.0);
    }

    #[test]
    fn step_moves_toward_goal_by_speed_times_dt() {
        for (start, goal) in [(400.0, 300.0), (100.0, 700.0), (10.0, 16.0), (600.0, 590.0)] {
            let mut pet = pet();
            pet.position.x = start;
            pet.goal.x = goal;
            pet.on_movement = true;

            pet.move_to_goal(DT);

            let moved = pet.position.x - start;
            assert_eq!(moved.signum(), (goal - start).signum());
            assert!((moved.abs() - SPEED * DT).abs() < 1e-3);
            assert_eq!(pet.sprite().flip_h, goal > start);
        }
    }

    #[test]
    fn large_step_never_overshoots() {
        let mut pet = pet();
        pet.goal.x = 390.0;
        pet.on_movement = true;

        pet.move_to_goal(1.0);

        assert_eq!(pet.position.x, 390.0);
    }

    #[test]
    fn movement_converges_monotonically() {
        for dt in [DT, 0.1, 0.25, 1.0] {
            for start in [0.0, 123.0, 736.0] {
                let mut pet = pet();
                pet.position.x = start;
                pet.goal.x = 400.0;
                pet.on_movement = true;

                let mut last = (pet.goal.x - pet.position.x).abs();
                let mut steps = 0;
                while pet.on_movement() {
                    pet.move_to_goal(dt);
                    let dist = (pet.goal.x - pet.position.x).abs();
                    assert!(dist <= last);
                    last = dist;
                    steps += 1;
                    assert!(steps < 10_000);
                }
                assert!(last < ARRIVE_DISTANCE);
            }
        }
    }

    #[test]
    fn arriving_plays_trick_and_arms_rest() {
        let mut pet = pet();
        pet.update(&day(), &FakeDesktop::with_window(7, 100, 50, 300, 500));
        run_until_stopped(&mut pet, &day());

        let sprite = pet.sprite();
        assert_eq!(sprite.clip, PetAnimation::Trick);
        assert_eq!(sprite.position.y, 555.0);
        assert!((sprite.position.x - 300.0).abs() < ARRIVE_DISTANCE);
        assert!(pet.scheduler().is_pending(PetTimer::Rest));
    }

    #[test]
    fn rest_timer_starts_rest_walk() {
        let mut pet = pet();
        assert!(!pet.is_resting());

        pet.on_timer(PetTimer::Rest);
        assert!(pet.is_resting());
        assert!(pet.on_movement());

        pet.update(&day(), &FakeDesktop::empty());
        let sprite = pet.sprite();
        assert_eq!(sprite.clip, PetAnimation::Walk);
        assert_eq!(sprite.position.y, 551.0);
        assert!(sprite.flip_h);
        assert_eq!(pet.goal().x, 736.0);
    }

    #[test]
    fn rest_walk_overrides_previous_goal() {
        let mut pet = pet();
        pet.goal = Vec2::new(50.0, 550.0);
        pet.on_timer(PetTimer::Rest);

        pet.update(&day(), &FakeDesktop::empty());

        assert_eq!(pet.goal().x, 736.0);
        assert!(pet.sprite().position.x > 400.0);
    }

    #[test]
    fn full_rest_cycle_ends_sitting() {
        let mut pet = pet();
        pet.update(&day(), &FakeDesktop::with_window(7, 100, 50, 300, 500));
        run_until_stopped(&mut pet, &day());

        // Five seconds of trick, then the rest walk.
        pet.advance_timers(5.0);
        assert!(pet.is_resting());
        run_until_stopped(&mut pet, &day());

        let sprite = pet.sprite();
        assert_eq!(sprite.clip, PetAnimation::Idle);
        assert!(!sprite.flip_h);
        assert!((sprite.position.x - 736.0).abs() < ARRIVE_DISTANCE);
        assert!(pet.scheduler().is_pending(PetTimer::Sit));

        pet.advance_timers(5.0);
        assert_eq!(pet.sprite().clip, PetAnimation::Sit);
        assert_eq!(pet.sprite().position.y, 553.0);
        assert!(!pet.scheduler().is_pending(PetTimer::Rest));
    }

    #[test]
    fn sit_timer_ignored_when_not_resting() {
        let mut pet = pet();
        pet.on_timer(PetTimer::Sit);
        assert_eq!(pet.sprite().clip, PetAnimation::Idle);
    }

    #[test]
    fn night_sleeps_in_place() {
        let mut pet = pet();
        let before = pet.sprite().position;

        pet.update(&night(), &FakeDesktop::empty());

        assert_eq!(pet.sprite().clip, PetAnimation::Sleep);
        assert_eq!(pet.sprite().position, before);
    }

    #[test]
    fn night_finishes_walk_at_rest_corner_then_sleeps() {
        let mut pet = pet();
        pet.update(&day(), &FakeDesktop::with_window(7, 100, 50, 300, 500));
        assert!(pet.on_movement());

        pet.update(&night(), &FakeDesktop::empty());
        assert_eq!(pet.sprite().clip, PetAnimation::Walk);
        assert_eq!(pet.goal().x, 736.0);

        run_until_stopped(&mut pet, &night());
        assert_eq!(pet.sprite().clip, PetAnimation::Idle);

        pet.update(&night(), &FakeDesktop::empty());
        assert_eq!(pet.sprite().clip, PetAnimation::Sleep);
    }

    #[test]
    fn follow_mode_chases_mouse_when_focused() {
        let mut pet = pet();
        pet.scheduler_mut().schedule_once(PetTimer::Rest, REST_DELAY);
        pet.scheduler_mut().schedule_once(PetTimer::Sit, SIT_DELAY);
        pet.on_timer(PetTimer::Rest);
        pet.toggle_follow();

        let input = FrameInput {
            mouse: Vec2::new(650.0, 300.0),
            host_focused: true,
            ..day()
        };
        pet.update(&input, &FakeDesktop::empty());

        assert_eq!(pet.goal(), Vec2::new(650.0, 550.0));
        assert_eq!(pet.sprite().clip, PetAnimation::Run);
        assert!(pet.sprite().flip_h);
        assert!(!pet.is_resting());
        assert!(!pet.scheduler().is_pending(PetTimer::Rest));
        assert!(!pet.scheduler().is_pending(PetTimer::Sit));
    }

    #[test]
    fn follow_mode_needs_focus() {
        let mut pet = pet();
        pet.toggle_follow();

        let input = FrameInput {
            mouse: Vec2::new(650.0, 300.0),
            host_focused: false,
            ..day()
        };
        pet.update(&input, &FakeDesktop::empty());

        assert!(!pet.on_movement());
        assert_eq!(pet.sprite().clip, PetAnimation::Idle);
    }

    #[test]
    fn follow_toggle_flips_back() {
        let mut pet = pet();
        pet.toggle_follow();
        assert!(pet.follow_mouse());
        pet.toggle_follow();
        assert!(!pet.follow_mouse());
    }

    #[test]
    fn resize_reanchors_to_new_floor() {
        let mut pet = pet();
        pet.resize(Vec2::new(1024.0, 768.0));
        assert_eq!(pet.sprite().position.y, 768.0 - 53.0);
    }

    #[test]
    fn shrinking_viewport_clamps_pending_goal() {
        let mut pet = pet();
        pet.goal.x = 700.0;
        pet.on_movement = true;

        pet.resize(Vec2::new(400.0, 600.0));

        assert_eq!(pet.goal().x, 400.0 - 64.0);
        assert!(pet.sprite().position.x <= 400.0 - 64.0);
        assert!(pet.on_movement());

        // The pet keeps running to the clamped goal without leaving the screen.
        let desktop = FakeDesktop::empty();
        for _ in 0..600 {
            pet.update(&day(), &desktop);
            assert!(pet.sprite().position.x <= 336.0);
        }
    }
}
