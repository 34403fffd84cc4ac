use std::time::Duration;

/// One-shot timers the pet controller arms and cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PetTimer {
    /// Idle long enough: start walking to the rest corner.
    Rest = 0,
    /// Reached the rest corner: sit down.
    Sit = 1,
}

impl PetTimer {
    pub const ALL: [PetTimer; 2] = [Self::Rest, Self::Sit];
}

/// Fire-once scheduling seam between the controller and its host.
///
/// Scheduling a timer that is already pending restarts it.
pub trait Scheduler {
    fn schedule_once(&mut self, timer: PetTimer, after: Duration);
    fn cancel(&mut self, timer: PetTimer);
}

/// Timers driven by the host frame loop.
///
/// Each pending timer stores its remaining seconds; `advance` counts them
/// down and reports the ones that reached zero.
#[derive(Debug, Default)]
pub struct FrameTimers {
    remaining: [Option<f32>; 2],
}

impl FrameTimers {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_pending(&self, timer: PetTimer) -> bool {
        self.remaining[timer as usize].is_some()
    }

    /// Count down by `dt` seconds. Returns fired timers in `PetTimer::ALL` order.
    pub fn advance(&mut self, dt: f32) -> Vec<PetTimer> {
        let mut fired = Vec::new();
        for timer in PetTimer::ALL {
            let slot = &mut self.remaining[timer as usize];
            if let Some(left) = slot {
                *left -= dt;
                if *left <= 0.0 {
                    *slot = None;
                    fired.push(timer);
                }
            }
        }
        fired
    }
}

impl Scheduler for FrameTimers {
    fn schedule_once(&mut self, timer: PetTimer, after: Duration) {
        self.remaining[timer as usize] = Some(after.as_secs_f32());
    }

    fn cancel(&mut self, timer: PetTimer) {
        self.remaining[timer as usize] = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_duration() {
        let mut timers = FrameTimers::new();
        timers.schedule_once(PetTimer::Rest, Duration::from_secs(5));

        assert!(timers.advance(4.0).is_empty());
        assert_eq!(timers.advance(1.0), vec![PetTimer::Rest]);
        assert!(!timers.is_pending(PetTimer::Rest));
        assert!(timers.advance(10.0).is_empty());
    }

    #[test]
    fn cancel_before_fire() {
        let mut timers = FrameTimers::new();
        timers.schedule_once(PetTimer::Sit, Duration::from_secs(5));
        timers.cancel(PetTimer::Sit);

        assert!(!timers.is_pending(PetTimer::Sit));
        assert!(timers.advance(6.0).is_empty());
    }

    #[test]
    fn reschedule_restarts_countdown() {
        let mut timers = FrameTimers::new();
        timers.schedule_once(PetTimer::Rest, Duration::from_secs(5));
        timers.advance(4.0);
        timers.schedule_once(PetTimer::Rest, Duration::from_secs(5));

        assert!(timers.advance(4.0).is_empty());
        assert_eq!(timers.advance(1.5), vec![PetTimer::Rest]);
    }
}
