//! Day/night cycle based on the local wall clock.
//! Night sends the pet to sleep.

use chrono::Timelike;

/// First hour of the day.
const NIGHT_ENDS_AT: u32 = 6;

/// Time-of-day state computed from the system clock.
#[derive(Debug, Clone, Copy)]
pub struct DayNightState {
    /// Current local hour (0-23).
    pub hour: u32,
}

impl DayNightState {
    pub fn new() -> Self {
        let mut s = Self { hour: 12 };
        s.update();
        s
    }

    /// Refresh from system clock. Call once per frame or less.
    pub fn update(&mut self) {
        self.hour = chrono::Local::now().hour();
    }

    pub fn is_night(&self) -> bool {
        is_night_hour(self.hour)
    }
}

/// Hours 0 through 5 are night.
pub fn is_night_hour(hour: u32) -> bool {
    hour < NIGHT_ENDS_AT
}
