use glam::Vec2;

/// Height of the Windows taskbar the floor line sits on (viewport pixels).
pub const TASKBAR_HEIGHT: f32 = 46.0;

/// Named sprite clips the pet can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PetAnimation {
    Idle = 0,
    Run = 1,
    Walk = 2,
    Trick = 3,
    Sit = 4,
    Sleep = 5,
}

impl PetAnimation {
    #[cfg(test)]
    pub const ALL: [PetAnimation; 6] = [
        Self::Idle,
        Self::Run,
        Self::Walk,
        Self::Trick,
        Self::Sit,
        Self::Sleep,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Run => "Run",
            Self::Walk => "Walk",
            Self::Trick => "Trick",
            Self::Sit => "Sit",
            Self::Sleep => "Sleep",
        }
    }

    /// Vertical offset of this clip's frame relative to the others.
    /// `None` for clips that are not floor-anchored (they keep the current Y).
    fn vertical_offset(self) -> Option<f32> {
        match self {
            Self::Idle => Some(7.0),
            Self::Run => Some(4.0),
            Self::Walk => Some(3.0),
            Self::Trick => Some(-1.0),
            Self::Sit => Some(1.0),
            Self::Sleep => None,
        }
    }

    /// Distance from the viewport bottom at which the sprite centre must sit
    /// so this clip's feet land on the shared floor line.
    pub fn floor_offset(self) -> Option<f32> {
        self.vertical_offset().map(|y| y + TASKBAR_HEIGHT)
    }

    /// Sprite Y for this clip in a viewport of the given height.
    pub fn floor_y(self, viewport_h: f32) -> Option<f32> {
        self.floor_offset().map(|offset| viewport_h - offset)
    }

    /// Frame size in pixels. Idle is the base size used for goal clamping.
    pub fn frame_size(self) -> Vec2 {
        match self {
            Self::Idle | Self::Sleep => Vec2::new(64.0, 49.0),
            Self::Run => Vec2::new(64.0, 43.0),
            Self::Walk => Vec2::new(64.0, 41.0),
            Self::Trick => Vec2::new(64.0, 33.0),
            Self::Sit => Vec2::new(48.0, 37.0),
        }
    }

    /// Playback rate of the procedural frame cycle (cycles per second).
    pub fn playback_rate(self) -> f32 {
        match self {
            Self::Run => 2.5,
            Self::Walk => 1.2,
            Self::Trick => 1.5,
            Self::Idle | Self::Sit => 0.5,
            Self::Sleep => 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_include_taskbar() {
        assert_eq!(PetAnimation::Idle.floor_offset(), Some(53.0));
        assert_eq!(PetAnimation::Run.floor_offset(), Some(50.0));
        assert_eq!(PetAnimation::Walk.floor_offset(), Some(49.0));
        assert_eq!(PetAnimation::Trick.floor_offset(), Some(45.0));
        assert_eq!(PetAnimation::Sit.floor_offset(), Some(47.0));
    }

    #[test]
    fn sleep_is_not_floor_anchored() {
        assert_eq!(PetAnimation::Sleep.floor_offset(), None);
        assert_eq!(PetAnimation::Sleep.floor_y(600.0), None);
    }

    #[test]
    fn feet_share_one_floor_line() {
        // Sprites are drawn centred, so bottom edge = floor_y + h / 2.
        let viewport_h = 600.0;
        let idle = PetAnimation::Idle;
        let floor = idle.floor_y(viewport_h).unwrap() + idle.frame_size().y / 2.0;
        for clip in PetAnimation::ALL {
            if let Some(y) = clip.floor_y(viewport_h) {
                let bottom = y + clip.frame_size().y / 2.0;
                assert!((bottom - floor).abs() < 1.0, "{} feet at {bottom}", clip.label());
            }
        }
    }
}
