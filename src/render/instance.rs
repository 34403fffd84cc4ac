use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::pet::PetSprite;

/// Fur colour, RGBA packed as u32.
const PET_COLOR: u32 = 0xFFA5_32FF;

/// Per-instance data uploaded to GPU each frame.
/// Stride = 28 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PetInstance {
    /// Sprite centre in screen pixels.
    pub position: [f32; 2],
    /// Frame size in pixels. Negative width mirrors the sprite.
    pub size: [f32; 2],
    /// RGBA color packed as u32.
    pub color: u32,
    /// Clip index (`PetAnimation as u32`).
    pub clip: u32,
    /// Playback position within the clip's frame cycle, in cycles.
    pub phase: f32,
}

impl PetInstance {
    /// Build the instance for this frame, interpolating position between ticks.
    pub fn from_sprite(
        sprite: &PetSprite,
        prev_position: Vec2,
        alpha: f32,
        clip_time: f32,
    ) -> Self {
        let interp = Vec2::lerp(prev_position, sprite.position, alpha);
        let frame = sprite.clip.frame_size();
        let width = if sprite.flip_h { -frame.x } else { frame.x };

        Self {
            position: interp.into(),
            size: [width, frame.y],
            color: PET_COLOR,
            clip: sprite.clip as u32,
            phase: clip_time * sprite.clip.playback_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::animation::PetAnimation;

    #[test]
    fn flip_mirrors_width() {
        let sprite = PetSprite {
            position: Vec2::new(100.0, 550.0),
            clip: PetAnimation::Run,
            flip_h: true,
        };
        let inst = PetInstance::from_sprite(&sprite, sprite.position, 1.0, 0.0);
        assert_eq!(inst.size, [-64.0, 43.0]);
        assert_eq!(inst.clip, 1);
    }

    #[test]
    fn interpolates_between_ticks() {
        let sprite = PetSprite {
            position: Vec2::new(110.0, 547.0),
            clip: PetAnimation::Idle,
            flip_h: false,
        };
        let inst = PetInstance::from_sprite(&sprite, Vec2::new(100.0, 547.0), 0.5, 2.0);
        assert_eq!(inst.position, [105.0, 547.0]);
        assert_eq!(inst.phase, 1.0);
    }
}
