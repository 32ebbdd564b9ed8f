use std::time::Duration;

use super::movement::Facing;

pub const FRAME_COUNT: usize = 4;
pub const STANDING_FRAME: usize = 1;
pub const DEFAULT_ANIMATION_FPS: u32 = 8;

/// Cell of a character sprite sheet: one row per facing, one column per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteFrame {
    pub row: usize,
    pub column: usize,
}

/// Walk cycle driven by wall time, not by movement speed.
#[derive(Debug, Clone)]
pub struct SpriteAnimator {
    frame: usize,
    facing: Facing,
    frame_interval: Duration,
    since_advance: Duration,
}

impl SpriteAnimator {
    pub fn new(fps: u32) -> Self {
        let fps = if fps == 0 { DEFAULT_ANIMATION_FPS } else { fps };
        Self {
            frame: STANDING_FRAME,
            facing: Facing::default(),
            frame_interval: Duration::from_secs_f64(1.0 / fps as f64),
            since_advance: Duration::ZERO,
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    pub fn current(&self) -> SpriteFrame {
        SpriteFrame {
            row: self.facing.sprite_row(),
            column: self.frame,
        }
    }

    /// Advances at most one frame per call. Time left over after an advance
    /// carries into the next interval, so the cycle rate holds at any update
    /// rate faster than the frame rate. Turning while moving keeps the cycle
    /// position; stopping snaps to the standing frame.
    pub fn update(&mut self, facing: Facing, moving: bool, dt: Duration) -> SpriteFrame {
        self.facing = facing;
        if !moving {
            self.frame = STANDING_FRAME;
            self.since_advance = Duration::ZERO;
            return self.current();
        }
        self.since_advance = self.since_advance.saturating_add(dt);
        if self.since_advance >= self.frame_interval {
            self.frame = (self.frame + 1) % FRAME_COUNT;
            self.since_advance -= self.frame_interval;
            // A stall longer than two intervals drops the backlog.
            if self.since_advance >= self.frame_interval {
                self.since_advance = Duration::ZERO;
            }
        }
        self.current()
    }
}

impl Default for SpriteAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_FPS)
    }
}
