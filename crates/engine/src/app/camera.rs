use crate::map::{MapConfig, Vec2};

/// Visible area in pixels. World pixels map 1:1 to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of the visible area in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub offset: Vec2,
}

impl Camera2D {
    pub fn following(player: Vec2, viewport: Viewport, map: &MapConfig) -> Self {
        Self {
            offset: follow_offset(player, viewport, map.width, map.height),
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x - self.offset.x, world.y - self.offset.y)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        Vec2::new(screen.x + self.offset.x, screen.y + self.offset.y)
    }
}

/// Centers the player unless that would expose space outside the world. Near an
/// edge the offset saturates and the player drifts off-center. A world smaller
/// than the viewport pins that axis to 0.
pub fn follow_offset(player: Vec2, viewport: Viewport, world_width: f32, world_height: f32) -> Vec2 {
    Vec2::new(
        clamp_axis(player.x, viewport.width as f32, world_width),
        clamp_axis(player.y, viewport.height as f32, world_height),
    )
}

fn clamp_axis(player: f32, view: f32, world: f32) -> f32 {
    let max = (world - view).max(0.0);
    (player - view * 0.5).clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 960,
        height: 640,
    };

    #[test]
    fn centered_player_in_open_world() {
        let offset = follow_offset(Vec2::new(800.0, 800.0), VIEWPORT, 1600.0, 1600.0);
        assert_eq!(offset, Vec2::new(320.0, 480.0));
    }

    #[test]
    fn offset_saturates_near_edges() {
        let top_left = follow_offset(Vec2::new(20.0, 30.0), VIEWPORT, 1600.0, 1600.0);
        assert_eq!(top_left, Vec2::new(0.0, 0.0));

        let bottom_right = follow_offset(Vec2::new(1590.0, 1590.0), VIEWPORT, 1600.0, 1600.0);
        assert_eq!(bottom_right, Vec2::new(640.0, 960.0));
    }

    #[test]
    fn offset_stays_within_bounds_for_any_position() {
        for step in 0..=64 {
            let p = step as f32 * 25.0;
            let offset = follow_offset(Vec2::new(p, 1600.0 - p), VIEWPORT, 1600.0, 1600.0);
            assert!(offset.x >= 0.0 && offset.x <= 1600.0 - VIEWPORT.width as f32);
            assert!(offset.y >= 0.0 && offset.y <= 1600.0 - VIEWPORT.height as f32);
        }
    }

    #[test]
    fn small_world_pins_axis_to_zero() {
        let offset = follow_offset(Vec2::new(400.0, 900.0), VIEWPORT, 800.0, 1600.0);
        assert_eq!(offset.x, 0.0);
        assert_eq!(offset.y, 580.0);
    }

    #[test]
    fn screen_and_world_conversions_invert() {
        let camera = Camera2D {
            offset: Vec2::new(320.0, 480.0),
        };
        let world = Vec2::new(480.0, 580.0);
        let screen = camera.world_to_screen(world);
        assert_eq!(screen, Vec2::new(160.0, 100.0));
        assert_eq!(camera.screen_to_world(screen), world);
    }
}
