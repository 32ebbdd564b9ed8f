use crate::app::Camera2D;
use crate::map::{Building, Vec2};

use super::canvas::ScreenRect;

/// Focused buildings are drawn this much larger around their center.
pub const FOCUS_SCALE: f32 = 1.1;

pub fn world_to_screen_px(world: Vec2, camera: &Camera2D) -> (i32, i32) {
    let screen = camera.world_to_screen(world);
    (screen.x.round() as i32, screen.y.round() as i32)
}

pub(crate) fn building_screen_rect(
    building: &Building,
    camera: &Camera2D,
    focused: bool,
) -> ScreenRect {
    let scale = if focused { FOCUS_SCALE } else { 1.0 };
    let (cx, cy) = world_to_screen_px(building.center, camera);
    let width = (building.footprint.width * scale).round() as i32;
    let height = (building.footprint.height * scale).round() as i32;
    ScreenRect::centered(cx, cy, width, height)
}

/// Whether a rect intersects a `width` x `height` viewport grown by `padding`.
pub(crate) fn rect_visible(rect: ScreenRect, width: u32, height: u32, padding: i32) -> bool {
    rect.left + rect.width >= -padding
        && rect.top + rect.height >= -padding
        && rect.left <= width as i32 + padding
        && rect.top <= height as i32 + padding
}
