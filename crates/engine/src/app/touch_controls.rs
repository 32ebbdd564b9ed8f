use super::camera::Viewport;
use super::hud::HudAction;
use super::input::Direction;
use crate::map::{Rect, Vec2};

pub const JOYSTICK_BASE_INSET: f32 = 90.0;
/// The base accepts touches a little outside the knob's travel.
pub const JOYSTICK_GRAB_SCALE: f32 = 1.4;
pub const DPAD_INSET: f32 = 110.0;
pub const DPAD_BUTTON_SIZE: f32 = 44.0;
pub const DPAD_SPACING: f32 = 48.0;
pub const HUD_BUTTON_SIZE: f32 = 36.0;
pub const HUD_BUTTON_MARGIN: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Joystick,
    Button(Direction),
    Hud(HudAction),
    World,
}

/// Screen-space placement of the on-screen controls for one viewport size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchLayout {
    pub joystick_base: Vec2,
    pub joystick_grab_radius: f32,
    pub dpad_center: Vec2,
    pub character_button: Rect,
    pub inventory_button: Rect,
}

impl TouchLayout {
    pub fn for_viewport(viewport: Viewport, joystick_radius: f32) -> Self {
        let width = viewport.width as f32;
        let height = viewport.height as f32;
        let hud_y = HUD_BUTTON_MARGIN + HUD_BUTTON_SIZE * 0.5;
        let inventory_x = width - HUD_BUTTON_MARGIN - HUD_BUTTON_SIZE * 0.5;
        let character_x = inventory_x - HUD_BUTTON_SIZE - HUD_BUTTON_MARGIN;
        Self {
            joystick_base: Vec2::new(JOYSTICK_BASE_INSET, height - JOYSTICK_BASE_INSET),
            joystick_grab_radius: joystick_radius * JOYSTICK_GRAB_SCALE,
            dpad_center: Vec2::new(width - DPAD_INSET, height - DPAD_INSET),
            character_button: Rect::from_center(
                Vec2::new(character_x, hud_y),
                HUD_BUTTON_SIZE,
                HUD_BUTTON_SIZE,
            ),
            inventory_button: Rect::from_center(
                Vec2::new(inventory_x, hud_y),
                HUD_BUTTON_SIZE,
                HUD_BUTTON_SIZE,
            ),
        }
    }

    pub fn button_rect(&self, direction: Direction) -> Rect {
        let (ux, uy) = direction.unit();
        let center = self
            .dpad_center
            .offset(ux * DPAD_SPACING, uy * DPAD_SPACING);
        Rect::from_center(center, DPAD_BUTTON_SIZE, DPAD_BUTTON_SIZE)
    }

    /// Controls are tested before the world; HUD buttons win over everything.
    pub fn hit_test(&self, point: Vec2) -> PointerTarget {
        if self.character_button.contains_inclusive(point) {
            return PointerTarget::Hud(HudAction::CharacterSheet);
        }
        if self.inventory_button.contains_inclusive(point) {
            return PointerTarget::Hud(HudAction::Inventory);
        }
        if point.distance(self.joystick_base) <= self.joystick_grab_radius {
            return PointerTarget::Joystick;
        }
        Direction::ALL
            .into_iter()
            .find(|direction| self.button_rect(*direction).contains_inclusive(point))
            .map(PointerTarget::Button)
            .unwrap_or(PointerTarget::World)
    }
}
