use super::input::Direction;
use crate::map::Vec2;

pub const JOYSTICK_DEFAULT_RADIUS: f32 = 50.0;
pub const JOYSTICK_DEFAULT_DEAD_ZONE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickConfig {
    pub radius: f32,
    pub dead_zone: f32,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            radius: JOYSTICK_DEFAULT_RADIUS,
            dead_zone: JOYSTICK_DEFAULT_DEAD_ZONE,
        }
    }
}

/// On-screen stick. Holds at most one dominant direction at a time.
#[derive(Debug, Clone, Copy)]
pub struct VirtualJoystick {
    config: JoystickConfig,
    center: Option<Vec2>,
    knob_offset: Vec2,
    token: Option<Direction>,
}

impl VirtualJoystick {
    pub fn new(config: JoystickConfig) -> Self {
        Self {
            config,
            center: None,
            knob_offset: Vec2::ZERO,
            token: None,
        }
    }

    pub fn config(&self) -> JoystickConfig {
        self.config
    }

    pub fn begin(&mut self, center: Vec2, touch: Vec2) -> Option<Direction> {
        self.center = Some(center);
        self.update(touch)
    }

    pub fn update(&mut self, touch: Vec2) -> Option<Direction> {
        let Some(center) = self.center else {
            return None;
        };
        let raw = Vec2::new(touch.x - center.x, touch.y - center.y);
        self.knob_offset = clamp_offset(raw, self.config.radius);
        self.token = quantize_direction(self.knob_offset, self.config.dead_zone);
        self.token
    }

    pub fn end(&mut self) {
        self.center = None;
        self.knob_offset = Vec2::ZERO;
        self.token = None;
    }

    pub fn is_active(&self) -> bool {
        self.center.is_some()
    }

    pub fn center(&self) -> Option<Vec2> {
        self.center
    }

    pub fn knob_offset(&self) -> Vec2 {
        self.knob_offset
    }

    pub fn token(&self) -> Option<Direction> {
        self.token
    }
}

pub fn clamp_offset(offset: Vec2, radius: f32) -> Vec2 {
    let length = offset.length();
    if length <= radius || length == 0.0 {
        return offset;
    }
    let scale = radius / length;
    Vec2::new(offset.x * scale, offset.y * scale)
}

/// Maps a stick offset (screen space, y down) to the sector it points into.
/// Sector lower bounds are inclusive: right [-45, 45), down [45, 135), up [-135, -45),
/// left everything else. Compared on components so the 45 degree diagonals land
/// exactly on their documented side.
pub fn quantize_direction(offset: Vec2, dead_zone: f32) -> Option<Direction> {
    if offset.length() <= dead_zone {
        return None;
    }
    let Vec2 { x: dx, y: dy } = offset;
    let direction = if dx > 0.0 && dy >= -dx && dy < dx {
        Direction::Right
    } else if dy > 0.0 && dy >= dx && dy > -dx {
        Direction::Down
    } else if dy < 0.0 && dx < -dy && dx >= dy {
        Direction::Up
    } else {
        Direction::Left
    };
    Some(direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_inside_dead_zone_produce_no_token() {
        assert_eq!(quantize_direction(Vec2::new(5.0, 5.0), 10.0), None);
        assert_eq!(quantize_direction(Vec2::new(10.0, 0.0), 10.0), None);
        assert_eq!(
            quantize_direction(Vec2::new(10.5, 0.0), 10.0),
            Some(Direction::Right)
        );
    }

    #[test]
    fn sectors_follow_screen_space_angles() {
        let cases = [
            (Vec2::new(30.0, 0.0), Direction::Right),
            (Vec2::new(30.0, 29.0), Direction::Right),
            (Vec2::new(0.0, 30.0), Direction::Down),
            (Vec2::new(-30.0, 0.0), Direction::Left),
            (Vec2::new(0.0, -30.0), Direction::Up),
            (Vec2::new(-30.0, -29.0), Direction::Left),
            (Vec2::new(-29.0, -30.0), Direction::Up),
        ];
        for (offset, expected) in cases {
            assert_eq!(quantize_direction(offset, 10.0), Some(expected), "{offset:?}");
        }
    }

    #[test]
    fn sector_lower_bounds_are_inclusive() {
        let diagonals = [
            (Vec2::new(20.0, 20.0), Direction::Down),
            (Vec2::new(20.0, -20.0), Direction::Right),
            (Vec2::new(-20.0, -20.0), Direction::Up),
            (Vec2::new(-20.0, 20.0), Direction::Left),
        ];
        for (offset, expected) in diagonals {
            assert_eq!(quantize_direction(offset, 10.0), Some(expected), "{offset:?}");
        }
    }

    #[test]
    fn knob_offset_is_clamped_to_radius() {
        let mut stick = VirtualJoystick::new(JoystickConfig::default());
        let token = stick.begin(Vec2::new(100.0, 100.0), Vec2::new(100.0, 300.0));
        assert_eq!(token, Some(Direction::Down));
        let knob = stick.knob_offset();
        assert!((knob.length() - JOYSTICK_DEFAULT_RADIUS).abs() < 0.001);
        assert!((knob.y - JOYSTICK_DEFAULT_RADIUS).abs() < 0.001);
    }

    #[test]
    fn update_without_begin_is_ignored() {
        let mut stick = VirtualJoystick::new(JoystickConfig::default());
        assert_eq!(stick.update(Vec2::new(500.0, 0.0)), None);
        assert!(!stick.is_active());
    }

    #[test]
    fn moving_back_into_dead_zone_drops_token() {
        let mut stick = VirtualJoystick::new(JoystickConfig::default());
        let center = Vec2::new(50.0, 50.0);
        assert_eq!(
            stick.begin(center, Vec2::new(90.0, 50.0)),
            Some(Direction::Right)
        );
        assert_eq!(stick.update(Vec2::new(52.0, 51.0)), None);
        assert!(stick.is_active());
        stick.end();
        assert!(!stick.is_active());
        assert_eq!(stick.knob_offset(), Vec2::ZERO);
    }
}
