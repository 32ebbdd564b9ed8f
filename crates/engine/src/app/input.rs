use tracing::debug;

use super::joystick::{JoystickConfig, VirtualJoystick};
use crate::map::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

const DIRECTION_COUNT: usize = 4;

impl Direction {
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Unit step in world space (y grows downward).
    pub const fn unit(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Held direction tokens. `Copy` so a tick can read a frozen snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionSet {
    held: [bool; DIRECTION_COUNT],
}

impl DirectionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, direction: Direction) -> Self {
        self.insert(direction);
        self
    }

    pub fn insert(&mut self, direction: Direction) {
        self.held[direction.index()] = true;
    }

    pub fn remove(&mut self, direction: Direction) {
        self.held[direction.index()] = false;
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.held[direction.index()]
    }

    pub fn clear(&mut self) {
        self.held = [false; DIRECTION_COUNT];
    }

    pub fn is_empty(&self) -> bool {
        !self.held.iter().any(|held| *held)
    }

    pub fn union(self, other: DirectionSet) -> DirectionSet {
        let mut held = self.held;
        for (slot, other_held) in held.iter_mut().zip(other.held) {
            *slot |= other_held;
        }
        DirectionSet { held }
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

/// Collects direction tokens from every input producer.
///
/// Each producer keeps its own set so releasing a key never drops a token that a
/// button or the joystick still holds. The simulator only ever sees the union
/// returned by [`InputAggregator::snapshot_for_tick`].
#[derive(Debug, Clone)]
pub struct InputAggregator {
    keyboard: DirectionSet,
    buttons: DirectionSet,
    joystick: VirtualJoystick,
    tap_target: Option<Vec2>,
}

impl InputAggregator {
    pub fn new(joystick: JoystickConfig) -> Self {
        Self {
            keyboard: DirectionSet::empty(),
            buttons: DirectionSet::empty(),
            joystick: VirtualJoystick::new(joystick),
            tap_target: None,
        }
    }

    pub fn key_down(&mut self, direction: Direction) {
        self.cancel_tap();
        self.keyboard.insert(direction);
    }

    pub fn key_up(&mut self, direction: Direction) {
        self.keyboard.remove(direction);
    }

    pub fn button_press(&mut self, direction: Direction) {
        self.cancel_tap();
        self.buttons.insert(direction);
    }

    pub fn button_release(&mut self, direction: Direction) {
        self.buttons.remove(direction);
    }

    pub fn touch_start(&mut self, knob_center: Vec2, touch: Vec2) -> Option<Direction> {
        self.cancel_tap();
        self.joystick.begin(knob_center, touch)
    }

    pub fn touch_move(&mut self, touch: Vec2) -> Option<Direction> {
        self.joystick.update(touch)
    }

    /// Ending a touch is a modality switch: every held token is dropped.
    pub fn touch_end(&mut self) {
        self.clear_all();
    }

    pub fn tap_to_move(&mut self, target: Vec2) {
        debug!(x = target.x, y = target.y, "tap_target_set");
        self.tap_target = Some(target);
    }

    pub fn cancel_tap(&mut self) {
        self.tap_target = None;
    }

    pub fn tap_target(&self) -> Option<Vec2> {
        self.tap_target
    }

    pub fn joystick(&self) -> &VirtualJoystick {
        &self.joystick
    }

    pub fn clear_all(&mut self) {
        self.keyboard.clear();
        self.buttons.clear();
        self.joystick.end();
        self.tap_target = None;
    }

    pub fn is_idle(&self) -> bool {
        self.keyboard.is_empty()
            && self.buttons.is_empty()
            && self.joystick.token().is_none()
            && self.tap_target.is_none()
    }

    /// Union of all producers for one tick. A tap destination contributes axis
    /// tokens while more than `arrival_threshold` remains on that axis and is
    /// dropped once both axes are within it.
    pub fn snapshot_for_tick(&mut self, player: Vec2, arrival_threshold: f32) -> DirectionSet {
        let mut tokens = self.keyboard.union(self.buttons);
        if let Some(direction) = self.joystick.token() {
            tokens.insert(direction);
        }
        if let Some(target) = self.tap_target {
            let tap_tokens = tap_tokens_toward(player, target, arrival_threshold);
            if tap_tokens.is_empty() {
                debug!("tap_target_reached");
                self.tap_target = None;
            }
            tokens = tokens.union(tap_tokens);
        }
        tokens
    }
}

fn tap_tokens_toward(player: Vec2, target: Vec2, arrival_threshold: f32) -> DirectionSet {
    let mut tokens = DirectionSet::empty();
    let dx = target.x - player.x;
    let dy = target.y - player.y;
    if dx > arrival_threshold {
        tokens.insert(Direction::Right);
    } else if dx < -arrival_threshold {
        tokens.insert(Direction::Left);
    }
    if dy > arrival_threshold {
        tokens.insert(Direction::Down);
    } else if dy < -arrival_threshold {
        tokens.insert(Direction::Up);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: Vec2 = Vec2 { x: 400.0, y: 400.0 };

    fn aggregator() -> InputAggregator {
        InputAggregator::new(JoystickConfig::default())
    }

    #[test]
    fn keyboard_tokens_accumulate_for_diagonals() {
        let mut input = aggregator();
        input.key_down(Direction::Up);
        input.key_down(Direction::Left);
        let tokens = input.snapshot_for_tick(PLAYER, 4.0);
        assert!(tokens.contains(Direction::Up));
        assert!(tokens.contains(Direction::Left));
        assert!(!tokens.contains(Direction::Down));

        input.key_up(Direction::Up);
        let tokens = input.snapshot_for_tick(PLAYER, 4.0);
        assert_eq!(tokens, DirectionSet::empty().with(Direction::Left));
    }

    #[test]
    fn producers_are_unioned_without_privilege() {
        let mut input = aggregator();
        input.key_down(Direction::Right);
        input.button_press(Direction::Right);
        input.key_up(Direction::Right);

        // The button still holds the token after the key is released.
        let tokens = input.snapshot_for_tick(PLAYER, 4.0);
        assert!(tokens.contains(Direction::Right));

        input.button_release(Direction::Right);
        assert!(input.snapshot_for_tick(PLAYER, 4.0).is_empty());
    }

    #[test]
    fn joystick_contributes_single_dominant_token() {
        let mut input = aggregator();
        let center = Vec2::new(90.0, 500.0);
        input.touch_start(center, Vec2::new(90.0, 470.0));
        let tokens = input.snapshot_for_tick(PLAYER, 4.0);
        assert_eq!(tokens, DirectionSet::empty().with(Direction::Up));

        input.touch_move(Vec2::new(130.0, 505.0));
        let tokens = input.snapshot_for_tick(PLAYER, 4.0);
        assert_eq!(tokens, DirectionSet::empty().with(Direction::Right));
    }

    #[test]
    fn touch_end_clears_every_producer() {
        let mut input = aggregator();
        input.key_down(Direction::Down);
        input.button_press(Direction::Left);
        input.touch_start(Vec2::new(0.0, 0.0), Vec2::new(0.0, -40.0));
        input.touch_end();
        assert!(input.snapshot_for_tick(PLAYER, 4.0).is_empty());
        assert!(input.is_idle());
        assert!(!input.joystick().is_active());
    }

    #[test]
    fn tap_target_steers_until_arrival() {
        let mut input = aggregator();
        input.tap_to_move(Vec2::new(500.0, 300.0));
        let tokens = input.snapshot_for_tick(PLAYER, 4.0);
        assert_eq!(
            tokens,
            DirectionSet::empty()
                .with(Direction::Right)
                .with(Direction::Up)
        );

        let tokens = input.snapshot_for_tick(Vec2::new(498.0, 302.0), 4.0);
        assert!(tokens.is_empty());
        assert_eq!(input.tap_target(), None);
    }

    #[test]
    fn directional_input_cancels_tap_target() {
        let mut input = aggregator();
        input.tap_to_move(Vec2::new(900.0, 400.0));
        input.key_down(Direction::Up);
        assert_eq!(input.tap_target(), None);
        let tokens = input.snapshot_for_tick(PLAYER, 4.0);
        assert_eq!(tokens, DirectionSet::empty().with(Direction::Up));
    }

    #[test]
    fn canceling_tokens_are_both_reported() {
        let mut input = aggregator();
        input.key_down(Direction::Up);
        input.key_down(Direction::Down);
        let tokens = input.snapshot_for_tick(PLAYER, 4.0);
        assert_eq!(tokens.iter().count(), 2);
    }
}
