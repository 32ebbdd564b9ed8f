use std::f32::consts::FRAC_1_SQRT_2;
use std::time::Duration;

use tracing::debug;

use super::input::DirectionSet;
use crate::map::{TownMap, Vec2};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Row of the facing inside a four-row character sprite sheet.
    pub const fn sprite_row(self) -> usize {
        match self {
            Facing::Down => 0,
            Facing::Left => 1,
            Facing::Right => 2,
            Facing::Up => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// No tokens, or tokens that cancel out.
    Idle,
    /// `slid_along` is set when only one axis of a diagonal could be applied.
    Moved {
        delta: Vec2,
        slid_along: Option<Axis>,
    },
    /// Every candidate was unwalkable; the displacement was dropped.
    Blocked,
}

/// Coarse minimum-elapsed-time gate. A tick is admitted once `min_interval` has
/// passed since the previous admitted tick; admitting resets the reference point,
/// so there is no catch-up after a slow frame.
#[derive(Debug, Clone, Copy)]
pub struct TickGate {
    min_interval: Duration,
    last_admitted: Option<Duration>,
}

impl TickGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn admit(&mut self, now: Duration) -> bool {
        if let Some(last) = self.last_admitted {
            if now.saturating_sub(last) < self.min_interval {
                return false;
            }
        }
        self.last_admitted = Some(now);
        true
    }
}

pub fn displacement_for(tokens: DirectionSet, speed: f32) -> Vec2 {
    let mut dx = 0.0;
    let mut dy = 0.0;
    for direction in tokens.iter() {
        let (ux, uy) = direction.unit();
        dx += ux * speed;
        dy += uy * speed;
    }
    if dx != 0.0 && dy != 0.0 {
        dx *= FRAC_1_SQRT_2;
        dy *= FRAC_1_SQRT_2;
    }
    Vec2::new(dx, dy)
}

/// Axis with the larger contribution wins; vertical wins exact ties.
pub fn facing_for(delta: Vec2) -> Option<Facing> {
    if delta.is_zero() {
        return None;
    }
    let facing = if delta.y.abs() >= delta.x.abs() {
        if delta.y < 0.0 {
            Facing::Up
        } else {
            Facing::Down
        }
    } else if delta.x < 0.0 {
        Facing::Left
    } else {
        Facing::Right
    };
    Some(facing)
}

/// Sole owner and writer of the player position.
#[derive(Debug, Clone)]
pub struct MovementSimulator {
    position: Vec2,
    facing: Facing,
    moving: bool,
}

impl MovementSimulator {
    pub fn at_spawn(map: &TownMap) -> Self {
        Self {
            position: map.config().spawn,
            facing: Facing::default(),
            moving: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn step(&mut self, map: &TownMap, tokens: DirectionSet) -> StepOutcome {
        let config = map.config();
        let delta = displacement_for(tokens, config.player_speed);
        if delta.is_zero() {
            self.moving = false;
            return StepOutcome::Idle;
        }

        let margin = config.walk_margin;
        let Some((applied, slid_along)) = resolve_with_sliding(map, self.position, delta, margin)
        else {
            debug!(
                x = self.position.x,
                y = self.position.y,
                dx = delta.x,
                dy = delta.y,
                "movement_blocked"
            );
            self.moving = false;
            return StepOutcome::Blocked;
        };

        self.position = self.position.offset(applied.x, applied.y);
        self.moving = true;
        if let Some(facing) = facing_for(applied) {
            self.facing = facing;
        }
        StepOutcome::Moved {
            delta: applied,
            slid_along,
        }
    }
}

fn resolve_with_sliding(
    map: &TownMap,
    from: Vec2,
    delta: Vec2,
    margin: f32,
) -> Option<(Vec2, Option<Axis>)> {
    if map.is_walkable(from.offset(delta.x, delta.y), margin) {
        return Some((delta, None));
    }
    if delta.x == 0.0 || delta.y == 0.0 {
        return None;
    }
    if map.is_walkable(from.offset(delta.x, 0.0), margin) {
        return Some((Vec2::new(delta.x, 0.0), Some(Axis::Horizontal)));
    }
    if map.is_walkable(from.offset(0.0, delta.y), margin) {
        return Some((Vec2::new(0.0, delta.y), Some(Axis::Vertical)));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::Direction;
    use crate::map::{Building, Footprint, LocationId, MapConfig};

    const SPEED: f32 = 4.0;

    fn config(spawn: Vec2) -> MapConfig {
        MapConfig {
            spawn,
            player_speed: SPEED,
            ..MapConfig::default()
        }
    }

    fn block(id: &str, x: f32, y: f32, w: f32, h: f32) -> Building {
        Building {
            id: id.to_string(),
            name: id.to_string(),
            location: LocationId::new(id),
            center: Vec2::new(x, y),
            footprint: Footprint {
                width: w,
                height: h,
            },
            unlock_level: 1,
            asset: String::new(),
            description: String::new(),
        }
    }

    fn tokens(directions: &[Direction]) -> DirectionSet {
        directions
            .iter()
            .fold(DirectionSet::empty(), |set, direction| set.with(*direction))
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 0.0001,
            "{actual} vs {expected}"
        );
    }

    #[test]
    fn orthogonal_tokens_are_normalized() {
        let delta = displacement_for(tokens(&[Direction::Up, Direction::Right]), SPEED);
        assert_close(delta.x, SPEED / 2f32.sqrt());
        assert_close(delta.y, -SPEED / 2f32.sqrt());
        assert_close(delta.length(), SPEED);

        let axis = displacement_for(tokens(&[Direction::Left]), SPEED);
        assert_eq!(axis, Vec2::new(-SPEED, 0.0));
    }

    #[test]
    fn opposing_tokens_cancel_to_idle() {
        let map = TownMap::new(config(Vec2::new(800.0, 800.0)), Vec::new());
        let mut sim = MovementSimulator::at_spawn(&map);
        sim.step(&map, tokens(&[Direction::Left]));
        assert!(sim.is_moving());

        let outcome = sim.step(&map, tokens(&[Direction::Up, Direction::Down]));
        assert_eq!(outcome, StepOutcome::Idle);
        assert!(!sim.is_moving());
        assert_eq!(sim.facing(), Facing::Left);
        assert_eq!(sim.position(), Vec2::new(796.0, 800.0));
    }

    #[test]
    fn diagonal_blocked_slides_horizontally() {
        let map = TownMap::new(
            config(Vec2::new(300.0, 300.0)),
            vec![block("wall", 300.0, 330.0, 200.0, 24.0)],
        );
        let mut sim = MovementSimulator::at_spawn(&map);
        let delta = displacement_for(tokens(&[Direction::Down, Direction::Right]), SPEED);
        let outcome = sim.step(&map, tokens(&[Direction::Down, Direction::Right]));

        assert_eq!(
            outcome,
            StepOutcome::Moved {
                delta: Vec2::new(delta.x, 0.0),
                slid_along: Some(Axis::Horizontal),
            }
        );
        assert_eq!(sim.position(), Vec2::new(300.0 + delta.x, 300.0));
        assert_eq!(sim.facing(), Facing::Right);
    }

    #[test]
    fn diagonal_blocked_slides_vertically() {
        let map = TownMap::new(
            config(Vec2::new(300.0, 300.0)),
            vec![block("wall", 330.0, 300.0, 24.0, 200.0)],
        );
        let mut sim = MovementSimulator::at_spawn(&map);
        let delta = displacement_for(tokens(&[Direction::Down, Direction::Right]), SPEED);
        let outcome = sim.step(&map, tokens(&[Direction::Down, Direction::Right]));

        assert_eq!(
            outcome,
            StepOutcome::Moved {
                delta: Vec2::new(0.0, delta.y),
                slid_along: Some(Axis::Vertical),
            }
        );
        assert_eq!(sim.position(), Vec2::new(300.0, 300.0 + delta.y));
        assert_eq!(sim.facing(), Facing::Down);
    }

    #[test]
    fn fully_blocked_tick_drops_displacement() {
        let map = TownMap::new(config(Vec2::new(17.0, 17.0)), Vec::new());
        let mut sim = MovementSimulator::at_spawn(&map);
        let outcome = sim.step(&map, tokens(&[Direction::Up, Direction::Left]));

        assert_eq!(outcome, StepOutcome::Blocked);
        assert!(!sim.is_moving());
        assert_eq!(sim.position(), Vec2::new(17.0, 17.0));
        assert_eq!(sim.facing(), Facing::Down);
    }

    #[test]
    fn facing_prefers_vertical_on_ties() {
        assert_eq!(facing_for(Vec2::new(2.0, -2.0)), Some(Facing::Up));
        assert_eq!(facing_for(Vec2::new(-2.0, 2.0)), Some(Facing::Down));
        assert_eq!(facing_for(Vec2::new(-3.0, 2.0)), Some(Facing::Left));
        assert_eq!(facing_for(Vec2::new(3.0, -2.0)), Some(Facing::Right));
        assert_eq!(facing_for(Vec2::ZERO), None);
    }

    #[test]
    fn long_walk_never_leaves_walkable_space() {
        let map = TownMap::new(
            config(Vec2::new(400.0, 400.0)),
            vec![
                block("a", 480.0, 400.0, 96.0, 48.0),
                block("b", 400.0, 300.0, 60.0, 60.0),
            ],
        );
        let pattern = [
            tokens(&[Direction::Right]),
            tokens(&[Direction::Up, Direction::Right]),
            tokens(&[Direction::Up]),
            tokens(&[Direction::Left, Direction::Up]),
            tokens(&[Direction::Left]),
            tokens(&[Direction::Down]),
        ];
        let mut sim = MovementSimulator::at_spawn(&map);
        for (i, held) in pattern.iter().cycle().take(6 * 400).enumerate() {
            sim.step(&map, *held);
            assert!(
                map.is_walkable(sim.position(), map.config().walk_margin),
                "tick {i} at {:?}",
                sim.position()
            );
        }
    }

    #[test]
    fn tick_gate_admits_by_elapsed_time() {
        let mut gate = TickGate::new(Duration::from_millis(16));
        assert!(gate.admit(Duration::from_millis(0)));
        assert!(!gate.admit(Duration::from_millis(10)));
        assert!(gate.admit(Duration::from_millis(16)));
        // A long stall admits one tick, not a backlog.
        assert!(gate.admit(Duration::from_millis(200)));
        assert!(!gate.admit(Duration::from_millis(210)));
    }
}
