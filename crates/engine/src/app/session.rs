use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::animation::{SpriteAnimator, SpriteFrame, DEFAULT_ANIMATION_FPS};
use super::camera::{Camera2D, Viewport};
use super::hud::{HudModel, PlayerStats};
use super::input::{DirectionSet, InputAggregator};
use super::joystick::JoystickConfig;
use super::movement::{MovementSimulator, StepOutcome, TickGate, DEFAULT_TICK_INTERVAL};
use super::proximity::{
    interact, FocusChange, InteractionOutcome, LocationEntry, ProximityDetector, ProximityState,
};
use crate::map::{BuildingIndex, TownMap, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub tick_interval: Duration,
    pub animation_fps: u32,
    pub joystick: JoystickConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            animation_fps: DEFAULT_ANIMATION_FPS,
            joystick: JoystickConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tokens: DirectionSet,
    pub outcome: StepOutcome,
    pub focus_change: Option<FocusChange>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    Interaction(InteractionOutcome),
    WalkTo(Vec2),
    Ignored,
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TownFrame {
    pub player: Vec2,
    pub sprite: SpriteFrame,
    pub camera: Camera2D,
    pub viewport: Viewport,
    pub proximity: ProximityState,
    pub hud: HudModel,
    pub joystick_center: Option<Vec2>,
    pub knob_offset: Vec2,
    pub tap_target: Option<Vec2>,
}

/// Weak view of a session; reports whether it is still mounted.
#[derive(Debug, Clone)]
pub struct SessionProbe {
    alive: Weak<()>,
}

impl SessionProbe {
    pub fn is_mounted(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

/// One mounted town view. Owns the tick gate and every input producer, so
/// dropping it stops the simulation and releases all held tokens.
pub struct TownSession {
    map: Arc<TownMap>,
    stats: PlayerStats,
    viewport: Viewport,
    gate: TickGate,
    input: InputAggregator,
    movement: MovementSimulator,
    animator: SpriteAnimator,
    proximity: ProximityDetector,
    camera: Camera2D,
    alive: Rc<()>,
}

impl TownSession {
    pub fn mount(
        map: Arc<TownMap>,
        stats: PlayerStats,
        viewport: Viewport,
        config: SessionConfig,
    ) -> Self {
        let movement = MovementSimulator::at_spawn(&map);
        let camera = Camera2D::following(movement.position(), viewport, map.config());
        let mut proximity = ProximityDetector::default();
        proximity.update(&map, movement.position(), stats.level);
        info!(
            x = movement.position().x,
            y = movement.position().y,
            buildings = map.buildings().len(),
            level = stats.level,
            "town_session_mounted"
        );
        Self {
            map,
            stats,
            viewport,
            gate: TickGate::new(config.tick_interval),
            input: InputAggregator::new(config.joystick),
            movement,
            animator: SpriteAnimator::new(config.animation_fps),
            proximity,
            camera,
            alive: Rc::new(()),
        }
    }

    pub fn probe(&self) -> SessionProbe {
        SessionProbe {
            alive: Rc::downgrade(&self.alive),
        }
    }

    pub fn map(&self) -> &TownMap {
        &self.map
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn set_stats(&mut self, stats: PlayerStats) {
        self.stats = stats;
    }

    pub fn input_mut(&mut self) -> &mut InputAggregator {
        &mut self.input
    }

    pub fn player_position(&self) -> Vec2 {
        self.movement.position()
    }

    pub fn camera(&self) -> Camera2D {
        self.camera
    }

    pub fn proximity(&self) -> ProximityState {
        self.proximity.state()
    }

    pub fn focused_building(&self) -> Option<BuildingIndex> {
        self.proximity.state().focused
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera = Camera2D::following(self.movement.position(), viewport, self.map.config());
    }

    /// Runs one simulation tick when the gate admits `now`; `None` otherwise.
    pub fn tick(&mut self, now: Duration) -> Option<TickReport> {
        if !self.gate.admit(now) {
            return None;
        }
        let speed = self.map.config().player_speed;
        let tokens = self.input.snapshot_for_tick(self.movement.position(), speed);
        let outcome = self.movement.step(&self.map, tokens);
        if outcome == StepOutcome::Blocked && self.input.tap_target().is_some() {
            debug!("tap_target_abandoned");
            self.input.cancel_tap();
        }
        let position = self.movement.position();
        self.camera = Camera2D::following(position, self.viewport, self.map.config());
        let focus_change = self.proximity.update(&self.map, position, self.stats.level);
        Some(TickReport {
            tokens,
            outcome,
            focus_change,
        })
    }

    /// Advances the walk cycle at render rate.
    pub fn animate(&mut self, dt: Duration) -> SpriteFrame {
        self.animator
            .update(self.movement.facing(), self.movement.is_moving(), dt)
    }

    pub fn interact(&mut self, entry: &mut dyn LocationEntry) -> InteractionOutcome {
        let state = self.proximity.state();
        interact(&self.map, &state, self.stats.level, entry)
    }

    /// Tap in screen space. The focused building is entered, any other building
    /// is approached through its entrance, open ground becomes a destination.
    pub fn tap(&mut self, screen: Vec2, entry: &mut dyn LocationEntry) -> TapOutcome {
        let world = self.camera.screen_to_world(screen);
        let Some(index) = self.map.building_at(world) else {
            self.input.tap_to_move(world);
            return TapOutcome::WalkTo(world);
        };
        if self.proximity.state().focused == Some(index) {
            return TapOutcome::Interaction(self.interact(entry));
        }
        match self.map.entrance_point(index, self.map.config().walk_margin) {
            Some(entrance) => {
                self.input.tap_to_move(entrance);
                TapOutcome::WalkTo(entrance)
            }
            None => TapOutcome::Ignored,
        }
    }

    pub fn frame(&self) -> TownFrame {
        let proximity = self.proximity.state();
        let joystick = self.input.joystick();
        TownFrame {
            player: self.movement.position(),
            sprite: self.animator.current(),
            camera: self.camera,
            viewport: self.viewport,
            proximity,
            hud: HudModel::build(&self.stats, &self.map, &proximity),
            joystick_center: joystick.center(),
            knob_offset: joystick.knob_offset(),
            tap_target: self.input.tap_target(),
        }
    }
}

impl Drop for TownSession {
    fn drop(&mut self) {
        self.input.clear_all();
        info!(
            x = self.movement.position().x,
            y = self.movement.position().y,
            "town_session_unmounted"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;
    use crate::app::input::Direction;
    use crate::map::{Building, Footprint, LocationId, MapConfig};

    const VIEWPORT: Viewport = Viewport {
        width: 960,
        height: 640,
    };
    const TICK: Duration = Duration::from_millis(16);

    #[derive(Default)]
    struct RecordingEntry {
        entered: Vec<LocationId>,
    }

    impl LocationEntry for RecordingEntry {
        fn enter_location(&mut self, location: &LocationId) {
            self.entered.push(location.clone());
        }
    }

    fn town() -> Arc<TownMap> {
        Arc::new(TownMap::new(
            MapConfig {
                spawn: Vec2::new(480.0, 700.0),
                ..MapConfig::default()
            },
            vec![Building {
                id: "bank".to_string(),
                name: "Bank".to_string(),
                location: LocationId::new("bank"),
                center: Vec2::new(480.0, 580.0),
                footprint: Footprint {
                    width: 96.0,
                    height: 48.0,
                },
                unlock_level: 1,
                asset: "buildings/bank".to_string(),
                description: String::new(),
            }],
        ))
    }

    fn mount() -> TownSession {
        TownSession::mount(
            town(),
            PlayerStats::default(),
            VIEWPORT,
            SessionConfig::default(),
        )
    }

    fn run_ticks(session: &mut TownSession, clock: &mut Duration, count: usize) {
        for _ in 0..count {
            *clock += TICK;
            session.tick(*clock);
        }
    }

    #[test]
    fn mount_places_player_at_spawn_with_clamped_camera() {
        let session = mount();
        assert_eq!(session.player_position(), Vec2::new(480.0, 700.0));
        assert_eq!(session.camera().offset, Vec2::new(0.0, 380.0));
        assert!(session.probe().is_mounted());
        assert_eq!(session.frame().hud.nearby_name, None);
    }

    #[test]
    fn gate_rejects_early_ticks() {
        let mut session = mount();
        session.input_mut().key_down(Direction::Right);
        assert!(session.tick(Duration::from_millis(0)).is_some());
        assert!(session.tick(Duration::from_millis(5)).is_none());
        assert_eq!(session.player_position(), Vec2::new(484.0, 700.0));
    }

    #[test]
    fn held_key_moves_player_and_camera_follows() {
        let mut session = mount();
        let mut clock = Duration::ZERO;
        session.input_mut().key_down(Direction::Down);
        run_ticks(&mut session, &mut clock, 10);
        assert_eq!(session.player_position(), Vec2::new(480.0, 740.0));
        assert_eq!(session.camera().offset.y, 420.0);

        session.input_mut().key_up(Direction::Down);
        let report = session.tick(clock + TICK).expect("admitted");
        assert_eq!(report.outcome, StepOutcome::Idle);
    }

    #[test]
    fn tapping_building_walks_to_entrance_then_enters() {
        let mut session = mount();
        let mut entry = RecordingEntry::default();
        let mut clock = Duration::ZERO;
        let bank_on_screen = session.camera().world_to_screen(Vec2::new(480.0, 580.0));

        let outcome = session.tap(bank_on_screen, &mut entry);
        assert_eq!(outcome, TapOutcome::WalkTo(Vec2::new(480.0, 620.0)));

        run_ticks(&mut session, &mut clock, 40);
        assert_eq!(session.player_position(), Vec2::new(480.0, 624.0));
        assert_eq!(session.focused_building(), session.map().find_by_id("bank"));
        assert_eq!(session.input_mut().tap_target(), None);

        let bank_on_screen = session.camera().world_to_screen(Vec2::new(480.0, 580.0));
        let outcome = session.tap(bank_on_screen, &mut entry);
        assert_eq!(
            outcome,
            TapOutcome::Interaction(InteractionOutcome::Entered(LocationId::new("bank")))
        );
        assert_eq!(entry.entered, vec![LocationId::new("bank")]);
    }

    #[test]
    fn blocked_tap_walk_is_abandoned() {
        let mut session = mount();
        let mut entry = RecordingEntry::default();
        let mut clock = Duration::ZERO;
        // Destination beyond the walk margin of the left edge.
        let target = session.camera().world_to_screen(Vec2::new(2.0, 700.0));
        session.tap(target, &mut entry);

        run_ticks(&mut session, &mut clock, 200);
        assert_eq!(session.input_mut().tap_target(), None);
        assert!(session.map().is_walkable(session.player_position(), 16.0));
    }

    #[test]
    fn drop_reports_unmount() {
        let session = mount();
        let probe = session.probe();
        drop(session);
        assert!(!probe.is_mounted());
    }

    #[test]
    fn unwinding_tears_down_session() {
        let mut probe = None;
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut session = mount();
            session.input_mut().key_down(Direction::Left);
            probe = Some(session.probe());
            panic!("scene failure");
        }));
        assert!(result.is_err());
        assert!(!probe.expect("probe captured").is_mounted());
    }

    #[test]
    fn frame_exposes_joystick_state() {
        let mut session = mount();
        session
            .input_mut()
            .touch_start(Vec2::new(90.0, 550.0), Vec2::new(130.0, 550.0));
        let frame = session.frame();
        assert_eq!(frame.joystick_center, Some(Vec2::new(90.0, 550.0)));
        assert_eq!(frame.knob_offset, Vec2::new(40.0, 0.0));
        assert_eq!(frame.viewport, VIEWPORT);
    }
}
