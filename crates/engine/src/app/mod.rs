mod animation;
mod camera;
mod hud;
mod input;
mod joystick;
mod loop_runner;
mod metrics;
mod movement;
mod proximity;
mod rendering;
mod session;
mod touch_controls;

pub use animation::{
    SpriteAnimator, SpriteFrame, DEFAULT_ANIMATION_FPS, FRAME_COUNT, STANDING_FRAME,
};
pub use camera::{follow_offset, Camera2D, Viewport};
pub use hud::{dispatch_hud_action, percent, HudAction, HudActions, HudModel, PlayerStats};
pub use input::{Direction, DirectionSet, InputAggregator};
pub use joystick::{
    clamp_offset, quantize_direction, JoystickConfig, VirtualJoystick,
    JOYSTICK_DEFAULT_DEAD_ZONE, JOYSTICK_DEFAULT_RADIUS,
};
pub use loop_runner::{run_town, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use movement::{
    displacement_for, facing_for, Axis, Facing, MovementSimulator, StepOutcome, TickGate,
    DEFAULT_TICK_INTERVAL,
};
pub use proximity::{
    interact, FocusChange, InteractionOutcome, LocationEntry, ProximityDetector,
    ProximityState, FOCUS_RADIUS_RATIO,
};
pub use rendering::{world_to_screen_px, Renderer, FOCUS_SCALE};
pub use session::{
    SessionConfig, SessionProbe, TapOutcome, TickReport, TownFrame, TownSession,
};
pub use touch_controls::{PointerTarget, TouchLayout};
