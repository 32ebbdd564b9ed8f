use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::animation::DEFAULT_ANIMATION_FPS;
use super::hud::{dispatch_hud_action, HudAction, HudActions, PlayerStats};
use super::input::{Direction, DirectionSet};
use super::joystick::JoystickConfig;
use super::metrics::MetricsAccumulator;
use super::movement::{StepOutcome, DEFAULT_TICK_INTERVAL};
use super::proximity::{InteractionOutcome, LocationEntry};
use super::session::{SessionConfig, TapOutcome, TownSession};
use super::touch_controls::{PointerTarget, TouchLayout};
use super::{Renderer, Viewport};
use crate::map::{LocationId, TownMap, Vec2};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub tick_interval: Duration,
    pub animation_fps: u32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    pub joystick: JoystickConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Town".to_string(),
            window_width: 960,
            window_height: 640,
            tick_interval: DEFAULT_TICK_INTERVAL,
            animation_fps: DEFAULT_ANIMATION_FPS,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
            joystick: JoystickConfig::default(),
        }
    }
}

impl LoopConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tick_interval: normalize_non_zero_duration(self.tick_interval, DEFAULT_TICK_INTERVAL),
            animation_fps: if self.animation_fps == 0 {
                DEFAULT_ANIMATION_FPS
            } else {
                self.animation_fps
            },
            joystick: self.joystick,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the town window and runs until the window closes or Escape is pressed
/// in the town view.
pub fn run_town(
    config: LoopConfig,
    map: Arc<TownMap>,
    stats: PlayerStats,
    assets_dir: PathBuf,
    mut locations: Box<dyn LocationEntry>,
    mut hud_actions: Box<dyn HudActions>,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer = Renderer::new(window, assets_dir).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let session_config = config.session_config();
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);

    info!(
        tick_interval_ms = session_config.tick_interval.as_millis() as u64,
        animation_fps = session_config.animation_fps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut controller = TownController::new(map, stats, renderer.viewport(), session_config);
    let mut layout = TouchLayout::for_viewport(renderer.viewport(), session_config.joystick.radius);
    let mut input_collector = InputCollector::default();
    let loop_started = Instant::now();
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        let resized = renderer.resize(new_size.width, new_size.height);
                        let Some(viewport) = viewport_after_resize(resized, renderer.viewport())
                        else {
                            window_target.exit();
                            return;
                        };
                        controller.set_viewport(viewport);
                        layout =
                            TouchLayout::for_viewport(viewport, session_config.joystick.radius);
                    }
                    WindowEvent::Focused(false) => input_collector.release_all(),
                    WindowEvent::CursorMoved { position, .. } => {
                        input_collector.handle_cursor_moved(position);
                    }
                    WindowEvent::CursorLeft { .. } => input_collector.handle_cursor_left(),
                    WindowEvent::MouseInput { state, button, .. } => {
                        input_collector.handle_mouse_input(button, state);
                    }
                    WindowEvent::Touch(touch) => input_collector.handle_touch(touch),
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_physical_key(event.physical_key, event.state);
                    }
                    WindowEvent::RedrawRequested => {
                        for input in input_collector.drain() {
                            let signal = controller.apply(
                                input,
                                &layout,
                                locations.as_mut(),
                                hud_actions.as_mut(),
                            );
                            if signal == LoopSignal::Quit {
                                info!(reason = "escape_key", "shutdown_requested");
                                window_target.exit();
                                return;
                            }
                        }

                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let elapsed = now.saturating_duration_since(loop_started);
                        if let Some(outcome) = controller.tick(elapsed) {
                            metrics_accumulator.record_tick(outcome);
                        }

                        // Single authoritative FPS cap sleep point for render pacing.
                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep =
                            compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        let frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                        if let Err(error) = controller.render(&mut renderer, &layout, frame_dt) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();
                        metrics_accumulator.record_frame(raw_frame_dt);

                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            info!(
                                fps = snapshot.fps,
                                tps = snapshot.tps,
                                frame_time_ms = snapshot.frame_time_ms,
                                blocked_ticks = snapshot.blocked_ticks,
                                screen = controller.screen_name(),
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                controller.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Window input translated into town terms, queued until the next redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TownInput {
    Press(Direction),
    Release(Direction),
    ReleaseAll,
    Interact,
    Hud(HudAction),
    Escape,
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSignal {
    Continue,
    Quit,
}

#[derive(Debug, Default)]
struct InputCollector {
    held_directions: DirectionSet,
    interact_is_down: bool,
    character_is_down: bool,
    inventory_is_down: bool,
    escape_is_down: bool,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
    active_touch: Option<u64>,
    pending: Vec<TownInput>,
}

impl InputCollector {
    fn drain(&mut self) -> Vec<TownInput> {
        std::mem::take(&mut self.pending)
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        if let Some(direction) = direction_for_key(key) {
            let was_held = self.held_directions.contains(direction);
            if is_pressed && !was_held {
                self.held_directions.insert(direction);
                self.pending.push(TownInput::Press(direction));
            } else if !is_pressed && was_held {
                self.held_directions.remove(direction);
                self.pending.push(TownInput::Release(direction));
            }
            return;
        }

        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyE | KeyCode::Enter | KeyCode::Space => {
                if press_edge(&mut self.interact_is_down, is_pressed) {
                    self.pending.push(TownInput::Interact);
                }
            }
            KeyCode::KeyC => {
                if press_edge(&mut self.character_is_down, is_pressed) {
                    self.pending.push(TownInput::Hud(HudAction::CharacterSheet));
                }
            }
            KeyCode::KeyI => {
                if press_edge(&mut self.inventory_is_down, is_pressed) {
                    self.pending.push(TownInput::Hud(HudAction::Inventory));
                }
            }
            KeyCode::Escape => {
                if press_edge(&mut self.escape_is_down, is_pressed) {
                    self.pending.push(TownInput::Escape);
                }
            }
            _ => {}
        }
    }

    /// Window lost focus: release events for held keys will never arrive.
    fn release_all(&mut self) {
        self.held_directions.clear();
        self.interact_is_down = false;
        self.character_is_down = false;
        self.inventory_is_down = false;
        self.escape_is_down = false;
        if self.left_mouse_is_down || self.active_touch.is_some() {
            self.left_mouse_is_down = false;
            self.active_touch = None;
            self.pending.push(TownInput::PointerUp);
        }
        self.pending.push(TownInput::ReleaseAll);
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let point = to_vec2(position);
        self.cursor_position_px = Some(point);
        if self.left_mouse_is_down {
            self.pending.push(TownInput::PointerMove(point));
        }
    }

    fn handle_cursor_left(&mut self) {
        self.cursor_position_px = None;
        if self.left_mouse_is_down {
            self.left_mouse_is_down = false;
            self.pending.push(TownInput::PointerUp);
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if self.left_mouse_is_down {
                    return;
                }
                if let Some(point) = self.cursor_position_px {
                    self.left_mouse_is_down = true;
                    self.pending.push(TownInput::PointerDown(point));
                }
            }
            ElementState::Released => {
                if self.left_mouse_is_down {
                    self.left_mouse_is_down = false;
                    self.pending.push(TownInput::PointerUp);
                }
            }
        }
    }

    /// Only the first finger down drives the controls until it lifts.
    fn handle_touch(&mut self, touch: Touch) {
        self.handle_touch_phase(touch.id, touch.phase, to_vec2(touch.location));
    }

    fn handle_touch_phase(&mut self, id: u64, phase: TouchPhase, point: Vec2) {
        match phase {
            TouchPhase::Started => {
                if self.active_touch.is_none() {
                    self.active_touch = Some(id);
                    self.pending.push(TownInput::PointerDown(point));
                }
            }
            TouchPhase::Moved => {
                if self.active_touch == Some(id) {
                    self.pending.push(TownInput::PointerMove(point));
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.active_touch == Some(id) {
                    self.active_touch = None;
                    self.pending.push(TownInput::PointerUp);
                }
            }
        }
    }
}

fn press_edge(is_down: &mut bool, is_pressed: bool) -> bool {
    let edge = is_pressed && !*is_down;
    *is_down = is_pressed;
    edge
}

fn direction_for_key(key: PhysicalKey) -> Option<Direction> {
    match key {
        PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
            Some(Direction::Up)
        }
        PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
            Some(Direction::Down)
        }
        PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
            Some(Direction::Left)
        }
        PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
            Some(Direction::Right)
        }
        _ => None,
    }
}

fn to_vec2(position: PhysicalPosition<f64>) -> Vec2 {
    Vec2::new(position.x as f32, position.y as f32)
}

/// What the pointer grabbed when it went down; decides where moves and the
/// release are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerGesture {
    None,
    Joystick,
    Button(Direction),
}

enum Screen {
    Town(TownSession),
    Visiting {
        building_name: String,
        location: LocationId,
    },
    Closed,
}

/// Owns the mounted session and swaps it for the visiting screen after a
/// location hand-off.
struct TownController {
    map: Arc<TownMap>,
    stats: PlayerStats,
    viewport: Viewport,
    session_config: SessionConfig,
    screen: Screen,
    gesture: PointerGesture,
}

impl TownController {
    fn new(
        map: Arc<TownMap>,
        stats: PlayerStats,
        viewport: Viewport,
        session_config: SessionConfig,
    ) -> Self {
        let session = TownSession::mount(
            Arc::clone(&map),
            stats.clone(),
            viewport,
            session_config,
        );
        Self {
            map,
            stats,
            viewport,
            session_config,
            screen: Screen::Town(session),
            gesture: PointerGesture::None,
        }
    }

    fn screen_name(&self) -> &'static str {
        match self.screen {
            Screen::Town(_) => "town",
            Screen::Visiting { .. } => "visiting",
            Screen::Closed => "closed",
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Screen::Town(session) = &mut self.screen {
            session.set_viewport(viewport);
        }
    }

    fn apply(
        &mut self,
        input: TownInput,
        layout: &TouchLayout,
        locations: &mut dyn LocationEntry,
        hud_actions: &mut dyn HudActions,
    ) -> LoopSignal {
        if matches!(self.screen, Screen::Visiting { .. }) && input == TownInput::Escape {
            self.remount();
            return LoopSignal::Continue;
        }
        let Screen::Town(session) = &mut self.screen else {
            return LoopSignal::Continue;
        };

        let entered = match input {
            TownInput::Press(direction) => {
                session.input_mut().key_down(direction);
                None
            }
            TownInput::Release(direction) => {
                session.input_mut().key_up(direction);
                None
            }
            TownInput::ReleaseAll => {
                session.input_mut().clear_all();
                self.gesture = PointerGesture::None;
                None
            }
            TownInput::Interact => match session.interact(locations) {
                InteractionOutcome::Entered(location) => Some(location),
                _ => None,
            },
            TownInput::Hud(action) => {
                dispatch_hud_action(action, hud_actions);
                None
            }
            TownInput::Escape => return LoopSignal::Quit,
            TownInput::PointerDown(point) => match layout.hit_test(point) {
                PointerTarget::Joystick => {
                    session.input_mut().touch_start(layout.joystick_base, point);
                    self.gesture = PointerGesture::Joystick;
                    None
                }
                PointerTarget::Button(direction) => {
                    session.input_mut().button_press(direction);
                    self.gesture = PointerGesture::Button(direction);
                    None
                }
                PointerTarget::Hud(action) => {
                    dispatch_hud_action(action, hud_actions);
                    None
                }
                PointerTarget::World => match session.tap(point, locations) {
                    TapOutcome::Interaction(InteractionOutcome::Entered(location)) => {
                        Some(location)
                    }
                    _ => None,
                },
            },
            TownInput::PointerMove(point) => {
                if self.gesture == PointerGesture::Joystick {
                    session.input_mut().touch_move(point);
                }
                None
            }
            TownInput::PointerUp => {
                match self.gesture {
                    PointerGesture::Joystick => session.input_mut().touch_end(),
                    PointerGesture::Button(direction) => {
                        session.input_mut().button_release(direction)
                    }
                    PointerGesture::None => {}
                }
                self.gesture = PointerGesture::None;
                None
            }
        };

        if let Some(location) = entered {
            self.show_visiting(location);
        }
        LoopSignal::Continue
    }

    /// Runs a gated simulation tick; reports the step outcome when one ran.
    fn tick(&mut self, elapsed: Duration) -> Option<StepOutcome> {
        match &mut self.screen {
            Screen::Town(session) => session.tick(elapsed).map(|report| report.outcome),
            _ => None,
        }
    }

    fn render(
        &mut self,
        renderer: &mut Renderer,
        layout: &TouchLayout,
        frame_dt: Duration,
    ) -> Result<(), PixelsError> {
        match &mut self.screen {
            Screen::Town(session) => {
                session.animate(frame_dt);
                let frame = session.frame();
                renderer.render_town(&self.map, &frame, layout)
            }
            Screen::Visiting {
                building_name,
                location,
            } => renderer.render_visiting(building_name, location),
            Screen::Closed => Ok(()),
        }
    }

    fn show_visiting(&mut self, location: LocationId) {
        let building_name = self
            .map
            .buildings()
            .iter()
            .find(|building| building.location == location)
            .map(|building| building.name.clone())
            .unwrap_or_else(|| location.to_string());
        self.gesture = PointerGesture::None;
        // Replacing the screen drops the session, which stops its ticks.
        self.screen = Screen::Visiting {
            building_name,
            location,
        };
        info!(screen = "visiting", "screen_changed");
    }

    fn remount(&mut self) {
        self.screen = Screen::Town(TownSession::mount(
            Arc::clone(&self.map),
            self.stats.clone(),
            self.viewport,
            self.session_config,
        ));
        info!(screen = "town", "screen_changed");
    }

    fn shutdown(&mut self) {
        self.screen = Screen::Closed;
        self.gesture = PointerGesture::None;
    }
}

/// Viewport to adopt after a resize; `None` when the surface is gone and the
/// loop has to stop.
fn viewport_after_resize<E: std::fmt::Display>(
    resized: Result<(), E>,
    viewport: Viewport,
) -> Option<Viewport> {
    match resized {
        Ok(()) => Some(viewport),
        Err(error) => {
            warn!(error = %error, "renderer_resize_failed");
            None
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
