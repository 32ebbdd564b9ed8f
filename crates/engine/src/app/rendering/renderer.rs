use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::animation::FRAME_COUNT;
use crate::app::hud::HudModel;
use crate::app::input::Direction;
use crate::app::touch_controls::{TouchLayout, JOYSTICK_GRAB_SCALE};
use crate::app::{Facing, TownFrame, Viewport};
use crate::asset_refs::{sprite_path, PLAYER_SPRITE_KEY};
use crate::map::{Building, LocationId, TownMap};

use super::canvas::{Bitmap, Canvas, ScreenRect};
use super::font::{draw_text, draw_text_centered, line_height, text_width};
use super::transform::{building_screen_rect, rect_visible, world_to_screen_px};

const GRASS_COLOR: [u8; 4] = [86, 128, 64, 255];
const PATH_COLOR: [u8; 4] = [150, 124, 90, 255];
const WORLD_EDGE_COLOR: [u8; 4] = [40, 58, 34, 255];
const BUILDING_COLOR: [u8; 4] = [156, 112, 78, 255];
const BUILDING_ROOF_COLOR: [u8; 4] = [120, 58, 48, 255];
const LOCKED_BUILDING_COLOR: [u8; 4] = [96, 96, 108, 255];
const LOCKED_ROOF_COLOR: [u8; 4] = [70, 70, 82, 255];
const FOCUS_OUTLINE_COLOR: [u8; 4] = [255, 220, 90, 255];
const NEARBY_OUTLINE_COLOR: [u8; 4] = [230, 230, 230, 200];
const PLAYER_BODY_COLOR: [u8; 4] = [60, 110, 200, 255];
const PLAYER_HEAD_COLOR: [u8; 4] = [240, 206, 170, 255];
const PLAYER_FACING_COLOR: [u8; 4] = [250, 250, 250, 255];
const TAP_MARKER_COLOR: [u8; 4] = [255, 255, 255, 160];
const PANEL_BG_COLOR: [u8; 4] = [12, 14, 20, 200];
const PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
const TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const HEALTH_BAR_COLOR: [u8; 4] = [210, 60, 60, 255];
const XP_BAR_COLOR: [u8; 4] = [80, 150, 240, 255];
const BAR_TRACK_COLOR: [u8; 4] = [40, 44, 52, 255];
const CONTROL_COLOR: [u8; 4] = [255, 255, 255, 70];
const CONTROL_ACTIVE_COLOR: [u8; 4] = [255, 255, 255, 140];
const VISITING_BG_COLOR: [u8; 4] = [20, 22, 28, 255];

const TEXT_SCALE: i32 = 2;
const LABEL_SCALE: i32 = 2;
const HUD_PADDING: i32 = 12;
const BAR_WIDTH: i32 = 160;
const BAR_HEIGHT: i32 = 8;
const PLAYER_SIZE_PX: i32 = 32;
const VIEW_CULL_PADDING_PX: i32 = 16;
const PATH_HALF_WIDTH: f32 = 24.0;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    sprites: SpriteCache,
}

impl Renderer {
    pub fn new(window: Arc<Window>, assets_dir: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            sprites: SpriteCache::new(assets_dir),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render_town(
        &mut self,
        map: &TownMap,
        frame: &TownFrame,
        controls: &TouchLayout,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let Viewport { width, height } = self.viewport;
        let sprites = &mut self.sprites;
        let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height);

        draw_ground(&mut canvas, map, frame);

        // Buildings whose center is above the player are drawn behind it.
        let mut order: Vec<usize> = (0..map.buildings().len()).collect();
        order.sort_by(|a, b| {
            let ay = map.buildings()[*a].center.y;
            let by = map.buildings()[*b].center.y;
            ay.total_cmp(&by)
        });
        let mut player_drawn = false;
        for index in order {
            let building = &map.buildings()[index];
            if !player_drawn && building.center.y > frame.player.y {
                draw_player(&mut canvas, sprites, frame);
                player_drawn = true;
            }
            draw_building(&mut canvas, sprites, building, index, frame);
        }
        if !player_drawn {
            draw_player(&mut canvas, sprites, frame);
        }

        if let Some(target) = frame.tap_target {
            let (x, y) = world_to_screen_px(target, &frame.camera);
            canvas.ring(x, y, 8, TAP_MARKER_COLOR);
        }

        draw_building_labels(&mut canvas, map, frame);
        draw_hud(&mut canvas, &frame.hud);
        draw_controls(&mut canvas, frame, controls);
        self.pixels.render()
    }

    pub fn render_visiting(&mut self, building_name: &str, location: &LocationId) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let Viewport { width, height } = self.viewport;
        let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height);
        canvas.clear(VISITING_BG_COLOR);
        let cx = width as i32 / 2;
        let mut y = height as i32 / 2 - line_height(3) * 2;
        draw_text_centered(&mut canvas, cx, y, "NOW VISITING", 3, TEXT_DIM_COLOR);
        y += line_height(3) + 8;
        draw_text_centered(&mut canvas, cx, y, building_name, 4, TEXT_COLOR);
        y += line_height(4) + 4;
        draw_text_centered(
            &mut canvas,
            cx,
            y,
            &format!("({location})"),
            TEXT_SCALE,
            TEXT_DIM_COLOR,
        );
        y += line_height(TEXT_SCALE) * 3;
        draw_text_centered(
            &mut canvas,
            cx,
            y,
            "PRESS ESC TO RETURN TO TOWN",
            TEXT_SCALE,
            TEXT_COLOR,
        );
        self.pixels.render()
    }
}

fn draw_ground(canvas: &mut Canvas<'_>, map: &TownMap, frame: &TownFrame) {
    canvas.clear(WORLD_EDGE_COLOR);
    let config = map.config();
    let (left, top) = world_to_screen_px(crate::map::Vec2::ZERO, &frame.camera);
    let world = ScreenRect {
        left,
        top,
        width: config.width.round() as i32,
        height: config.height.round() as i32,
    };
    canvas.fill_rect(world, GRASS_COLOR);

    // Main streets cross at the spawn point.
    let (sx, sy) = world_to_screen_px(config.spawn, &frame.camera);
    let half = PATH_HALF_WIDTH.round() as i32;
    canvas.fill_rect(
        ScreenRect {
            left: world.left,
            top: sy - half,
            width: world.width,
            height: half * 2,
        },
        PATH_COLOR,
    );
    canvas.fill_rect(
        ScreenRect {
            left: sx - half,
            top: world.top,
            width: half * 2,
            height: world.height,
        },
        PATH_COLOR,
    );
}

fn draw_building(
    canvas: &mut Canvas<'_>,
    sprites: &mut SpriteCache,
    building: &Building,
    index: usize,
    frame: &TownFrame,
) {
    let focused = frame.proximity.focused.map(|focused| focused.0) == Some(index);
    let nearby = frame.proximity.nearby_index().map(|nearby| nearby.0) == Some(index);
    let rect = building_screen_rect(building, &frame.camera, focused);
    if !rect_visible(rect, canvas.width(), canvas.height(), VIEW_CULL_PADDING_PX) {
        return;
    }
    let locked = !building.is_unlocked_for(frame.hud.level);

    match sprites.get(&building.asset) {
        Some(bitmap) if !locked => {
            let cell = ScreenRect {
                left: 0,
                top: 0,
                width: bitmap.width as i32,
                height: bitmap.height as i32,
            };
            canvas.blit_region(bitmap, cell, rect);
        }
        _ => {
            let (body, roof) = if locked {
                (LOCKED_BUILDING_COLOR, LOCKED_ROOF_COLOR)
            } else {
                (BUILDING_COLOR, BUILDING_ROOF_COLOR)
            };
            canvas.fill_rect(rect, body);
            canvas.fill_rect(
                ScreenRect {
                    height: rect.height / 3,
                    ..rect
                },
                roof,
            );
            let door = ScreenRect::centered(
                rect.left + rect.width / 2,
                rect.top + rect.height - rect.height / 6,
                rect.width / 6,
                rect.height / 3,
            );
            canvas.fill_rect(door, roof);
        }
    }

    if focused {
        canvas.outline_rect(rect.grow(2), 3, FOCUS_OUTLINE_COLOR);
    } else if nearby {
        canvas.outline_rect(rect.grow(1), 1, NEARBY_OUTLINE_COLOR);
    }
}

fn draw_building_labels(canvas: &mut Canvas<'_>, map: &TownMap, frame: &TownFrame) {
    for (index, building) in map.buildings().iter().enumerate() {
        let focused = frame.proximity.focused.map(|focused| focused.0) == Some(index);
        let rect = building_screen_rect(building, &frame.camera, focused);
        if !rect_visible(rect, canvas.width(), canvas.height(), VIEW_CULL_PADDING_PX) {
            continue;
        }
        let label_y = rect.top - line_height(LABEL_SCALE) - 2;
        let color = if focused { FOCUS_OUTLINE_COLOR } else { TEXT_COLOR };
        draw_text_centered(
            canvas,
            rect.left + rect.width / 2,
            label_y,
            &building.name,
            LABEL_SCALE,
            color,
        );
    }
}

fn draw_player(canvas: &mut Canvas<'_>, sprites: &mut SpriteCache, frame: &TownFrame) {
    let (cx, cy) = world_to_screen_px(frame.player, &frame.camera);
    // Sprite is anchored at the feet.
    let dest = ScreenRect {
        left: cx - PLAYER_SIZE_PX / 2,
        top: cy - PLAYER_SIZE_PX,
        width: PLAYER_SIZE_PX,
        height: PLAYER_SIZE_PX,
    };

    if let Some(sheet) = sprites.get(PLAYER_SPRITE_KEY) {
        let cell_w = sheet.width as i32 / FRAME_COUNT as i32;
        let cell_h = sheet.height as i32 / 4;
        let cell = ScreenRect {
            left: frame.sprite.column as i32 * cell_w,
            top: frame.sprite.row as i32 * cell_h,
            width: cell_w,
            height: cell_h,
        };
        canvas.blit_region(sheet, cell, dest);
        return;
    }

    // Placeholder: bob on odd walk frames so movement reads without a sheet.
    let bob = (frame.sprite.column % 2) as i32 * 2;
    let body = ScreenRect {
        left: dest.left + 6,
        top: dest.top + 12 - bob,
        width: PLAYER_SIZE_PX - 12,
        height: PLAYER_SIZE_PX - 12,
    };
    canvas.fill_rect(body, PLAYER_BODY_COLOR);
    canvas.fill_circle(cx, dest.top + 8 - bob, 7, PLAYER_HEAD_COLOR);
    let (fx, fy) = match facing_for_row(frame.sprite.row) {
        Facing::Up => (0, -10),
        Facing::Down => (0, 4),
        Facing::Left => (-9, 0),
        Facing::Right => (9, 0),
    };
    canvas.fill_circle(cx + fx, cy - PLAYER_SIZE_PX / 2 + fy - bob, 2, PLAYER_FACING_COLOR);
}

fn facing_for_row(row: usize) -> Facing {
    [Facing::Down, Facing::Left, Facing::Right, Facing::Up]
        .into_iter()
        .find(|facing| facing.sprite_row() == row)
        .unwrap_or_default()
}

fn draw_hud(canvas: &mut Canvas<'_>, hud: &HudModel) {
    let lines = [
        format!("{}  LV {}", hud.player_name, hud.level),
        format!("GOLD {}", hud.gold),
        format!("TURNS {}/{}", hud.turns_remaining, hud.max_turns),
    ];
    let line = line_height(TEXT_SCALE);
    let text_w = lines
        .iter()
        .map(|text| text_width(text, TEXT_SCALE))
        .max()
        .unwrap_or(0)
        .max(BAR_WIDTH);
    let panel = ScreenRect {
        left: HUD_PADDING,
        top: HUD_PADDING,
        width: text_w + HUD_PADDING * 2,
        height: line * lines.len() as i32 + (BAR_HEIGHT + 6) * 2 + HUD_PADDING * 2,
    };
    canvas.fill_rect(panel, PANEL_BG_COLOR);
    canvas.outline_rect(panel, 1, PANEL_BORDER_COLOR);

    let x = panel.left + HUD_PADDING;
    let mut y = panel.top + HUD_PADDING;
    for (i, text) in lines.iter().enumerate() {
        let color = if i == 0 { TEXT_COLOR } else { TEXT_DIM_COLOR };
        draw_text(canvas, x, y, text, TEXT_SCALE, color);
        y += line;
    }
    draw_bar(canvas, x, y, hud.health_percent, HEALTH_BAR_COLOR);
    y += BAR_HEIGHT + 6;
    draw_bar(canvas, x, y, hud.experience_percent, XP_BAR_COLOR);

    let prompt = match (&hud.nearby_name, hud.interaction_armed, hud.locked_hint) {
        (Some(name), true, _) => Some(format!("{name} - PRESS E TO ENTER")),
        (Some(name), false, Some(level)) => Some(format!("{name} - REQUIRES LEVEL {level}")),
        (Some(name), false, None) => Some(format!("{name} - COME CLOSER")),
        (None, _, _) => None,
    };
    if let Some(prompt) = prompt {
        let width = text_width(&prompt, TEXT_SCALE) + HUD_PADDING * 2;
        let center_x = canvas.width() as i32 / 2;
        let bottom = canvas.height() as i32 - HUD_PADDING;
        let panel = ScreenRect {
            left: center_x - width / 2,
            top: bottom - line - HUD_PADDING,
            width,
            height: line + HUD_PADDING,
        };
        canvas.fill_rect(panel, PANEL_BG_COLOR);
        draw_text_centered(
            canvas,
            center_x,
            panel.top + HUD_PADDING / 2 + 2,
            &prompt,
            TEXT_SCALE,
            TEXT_COLOR,
        );
    }
}

fn draw_bar(canvas: &mut Canvas<'_>, x: i32, y: i32, percent: u8, color: [u8; 4]) {
    let track = ScreenRect {
        left: x,
        top: y,
        width: BAR_WIDTH,
        height: BAR_HEIGHT,
    };
    canvas.fill_rect(track, BAR_TRACK_COLOR);
    let filled = BAR_WIDTH * percent.min(100) as i32 / 100;
    canvas.fill_rect(
        ScreenRect {
            width: filled,
            ..track
        },
        color,
    );
}

fn draw_controls(canvas: &mut Canvas<'_>, frame: &TownFrame, controls: &TouchLayout) {
    let base = controls.joystick_base;
    let base_radius = (controls.joystick_grab_radius / JOYSTICK_GRAB_SCALE).round() as i32;
    canvas.ring(base.x as i32, base.y as i32, base_radius, CONTROL_COLOR);
    let knob = frame.joystick_center.map(|_| frame.knob_offset).unwrap_or_default();
    let knob_color = if frame.joystick_center.is_some() {
        CONTROL_ACTIVE_COLOR
    } else {
        CONTROL_COLOR
    };
    canvas.fill_circle(
        (base.x + knob.x).round() as i32,
        (base.y + knob.y).round() as i32,
        base_radius / 2,
        knob_color,
    );

    for direction in Direction::ALL {
        let rect = controls.button_rect(direction);
        let screen = ScreenRect {
            left: rect.min_x.round() as i32,
            top: rect.min_y.round() as i32,
            width: rect.width().round() as i32,
            height: rect.height().round() as i32,
        };
        canvas.fill_rect(screen, CONTROL_COLOR);
        let arrow = match direction {
            Direction::Up => "^",
            Direction::Down => "V",
            Direction::Left => "<",
            Direction::Right => ">",
        };
        draw_text_centered(
            canvas,
            screen.left + screen.width / 2,
            screen.top + screen.height / 2 - line_height(TEXT_SCALE) / 2,
            arrow,
            TEXT_SCALE,
            TEXT_COLOR,
        );
    }

    for (rect, label) in [
        (controls.character_button, "C"),
        (controls.inventory_button, "I"),
    ] {
        let screen = ScreenRect {
            left: rect.min_x.round() as i32,
            top: rect.min_y.round() as i32,
            width: rect.width().round() as i32,
            height: rect.height().round() as i32,
        };
        canvas.fill_rect(screen, PANEL_BG_COLOR);
        canvas.outline_rect(screen, 1, PANEL_BORDER_COLOR);
        draw_text_centered(
            canvas,
            screen.left + screen.width / 2,
            screen.top + screen.height / 2 - line_height(TEXT_SCALE) / 2,
            label,
            TEXT_SCALE,
            TEXT_COLOR,
        );
    }
}

/// Lazily decoded sprites keyed by asset ref. A failed load is cached as
/// `None` and warned about once; callers fall back to placeholder shapes.
struct SpriteCache {
    assets_dir: PathBuf,
    entries: HashMap<String, Option<Bitmap>>,
    warned: HashSet<String>,
}

impl SpriteCache {
    fn new(assets_dir: PathBuf) -> Self {
        Self {
            assets_dir,
            entries: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    fn get(&mut self, key: &str) -> Option<&Bitmap> {
        if !self.entries.contains_key(key) {
            let loaded = match sprite_path(&self.assets_dir, key) {
                Ok(path) => match load_bitmap(&path) {
                    Ok(bitmap) => Some(bitmap),
                    Err(reason) => {
                        self.warn_once(key, Some(&path), &reason);
                        None
                    }
                },
                Err(error) => {
                    self.warn_once(key, None, &format!("invalid_ref:{error}"));
                    None
                }
            };
            self.entries.insert(key.to_string(), loaded);
        }
        self.entries.get(key).and_then(Option::as_ref)
    }

    fn warn_once(&mut self, key: &str, path: Option<&Path>, reason: &str) {
        if !self.warned.insert(key.to_string()) {
            return;
        }
        let path_display = path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unresolved>".to_string());
        warn!(
            asset = key,
            path = %path_display,
            reason,
            "sprite_load_failed_using_placeholder"
        );
    }
}

fn load_bitmap(path: &Path) -> Result<Bitmap, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(Bitmap {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}
