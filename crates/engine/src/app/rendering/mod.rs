mod canvas;
mod font;
mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{world_to_screen_px, FOCUS_SCALE};
