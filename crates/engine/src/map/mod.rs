mod building;
mod geometry;
mod registry;

pub use building::{Building, BuildingIndex, Footprint, LocationId};
pub use geometry::{Rect, Vec2};
pub use registry::{
    MapConfig, NearbyBuilding, TownMap, DEFAULT_INTERACTION_RADIUS, DEFAULT_PLAYER_SPEED,
    DEFAULT_WALK_MARGIN, DEFAULT_WORLD_SIZE,
};
