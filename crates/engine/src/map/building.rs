use std::fmt;

use super::geometry::{Rect, Vec2};

/// Identifier handed to the location-entry collaborator when a building is entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration-order position of a building inside a [`super::TownMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildingIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub location: LocationId,
    pub center: Vec2,
    pub footprint: Footprint,
    pub unlock_level: u32,
    pub asset: String,
    pub description: String,
}

impl Building {
    pub fn footprint_rect(&self) -> Rect {
        Rect::from_center(self.center, self.footprint.width, self.footprint.height)
    }

    pub fn blocked_rect(&self, margin: f32) -> Rect {
        self.footprint_rect().expanded(margin)
    }

    pub fn is_unlocked_for(&self, player_level: u32) -> bool {
        self.unlock_level <= player_level
    }
}
