use std::collections::HashSet;

use thiserror::Error;

use crate::app::FOCUS_RADIUS_RATIO;
use crate::map::{BuildingIndex, LocationId, TownMap, Vec2};

/// Authoring mistakes in a town layout. None of these are checked while the
/// town is running; content tests run the check instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrityIssue {
    #[error("building '{building}' routes to unknown location '{location}'")]
    UnknownLocation {
        building: String,
        location: LocationId,
    },
    #[error("buildings '{first}' and '{second}' overlap once the walk margin is applied")]
    OverlappingFootprints { first: String, second: String },
    #[error("spawn point ({x}, {y}) is not walkable", x = .spawn.x, y = .spawn.y)]
    SpawnNotWalkable { spawn: Vec2 },
    #[error("building id '{id}' is used more than once")]
    DuplicateBuildingId { id: String },
    #[error("building '{building}' extends outside the world")]
    OutsideWorld { building: String },
    #[error("building '{building}' cannot be focused from its entrance")]
    UnreachableEntrance { building: String },
}

/// Returns every issue found; an empty list means the layout is sound.
pub fn check_town_integrity(map: &TownMap, known_locations: &[&str]) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let config = map.config();
    let buildings = map.buildings();

    let mut seen = HashSet::new();
    for building in buildings {
        if !seen.insert(building.id.as_str()) {
            issues.push(IntegrityIssue::DuplicateBuildingId {
                id: building.id.clone(),
            });
        }
        if !known_locations.contains(&building.location.as_str()) {
            issues.push(IntegrityIssue::UnknownLocation {
                building: building.id.clone(),
                location: building.location.clone(),
            });
        }
        let rect = building.footprint_rect();
        if rect.min_x < 0.0 || rect.min_y < 0.0 || rect.max_x > config.width || rect.max_y > config.height
        {
            issues.push(IntegrityIssue::OutsideWorld {
                building: building.id.clone(),
            });
        }
    }

    // Footprints must stay apart once both are grown by the walk margin, or the
    // gap between them is too narrow to walk through.
    for (i, first) in buildings.iter().enumerate() {
        let first_blocked = first.blocked_rect(config.walk_margin);
        for second in &buildings[i + 1..] {
            if first_blocked.overlaps(&second.blocked_rect(config.walk_margin)) {
                issues.push(IntegrityIssue::OverlappingFootprints {
                    first: first.id.clone(),
                    second: second.id.clone(),
                });
            }
        }
    }

    if !map.is_walkable(config.spawn, config.walk_margin) {
        issues.push(IntegrityIssue::SpawnNotWalkable {
            spawn: config.spawn,
        });
    }

    let focus_range = config.interaction_radius * FOCUS_RADIUS_RATIO;
    for (index, building) in buildings.iter().enumerate() {
        let reachable = map
            .entrance_point(BuildingIndex(index), config.walk_margin)
            .is_some_and(|entrance| entrance.distance(building.center) < focus_range);
        if !reachable {
            issues.push(IntegrityIssue::UnreachableEntrance {
                building: building.id.clone(),
            });
        }
    }

    issues
}
