mod compiler;
mod integrity;

use std::path::Path;

use tracing::info;

use crate::map::TownMap;

pub use compiler::{
    compile_town_xml, load_town_map_from_path, ContentCompileError, ContentErrorCode,
    SourceLocation,
};
pub use integrity::{check_town_integrity, IntegrityIssue};

/// Shipped layout, embedded so the town runs without an assets directory.
pub const BUILTIN_TOWN_XML: &str = include_str!("../../../../assets/base/town.xml");
const BUILTIN_TOWN_PATH: &str = "<builtin>/assets/base/town.xml";

pub fn builtin_town_map() -> Result<TownMap, ContentCompileError> {
    compile_town_xml(Path::new(BUILTIN_TOWN_PATH), BUILTIN_TOWN_XML)
}

/// Loads the town from `content_path` when it exists, otherwise the builtin
/// copy. A file that exists but fails to compile is an error, not a fallback.
pub fn load_town_map(content_path: Option<&Path>) -> Result<TownMap, ContentCompileError> {
    match content_path {
        Some(path) if path.is_file() => {
            let map = load_town_map_from_path(path)?;
            info!(
                path = %path.display(),
                buildings = map.buildings().len(),
                "town_content_loaded"
            );
            Ok(map)
        }
        other => {
            let map = builtin_town_map()?;
            info!(
                requested = %other.map(|path| path.display().to_string()).unwrap_or_else(|| "<none>".to_string()),
                buildings = map.buildings().len(),
                "town_content_builtin"
            );
            Ok(map)
        }
    }
}
