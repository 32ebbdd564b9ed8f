use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use engine::{
    check_town_integrity, load_town_map, resolve_app_paths, ContentCompileError, HudActions,
    LocationEntry, LoopConfig, PlayerStats, TownMap,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{load_json_file, ClientConfig, ConfigError};
use super::locations::{known_location_ids, HudActionLog, LocationRouter};

pub(crate) const CONFIG_ENV_VAR: &str = "TOWN_CONFIG";
pub(crate) const PLAYER_STATS_ENV_VAR: &str = "TOWN_PLAYER_STATS";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) map: Arc<TownMap>,
    pub(crate) stats: PlayerStats,
    pub(crate) assets_dir: PathBuf,
    pub(crate) locations: Box<dyn LocationEntry>,
    pub(crate) hud_actions: Box<dyn HudActions>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error("client config: {0}")]
    Config(#[source] ConfigError),
    #[error("player stats: {0}")]
    PlayerStats(#[source] ConfigError),
    #[error("town content: {0}")]
    Content(#[from] ContentCompileError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Town Startup ===");

    let client_config = match optional_env_path(CONFIG_ENV_VAR) {
        Some(path) => {
            info!(path = %path.display(), "client_config_loading");
            load_json_file::<ClientConfig>(&path).map_err(BootstrapError::Config)?
        }
        None => ClientConfig::default(),
    };
    let stats = match optional_env_path(PLAYER_STATS_ENV_VAR) {
        Some(path) => load_json_file::<PlayerStats>(&path).map_err(BootstrapError::PlayerStats)?,
        None => PlayerStats::default(),
    };
    info!(
        name = stats.name.as_str(),
        level = stats.level,
        gold = stats.gold,
        "player_stats"
    );

    // A missing project root is not fatal: the embedded town still runs and
    // sprites fall back to placeholders.
    let (assets_dir, default_content_path) = match resolve_app_paths() {
        Ok(paths) => {
            info!(
                root = %paths.root.display(),
                assets_dir = %paths.assets_dir.display(),
                "startup"
            );
            (paths.assets_dir, Some(paths.town_content_path))
        }
        Err(error) => {
            warn!(error = %error, "project_root_unavailable");
            (PathBuf::from("assets"), None)
        }
    };
    let content_path = client_config
        .town_content_path
        .clone()
        .or(default_content_path);
    let map = load_town_map(content_path.as_deref())?;
    report_integrity(&map);

    Ok(AppWiring {
        config: client_config.to_loop_config(),
        map: Arc::new(map),
        stats,
        assets_dir,
        locations: Box::new(LocationRouter::default()),
        hud_actions: Box::new(HudActionLog::default()),
    })
}

fn report_integrity(map: &TownMap) {
    let issues = check_town_integrity(map, &known_location_ids());
    for issue in &issues {
        warn!(issue = %issue, "town_integrity_issue");
    }
    if issues.is_empty() {
        info!(buildings = map.buildings().len(), "town_integrity_ok");
    }
}

fn optional_env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
