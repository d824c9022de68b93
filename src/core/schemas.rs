//! Centralized on-disk layout and document constants.
//!
//! A TaskGame project keeps everything under `.taskgame/`:
//! 1. config.toml: storage, remote and accrual settings.
//! 2. data/<data_file>: the local snapshot (also the backup of the remote copy).

pub const PROJECT_DIR_NAME: &str = ".taskgame";
pub const DATA_DIR_NAME: &str = "data";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_DATA_FILE: &str = "colocation_data.json";

// --- Remote document store (GitHub Gist API) ---
pub const DEFAULT_REMOTE_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_REMOTE_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const REMOTE_GIST_ID_ENV: &str = "TASKGAME_GIST_ID";
pub const REMOTE_ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
pub const REMOTE_UPDATE_DESCRIPTION: &str = "TaskGame household data - automatic update";
pub const REMOTE_CREATE_DESCRIPTION: &str = "TaskGame household data";
pub const REMOTE_README: &str = "# TaskGame\n\nPersistent data for the household chore game.\n\n**Do not edit this gist by hand.**\n";

pub const MEMBER_ENV: &str = "TASKGAME_MEMBER";

/// Locations offered when adding a chore, in display order.
pub const LOCATIONS: &[&str] = &[
    "Cuisine", "Salon", "SDB 1er", "SDB 2ème", "RDC", "Garage", "Jardin", "Cour", "Général",
];

/// Base point range accepted by the administrative surface.
pub const MIN_BASE_POINTS: u32 = 1;
pub const MAX_BASE_POINTS: u32 = 3;
