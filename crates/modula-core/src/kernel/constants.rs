/// Application name
pub const APP_NAME: &str = "Modula";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default site manifest file
pub const DEFAULT_MANIFEST_FILE: &str = "modula.toml";

/// Default file for the persisted registry state
pub const DEFAULT_STATE_FILE: &str = "modula-state.json";
