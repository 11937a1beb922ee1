/// Application name used for data directories.
pub const APP_NAME: &str = "ephstack";

/// Length of truncated object hashes used as plan identifiers.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Config directory scanned when none is given, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for provisioning settings.
pub const ENV_PREFIX: &str = "EPHSTACK";
