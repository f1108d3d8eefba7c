use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4320;
const DEFAULT_SLOW_QUERY_MS: u64 = 100;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// REST API port (default: 4320).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,habitd=trace" (default: "info").
    log: Option<String>,
    /// API key required in the X-API-Key header. None = auth disabled.
    api_key: Option<String>,
    /// Log SQLite queries slower than this threshold in milliseconds
    /// (default: 100; 0 disables slow-query logging).
    slow_query_threshold_ms: Option<u64>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── Resolved config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HabitdConfig {
    pub port: u16,
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub log: String,
    pub api_key: Option<String>,
    pub slow_query_threshold_ms: u64,
}

impl HabitdConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let toml = load_toml(&data_dir).unwrap_or_default();

        Self {
            port: port.or(toml.port).unwrap_or(DEFAULT_PORT),
            bind_address: bind_address
                .or(toml.bind_address)
                .unwrap_or_else(default_bind_address),
            log: log.or(toml.log).unwrap_or_else(|| "info".to_string()),
            api_key: api_key.filter(|k| !k.is_empty()).or(toml.api_key),
            slow_query_threshold_ms: toml
                .slow_query_threshold_ms
                .unwrap_or(DEFAULT_SLOW_QUERY_MS),
            data_dir,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/habitd
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("habitd");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/habitd or ~/.local/share/habitd
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("habitd");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("habitd");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\habitd
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("habitd");
        }
    }
    // Fallback
    PathBuf::from(".habitd")
}
