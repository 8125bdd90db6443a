//! Optional config file loading. Search order: ./hhfetch.toml, then
//! $XDG_CONFIG_HOME/hhfetch/config.toml (or ~/.config/hhfetch/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override
/// defaults, and CLI flags override both.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Output directory for raw pages when --out-dir is not set.
    pub out_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// hh area id (1 = Moscow).
    pub area: Option<u32>,
    /// First role id in the range.
    pub role_start: Option<u32>,
    /// Last role id in the range (inclusive).
    pub role_end: Option<u32>,
    /// Vacancies requested per page.
    pub per_page: Option<u32>,
    /// Lower bound of the random inter-request delay, in seconds.
    pub delay_min_secs: Option<f64>,
    /// Upper bound of the random inter-request delay, in seconds.
    pub delay_max_secs: Option<f64>,
    /// Connect-phase timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Read-phase timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Total HTTP attempts per target for transient failures.
    pub retry_count: Option<u32>,
    /// Marker substring a genuine listing page must contain.
    pub content_marker: Option<String>,
}

/// Search order: (1) ./hhfetch.toml, (2) $XDG_CONFIG_HOME/hhfetch/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present
/// file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("hhfetch.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("hhfetch").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}
