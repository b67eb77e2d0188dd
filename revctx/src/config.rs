//! Optional user configuration from `~/.config/revctx/config.toml`.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comment database, relative to the working directory unless absolute.
    pub db_path: PathBuf,
    /// Worker threads used by `show`.
    pub workers: usize,
    /// Lines of padding around each comment's own lines.
    pub context_padding: u32,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(".revctx/comments.db"),
            workers: 4,
            context_padding: 0,
            log: "info".to_owned(),
        }
    }
}

/// Returns the path to the revctx config file.
///
/// Prefers `$XDG_CONFIG_HOME/revctx/config.toml`; falls back to
/// `~/.config/revctx/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("revctx").join("config.toml")
}

pub fn parse(raw: &str) -> Result<Config, toml::de::Error> {
    let mut config: Config = toml::from_str(raw)?;
    config.workers = config.workers.max(1);
    Ok(config)
}

/// Loads the config file, falling back to defaults.
///
/// Runs before logging is set up, so parse errors are soft failures printed
/// to stderr.
pub fn load() -> Config {
    let path = config_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) => return Config::default(),
    };
    match parse(&raw) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("revctx: config parse error in {:?}: {}", path, e);
            Config::default()
        }
    }
}
