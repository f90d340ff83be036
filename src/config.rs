// Configuration: where the token comes from. A TOML file with a `[gist]`
// section under the user's config directory, with environment overrides
// on top so the token can be injected in CI or one-off shells.

use crate::api::DEFAULT_API_URL;
use crate::error::{GistError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV: &str = "GIST_CONFIG";
pub const TOKEN_ENV: &str = "GIST_TOKEN";
pub const API_URL_ENV: &str = "GIST_API_URL";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    gist: GistSection,
}

#[derive(Debug, Default, Deserialize)]
struct GistSection {
    token: Option<String>,
    api_url: Option<String>,
    editor: Option<String>,
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    /// Editor command from the config file; `EDITOR` is consulted when unset.
    pub editor: Option<String>,
}

impl Config {
    /// Config with the given token and the public API endpoint.
    pub fn new(token: impl Into<String>) -> Self {
        Config {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            editor: None,
        }
    }

    /// `<config_dir>/gist/config.toml`, e.g. `~/.config/gist/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("gist").join("config.toml"))
    }

    /// Load from `path`, else `$GIST_CONFIG`, else the default location.
    /// An explicitly named file must exist; the default one may be missing
    /// as long as the environment provides a token.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).map(PathBuf::from));

        let text = match explicit {
            Some(path) => {
                debug!(path = %path.display(), "reading config");
                Some(std::fs::read_to_string(&path).map_err(|e| {
                    GistError::Config(format!("cannot read {}: {}", path.display(), e))
                })?)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    debug!(path = %path.display(), "reading config");
                    Some(std::fs::read_to_string(&path)?)
                }
                _ => None,
            },
        };

        let section = match text {
            Some(text) => parse(&text)?,
            None => GistSection::default(),
        };
        resolve(section, env)
    }

    /// Parse config text without consulting the environment.
    pub fn from_toml(text: &str) -> Result<Self> {
        resolve(parse(text)?, |_| None)
    }
}

fn parse(text: &str) -> Result<GistSection> {
    let file: ConfigFile =
        toml::from_str(text).map_err(|e| GistError::Config(e.message().to_string()))?;
    Ok(file.gist)
}

fn resolve(section: GistSection, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let token = non_empty(env(TOKEN_ENV))
        .or_else(|| non_empty(section.token))
        .ok_or_else(|| {
            GistError::Config(format!(
                "no token configured; set `token` in the [gist] section or {}",
                TOKEN_ENV
            ))
        })?;
    let api_url = non_empty(env(API_URL_ENV))
        .or_else(|| non_empty(section.api_url))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    Ok(Config {
        token: token.trim().to_string(),
        api_url,
        editor: non_empty(section.editor),
    })
}
