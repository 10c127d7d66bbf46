//! Configuration management for the PDF thumbnail server
//!
//! All values are fixed at startup. `Config::from_env` reads the process
//! environment (after loading `.env`); `Config::from_lookup` takes any key
//! lookup so configuration can be built without touching the environment.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub render: RenderConfig,
    pub wiki: WikiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Rendering and cache settings, immutable for the life of the process
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Rasterization density in dots per inch (always > 0)
    pub resolution: u32,
    /// `target` attribute of the anchor wrapping the thumbnail
    pub anchor_target: String,
    /// Inline CSS of the `<img>` tag
    pub style: String,
    /// Write thumbnails to `cache_dir` instead of inlining them
    pub cache_enabled: bool,
    pub cache_dir: PathBuf,
    /// Public URL prefix under which `cache_dir` is served
    pub cache_url: String,
    /// Reject remote URL references
    pub disable_external_file: bool,
}

/// Wiki storage conventions the attachment resolver depends on
#[derive(Debug, Clone, Deserialize)]
pub struct WikiConfig {
    pub upload_dir: PathBuf,
    /// Script URI used to build attachment download links
    pub base_uri: String,
    /// Page that absolute or empty page references fall back to
    pub default_page: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            render: RenderConfig::default(),
            wiki: WikiConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            resolution: 72,
            anchor_target: "_blank".to_string(),
            style: "width: 300px; max-width: 100%;".to_string(),
            cache_enabled: true,
            cache_dir: PathBuf::from("./cache/pdf_thumbnail"),
            cache_url: "/cache/pdf_thumbnail".to_string(),
            disable_external_file: true,
        }
    }
}

impl Default for WikiConfig {
    fn default() -> Self {
        WikiConfig {
            upload_dir: PathBuf::from("./attach"),
            base_uri: "/".to_string(),
            default_page: "FrontPage".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let resolution = match lookup("PDF_THUMBNAIL_RESOLUTION") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(dpi) if dpi > 0 => dpi,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PDF_THUMBNAIL_RESOLUTION",
                        value: raw,
                        reason: "expected a positive integer",
                    })
                }
            },
            None => defaults.render.resolution,
        };

        Ok(Config {
            server: ServerConfig {
                host: get("SERVER_HOST", &defaults.server.host),
                port: lookup("SERVER_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            render: RenderConfig {
                resolution,
                anchor_target: get("PDF_THUMBNAIL_ANCHOR_TARGET", &defaults.render.anchor_target),
                style: get("PDF_THUMBNAIL_STYLE", &defaults.render.style),
                cache_enabled: parse_flag(
                    "PDF_THUMBNAIL_CACHE",
                    lookup("PDF_THUMBNAIL_CACHE"),
                    defaults.render.cache_enabled,
                )?,
                cache_dir: lookup("PDF_THUMBNAIL_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.render.cache_dir),
                cache_url: get("PDF_THUMBNAIL_CACHE_URL", &defaults.render.cache_url)
                    .trim_end_matches('/')
                    .to_string(),
                disable_external_file: parse_flag(
                    "PDF_THUMBNAIL_DISABLE_EXTERNAL_FILE",
                    lookup("PDF_THUMBNAIL_DISABLE_EXTERNAL_FILE"),
                    defaults.render.disable_external_file,
                )?,
            },
            wiki: WikiConfig {
                upload_dir: lookup("WIKI_UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.wiki.upload_dir),
                base_uri: get("WIKI_BASE_URI", &defaults.wiki.base_uri),
                default_page: get("WIKI_DEFAULT_PAGE", &defaults.wiki.default_page),
            },
        })
    }
}

fn parse_flag(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected a boolean",
        }),
    }
}
