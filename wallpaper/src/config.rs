use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::validate_enum;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub wallpaper: WallpaperSettings,

    #[serde(default)]
    pub host: HostSettings,
}

/// General settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Frame source and playback defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WallpaperSettings {
    /// Directory holding the frame sequence, relative to the working directory
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    #[serde(default = "default_opacity")]
    pub opacity: f32,

    #[serde(default = "default_fps")]
    pub fps: i32,

    /// Pixels the wallpaper extends past each edge of the viewport
    #[serde(default = "default_overscan")]
    pub overscan: u32,

    #[serde(default)]
    pub pause_when_focused: bool,
}

impl Default for WallpaperSettings {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            opacity: default_opacity(),
            fps: default_fps(),
            overscan: default_overscan(),
            pause_when_focused: false,
        }
    }
}

fn default_source_dir() -> String {
    "WallpaperVideos/test1".to_string()
}
fn default_opacity() -> f32 {
    common::DEFAULT_OPACITY
}
fn default_fps() -> i32 {
    common::DEFAULT_FPS
}
fn default_overscan() -> u32 {
    100
}

impl WallpaperSettings {
    /// Source directory with `~` expanded
    pub fn source_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.source_dir).as_ref())
    }

    /// Launch parameters to use when the command line gives none
    pub fn launch_defaults(&self) -> common::LaunchParams {
        common::LaunchParams {
            opacity: self.opacity,
            fps: self.fps,
        }
    }
}

/// How the host delivers ticks to the wallpaper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    /// Through the module list, like every other module
    Modules,
    /// Through the wallpaper slot, independent of the module list
    Manual,
}

/// Reference host settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostSettings {
    /// Host update calls per second
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_tick_source")]
    pub tick_source: String,

    /// Canvas clear color (hex, e.g. "1a1a2e")
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            width: default_width(),
            height: default_height(),
            tick_source: default_tick_source(),
            background: default_background(),
        }
    }
}

fn default_tick_rate() -> u32 {
    common::DEFAULT_HOST_TICK_RATE
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_tick_source() -> String {
    "modules".to_string()
}
fn default_background() -> String {
    "000000".to_string()
}

impl HostSettings {
    pub fn tick_source(&self) -> TickSource {
        match self.tick_source.as_str() {
            "manual" => TickSource::Manual,
            _ => TickSource::Modules,
        }
    }

    /// Background as opaque RGBA
    pub fn background_rgba(&self) -> Option<[u8; 4]> {
        parse_hex_color(&self.background)
    }
}

/// Parse "RRGGBB" (optionally '#'-prefixed) into opaque RGBA
pub fn parse_hex_color(hex: &str) -> Option<[u8; 4]> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;

    Some([r, g, b, 255])
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded configuration from {}", path.display());
        config.validate()?;

        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("vwall");

        Ok(config_dir.join("config.toml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        self.validate_log_level(&self.general.log_level)?;
        self.validate_tick_source(&self.host.tick_source)?;

        if self.wallpaper.source_dir.trim().is_empty() {
            anyhow::bail!("wallpaper.source_dir must not be empty");
        }
        if !(0.0..=1.0).contains(&self.wallpaper.opacity) {
            anyhow::bail!(
                "wallpaper.opacity must be within 0.0-1.0: {}",
                self.wallpaper.opacity
            );
        }
        if !(common::MIN_FPS..=common::MAX_FPS).contains(&self.wallpaper.fps) {
            anyhow::bail!(
                "wallpaper.fps must be within {}-{}: {}",
                common::MIN_FPS,
                common::MAX_FPS,
                self.wallpaper.fps
            );
        }

        if self.host.tick_rate == 0 {
            anyhow::bail!("host.tick_rate must be at least 1");
        }
        if self.host.width == 0 || self.host.height == 0 {
            anyhow::bail!(
                "Invalid host viewport: {}x{}",
                self.host.width,
                self.host.height
            );
        }
        if self.host.background_rgba().is_none() {
            anyhow::bail!("Invalid host background color: {}", self.host.background);
        }

        Ok(())
    }

    fn validate_log_level(&self, level: &str) -> Result<()> {
        validate_enum!(level, "trace", "debug", "info", "warn", "error")
    }

    fn validate_tick_source(&self, source: &str) -> Result<()> {
        validate_enum!(source, "modules", "manual")
    }
}
