//! Common types shared by the wallpaper engine and its host.
//!
//! This crate holds the plain data that crosses the boundary between the
//! playback engine (`wallpaper`) and the reference host (`vwall`): playback
//! modes, status snapshots, launch parameters and the control actions the
//! host forwards from its control surface.
//!
//! # Examples
//!
//! ```
//! use common::{LaunchParams, DEFAULT_FPS};
//!
//! // Malformed values fall back to the defaults instead of failing
//! let params = LaunchParams::from_args(&["0.5", "fast"]);
//! assert_eq!(params.opacity, 0.5);
//! assert_eq!(params.fps, DEFAULT_FPS);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opacity a freshly constructed player starts with.
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Frame rate a freshly constructed player starts with.
pub const DEFAULT_FPS: i32 = 15;

/// Lowest accepted frame rate.
pub const MIN_FPS: i32 = 1;

/// Highest accepted frame rate.
pub const MAX_FPS: i32 = 60;

/// Fixed rate at which the host calls `update`, in ticks per second.
pub const DEFAULT_HOST_TICK_RATE: u32 = 60;

/// Opacity change applied by the control panel's `Opacity -`/`Opacity +`.
pub const OPACITY_STEP: f32 = 0.1;

/// Playback mode of a wallpaper player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    Playing,
    Paused,
    Stopped,
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Point-in-time snapshot of a player, for status output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerStatus {
    pub mode: PlaybackMode,
    pub frame_count: usize,
    pub current_frame: usize,
    pub opacity: f32,
    pub fps: u32,
    pub update_interval: u32,
    pub updates_enabled: bool,
    pub torn_down: bool,
}

/// Construction parameters handed to the launcher by the command surface.
///
/// Both values are optional on the command line. Parsing never fails:
/// anything that does not parse keeps its default. Range clamping is the
/// player's job, not the parser's.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LaunchParams {
    pub opacity: f32,
    pub fps: i32,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_OPACITY,
            fps: DEFAULT_FPS,
        }
    }
}

impl LaunchParams {
    /// Parse positional `[opacity] [fps]` arguments.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        Self::from_args_or(args, Self::default())
    }

    /// Like [`LaunchParams::from_args`], falling back to `base` instead of
    /// the built-in defaults
    pub fn from_args_or<S: AsRef<str>>(args: &[S], base: Self) -> Self {
        let mut params = base;

        if let Some(opacity) = args
            .first()
            .and_then(|s| s.as_ref().trim().parse::<f32>().ok())
            .filter(|v| v.is_finite())
        {
            params.opacity = opacity;
        }

        if let Some(fps) = args.get(1).and_then(|s| s.as_ref().trim().parse::<i32>().ok()) {
            params.fps = fps;
        }

        params
    }
}

/// Actions exposed by the launcher's control panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ControlAction {
    Pause,
    Play,
    OpacityDown,
    OpacityUp,
    StopAndExit,
}

impl ControlAction {
    /// Parse an action name as typed on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pause" => Some(Self::Pause),
            "play" => Some(Self::Play),
            "opacity-" | "opacity-down" | "opacity_down" => Some(Self::OpacityDown),
            "opacity+" | "opacity-up" | "opacity_up" => Some(Self::OpacityUp),
            "stop" | "exit" | "stop-and-exit" | "stop_and_exit" => Some(Self::StopAndExit),
            _ => None,
        }
    }

    /// Label shown on the control panel button
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pause => "Pause",
            Self::Play => "Play",
            Self::OpacityDown => "Opacity -",
            Self::OpacityUp => "Opacity +",
            Self::StopAndExit => "Stop & Exit",
        }
    }
}

/// Axis-aligned rectangle in host screen coordinates.
///
/// The origin may be negative: the wallpaper draws past the visible edges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport grown by `overscan` pixels on every side.
    pub fn full_screen(width: u32, height: u32, overscan: u32) -> Self {
        let margin = i32::try_from(overscan).unwrap_or(i32::MAX);
        Self {
            x: -margin,
            y: -margin,
            width: width.saturating_add(overscan.saturating_mul(2)),
            height: height.saturating_add(overscan.saturating_mul(2)),
        }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_params_default() {
        let params = LaunchParams::default();
        assert_eq!(params.opacity, 1.0);
        assert_eq!(params.fps, 15);
    }

    #[test]
    fn test_launch_params_from_args() {
        let params = LaunchParams::from_args(&["0.4", "30"]);
        assert_eq!(params.opacity, 0.4);
        assert_eq!(params.fps, 30);

        // Opacity only
        let params = LaunchParams::from_args(&["0.25"]);
        assert_eq!(params.opacity, 0.25);
        assert_eq!(params.fps, DEFAULT_FPS);

        // Nothing at all
        let params = LaunchParams::from_args::<&str>(&[]);
        assert_eq!(params, LaunchParams::default());
    }

    #[test]
    fn test_launch_params_malformed_fall_back() {
        let params = LaunchParams::from_args(&["half", "fast"]);
        assert_eq!(params, LaunchParams::default());

        let params = LaunchParams::from_args(&["NaN", "12.5"]);
        assert_eq!(params, LaunchParams::default());

        // Out of range values are kept; the player clamps them
        let params = LaunchParams::from_args(&["1.7", "999"]);
        assert_eq!(params.opacity, 1.7);
        assert_eq!(params.fps, 999);
    }

    #[test]
    fn test_launch_params_from_args_or_base() {
        let base = LaunchParams {
            opacity: 0.7,
            fps: 24,
        };
        assert_eq!(LaunchParams::from_args_or::<&str>(&[], base), base);

        let params = LaunchParams::from_args_or(&["0.2", "oops"], base);
        assert_eq!(params.opacity, 0.2);
        assert_eq!(params.fps, 24);
    }

    #[test]
    fn test_control_action_parse() {
        assert_eq!(ControlAction::parse("pause"), Some(ControlAction::Pause));
        assert_eq!(ControlAction::parse("PLAY"), Some(ControlAction::Play));
        assert_eq!(
            ControlAction::parse("opacity-"),
            Some(ControlAction::OpacityDown)
        );
        assert_eq!(
            ControlAction::parse("opacity-up"),
            Some(ControlAction::OpacityUp)
        );
        assert_eq!(
            ControlAction::parse("stop"),
            Some(ControlAction::StopAndExit)
        );
        assert!(ControlAction::parse("rewind").is_none());
    }

    #[test]
    fn test_control_action_serialization() {
        let json = serde_json::to_string(&ControlAction::StopAndExit).unwrap();
        assert_eq!(json, "\"stop-and-exit\"");
        let action: ControlAction = serde_json::from_str("\"opacity-up\"").unwrap();
        assert_eq!(action, ControlAction::OpacityUp);
    }

    #[test]
    fn test_player_status_serialization() {
        let status = PlayerStatus {
            mode: PlaybackMode::Paused,
            frame_count: 3,
            current_frame: 1,
            opacity: 0.5,
            fps: 15,
            update_interval: 4,
            updates_enabled: true,
            torn_down: false,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"mode\":\"paused\""));
        let deserialized: PlayerStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, status);
    }

    #[test]
    fn test_rect_full_screen() {
        let rect = Rect::full_screen(1280, 720, 100);
        assert_eq!(rect, Rect::new(-100, -100, 1480, 920));
        assert_eq!(rect.right(), 1380);
        assert_eq!(rect.bottom(), 820);

        let rect = Rect::full_screen(640, 480, 0);
        assert_eq!(rect, Rect::new(0, 0, 640, 480));
    }

    #[test]
    fn test_playback_mode_display() {
        assert_eq!(PlaybackMode::Playing.to_string(), "playing");
        assert_eq!(PlaybackMode::Stopped.to_string(), "stopped");
    }
}
