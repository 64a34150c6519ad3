//! Frame-sequence video wallpaper engine.
//!
//! A [`WallpaperPlayer`] cycles through a directory of still images at a
//! fixed rate and draws the current one, alpha blended, underneath every
//! other module of the host it is registered with. The host owns the loop;
//! the wallpaper only reacts to `update`, `draw` and `killed`.
//!
//! # Examples
//!
//! ```no_run
//! use std::rc::Rc;
//! use wallpaper::config::Config;
//! use wallpaper::{Canvas, HostContext, Terminal, WallpaperLauncher};
//!
//! let config = Config::default();
//! let mut ctx = HostContext::new(1280, 720, Rc::new(Terminal::new()));
//! let mut launcher = WallpaperLauncher::from_args(&["0.8", "24"]);
//! launcher.activate(&mut ctx, &config.wallpaper);
//!
//! let mut canvas = Canvas::new(1280, 720);
//! for _ in 0..60 {
//!     ctx.update_modules(1.0 / 60.0);
//!     launcher.update(&mut ctx, 1.0 / 60.0);
//!     ctx.draw_modules(1.0 / 60.0, &mut canvas);
//! }
//!
//! launcher.killed(&mut ctx);
//! ```

mod macros;

pub mod compositor;
pub mod config;
pub mod error;
pub mod frame_store;
pub mod host;
pub mod lifecycle;
pub mod player;

pub use compositor::Canvas;
pub use error::FrameLoadError;
pub use frame_store::{Frame, FrameFormat, FrameStore, LoadReport, SourceState};
pub use host::{HostContext, Module, ModuleList, ModuleRef, Terminal, TextSink};
pub use lifecycle::{WallpaperLauncher, WallpaperSlot};
pub use player::{RenderedFrame, WallpaperPlayer};
