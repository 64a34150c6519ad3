//! Frame-sequence playback.
//!
//! The player advances through its [`FrameStore`] on a schedule counted in
//! host ticks rather than wall-clock time: with the host updating at a fixed
//! rate, one frame advance happens every `max(1, host_tick_rate / fps)`
//! ticks. Playback loops forever.

use common::{MAX_FPS, MIN_FPS, PlaybackMode, PlayerStatus, Rect};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::compositor::{self, Canvas};
use crate::frame_store::{Frame, FrameStore};
use crate::host::{HostContext, Module, TextSink};
use crate::lifecycle::WallpaperSlot;
use crate::report;

/// Module name shown by the host
pub const PLAYER_NAME: &str = "VideoWallpaper";

/// The frame to composite this draw tick
#[derive(Debug, Clone, Copy)]
pub struct RenderedFrame<'a> {
    pub frame: &'a Frame,
    /// Opacity, used as an alpha multiplier
    pub alpha: f32,
    /// Full-screen region to stretch the frame over
    pub bounds: Rect,
}

pub struct WallpaperPlayer {
    store: FrameStore,
    bounds: Rect,
    current_frame: usize,
    ticks_since_advance: u32,
    target_fps: u32,
    host_tick_rate: u32,
    opacity: f32,
    mode: PlaybackMode,
    updates_enabled: bool,
    torn_down: bool,
    pause_when_focused: bool,
    focused: Rc<Cell<bool>>,
    sink: Rc<dyn TextSink>,
    slot: Weak<WallpaperSlot>,
}

impl WallpaperPlayer {
    /// Take ownership of `store` and become the host's active wallpaper.
    ///
    /// A wallpaper already in the slot is removed from the module list and
    /// torn down first. The new player is not inserted into the module list;
    /// that is the launcher's job. Frames are scaled to `bounds` here, once.
    pub fn construct(
        ctx: &mut HostContext,
        mut store: FrameStore,
        bounds: Rect,
    ) -> Rc<RefCell<Self>> {
        let sink = ctx.sink();

        let previous = ctx.wallpaper().take();
        if let Some(previous) = previous {
            ctx.modules.remove(&previous);
            previous.borrow_mut().teardown();
            report!(sink, info, "Released previous video wallpaper");
        }

        if !bounds.is_empty() {
            store.fit_to(bounds.width, bounds.height, sink.as_ref());
        }

        let mode = if store.is_empty() {
            PlaybackMode::Stopped
        } else {
            PlaybackMode::Playing
        };

        report!(
            sink,
            info,
            "VideoWallpaperModule constructed: {} frames, bounds {}x{} at ({}, {})",
            store.frame_count(),
            bounds.width,
            bounds.height,
            bounds.x,
            bounds.y
        );

        let player = Rc::new(RefCell::new(Self {
            store,
            bounds,
            current_frame: 0,
            ticks_since_advance: 0,
            target_fps: common::DEFAULT_FPS as u32,
            host_tick_rate: ctx.tick_rate(),
            opacity: common::DEFAULT_OPACITY,
            mode,
            updates_enabled: true,
            torn_down: false,
            pause_when_focused: false,
            focused: ctx.focus_flag(),
            sink,
            slot: Rc::downgrade(ctx.wallpaper()),
        }));

        ctx.wallpaper().install(Rc::clone(&player));
        player
    }

    /// Count one host tick and advance the frame when the interval is
    /// reached. Returns true if the current frame changed.
    pub fn tick(&mut self, elapsed_secs: f32) -> bool {
        if !self.updates_enabled || self.mode != PlaybackMode::Playing || self.store.is_empty() {
            return false;
        }

        if self.pause_when_focused && self.focused.get() {
            return false;
        }

        self.ticks_since_advance += 1;
        if self.ticks_since_advance < self.update_interval() {
            return false;
        }

        let previous = self.current_frame;
        self.current_frame = (self.current_frame + 1) % self.store.frame_count();
        self.ticks_since_advance = 0;
        log::trace!(
            "Wallpaper frame {} -> {} (elapsed: {:.4}s)",
            previous,
            self.current_frame,
            elapsed_secs
        );
        true
    }

    /// Tick entry for callers reaching the player through the wallpaper slot
    pub fn manual_update(&mut self, elapsed_secs: f32) -> bool {
        if !self.updates_enabled {
            return false;
        }
        self.tick(elapsed_secs)
    }

    pub fn render(&self) -> Option<RenderedFrame<'_>> {
        if !self.updates_enabled
            || self.mode != PlaybackMode::Playing
            || self.current_frame >= self.store.frame_count()
        {
            return None;
        }

        Some(RenderedFrame {
            frame: self.store.frame_at(self.current_frame),
            alpha: self.opacity,
            bounds: self.bounds,
        })
    }

    pub fn play(&mut self) {
        if !self.accepts_controls("play") {
            return;
        }
        self.mode = PlaybackMode::Playing;
        report!(self.sink, info, "Video playback started");
    }

    pub fn pause(&mut self) {
        if !self.accepts_controls("pause") {
            return;
        }
        self.mode = PlaybackMode::Paused;
        report!(self.sink, info, "Video playback paused");
    }

    pub fn stop(&mut self) {
        if !self.accepts_controls("stop") {
            return;
        }
        self.mode = PlaybackMode::Stopped;
        self.current_frame = 0;
        self.ticks_since_advance = 0;
        report!(self.sink, info, "Video playback stopped");
    }

    fn accepts_controls(&self, action: &str) -> bool {
        if !self.updates_enabled {
            report!(self.sink, warn, "Ignoring {}: video wallpaper updates are stopped", action);
        }
        self.updates_enabled
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        if opacity.is_nan() {
            report!(self.sink, warn, "Ignoring invalid opacity");
            return;
        }
        self.opacity = opacity.clamp(0.0, 1.0);
        report!(self.sink, info, "Opacity set to: {}", self.opacity);
    }

    pub fn set_fps(&mut self, fps: i32) {
        self.target_fps = fps.clamp(MIN_FPS, MAX_FPS) as u32;
        report!(self.sink, info, "FPS set to: {}", self.target_fps);
    }

    /// Hold the current frame while the host window has focus
    pub fn set_pause_when_focused(&mut self, enabled: bool) {
        self.pause_when_focused = enabled;
    }

    /// Permanently stop this instance from ticking or drawing
    pub fn disable_updates(&mut self) {
        if !self.updates_enabled {
            return;
        }
        self.updates_enabled = false;
        self.mode = PlaybackMode::Paused;
        report!(self.sink, info, "Video wallpaper updates stopped");
    }

    /// Release every resource the player holds and leave the wallpaper slot
    /// if it still points here. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            log::debug!("Video wallpaper already torn down");
            return;
        }

        self.disable_updates();
        let released = self.store.release();
        self.current_frame = 0;
        self.ticks_since_advance = 0;

        if let Some(slot) = self.slot.upgrade()
            && slot.release_if(self as *const Self)
        {
            log::debug!("Cleared active wallpaper slot");
        }

        self.torn_down = true;
        report!(
            self.sink,
            info,
            "Video wallpaper resources cleaned up ({} frames released)",
            released
        );
    }

    /// Host ticks between frame advances
    pub fn update_interval(&self) -> u32 {
        (self.host_tick_rate / self.target_fps).max(1)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn fps(&self) -> u32 {
        self.target_fps
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.store.frame_count()
    }

    pub fn frame_store(&self) -> &FrameStore {
        &self.store
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn updates_enabled(&self) -> bool {
        self.updates_enabled
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            mode: self.mode,
            frame_count: self.store.frame_count(),
            current_frame: self.current_frame,
            opacity: self.opacity,
            fps: self.target_fps,
            update_interval: self.update_interval(),
            updates_enabled: self.updates_enabled,
            torn_down: self.torn_down,
        }
    }
}

impl Module for WallpaperPlayer {
    fn name(&self) -> &str {
        PLAYER_NAME
    }

    fn update(&mut self, t: f32) {
        self.tick(t);
    }

    // No border chrome: the wallpaper replaces the module background
    fn draw(&mut self, _t: f32, canvas: &mut Canvas) {
        if let Some(rendered) = self.render() {
            compositor::composite(canvas, rendered.frame, rendered.bounds, rendered.alpha);
        }
    }

    fn killed(&mut self) {
        self.teardown();
    }
}

impl Drop for WallpaperPlayer {
    fn drop(&mut self) {
        if !self.torn_down {
            log::warn!("Video wallpaper dropped without teardown");
        }
    }
}
