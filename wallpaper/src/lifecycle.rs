//! Binding the wallpaper into the host's module list.
//!
//! Protocol, in order:
//! - activation removes and tears down any wallpaper already in the slot
//!   before constructing a new one,
//! - the new player goes in at index 0 of the module list (background),
//! - deactivation removes it from the list once, then tears it down once.
//!
//! The explicit "Stop & Exit" path and the host kill path both end in
//! [`WallpaperLauncher::deactivate`], which is safe to reach twice.

use common::{ControlAction, LaunchParams, OPACITY_STEP, PlayerStatus, Rect};
use std::cell::RefCell;
use std::rc::Rc;

use crate::config::WallpaperSettings;
use crate::frame_store::FrameStore;
use crate::host::HostContext;
use crate::player::WallpaperPlayer;
use crate::report;

/// The host's single "current wallpaper" reference.
#[derive(Default)]
pub struct WallpaperSlot {
    current: RefCell<Option<Rc<RefCell<WallpaperPlayer>>>>,
}

impl WallpaperSlot {
    pub fn current(&self) -> Option<Rc<RefCell<WallpaperPlayer>>> {
        self.current.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.borrow().is_none()
    }

    /// Put `player` in the slot, returning whatever was there
    pub(crate) fn install(
        &self,
        player: Rc<RefCell<WallpaperPlayer>>,
    ) -> Option<Rc<RefCell<WallpaperPlayer>>> {
        self.current.replace(Some(player))
    }

    pub fn take(&self) -> Option<Rc<RefCell<WallpaperPlayer>>> {
        self.current.take()
    }

    /// Whether the slot currently holds the player at `player`
    pub fn holds(&self, player: *const WallpaperPlayer) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|p| std::ptr::eq(p.as_ptr(), player))
    }

    /// Empty the slot only if it holds `player`
    pub fn release_if(&self, player: *const WallpaperPlayer) -> bool {
        if !self.holds(player) {
            return false;
        }
        self.current.take();
        true
    }
}

/// Launcher that owns one wallpaper registration in the host.
pub struct WallpaperLauncher {
    params: LaunchParams,
    player: Option<Rc<RefCell<WallpaperPlayer>>>,
    module_added: bool,
    exiting: bool,
}

impl WallpaperLauncher {
    pub fn new(params: LaunchParams) -> Self {
        Self {
            params,
            player: None,
            module_added: false,
            exiting: false,
        }
    }

    /// Build from positional `[opacity] [fps]` arguments
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        Self::new(LaunchParams::from_args(args))
    }

    pub fn params(&self) -> LaunchParams {
        self.params
    }

    /// Load the frame source and register a new wallpaper at the bottom of
    /// the host's module list.
    pub fn activate(&mut self, ctx: &mut HostContext, settings: &WallpaperSettings) {
        let sink = ctx.sink();

        if self.player.is_some() {
            report!(sink, warn, "Video wallpaper already active");
            return;
        }

        let source = settings.source_path();
        report!(sink, info, "=== Video Wallpaper ===");
        report!(sink, info, "Source: {}", source.display());
        report!(
            sink,
            info,
            "Parameters: opacity={}, fps={}",
            self.params.opacity,
            self.params.fps
        );

        let previous = ctx.wallpaper().take();
        if let Some(previous) = previous {
            ctx.modules.remove(&previous);
            previous.borrow_mut().teardown();
            report!(sink, info, "Removed previous video wallpaper");
        }

        let store = FrameStore::load(&source, sink.as_ref());
        let (width, height) = ctx.viewport();
        let region = Rect::full_screen(width, height, settings.overscan);
        let player = WallpaperPlayer::construct(ctx, store, region);

        {
            let mut p = player.borrow_mut();
            p.set_opacity(self.params.opacity);
            p.set_fps(self.params.fps);
            p.set_pause_when_focused(settings.pause_when_focused);
        }

        self.module_added = ctx.modules.insert(0, player.clone());
        self.player = Some(player);
        self.exiting = false;

        report!(
            sink,
            info,
            "Video wallpaper initialized - module added at background position"
        );
    }

    /// Per-frame launcher work: completes a pending exit request.
    pub fn update(&mut self, ctx: &mut HostContext, _t: f32) {
        if self.exiting && self.module_added {
            let sink = ctx.sink();
            report!(sink, info, "Cleaning up video wallpaper module...");
            self.deactivate(ctx);
            report!(sink, info, "Video wallpaper stopped and cleaned up");
        }
    }

    /// Apply a control panel action. Returns false if there is no
    /// wallpaper to act on.
    pub fn apply(&mut self, action: ControlAction) -> bool {
        let Some(player) = self.player.clone().filter(|_| !self.exiting) else {
            log::warn!("Control '{}' ignored: video wallpaper not loaded", action.label());
            return false;
        };

        log::debug!("Control panel: {}", action.label());
        let mut p = player.borrow_mut();
        match action {
            ControlAction::Pause => p.pause(),
            ControlAction::Play => p.play(),
            ControlAction::OpacityDown => {
                let opacity = p.opacity() - OPACITY_STEP;
                p.set_opacity(opacity);
            }
            ControlAction::OpacityUp => {
                let opacity = p.opacity() + OPACITY_STEP;
                p.set_opacity(opacity);
            }
            ControlAction::StopAndExit => {
                drop(p);
                self.request_stop();
            }
        }
        true
    }

    /// Ask for the wallpaper to be removed on the next `update`
    pub fn request_stop(&mut self) {
        self.exiting = true;
    }

    /// Host kill notification
    pub fn killed(&mut self, ctx: &mut HostContext) {
        if self.player.is_some() {
            log::info!("Launcher killed, releasing video wallpaper");
        }
        self.deactivate(ctx);
    }

    /// Remove the wallpaper from the module list and tear it down.
    pub fn deactivate(&mut self, ctx: &mut HostContext) {
        let Some(player) = self.player.take() else {
            return;
        };

        player.borrow_mut().disable_updates();
        if self.module_added {
            if !ctx.modules.remove(&player) {
                log::debug!("Video wallpaper was already gone from the module list");
            }
            self.module_added = false;
        }
        player.borrow_mut().teardown();
    }

    pub fn is_active(&self) -> bool {
        self.player.is_some()
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    pub fn player(&self) -> Option<&Rc<RefCell<WallpaperPlayer>>> {
        self.player.as_ref()
    }

    pub fn status(&self) -> Option<PlayerStatus> {
        self.player.as_ref().map(|p| p.borrow().status())
    }

    /// One-line summary for the control panel
    pub fn status_line(&self) -> &'static str {
        let live = self
            .player
            .as_ref()
            .is_some_and(|p| !p.borrow().is_torn_down());
        if live && !self.exiting {
            "Status: Active"
        } else {
            "Video wallpaper not loaded"
        }
    }
}
