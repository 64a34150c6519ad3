/// Integration tests for registering the wallpaper with a host
/// These tests drive the launcher the way a host would: activate, run
/// frames through the module list, then stop or kill it
use image::{Rgba, RgbaImage};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use common::{ControlAction, LaunchParams, PlaybackMode};
use wallpaper::config::WallpaperSettings;
use wallpaper::{Canvas, HostContext, Module, Terminal, WallpaperLauncher};

const DT: f32 = 1.0 / 60.0;

struct Panel;

impl Module for Panel {
    fn name(&self) -> &str {
        "Panel"
    }

    fn update(&mut self, _t: f32) {}

    fn draw(&mut self, _t: f32, _canvas: &mut Canvas) {}

    fn killed(&mut self) {}
}

fn write_frames(dir: &Path, shades: &[u8]) {
    for (i, shade) in shades.iter().enumerate() {
        RgbaImage::from_pixel(2, 2, Rgba([*shade, 0, 0, 255]))
            .save(dir.join(format!("frame_{:04}.png", i + 1)))
            .unwrap();
    }
}

fn settings_for(dir: &Path) -> WallpaperSettings {
    WallpaperSettings {
        source_dir: dir.to_string_lossy().into_owned(),
        overscan: 0,
        ..Default::default()
    }
}

fn host() -> (HostContext, Rc<Terminal>) {
    let terminal = Rc::new(Terminal::new());
    (HostContext::new(4, 4, terminal.clone()), terminal)
}

fn count_lines(terminal: &Terminal, needle: &str) -> usize {
    terminal
        .lines()
        .iter()
        .filter(|l| l.contains(needle))
        .count()
}

#[test]
fn test_activate_registers_at_background() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), &[10, 20, 30]);
    let (mut ctx, _terminal) = host();
    let panel = Rc::new(RefCell::new(Panel));
    ctx.modules.push(panel.clone());

    let mut launcher = WallpaperLauncher::new(LaunchParams {
        opacity: 0.5,
        fps: 30,
    });
    launcher.activate(&mut ctx, &settings_for(dir.path()));

    let player = launcher.player().unwrap().clone();
    assert_eq!(ctx.modules.len(), 2);
    assert_eq!(ctx.modules.position(&player), Some(0));
    assert_eq!(ctx.modules.position(&panel), Some(1));
    assert!(Rc::ptr_eq(&ctx.wallpaper().current().unwrap(), &player));

    let status = launcher.status().unwrap();
    assert_eq!(status.frame_count, 3);
    assert_eq!(status.opacity, 0.5);
    assert_eq!(status.fps, 30);
    assert_eq!(status.update_interval, 2);
    assert_eq!(status.mode, PlaybackMode::Playing);
    assert_eq!(launcher.status_line(), "Status: Active");

    launcher.killed(&mut ctx);
}

#[test]
fn test_host_frames_advance_playback() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), &[10, 20, 30]);
    let (mut ctx, _terminal) = host();

    let mut launcher = WallpaperLauncher::from_args(&["1.0", "30"]);
    launcher.activate(&mut ctx, &settings_for(dir.path()));

    let mut canvas = Canvas::new(4, 4);
    for _ in 0..4 {
        ctx.update_modules(DT);
        launcher.update(&mut ctx, DT);
    }
    ctx.draw_modules(DT, &mut canvas);

    // Interval 2 at 30fps: four host ticks, two advances
    let player = launcher.player().unwrap().clone();
    assert_eq!(player.borrow().current_frame(), 2);
    assert_eq!(canvas.pixel(0, 0), [30, 0, 0, 255]);

    // One more advance wraps around to the first frame
    for _ in 0..2 {
        ctx.update_modules(DT);
    }
    assert_eq!(player.borrow().current_frame(), 0);

    launcher.killed(&mut ctx);
}

#[test]
fn test_draw_blends_with_opacity() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), &[200]);
    let (mut ctx, _terminal) = host();

    let mut launcher = WallpaperLauncher::from_args(&["0.5"]);
    launcher.activate(&mut ctx, &settings_for(dir.path()));

    let mut canvas = Canvas::new(4, 4);
    ctx.draw_modules(DT, &mut canvas);
    assert_eq!(canvas.pixel(2, 2), [100, 0, 0, 255]);

    launcher.apply(ControlAction::OpacityUp);
    canvas.clear([0, 0, 0, 255]);
    ctx.draw_modules(DT, &mut canvas);
    assert_eq!(canvas.pixel(2, 2), [120, 0, 0, 255]);

    launcher.apply(ControlAction::Pause);
    canvas.clear([0, 0, 0, 255]);
    ctx.draw_modules(DT, &mut canvas);
    assert_eq!(canvas.pixel(2, 2), [0, 0, 0, 255]);

    launcher.killed(&mut ctx);
}

#[test]
fn test_second_registration_replaces_first() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), &[10, 20, 30]);
    let (mut ctx, _terminal) = host();

    let mut first = WallpaperLauncher::from_args::<&str>(&[]);
    first.activate(&mut ctx, &settings_for(dir.path()));
    let first_player = first.player().unwrap().clone();

    let mut second = WallpaperLauncher::from_args::<&str>(&[]);
    second.activate(&mut ctx, &settings_for(dir.path()));
    let second_player = second.player().unwrap().clone();

    assert_eq!(ctx.modules.len(), 1);
    assert_eq!(ctx.modules.position(&second_player), Some(0));
    assert!(!ctx.modules.contains(&first_player));
    assert!(first_player.borrow().is_torn_down());
    assert_eq!(first_player.borrow().frame_count(), 0);
    assert!(first_player.borrow().frame_store().is_released());
    assert!(Rc::ptr_eq(
        &ctx.wallpaper().current().unwrap(),
        &second_player
    ));

    assert_eq!(first.status_line(), "Video wallpaper not loaded");
    assert_eq!(second.status_line(), "Status: Active");

    // The stale launcher shutting down must not disturb the new wallpaper
    first.killed(&mut ctx);
    assert_eq!(ctx.modules.len(), 1);
    assert!(ctx.wallpaper().current().is_some());

    second.killed(&mut ctx);
    assert!(ctx.modules.is_empty());
    assert!(ctx.wallpaper().is_empty());
}

#[test]
fn test_stop_and_exit_then_kill_tears_down_once() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), &[10, 20]);
    let (mut ctx, terminal) = host();

    let mut launcher = WallpaperLauncher::from_args::<&str>(&[]);
    launcher.activate(&mut ctx, &settings_for(dir.path()));
    let player = launcher.player().unwrap().clone();

    assert!(launcher.apply(ControlAction::StopAndExit));
    assert!(launcher.is_exiting());
    // Removal happens on the launcher's next update
    assert_eq!(ctx.modules.len(), 1);

    launcher.update(&mut ctx, DT);
    assert!(ctx.modules.is_empty());
    assert!(ctx.wallpaper().is_empty());
    assert!(!launcher.is_active());
    assert!(player.borrow().is_torn_down());
    assert_eq!(launcher.status_line(), "Video wallpaper not loaded");

    launcher.killed(&mut ctx);
    launcher.update(&mut ctx, DT);
    assert_eq!(count_lines(&terminal, "resources cleaned up"), 1);
    assert!(!launcher.apply(ControlAction::Play));
}

#[test]
fn test_host_kill_and_launcher_kill_converge() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), &[10, 20]);
    let (mut ctx, terminal) = host();

    let mut launcher = WallpaperLauncher::from_args::<&str>(&[]);
    launcher.activate(&mut ctx, &settings_for(dir.path()));
    let player = launcher.player().unwrap().clone();

    // Host destroys every module first, then notifies the launcher
    ctx.kill_all();
    assert!(player.borrow().is_torn_down());
    assert!(ctx.wallpaper().is_empty());

    launcher.killed(&mut ctx);
    assert!(!launcher.is_active());
    assert!(ctx.modules.is_empty());
    assert_eq!(count_lines(&terminal, "resources cleaned up"), 1);
}

#[test]
fn test_missing_source_registers_idle_wallpaper() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("WallpaperVideos").join("test1");
    let (mut ctx, terminal) = host();

    let mut launcher = WallpaperLauncher::from_args::<&str>(&[]);
    launcher.activate(&mut ctx, &settings_for(&source));

    assert!(source.is_dir());
    assert!(terminal.contains("Created directory"));

    let player = launcher.player().unwrap().clone();
    assert_eq!(player.borrow().frame_count(), 0);
    assert_eq!(player.borrow().mode(), PlaybackMode::Stopped);
    assert_eq!(ctx.modules.len(), 1);

    let mut canvas = Canvas::new(4, 4);
    ctx.update_modules(DT);
    ctx.draw_modules(DT, &mut canvas);
    assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 255]);

    launcher.killed(&mut ctx);
}

#[test]
fn test_manual_ticks_drive_active_wallpaper() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), &[10, 20, 30]);
    let (mut ctx, _terminal) = host();

    let mut launcher = WallpaperLauncher::from_args(&["1", "60"]);
    launcher.activate(&mut ctx, &settings_for(dir.path()));
    let player = launcher.player().unwrap().clone();

    assert!(ctx.manual_tick(DT));
    assert!(ctx.manual_tick(DT));
    assert_eq!(player.borrow().current_frame(), 2);

    player.borrow_mut().disable_updates();
    assert!(!ctx.manual_tick(DT));
    assert_eq!(player.borrow().current_frame(), 2);

    launcher.killed(&mut ctx);
    assert!(!ctx.manual_tick(DT));
}
