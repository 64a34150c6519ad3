use anyhow::{Context, Result};
use clap::Parser;
use common::{ControlAction, LaunchParams, PlayerStatus};
use std::path::PathBuf;
use std::rc::Rc;
use wallpaper::config::{Config, TickSource};
use wallpaper::log_and_continue;
use wallpaper::{Canvas, HostContext, Terminal, WallpaperLauncher};

#[derive(Parser)]
#[command(name = "vwall")]
#[command(about = "Headless host for the frame-sequence video wallpaper", long_about = None)]
#[command(version)]
struct Cli {
    /// Launch arguments: [OPACITY] [FPS]
    #[arg(allow_negative_numbers = true)]
    args: Vec<String>,

    /// Number of host frames to run
    #[arg(short, long, default_value = "600")]
    frames: u64,

    /// Config file (defaults to ~/.config/vwall/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frame source directory, overrides the config
    #[arg(short, long)]
    source: Option<String>,

    /// Press a control panel button at a host frame, e.g. "120:pause"
    #[arg(short, long = "action", value_parser = parse_scheduled_action)]
    actions: Vec<ScheduledAction>,

    /// Save the last drawn canvas as an image
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print the final player status as JSON
    #[arg(long)]
    json: bool,

    /// Echo the wallpaper terminal to stdout
    #[arg(long)]
    show_terminal: bool,

    /// Report the host window as focused for the whole run
    #[arg(long)]
    focused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScheduledAction {
    frame: u64,
    action: ControlAction,
}

fn parse_scheduled_action(s: &str) -> Result<ScheduledAction, String> {
    let (frame, action) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FRAME:ACTION, got '{}'", s))?;

    let frame = frame
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid frame '{}': {}", frame, e))?;
    let action = ControlAction::parse(action.trim()).ok_or_else(|| {
        format!(
            "unknown action '{}' (pause, play, opacity-, opacity+, stop)",
            action
        )
    })?;

    Ok(ScheduledAction { frame, action })
}

fn load_config(path: Option<&PathBuf>) -> (Config, Option<anyhow::Error>) {
    let loaded = match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load before the logger so the configured level applies from the start
    let (mut config, config_error) = load_config(cli.config.as_ref());

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.general.log_level.as_str()),
    )
    .init();

    log::info!("Starting vwall v{}", env!("CARGO_PKG_VERSION"));

    if let Some(e) = config_error {
        if cli.config.is_some() {
            return Err(e).context("Failed to load the requested config file");
        }
        log::warn!("Failed to load config: {:#}", e);
        log::warn!("Using default configuration");
    }

    if let Some(source) = cli.source {
        config.wallpaper.source_dir = source;
    }

    log::info!("  Wallpaper settings:");
    log::info!("    - Source: {}", config.wallpaper.source_dir);
    log::info!("    - Overscan: {}px", config.wallpaper.overscan);
    log::info!(
        "    - Pause when focused: {}",
        if config.wallpaper.pause_when_focused { "yes" } else { "no" }
    );
    log::info!("  Host settings:");
    log::info!(
        "    - Viewport: {}x{} @ {} ticks/s",
        config.host.width,
        config.host.height,
        config.host.tick_rate
    );
    log::info!("    - Tick source: {}", config.host.tick_source);

    let background = config
        .host
        .background_rgba()
        .context("Invalid host background color")?;
    let tick_source = config.host.tick_source();

    let terminal = Rc::new(Terminal::new().with_echo(cli.show_terminal));
    let mut ctx = HostContext::new(config.host.width, config.host.height, terminal.clone())
        .with_tick_rate(config.host.tick_rate);
    ctx.set_focused(cli.focused);

    let mut canvas = Canvas::new(config.host.width, config.host.height);
    canvas.clear(background);

    let params = LaunchParams::from_args_or(&cli.args, config.wallpaper.launch_defaults());
    let mut launcher = WallpaperLauncher::new(params);
    launcher.activate(&mut ctx, &config.wallpaper);
    log::info!("{}", launcher.status_line());

    let mut schedule = cli.actions;
    schedule.sort_by_key(|a| a.frame);
    let mut pending = schedule.into_iter().peekable();

    let dt = 1.0 / ctx.tick_rate() as f32;
    let mut elapsed = 0.0_f32;
    let mut last_status: Option<PlayerStatus> = launcher.status();
    let mut frames_run = 0;

    for frame in 0..cli.frames {
        while let Some(scheduled) = pending.next_if(|a| a.frame <= frame) {
            log::info!("Frame {}: pressing '{}'", frame, scheduled.action.label());
            launcher.apply(scheduled.action);
        }

        elapsed += dt;
        match tick_source {
            TickSource::Modules => ctx.update_modules(elapsed),
            TickSource::Manual => {
                ctx.manual_tick(elapsed);
            }
        }
        launcher.update(&mut ctx, elapsed);

        canvas.clear(background);
        ctx.draw_modules(elapsed, &mut canvas);
        frames_run = frame + 1;

        if !launcher.is_active() {
            log::info!("Video wallpaper exited after {} host frames", frames_run);
            break;
        }
        last_status = launcher.status();
    }

    if pending.peek().is_some() {
        log::warn!("{} scheduled action(s) never ran", pending.count());
    }

    log::info!(
        "Ran {} host frames ({:.2}s of host time)",
        frames_run,
        elapsed
    );

    if cli.json {
        match &last_status {
            Some(status) => println!("{}", serde_json::to_string_pretty(status)?),
            None => println!("null"),
        }
    }

    if let Some(path) = &cli.snapshot {
        log_and_continue!(canvas.save(path), "save snapshot");
    }

    launcher.killed(&mut ctx);
    ctx.kill_all();

    log::info!(
        "Shutdown complete ({} terminal lines written)",
        terminal.len()
    );
    Ok(())
}
