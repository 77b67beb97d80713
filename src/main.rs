use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::{info, warn};

use checkwatch::app::write_export;
use checkwatch::logging::{self, LogTarget};
use checkwatch::source::{
    parse_configs, parse_frames, Clock, FileSource, FileStore, ManualClock, PendingRefresher,
    RefreshController, SystemClock,
};
use checkwatch::ui::{self, Theme};
use checkwatch::{events, App, Settings, Timeline};
use checkwatch_types::TimeRange;

#[derive(Parser, Debug)]
#[command(name = "checkwatch")]
#[command(about = "Reconstruct and browse the execution timeline of a multi-probe check")]
struct Args {
    /// Path to a JSON file of log frames
    #[arg(short, long, default_value = "frames.json")]
    frames: PathBuf,

    /// Path to a JSON file of the check's config history
    #[arg(short, long)]
    configs: Option<PathBuf>,

    /// Check id to select from a keyed config history file
    #[arg(long)]
    check: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// How far back from now the timeline reaches (e.g. "3h", "30m")
    #[arg(short, long)]
    range: Option<String>,

    /// Pin the current time (Unix milliseconds)
    #[arg(long)]
    now: Option<i64>,

    /// File poll interval in seconds
    #[arg(long, default_value = "1")]
    poll: u64,

    /// Do not re-fetch logs for pending timepoints
    #[arg(long)]
    no_refresh: bool,

    /// Export the timeline to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.settings.as_deref())?;
    if let Some(ref range) = args.range {
        settings.timeline.range = range.clone();
    }
    if args.no_refresh {
        settings.refresh.enabled = false;
    }
    settings.validate()?;

    let clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(ManualClock::new(now)),
        None => Arc::new(SystemClock),
    };

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        logging::init(&settings.logging, LogTarget::Stderr)?;
        return export_to_file(&args, &settings, clock.as_ref(), export_path);
    }

    logging::init(&settings.logging, LogTarget::Terminal)?;
    run_with_files(&args, &settings, clock)
}

/// Run the viewer over a frames file and an optional configs file
fn run_with_files(args: &Args, settings: &Settings, clock: Arc<dyn Clock>) -> Result<()> {
    // The pending refresh loop runs on this runtime while the TUI owns the main thread
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let source = FileSource::new(&args.frames, args.configs.as_ref(), args.check.as_deref());
    let mut app = App::new(vec![Box::new(source)], clock.clone(), settings)?
        .with_theme(Theme::auto_detect());

    if settings.refresh.enabled {
        let store = FileStore::new(&args.frames, args.configs.clone());
        let refresher = PendingRefresher::new(
            Arc::new(store),
            clock,
            settings.refresh_interval()?,
            settings.refresh.max_attempts,
        );
        let (controller, updates) = RefreshController::new(refresher);
        app = app.with_refresh(controller, Box::new(updates));
    }

    info!(frames = %args.frames.display(), "starting viewer");
    run_tui(app, Duration::from_secs(args.poll.max(1)))
}

/// Run the TUI with the given app
fn run_tui(mut app: App, refresh_interval: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Size the window before the first load so the newest section is anchored
    app.set_display_width(terminal.size()?.width);
    if let Err(e) = app.reload_data() {
        warn!(error = %e, "initial load failed");
    }

    let result = run_app(&mut terminal, &mut app, refresh_interval);

    app.quit();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                ui::common::render_too_small(frame, area, MIN_WIDTH, MIN_HEIGHT);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Minimap
                Constraint::Min(8),    // Timeline
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::minimap::render(frame, app, chunks[1]);
            ui::timeline::render(frame, app, chunks[2]);
            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            events::handle_event(app, event);
        }

        // New refresh results are applied as soon as they arrive
        if let Err(e) = app.reload_data() {
            warn!(error = %e, "reload failed");
        }

        // Move the timeline forward with the clock
        if last_refresh.elapsed() >= refresh_interval {
            app.rebuild();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Build the timeline once and export it to a JSON file
fn export_to_file(args: &Args, settings: &Settings, clock: &dyn Clock, export_path: &Path) -> Result<()> {
    let origin = args.frames.display().to_string();
    let content = std::fs::read_to_string(&args.frames)
        .with_context(|| format!("cannot read {}", origin))?;
    let frames = parse_frames(&content, &origin)?;

    let configs = match args.configs {
        Some(ref path) => {
            let origin = path.display().to_string();
            let content =
                std::fs::read_to_string(path).with_context(|| format!("cannot read {}", origin))?;
            parse_configs(&content, &origin, args.check.as_deref())?
        }
        None => {
            warn!("no config history given, the timeline will be empty");
            Vec::new()
        }
    };

    let now = clock.now_ms();
    let range = TimeRange::ending_at(now, settings.range_ms()?);
    let timeline = Timeline::build(&frames, &configs, range, now, &settings.timeline_options()?)?;
    write_export(&timeline, export_path)?;

    println!("Exported timeline to: {}", export_path.display());
    Ok(())
}
