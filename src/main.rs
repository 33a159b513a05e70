mod app;
mod atlas;
mod globe;
mod places;
mod tui;
mod ui;

use std::env;
use std::io;
use std::time::{Duration, Instant};

use app::App;
use atlas::AtlasEvent;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("Usage: {} [atlas-url]", args[0]);
        println!("The world-outline dataset URL may also be set via TERRA_SCOPE_ATLAS_URL.");
        return Ok(());
    }
    let atlas_url = args
        .get(1)
        .cloned()
        .or_else(|| env::var("TERRA_SCOPE_ATLAS_URL").ok())
        .unwrap_or_else(|| atlas::DEFAULT_ATLAS_URL.to_string());

    let mut terminal = tui::init()?;
    let mut app = App::new();

    // Exactly one fetch for the session; the renderer degrades gracefully
    // if it never resolves.
    let (atlas_tx, mut atlas_rx) = mpsc::channel(4);
    tokio::spawn(atlas::fetch_world(atlas_url, atlas_tx));

    let res = run_app(&mut terminal, &mut app, &mut atlas_rx).await;

    tui::restore()?;
    res
}

async fn run_app(
    terminal: &mut tui::Tui,
    app: &mut App,
    atlas_rx: &mut mpsc::Receiver<AtlasEvent>,
) -> io::Result<()> {
    // ~30 frames per second
    let tick_rate = Duration::from_millis(33);
    let mut last_tick = Instant::now();
    let mut needs_render = true;

    while !app.should_quit {
        if needs_render {
            terminal.draw(|f| ui::render(f, app))?;
            needs_render = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        // Sleep most of the frame to avoid spinning the CPU
        if timeout > Duration::from_millis(5) {
            std::thread::sleep(timeout - Duration::from_millis(5));
        }

        // Dataset outcome, if it arrived
        while let Ok(event) = atlas_rx.try_recv() {
            app.handle_atlas_event(event);
            needs_render = true;
        }

        // Drain every pending input event in arrival order; pointer-up is
        // always seen after its pointer-down
        while crossterm::event::poll(Duration::ZERO)? {
            app.handle_event(crossterm::event::read()?);
            needs_render = true;
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
            needs_render = true; // the globe rotated
        }
    }
    Ok(())
}
