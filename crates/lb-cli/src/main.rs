mod sample;
mod server;
mod sink;

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lb_core::{
    Place, PlaceId, Reminder, SampleOutcome, Transition, now_unix_millis,
    whole_minutes_ago,
};
use lb_store::{Config, Profile};
use rmcp::{ServiceExt, transport::stdio};
use tokio::sync::mpsc;

use crate::sample::{parse_coordinate, parse_sample_line};
use crate::sink::StdoutSink;

#[derive(Parser)]
#[command(name = "lb", about = "Leave-behind reminders: places, items, and where you left them")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tracked places
    Place {
        #[command(subcommand)]
        action: PlaceAction,
    },

    /// Manage the item list
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },

    /// Track position samples read from stdin, one `lat,lng[,unix_ms]` per line
    Track,

    /// Deliver a departure reminder as if leaving the current or first place
    SimulateLeave,

    /// Rank the places where an item was most likely left
    Recover {
        /// Item name
        item: String,
    },

    /// Show the latest sighting of every item
    LastSeen,

    /// Inspect or move the event history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Show or update settings
    Config {
        /// Minimum dwell in seconds before a reminder fires
        #[arg(long)]
        min_session_secs: Option<u64>,

        /// Radius in meters for places added without --radius
        #[arg(long)]
        default_radius: Option<f64>,
    },

    /// Start MCP server on stdio transport
    Serve,
}

#[derive(Subcommand)]
enum PlaceAction {
    /// Register a place centered at `lat,lng`
    Add {
        /// Center as `lat,lng`
        #[arg(allow_hyphen_values = true)]
        center: String,

        /// Display name (defaults to "Place")
        #[arg(long)]
        name: Option<String>,

        /// Radius in meters (defaults to the configured radius)
        #[arg(long)]
        radius: Option<f64>,
    },

    /// List places in registration order
    List,

    /// Remove a place by list index or id
    Remove {
        /// Index from `lb place list`, or the place id
        target: String,
    },

    /// Remove all places
    Clear,
}

#[derive(Subcommand)]
enum ItemAction {
    /// Add an item (always taken by default)
    Add { name: String },

    /// Flip whether an item is always taken
    Toggle { name: String },

    /// Remove an item
    Remove { name: String },

    /// Remove all items
    Clear,

    /// List items
    List,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Export history to a JSON file
    Export { path: PathBuf },

    /// Replace history with the contents of a JSON file
    Import { path: PathBuf },

    /// Delete all history
    Clear,

    /// Print the number of logged events
    Count,

    /// Print every logged location as `lat,lng,weight`
    Heat,
}

fn open_profile() -> Result<Profile> {
    let base_dir = std::env::var("LB_DATA_DIR").ok().map(PathBuf::from);
    Profile::open(base_dir.as_deref()).context("failed to open profile")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Place { action } => cmd_place(action),
        Commands::Item { action } => cmd_item(action),
        Commands::Track => cmd_track().await,
        Commands::SimulateLeave => cmd_simulate_leave(),
        Commands::Recover { item } => cmd_recover(item),
        Commands::LastSeen => cmd_last_seen(),
        Commands::History { action } => cmd_history(action),
        Commands::Config {
            min_session_secs,
            default_radius,
        } => cmd_config(*min_session_secs, *default_radius),
        Commands::Serve => cmd_serve().await,
    }
}

async fn cmd_serve() -> Result<()> {
    let profile = open_profile()?;
    tracing::info!("starting MCP server");

    let server = server::LbServer::new(profile).map_err(|e| anyhow::anyhow!("{e}"))?;
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    Ok(())
}

fn cmd_place(action: &PlaceAction) -> Result<()> {
    let profile = open_profile()?;
    let default_radius = profile.config().default_radius_meters;
    let mut session = profile.into_session(Vec::<Reminder>::new())?;

    match action {
        PlaceAction::Add {
            center,
            name,
            radius,
        } => {
            let center = parse_coordinate(center).map_err(anyhow::Error::msg)?;
            let place = Place::new(
                name.as_deref().unwrap_or_default(),
                center,
                radius.unwrap_or(default_radius),
            )?;
            println!(
                "added {} ({:.6}, {:.6}) r={}m id={}",
                place.name, place.center.latitude, place.center.longitude, place.radius_meters, place.id
            );
            session.add_place(place)?;
        }
        PlaceAction::List => {
            if session.places().is_empty() {
                println!("(no places)");
            }
            for (i, p) in session.places().iter().enumerate() {
                println!(
                    "{i}: {} ({:.6}, {:.6}) r={}m id={}",
                    p.name, p.center.latitude, p.center.longitude, p.radius_meters, p.id
                );
            }
            return Ok(());
        }
        PlaceAction::Remove { target } => {
            let removed = match (PlaceId::parse(target), target.parse::<usize>()) {
                (Some(id), _) => session.remove_place(id),
                (None, Ok(index)) => session.remove_place_at(index),
                (None, Err(_)) => bail!("'{target}' is neither a place index nor an id"),
            };
            let place = removed.with_context(|| format!("no place matches '{target}'"))?;
            println!("removed {}", place.name);
        }
        PlaceAction::Clear => {
            let n = session.places().len();
            session.clear_places();
            println!("removed {n} places");
        }
    }

    session
        .persistence()
        .save_places(session.places())
        .context("failed to save places")?;
    Ok(())
}

fn cmd_item(action: &ItemAction) -> Result<()> {
    let profile = open_profile()?;
    let mut session = profile.into_session(Vec::<Reminder>::new())?;

    match action {
        ItemAction::Add { name } => {
            let item = session.add_item(name)?;
            println!("added {}", item.name);
        }
        ItemAction::Toggle { name } => {
            let always = session.toggle_item(name)?;
            println!("{} is {}", name.trim(), if always { "always taken" } else { "optional" });
        }
        ItemAction::Remove { name } => {
            let item = session.remove_item(name)?;
            println!("removed {}", item.name);
        }
        ItemAction::Clear => {
            let n = session.items().len();
            session.clear_items();
            println!("removed {n} items");
        }
        ItemAction::List => {
            if session.items().is_empty() {
                println!("(no items)");
            }
            for item in session.items().list() {
                let mark = if item.always_take { "x" } else { " " };
                println!("[{mark}] {}", item.name);
            }
            return Ok(());
        }
    }

    session
        .persistence()
        .save_items(session.items())
        .context("failed to save items")?;
    Ok(())
}

/// Forward stdin lines from a plain thread. A blocked read there does not
/// hold up runtime shutdown the way `tokio::io::stdin` does.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn cmd_track() -> Result<()> {
    let profile = open_profile()?;
    let mut session = profile.into_session(StdoutSink)?;
    if session.places().is_empty() {
        tracing::warn!("no places registered, nothing will be tracked");
    }
    session.start();

    let mut lines = spawn_stdin_reader();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut line_no = 0usize;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    break;
                };
                let line = line.context("failed to read stdin")?;
                line_no += 1;
                let sample = match parse_sample_line(&line) {
                    Ok(Some(sample)) => sample,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!("line {line_no}: {e}");
                        continue;
                    }
                };
                let now = sample.timestamp.unwrap_or_else(now_unix_millis);
                match session.on_sample(sample.coordinate, now) {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(e) => tracing::warn!("line {line_no}: {e}"),
                }
            }
        }
    }

    if let Some(abandoned) = session.stop() {
        println!("stopped inside {}", abandoned.place.name);
    }
    Ok(())
}

fn print_outcome(outcome: &SampleOutcome) {
    match &outcome.transition {
        Some(Transition::Entered { place, .. }) => {
            println!("entered {} ({} items logged)", place.name, outcome.events_logged)
        }
        Some(Transition::Left {
            place,
            elapsed_secs,
        }) => println!("left {} after {elapsed_secs}s", place.name),
        None => {}
    }
}

fn cmd_simulate_leave() -> Result<()> {
    let profile = open_profile()?;
    let mut session = profile.into_session(StdoutSink)?;
    if session.simulate_leaving(now_unix_millis()).is_none() {
        bail!("no places registered; add one with `lb place add`");
    }
    Ok(())
}

fn cmd_recover(item: &str) -> Result<()> {
    let profile = open_profile()?;
    let session = profile.into_session(Vec::<Reminder>::new())?;
    let now = now_unix_millis();
    let ranked = session.recover(item.trim(), now);

    if ranked.is_empty() {
        println!("No history found for this item.");
        return Ok(());
    }
    println!("Where to look for {}:", item.trim());
    for (i, s) in ranked.iter().enumerate() {
        println!(
            "{}. {} (last seen {} mins ago) score={:.2}",
            i + 1,
            s.place_name,
            whole_minutes_ago(now, s.last_seen),
            s.score
        );
    }
    Ok(())
}

fn cmd_last_seen() -> Result<()> {
    let profile = open_profile()?;
    let session = profile.into_session(Vec::<Reminder>::new())?;
    let now = now_unix_millis();

    let latest = session.latest_sightings();
    if latest.is_empty() {
        println!("No data");
        return Ok(());
    }
    for e in &latest {
        println!(
            "{}: {} (last seen {} mins ago)",
            e.item_name,
            e.place_name,
            whole_minutes_ago(now, e.timestamp)
        );
    }
    Ok(())
}

fn cmd_history(action: &HistoryAction) -> Result<()> {
    let profile = open_profile()?;
    let store = profile.store();

    match action {
        HistoryAction::Export { path } => {
            store
                .export_json_file(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("exported {} events to {}", store.event_count()?, path.display());
        }
        HistoryAction::Import { path } => {
            let n = store
                .import_json_file(path)
                .context("failed to import JSON")?;
            println!("imported {n} events from {}", path.display());
        }
        HistoryAction::Clear => {
            store.clear_events()?;
            println!("history cleared");
        }
        HistoryAction::Count => println!("{}", store.event_count()?),
        HistoryAction::Heat => {
            let session = profile.into_session(Vec::<Reminder>::new())?;
            for p in session.heat_points() {
                println!(
                    "{:.6},{:.6},{}",
                    p.coordinate.latitude, p.coordinate.longitude, p.weight
                );
            }
        }
    }
    Ok(())
}

fn cmd_config(min_session_secs: Option<u64>, default_radius: Option<f64>) -> Result<()> {
    let mut profile = open_profile()?;

    if min_session_secs.is_some() || default_radius.is_some() {
        let current = profile.config();
        let updated = Config {
            min_session_secs: min_session_secs.unwrap_or(current.min_session_secs),
            default_radius_meters: default_radius.unwrap_or(current.default_radius_meters),
        };
        profile.set_config(updated).context("failed to update config")?;
    }

    let config = profile.config();
    println!("min_session_secs:      {}", config.min_session_secs);
    println!("default_radius_meters: {}", config.default_radius_meters);
    if let Some(path) = profile.config_path() {
        println!("file:                  {}", path.display());
    }
    Ok(())
}
