use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use clap::Parser;
use std::path::PathBuf;

use playhouse::config::LedgerConfig;
use playhouse::ledger::{LedgerStore, SystemClock};
use playhouse::notifications;
use playhouse::shared::*;
use playhouse::stats::StatsTracker;
use playhouse::storage::{platform_store, FileStore, KvStore};
use playhouse::PlayhousePlugin;

/// Record a finished Playhouse game session and print the player's balances.
#[derive(Parser)]
#[command(about, long_about = None, version)]
struct Args {
    /// Catalog id of the game that was played (omit to only print the summary)
    game: Option<String>,

    /// The session was won
    #[arg(short, long, default_value_t = false)]
    win: bool,

    /// Final score of the session
    #[arg(short, long)]
    score: Option<i64>,

    /// Difficulty the session was played at
    #[arg(value_enum, short = 'f', long, default_value_t = Difficulty::Medium)]
    difficulty: Difficulty,

    /// Performance metric reported by the game, as key=value (repeatable)
    #[arg(short, long = "metric", value_parser = parse_metric)]
    metrics: Vec<(String, f64)>,

    /// Directory holding the persisted ledger
    #[arg(long)]
    saves: Option<PathBuf>,

    /// RON file with ledger settings
    #[arg(long, default_value = "playhouse.ron")]
    config: PathBuf,

    /// List the game catalog and exit
    #[arg(long, default_value_t = false)]
    ls: bool,

    /// Enable debug messages
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn parse_metric(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let value: f64 = value
        .parse()
        .map_err(|e| format!("metric '{}': {}", key, e))?;
    Ok((key.to_string(), value))
}

fn main() {
    let args = Args::parse();

    if args.ls {
        for entry in GameCatalog::playhouse().entries {
            println!("{:<16} {:?}  {}", entry.id, entry.category, entry.title);
        }
        return;
    }

    let backend: Box<dyn KvStore> = match &args.saves {
        Some(dir) => Box::new(FileStore::new(dir)),
        None => platform_store(),
    };
    let config = LedgerConfig::load_or_default(&args.config);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin {
            level: if args.debug { Level::DEBUG } else { Level::INFO },
            ..default()
        })
        .insert_resource(LedgerStore::new(backend, Box::new(SystemClock), config))
        .insert_resource(StatsTracker::new(GameCatalog::playhouse()))
        .add_plugins(PlayhousePlugin);

    if let Some(game_id) = args.game {
        let metrics = PerformanceMetrics(args.metrics.into_iter().collect());
        let world = app.world_mut();
        world.send_event(GameCompletedEvent {
            result: GameResult {
                game_id: game_id.clone(),
                did_win: args.win,
                score: args.score,
            },
        });
        world.send_event(SessionRewardEvent {
            request: EstimateRequest {
                game_id,
                difficulty: args.difficulty,
                did_win: args.win,
                metrics,
            },
        });
        app.update();
    }

    app.world_mut().send_event(AchievementCheckEvent);
    app.update();

    let world = app.world();
    let store = world.resource::<LedgerStore>();
    let tracker = world.resource::<StatsTracker>();
    let balance = store.balance();
    let tally = store.daily_tally();

    println!("S-Points: {}", balance.points);
    println!("S-Coins:  {} ({} of {} earned today)", balance.coins, tally.total, store.config().daily_coin_cap);
    println!();
    for stat in tracker.game_stats(store).iter().filter(|s| s.games_played > 0) {
        println!(
            "{:<16} played {:>3}  wins {:>3}  best {}",
            stat.game_id, stat.games_played, stat.wins, stat.high_score
        );
    }
    println!();
    for event in store.reward_history().iter().take(5) {
        println!("{}  {:+} pts  {:+} coins  {}", event.timestamp, event.points, event.coins, event.description);
    }
    for n in notifications::list(store).iter().filter(|n| !n.is_read) {
        println!("* {}", n.message);
    }
}
