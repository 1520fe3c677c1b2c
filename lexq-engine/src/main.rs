//! LexQuest command-line client (lexq) - Main entry point
//!
//! Each invocation opens the local store, starts the progress engine, runs
//! one command and shuts the engine down, flushing any pending remote save.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lexq_common::config::LexqConfig;
use lexq_common::events::{ShopItem, SyncStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lexq_engine::catalog::Catalog;
use lexq_engine::identity::LocalIdentityProvider;
use lexq_engine::profile::ProfileSummary;
use lexq_engine::progress::StateDelta;
use lexq_engine::quiz::Quiz;
use lexq_engine::store::{HttpProfileStore, SqliteLocalStore};
use lexq_engine::{Engine, EngineHandle, EngineSettings};

/// Poll interval while waiting for a sync to settle
const SYNC_POLL: Duration = Duration::from_millis(100);

/// Command-line arguments for lexq
#[derive(Parser, Debug)]
#[command(name = "lexq")]
#[command(about = "Gamified vocabulary trainer")]
#[command(version)]
struct Args {
    /// Data folder holding the progress database
    #[arg(short, long, env = "LEXQ_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, env = "LEXQ_CONFIG")]
    config: Option<PathBuf>,

    /// Signed-in user id; progress stays local when omitted
    #[arg(short, long, env = "LEXQ_UID")]
    uid: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show XP, coins, streak and the current word
    Status,
    /// Mark the current word as known or unknown
    Review {
        #[arg(long, conflicts_with = "unknown")]
        known: bool,
        #[arg(long)]
        unknown: bool,
    },
    /// Toggle the current word in favorites
    Favorite,
    /// Remove a word from favorites
    Unfavorite { term: String },
    /// Buy a shop item (streak-shield, double-xp)
    Buy { item: ShopItem },
    /// Take a quiz, or record a finished one with --correct
    Quiz {
        #[arg(long)]
        correct: Option<u32>,
    },
    /// List today's quests
    Quests,
    /// Claim a completed quest
    Claim { id: String },
    /// Show level, rank and weekly activity
    Profile,
    /// Reconcile with the remote profile of a user
    Sync {
        #[arg(long)]
        uid: Option<String>,
    },
    /// Erase all progress
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = LexqConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db_path = config.database_path(args.root_folder.as_deref());
    info!("Database: {}", db_path.display());

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => Catalog::builtin(),
    };
    if catalog.is_empty() {
        bail!("Vocabulary catalog is empty");
    }

    let local = SqliteLocalStore::open(&db_path)
        .await
        .context("Failed to open local store")?;

    let uid = match &args.command {
        Command::Sync { uid: Some(uid) } => Some(uid.clone()),
        _ => args.uid.clone(),
    };
    if let Command::Sync { .. } = &args.command {
        if uid.is_none() {
            bail!("No user id given; pass --uid");
        }
        if config.remote.base_url.is_none() {
            bail!("No remote.base_url configured");
        }
    }
    let identity = match &uid {
        Some(uid) => LocalIdentityProvider::signed_in(uid),
        None => LocalIdentityProvider::signed_out(),
    };

    let mut builder = Engine::builder(catalog, Arc::new(local))
        .identity(Arc::new(identity))
        .settings(EngineSettings::from_config(&config.sync));

    match &config.remote.base_url {
        Some(base_url) => {
            let remote = HttpProfileStore::new(
                base_url,
                &config.remote.app_id,
                config.remote.api_key.clone(),
                Duration::from_secs(config.remote.timeout_secs),
            )
            .context("Failed to build remote store client")?;
            builder = builder.remote(Arc::new(remote));
        }
        None if uid.is_some() => warn!("No remote.base_url configured; progress stays local"),
        None => {}
    }

    let engine = builder.start().await.context("Failed to start engine")?;

    let outcome = run_command(&engine, args.command, &config).await;

    engine.shutdown().await.context("Engine shutdown failed")?;
    outcome
}

async fn run_command(engine: &EngineHandle, command: Command, config: &LexqConfig) -> Result<()> {
    match command {
        Command::Status => print_status(engine).await?,
        Command::Review { known, unknown } => {
            if known == unknown {
                bail!("Pass exactly one of --known or --unknown");
            }
            let delta = engine.record_review(known).await?;
            print_notices(&delta);
            print_status(engine).await?;
        }
        Command::Favorite => print_notices(&engine.toggle_favorite().await?),
        Command::Unfavorite { term } => {
            let delta = engine.remove_favorite(&term).await?;
            if !delta.changed {
                println!("{} is not a favorite", term);
            }
            print_notices(&delta);
        }
        Command::Buy { item } => {
            let delta = engine.purchase(item, item.price()).await?;
            print_notices(&delta);
        }
        Command::Quiz { correct: Some(correct) } => {
            print_notices(&engine.complete_quiz(correct).await?);
        }
        Command::Quiz { correct: None } => run_quiz(engine).await?,
        Command::Quests => {
            let state = engine.snapshot().await?;
            for quest in &state.tasks {
                let mark = if quest.claimed {
                    "claimed"
                } else if quest.is_complete() {
                    "ready"
                } else {
                    ""
                };
                println!(
                    "{:<12} {:<28} {:>3}/{:<3} {:>3} coins  {}",
                    quest.id,
                    quest.description,
                    quest.current_count,
                    quest.target_count,
                    quest.reward_coins,
                    mark
                );
            }
        }
        Command::Claim { id } => print_notices(&engine.claim_quest(&id).await?),
        Command::Profile => print_profile(&engine.profile().await?),
        Command::Sync { .. } => {
            let timeout = Duration::from_secs(config.remote.timeout_secs.saturating_mul(2));
            let status = wait_for_sync(engine, timeout).await?;
            println!("Sync: {}", status);
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("Refusing to reset without --yes");
            }
            engine.reset().await?;
            println!("All progress erased");
        }
    }
    Ok(())
}

/// Wait until the initial remote load and any push it triggered have finished
async fn wait_for_sync(engine: &EngineHandle, timeout: Duration) -> Result<SyncStatus> {
    tokio::time::timeout(timeout, async {
        loop {
            let status = engine.status().await?;
            let settled = matches!(status.sync, SyncStatus::Synced | SyncStatus::SyncFailed);
            if settled && status.identity.is_some() && !status.save_pending {
                return Ok::<_, anyhow::Error>(status.sync);
            }
            tokio::time::sleep(SYNC_POLL).await;
        }
    })
    .await
    .context("Timed out waiting for remote sync")?
}

async fn run_quiz(engine: &EngineHandle) -> Result<()> {
    let mut rng = StdRng::from_entropy();
    let Some(mut quiz) = Quiz::generate(engine.catalog(), &mut rng) else {
        bail!("Catalog has no terms to quiz on");
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(question) = quiz.current().cloned() {
        let (done, total) = quiz.progress();
        println!("\n[{}/{}] {}", done + 1, total, question.prompt);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}) {}", i + 1, option);
        }

        let Some(line) = lines.next_line().await? else {
            println!("Quiz abandoned");
            return Ok(());
        };
        let choice = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| question.options.get(i))
            .map(String::as_str)
            .unwrap_or_else(|| line.trim());

        match quiz.answer(choice) {
            Some(true) => println!("Correct!"),
            Some(false) => println!("Wrong, it was {}", question.answer),
            None => break,
        }
    }

    let delta = engine.complete_quiz(quiz.correct_count()).await?;
    println!(
        "\nScore: {}/{}",
        quiz.correct_count(),
        quiz.progress().1
    );
    print_notices(&delta);
    Ok(())
}

async fn print_status(engine: &EngineHandle) -> Result<()> {
    let state = engine.snapshot().await?;
    println!(
        "Level {}  XP {}  Coins {}  Streak {}",
        state.level(),
        state.xp,
        state.coins,
        state.streak
    );
    if let Some(term) = engine.current_term().await? {
        let star = if state.is_favorite(term.id()) { " *" } else { "" };
        println!("Current: {} = {}{}", term.source, term.target, star);
        if !term.example.is_empty() {
            println!("  {}", term.example);
        }
    }
    let status = engine.status().await?;
    if status.identity.is_some() {
        println!("Sync: {}", status.sync);
    }
    Ok(())
}

fn print_profile(profile: &ProfileSummary) {
    println!("{} (level {})", profile.rank, profile.level);
    println!(
        "XP {} ({} into level)  Coins {}  Streak {}",
        profile.xp, profile.xp_into_level, profile.coins, profile.streak
    );
    println!(
        "Learned {}/{} ({}%)",
        profile.learned_count, profile.total_terms, profile.learned_percent
    );
    println!("Last 7 days:");
    for day in &profile.weekly_activity {
        println!("  {}  {:>4} XP", day.date.format("%a %d %b"), day.xp);
    }
    if !profile.favorites.is_empty() {
        println!("Favorites:");
        for term in &profile.favorites {
            println!("  {} = {}", term.source, term.target);
        }
    }
}

fn print_notices(delta: &StateDelta) {
    for notice in &delta.notices {
        println!("{}", notice);
    }
}
