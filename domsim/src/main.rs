use anyhow::Result;
use clap::Parser;
use domsim_core::{AdvanceOutcome, AiPlayer, Engine, PlayerId, RandomAi};
use std::path::PathBuf;

mod setup;

/// Upper bound on decisions per bot per round.
const MAX_DECISIONS: usize = 8;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of bot players
    #[arg(short, long, default_value_t = 4)]
    players: usize,

    /// Number of rounds to play
    #[arg(short, long, default_value_t = 10)]
    rounds: u32,

    /// Seed for the engine and the bots
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Path to a JSON game config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final world as JSON
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Let one bot act until it passes or runs out of decisions.
fn play_turn(engine: &Engine, id: PlayerId, bot: &mut RandomAi) {
    for _ in 0..MAX_DECISIONS {
        let Some(visible) = engine.visible_state(id) else {
            return;
        };
        let available = engine.available_commands(id);
        let decisions = bot.decide(&visible, &available);
        if decisions.is_empty() {
            break;
        }
        for command in decisions {
            match engine.execute(id, &command) {
                Ok(outcome) => log::debug!("Bot {} {:?} -> {:?}", id, command, outcome),
                Err(e) => log::debug!("Bot {} {:?} rejected: {}", id, command, e),
            }
        }
    }
    if engine.cancel_post_hit_choice(id) {
        log::warn!("Bot {} left a post-hit decision open", id);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    log::info!("Starting domsim...");

    let config = setup::load_config(args.config.as_deref())?;
    let (engine, mut bots) = setup::seed_game(config, args.players, args.seed)?;
    engine.start_game()?;

    // Game Loop
    for _ in 0..args.rounds {
        for (id, bot) in bots.iter_mut() {
            play_turn(&engine, *id, bot);
        }

        match engine.advance_round() {
            AdvanceOutcome::Advanced(report) => {
                if let Some(digest) = &report.digest {
                    log::info!("{}", digest);
                }
                log::info!(
                    "Round {} | event started: {:?} | event failed: {:?} | income paid: {}",
                    report.round,
                    report.event_started,
                    report.event_failed,
                    report.incomes.values().map(|b| b.total).sum::<i64>()
                );
            }
            AdvanceOutcome::Busy => log::warn!("Round advance skipped: busy"),
        }
    }

    let world = engine.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&world)?);
    } else {
        for p in world.players.values() {
            println!(
                "{:<24} budget {:>8}  nukes {:>2}  shields {:>2}  {}",
                p.display_name(),
                p.budget,
                p.ready_nukes,
                p.shields,
                if p.eliminated { "eliminated" } else { "active" }
            );
        }
        println!("Checksum: {:016x}", world.checksum());
    }

    log::info!(
        "Simulation finished at round {}",
        world.round.current_round
    );
    Ok(())
}
