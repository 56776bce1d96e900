use anyhow::{bail, Context, Result};
use domsim_core::{Engine, GameConfig, LogNotifier, PlayerId, Ports, RandomAi, SeededRng, SystemClock};
use std::path::Path;
use std::sync::Arc;

/// Load the config from `path`, or fall back to the built-in roster.
pub fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let config = match path {
        Some(path) => {
            log::info!("Loading config from {:?}", path);
            GameConfig::load(path).with_context(|| format!("Failed to load config {:?}", path))?
        }
        None => GameConfig::default(),
    };
    config.validate().context("Invalid config")?;
    Ok(config)
}

/// Create an engine with `players` bots, each governing its own country.
///
/// Bot ids start at 1 so they never collide with the administrator.
pub fn seed_game(
    config: GameConfig,
    players: usize,
    seed: u64,
) -> Result<(Engine, Vec<(PlayerId, RandomAi)>)> {
    if players > config.countries.len() {
        bail!(
            "Requested {} players but only {} countries are configured",
            players,
            config.countries.len()
        );
    }
    let ports = Ports {
        notifier: Arc::new(LogNotifier),
        clock: Arc::new(SystemClock),
        rng: Box::new(SeededRng::new(seed)),
    };
    let engine = Engine::new(config, ports);

    let mut bots = Vec::with_capacity(players);
    for (slot, country) in engine
        .available_countries()
        .into_iter()
        .take(players)
        .enumerate()
    {
        let id = engine.config().admin_id + 1 + slot as PlayerId;
        engine.register(id);
        engine.assign_country(id, &country)?;
        engine.set_nickname(id, &format!("Bot {}", slot + 1))?;
        log::debug!("Bot {} governs {}", id, country);
        bots.push((id, RandomAi::new(seed.wrapping_add(id))));
    }
    log::info!("Seeded {} bot players", bots.len());
    Ok((engine, bots))
}
