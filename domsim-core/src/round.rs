use crate::config::GameConfig;
use crate::events::{self, EventContext, EventKind};
use crate::notify::Outbox;
use crate::rng::RandomSource;
use crate::state::{PlayerId, WorldState};
use crate::systems::digest::round_digest;
use crate::systems::economy::{player_income, IncomeBreakdown};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};
use tracing::instrument;

/// Summary of one round advance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundReport {
    /// The round that just started.
    pub round: u32,
    pub event_failed: Option<EventKind>,
    pub event_started: Option<EventKind>,
    pub incomes: BTreeMap<PlayerId, IncomeBreakdown>,
    /// Headlines of the round that just ended.
    pub digest: Option<String>,
}

/// Advance the world to the next round.
///
/// Order matters: cooldowns tick before the active event, and temp effects
/// tick before income so an expiring recession no longer applies.
#[instrument(skip_all, name = "advance_round")]
pub fn advance(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
    outbox: &mut Outbox,
    now: SystemTime,
) -> RoundReport {
    // 1. Cooldowns
    world.cooldowns.retain(|_, left| {
        *left = left.saturating_sub(1);
        *left > 0
    });

    // 2-3. Active event ticks, or maybe a new one starts
    let mut event_failed = None;
    let mut event_started = None;
    {
        let mut ctx = EventContext {
            world: &mut *world,
            config,
            rng: &mut *rng,
            outbox: &mut *outbox,
        };
        if ctx.world.active_event.is_some() {
            event_failed = events::tick_active(&mut ctx);
            if let Some(kind) = event_failed {
                ctx.outbox.push(
                    config.admin_id,
                    format!("(admin) Event '{kind}' failed when time ran out."),
                );
            }
        } else if ctx.rng.chance(config.event_chance) {
            if let Some(kind) = events::pick_event(&*ctx.world, &mut *ctx.rng) {
                events::start(&mut ctx, kind);
                ctx.outbox.push(
                    config.admin_id,
                    format!("(admin) New event started: {kind}."),
                );
                event_started = Some(kind);
            }
        }
    }

    // 4. Close the round log
    let digest = round_digest(world);
    world.round_log.clear();

    // 5. Clock
    world.round.current_round += 1;
    let round = world.round.current_round;
    world.round.round_end = Some(now + Duration::from_secs(config.round_duration_secs));
    world.round.reset_flags();

    // 6. Per-player reset and income
    let mut incomes = BTreeMap::new();
    for id in world.active_ids() {
        let Some(p) = world.player_mut(id) else {
            continue;
        };
        p.ready_nukes += p.pending_nukes;
        p.pending_nukes = 0;
        p.actions_left = config.actions_for_round(round) + p.bonus_actions_next_round;
        p.bonus_actions_next_round = 0;
        p.reset_round_counters();

        let mut expired = Vec::new();
        p.temp_effects.retain(|effect, left| {
            *left = left.saturating_sub(1);
            if *left == 0 {
                expired.push(*effect);
            }
            *left > 0
        });
        for effect in expired {
            outbox.push(
                id,
                format!("The '{}' effect in your country has ended.", effect.label()),
            );
        }

        let Some(p) = world.player(id) else {
            continue;
        };
        let breakdown = player_income(world, p);
        let Some(p) = world.player_mut(id) else {
            continue;
        };
        p.budget += breakdown.total;

        let mut text = format!(
            "Round {round} has begun!\n\n{}\n\nYour budget: ${}",
            breakdown.describe(),
            p.budget
        );
        if round == config.bonus_round {
            text.push_str("\n\nBonus: you get an extra action this round!");
        }
        outbox.push_markdown(id, text);
        incomes.insert(id, breakdown);
    }

    log::info!(
        "Round {} started ({} active players, event: {:?})",
        round,
        incomes.len(),
        world.active_event.as_ref().map(|e| e.kind)
    );

    RoundReport {
        round,
        event_failed,
        event_started,
        incomes,
        digest,
    }
}

/// Timer thresholds in seconds before round end.
const THRESHOLDS: [u64; 4] = [300, 180, 60, 0];

/// Fire every round-timer notice whose threshold has passed and was not sent
/// yet. Returns the thresholds fired. Never advances the round.
pub fn poll_timer(
    world: &mut WorldState,
    config: &GameConfig,
    outbox: &mut Outbox,
    now: SystemTime,
) -> Vec<u64> {
    let Some(end) = world.round.round_end else {
        return Vec::new();
    };
    let left = end.duration_since(now).map(|d| d.as_secs_f64()).unwrap_or(0.0);

    let mut fired = Vec::new();
    for threshold in THRESHOLDS {
        let flag = match threshold {
            300 => &mut world.round.notified_5min,
            180 => &mut world.round.notified_3min,
            60 => &mut world.round.notified_1min,
            _ => &mut world.round.notified_end,
        };
        if *flag || left > threshold as f64 {
            continue;
        }
        *flag = true;
        fired.push(threshold);
    }

    let recipients: Vec<PlayerId> = world
        .active_ids()
        .into_iter()
        .filter(|&id| id != config.admin_id)
        .collect();
    for &threshold in &fired {
        let text = if threshold > 0 {
            format!("{} minutes left until the end of the round.", threshold / 60)
        } else {
            "Time is up for this round!".to_string()
        };
        outbox.broadcast(recipients.iter().copied(), &text);
    }
    if fired.contains(&0) {
        world.round.round_end = None;
    }
    fired
}
