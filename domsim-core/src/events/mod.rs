//! Global events.
//!
//! At most one event runs at a time. Each kind is a unit struct implementing
//! [`GlobalEvent`]; [`EventKind::behaviour`] maps the serializable tag stored
//! in [`ActiveEvent`] to its static implementation.
//!
//! # Lifecycle
//!
//! ```text
//! start ──▶ active ──┬── interaction reaches goal ──▶ on_success ──▶ cleared
//!                    └── rounds_left hits 0 ───────▶ on_fail ─────▶ cleared + cooldown
//! ```
//!
//! Starting an event puts its kind on cooldown, so a kind never runs twice
//! within `event_cooldown_rounds` rounds.

pub mod crisis;
pub mod opportunity;
pub mod selection;
pub mod shift;

use crate::config::GameConfig;
use crate::error::ActionError;
use crate::notify::Outbox;
use crate::rng::RandomSource;
use crate::state::{ActiveEvent, PlayerId, RoundEvent, WorldState};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use selection::{analyze_world, event_weight, pick_event, WorldSignals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Pandemic,
    TechBreakthrough,
    SolarFlare,
    EnergyCrisis,
    BlackMarket,
    GlobalEspionage,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Pandemic,
        EventKind::TechBreakthrough,
        EventKind::SolarFlare,
        EventKind::EnergyCrisis,
        EventKind::BlackMarket,
        EventKind::GlobalEspionage,
    ];

    pub fn behaviour(self) -> &'static dyn GlobalEvent {
        match self {
            EventKind::Pandemic => &crisis::Pandemic,
            EventKind::EnergyCrisis => &crisis::EnergyCrisis,
            EventKind::TechBreakthrough => &opportunity::TechBreakthrough,
            EventKind::BlackMarket => &opportunity::BlackMarket,
            EventKind::SolarFlare => &shift::SolarFlare,
            EventKind::GlobalEspionage => &shift::GlobalEspionage,
        }
    }

    pub fn name(self) -> &'static str {
        self.behaviour().name()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        EventKind::ALL
            .into_iter()
            .find(|kind| {
                serde_json::to_value(kind)
                    .ok()
                    .and_then(|v| v.as_str().map(|tag| tag == wanted))
                    .unwrap_or(false)
            })
            .ok_or_else(|| format!("unknown event kind '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Crisis,
    Opportunity,
    Shift,
}

/// How a player engages with the active event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Pay into the shared fund of a crisis.
    Contribute,
    /// Pay towards a personal investment goal.
    Invest,
    /// Buy a single-shot offer.
    Purchase,
}

impl Interaction {
    pub fn label(self) -> &'static str {
        match self {
            Interaction::Contribute => "contributions",
            Interaction::Invest => "investments",
            Interaction::Purchase => "purchases",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionOutcome {
    /// Payment accepted, goal not reached yet.
    Progress { progress: i64, goal: i64 },
    /// The goal was reached and the event ended in success.
    Completed { winner: Option<PlayerId> },
}

/// Mutable view handed to event hooks while the world lock is held.
pub struct EventContext<'a> {
    pub world: &'a mut WorldState,
    pub config: &'a GameConfig,
    pub rng: &'a mut dyn RandomSource,
    pub outbox: &'a mut Outbox,
}

impl EventContext<'_> {
    pub fn broadcast(&mut self, text: &str) {
        let ids = self.world.active_ids();
        for id in ids {
            self.outbox.push_markdown(id, text);
        }
    }
}

/// Behaviour of one event kind.
pub trait GlobalEvent: Send + Sync {
    fn kind(&self) -> EventKind;
    fn name(&self) -> &'static str;
    fn category(&self) -> EventCategory;
    /// Rounds the event stays active.
    fn duration(&self) -> i32;

    /// Fund target, investment target or price.
    fn goal(&self) -> Option<i64> {
        None
    }
    /// Additive global income modifier while active.
    fn income_modifier(&self) -> f64 {
        0.0
    }
    fn shields_ignored(&self) -> bool {
        false
    }
    fn production_blocked(&self) -> bool {
        false
    }
    fn budgets_visible(&self) -> bool {
        false
    }

    fn start_message(&self) -> String;

    fn apply_start_effect(&self, _ctx: &mut EventContext<'_>) {}

    /// Validate and apply one payment. Must not mutate on `Err`.
    fn handle_interaction(
        &self,
        _ctx: &mut EventContext<'_>,
        _player: PlayerId,
        interaction: Interaction,
        _amount: i64,
    ) -> Result<InteractionOutcome, ActionError> {
        Err(ActionError::WrongInteraction {
            kind: self.kind(),
            interaction: interaction.label(),
        })
    }

    fn on_success(&self, _ctx: &mut EventContext<'_>, _winner: Option<PlayerId>) {}

    fn on_fail(&self, _ctx: &mut EventContext<'_>) {}
}

/// Checks that `player` is active and can pay `amount`.
pub(crate) fn validate_payment(
    world: &WorldState,
    player: PlayerId,
    amount: i64,
) -> Result<(), ActionError> {
    let p = world
        .player(player)
        .ok_or(ActionError::UnknownPlayer(player))?;
    if !p.is_active() {
        return Err(ActionError::NotInGame(player));
    }
    if amount <= 0 {
        return Err(ActionError::InvalidAmount(amount));
    }
    if p.budget < amount {
        return Err(ActionError::InsufficientFunds {
            required: amount,
            available: p.budget,
        });
    }
    Ok(())
}

/// Install `kind` as the active event, put it on cooldown and announce it.
pub fn start(ctx: &mut EventContext<'_>, kind: EventKind) {
    let event = kind.behaviour();
    ctx.world.active_event = Some(ActiveEvent::new(kind, event.duration()));
    ctx.world
        .cooldowns
        .insert(kind, ctx.config.event_cooldown_rounds);
    event.apply_start_effect(ctx);
    let message = event.start_message();
    ctx.broadcast(&message);
    ctx.world.log(RoundEvent::EventStarted { kind });
    log::info!("Global event started: {}", kind);
}

/// Tick the active event at round advance. Returns the kind if it failed.
pub fn tick_active(ctx: &mut EventContext<'_>) -> Option<EventKind> {
    let active = ctx.world.active_event.as_mut()?;
    active.rounds_left -= 1;
    if active.rounds_left > 0 {
        return None;
    }
    let kind = active.kind;
    kind.behaviour().on_fail(ctx);
    ctx.world.active_event = None;
    ctx.world
        .cooldowns
        .insert(kind, ctx.config.event_cooldown_rounds);
    ctx.world.log(RoundEvent::EventFailed { kind });
    log::info!("Global event expired: {}", kind);
    Some(kind)
}

/// Route a player payment to the active event.
pub fn interact(
    ctx: &mut EventContext<'_>,
    player: PlayerId,
    interaction: Interaction,
    amount: i64,
) -> Result<InteractionOutcome, ActionError> {
    let kind = ctx
        .world
        .active_event
        .as_ref()
        .map(|e| e.kind)
        .ok_or(ActionError::NoActiveEvent)?;
    let event = kind.behaviour();
    let outcome = event.handle_interaction(ctx, player, interaction, amount)?;
    if let InteractionOutcome::Completed { winner } = outcome {
        event.on_success(ctx, winner);
        ctx.world.active_event = None;
        ctx.world.log(RoundEvent::EventSucceeded { kind });
        log::info!("Global event succeeded: {} (winner {:?})", kind, winner);
    }
    Ok(outcome)
}

/// Shared-fund contribution used by crisis events.
pub(crate) fn contribute_to_fund(
    ctx: &mut EventContext<'_>,
    player: PlayerId,
    amount: i64,
    goal: i64,
) -> Result<InteractionOutcome, ActionError> {
    validate_payment(ctx.world, player, amount)?;
    let event = ctx
        .world
        .active_event
        .as_mut()
        .ok_or(ActionError::NoActiveEvent)?;
    event.progress += amount;
    let progress = event.progress;
    if let Some(p) = ctx.world.player_mut(player) {
        p.budget -= amount;
    }
    if progress >= goal {
        Ok(InteractionOutcome::Completed { winner: None })
    } else {
        Ok(InteractionOutcome::Progress { progress, goal })
    }
}
