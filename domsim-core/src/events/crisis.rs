//! Crisis events: every nation pays into one shared fund.

use super::{
    contribute_to_fund, EventCategory, EventContext, EventKind, GlobalEvent, Interaction,
    InteractionOutcome,
};
use crate::error::ActionError;
use crate::state::{PlayerId, TempEffect};

const PANDEMIC_GOAL: i64 = 20_000;
const ENERGY_CRISIS_GOAL: i64 = 15_000;
/// Rounds a failure penalty lingers. Ticked once in the same advance that
/// applies it, so it bites for exactly the following round.
const FAILURE_EFFECT_ROUNDS: u32 = 2;

fn fund_only(
    kind: EventKind,
    ctx: &mut EventContext<'_>,
    player: PlayerId,
    interaction: Interaction,
    amount: i64,
    goal: i64,
) -> Result<InteractionOutcome, ActionError> {
    match interaction {
        Interaction::Contribute => contribute_to_fund(ctx, player, amount, goal),
        other => Err(ActionError::WrongInteraction {
            kind,
            interaction: other.label(),
        }),
    }
}

pub struct Pandemic;

impl GlobalEvent for Pandemic {
    fn kind(&self) -> EventKind {
        EventKind::Pandemic
    }
    fn name(&self) -> &'static str {
        "Global Pandemic"
    }
    fn category(&self) -> EventCategory {
        EventCategory::Crisis
    }
    fn duration(&self) -> i32 {
        3
    }
    fn goal(&self) -> Option<i64> {
        Some(PANDEMIC_GOAL)
    }
    fn income_modifier(&self) -> f64 {
        -0.20
    }

    fn start_message(&self) -> String {
        format!(
            "GLOBAL THREAT! A pandemic has broken out. Income of every city is cut by 20% \
             until a health fund of ${PANDEMIC_GOAL} is raised."
        )
    }

    fn handle_interaction(
        &self,
        ctx: &mut EventContext<'_>,
        player: PlayerId,
        interaction: Interaction,
        amount: i64,
    ) -> Result<InteractionOutcome, ActionError> {
        fund_only(self.kind(), ctx, player, interaction, amount, PANDEMIC_GOAL)
    }

    fn on_success(&self, ctx: &mut EventContext<'_>, _winner: Option<PlayerId>) {
        let bonus = ctx.rng.range_inclusive(3, 5) as i32;
        for p in ctx.world.players.values_mut().filter(|p| p.is_active()) {
            for city in p.cities.values_mut() {
                city.adjust_qol(bonus);
            }
        }
        ctx.broadcast(&format!(
            "VICTORY OVER THE DISEASE! The fund is complete and a vaccine is out. \
             QoL in every city rises by {bonus}."
        ));
    }

    fn on_fail(&self, ctx: &mut EventContext<'_>) {
        for p in ctx.world.players.values_mut().filter(|p| p.is_active()) {
            p.temp_effects
                .insert(TempEffect::Recession, FAILURE_EFFECT_ROUNDS);
        }
        ctx.broadcast(
            "COLLAPSE! The pandemic is out of control. The world economy enters a \
             recession (-50% income).",
        );
    }
}

pub struct EnergyCrisis;

impl GlobalEvent for EnergyCrisis {
    fn kind(&self) -> EventKind {
        EventKind::EnergyCrisis
    }
    fn name(&self) -> &'static str {
        "Energy Crisis"
    }
    fn category(&self) -> EventCategory {
        EventCategory::Crisis
    }
    fn duration(&self) -> i32 {
        3
    }
    fn goal(&self) -> Option<i64> {
        Some(ENERGY_CRISIS_GOAL)
    }
    fn production_blocked(&self) -> bool {
        true
    }

    fn start_message(&self) -> String {
        format!(
            "ENERGY COLLAPSE! The power grid is down. Shields and nukes cannot be \
             produced until ${ENERGY_CRISIS_GOAL} is raised for repairs."
        )
    }

    fn handle_interaction(
        &self,
        ctx: &mut EventContext<'_>,
        player: PlayerId,
        interaction: Interaction,
        amount: i64,
    ) -> Result<InteractionOutcome, ActionError> {
        fund_only(
            self.kind(),
            ctx,
            player,
            interaction,
            amount,
            ENERGY_CRISIS_GOAL,
        )
    }

    fn on_success(&self, ctx: &mut EventContext<'_>, _winner: Option<PlayerId>) {
        for p in ctx.world.players.values_mut().filter(|p| p.is_active()) {
            p.bonus_actions_next_round += 1;
        }
        ctx.broadcast(
            "GRID RESTORED! Industry is back online. Every nation gets +1 action next round.",
        );
    }

    fn on_fail(&self, ctx: &mut EventContext<'_>) {
        for p in ctx.world.players.values_mut().filter(|p| p.is_active()) {
            p.temp_effects
                .insert(TempEffect::MilitarySurcharge, FAILURE_EFFECT_ROUNDS);
        }
        ctx.broadcast(
            "INDUSTRIAL COLLAPSE! The grid could not be saved. Shields and nukes cost \
             double next round.",
        );
    }
}
