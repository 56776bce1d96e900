//! Opportunity events: the first nation to pay wins.

use super::{
    validate_payment, EventCategory, EventContext, EventKind, GlobalEvent, Interaction,
    InteractionOutcome,
};
use crate::error::ActionError;
use crate::state::PlayerId;

const TECH_GOAL: i64 = 10_000;
const TECH_INCOME_BONUS: f64 = 0.15;
const BLACK_MARKET_PRICE: i64 = 7_500;
const BLACK_MARKET_NUKES: u32 = 2;

pub struct TechBreakthrough;

impl GlobalEvent for TechBreakthrough {
    fn kind(&self) -> EventKind {
        EventKind::TechBreakthrough
    }
    fn name(&self) -> &'static str {
        "Tech Breakthrough"
    }
    fn category(&self) -> EventCategory {
        EventCategory::Opportunity
    }
    fn duration(&self) -> i32 {
        3
    }
    fn goal(&self) -> Option<i64> {
        Some(TECH_GOAL)
    }

    fn start_message(&self) -> String {
        format!(
            "CHANCE OF THE CENTURY! Fusion power is within reach. The first nation to \
             invest ${TECH_GOAL} in total gets a permanent +15% income bonus."
        )
    }

    fn handle_interaction(
        &self,
        ctx: &mut EventContext<'_>,
        player: PlayerId,
        interaction: Interaction,
        amount: i64,
    ) -> Result<InteractionOutcome, ActionError> {
        if interaction != Interaction::Invest {
            return Err(ActionError::WrongInteraction {
                kind: self.kind(),
                interaction: interaction.label(),
            });
        }
        validate_payment(ctx.world, player, amount)?;

        let event = ctx
            .world
            .active_event
            .as_mut()
            .ok_or(ActionError::NoActiveEvent)?;
        let total = event.investors.entry(player).or_insert(0);
        *total += amount;
        let total = *total;
        if let Some(p) = ctx.world.player_mut(player) {
            p.budget -= amount;
        }

        if total >= TECH_GOAL {
            Ok(InteractionOutcome::Completed {
                winner: Some(player),
            })
        } else {
            Ok(InteractionOutcome::Progress {
                progress: total,
                goal: TECH_GOAL,
            })
        }
    }

    fn on_success(&self, ctx: &mut EventContext<'_>, winner: Option<PlayerId>) {
        let Some(winner) = winner else {
            return;
        };
        let Some(winner) = ctx.world.player_mut(winner) else {
            return;
        };
        winner.income_modifier += TECH_INCOME_BONUS;
        let name = winner.display_name();
        ctx.broadcast(&format!(
            "{} COMPLETE! {name} reached the investment goal first and earns a permanent income bonus.",
            self.name()
        ));
    }

    fn on_fail(&self, ctx: &mut EventContext<'_>) {
        ctx.broadcast(
            "MISSED OPPORTUNITY! Nobody fully funded the project. All investments are lost.",
        );
    }
}

pub struct BlackMarket;

impl GlobalEvent for BlackMarket {
    fn kind(&self) -> EventKind {
        EventKind::BlackMarket
    }
    fn name(&self) -> &'static str {
        "Black Market"
    }
    fn category(&self) -> EventCategory {
        EventCategory::Opportunity
    }
    fn duration(&self) -> i32 {
        2
    }
    fn goal(&self) -> Option<i64> {
        Some(BLACK_MARKET_PRICE)
    }

    fn start_message(&self) -> String {
        format!(
            "BLACK MARKET! An arms dealer surfaced in neutral waters. The first buyer to \
             pay ${BLACK_MARKET_PRICE} immediately receives {BLACK_MARKET_NUKES} ready nukes."
        )
    }

    fn handle_interaction(
        &self,
        ctx: &mut EventContext<'_>,
        player: PlayerId,
        interaction: Interaction,
        _amount: i64,
    ) -> Result<InteractionOutcome, ActionError> {
        if interaction != Interaction::Purchase {
            return Err(ActionError::WrongInteraction {
                kind: self.kind(),
                interaction: interaction.label(),
            });
        }
        validate_payment(ctx.world, player, BLACK_MARKET_PRICE)?;
        if let Some(p) = ctx.world.player_mut(player) {
            p.budget -= BLACK_MARKET_PRICE;
        }
        Ok(InteractionOutcome::Completed {
            winner: Some(player),
        })
    }

    fn on_success(&self, ctx: &mut EventContext<'_>, winner: Option<PlayerId>) {
        let Some(winner) = winner else {
            return;
        };
        let Some(winner) = ctx.world.player_mut(winner) else {
            return;
        };
        winner.ready_nukes += BLACK_MARKET_NUKES;
        let name = winner.display_name();
        ctx.broadcast(&format!(
            "DEAL DONE! {name} closed a black market contract and received {BLACK_MARKET_NUKES} ready warheads."
        ));
    }

    fn on_fail(&self, ctx: &mut EventContext<'_>) {
        ctx.broadcast("The arms dealer left without a buyer. The opportunity is gone.");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::GameConfig;
    use crate::error::ActionError;
    use crate::events::{interact, EventContext, EventKind, Interaction, InteractionOutcome};
    use crate::notify::Outbox;
    use crate::state::WorldState;
    use crate::testing::{ScriptedRng, WorldStateBuilder};

    fn pay(
        world: &mut WorldState,
        player: u64,
        interaction: Interaction,
        amount: i64,
    ) -> Result<InteractionOutcome, ActionError> {
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new();
        let mut outbox = Outbox::new();
        let mut ctx = EventContext {
            world,
            config: &config,
            rng: &mut rng,
            outbox: &mut outbox,
        };
        interact(&mut ctx, player, interaction, amount)
    }

    fn market(kind: EventKind) -> WorldState {
        WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["A"])
            .with_player(2, "Borealia", &["B"])
            .with_budget(1, 12_000)
            .with_budget(2, 12_000)
            .with_event(kind, 3)
            .build()
    }

    #[test]
    fn test_investments_are_per_player() {
        let mut world = market(EventKind::TechBreakthrough);
        assert!(matches!(
            pay(&mut world, 1, Interaction::Invest, 6_000),
            Ok(InteractionOutcome::Progress { progress: 6_000, .. })
        ));
        // Player 2's money does not count towards player 1's goal
        assert!(matches!(
            pay(&mut world, 2, Interaction::Invest, 6_000),
            Ok(InteractionOutcome::Progress { progress: 6_000, .. })
        ));
        assert_eq!(
            pay(&mut world, 1, Interaction::Invest, 4_000),
            Ok(InteractionOutcome::Completed { winner: Some(1) })
        );

        let p1 = world.player(1).unwrap();
        assert!((p1.income_modifier - 1.15).abs() < 1e-9);
        assert_eq!(p1.budget, 2_000);
        assert!((world.player(2).unwrap().income_modifier - 1.0).abs() < 1e-9);
        assert!(world.active_event.is_none());
    }

    #[test]
    fn test_black_market_single_shot() {
        let mut world = market(EventKind::BlackMarket);
        assert_eq!(
            pay(&mut world, 2, Interaction::Purchase, 0),
            Ok(InteractionOutcome::Completed { winner: Some(2) })
        );
        let buyer = world.player(2).unwrap();
        assert_eq!(buyer.budget, 4_500);
        assert_eq!(buyer.ready_nukes, 2);
        assert!(world.active_event.is_none());

        assert_eq!(
            pay(&mut world, 1, Interaction::Purchase, 0),
            Err(ActionError::NoActiveEvent)
        );
    }

    #[test]
    fn test_black_market_requires_price() {
        let mut world = market(EventKind::BlackMarket);
        world.player_mut(1).unwrap().budget = 7_499;
        let before = world.clone();
        assert!(matches!(
            pay(&mut world, 1, Interaction::Purchase, 0),
            Err(ActionError::InsufficientFunds {
                required: 7_500,
                available: 7_499
            })
        ));
        assert_eq!(world, before);
    }
}
