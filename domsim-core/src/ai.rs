//! Bot players.
//!
//! A bot sees a [`VisibleWorldState`] and a list of commands that pass the
//! cheap precondition checks, and returns the commands it wants to run. The
//! engine still validates everything, so a bot can never corrupt the world.

use crate::config::GameConfig;
use crate::engine::Engine;
use crate::events::{EventCategory, EventKind};
use crate::input::Command;
use crate::state::{Player, PlayerId, TempEffect, WorldState};
use crate::systems::actions::{country_overview, CountryView};
use crate::systems::combat::{PendingPostHit, PostHitChoice};
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use serde::Serialize;

/// Stake used for bot contributions and investments.
const BOT_STAKE: i64 = 1_000;

/// What a player can see when choosing a move.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleWorldState {
    pub round: u32,
    pub own: Player,
    pub others: Vec<CountryView>,
    pub active_event: Option<EventKind>,
}

impl VisibleWorldState {
    pub fn for_player(world: &WorldState, player: PlayerId) -> Option<Self> {
        let own = world.player(player)?.clone();
        Some(Self {
            round: world.round.current_round,
            own,
            others: country_overview(world, player),
            active_event: world.active_event.as_ref().map(|e| e.kind),
        })
    }
}

pub type AvailableCommands = Vec<Command>;

/// Bot decision-making.
pub trait AiPlayer: Send {
    /// Choose commands for this turn. Empty means pass.
    fn decide(
        &mut self,
        visible_state: &VisibleWorldState,
        available_commands: &AvailableCommands,
    ) -> Vec<Command>;
}

/// Picks one available command at random, half of the time.
pub struct RandomAi {
    rng: rand::rngs::StdRng,
}

impl RandomAi {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl AiPlayer for RandomAi {
    fn decide(
        &mut self,
        _visible_state: &VisibleWorldState,
        available_commands: &AvailableCommands,
    ) -> Vec<Command> {
        if available_commands.is_empty() {
            return vec![];
        }
        // A parked loot-or-burn decision is always answered
        let must_answer = available_commands
            .iter()
            .all(|c| matches!(c, Command::PostHit { .. }));

        if must_answer || self.rng.gen::<bool>() {
            if let Some(cmd) = available_commands.choose(&mut self.rng) {
                return vec![cmd.clone()];
            }
        }
        vec![]
    }
}

/// Commands that `player` could plausibly issue right now.
///
/// Only budget, action and limit checks are applied here; the engine does
/// the full validation.
pub fn available_commands(
    world: &WorldState,
    config: &GameConfig,
    player: PlayerId,
    pending: Option<&PendingPostHit>,
) -> AvailableCommands {
    if pending.is_some() {
        return vec![
            Command::PostHit {
                choice: PostHitChoice::Loot,
            },
            Command::PostHit {
                choice: PostHitChoice::Burn,
            },
        ];
    }
    let Some(p) = world.player(player).filter(|p| p.is_active()) else {
        return vec![];
    };
    let event = world.active_event.as_ref().map(|e| e.kind);
    let mut commands = Vec::new();

    if let Some(kind) = event {
        let behaviour = kind.behaviour();
        match (kind, behaviour.category()) {
            (EventKind::TechBreakthrough, _) if p.budget >= BOT_STAKE => {
                commands.push(Command::Invest { amount: BOT_STAKE })
            }
            (EventKind::BlackMarket, _) if behaviour.goal().is_some_and(|price| p.budget >= price) => {
                commands.push(Command::Purchase)
            }
            (_, EventCategory::Crisis) if p.budget >= BOT_STAKE => {
                commands.push(Command::Contribute { amount: BOT_STAKE })
            }
            _ => {}
        }
    }

    if p.actions_left == 0 {
        return commands;
    }

    let blocked = event.is_some_and(|k| k.behaviour().production_blocked());
    let surcharge = if p.has_effect(TempEffect::MilitarySurcharge) {
        2
    } else {
        1
    };
    if !blocked && p.budget >= config.nuke_cost * surcharge {
        commands.push(Command::ProduceNuke);
    }
    if !blocked
        && p.budget >= config.shield_cost * surcharge
        && p.shields < config.max_shields
        && p.shields_built_this_round < config.max_shields_per_round
    {
        commands.push(Command::BuildShield);
    }

    for (name, city) in &p.cities {
        if p.upgrades_this_round < config.max_upgrades_per_round
            && city.level < config.max_city_level
            && p.budget >= config.upgrade_cost(city.level)
        {
            commands.push(Command::UpgradeCity { city: name.clone() });
        }
        if city.level > 0
            && p.social_programs_this_round < config.max_social_programs_per_round
            && p.budget >= config.social_program_cost
        {
            commands.push(Command::SocialProgram { city: name.clone() });
        }
        if let Some(tier) = config.bunker_tier(city.bunker_level + 1) {
            if p.budget >= tier.cost {
                commands.push(Command::BuildBunker { city: name.clone() });
            }
        }
    }

    if p.ready_nukes > 0 {
        for target in world.active_players().filter(|t| t.id != player) {
            let Some(country) = target.country.as_deref() else {
                continue;
            };
            if p.attacked_this_round.contains(country) {
                continue;
            }
            for (name, city) in &target.cities {
                if city.level > 0 {
                    commands.push(Command::Attack {
                        target_country: country.to_string(),
                        city: name.clone(),
                    });
                }
            }
        }
    }
    commands
}

impl Engine {
    pub fn visible_state(&self, player: PlayerId) -> Option<VisibleWorldState> {
        let world = self.snapshot();
        VisibleWorldState::for_player(&world, player)
    }

    pub fn available_commands(&self, player: PlayerId) -> AvailableCommands {
        let world = self.snapshot();
        let pending = self.pending_post_hit(player);
        available_commands(&world, self.config(), player, pending.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldStateBuilder;

    fn visible(world: &WorldState) -> VisibleWorldState {
        VisibleWorldState::for_player(world, 1).unwrap()
    }

    #[test]
    fn random_ai_smoke_test() {
        let world = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port"])
            .build();
        let mut ai = RandomAi::new(12345);
        assert!(ai.decide(&visible(&world), &vec![]).is_empty());

        let commands = available_commands(&world, &GameConfig::default(), 1, None);
        for _ in 0..20 {
            for cmd in ai.decide(&visible(&world), &commands) {
                assert!(commands.contains(&cmd));
            }
        }
    }

    #[test]
    fn test_pending_choice_is_always_answered() {
        let world = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port"])
            .build();
        let pending = PendingPostHit {
            attacker: 1,
            target: 2,
            target_country: "Borealia".into(),
            city: "Capital".into(),
            round: 1,
        };
        let commands = available_commands(&world, &GameConfig::default(), 1, Some(&pending));
        assert_eq!(commands.len(), 2);

        let mut ai = RandomAi::new(7);
        for _ in 0..10 {
            assert_eq!(ai.decide(&visible(&world), &commands).len(), 1);
        }
    }

    #[test]
    fn test_available_commands_respect_state() {
        let config = GameConfig::default();
        let world = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port"])
            .with_player(2, "Borealia", &["Capital", "Mill"])
            .with_nukes(1, 1, 0)
            .with_level(2, "Mill", 0)
            .build();
        let commands = available_commands(&world, &config, 1, None);
        assert!(commands.contains(&Command::ProduceNuke));
        assert!(commands.contains(&Command::Attack {
            target_country: "Borealia".into(),
            city: "Capital".into()
        }));
        assert!(!commands.contains(&Command::Attack {
            target_country: "Borealia".into(),
            city: "Mill".into()
        }));

        let broke = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port"])
            .with_budget(1, 0)
            .with_event(EventKind::EnergyCrisis, 3)
            .build();
        assert!(available_commands(&broke, &config, 1, None).is_empty());

        let idle = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port"])
            .with_actions(1, 0)
            .with_event(EventKind::Pandemic, 3)
            .build();
        assert_eq!(
            available_commands(&idle, &config, 1, None),
            vec![Command::Contribute { amount: BOT_STAKE }]
        );
    }
}
