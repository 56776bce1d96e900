use crate::engine::Engine;
use crate::error::ActionError;
use crate::events::InteractionOutcome;
use crate::state::PlayerId;
use crate::systems::actions::{ActionOutcome, CountryView, Statistics};
use crate::systems::combat::{AttackOutcome, PostHitChoice, PostHitOutcome};
use crate::systems::diplomacy::NegotiationReply;
use crate::systems::economy::IncomeBreakdown;
use serde::{Deserialize, Serialize};

/// Everything a player can ask the engine to do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Command {
    // Economic
    ProduceNuke,
    BuildShield,
    UpgradeCity { city: String },
    SocialProgram { city: String },
    BuildBunker { city: String },
    SendAid { to_country: String, amount: i64 },

    // Military
    Attack { target_country: String, city: String },
    PostHit { choice: PostHitChoice },
    CancelPostHit,

    // Global events
    Contribute { amount: i64 },
    Invest { amount: i64 },
    Purchase,

    // Diplomacy
    ProposeNegotiation { target_country: String },
    RespondNegotiation {
        initiator: PlayerId,
        reply: NegotiationReply,
    },

    // Queries
    Statistics,
    Overview,
    Income,
    Newspaper,

    // Meta
    ToggleReady,
    CallAdmin,
    Surrender,
}

/// What a [`Command`] produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CommandOutcome {
    Action(ActionOutcome),
    Attack(AttackOutcome),
    PostHit(PostHitOutcome),
    PostHitCancelled(bool),
    Event(InteractionOutcome),
    NegotiationProposed { to: PlayerId },
    NegotiationAnswered(NegotiationReply),
    Statistics(Statistics),
    Overview(Vec<CountryView>),
    Income(IncomeBreakdown),
    Newspaper(Option<String>),
    Ready(bool),
    AdminCalled,
}

impl Engine {
    /// Dispatch `command` on behalf of `player`.
    pub fn execute(&self, player: PlayerId, command: &Command) -> Result<CommandOutcome, ActionError> {
        log::trace!("Player {} executes {:?}", player, command);
        let outcome = match command {
            Command::ProduceNuke => CommandOutcome::Action(self.produce_nuke(player)?),
            Command::BuildShield => CommandOutcome::Action(self.build_shield(player)?),
            Command::UpgradeCity { city } => CommandOutcome::Action(self.upgrade_city(player, city)?),
            Command::SocialProgram { city } => {
                CommandOutcome::Action(self.social_program(player, city)?)
            }
            Command::BuildBunker { city } => CommandOutcome::Action(self.build_bunker(player, city)?),
            Command::SendAid { to_country, amount } => {
                CommandOutcome::Action(self.send_aid(player, to_country, *amount)?)
            }
            Command::Attack {
                target_country,
                city,
            } => CommandOutcome::Attack(self.resolve_attack(player, target_country, city)?),
            Command::PostHit { choice } => {
                CommandOutcome::PostHit(self.resolve_post_hit_choice(player, *choice)?)
            }
            Command::CancelPostHit => {
                CommandOutcome::PostHitCancelled(self.cancel_post_hit_choice(player))
            }
            Command::Contribute { amount } => CommandOutcome::Event(self.contribute(player, *amount)?),
            Command::Invest { amount } => CommandOutcome::Event(self.invest(player, *amount)?),
            Command::Purchase => CommandOutcome::Event(self.purchase(player)?),
            Command::ProposeNegotiation { target_country } => CommandOutcome::NegotiationProposed {
                to: self.propose_negotiation(player, target_country)?,
            },
            Command::RespondNegotiation { initiator, reply } => {
                self.respond_negotiation(player, *initiator, *reply)?;
                CommandOutcome::NegotiationAnswered(*reply)
            }
            Command::Statistics => CommandOutcome::Statistics(self.statistics(player)?),
            Command::Overview => CommandOutcome::Overview(self.country_overview(player)),
            Command::Income => CommandOutcome::Income(self.income(player)?),
            Command::Newspaper => CommandOutcome::Newspaper(self.newspaper()),
            Command::ToggleReady => CommandOutcome::Ready(self.toggle_ready(player)?),
            Command::CallAdmin => {
                self.call_admin(player)?;
                CommandOutcome::AdminCalled
            }
            Command::Surrender => CommandOutcome::Action(self.surrender(player)?),
        };
        Ok(outcome)
    }
}
