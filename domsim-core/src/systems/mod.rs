//! Game rules: economy, combat, per-player actions, diplomacy and the round
//! digest.

pub mod actions;
pub mod combat;
pub mod digest;
pub mod diplomacy;
pub mod economy;

pub use actions::{ActionOutcome, CityStats, CountryView, Statistics};
pub use combat::{AttackOutcome, PendingPostHit, PostHitChoice, PostHitOutcome};
pub use digest::round_digest;
pub use diplomacy::{AdminCallReply, NegotiationReply};
pub use economy::{
    city_income, player_income, qol_multiplier, CityIncome, IncomeBreakdown, IncomeModifiers,
};
