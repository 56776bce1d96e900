//! # Domsim Core
//!
//! Round, event and combat engine for a turn-based multiplayer nation
//! simulation.
//!
//! Players grow budgets and cities over discrete rounds while random global
//! events and nuclear strikes between players perturb the economy. The chat
//! front-end, admin UI and storage live outside this crate and talk to it
//! through [`Engine`] and the [`Notifier`] port.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │  Players /  │────▶│   Command    │────▶│ Engine (1 lock)  │
//! │  AI bots    │     │  (execute)   │     │  WorldState      │
//! └─────────────┘     └──────────────┘     └────────┬─────────┘
//!                                                   │ Outbox
//!                     ┌──────────────┐     ┌────────▼─────────┐
//!                     │  Notifier    │◀────│ deliver (after   │
//!                     │  (transport) │     │  unlock)         │
//!                     └──────────────┘     └──────────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`WorldState`] | Players, cities, active event, cooldowns, round clock |
//! | [`Engine`] | Session facade: rounds, events, combat, actions |
//! | [`Command`] | Player-facing operations, dispatched by [`Engine::execute`] |
//! | [`GlobalEvent`] | Behaviour of one of the six global event kinds |
//! | [`RandomSource`] | Single injectable RNG port |
//! | [`AiPlayer`] | Trait for bot decision making |
//!
//! ## Concurrency
//!
//! All mutation happens under one `parking_lot::Mutex`. Round advance also
//! holds an exclusive flag and returns [`AdvanceOutcome::Busy`] on overlap.
//! Notifications are queued while locked and sent after the lock is released.

pub mod ai;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod input;
pub mod notify;
pub mod registry;
pub mod rng;
pub mod round;
pub mod state;
pub mod systems;
pub mod testing;

pub use ai::{AiPlayer, RandomAi, VisibleWorldState};
pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, GameConfig};
pub use engine::{AdvanceOutcome, Engine, Ports};
pub use error::ActionError;
pub use events::{EventKind, GlobalEvent, InteractionOutcome};
pub use input::{Command, CommandOutcome};
pub use notify::{LogNotifier, Notifier, NotifyError, TextFormat};
pub use rng::{RandomSource, SeededRng};
pub use round::RoundReport;
pub use state::{City, Player, PlayerId, RoundEvent, WorldState};
pub use systems::{
    AdminCallReply, AttackOutcome, NegotiationReply, PostHitChoice, PostHitOutcome, Statistics,
};
