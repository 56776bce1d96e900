use crate::events::EventKind;
use crate::state::PlayerId;
use thiserror::Error;

/// Why a player or admin action was rejected.
///
/// Every rejection happens before the first mutation, so an `Err` always
/// means the world is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("Player {0} is not in the game")]
    NotInGame(PlayerId),
    #[error("Unknown country {0}")]
    UnknownCountry(String),
    #[error("Country {0} is already taken")]
    CountryTaken(String),
    #[error("Player {0} already governs a country")]
    AlreadyHasCountry(PlayerId),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("City {city} does not exist in {country}")]
    CityMissing { country: String, city: String },
    #[error("City {0} is already destroyed")]
    CityDestroyed(String),
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },
    #[error("No actions left this round")]
    NoActionsLeft,
    #[error("No nukes ready")]
    NoReadyNukes,
    #[error("{0} was already attacked this round")]
    AlreadyAttacked(String),
    #[error("Round limit reached for {0}")]
    RoundLimitReached(&'static str),
    #[error("Cannot hold more than {0} shields")]
    ShieldCapacity(u32),
    #[error("{0} is already at maximum level")]
    MaxLevelReached(String),
    #[error("No global event is active")]
    NoActiveEvent,
    #[error("{0} is already active")]
    EventAlreadyActive(EventKind),
    #[error("{kind} does not accept {interaction}")]
    WrongInteraction {
        kind: EventKind,
        interaction: &'static str,
    },
    #[error("Production is blocked by {0}")]
    ProductionBlocked(EventKind),
    #[error("Invalid amount {0}")]
    InvalidAmount(i64),
    #[error("Invalid nickname: {0}")]
    InvalidNickname(String),
    #[error("A post-hit decision is still pending")]
    ChoicePending,
    #[error("No open proposal from player {0}")]
    NoOpenProposal(PlayerId),
    #[error("Calling the administrator is blocked for {remaining_secs} more seconds")]
    AdminCallBanned { remaining_secs: u64 },
    #[error("The round timer is already running")]
    GameAlreadyRunning,
    #[error("Session state out of sync: {detail}")]
    InvariantViolation { detail: String },
}

impl ActionError {
    pub fn invariant(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        log::error!("Invariant violation: {}", detail);
        ActionError::InvariantViolation { detail }
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, ActionError::InvariantViolation { .. })
    }
}
