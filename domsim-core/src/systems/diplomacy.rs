//! Player-to-player negotiation and calls to the administrator.
//!
//! Neither touches the world itself: a proposal is a relay between two
//! countries, and an admin call is a relay to the administrator with a
//! temporary ban the administrator can hand out.

use crate::config::GameConfig;
use crate::error::ActionError;
use crate::notify::Outbox;
use crate::state::{PlayerId, WorldState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationReply {
    Accept,
    Decline,
    Postpone,
}

/// Open proposals as `(initiator, responder)` pairs.
pub type OpenProposals = BTreeSet<(PlayerId, PlayerId)>;

/// Ask the country `target_country` to negotiate. Returns the responder's id.
pub fn propose(
    world: &WorldState,
    open: &mut OpenProposals,
    outbox: &mut Outbox,
    initiator: PlayerId,
    target_country: &str,
) -> Result<PlayerId, ActionError> {
    let from = world
        .player(initiator)
        .ok_or(ActionError::UnknownPlayer(initiator))?;
    if !from.is_active() {
        return Err(ActionError::NotInGame(initiator));
    }
    let to = world
        .player_by_country(target_country)
        .ok_or_else(|| ActionError::UnknownCountry(target_country.to_string()))?;
    if to.id == initiator {
        return Err(ActionError::InvalidTarget(
            "cannot negotiate with yourself".into(),
        ));
    }
    if !to.is_active() {
        return Err(ActionError::InvalidTarget(format!(
            "{target_country} is not in play"
        )));
    }

    let from_country = from.country.clone().unwrap_or_default();
    open.insert((initiator, to.id));
    outbox.push(to.id, format!("{from_country} proposes negotiations."));
    log::info!("{} proposed negotiations to {}", from_country, target_country);
    Ok(to.id)
}

/// Answer an open proposal from `initiator`. Any reply closes it.
pub fn respond(
    world: &WorldState,
    open: &mut OpenProposals,
    outbox: &mut Outbox,
    responder: PlayerId,
    initiator: PlayerId,
    reply: NegotiationReply,
) -> Result<(), ActionError> {
    if !open.remove(&(initiator, responder)) {
        return Err(ActionError::NoOpenProposal(initiator));
    }
    let country = world
        .country_of(responder)
        .unwrap_or("An unknown country")
        .to_string();
    let text = match reply {
        NegotiationReply::Accept => format!("{country} accepts your proposal."),
        NegotiationReply::Decline => format!("{country} declined your proposal."),
        NegotiationReply::Postpone => format!("{country} postponed the negotiations."),
    };
    outbox.push(initiator, text);
    log::info!("{} answered {:?} to player {}", country, reply, initiator);
    Ok(())
}

/// Administrator's answer to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminCallReply {
    OnMyWay,
    InAMinute,
    ComeOver,
    /// Blocks further calls for `admin_call_ban_secs`.
    Ban,
}

/// Until when each player is barred from calling the administrator.
pub type CallBans = BTreeMap<PlayerId, SystemTime>;

/// Page the administrator on behalf of `player`, unless they are banned.
pub fn call_admin(
    world: &WorldState,
    config: &GameConfig,
    bans: &mut CallBans,
    outbox: &mut Outbox,
    player: PlayerId,
    now: SystemTime,
) -> Result<(), ActionError> {
    let p = world
        .player(player)
        .ok_or(ActionError::UnknownPlayer(player))?;
    if let Some(&until) = bans.get(&player) {
        match until.duration_since(now) {
            Ok(left) if !left.is_zero() => {
                return Err(ActionError::AdminCallBanned {
                    remaining_secs: left.as_secs_f64().round() as u64,
                });
            }
            _ => {
                bans.remove(&player);
            }
        }
    }

    let text = format!(
        "**Admin call!**\nPlayer: {}\nCountry: {}\nUser ID: `{}`",
        p.nickname.as_deref().unwrap_or("N/A"),
        p.country.as_deref().unwrap_or("N/A"),
        player
    );
    outbox.push_markdown(config.admin_id, text);
    log::info!("Player {} called the administrator", player);
    Ok(())
}

/// Relay the administrator's answer. A ban starts counting from `now`.
pub fn answer_admin_call(
    world: &WorldState,
    config: &GameConfig,
    bans: &mut CallBans,
    outbox: &mut Outbox,
    player: PlayerId,
    reply: AdminCallReply,
    now: SystemTime,
) -> Result<(), ActionError> {
    if world.player(player).is_none() {
        return Err(ActionError::UnknownPlayer(player));
    }
    let text = match reply {
        AdminCallReply::OnMyWay => "The administrator is on the way.".to_string(),
        AdminCallReply::InAMinute => "The administrator will be with you in a minute.".to_string(),
        AdminCallReply::ComeOver => "The administrator asks you to come over.".to_string(),
        AdminCallReply::Ban => {
            bans.insert(player, now + Duration::from_secs(config.admin_call_ban_secs));
            format!(
                "You are blocked from calling the administrator for {} minutes.",
                config.admin_call_ban_secs / 60
            )
        }
    };
    outbox.push(player, format!("Reply from the administrator: {text}"));
    log::debug!("Administrator answered {} with {:?}", player, reply);
    Ok(())
}
