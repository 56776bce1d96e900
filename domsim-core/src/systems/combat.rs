use crate::config::GameConfig;
use crate::error::ActionError;
use crate::notify::Outbox;
use crate::rng::RandomSource;
use crate::state::{PlayerId, RoundEvent, WorldState};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// What happened to the targeted city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackOutcome {
    /// A shield absorbed the nuke; QoL dropped from panic.
    Shielded {
        target: PlayerId,
        main_penalty: i32,
        other_penalty: i32,
        shields_left: u32,
    },
    /// The city was destroyed. The attacker now owes a post-hit choice.
    DirectHit {
        target: PlayerId,
        /// Shields were present but a solar flare disabled them.
        shields_bypassed: bool,
        eliminated: bool,
    },
}

/// A direct hit waiting for the attacker to loot or burn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPostHit {
    pub attacker: PlayerId,
    pub target: PlayerId,
    pub target_country: String,
    pub city: String,
    pub round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostHitChoice {
    Loot,
    Burn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostHitOutcome {
    Looted { amount: i64, qol_penalty: i32 },
    Burned,
}

/// Checks every attack precondition. Returns the target's id.
pub fn validate_attack(
    world: &WorldState,
    attacker: PlayerId,
    target_country: &str,
    city: &str,
) -> Result<PlayerId, ActionError> {
    let a = world
        .player(attacker)
        .ok_or(ActionError::UnknownPlayer(attacker))?;
    if !a.is_active() {
        return Err(ActionError::NotInGame(attacker));
    }
    if a.actions_left == 0 {
        return Err(ActionError::NoActionsLeft);
    }
    if a.country.as_deref() == Some(target_country) {
        return Err(ActionError::InvalidTarget(
            "cannot attack your own country".into(),
        ));
    }
    let target = world
        .player_by_country(target_country)
        .filter(|t| t.is_active())
        .ok_or_else(|| ActionError::InvalidTarget(format!("{target_country} is not in play")))?;
    if a.attacked_this_round.contains(target_country) {
        return Err(ActionError::AlreadyAttacked(target_country.to_string()));
    }
    let target_city = target
        .cities
        .get(city)
        .ok_or_else(|| ActionError::CityMissing {
            country: target_country.to_string(),
            city: city.to_string(),
        })?;
    if target_city.is_destroyed() {
        return Err(ActionError::CityDestroyed(city.to_string()));
    }
    if a.ready_nukes == 0 {
        return Err(ActionError::NoReadyNukes);
    }
    Ok(target.id)
}

/// Launch one nuke at `city` of `target_country`.
///
/// On a direct hit the returned record must be parked until the attacker
/// decides between loot and burn.
#[instrument(skip_all, name = "resolve_attack")]
pub fn resolve_attack(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
    outbox: &mut Outbox,
    attacker: PlayerId,
    target_country: &str,
    city: &str,
) -> Result<(AttackOutcome, Option<PendingPostHit>), ActionError> {
    let target_id = validate_attack(world, attacker, target_country, city)?;
    let shields_ignored = world
        .active_event
        .as_ref()
        .is_some_and(|e| e.kind.behaviour().shields_ignored());
    let round = world.round.current_round;

    let attacker_country = {
        let a = world
            .player_mut(attacker)
            .ok_or(ActionError::UnknownPlayer(attacker))?;
        a.ready_nukes -= 1;
        a.actions_left -= 1;
        a.attacked_this_round.insert(target_country.to_string());
        a.country.clone().unwrap_or_default()
    };

    let target = world
        .player_mut(target_id)
        .ok_or_else(|| ActionError::invariant(format!("target {target_id} vanished mid-attack")))?;
    let bunker_level = target.cities.get(city).map_or(0, |c| c.bunker_level);
    let bunker = config.bunker_tier(bunker_level).copied();

    if target.shields > 0 && !shields_ignored {
        target.shields -= 1;
        let mut main_penalty = rng.roll(config.shield_panic_main);
        let other_penalty = rng.roll(config.shield_panic_other);
        if let Some(tier) = bunker {
            main_penalty = (f64::from(main_penalty) * (1.0 - tier.panic_reduction)) as i32;
        }

        let mut report = Vec::new();
        for (name, c) in target.cities.iter_mut() {
            let penalty = if name == city {
                main_penalty
            } else {
                other_penalty
            };
            let old = c.qol;
            c.adjust_qol(-penalty);
            report.push(format!("  - {name}: {old}% -> {}% (-{penalty}%)", c.qol));
        }
        let shields_left = target.shields;

        let mut text = format!("Attack from {attacker_country} on {city} was stopped by a shield!\n");
        if bunker.is_some() {
            text.push_str(&format!(
                "The level {bunker_level} bunker greatly reduced the panic.\n"
            ));
        } else {
            text.push_str("News of the incoming missile caused panic.\n");
        }
        text.push_str("QoL changes:\n");
        text.push_str(&report.join("\n"));
        text.push_str(&format!("\n\nShields left: {shields_left}."));
        outbox.push_markdown(target_id, text);

        world.log(RoundEvent::AttackShielded {
            attacker: attacker_country.clone(),
            target: target_country.to_string(),
            city: city.to_string(),
        });
        log::info!(
            "{} attacked {}:{}; shielded (main -{}, other -{})",
            attacker_country,
            target_country,
            city,
            main_penalty,
            other_penalty
        );
        return Ok((
            AttackOutcome::Shielded {
                target: target_id,
                main_penalty,
                other_penalty,
                shields_left,
            },
            None,
        ));
    }

    let shields_bypassed = shields_ignored && target.shields > 0;
    let hit_qol = match bunker {
        Some(tier) => tier.qol_floor,
        None => rng.roll(config.direct_hit_qol).clamp(0, 100) as u8,
    };
    let c = target
        .cities
        .get_mut(city)
        .ok_or_else(|| ActionError::invariant(format!("city {city} vanished mid-attack")))?;
    c.set_level(0, config.unit_income);
    c.qol = hit_qol;
    let eliminated = target.check_elimination();

    let mut text =
        format!("WARNING! {attacker_country} launched a nuclear strike on {city}! The city is destroyed.");
    if bunker.is_some() {
        text.push_str(&format!(
            "\n\nThe population sheltered in a level {bunker_level} bunker. QoL holds at {hit_qol}%."
        ));
    } else {
        text.push_str("\n\nSurvivors are in chaos. QoL fell almost to zero.");
    }
    outbox.push_markdown(target_id, text);

    world.log(RoundEvent::AttackSuccess {
        attacker: attacker_country.clone(),
        target: target_country.to_string(),
        city: city.to_string(),
    });
    if eliminated {
        world.log(RoundEvent::CountryEliminated {
            country: target_country.to_string(),
        });
        outbox.push(target_id, "All your cities are destroyed. You are out of the game.");
        log::info!("{} eliminated by {}", target_country, attacker_country);
    }
    log::info!(
        "{} destroyed {}:{} (flare bypass: {})",
        attacker_country,
        target_country,
        city,
        shields_bypassed
    );

    let pending = PendingPostHit {
        attacker,
        target: target_id,
        target_country: target_country.to_string(),
        city: city.to_string(),
        round,
    };
    Ok((
        AttackOutcome::DirectHit {
            target: target_id,
            shields_bypassed,
            eliminated,
        },
        Some(pending),
    ))
}

/// Apply the attacker's loot-or-burn decision to a parked direct hit.
///
/// The record is re-validated against the current world: the attacker must
/// still be in the game, the target must still own the country and the city
/// must still be rubble.
#[instrument(skip_all, name = "post_hit_choice")]
pub fn resolve_post_hit(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
    outbox: &mut Outbox,
    pending: &PendingPostHit,
    choice: PostHitChoice,
) -> Result<PostHitOutcome, ActionError> {
    if !world.player(pending.attacker).is_some_and(|a| a.is_active()) {
        return Err(ActionError::invariant(format!(
            "attacker {} left the game before deciding on {}:{}",
            pending.attacker, pending.target_country, pending.city
        )));
    }
    let still_valid = world.player(pending.target).is_some_and(|t| {
        t.country.as_deref() == Some(pending.target_country.as_str())
            && t.cities.get(&pending.city).is_some_and(|c| c.is_destroyed())
    });
    if !still_valid {
        return Err(ActionError::invariant(format!(
            "post-hit record for {}:{} no longer matches the world",
            pending.target_country, pending.city
        )));
    }
    let attacker_country = world
        .country_of(pending.attacker)
        .unwrap_or_default()
        .to_string();

    let outcome = match choice {
        PostHitChoice::Loot => {
            let qol_penalty = rng.roll(config.loot_qol_penalty);
            let target = world
                .player_mut(pending.target)
                .ok_or_else(|| ActionError::invariant("target vanished"))?;
            let amount = if target.budget > 0 {
                (target.budget as f64 * config.loot_fraction).floor() as i64
            } else {
                0
            };
            target.budget -= amount;
            if let Some(c) = target.cities.get_mut(&pending.city) {
                c.adjust_qol(-qol_penalty);
            }
            if let Some(a) = world.player_mut(pending.attacker) {
                a.budget += amount;
            }
            world.log(RoundEvent::CityLooted {
                attacker: attacker_country.clone(),
                target: pending.target_country.clone(),
                city: pending.city.clone(),
                amount,
            });
            outbox.push(
                pending.target,
                format!(
                    "{attacker_country} looted the ruins of {}: ${amount} taken, QoL -{qol_penalty}.",
                    pending.city
                ),
            );
            PostHitOutcome::Looted {
                amount,
                qol_penalty,
            }
        }
        PostHitChoice::Burn => {
            let target = world
                .player_mut(pending.target)
                .ok_or_else(|| ActionError::invariant("target vanished"))?;
            if let Some(c) = target.cities.get_mut(&pending.city) {
                c.ruined = true;
            }
            world.log(RoundEvent::CityBurned {
                attacker: attacker_country.clone(),
                target: pending.target_country.clone(),
                city: pending.city.clone(),
            });
            outbox.push(
                pending.target,
                format!(
                    "{attacker_country} burned {} to the ground. Its prosperity will never fully return.",
                    pending.city
                ),
            );
            PostHitOutcome::Burned
        }
    };

    if let Some(target) = world.player_mut(pending.target) {
        if target.check_elimination() {
            world.log(RoundEvent::CountryEliminated {
                country: pending.target_country.clone(),
            });
        }
    }
    log::info!(
        "{} chose {:?} on {}:{}",
        attacker_country,
        choice,
        pending.target_country,
        pending.city
    );
    Ok(outcome)
}
