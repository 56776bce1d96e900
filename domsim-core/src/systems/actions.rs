//! Per-player actions taken during a round.
//!
//! Every action validates fully before touching the world, so an `Err`
//! leaves state exactly as it was. Unless noted, each costs one action.

use crate::config::GameConfig;
use crate::error::ActionError;
use crate::notify::Outbox;
use crate::rng::RandomSource;
use crate::state::{Player, PlayerId, RoundEvent, TempEffect, WorldState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    NukeProduced {
        cost: i64,
        qol_penalty: i32,
    },
    ShieldBuilt {
        cost: i64,
        qol_bonus: i32,
        shields: u32,
    },
    CityUpgraded {
        city: String,
        cost: i64,
        level: u8,
        qol_gain: i32,
        other_penalty: i32,
        /// Every city reached 100 QoL.
        prosperity_victory: bool,
    },
    SocialProgram {
        city: String,
        qol_gain: i32,
        prosperity_victory: bool,
    },
    BunkerBuilt {
        city: String,
        cost: i64,
        level: u8,
    },
    AidSent {
        to: PlayerId,
        amount: i64,
    },
    Surrendered,
}

/// Public view of another nation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryView {
    pub country: String,
    pub nickname: Option<String>,
    pub cities: usize,
    pub avg_level: f64,
    pub avg_qol: f64,
    pub shields: u32,
    pub ready_nukes: u32,
    /// Only disclosed while budgets are visible.
    pub budget: Option<i64>,
}

fn acting_player(world: &WorldState, id: PlayerId) -> Result<&Player, ActionError> {
    let p = world.player(id).ok_or(ActionError::UnknownPlayer(id))?;
    if !p.is_active() {
        return Err(ActionError::NotInGame(id));
    }
    if p.actions_left == 0 {
        return Err(ActionError::NoActionsLeft);
    }
    Ok(p)
}

fn require_funds(p: &Player, cost: i64) -> Result<(), ActionError> {
    if p.budget < cost {
        return Err(ActionError::InsufficientFunds {
            required: cost,
            available: p.budget,
        });
    }
    Ok(())
}

fn check_production(world: &WorldState) -> Result<(), ActionError> {
    match &world.active_event {
        Some(e) if e.kind.behaviour().production_blocked() => {
            Err(ActionError::ProductionBlocked(e.kind))
        }
        _ => Ok(()),
    }
}

fn military_cost(base: i64, p: &Player) -> i64 {
    if p.has_effect(TempEffect::MilitarySurcharge) {
        base * 2
    } else {
        base
    }
}

fn country(p: &Player) -> String {
    p.country.clone().unwrap_or_default()
}

/// QoL gain from an upgrade, shrinking as the city gets happier.
fn upgrade_gain_range(qol: u8) -> (i64, i64) {
    match qol {
        90..=u8::MAX => (2, 4),
        80..=89 => (3, 5),
        70..=79 => (3, 7),
        _ => (7, 15),
    }
}

fn social_gain_range(qol: u8) -> (i64, i64) {
    match qol {
        90..=u8::MAX => (2, 4),
        80..=89 => (3, 5),
        70..=79 => (3, 7),
        _ => (5, 10),
    }
}

fn prosperity_reached(p: &Player) -> bool {
    !p.cities.is_empty() && p.cities.values().all(|c| c.qol >= 100)
}

fn announce_prosperity(world: &WorldState, outbox: &mut Outbox, p: &Player) {
    let text = format!(
        "CONGRATULATIONS! {} wins the game by reaching 100% quality of life everywhere!",
        p.display_name()
    );
    outbox.broadcast(world.active_ids(), &text);
    log::info!("{} reached full prosperity", country(p));
}

pub fn produce_nuke(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
    player: PlayerId,
) -> Result<ActionOutcome, ActionError> {
    check_production(world)?;
    let p = acting_player(world, player)?;
    let cost = military_cost(config.nuke_cost, p);
    require_funds(p, cost)?;

    let qol_penalty = rng.range_inclusive(5, 10) as i32;
    let Some(p) = world.player_mut(player) else {
        return Err(ActionError::UnknownPlayer(player));
    };
    p.budget -= cost;
    p.pending_nukes += 1;
    p.actions_left -= 1;
    for city in p.cities.values_mut() {
        city.adjust_qol(-qol_penalty);
    }
    let name = country(p);
    world.log(RoundEvent::NukeProduced { country: name });
    Ok(ActionOutcome::NukeProduced { cost, qol_penalty })
}

pub fn build_shield(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
    player: PlayerId,
) -> Result<ActionOutcome, ActionError> {
    check_production(world)?;
    let p = acting_player(world, player)?;
    if p.shields_built_this_round >= config.max_shields_per_round {
        return Err(ActionError::RoundLimitReached("shields"));
    }
    if p.shields >= config.max_shields {
        return Err(ActionError::ShieldCapacity(config.max_shields));
    }
    let cost = military_cost(config.shield_cost, p);
    require_funds(p, cost)?;

    let qol_bonus = rng.range_inclusive(2, 5) as i32;
    let Some(p) = world.player_mut(player) else {
        return Err(ActionError::UnknownPlayer(player));
    };
    p.budget -= cost;
    p.shields += 1;
    p.shields_built_this_round += 1;
    p.actions_left -= 1;
    for city in p.cities.values_mut() {
        city.adjust_qol(qol_bonus);
    }
    let shields = p.shields;
    let name = country(p);
    world.log(RoundEvent::ShieldBuilt { country: name });
    Ok(ActionOutcome::ShieldBuilt {
        cost,
        qol_bonus,
        shields,
    })
}

pub fn upgrade_city(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
    outbox: &mut Outbox,
    player: PlayerId,
    city: &str,
) -> Result<ActionOutcome, ActionError> {
    let p = acting_player(world, player)?;
    if p.upgrades_this_round >= config.max_upgrades_per_round {
        return Err(ActionError::RoundLimitReached("upgrades"));
    }
    let target = p.cities.get(city).ok_or_else(|| ActionError::CityMissing {
        country: country(p),
        city: city.to_string(),
    })?;
    // Level 0 is allowed: upgrading rubble rebuilds the city.
    if target.level >= config.max_city_level {
        return Err(ActionError::MaxLevelReached(city.to_string()));
    }
    let cost = config.upgrade_cost(target.level);
    require_funds(p, cost)?;

    let (lo, hi) = upgrade_gain_range(target.qol);
    let qol_gain = rng.range_inclusive(lo, hi) as i32;
    let other_penalty = rng.range_inclusive(1, 3) as i32;

    let Some(p) = world.player_mut(player) else {
        return Err(ActionError::UnknownPlayer(player));
    };
    p.budget -= cost;
    p.actions_left -= 1;
    p.upgrades_this_round += 1;
    let mut level = 0;
    for (name, c) in p.cities.iter_mut() {
        if name == city {
            c.set_level(c.level + 1, config.unit_income);
            c.adjust_qol(qol_gain);
            level = c.level;
        } else {
            c.adjust_qol(-other_penalty);
        }
    }
    let prosperity_victory = prosperity_reached(p);
    let snapshot = p.clone();
    world.log(RoundEvent::CityUpgraded {
        country: country(&snapshot),
        city: city.to_string(),
        level,
    });
    if prosperity_victory {
        announce_prosperity(world, outbox, &snapshot);
    }
    Ok(ActionOutcome::CityUpgraded {
        city: city.to_string(),
        cost,
        level,
        qol_gain,
        other_penalty,
        prosperity_victory,
    })
}

pub fn social_program(
    world: &mut WorldState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
    outbox: &mut Outbox,
    player: PlayerId,
    city: &str,
) -> Result<ActionOutcome, ActionError> {
    let p = acting_player(world, player)?;
    if p.social_programs_this_round >= config.max_social_programs_per_round {
        return Err(ActionError::RoundLimitReached("social programs"));
    }
    let target = p.cities.get(city).ok_or_else(|| ActionError::CityMissing {
        country: country(p),
        city: city.to_string(),
    })?;
    require_funds(p, config.social_program_cost)?;

    let (lo, hi) = social_gain_range(target.qol);
    let qol_gain = rng.range_inclusive(lo, hi) as i32;

    let Some(p) = world.player_mut(player) else {
        return Err(ActionError::UnknownPlayer(player));
    };
    p.budget -= config.social_program_cost;
    p.actions_left -= 1;
    p.social_programs_this_round += 1;
    if let Some(c) = p.cities.get_mut(city) {
        c.adjust_qol(qol_gain);
    }
    let prosperity_victory = prosperity_reached(p);
    let snapshot = p.clone();
    world.log(RoundEvent::SocialProgram {
        country: country(&snapshot),
        city: city.to_string(),
    });
    if prosperity_victory {
        announce_prosperity(world, outbox, &snapshot);
    }
    Ok(ActionOutcome::SocialProgram {
        city: city.to_string(),
        qol_gain,
        prosperity_victory,
    })
}

pub fn build_bunker(
    world: &mut WorldState,
    config: &GameConfig,
    player: PlayerId,
    city: &str,
) -> Result<ActionOutcome, ActionError> {
    let p = acting_player(world, player)?;
    let target = p.cities.get(city).ok_or_else(|| ActionError::CityMissing {
        country: country(p),
        city: city.to_string(),
    })?;
    let next = target.bunker_level + 1;
    let tier = config
        .bunker_tier(next)
        .ok_or_else(|| ActionError::MaxLevelReached(format!("bunker in {city}")))?;
    require_funds(p, tier.cost)?;
    let cost = tier.cost;

    let Some(p) = world.player_mut(player) else {
        return Err(ActionError::UnknownPlayer(player));
    };
    p.budget -= cost;
    p.actions_left -= 1;
    if let Some(c) = p.cities.get_mut(city) {
        c.bunker_level = next;
    }
    let name = country(p);
    world.log(RoundEvent::BunkerBuilt {
        country: name,
        city: city.to_string(),
        level: next,
    });
    Ok(ActionOutcome::BunkerBuilt {
        city: city.to_string(),
        cost,
        level: next,
    })
}

/// Transfer money to another nation, at most `max_aid_fraction` of the budget.
pub fn send_aid(
    world: &mut WorldState,
    config: &GameConfig,
    outbox: &mut Outbox,
    from: PlayerId,
    to_country: &str,
    amount: i64,
) -> Result<ActionOutcome, ActionError> {
    let sender = acting_player(world, from)?;
    if sender.country.as_deref() == Some(to_country) {
        return Err(ActionError::InvalidTarget("cannot send aid to yourself".into()));
    }
    let receiver = world
        .player_by_country(to_country)
        .filter(|r| r.is_active())
        .ok_or_else(|| ActionError::InvalidTarget(format!("{to_country} is not in play")))?;
    let limit = (sender.budget as f64 * config.max_aid_fraction).floor() as i64;
    if amount <= 0 || amount > limit {
        return Err(ActionError::InvalidAmount(amount));
    }
    let to = receiver.id;
    let from_country = country(sender);

    if let Some(s) = world.player_mut(from) {
        s.budget -= amount;
        s.actions_left -= 1;
    }
    let receiver_budget = match world.player_mut(to) {
        Some(r) => {
            r.budget += amount;
            r.budget
        }
        None => return Err(ActionError::invariant(format!("aid receiver {to} vanished"))),
    };
    world.log(RoundEvent::AidSent {
        from: from_country.clone(),
        to: to_country.to_string(),
        amount,
    });
    outbox.push(
        to,
        format!("{from_country} sent you ${amount} in aid. Your budget: ${receiver_budget}."),
    );
    log::info!("{} sent ${} to {}", from_country, amount, to_country);
    Ok(ActionOutcome::AidSent { to, amount })
}

/// Leave the game for good. Costs no action.
pub fn surrender(
    world: &mut WorldState,
    config: &GameConfig,
    outbox: &mut Outbox,
    player: PlayerId,
) -> Result<ActionOutcome, ActionError> {
    let p = world
        .player_mut(player)
        .ok_or(ActionError::UnknownPlayer(player))?;
    if !p.is_active() {
        return Err(ActionError::NotInGame(player));
    }
    p.eliminated = true;
    for c in p.cities.values_mut() {
        c.set_level(0, config.unit_income);
        c.qol = 0;
    }
    let name = p.display_name();
    let country = country(p);
    world.log(RoundEvent::Surrendered { country });
    outbox.push(config.admin_id, format!("Player {name} surrendered."));
    log::info!("{} surrendered", name);
    Ok(ActionOutcome::Surrendered)
}

/// Every other active nation as `viewer` sees it.
pub fn country_overview(world: &WorldState, viewer: PlayerId) -> Vec<CountryView> {
    let budgets_visible = world
        .active_event
        .as_ref()
        .is_some_and(|e| e.kind.behaviour().budgets_visible());

    world
        .active_players()
        .filter(|p| p.id != viewer)
        .map(|p| {
            let n = p.cities.len();
            let (avg_level, avg_qol) = if n > 0 {
                let levels: u32 = p.cities.values().map(|c| u32::from(c.level)).sum();
                let qols: u32 = p.cities.values().map(|c| u32::from(c.qol)).sum();
                (f64::from(levels) / n as f64, f64::from(qols) / n as f64)
            } else {
                (0.0, 0.0)
            };
            CountryView {
                country: country(p),
                nickname: p.nickname.clone(),
                cities: n,
                avg_level,
                avg_qol,
                shields: p.shields,
                ready_nukes: p.ready_nukes,
                budget: budgets_visible.then_some(p.budget),
            }
        })
        .collect()
}

/// One line of a player's own city table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityStats {
    pub name: String,
    pub level: u8,
    pub income: i64,
    pub qol: u8,
    pub bunker_level: u8,
}

/// Everything a player knows about their own country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub display_name: String,
    pub budget: i64,
    pub ready_nukes: u32,
    pub pending_nukes: u32,
    pub shields: u32,
    pub actions_left: u32,
    pub cities: Vec<CityStats>,
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Statistics ({}):", self.display_name)?;
        writeln!(f, "Budget: ${}", self.budget)?;
        writeln!(f, "Nukes (ready/in production): {}/{}", self.ready_nukes, self.pending_nukes)?;
        writeln!(f, "Shields: {}", self.shields)?;
        writeln!(f, "Actions left: {}", self.actions_left)?;
        writeln!(f)?;
        write!(f, "Cities:")?;
        for c in &self.cities {
            write!(
                f,
                "\n  - {}: level {}, income ${}, QoL {}%",
                c.name, c.level, c.income, c.qol
            )?;
        }
        Ok(())
    }
}

/// The own-country view. Eliminated players may still look at their ruins.
pub fn statistics(world: &WorldState, player: PlayerId) -> Result<Statistics, ActionError> {
    let p = world
        .player(player)
        .ok_or(ActionError::UnknownPlayer(player))?;
    if p.country.is_none() {
        return Err(ActionError::NotInGame(player));
    }
    Ok(Statistics {
        display_name: p.display_name(),
        budget: p.budget,
        ready_nukes: p.ready_nukes,
        pending_nukes: p.pending_nukes,
        shields: p.shields,
        actions_left: p.actions_left,
        cities: p
            .cities
            .iter()
            .map(|(name, c)| CityStats {
                name: name.clone(),
                level: c.level,
                income: c.income,
                qol: c.qol,
                bunker_level: c.bunker_level,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::testing::{ScriptedRng, WorldStateBuilder};

    fn solo() -> WorldStateBuilder {
        WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["A", "B"])
            .with_player(2, "Borealia", &["C"])
            .with_budget(1, 20_000)
    }

    #[test]
    fn test_produce_nuke() {
        let mut world = solo().build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new().with_ranges([7]);
        let outcome = produce_nuke(&mut world, &config, &mut rng, 1).unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::NukeProduced {
                cost: 3000,
                qol_penalty: 7
            }
        );
        let p = world.player(1).unwrap();
        assert_eq!(p.pending_nukes, 1);
        assert_eq!(p.ready_nukes, 0);
        assert_eq!(p.budget, 17_000);
        assert_eq!(p.actions_left, 3);
        assert!(p.cities.values().all(|c| c.qol == 28));
    }

    #[test]
    fn test_energy_crisis_blocks_production() {
        let mut world = solo().with_event(EventKind::EnergyCrisis, 2).build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new();
        let before = world.clone();
        assert_eq!(
            produce_nuke(&mut world, &config, &mut rng, 1),
            Err(ActionError::ProductionBlocked(EventKind::EnergyCrisis))
        );
        assert_eq!(
            build_shield(&mut world, &config, &mut rng, 1),
            Err(ActionError::ProductionBlocked(EventKind::EnergyCrisis))
        );
        assert_eq!(world, before);
    }

    #[test]
    fn test_surcharge_doubles_military_cost() {
        let mut world = solo()
            .with_temp_effect(1, TempEffect::MilitarySurcharge, 1)
            .build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new();
        let outcome = build_shield(&mut world, &config, &mut rng, 1).unwrap();
        assert!(matches!(outcome, ActionOutcome::ShieldBuilt { cost: 4000, .. }));
    }

    #[test]
    fn test_shield_round_limit() {
        let mut world = solo().build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new();
        build_shield(&mut world, &config, &mut rng, 1).unwrap();
        assert_eq!(
            build_shield(&mut world, &config, &mut rng, 1),
            Err(ActionError::RoundLimitReached("shields"))
        );
    }

    #[test]
    fn test_shield_capacity() {
        let mut world = solo().with_shields(1, 5).build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new();
        assert_eq!(
            build_shield(&mut world, &config, &mut rng, 1),
            Err(ActionError::ShieldCapacity(5))
        );
    }

    #[test]
    fn test_upgrade_city() {
        let mut world = solo().with_qol(1, "A", 75).build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new().with_ranges([6, 2]);
        let mut outbox = Outbox::new();
        let outcome = upgrade_city(&mut world, &config, &mut rng, &mut outbox, 1, "A").unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::CityUpgraded {
                city: "A".into(),
                cost: 2000,
                level: 2,
                qol_gain: 6,
                other_penalty: 2,
                prosperity_victory: false
            }
        );
        let p = world.player(1).unwrap();
        assert_eq!(p.cities["A"].income, 1000);
        assert_eq!(p.cities["A"].qol, 81);
        assert_eq!(p.cities["B"].qol, 33);
    }

    #[test]
    fn test_upgrade_max_level() {
        let mut world = solo().with_level(1, "A", 5).build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new();
        let mut outbox = Outbox::new();
        assert_eq!(
            upgrade_city(&mut world, &config, &mut rng, &mut outbox, 1, "A"),
            Err(ActionError::MaxLevelReached("A".into()))
        );
    }

    #[test]
    fn test_upgrade_rebuilds_destroyed_city() {
        let mut world = solo().with_level(1, "A", 0).build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new();
        let mut outbox = Outbox::new();
        let outcome = upgrade_city(&mut world, &config, &mut rng, &mut outbox, 1, "A").unwrap();
        assert!(matches!(
            outcome,
            ActionOutcome::CityUpgraded {
                cost: 1500,
                level: 1,
                ..
            }
        ));
        assert_eq!(world.player(1).unwrap().cities["A"].income, 500);
    }

    #[test]
    fn test_diminishing_gain_ranges() {
        assert_eq!(upgrade_gain_range(95), (2, 4));
        assert_eq!(upgrade_gain_range(80), (3, 5));
        assert_eq!(upgrade_gain_range(70), (3, 7));
        assert_eq!(upgrade_gain_range(10), (7, 15));
        assert_eq!(social_gain_range(69), (5, 10));
    }

    #[test]
    fn test_social_program_limit_and_victory() {
        let mut world = solo()
            .with_qol(1, "A", 100)
            .with_qol(1, "B", 97)
            .with_player(3, "Cindara", &[])
            .build();
        let config = GameConfig::default();
        let mut rng = ScriptedRng::new().with_ranges([4]);
        let mut outbox = Outbox::new();
        let outcome = social_program(&mut world, &config, &mut rng, &mut outbox, 1, "B").unwrap();
        assert!(matches!(
            outcome,
            ActionOutcome::SocialProgram {
                prosperity_victory: true,
                ..
            }
        ));
        assert!(!outbox.is_empty());
        assert_eq!(
            social_program(&mut world, &config, &mut rng, &mut outbox, 1, "A"),
            Err(ActionError::RoundLimitReached("social programs"))
        );
    }

    #[test]
    fn test_bunker_levels_up_to_max() {
        let mut world = solo().with_budget(1, 100_000).with_actions(1, 10).build();
        let config = GameConfig::default();
        for (level, cost) in [(1u8, 2000i64), (2, 4000), (3, 6000)] {
            assert_eq!(
                build_bunker(&mut world, &config, 1, "A"),
                Ok(ActionOutcome::BunkerBuilt {
                    city: "A".into(),
                    cost,
                    level
                })
            );
        }
        assert!(matches!(
            build_bunker(&mut world, &config, 1, "A"),
            Err(ActionError::MaxLevelReached(_))
        ));
        assert_eq!(world.player(1).unwrap().budget, 88_000);
    }

    #[test]
    fn test_aid_is_capped_at_half() {
        let mut world = solo().build();
        let config = GameConfig::default();
        let mut outbox = Outbox::new();
        assert_eq!(
            send_aid(&mut world, &config, &mut outbox, 1, "Borealia", 10_001),
            Err(ActionError::InvalidAmount(10_001))
        );
        assert_eq!(
            send_aid(&mut world, &config, &mut outbox, 1, "Borealia", 0),
            Err(ActionError::InvalidAmount(0))
        );
        assert_eq!(
            send_aid(&mut world, &config, &mut outbox, 1, "Borealia", 10_000),
            Ok(ActionOutcome::AidSent {
                to: 2,
                amount: 10_000
            })
        );
        assert_eq!(world.player(2).unwrap().budget, 15_000);
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn test_surrender_eliminates() {
        let mut world = solo().build();
        let config = GameConfig::default();
        let mut outbox = Outbox::new();
        surrender(&mut world, &config, &mut outbox, 2).unwrap();
        let p = world.player(2).unwrap();
        assert!(p.eliminated);
        assert!(p.all_cities_destroyed());
        assert!(p.cities.values().all(|c| c.qol == 0 && c.income == 0));
        assert_eq!(outbox.into_notices()[0].recipient, config.admin_id);
        assert_eq!(
            surrender(&mut world, &config, &mut Outbox::new(), 2),
            Err(ActionError::NotInGame(2))
        );
    }

    #[test]
    fn test_overview_hides_budgets_without_espionage() {
        let world = solo().build();
        let views = country_overview(&world, 1);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].country, "Borealia");
        assert_eq!(views[0].budget, None);

        let world = solo().with_event(EventKind::GlobalEspionage, 1).build();
        assert_eq!(country_overview(&world, 1)[0].budget, Some(5000));
    }

    #[test]
    fn test_statistics_lists_own_cities() {
        let world = solo()
            .with_nickname(1, "Marta")
            .with_nukes(1, 2, 1)
            .with_shields(1, 3)
            .with_level(1, "B", 0)
            .with_bunker(1, "A", 2)
            .build();
        let stats = statistics(&world, 1).unwrap();
        assert_eq!(stats.display_name, "Marta (Atlantis)");
        assert_eq!(stats.budget, 20_000);
        assert_eq!((stats.ready_nukes, stats.pending_nukes), (2, 1));
        assert_eq!(stats.shields, 3);
        assert_eq!(stats.actions_left, 4);
        assert_eq!(
            stats.cities,
            vec![
                CityStats {
                    name: "A".into(),
                    level: 1,
                    income: 500,
                    qol: 35,
                    bunker_level: 2
                },
                CityStats {
                    name: "B".into(),
                    level: 0,
                    income: 0,
                    qol: 35,
                    bunker_level: 0
                },
            ]
        );
        let text = stats.to_string();
        assert!(text.contains("Nukes (ready/in production): 2/1"));
        assert!(text.contains("  - B: level 0, income $0, QoL 35%"));
    }

    #[test]
    fn test_statistics_needs_a_country() {
        let world = solo().eliminated(2).with_lobby_player(3).build();
        assert!(statistics(&world, 2).is_ok());
        assert_eq!(statistics(&world, 3), Err(ActionError::NotInGame(3)));
        assert_eq!(statistics(&world, 7), Err(ActionError::UnknownPlayer(7)));
    }
}
