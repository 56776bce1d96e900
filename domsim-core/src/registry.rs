//! Player registry: joining, picking a country, nicknames, full reset.

use crate::config::GameConfig;
use crate::error::ActionError;
use crate::state::{City, Player, PlayerId, WorldState};

/// Register `id` if unknown. Returns the (possibly existing) player.
pub fn register<'w>(world: &'w mut WorldState, config: &GameConfig, id: PlayerId) -> &'w Player {
    world.players.entry(id).or_insert_with(|| {
        log::debug!("Registered player {}", id);
        let mut player = Player::new(id, config.starting_budget);
        player.actions_left = config.actions_per_round;
        player
    })
}

/// Countries from the roster nobody has picked yet.
pub fn available_countries(world: &WorldState, config: &GameConfig) -> Vec<String> {
    config
        .countries
        .keys()
        .filter(|name| world.player_by_country(name).is_none())
        .cloned()
        .collect()
}

pub fn assign_country(
    world: &mut WorldState,
    config: &GameConfig,
    id: PlayerId,
    country: &str,
) -> Result<(), ActionError> {
    let player = world.player(id).ok_or(ActionError::UnknownPlayer(id))?;
    if player.country.is_some() {
        return Err(ActionError::AlreadyHasCountry(id));
    }
    let cities = config
        .countries
        .get(country)
        .ok_or_else(|| ActionError::UnknownCountry(country.to_string()))?;
    if world.player_by_country(country).is_some() {
        return Err(ActionError::CountryTaken(country.to_string()));
    }

    let cities = cities
        .iter()
        .map(|name| {
            (
                name.clone(),
                City::new(1, config.unit_income, config.starting_qol),
            )
        })
        .collect();
    if let Some(player) = world.player_mut(id) {
        player.country = Some(country.to_string());
        player.cities = cities;
    }
    log::info!("Player {} now governs {}", id, country);
    Ok(())
}

pub fn set_nickname(
    world: &mut WorldState,
    config: &GameConfig,
    id: PlayerId,
    nickname: &str,
) -> Result<(), ActionError> {
    let nickname = nickname.trim();
    if nickname.is_empty() || nickname.chars().count() > config.max_nickname_len {
        return Err(ActionError::InvalidNickname(nickname.to_string()));
    }
    let player = world
        .player_mut(id)
        .ok_or(ActionError::UnknownPlayer(id))?;
    player.nickname = Some(nickname.to_string());
    Ok(())
}

/// Wipe the session, keeping only the administrator's entry.
pub fn reset_all(world: &mut WorldState, admin_id: PlayerId) {
    let admin = world.players.remove(&admin_id);
    *world = WorldState::default();
    if let Some(admin) = admin {
        world.players.insert(admin_id, admin);
    }
    log::info!("Game reset");
}

pub fn active_players(world: &WorldState) -> Vec<&Player> {
    world.active_players().collect()
}

pub fn by_country<'w>(world: &'w WorldState, country: &str) -> Option<&'w Player> {
    world.player_by_country(country)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::testing::WorldStateBuilder;

    #[test]
    fn test_register_is_idempotent() {
        let mut world = WorldState::default();
        let config = GameConfig::default();
        register(&mut world, &config, 7);
        world.player_mut(7).unwrap().budget = 1;
        let again = register(&mut world, &config, 7);
        assert_eq!(again.budget, 1);
        assert_eq!(world.players.len(), 1);
    }

    #[test]
    fn test_assign_country_creates_cities() {
        let mut world = WorldState::default();
        let config = GameConfig::default();
        register(&mut world, &config, 1);
        assign_country(&mut world, &config, 1, "Atlantis").unwrap();

        let p = world.player(1).unwrap();
        assert!(p.is_active());
        assert_eq!(p.cities.len(), config.countries["Atlantis"].len());
        for city in p.cities.values() {
            assert_eq!(city.level, 1);
            assert_eq!(city.income, 500);
            assert_eq!(city.qol, 35);
            assert_eq!(city.bunker_level, 0);
        }
        assert!(!available_countries(&world, &config).contains(&"Atlantis".to_string()));
    }

    #[test]
    fn test_assign_country_rejections() {
        let mut world = WorldState::default();
        let config = GameConfig::default();
        register(&mut world, &config, 1);
        register(&mut world, &config, 2);
        assign_country(&mut world, &config, 1, "Atlantis").unwrap();

        assert_eq!(
            assign_country(&mut world, &config, 2, "Atlantis"),
            Err(ActionError::CountryTaken("Atlantis".into()))
        );
        assert_eq!(
            assign_country(&mut world, &config, 2, "Lemuria"),
            Err(ActionError::UnknownCountry("Lemuria".into()))
        );
        assert_eq!(
            assign_country(&mut world, &config, 1, "Borealia"),
            Err(ActionError::AlreadyHasCountry(1))
        );
        assert_eq!(
            assign_country(&mut world, &config, 3, "Borealia"),
            Err(ActionError::UnknownPlayer(3))
        );
    }

    #[test]
    fn test_nickname_rules() {
        let mut world = WorldState::default();
        let config = GameConfig::default();
        register(&mut world, &config, 1);
        assert!(set_nickname(&mut world, &config, 1, "   ").is_err());
        assert!(set_nickname(&mut world, &config, 1, "abcdefghijklmnop").is_err());
        set_nickname(&mut world, &config, 1, " Vlad ").unwrap();
        assert_eq!(world.player(1).unwrap().nickname.as_deref(), Some("Vlad"));
    }

    #[test]
    fn test_reset_keeps_only_admin() {
        let mut world = WorldStateBuilder::new()
            .with_player(0, "Atlantis", &["A"])
            .with_player(1, "Borealia", &["B"])
            .with_event(EventKind::Pandemic, 2)
            .with_cooldown(EventKind::Pandemic, 3)
            .round(7)
            .build();
        reset_all(&mut world, 0);

        assert_eq!(world.players.len(), 1);
        assert!(world.player(0).is_some());
        assert_eq!(world.round.current_round, 1);
        assert!(world.round.round_end.is_none());
        assert!(world.active_event.is_none());
        assert!(world.cooldowns.is_empty());
    }

    #[test]
    fn test_lookup_by_country() {
        let world = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["A"])
            .with_player(2, "Borealia", &["B"])
            .eliminated(2)
            .build();
        assert_eq!(by_country(&world, "Borealia").map(|p| p.id), Some(2));
        assert_eq!(active_players(&world).len(), 1);
    }
}
