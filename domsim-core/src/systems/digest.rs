//! Round newspaper built from the round event log.

use crate::state::{RoundEvent, WorldState};
use std::collections::BTreeMap;

/// Same-kind routine events at or above this count collapse into one line.
const SUMMARY_THRESHOLD: usize = 3;

fn is_headline(event: &RoundEvent) -> bool {
    matches!(
        event,
        RoundEvent::AttackSuccess { .. }
            | RoundEvent::AttackShielded { .. }
            | RoundEvent::CountryEliminated { .. }
            | RoundEvent::Surrendered { .. }
            | RoundEvent::CityLooted { .. }
            | RoundEvent::CityBurned { .. }
    )
}

fn kind_key(event: &RoundEvent) -> &'static str {
    match event {
        RoundEvent::NukeProduced { .. } => "nuke_produced",
        RoundEvent::ShieldBuilt { .. } => "shield_built",
        RoundEvent::BunkerBuilt { .. } => "bunker_built",
        RoundEvent::CityUpgraded { .. } => "city_upgraded",
        RoundEvent::SocialProgram { .. } => "social_program",
        RoundEvent::AidSent { .. } => "aid_sent",
        RoundEvent::EventStarted { .. } => "event_started",
        RoundEvent::EventSucceeded { .. } => "event_succeeded",
        RoundEvent::EventFailed { .. } => "event_failed",
        _ => "headline",
    }
}

fn headline(event: &RoundEvent) -> String {
    match event {
        RoundEvent::NukeProduced { country } => format!("{country} expands its nuclear arsenal."),
        RoundEvent::ShieldBuilt { country } => format!("{country} deploys a new missile shield."),
        RoundEvent::BunkerBuilt {
            country,
            city,
            level,
        } => format!("{country} digs a level {level} bunker under {city}."),
        RoundEvent::CityUpgraded {
            country,
            city,
            level,
        } => format!("{city} ({country}) grows to level {level}."),
        RoundEvent::SocialProgram { country, city } => {
            format!("{country} funds a social program in {city}.")
        }
        RoundEvent::AttackShielded {
            attacker,
            target,
            city,
        } => format!("{attacker} strikes {city} ({target}), but the shield holds!"),
        RoundEvent::AttackSuccess {
            attacker,
            target,
            city,
        } => format!("{attacker} wipes {city} ({target}) off the map!"),
        RoundEvent::CountryEliminated { country } => format!("{country} has fallen."),
        RoundEvent::Surrendered { country } => format!("{country} capitulates."),
        RoundEvent::CityLooted {
            attacker,
            target,
            city,
            amount,
        } => format!("{attacker} loots ${amount} from the ruins of {city} ({target})."),
        RoundEvent::CityBurned {
            attacker,
            target,
            city,
        } => format!("{attacker} burns {city} ({target}) to the ground."),
        RoundEvent::AidSent { from, to, amount } => format!("{from} sends ${amount} of aid to {to}."),
        RoundEvent::EventStarted { kind } => format!("The world braces for: {kind}."),
        RoundEvent::EventSucceeded { kind } => format!("{kind} resolved successfully."),
        RoundEvent::EventFailed { kind } => format!("{kind} ended in failure."),
    }
}

fn summary(key: &str, count: usize) -> String {
    match key {
        "nuke_produced" => format!("Arms race: {count} new warheads entered production."),
        "shield_built" => format!("Defense boom: {count} shields deployed worldwide."),
        "bunker_built" => format!("Bunker fever: {count} bunkers dug this round."),
        "city_upgraded" => format!("Construction boom: {count} cities grew."),
        "social_program" => format!("Welfare wave: {count} social programs launched."),
        "aid_sent" => format!("Generosity: {count} aid transfers made."),
        _ => format!("{count} notable events."),
    }
}

/// The round's headlines, or `None` if nothing happened.
///
/// Attacks and eliminations always get their own line. Routine events of one
/// kind collapse into a summary once they reach the threshold.
pub fn round_digest(world: &WorldState) -> Option<String> {
    if world.round_log.is_empty() {
        return None;
    }

    let mut lines: Vec<String> = world
        .round_log
        .iter()
        .filter(|e| is_headline(e))
        .map(|e| format!("! {}", headline(e)))
        .collect();

    let mut routine: BTreeMap<&'static str, Vec<&RoundEvent>> = BTreeMap::new();
    for event in world.round_log.iter().filter(|e| !is_headline(e)) {
        routine.entry(kind_key(event)).or_default().push(event);
    }
    for (key, events) in routine {
        if events.len() >= SUMMARY_THRESHOLD {
            lines.push(format!("* {}", summary(key, events.len())));
        } else {
            lines.extend(events.into_iter().map(|e| format!("- {}", headline(e))));
        }
    }

    Some(format!(
        "WORLD GAZETTE - round {} summary\n\n{}",
        world.round.current_round,
        lines.join("\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldStateBuilder;

    #[test]
    fn test_empty_log_has_no_digest() {
        assert!(round_digest(&WorldStateBuilder::new().build()).is_none());
    }

    #[test]
    fn test_headlines_first_and_summaries() {
        let mut world = WorldStateBuilder::new().build();
        for country in ["A", "B", "C"] {
            world.log(RoundEvent::ShieldBuilt {
                country: country.into(),
            });
        }
        world.log(RoundEvent::NukeProduced {
            country: "A".into(),
        });
        world.log(RoundEvent::AttackSuccess {
            attacker: "A".into(),
            target: "B".into(),
            city: "Port".into(),
        });

        let text = round_digest(&world).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "! A wipes Port (B) off the map!");
        assert!(text.contains("Defense boom: 3 shields"));
        assert!(text.contains("- A expands its nuclear arsenal."));
    }
}
