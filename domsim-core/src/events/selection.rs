//! Situation-aware weighted choice of the next global event.

use super::EventKind;
use crate::rng::RandomSource;
use crate::state::WorldState;

const BASE_WEIGHT: u32 = 10;
/// Average QoL assumed when no active player has a city.
const DEFAULT_AVG_QOL: f64 = 70.0;

/// Aggregate signals the weights react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSignals {
    /// Ready plus pending nukes of active players.
    pub total_nukes: u32,
    /// Mean QoL over every city of active players.
    pub avg_qol: f64,
}

impl Default for WorldSignals {
    fn default() -> Self {
        Self {
            total_nukes: 0,
            avg_qol: DEFAULT_AVG_QOL,
        }
    }
}

pub fn analyze_world(world: &WorldState) -> WorldSignals {
    let mut total_nukes = 0u32;
    let mut qol_sum = 0u64;
    let mut cities = 0u64;

    for p in world.active_players() {
        total_nukes += p.ready_nukes + p.pending_nukes;
        for city in p.cities.values() {
            qol_sum += u64::from(city.qol);
            cities += 1;
        }
    }

    let avg_qol = if cities > 0 {
        qol_sum as f64 / cities as f64
    } else {
        DEFAULT_AVG_QOL
    };
    WorldSignals {
        total_nukes,
        avg_qol,
    }
}

/// Selection weight of one kind. Never below 1.
pub fn event_weight(kind: EventKind, signals: &WorldSignals) -> u32 {
    let WorldSignals {
        total_nukes,
        avg_qol,
    } = *signals;
    let mut weight = BASE_WEIGHT;

    match kind {
        EventKind::Pandemic => {
            if avg_qol < 40.0 {
                weight += 50;
            }
            if avg_qol > 80.0 {
                weight = 1;
            }
        }
        EventKind::EnergyCrisis => {
            if total_nukes > 5 {
                weight += 60;
            }
            if total_nukes == 0 {
                weight = 1;
            }
        }
        EventKind::TechBreakthrough => {
            if avg_qol > 75.0 {
                weight += 40;
            }
            if total_nukes > 3 {
                weight = 1;
            }
        }
        EventKind::BlackMarket => {
            if total_nukes > 0 {
                weight += 20;
            }
            if avg_qol < 50.0 {
                weight += 20;
            }
        }
        EventKind::SolarFlare => weight = 5,
        EventKind::GlobalEspionage => {
            if total_nukes > 2 {
                weight += 30;
            }
        }
    }

    weight.max(1)
}

/// Pick one of the kinds that are off cooldown, or `None` if all are cooling.
#[tracing::instrument(skip_all, name = "pick_event")]
pub fn pick_event(world: &WorldState, rng: &mut dyn RandomSource) -> Option<EventKind> {
    let available: Vec<EventKind> = EventKind::ALL
        .into_iter()
        .filter(|&kind| !world.on_cooldown(kind))
        .collect();
    if available.is_empty() {
        return None;
    }

    let signals = analyze_world(world);
    let weights: Vec<u32> = available
        .iter()
        .map(|&kind| event_weight(kind, &signals))
        .collect();
    log::debug!(
        "Event weights (nukes={}, avg_qol={:.1}): {:?}",
        signals.total_nukes,
        signals.avg_qol,
        available.iter().zip(&weights).collect::<Vec<_>>()
    );

    let index = rng.weighted_index(&weights);
    available.get(index).copied()
}
