//! Shift events change the rules for one round and need no interaction.

use super::{EventCategory, EventKind, GlobalEvent};

pub struct SolarFlare;

impl GlobalEvent for SolarFlare {
    fn kind(&self) -> EventKind {
        EventKind::SolarFlare
    }
    fn name(&self) -> &'static str {
        "Solar Flare"
    }
    fn category(&self) -> EventCategory {
        EventCategory::Shift
    }
    fn duration(&self) -> i32 {
        1
    }
    fn shields_ignored(&self) -> bool {
        true
    }
    fn start_message(&self) -> String {
        "COSMIC ANOMALY! A coronal mass ejection hit the planet. All shields in the world \
         are offline this round!"
            .to_string()
    }
}

pub struct GlobalEspionage;

impl GlobalEvent for GlobalEspionage {
    fn kind(&self) -> EventKind {
        EventKind::GlobalEspionage
    }
    fn name(&self) -> &'static str {
        "Global Espionage"
    }
    fn category(&self) -> EventCategory {
        EventCategory::Shift
    }
    fn duration(&self) -> i32 {
        1
    }
    fn budgets_visible(&self) -> bool {
        true
    }
    fn start_message(&self) -> String {
        "TOTAL SURVEILLANCE! Financial data of every power leaked. This round every \
         budget is visible in the country overview!"
            .to_string()
    }
}
