use crate::state::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// One bunker level: what it costs and how it protects the city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BunkerTier {
    /// Cost to build this level (from the level below).
    pub cost: i64,
    /// QoL the city is pinned to after a direct hit.
    pub qol_floor: u8,
    /// Fraction of the panic penalty removed when a shield stops an attack.
    pub panic_reduction: f64,
}

/// Inclusive range of QoL points for randomized deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QolRange {
    pub min: u8,
    pub max: u8,
}

impl QolRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }
}

/// Game balance and round configuration.
///
/// Every tunable constant of the engine lives here. Missing JSON fields fall
/// back to [`GameConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// The single administrator identity.
    pub admin_id: PlayerId,
    /// Advisory round length used for the round timer.
    pub round_duration_secs: u64,
    pub actions_per_round: u32,
    /// Round that grants `bonus_round_actions` instead of `actions_per_round`.
    pub bonus_round: u32,
    pub bonus_round_actions: u32,

    pub starting_budget: i64,
    pub starting_qol: u8,
    /// Income per city level.
    pub unit_income: i64,
    pub max_city_level: u8,
    /// Bunker levels 1..=N, index 0 is level 1.
    pub bunker_tiers: Vec<BunkerTier>,

    /// Maximum shields a player may hold at once.
    pub max_shields: u32,
    pub max_shields_per_round: u32,
    pub max_upgrades_per_round: u32,
    pub max_social_programs_per_round: u32,

    pub nuke_cost: i64,
    pub shield_cost: i64,
    pub social_program_cost: i64,
    pub upgrade_base_cost: i64,
    pub upgrade_cost_increase: i64,
    /// Largest share of the sender's budget that one aid transfer may move.
    pub max_aid_fraction: f64,
    pub max_nickname_len: usize,
    /// How long an administrator ban on calling them lasts.
    pub admin_call_ban_secs: u64,

    /// Probability that a new event starts on a round without an active one.
    pub event_chance: f64,
    pub event_cooldown_rounds: u32,

    /// Share of the target's budget taken by a loot choice.
    pub loot_fraction: f64,
    pub shield_panic_main: QolRange,
    pub shield_panic_other: QolRange,
    /// QoL a city without bunker is left with after a direct hit.
    pub direct_hit_qol: QolRange,
    pub loot_qol_penalty: QolRange,

    /// Country name -> city names.
    pub countries: BTreeMap<String, Vec<String>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut countries = BTreeMap::new();
        for (country, cities) in [
            ("Atlantis", ["Poseidonia", "Coralis", "Tidehaven"]),
            ("Borealia", ["Frostholm", "Icevale", "Northwatch"]),
            ("Cindara", ["Emberfall", "Ashport", "Kilnmouth"]),
            ("Dunmark", ["Sandmere", "Oasis Gate", "Dune Hollow"]),
            ("Eldoria", ["Silverleaf", "Mistwood", "Glenhart"]),
        ] {
            countries.insert(
                country.to_string(),
                cities.iter().map(|c| c.to_string()).collect(),
            );
        }

        Self {
            admin_id: 0,
            round_duration_secs: 900,
            actions_per_round: 4,
            bonus_round: 10,
            bonus_round_actions: 5,
            starting_budget: 5000,
            starting_qol: 35,
            unit_income: 500,
            max_city_level: 5,
            bunker_tiers: vec![
                BunkerTier {
                    cost: 2000,
                    qol_floor: 10,
                    panic_reduction: 0.25,
                },
                BunkerTier {
                    cost: 4000,
                    qol_floor: 20,
                    panic_reduction: 0.5,
                },
                BunkerTier {
                    cost: 6000,
                    qol_floor: 30,
                    panic_reduction: 0.75,
                },
            ],
            max_shields: 5,
            max_shields_per_round: 1,
            max_upgrades_per_round: 2,
            max_social_programs_per_round: 1,
            nuke_cost: 3000,
            shield_cost: 2000,
            social_program_cost: 1000,
            upgrade_base_cost: 1500,
            upgrade_cost_increase: 500,
            max_aid_fraction: 0.5,
            max_nickname_len: 15,
            admin_call_ban_secs: 120,
            event_chance: 0.33,
            event_cooldown_rounds: 3,
            loot_fraction: 0.25,
            shield_panic_main: QolRange::new(10, 15),
            shield_panic_other: QolRange::new(1, 3),
            direct_hit_qol: QolRange::new(1, 5),
            loot_qol_penalty: QolRange::new(5, 10),
            countries,
        }
    }
}

impl GameConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn max_bunker_level(&self) -> u8 {
        self.bunker_tiers.len().min(u8::MAX as usize) as u8
    }

    /// Bunker tier for a built level (1-based). Level 0 has no tier.
    pub fn bunker_tier(&self, level: u8) -> Option<&BunkerTier> {
        if level == 0 {
            return None;
        }
        self.bunker_tiers.get(level as usize - 1)
    }

    /// Actions granted at the start of `round`.
    pub fn actions_for_round(&self, round: u32) -> u32 {
        if round == self.bonus_round {
            self.bonus_round_actions
        } else {
            self.actions_per_round
        }
    }

    pub fn upgrade_cost(&self, level: u8) -> i64 {
        self.upgrade_base_cost + i64::from(level) * self.upgrade_cost_increase
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.countries.is_empty() {
            return Err(ConfigError::Invalid("country roster is empty".into()));
        }
        if let Some((name, _)) = self.countries.iter().find(|(_, cities)| cities.is_empty()) {
            return Err(ConfigError::Invalid(format!("country {name} has no cities")));
        }
        if !(0.0..=1.0).contains(&self.event_chance) {
            return Err(ConfigError::Invalid(format!(
                "event_chance {} outside [0, 1]",
                self.event_chance
            )));
        }
        for (name, fraction) in [
            ("loot_fraction", self.loot_fraction),
            ("max_aid_fraction", self.max_aid_fraction),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(ConfigError::Invalid(format!(
                    "{name} {fraction} outside [0, 1]"
                )));
            }
        }
        if self.starting_qol > 100 {
            return Err(ConfigError::Invalid("starting_qol above 100".into()));
        }
        if self.max_city_level == 0 {
            return Err(ConfigError::Invalid("max_city_level must be positive".into()));
        }
        for tier in &self.bunker_tiers {
            if tier.qol_floor > 100 || !(0.0..=1.0).contains(&tier.panic_reduction) {
                return Err(ConfigError::Invalid(format!("bad bunker tier {tier:?}")));
            }
        }
        for (name, range) in [
            ("shield_panic_main", self.shield_panic_main),
            ("shield_panic_other", self.shield_panic_other),
            ("direct_hit_qol", self.direct_hit_qol),
            ("loot_qol_penalty", self.loot_qol_penalty),
        ] {
            if range.min > range.max || range.max > 100 {
                return Err(ConfigError::Invalid(format!("{name} range {range:?}")));
            }
        }
        Ok(())
    }
}
