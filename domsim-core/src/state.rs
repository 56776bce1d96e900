use crate::events::EventKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

pub type PlayerId = u64;
pub type CountryName = String;
pub type CityName = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// 0 means destroyed.
    pub level: u8,
    /// Always `level * unit_income` while the city stands, 0 once destroyed.
    pub income: i64,
    pub qol: u8,
    pub bunker_level: u8,
    /// Burned after a direct hit: QoL bonuses are halved for good.
    pub ruined: bool,
}

impl City {
    pub fn new(level: u8, unit_income: i64, qol: u8) -> Self {
        Self {
            level,
            income: i64::from(level) * unit_income,
            qol: qol.min(100),
            bunker_level: 0,
            ruined: false,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.level == 0
    }

    /// Change the level and keep income in sync.
    pub fn set_level(&mut self, level: u8, unit_income: i64) {
        self.level = level;
        self.income = if level > 0 {
            i64::from(level) * unit_income
        } else {
            0
        };
    }

    /// Apply a signed QoL delta, clamped to 0..=100.
    pub fn adjust_qol(&mut self, delta: i32) {
        self.qol = (i32::from(self.qol) + delta).clamp(0, 100) as u8;
    }
}

/// Time-limited per-player effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempEffect {
    /// Halves income.
    Recession,
    /// Doubles nuke and shield costs.
    MilitarySurcharge,
}

impl TempEffect {
    pub fn label(&self) -> &'static str {
        match self {
            TempEffect::Recession => "Recession",
            TempEffect::MilitarySurcharge => "Military surcharge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub country: Option<CountryName>,
    pub nickname: Option<String>,
    /// Not clamped; events and aid may drive it anywhere.
    pub budget: i64,
    pub cities: BTreeMap<CityName, City>,
    pub ready_nukes: u32,
    /// Produced this round, usable from the next one.
    pub pending_nukes: u32,
    pub shields: u32,
    pub actions_left: u32,
    /// Permanent multiplicative income modifier.
    pub income_modifier: f64,
    /// Effect -> rounds remaining.
    pub temp_effects: BTreeMap<TempEffect, u32>,
    pub attacked_this_round: BTreeSet<CountryName>,
    pub shields_built_this_round: u32,
    pub upgrades_this_round: u32,
    pub social_programs_this_round: u32,
    /// Extra actions granted for the next round only.
    pub bonus_actions_next_round: u32,
    pub eliminated: bool,
    pub ready: bool,
}

impl Player {
    pub fn new(id: PlayerId, starting_budget: i64) -> Self {
        Self {
            id,
            country: None,
            nickname: None,
            budget: starting_budget,
            cities: BTreeMap::new(),
            ready_nukes: 0,
            pending_nukes: 0,
            shields: 0,
            actions_left: 0,
            income_modifier: 1.0,
            temp_effects: BTreeMap::new(),
            attacked_this_round: BTreeSet::new(),
            shields_built_this_round: 0,
            upgrades_this_round: 0,
            social_programs_this_round: 0,
            bonus_actions_next_round: 0,
            eliminated: false,
            ready: false,
        }
    }

    /// Holds a country and has not been eliminated.
    pub fn is_active(&self) -> bool {
        self.country.is_some() && !self.eliminated
    }

    pub fn has_effect(&self, effect: TempEffect) -> bool {
        self.temp_effects.get(&effect).is_some_and(|&left| left > 0)
    }

    /// Name shown to other players.
    pub fn display_name(&self) -> String {
        match (&self.nickname, &self.country) {
            (Some(nick), Some(country)) => format!("{nick} ({country})"),
            (None, Some(country)) => country.clone(),
            (Some(nick), None) => nick.clone(),
            (None, None) => format!("player {}", self.id),
        }
    }

    pub fn all_cities_destroyed(&self) -> bool {
        !self.cities.is_empty() && self.cities.values().all(City::is_destroyed)
    }

    /// Marks the player eliminated once every city is destroyed.
    /// Returns `true` only on the transition.
    pub fn check_elimination(&mut self) -> bool {
        if !self.eliminated && self.all_cities_destroyed() {
            self.eliminated = true;
            return true;
        }
        false
    }

    pub fn reset_round_counters(&mut self) {
        self.attacked_this_round.clear();
        self.shields_built_this_round = 0;
        self.upgrades_this_round = 0;
        self.social_programs_this_round = 0;
        self.ready = false;
    }

    /// Average QoL over standing and destroyed cities alike.
    pub fn average_qol(&self) -> Option<f64> {
        if self.cities.is_empty() {
            return None;
        }
        let sum: u32 = self.cities.values().map(|c| u32::from(c.qol)).sum();
        Some(f64::from(sum) / self.cities.len() as f64)
    }
}

/// The single running global event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub kind: EventKind,
    /// Shared fund progress for crisis events.
    pub progress: i64,
    pub rounds_left: i32,
    /// Per-investor totals (TechBreakthrough).
    pub investors: BTreeMap<PlayerId, i64>,
}

impl ActiveEvent {
    pub fn new(kind: EventKind, rounds_left: i32) -> Self {
        Self {
            kind,
            progress: 0,
            rounds_left,
            investors: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub current_round: u32,
    /// `None` until the game is started and after the end notice fires.
    pub round_end: Option<SystemTime>,
    pub notified_5min: bool,
    pub notified_3min: bool,
    pub notified_1min: bool,
    pub notified_end: bool,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            current_round: 1,
            round_end: None,
            notified_5min: false,
            notified_3min: false,
            notified_1min: false,
            notified_end: false,
        }
    }
}

impl RoundState {
    pub fn reset_flags(&mut self) {
        self.notified_5min = false;
        self.notified_3min = false;
        self.notified_1min = false;
        self.notified_end = false;
    }
}

/// Notable things that happened this round.
///
/// Serialized with an internal tag, e.g.
/// `{"type":"attack_shielded","attacker":"Atlantis","target":"Borealia"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    NukeProduced { country: CountryName },
    ShieldBuilt { country: CountryName },
    BunkerBuilt { country: CountryName, city: CityName, level: u8 },
    CityUpgraded { country: CountryName, city: CityName, level: u8 },
    SocialProgram { country: CountryName, city: CityName },
    AttackShielded { attacker: CountryName, target: CountryName, city: CityName },
    AttackSuccess { attacker: CountryName, target: CountryName, city: CityName },
    CountryEliminated { country: CountryName },
    Surrendered { country: CountryName },
    CityLooted { attacker: CountryName, target: CountryName, city: CityName, amount: i64 },
    CityBurned { attacker: CountryName, target: CountryName, city: CityName },
    AidSent { from: CountryName, to: CountryName, amount: i64 },
    EventStarted { kind: EventKind },
    EventSucceeded { kind: EventKind },
    EventFailed { kind: EventKind },
}

/// Complete session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub players: BTreeMap<PlayerId, Player>,
    pub active_event: Option<ActiveEvent>,
    /// Event kind -> rounds until it may be selected again.
    pub cooldowns: BTreeMap<EventKind, u32>,
    pub round: RoundState,
    pub round_log: Vec<RoundEvent>,
}

impl WorldState {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.is_active())
    }

    pub fn active_ids(&self) -> Vec<PlayerId> {
        self.active_players().map(|p| p.id).collect()
    }

    /// Owner of a country, eliminated or not.
    pub fn player_by_country(&self, country: &str) -> Option<&Player> {
        self.players
            .values()
            .find(|p| p.country.as_deref() == Some(country))
    }

    pub fn country_of(&self, id: PlayerId) -> Option<&str> {
        self.players.get(&id).and_then(|p| p.country.as_deref())
    }

    pub fn on_cooldown(&self, kind: EventKind) -> bool {
        self.cooldowns.get(&kind).is_some_and(|&left| left > 0)
    }

    pub fn log(&mut self, event: RoundEvent) {
        self.round_log.push(event);
    }

    /// Computes a deterministic checksum of the world.
    ///
    /// Maps are ordered, so iteration is stable. Floats hash by bit pattern.
    pub fn checksum(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();

        self.round.current_round.hash(&mut hasher);

        for (id, p) in &self.players {
            id.hash(&mut hasher);
            p.country.hash(&mut hasher);
            p.budget.hash(&mut hasher);
            p.ready_nukes.hash(&mut hasher);
            p.pending_nukes.hash(&mut hasher);
            p.shields.hash(&mut hasher);
            p.actions_left.hash(&mut hasher);
            p.income_modifier.to_bits().hash(&mut hasher);
            p.temp_effects.hash(&mut hasher);
            p.eliminated.hash(&mut hasher);
            for (name, c) in &p.cities {
                name.hash(&mut hasher);
                c.level.hash(&mut hasher);
                c.income.hash(&mut hasher);
                c.qol.hash(&mut hasher);
                c.bunker_level.hash(&mut hasher);
                c.ruined.hash(&mut hasher);
            }
        }

        if let Some(event) = &self.active_event {
            event.kind.hash(&mut hasher);
            event.progress.hash(&mut hasher);
            event.rounds_left.hash(&mut hasher);
            event.investors.hash(&mut hasher);
        }
        self.cooldowns.hash(&mut hasher);

        hasher.finish()
    }
}
