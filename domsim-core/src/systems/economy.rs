use crate::state::{City, Player, TempEffect, WorldState};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Income multiplier for a city's quality of life.
///
/// Flat +30% from 90 and +20% from 80, a smooth bonus above 50 and a smooth
/// penalty below it. Ruined cities keep only half of any bonus; penalties
/// apply in full.
pub fn qol_multiplier(qol: u8, ruined: bool) -> f64 {
    let q = f64::from(qol.min(100));
    let base = if qol >= 90 {
        1.30
    } else if qol >= 80 {
        1.20
    } else if qol > 50 {
        1.0 + (q - 50.0) / 100.0 * 0.5
    } else if qol < 50 {
        1.0 - (50.0 - q) / 100.0
    } else {
        1.0
    };

    if ruined && base > 1.0 {
        1.0 + (base - 1.0) / 2.0
    } else {
        base
    }
}

/// Multipliers that stack on top of a city's base income.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeModifiers {
    /// 1 + the active event's income modifier.
    pub global: f64,
    /// The player's permanent modifier.
    pub permanent: f64,
    /// 0.5 under recession, otherwise 1.
    pub temp: f64,
}

impl Default for IncomeModifiers {
    fn default() -> Self {
        Self {
            global: 1.0,
            permanent: 1.0,
            temp: 1.0,
        }
    }
}

impl IncomeModifiers {
    pub fn for_player(world: &WorldState, player: &Player) -> Self {
        let global = world
            .active_event
            .as_ref()
            .map(|e| 1.0 + e.kind.behaviour().income_modifier())
            .unwrap_or(1.0);
        let temp = if player.has_effect(TempEffect::Recession) {
            0.5
        } else {
            1.0
        };
        Self {
            global,
            permanent: player.income_modifier,
            temp,
        }
    }

    pub fn product(&self) -> f64 {
        self.global * self.permanent * self.temp
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityIncome {
    pub city: String,
    pub base: i64,
    pub final_income: i64,
    /// Combined modifier as a whole percent, truncated towards zero.
    pub percent_delta: i64,
}

/// Income of one city after every modifier.
pub fn city_income(name: &str, city: &City, modifiers: &IncomeModifiers) -> CityIncome {
    let total = modifiers.product() * qol_multiplier(city.qol, city.ruined);
    let final_income = (city.income as f64 * total).floor() as i64;
    let percent_delta = ((total - 1.0) * 100.0).trunc() as i64;
    CityIncome {
        city: name.to_string(),
        base: city.income,
        final_income,
        percent_delta,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub cities: Vec<CityIncome>,
    pub total: i64,
}

impl IncomeBreakdown {
    /// Multi-line summary for the round-start notice.
    pub fn describe(&self) -> String {
        let mut out = format!("Income: ${}", self.total);
        for line in &self.cities {
            match line.percent_delta {
                0 => out.push_str(&format!("\n  - {}: ${}", line.city, line.base)),
                d => out.push_str(&format!(
                    "\n  - {}: ${} ({:+}%) -> ${}",
                    line.city, line.base, d, line.final_income
                )),
            }
        }
        out
    }
}

/// Income a player would collect right now. Pure.
#[instrument(skip_all, name = "player_income")]
pub fn player_income(world: &WorldState, player: &Player) -> IncomeBreakdown {
    let modifiers = IncomeModifiers::for_player(world, player);
    let cities: Vec<CityIncome> = player
        .cities
        .iter()
        .map(|(name, city)| city_income(name, city, &modifiers))
        .collect();
    let total = cities.iter().map(|c| c.final_income).sum();
    IncomeBreakdown { cities, total }
}
