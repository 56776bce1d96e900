//! Builders and fake ports for tests.
//!
//! Everything random or time-dependent in the engine goes through a port, so
//! tests pin outcomes with [`ScriptedRng`] and [`ManualClock`] and observe
//! outbound text with [`RecordingNotifier`].

use crate::clock::Clock;
use crate::config::GameConfig;
use crate::events::EventKind;
use crate::notify::{Notice, Notifier, NotifyError, TextFormat};
use crate::rng::RandomSource;
use crate::state::{ActiveEvent, City, Player, PlayerId, TempEffect, WorldState};
use parking_lot::Mutex;
use std::collections::{BTreeSet, VecDeque};
use std::time::{Duration, SystemTime};

pub struct WorldStateBuilder {
    state: WorldState,
    config: GameConfig,
}

impl WorldStateBuilder {
    pub fn new() -> Self {
        Self {
            state: WorldState::default(),
            config: GameConfig::default(),
        }
    }

    pub fn round(mut self, round: u32) -> Self {
        self.state.round.current_round = round;
        self
    }

    /// A registered player without a country.
    pub fn with_lobby_player(mut self, id: PlayerId) -> Self {
        self.state
            .players
            .insert(id, Player::new(id, self.config.starting_budget));
        self
    }

    /// An active player owning level-1 cities at the starting QoL.
    pub fn with_player(mut self, id: PlayerId, country: &str, cities: &[&str]) -> Self {
        let mut player = Player::new(id, self.config.starting_budget);
        player.country = Some(country.to_string());
        player.actions_left = self.config.actions_per_round;
        for name in cities {
            player.cities.insert(
                name.to_string(),
                City::new(1, self.config.unit_income, self.config.starting_qol),
            );
        }
        self.state.players.insert(id, player);
        self
    }

    fn edit_player(mut self, id: PlayerId, f: impl FnOnce(&mut Player)) -> Self {
        if let Some(p) = self.state.players.get_mut(&id) {
            f(p);
        }
        self
    }

    fn edit_city(self, id: PlayerId, city: &str, f: impl FnOnce(&mut City)) -> Self {
        self.edit_player(id, |p| {
            if let Some(c) = p.cities.get_mut(city) {
                f(c);
            }
        })
    }

    pub fn with_budget(self, id: PlayerId, budget: i64) -> Self {
        self.edit_player(id, |p| p.budget = budget)
    }

    pub fn with_actions(self, id: PlayerId, actions: u32) -> Self {
        self.edit_player(id, |p| p.actions_left = actions)
    }

    pub fn with_nukes(self, id: PlayerId, ready: u32, pending: u32) -> Self {
        self.edit_player(id, |p| {
            p.ready_nukes = ready;
            p.pending_nukes = pending;
        })
    }

    pub fn with_shields(self, id: PlayerId, shields: u32) -> Self {
        self.edit_player(id, |p| p.shields = shields)
    }

    pub fn with_nickname(self, id: PlayerId, nickname: &str) -> Self {
        self.edit_player(id, |p| p.nickname = Some(nickname.to_string()))
    }

    pub fn with_income_modifier(self, id: PlayerId, modifier: f64) -> Self {
        self.edit_player(id, |p| p.income_modifier = modifier)
    }

    pub fn with_temp_effect(self, id: PlayerId, effect: TempEffect, rounds: u32) -> Self {
        self.edit_player(id, |p| {
            p.temp_effects.insert(effect, rounds);
        })
    }

    pub fn eliminated(self, id: PlayerId) -> Self {
        self.edit_player(id, |p| p.eliminated = true)
    }

    pub fn with_qol(self, id: PlayerId, city: &str, qol: u8) -> Self {
        self.edit_city(id, city, |c| c.qol = qol)
    }

    pub fn with_level(self, id: PlayerId, city: &str, level: u8) -> Self {
        let unit_income = self.config.unit_income;
        self.edit_city(id, city, |c| c.set_level(level, unit_income))
    }

    pub fn with_bunker(self, id: PlayerId, city: &str, level: u8) -> Self {
        self.edit_city(id, city, |c| c.bunker_level = level)
    }

    pub fn ruined(self, id: PlayerId, city: &str) -> Self {
        self.edit_city(id, city, |c| c.ruined = true)
    }

    pub fn with_event(mut self, kind: EventKind, rounds_left: i32) -> Self {
        self.state.active_event = Some(ActiveEvent::new(kind, rounds_left));
        self
    }

    pub fn with_cooldown(mut self, kind: EventKind, rounds: u32) -> Self {
        self.state.cooldowns.insert(kind, rounds);
        self
    }

    pub fn build(self) -> WorldState {
        self.state
    }
}

impl Default for WorldStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Randomness with scripted answers.
///
/// Each queue is consumed in order. Scripted ranges are clamped into the
/// requested bounds. Once a queue runs dry: ranges yield `min`, chances
/// yield `false`, picks yield `0`.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRng {
    ranges: VecDeque<i64>,
    chances: VecDeque<bool>,
    picks: VecDeque<usize>,
}

impl ScriptedRng {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ranges(mut self, values: impl IntoIterator<Item = i64>) -> Self {
        self.ranges.extend(values);
        self
    }

    pub fn with_chances(mut self, values: impl IntoIterator<Item = bool>) -> Self {
        self.chances.extend(values);
        self
    }

    pub fn with_picks(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(values);
        self
    }
}

impl RandomSource for ScriptedRng {
    fn range_inclusive(&mut self, min: i64, max: i64) -> i64 {
        match self.ranges.pop_front() {
            Some(v) if max >= min => v.clamp(min, max),
            _ => min,
        }
    }

    fn chance(&mut self, _p: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }

    fn weighted_index(&mut self, weights: &[u32]) -> usize {
        let pick = self.picks.pop_front().unwrap_or(0);
        pick.min(weights.len().saturating_sub(1))
    }
}

/// Records every notice it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.sent.lock().clone()
    }

    pub fn recipients(&self) -> Vec<PlayerId> {
        self.sent.lock().iter().map(|n| n.recipient).collect()
    }

    pub fn texts_for(&self, recipient: PlayerId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|n| n.recipient == recipient)
            .map(|n| n.text.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, recipient: PlayerId, text: &str, format: TextFormat) -> Result<(), NotifyError> {
        self.sent.lock().push(Notice {
            recipient,
            text: text.to_string(),
            format,
        });
        Ok(())
    }
}

/// Fails for selected recipients and records the rest.
#[derive(Debug, Default)]
pub struct FailingNotifier {
    failing: BTreeSet<PlayerId>,
    inner: RecordingNotifier,
}

impl FailingNotifier {
    pub fn failing_for(ids: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            failing: ids.into_iter().collect(),
            inner: RecordingNotifier::new(),
        }
    }

    pub fn inner(&self) -> &RecordingNotifier {
        &self.inner
    }
}

impl Notifier for FailingNotifier {
    fn send(&self, recipient: PlayerId, text: &str, format: TextFormat) -> Result<(), NotifyError> {
        if self.failing.contains(&recipient) {
            return Err(NotifyError::Unreachable(recipient));
        }
        self.inner.send(recipient, text, format)
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let state = WorldStateBuilder::default()
            .with_player(1, "Atlantis", &["A", "B"])
            .with_lobby_player(2)
            .with_level(1, "B", 3)
            .build();

        let p1 = state.player(1).unwrap();
        assert!(p1.is_active());
        assert_eq!(p1.cities["B"].income, 1500);
        assert!(!state.player(2).unwrap().is_active());
    }

    #[test]
    fn test_scripted_rng_clamps_and_drains() {
        let mut rng = ScriptedRng::new().with_ranges([99, -4]);
        assert_eq!(rng.range_inclusive(1, 5), 5);
        assert_eq!(rng.range_inclusive(1, 5), 1);
        assert_eq!(rng.range_inclusive(3, 7), 3);
        assert!(!rng.chance(1.0));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::default();
        let t0 = clock.now();
        clock.advance(Duration::from_secs(60));
        assert_eq!(clock.now().duration_since(t0).unwrap(), Duration::from_secs(60));
    }
}
