//! Session facade: one world, one lock, ports for time, randomness and text.
//!
//! Every operation takes the session lock, mutates the world while collecting
//! notices in an [`Outbox`], releases the lock and only then delivers. Round
//! advance additionally holds an exclusive flag so overlapping calls return
//! [`AdvanceOutcome::Busy`] instead of queueing.

use crate::clock::{Clock, SystemClock};
use crate::config::GameConfig;
use crate::error::ActionError;
use crate::events::{self, EventContext, EventKind, Interaction, InteractionOutcome};
use crate::notify::{self, Notifier, Outbox};
use crate::registry;
use crate::rng::{RandomSource, SeededRng};
use crate::round::{self, RoundReport};
use crate::state::{ActiveEvent, Player, PlayerId, WorldState};
use crate::systems::actions::{self, ActionOutcome, CountryView, Statistics};
use crate::systems::combat::{self, AttackOutcome, PendingPostHit, PostHitChoice, PostHitOutcome};
use crate::systems::digest::round_digest;
use crate::systems::diplomacy::{self, AdminCallReply, CallBans, NegotiationReply, OpenProposals};
use crate::systems::economy::{player_income, IncomeBreakdown};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Result of [`Engine::advance_round`].
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Advanced(RoundReport),
    /// Another advance is still running; nothing changed.
    Busy,
}

/// External collaborators the engine talks to.
pub struct Ports {
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub rng: Box<dyn RandomSource + Send>,
}

impl Ports {
    /// Wall clock and an entropy-seeded RNG.
    pub fn system(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            clock: Arc::new(SystemClock),
            rng: Box::new(SeededRng::from_entropy()),
        }
    }
}

struct Session {
    world: WorldState,
    rng: Box<dyn RandomSource + Send>,
    /// Direct hits awaiting loot-or-burn, keyed by attacker.
    pending: BTreeMap<PlayerId, PendingPostHit>,
    proposals: OpenProposals,
    call_bans: CallBans,
}

/// Clears the advance flag on every exit path.
struct AdvanceGuard<'a>(&'a AtomicBool);

impl Drop for AdvanceGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Engine {
    config: GameConfig,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    session: Mutex<Session>,
    advancing: AtomicBool,
}

impl Engine {
    pub fn new(config: GameConfig, ports: Ports) -> Self {
        Self::from_world(config, WorldState::default(), ports)
    }

    /// Resume from an existing world, e.g. one built in a test.
    pub fn from_world(config: GameConfig, world: WorldState, ports: Ports) -> Self {
        Self {
            config,
            notifier: ports.notifier,
            clock: ports.clock,
            session: Mutex::new(Session {
                world,
                rng: ports.rng,
                pending: BTreeMap::new(),
                proposals: OpenProposals::new(),
                call_bans: CallBans::new(),
            }),
            advancing: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Run `f` under the session lock, then deliver what it queued.
    fn with_session<T>(&self, f: impl FnOnce(&mut Session, &mut Outbox) -> T) -> T {
        let mut outbox = Outbox::new();
        let result = {
            let mut session = self.session.lock();
            f(&mut session, &mut outbox)
        };
        if !outbox.is_empty() {
            notify::deliver(self.notifier.as_ref(), outbox.into_notices());
        }
        result
    }

    fn with_event_context<T>(&self, f: impl FnOnce(&mut EventContext<'_>) -> T) -> T {
        self.with_session(|s, outbox| {
            let mut ctx = EventContext {
                world: &mut s.world,
                config: &self.config,
                rng: &mut *s.rng,
                outbox,
            };
            f(&mut ctx)
        })
    }

    // ---- Rounds ----

    /// Open round 1's timer.
    pub fn start_game(&self) -> Result<(), ActionError> {
        let now = self.clock.now();
        self.with_session(|s, outbox| {
            let world = &mut s.world;
            if world.round.round_end.is_some() {
                return Err(ActionError::GameAlreadyRunning);
            }
            world.round.round_end = Some(now + Duration::from_secs(self.config.round_duration_secs));
            world.round.reset_flags();
            let round = world.round.current_round;
            let minutes = self.config.round_duration_secs / 60;
            let admin = self.config.admin_id;
            outbox.broadcast(
                world.active_ids().into_iter().filter(|id| *id != admin),
                &format!("The game has started! Round {round} lasts {minutes} minutes."),
            );
            log::info!("Game started at round {}", round);
            Ok(())
        })
    }

    /// Move to the next round, or report `Busy` if one is already moving.
    pub fn advance_round(&self) -> AdvanceOutcome {
        if self
            .advancing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Round advance requested while one is in progress");
            return AdvanceOutcome::Busy;
        }
        let _guard = AdvanceGuard(&self.advancing);

        let now = self.clock.now();
        let report = self.with_session(|s, outbox| {
            round::advance(&mut s.world, &self.config, &mut *s.rng, outbox, now)
        });
        AdvanceOutcome::Advanced(report)
    }

    pub fn is_advancing(&self) -> bool {
        self.advancing.load(Ordering::Acquire)
    }

    /// Send any due countdown notices. Returns the thresholds (seconds) fired.
    pub fn poll_round_timer(&self) -> Vec<u64> {
        let now = self.clock.now();
        self.with_session(|s, outbox| round::poll_timer(&mut s.world, &self.config, outbox, now))
    }

    /// Flip the player's ready flag. Returns the new value.
    pub fn toggle_ready(&self, player: PlayerId) -> Result<bool, ActionError> {
        self.with_session(|s, outbox| {
            let p = s
                .world
                .player_mut(player)
                .ok_or(ActionError::UnknownPlayer(player))?;
            if !p.is_active() {
                return Err(ActionError::NotInGame(player));
            }
            p.ready = !p.ready;
            let ready = p.ready;

            // The administrator's own country never holds the round back
            let admin = self.config.admin_id;
            let flags: Vec<bool> = s
                .world
                .active_players()
                .filter(|p| p.id != admin)
                .map(|p| p.ready)
                .collect();
            if ready && !flags.is_empty() && flags.iter().all(|&r| r) {
                outbox.push(
                    admin,
                    "All players are ready. You can start the next round.",
                );
                log::info!("All players ready in round {}", s.world.round.current_round);
            }
            Ok(ready)
        })
    }

    // ---- Registry ----

    pub fn register(&self, id: PlayerId) -> Player {
        self.with_session(|s, _| registry::register(&mut s.world, &self.config, id).clone())
    }

    pub fn available_countries(&self) -> Vec<String> {
        self.with_session(|s, _| registry::available_countries(&s.world, &self.config))
    }

    pub fn assign_country(&self, id: PlayerId, country: &str) -> Result<(), ActionError> {
        self.with_session(|s, _| registry::assign_country(&mut s.world, &self.config, id, country))
    }

    pub fn set_nickname(&self, id: PlayerId, nickname: &str) -> Result<(), ActionError> {
        self.with_session(|s, _| registry::set_nickname(&mut s.world, &self.config, id, nickname))
    }

    /// Wipe the session. Only the administrator's entry survives.
    pub fn reset_all(&self) {
        self.with_session(|s, _| {
            registry::reset_all(&mut s.world, self.config.admin_id);
            s.pending.clear();
            s.proposals.clear();
            s.call_bans.clear();
        })
    }

    pub fn player(&self, id: PlayerId) -> Option<Player> {
        self.with_session(|s, _| s.world.player(id).cloned())
    }

    pub fn active_players(&self) -> Vec<Player> {
        self.with_session(|s, _| {
            registry::active_players(&s.world)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn by_country(&self, country: &str) -> Option<Player> {
        self.with_session(|s, _| registry::by_country(&s.world, country).cloned())
    }

    // ---- Global events ----

    /// Administrator override: start `kind` now.
    pub fn trigger_manual(&self, kind: EventKind) -> Result<(), ActionError> {
        self.with_event_context(|ctx| {
            if let Some(active) = &ctx.world.active_event {
                return Err(ActionError::EventAlreadyActive(active.kind));
            }
            events::start(ctx, kind);
            log::info!("Event {} triggered manually", kind);
            Ok(())
        })
    }

    /// Administrator override: drop the active event without resolving it.
    pub fn cancel_event(&self) -> Result<EventKind, ActionError> {
        self.with_event_context(|ctx| {
            let active = ctx
                .world
                .active_event
                .take()
                .ok_or(ActionError::NoActiveEvent)?;
            ctx.world
                .cooldowns
                .insert(active.kind, ctx.config.event_cooldown_rounds);
            ctx.broadcast(&format!(
                "The global event '{}' was cancelled by the administrator.",
                active.kind
            ));
            log::info!("Event {} cancelled", active.kind);
            Ok(active.kind)
        })
    }

    fn interact(
        &self,
        player: PlayerId,
        interaction: Interaction,
        amount: i64,
    ) -> Result<InteractionOutcome, ActionError> {
        self.with_event_context(|ctx| events::interact(ctx, player, interaction, amount))
    }

    /// Pay into a crisis fund.
    pub fn contribute(&self, player: PlayerId, amount: i64) -> Result<InteractionOutcome, ActionError> {
        self.interact(player, Interaction::Contribute, amount)
    }

    /// Invest in a breakthrough.
    pub fn invest(&self, player: PlayerId, amount: i64) -> Result<InteractionOutcome, ActionError> {
        self.interact(player, Interaction::Invest, amount)
    }

    /// Buy the black-market offer.
    pub fn purchase(&self, player: PlayerId) -> Result<InteractionOutcome, ActionError> {
        self.interact(player, Interaction::Purchase, 0)
    }

    pub fn active_event(&self) -> Option<ActiveEvent> {
        self.with_session(|s, _| s.world.active_event.clone())
    }

    fn active_flag(&self, flag: impl Fn(EventKind) -> bool) -> bool {
        self.with_session(|s, _| s.world.active_event.as_ref().is_some_and(|e| flag(e.kind)))
    }

    pub fn shields_ignored(&self) -> bool {
        self.active_flag(|k| k.behaviour().shields_ignored())
    }

    pub fn production_blocked(&self) -> bool {
        self.active_flag(|k| k.behaviour().production_blocked())
    }

    pub fn budgets_visible(&self) -> bool {
        self.active_flag(|k| k.behaviour().budgets_visible())
    }

    // ---- Combat ----

    /// Launch a ready nuke at `city`. A direct hit parks a loot-or-burn
    /// decision that must be resolved or cancelled before the next attack.
    pub fn resolve_attack(
        &self,
        attacker: PlayerId,
        target_country: &str,
        city: &str,
    ) -> Result<AttackOutcome, ActionError> {
        self.with_session(|s, outbox| {
            if s.pending.contains_key(&attacker) {
                return Err(ActionError::ChoicePending);
            }
            let (outcome, pending) = combat::resolve_attack(
                &mut s.world,
                &self.config,
                &mut *s.rng,
                outbox,
                attacker,
                target_country,
                city,
            )?;
            if let Some(pending) = pending {
                s.pending.insert(attacker, pending);
            }
            Ok(outcome)
        })
    }

    /// Apply the parked decision. The record is consumed even when it turns
    /// out to be stale.
    pub fn resolve_post_hit_choice(
        &self,
        attacker: PlayerId,
        choice: PostHitChoice,
    ) -> Result<PostHitOutcome, ActionError> {
        self.with_session(|s, outbox| {
            let pending = s.pending.remove(&attacker).ok_or_else(|| {
                ActionError::invariant(format!("no post-hit decision pending for {attacker}"))
            })?;
            combat::resolve_post_hit(
                &mut s.world,
                &self.config,
                &mut *s.rng,
                outbox,
                &pending,
                choice,
            )
        })
    }

    /// Drop an abandoned decision. Returns whether one existed.
    pub fn cancel_post_hit_choice(&self, attacker: PlayerId) -> bool {
        self.with_session(|s, _| {
            let dropped = s.pending.remove(&attacker).is_some();
            if dropped {
                log::debug!("Post-hit decision for {} cancelled", attacker);
            }
            dropped
        })
    }

    pub fn pending_post_hit(&self, attacker: PlayerId) -> Option<PendingPostHit> {
        self.with_session(|s, _| s.pending.get(&attacker).cloned())
    }

    // ---- Player actions ----

    pub fn produce_nuke(&self, player: PlayerId) -> Result<ActionOutcome, ActionError> {
        self.with_session(|s, _| actions::produce_nuke(&mut s.world, &self.config, &mut *s.rng, player))
    }

    pub fn build_shield(&self, player: PlayerId) -> Result<ActionOutcome, ActionError> {
        self.with_session(|s, _| actions::build_shield(&mut s.world, &self.config, &mut *s.rng, player))
    }

    pub fn upgrade_city(&self, player: PlayerId, city: &str) -> Result<ActionOutcome, ActionError> {
        self.with_session(|s, outbox| {
            actions::upgrade_city(&mut s.world, &self.config, &mut *s.rng, outbox, player, city)
        })
    }

    pub fn social_program(&self, player: PlayerId, city: &str) -> Result<ActionOutcome, ActionError> {
        self.with_session(|s, outbox| {
            actions::social_program(&mut s.world, &self.config, &mut *s.rng, outbox, player, city)
        })
    }

    pub fn build_bunker(&self, player: PlayerId, city: &str) -> Result<ActionOutcome, ActionError> {
        self.with_session(|s, _| actions::build_bunker(&mut s.world, &self.config, player, city))
    }

    pub fn send_aid(
        &self,
        from: PlayerId,
        to_country: &str,
        amount: i64,
    ) -> Result<ActionOutcome, ActionError> {
        self.with_session(|s, outbox| {
            actions::send_aid(&mut s.world, &self.config, outbox, from, to_country, amount)
        })
    }

    pub fn surrender(&self, player: PlayerId) -> Result<ActionOutcome, ActionError> {
        self.with_session(|s, outbox| {
            let outcome = actions::surrender(&mut s.world, &self.config, outbox, player)?;
            s.pending.remove(&player);
            Ok(outcome)
        })
    }

    // ---- Diplomacy ----

    /// Offer negotiations to `target_country`. Returns the responder's id.
    pub fn propose_negotiation(
        &self,
        initiator: PlayerId,
        target_country: &str,
    ) -> Result<PlayerId, ActionError> {
        self.with_session(|s, outbox| {
            diplomacy::propose(&s.world, &mut s.proposals, outbox, initiator, target_country)
        })
    }

    pub fn respond_negotiation(
        &self,
        responder: PlayerId,
        initiator: PlayerId,
        reply: NegotiationReply,
    ) -> Result<(), ActionError> {
        self.with_session(|s, outbox| {
            diplomacy::respond(&s.world, &mut s.proposals, outbox, responder, initiator, reply)
        })
    }

    pub fn call_admin(&self, player: PlayerId) -> Result<(), ActionError> {
        let now = self.clock.now();
        self.with_session(|s, outbox| {
            diplomacy::call_admin(&s.world, &self.config, &mut s.call_bans, outbox, player, now)
        })
    }

    /// Administrator override: answer a call from `player`.
    pub fn answer_admin_call(&self, player: PlayerId, reply: AdminCallReply) -> Result<(), ActionError> {
        let now = self.clock.now();
        self.with_session(|s, outbox| {
            diplomacy::answer_admin_call(
                &s.world,
                &self.config,
                &mut s.call_bans,
                outbox,
                player,
                reply,
                now,
            )
        })
    }

    // ---- Views ----

    pub fn statistics(&self, player: PlayerId) -> Result<Statistics, ActionError> {
        self.with_session(|s, _| actions::statistics(&s.world, player))
    }

    pub fn country_overview(&self, viewer: PlayerId) -> Vec<CountryView> {
        self.with_session(|s, _| actions::country_overview(&s.world, viewer))
    }

    /// Projected income for the next round start.
    pub fn income(&self, player: PlayerId) -> Result<IncomeBreakdown, ActionError> {
        self.with_session(|s, _| {
            let p = s
                .world
                .player(player)
                .ok_or(ActionError::UnknownPlayer(player))?;
            if !p.is_active() {
                return Err(ActionError::NotInGame(player));
            }
            Ok(player_income(&s.world, p))
        })
    }

    /// Headlines of the round so far.
    pub fn newspaper(&self) -> Option<String> {
        self.with_session(|s, _| round_digest(&s.world))
    }

    /// Nickname or country of every active player and whether they are ready.
    pub fn ready_status(&self) -> Vec<(String, bool)> {
        self.with_session(|s, _| {
            s.world
                .active_players()
                .map(|p| (p.display_name(), p.ready))
                .collect()
        })
    }

    pub fn snapshot(&self) -> WorldState {
        self.with_session(|s, _| s.world.clone())
    }

    pub fn checksum(&self) -> u64 {
        self.with_session(|s, _| s.world.checksum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotifyError, TextFormat};
    use crate::testing::{FailingNotifier, ManualClock, RecordingNotifier, ScriptedRng, WorldStateBuilder};
    use std::sync::mpsc;

    fn engine_with(world: WorldState, rng: ScriptedRng) -> (Engine, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let ports = Ports {
            notifier: notifier.clone(),
            clock: Arc::new(ManualClock::default()),
            rng: Box::new(rng),
        };
        (Engine::from_world(GameConfig::default(), world, ports), notifier)
    }

    fn duel() -> WorldStateBuilder {
        WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port", "Hill"])
            .with_player(2, "Borealia", &["Capital", "Mill"])
    }

    /// Blocks every send until the test releases it.
    struct GateNotifier {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Notifier for GateNotifier {
        fn send(&self, _: PlayerId, _: &str, _: TextFormat) -> Result<(), NotifyError> {
            let _ = self.entered.lock().send(());
            let _ = self.release.lock().recv();
            Ok(())
        }
    }

    #[test]
    fn test_concurrent_advance_is_busy() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let ports = Ports {
            notifier: Arc::new(GateNotifier {
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
            }),
            clock: Arc::new(ManualClock::default()),
            rng: Box::new(ScriptedRng::new()),
        };
        let world = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port"])
            .build();
        let engine = Engine::from_world(GameConfig::default(), world, ports);

        std::thread::scope(|scope| {
            let first = scope.spawn(|| engine.advance_round());
            // First advance is now delivering its round-start notice
            entered_rx.recv().unwrap();
            assert!(engine.is_advancing());
            assert_eq!(engine.advance_round(), AdvanceOutcome::Busy);
            release_tx.send(()).unwrap();
            assert!(matches!(first.join().unwrap(), AdvanceOutcome::Advanced(_)));
        });

        // Exactly one mutation happened
        assert_eq!(engine.snapshot().round.current_round, 2);
        assert!(!engine.is_advancing());
    }

    #[test]
    fn test_sequential_advances_release_the_flag() {
        let (engine, notifier) = engine_with(duel().build(), ScriptedRng::new());
        for expected in 2..=4 {
            match engine.advance_round() {
                AdvanceOutcome::Advanced(report) => assert_eq!(report.round, expected),
                AdvanceOutcome::Busy => panic!("advance {expected} reported busy"),
            }
        }
        assert_eq!(notifier.texts_for(1).len(), 3);
    }

    #[test]
    fn test_notification_failure_does_not_block_others() {
        let notifier = Arc::new(FailingNotifier::failing_for([1]));
        let ports = Ports {
            notifier: notifier.clone(),
            clock: Arc::new(ManualClock::default()),
            rng: Box::new(ScriptedRng::new()),
        };
        let engine = Engine::from_world(GameConfig::default(), duel().build(), ports);

        assert!(matches!(engine.advance_round(), AdvanceOutcome::Advanced(_)));
        assert_eq!(notifier.inner().recipients(), vec![2]);
        assert_eq!(engine.snapshot().player(1).unwrap().budget, 5_000 + 2 * 425);
    }

    #[test]
    fn test_trigger_manual_round_trip() {
        let (engine, notifier) = engine_with(duel().build(), ScriptedRng::new());
        engine.trigger_manual(EventKind::SolarFlare).unwrap();

        assert!(engine.shields_ignored());
        assert!(!engine.production_blocked());
        assert_eq!(
            engine.active_event().map(|e| e.kind),
            Some(EventKind::SolarFlare)
        );
        assert_eq!(
            engine.snapshot().cooldowns.get(&EventKind::SolarFlare),
            Some(&3)
        );
        assert_eq!(notifier.recipients(), vec![1, 2]);

        assert_eq!(
            engine.trigger_manual(EventKind::Pandemic),
            Err(ActionError::EventAlreadyActive(EventKind::SolarFlare))
        );
        assert_eq!(engine.cancel_event(), Ok(EventKind::SolarFlare));
        assert!(engine.active_event().is_none());
        assert_eq!(engine.cancel_event(), Err(ActionError::NoActiveEvent));
    }

    #[test]
    fn test_shielded_attack() {
        let world = duel().with_nukes(1, 1, 0).with_shields(2, 1).build();
        let (engine, _) = engine_with(world, ScriptedRng::new());

        let outcome = engine.resolve_attack(1, "Borealia", "Capital").unwrap();
        assert!(matches!(
            outcome,
            AttackOutcome::Shielded { shields_left: 0, .. }
        ));
        let world = engine.snapshot();
        assert_eq!(world.player(1).unwrap().ready_nukes, 0);
        assert_eq!(world.player(2).unwrap().shields, 0);
        assert_eq!(world.player(2).unwrap().cities["Capital"].level, 1);
        assert!(engine.pending_post_hit(1).is_none());
    }

    #[test]
    fn test_direct_hit_eliminates_and_parks_choice() {
        let world = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port"])
            .with_player(2, "Borealia", &["Capital"])
            .with_nukes(1, 2, 0)
            .with_player(3, "Cindara", &["Dock"])
            .build();
        let (engine, _) = engine_with(world, ScriptedRng::new().with_ranges([4]));

        let outcome = engine.resolve_attack(1, "Borealia", "Capital").unwrap();
        assert_eq!(
            outcome,
            AttackOutcome::DirectHit {
                target: 2,
                shields_bypassed: false,
                eliminated: true
            }
        );
        let target = engine.player(2).unwrap();
        let capital = &target.cities["Capital"];
        assert_eq!((capital.level, capital.income, capital.qol), (0, 0, 4));
        assert!(target.eliminated);

        assert_eq!(
            engine.resolve_attack(1, "Cindara", "Dock"),
            Err(ActionError::ChoicePending)
        );

        let looted = engine
            .resolve_post_hit_choice(1, PostHitChoice::Loot)
            .unwrap();
        assert_eq!(
            looted,
            PostHitOutcome::Looted {
                amount: 1_250,
                qol_penalty: 5
            }
        );
        assert_eq!(engine.player(1).unwrap().budget, 6_250);
        assert!(engine
            .resolve_post_hit_choice(1, PostHitChoice::Burn)
            .unwrap_err()
            .is_invariant_violation());
    }

    #[test]
    fn test_stale_post_hit_record_is_dropped() {
        let world = duel().with_nukes(1, 1, 0).build();
        let (engine, _) = engine_with(world, ScriptedRng::new());
        engine.resolve_attack(1, "Borealia", "Capital").unwrap();

        // Target rebuilds before the attacker decides
        engine.upgrade_city(2, "Capital").unwrap();
        let err = engine
            .resolve_post_hit_choice(1, PostHitChoice::Burn)
            .unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(engine.pending_post_hit(1).is_none());
        assert!(!engine.player(2).unwrap().cities["Capital"].ruined);
    }

    #[test]
    fn test_cancel_post_hit_allows_next_attack() {
        let world = duel().with_nukes(1, 2, 0).with_player(3, "Cindara", &["Dock"]).build();
        let (engine, _) = engine_with(world, ScriptedRng::new());
        engine.resolve_attack(1, "Borealia", "Capital").unwrap();
        assert!(engine.cancel_post_hit_choice(1));
        assert!(!engine.cancel_post_hit_choice(1));
        assert!(engine.resolve_attack(1, "Cindara", "Dock").is_ok());
    }

    #[test]
    fn test_black_market_purchase() {
        let world = duel()
            .with_budget(1, 10_000)
            .with_event(EventKind::BlackMarket, 2)
            .build();
        let (engine, _) = engine_with(world, ScriptedRng::new());

        assert_eq!(
            engine.purchase(1),
            Ok(InteractionOutcome::Completed { winner: Some(1) })
        );
        let buyer = engine.player(1).unwrap();
        assert_eq!(buyer.budget, 2_500);
        assert_eq!(buyer.ready_nukes, 2);
        assert!(engine.active_event().is_none());
    }

    #[test]
    fn test_start_game_and_timer() {
        let clock = Arc::new(ManualClock::default());
        let notifier = Arc::new(RecordingNotifier::new());
        let ports = Ports {
            notifier: notifier.clone(),
            clock: clock.clone(),
            rng: Box::new(ScriptedRng::new()),
        };
        let engine = Engine::from_world(GameConfig::default(), duel().build(), ports);

        engine.start_game().unwrap();
        assert_eq!(engine.start_game(), Err(ActionError::GameAlreadyRunning));
        assert!(engine.poll_round_timer().is_empty());

        clock.advance(Duration::from_secs(600));
        assert_eq!(engine.poll_round_timer(), vec![300]);
        clock.advance(Duration::from_secs(400));
        assert_eq!(engine.poll_round_timer(), vec![180, 60, 0]);
        assert!(engine.snapshot().round.round_end.is_none());
        assert_eq!(engine.snapshot().round.current_round, 1);

        // The timer can be reopened once it has run out
        assert!(engine.start_game().is_ok());
    }

    #[test]
    fn test_ready_toggle_notifies_admin() {
        let world = WorldStateBuilder::new()
            .with_player(1, "Atlantis", &["Port"])
            .with_player(2, "Borealia", &["Capital"])
            .build();
        let (engine, notifier) = engine_with(world, ScriptedRng::new());
        let admin = engine.config().admin_id;

        assert_eq!(engine.toggle_ready(1), Ok(true));
        assert!(notifier.texts_for(admin).is_empty());
        assert_eq!(engine.toggle_ready(2), Ok(true));
        assert_eq!(notifier.texts_for(admin).len(), 1);
        assert_eq!(engine.toggle_ready(2), Ok(false));
        assert_eq!(
            engine.ready_status(),
            vec![("Atlantis".to_string(), true), ("Borealia".to_string(), false)]
        );
        assert_eq!(engine.toggle_ready(9), Err(ActionError::UnknownPlayer(9)));
    }

    #[test]
    fn test_reset_clears_pending() {
        let world = duel().with_nukes(1, 1, 0).build();
        let (engine, _) = engine_with(world, ScriptedRng::new());
        engine.resolve_attack(1, "Borealia", "Capital").unwrap();
        engine.reset_all();
        assert!(engine.pending_post_hit(1).is_none());
        assert!(engine.active_players().is_empty());
        assert_eq!(engine.available_countries().len(), engine.config().countries.len());
    }

    #[test]
    fn test_register_and_assign() {
        let (engine, _) = engine_with(WorldState::default(), ScriptedRng::new());
        let p = engine.register(5);
        assert_eq!(p.budget, 5_000);
        engine.assign_country(5, "Dunmark").unwrap();
        engine.set_nickname(5, "Marta").unwrap();
        assert_eq!(engine.by_country("Dunmark").map(|p| p.id), Some(5));
        assert_eq!(engine.income(5).unwrap().total, 3 * 425);
    }

    #[test]
    fn test_admin_country_does_not_block_ready() {
        let world = duel().with_player(0, "Admland", &["Seat"]).build();
        let (engine, notifier) = engine_with(world, ScriptedRng::new());

        assert_eq!(engine.toggle_ready(1), Ok(true));
        assert!(notifier.texts_for(0).is_empty());
        assert_eq!(engine.toggle_ready(2), Ok(true));
        assert_eq!(
            notifier.texts_for(0),
            vec!["All players are ready. You can start the next round.".to_string()]
        );
    }

    #[test]
    fn test_admin_alone_is_never_all_ready() {
        let world = WorldStateBuilder::new()
            .with_player(0, "Admland", &["Seat"])
            .build();
        let (engine, notifier) = engine_with(world, ScriptedRng::new());
        assert_eq!(engine.toggle_ready(0), Ok(true));
        assert!(notifier.texts_for(0).is_empty());
    }

    #[test]
    fn test_start_notice_skips_admin() {
        let world = duel().with_player(0, "Admland", &["Seat"]).build();
        let (engine, notifier) = engine_with(world, ScriptedRng::new());
        engine.start_game().unwrap();
        assert_eq!(notifier.recipients(), vec![1, 2]);
    }

    #[test]
    fn test_negotiation_round_trip() {
        let (engine, notifier) = engine_with(duel().build(), ScriptedRng::new());
        assert_eq!(engine.propose_negotiation(1, "Borealia"), Ok(2));
        assert_eq!(
            engine.respond_negotiation(2, 1, NegotiationReply::Accept),
            Ok(())
        );
        assert_eq!(
            notifier.texts_for(1),
            vec!["Borealia accepts your proposal.".to_string()]
        );
        assert_eq!(
            engine.respond_negotiation(2, 1, NegotiationReply::Decline),
            Err(ActionError::NoOpenProposal(1))
        );

        // Reset forgets open proposals
        engine.propose_negotiation(1, "Borealia").unwrap();
        engine.reset_all();
        assert_eq!(
            engine.respond_negotiation(2, 1, NegotiationReply::Accept),
            Err(ActionError::NoOpenProposal(1))
        );
    }

    #[test]
    fn test_admin_call_ban_follows_clock() {
        let clock = Arc::new(ManualClock::default());
        let notifier = Arc::new(RecordingNotifier::new());
        let ports = Ports {
            notifier: notifier.clone(),
            clock: clock.clone(),
            rng: Box::new(ScriptedRng::new()),
        };
        let engine = Engine::from_world(GameConfig::default(), duel().build(), ports);

        engine.call_admin(1).unwrap();
        assert_eq!(notifier.texts_for(0).len(), 1);
        engine.answer_admin_call(1, AdminCallReply::Ban).unwrap();
        assert_eq!(
            notifier.texts_for(1),
            vec!["Reply from the administrator: You are blocked from calling the administrator for 2 minutes."
                .to_string()]
        );

        clock.advance(Duration::from_secs(60));
        assert_eq!(
            engine.call_admin(1),
            Err(ActionError::AdminCallBanned { remaining_secs: 60 })
        );
        assert_eq!(notifier.texts_for(0).len(), 1);

        clock.advance(Duration::from_secs(61));
        assert!(engine.call_admin(1).is_ok());
        assert_eq!(notifier.texts_for(0).len(), 2);
    }

    #[test]
    fn test_statistics_view() {
        let world = duel().with_nukes(1, 1, 2).build();
        let (engine, _) = engine_with(world, ScriptedRng::new());
        let stats = engine.statistics(1).unwrap();
        assert_eq!(stats.display_name, "Atlantis");
        assert_eq!((stats.ready_nukes, stats.pending_nukes), (1, 2));
        let names: Vec<&str> = stats.cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Hill", "Port"]);
    }
}
