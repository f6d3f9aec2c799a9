//! Shared game state behind the command layer.
//!
//! Lock order is battle, then profile or rng. The registry lock is never
//! held while waiting on a battle lock.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::RngCore;
use tracing::{debug, info, warn};

use crate::engine::error::{BattleError, StoreError};
use crate::engine::store::{relock, ProfileStore, Profiles};
use crate::model::battle::{ActionKind, Battle, BattleId, BattleSnapshot, Phase};
use crate::model::event_result::{SettlementOutcome, SettlementReport};
use crate::model::profile::{Profile, UserId};

#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub idle_timeout: Duration,
    /// Extra attempts per settlement write before it is queued.
    pub settlement_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(300),
            settlement_retries: 3,
        }
    }
}

/// The result of one accepted action.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub snapshot: BattleSnapshot,
    /// Present once the action ended the battle.
    pub settlement: Option<SettlementReport>,
}

pub struct GameService<S, R> {
    pub(crate) profiles: Profiles<S>,
    pub(crate) rng: Mutex<R>,
    battles: Mutex<HashMap<BattleId, Arc<Mutex<Battle>>>>,
    pending: Mutex<BTreeSet<BattleId>>,
    next_id: AtomicU64,
    config: ServiceConfig,
}

impl<S, R> GameService<S, R>
where
    S: ProfileStore,
    R: RngCore + Send,
{
    pub fn new(store: S, rng: R, config: ServiceConfig) -> Self {
        Self {
            profiles: Profiles::new(store),
            rng: Mutex::new(rng),
            battles: Mutex::new(HashMap::new()),
            pending: Mutex::new(BTreeSet::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    fn battle(&self, id: BattleId) -> Result<Arc<Mutex<Battle>>, BattleError> {
        relock(&self.battles)
            .get(&id)
            .cloned()
            .ok_or(BattleError::UnknownBattle(id))
    }

    pub fn snapshot(&self, id: BattleId) -> Result<BattleSnapshot, BattleError> {
        let battle = self.battle(id)?;
        let guard = relock(&battle);
        Ok(guard.snapshot())
    }

    pub fn propose_battle(
        &self,
        challenger: &UserId,
        target: &UserId,
        arena: &str,
    ) -> Result<BattleSnapshot, BattleError> {
        let id = BattleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let battle = Battle::propose(id, challenger.clone(), target.clone(), arena, Instant::now())?;
        let snapshot = battle.snapshot();

        relock(&self.battles).insert(id, Arc::new(Mutex::new(battle)));
        info!(battle_id=%id, challenger=%challenger, target=%target, arena=%arena, "challenge proposed");
        Ok(snapshot)
    }

    pub fn respond_to_challenge(
        &self,
        id: BattleId,
        responder: &UserId,
        accept: bool,
    ) -> Result<BattleSnapshot, BattleError> {
        let battle = self.battle(id)?;
        let mut guard = relock(&battle);
        let now = Instant::now();

        if !accept {
            guard.decline(responder, now)?;
            return Ok(guard.snapshot());
        }

        guard.check_response(responder)?;
        let challenger = self.load_for_battle(&guard.challenger.clone(), id)?;
        let target = self.load_for_battle(&guard.target.clone(), id)?;

        guard.accept(responder, &challenger, &target, now)?;
        Ok(guard.snapshot())
    }

    /// Loads a fresh profile copy; a missing profile discards the battle.
    fn load_for_battle(&self, user: &UserId, id: BattleId) -> Result<Profile, BattleError> {
        match self.profiles.load(user)? {
            Some(profile) => Ok(profile),
            None => {
                relock(&self.battles).remove(&id);
                warn!(battle_id=%id, user=%user, "profile missing at accept; battle discarded");
                Err(BattleError::ProfileNotFound(user.clone()))
            }
        }
    }

    pub fn cancel_challenge(
        &self,
        id: BattleId,
        challenger: &UserId,
    ) -> Result<BattleSnapshot, BattleError> {
        let battle = self.battle(id)?;
        let mut guard = relock(&battle);
        guard.cancel(challenger, Instant::now())?;
        Ok(guard.snapshot())
    }

    /// Runs one action under the battle's lock, settling if it ends the fight.
    pub fn act(
        &self,
        id: BattleId,
        actor: &UserId,
        action: ActionKind,
        item: Option<&str>,
    ) -> Result<TurnResult, BattleError> {
        let battle = self.battle(id)?;
        let mut guard = relock(&battle);

        {
            let mut rng = relock(&self.rng);
            if let Err(e) = guard.act(actor, action, item, &mut *rng, Instant::now()) {
                debug!(battle_id=%id, user=%actor, ?action, err=%e, "action rejected");
                return Err(e);
            }
        }

        let settlement = match guard.phase {
            Phase::Concluded { .. } => Some(self.settle_locked(&mut guard)?),
            _ => None,
        };

        Ok(TurnResult {
            snapshot: guard.snapshot(),
            settlement,
        })
    }

    /// Settles a concluded battle. Safe to call repeatedly.
    pub fn settle(&self, id: BattleId) -> Result<SettlementReport, BattleError> {
        let battle = self.battle(id)?;
        let mut guard = relock(&battle);
        self.settle_locked(&mut guard)
    }

    fn settle_locked(&self, battle: &mut Battle) -> Result<SettlementReport, BattleError> {
        let Some(winner_side) = battle.winner() else {
            return Err(BattleError::WrongPhase(battle.phase));
        };
        let winner = battle.user(winner_side).clone();
        let loser = battle.user(winner_side.other()).clone();
        let coins_won = battle.arena.winner_reward();
        let fee = battle.arena.entry_fee;

        let mut report = SettlementReport {
            battle_id: battle.id,
            winner: winner.clone(),
            loser: loser.clone(),
            coins_won,
            coins_lost: fee,
            outcome: SettlementOutcome::AlreadySettled,
        };
        if battle.settlement.is_complete() {
            return Ok(report);
        }

        let mut failure: Option<StoreError> = None;

        if !battle.settlement.winner_applied {
            match self.write_with_retry(&winner, |p| {
                p.coins = p.coins.saturating_add(coins_won);
                p.stats.pvp_wins += 1;
            }) {
                Ok(()) => battle.settlement.winner_applied = true,
                Err(e) => failure = Some(e),
            }
        }
        if !battle.settlement.loser_applied {
            match self.write_with_retry(&loser, |p| {
                p.coins = p.coins.saturating_sub(fee);
                p.stats.pvp_losses += 1;
            }) {
                Ok(()) => battle.settlement.loser_applied = true,
                Err(e) => failure = Some(e),
            }
        }

        report.outcome = match failure {
            None => {
                relock(&self.pending).remove(&battle.id);
                info!(battle_id=%battle.id, winner=%winner, coins=coins_won, "battle settled");
                SettlementOutcome::Applied
            }
            Some(e) => {
                relock(&self.pending).insert(battle.id);
                warn!(battle_id=%battle.id, err=%e, "settlement queued for retry");
                SettlementOutcome::Deferred {
                    reason: e.to_string(),
                }
            }
        };
        Ok(report)
    }

    fn write_with_retry(
        &self,
        user: &UserId,
        apply: impl Fn(&mut Profile),
    ) -> Result<(), StoreError> {
        let mut attempt = 0;
        loop {
            match self.profiles.update(user, |p| apply(p)) {
                Ok(Some(())) => return Ok(()),
                Ok(None) => {
                    warn!(user=%user, "profile vanished before settlement; nothing to credit");
                    return Ok(());
                }
                Err(e) if attempt < self.config.settlement_retries => {
                    attempt += 1;
                    warn!(user=%user, attempt, err=%e, "settlement write failed; retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn pending_settlements(&self) -> Vec<BattleId> {
        relock(&self.pending).iter().copied().collect()
    }

    /// Retries every queued settlement. Returns the ones that completed.
    pub fn retry_pending_settlements(&self) -> Vec<SettlementReport> {
        let mut done = Vec::new();
        for id in self.pending_settlements() {
            match self.settle(id) {
                Ok(report) if report.outcome == SettlementOutcome::Applied => done.push(report),
                Ok(_) => {}
                Err(e) => warn!(battle_id=%id, err=%e, "pending settlement retry failed"),
            }
        }
        done
    }

    /// Abandons battles idle past the timeout and forgets finished ones.
    pub fn expire_idle(&self, now: Instant) -> Vec<BattleSnapshot> {
        let entries: Vec<(BattleId, Arc<Mutex<Battle>>)> = relock(&self.battles)
            .iter()
            .map(|(id, b)| (*id, Arc::clone(b)))
            .collect();

        let mut expired = Vec::new();
        let mut finished = Vec::new();
        for (id, battle) in entries {
            let mut guard = relock(&battle);
            let idle = now.saturating_duration_since(guard.last_activity);
            if idle <= self.config.idle_timeout {
                continue;
            }
            if guard.abandon(now) {
                expired.push(guard.snapshot());
            } else if !matches!(guard.phase, Phase::Concluded { .. }) || guard.settlement.is_complete() {
                finished.push(id);
            }
        }

        if !finished.is_empty() {
            let mut battles = relock(&self.battles);
            for id in &finished {
                battles.remove(id);
            }
            debug!(count = finished.len(), "pruned finished battles");
        }
        expired
    }

    /// Live battles the user is part of.
    pub fn battles_for(&self, user: &UserId) -> Vec<BattleSnapshot> {
        let entries: Vec<Arc<Mutex<Battle>>> = relock(&self.battles).values().cloned().collect();
        let mut out: Vec<BattleSnapshot> = entries
            .iter()
            .filter_map(|b| {
                let guard = relock(b);
                let involved = guard.side_of(user).is_some() && !guard.phase.is_terminal();
                involved.then(|| guard.snapshot())
            })
            .collect();
        out.sort_by_key(|s| s.id);
        out
    }
}
