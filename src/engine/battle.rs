//! The PvP battle state machine.
//!
//! Pure state transitions over [`Battle`]. Every precondition is checked
//! before anything is touched, so a rejected call leaves the battle exactly
//! as it was. Locking and persistence live in `engine::service`.

use std::time::Instant;

use rand::Rng;
use tracing::{debug, info};

use crate::engine::damage::{attack_base, resolve_hit, special_base, Hit};
use crate::engine::error::BattleError;
use crate::model::battle::{ActionKind, Battle, BattleId, Phase, SettlementState, Side};
use crate::model::combatant::Combatant;
use crate::model::profile::{Profile, UserId};
use crate::model::tables::{find_arena, DEFEND_REDUCTION_PCT, ENERGY_REGEN, HEAL_AMOUNT, STUN_TURNS};

impl Battle {
    pub fn propose(
        id: BattleId,
        challenger: UserId,
        target: UserId,
        arena: &str,
        now: Instant,
    ) -> Result<Battle, BattleError> {
        let arena = find_arena(arena).ok_or_else(|| BattleError::InvalidArena(arena.to_string()))?;
        if challenger == target {
            return Err(BattleError::SelfChallenge);
        }

        Ok(Battle {
            id,
            arena,
            challenger,
            target,
            combatants: None,
            current_turn: Side::Challenger,
            turn: 0,
            log: Vec::new(),
            phase: Phase::Proposed,
            settlement: SettlementState::default(),
            last_activity: now,
        })
    }

    /// Checks that `by` may accept or decline right now.
    pub fn check_response(&self, by: &UserId) -> Result<(), BattleError> {
        if *by != self.target {
            return Err(BattleError::NotTarget);
        }
        if self.phase != Phase::Proposed {
            return Err(BattleError::WrongPhase(self.phase));
        }
        Ok(())
    }

    /// Starts the fight from fresh profile copies.
    pub fn accept(
        &mut self,
        by: &UserId,
        challenger: &Profile,
        target: &Profile,
        now: Instant,
    ) -> Result<(), BattleError> {
        self.check_response(by)?;

        self.combatants = Some([
            Combatant::from_profile(challenger),
            Combatant::from_profile(target),
        ]);
        self.phase = Phase::Active;
        self.current_turn = Side::Challenger;
        self.turn = 1;
        self.log.push(format!(
            "{} accepted the challenge in the {}!",
            self.target, self.arena.name
        ));
        self.last_activity = now;

        info!(battle_id=%self.id, arena=%self.arena.id, "battle started");
        Ok(())
    }

    pub fn decline(&mut self, by: &UserId, now: Instant) -> Result<(), BattleError> {
        self.check_response(by)?;
        self.phase = Phase::Declined;
        self.log.push(format!("{} declined the challenge.", self.target));
        self.last_activity = now;
        info!(battle_id=%self.id, "challenge declined");
        Ok(())
    }

    pub fn cancel(&mut self, by: &UserId, now: Instant) -> Result<(), BattleError> {
        if *by != self.challenger {
            return Err(BattleError::NotChallenger);
        }
        if self.phase != Phase::Proposed {
            return Err(BattleError::WrongPhase(self.phase));
        }
        self.phase = Phase::Cancelled;
        self.log.push(format!("{} withdrew the challenge.", self.challenger));
        self.last_activity = now;
        info!(battle_id=%self.id, "challenge cancelled");
        Ok(())
    }

    /// Moves a live battle to `Abandoned`. Returns false if already terminal.
    pub fn abandon(&mut self, now: Instant) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = Phase::Abandoned;
        self.log.push("The battle was abandoned.".to_string());
        self.last_activity = now;
        info!(battle_id=%self.id, "battle abandoned after idling");
        true
    }

    pub fn act<R: Rng + ?Sized>(
        &mut self,
        by: &UserId,
        action: ActionKind,
        item: Option<&str>,
        rng: &mut R,
        now: Instant,
    ) -> Result<(), BattleError> {
        if self.phase != Phase::Active {
            return Err(BattleError::BattleNotActive);
        }
        let side = self.side_of(by).ok_or(BattleError::NotParticipant)?;
        if side != self.current_turn {
            return Err(BattleError::NotYourTurn);
        }
        let Some(fighters) = self.combatants.as_mut() else {
            return Err(BattleError::BattleNotActive);
        };

        let actor = &fighters[side.index()];
        let cost = action.energy_cost();
        if actor.energy < cost {
            debug!(battle_id=%self.id, user=%by, ?action, "rejected: low energy");
            return Err(BattleError::InsufficientEnergy {
                needed: cost,
                available: actor.energy,
            });
        }
        let item_idx = match action {
            ActionKind::UseItem => Some(actor.find_healing_item(item).ok_or(BattleError::NoUsableItem)?),
            _ => None,
        };

        let (actor, foe) = pair_mut(fighters, side);
        // Only a hit can end the battle.
        let (entry, foe_down) = match action {
            ActionKind::Attack => {
                let hit = resolve_hit(rng, attack_base(actor, foe), foe);
                foe.take_damage(hit.damage);
                actor.spend_energy(cost);
                let entry = format!(
                    "{} attacks for {}{}",
                    actor.user_id,
                    describe(&hit),
                    cost_note(cost)
                );
                (entry, foe.is_defeated())
            }
            ActionKind::Defend => {
                actor.raise_guard(DEFEND_REDUCTION_PCT);
                actor.spend_energy(cost);
                let entry = format!(
                    "{} takes a defensive stance! (-{}% damage on the next hit){}",
                    actor.user_id,
                    DEFEND_REDUCTION_PCT,
                    cost_note(cost)
                );
                (entry, false)
            }
            ActionKind::Special => {
                let hit = resolve_hit(rng, special_base(actor, foe), foe);
                foe.take_damage(hit.damage);
                foe.apply_stun(STUN_TURNS);
                actor.spend_energy(cost);
                let entry = format!(
                    "{} uses SPECIAL ATTACK for {} {} is stunned!{}",
                    actor.user_id,
                    describe(&hit),
                    foe.user_id,
                    cost_note(cost)
                );
                (entry, foe.is_defeated())
            }
            ActionKind::UseItem => {
                let idx = item_idx.unwrap_or_default();
                let used = actor.inventory.remove(idx);
                let before = actor.hp;
                actor.heal(HEAL_AMOUNT);
                let entry = format!(
                    "{} uses {} and heals for {} HP!",
                    actor.user_id,
                    used,
                    actor.hp - before
                );
                (entry, false)
            }
        };

        self.log.push(entry);
        self.last_activity = now;

        if foe_down {
            self.phase = Phase::Concluded { winner: side };
            self.log.push(format!("{} wins the battle!", by));
            info!(battle_id=%self.id, winner=%by, turns=self.turn, "battle concluded");
            return Ok(());
        }

        self.pass_turn();
        Ok(())
    }

    /// Hands the turn over, skipping anyone who is stunned.
    fn pass_turn(&mut self) {
        self.advance_turn();
        loop {
            let holder = self.current_turn;
            let Some(fighters) = self.combatants.as_mut() else {
                return;
            };
            if !fighters[holder.index()].consume_stun() {
                return;
            }
            let name = self.user(holder).clone();
            self.log.push(format!("{} is stunned and loses their turn!", name));
            self.advance_turn();
        }
    }

    fn advance_turn(&mut self) {
        self.current_turn = self.current_turn.other();
        self.turn += 1;
        if let Some(fighters) = self.combatants.as_mut() {
            for f in fighters.iter_mut() {
                f.regen_energy(ENERGY_REGEN);
            }
        }
    }
}

fn pair_mut(fighters: &mut [Combatant; 2], side: Side) -> (&mut Combatant, &mut Combatant) {
    let [challenger, target] = fighters;
    match side {
        Side::Challenger => (challenger, target),
        Side::Target => (target, challenger),
    }
}

fn describe(hit: &Hit) -> String {
    let mut s = format!("{} damage!", hit.damage);
    if hit.critical {
        s.push_str(" CRITICAL HIT!");
    }
    if hit.guarded.is_some() {
        s.push_str(" (blocked by defense)");
    }
    s
}

fn cost_note(cost: u32) -> String {
    format!(" (-{} energy)", cost)
}
