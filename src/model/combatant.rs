use serde::{Deserialize, Serialize};

use crate::model::profile::{Profile, UserId};
use crate::model::tables::{is_healing_item, MAX_ENERGY};

/// A temporary modifier on one side of a battle.
///
/// Every counter is positive while the effect is held; the effect is dropped
/// the moment its counter would reach zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Reduces the next incoming hits by `reduction_pct`.
    Defense {
        reduction_pct: u32,
        charges_remaining: u32,
    },
    /// The holder's upcoming turns are skipped.
    Stun { turns_remaining: u32 },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Defense { .. } => "defense",
            Effect::Stun { .. } => "stunned",
        }
    }
}

/// One side's battle-scoped stats. Independent of the persisted profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub user_id: UserId,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub energy: u32,
    pub effects: Vec<Effect>,

    /// Copy of the profile inventory taken when the battle started.
    pub inventory: Vec<String>,
}

impl Combatant {
    /// Profiles persist hp across battles; everyone enters with at least 1.
    pub fn from_profile(profile: &Profile) -> Self {
        let max_hp = profile.max_hp.max(1);
        Self {
            user_id: profile.user_id.clone(),
            hp: profile.hp.clamp(1, max_hp),
            max_hp,
            attack: profile.attack,
            defense: profile.defense,
            energy: MAX_ENERGY,
            effects: Vec::new(),
            inventory: profile.inventory.clone(),
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }

    pub fn spend_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_sub(amount);
    }

    pub fn regen_energy(&mut self, amount: u32) {
        self.energy = self.energy.saturating_add(amount).min(MAX_ENERGY);
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
    }

    /// Sets a one-charge defense, replacing any defense already held.
    pub fn raise_guard(&mut self, reduction_pct: u32) {
        self.effects.retain(|e| !matches!(e, Effect::Defense { .. }));
        self.effects.push(Effect::Defense {
            reduction_pct,
            charges_remaining: 1,
        });
    }

    pub fn apply_stun(&mut self, turns: u32) {
        if turns == 0 {
            return;
        }
        for effect in &mut self.effects {
            if let Effect::Stun { turns_remaining } = effect {
                *turns_remaining = (*turns_remaining).max(turns);
                return;
            }
        }
        self.effects.push(Effect::Stun {
            turns_remaining: turns,
        });
    }

    /// Uses one charge of the held defense, returning its reduction.
    pub fn consume_guard(&mut self) -> Option<u32> {
        let idx = self
            .effects
            .iter()
            .position(|e| matches!(e, Effect::Defense { .. }))?;

        let Effect::Defense {
            reduction_pct,
            charges_remaining,
        } = &mut self.effects[idx]
        else {
            return None;
        };
        let reduction = *reduction_pct;
        *charges_remaining -= 1;
        if *charges_remaining == 0 {
            self.effects.remove(idx);
        }
        Some(reduction)
    }

    /// Uses one turn of the held stun. Returns false when not stunned.
    pub fn consume_stun(&mut self) -> bool {
        let Some(idx) = self
            .effects
            .iter()
            .position(|e| matches!(e, Effect::Stun { .. }))
        else {
            return false;
        };

        if let Effect::Stun { turns_remaining } = &mut self.effects[idx] {
            *turns_remaining -= 1;
            if *turns_remaining == 0 {
                self.effects.remove(idx);
            }
        }
        true
    }

    /// Picks the healing item to use: the named one, or the first potion.
    pub fn find_healing_item(&self, wanted: Option<&str>) -> Option<usize> {
        match wanted {
            Some(name) => self
                .inventory
                .iter()
                .position(|i| i.eq_ignore_ascii_case(name.trim()) && is_healing_item(i)),
            None => self.inventory.iter().position(|i| is_healing_item(i)),
        }
    }
}
