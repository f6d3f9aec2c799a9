use rand::Rng;

use crate::model::combatant::Combatant;
use crate::model::tables::{CRIT_CHANCE, CRIT_MULTIPLIER_PCT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub damage: u32,
    pub critical: bool,
    /// Reduction taken from the defender's guard, if one was spent.
    pub guarded: Option<u32>,
}

pub fn attack_base(attacker: &Combatant, defender: &Combatant) -> u32 {
    attacker.attack.saturating_sub(defender.defense).max(1)
}

pub fn special_base(attacker: &Combatant, defender: &Combatant) -> u32 {
    attacker
        .attack
        .saturating_mul(2)
        .saturating_sub(defender.defense)
        .max(1)
}

/// Rolls the crit, spends one charge of the defender's guard, and floors once
/// after both multipliers.
pub fn resolve_hit<R: Rng + ?Sized>(rng: &mut R, base: u32, defender: &mut Combatant) -> Hit {
    let critical = rng.gen_bool(CRIT_CHANCE);
    let guarded = defender.consume_guard();

    let crit_pct = if critical { CRIT_MULTIPLIER_PCT } else { 100 };
    let kept_pct = 100 - u64::from(guarded.unwrap_or(0).min(100));

    let damage = u64::from(base) * crit_pct * kept_pct / 10_000;
    Hit {
        damage: u32::try_from(damage).unwrap_or(u32::MAX),
        critical,
        guarded,
    }
}
