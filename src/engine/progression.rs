use crate::engine::error::GateError;
use crate::model::event_result::LevelUpSummary;
use crate::model::profile::Profile;
use crate::model::tables::{
    Feature, BASE_XP, FEATURE_UNLOCKS, LEVEL_ATTACK_GAIN, LEVEL_DEFENSE_GAIN, LEVEL_HP_GAIN,
    LEVEL_MANA_GAIN, MAX_LEVEL, XP_MULTIPLIER,
};

/// XP needed to go from `level` to `level + 1`.
pub fn xp_required(level: u32) -> u64 {
    let exp = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
    (BASE_XP * XP_MULTIPLIER.powi(exp)).floor() as u64
}

/// Features whose unlock level is exactly `level`.
pub fn unlocks_at(level: u32) -> Vec<Feature> {
    FEATURE_UNLOCKS
        .iter()
        .filter(|(at, _)| *at == level)
        .map(|(_, feature)| *feature)
        .collect()
}

/// Performs at most one level transition.
///
/// Surplus XP carries over, but a second threshold is only crossed on the
/// next call.
pub fn try_level_up(profile: &mut Profile) -> Option<LevelUpSummary> {
    let required = xp_required(profile.level);
    if profile.level >= MAX_LEVEL || profile.xp < required {
        profile.max_xp = required;
        return None;
    }

    profile.level += 1;
    profile.xp -= required;
    profile.max_xp = xp_required(profile.level);

    profile.max_hp += LEVEL_HP_GAIN;
    profile.attack += LEVEL_ATTACK_GAIN;
    profile.defense += LEVEL_DEFENSE_GAIN;
    profile.max_mana += LEVEL_MANA_GAIN;
    profile.hp = profile.max_hp;
    profile.mana = profile.max_mana;

    Some(LevelUpSummary {
        new_level: profile.level,
        carried_xp: profile.xp,
        next_level_xp: profile.max_xp,
        hp_gain: LEVEL_HP_GAIN,
        attack_gain: LEVEL_ATTACK_GAIN,
        defense_gain: LEVEL_DEFENSE_GAIN,
        mana_gain: LEVEL_MANA_GAIN,
        unlocked: unlocks_at(profile.level),
    })
}

pub fn check_level_requirement(
    profile: &Profile,
    required: u32,
    feature: &str,
) -> Result<(), GateError> {
    if profile.level < required {
        return Err(GateError {
            feature: feature.to_string(),
            required,
            current: profile.level,
        });
    }
    Ok(())
}
