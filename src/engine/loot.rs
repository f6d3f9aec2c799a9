//! Luck tiers, luck-adjusted rolls, rarity draws and the two reward flows
//! (adventures and lootboxes) built from them.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::engine::error::LootError;
use crate::engine::progression::{check_level_requirement, try_level_up};
use crate::model::event_result::{AdventureReport, LootboxReport, Reward};
use crate::model::profile::Profile;
use crate::model::tables::{
    find_location, ItemSlot, LuckTier, Rarity, ITEM_CATALOG, LOOTBOX_ITEM, LOOTBOX_UNLOCK_LEVEL,
    OMNIPOTENT_ITEMS,
};

pub const ADVENTURE_ITEM_CHANCE: f64 = 0.4;
pub const LOOTBOX_ITEM_ROLLS: usize = 3;
pub const LOOTBOX_ITEM_CHANCE: f64 = 0.4;
pub const LOOTBOX_JACKPOT_CHANCE: f64 = 0.001;
pub const LOOTBOX_COINS: (u64, u64) = (100, 1000);

fn scale(value: u64, tier: LuckTier) -> u64 {
    let pct = u64::try_from(100 + tier.bonus_percent()).unwrap_or(0);
    value.saturating_mul(pct) / 100
}

/// Scales coins and XP by the luck tier's bonus, rounding down.
pub fn apply_luck(base: Reward, luck: i32) -> Reward {
    let tier = LuckTier::from_points(luck);
    Reward {
        coins: scale(base.coins, tier),
        xp: scale(base.xp, tier),
    }
}

/// Probability `chance` adjusted by luck, clamped to `[0, 1]`.
pub fn luck_adjusted_chance(chance: f64, luck: i32) -> f64 {
    let bonus = LuckTier::from_points(luck).bonus_percent() as f64;
    (chance * (100.0 + bonus) / 100.0).clamp(0.0, 1.0)
}

pub fn roll_with_luck<R: Rng + ?Sized>(rng: &mut R, chance: f64, luck: i32) -> bool {
    rng.gen_bool(luck_adjusted_chance(chance, luck))
}

pub fn roll_rarity<R: Rng + ?Sized>(rng: &mut R) -> Rarity {
    match WeightedIndex::new(Rarity::ALL.iter().map(Rarity::weight)) {
        Ok(dist) => Rarity::ALL[dist.sample(rng)],
        Err(_) => Rarity::Common,
    }
}

/// A catalogue item of a random slot and weighted rarity. Rarities with no
/// catalogue entry for the slot fall back to common.
pub fn random_item<R: Rng + ?Sized>(rng: &mut R) -> (String, Rarity) {
    let slot = if rng.gen_bool(0.5) {
        ItemSlot::Weapon
    } else {
        ItemSlot::Armor
    };
    let rarity = roll_rarity(rng);

    let pick = |wanted: Rarity| -> Vec<&'static str> {
        ITEM_CATALOG
            .iter()
            .filter(|i| i.slot == slot && i.rarity == wanted)
            .map(|i| i.name)
            .collect()
    };

    let mut pool = pick(rarity);
    let mut rarity = rarity;
    if pool.is_empty() {
        pool = pick(Rarity::Common);
        rarity = Rarity::Common;
    }

    match pool.choose(rng) {
        Some(name) => (name.to_string(), rarity),
        None => ("Leather Vest".to_string(), Rarity::Common),
    }
}

pub fn adventure<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &mut Profile,
    location: &str,
) -> Result<AdventureReport, LootError> {
    let loc = find_location(location).ok_or_else(|| LootError::UnknownLocation(location.to_string()))?;
    check_level_requirement(profile, loc.level_requirement, loc.name)?;

    let coins = rng.gen_range(loc.coins.0..=loc.coins.1);
    let xp = rng.gen_range(loc.xp.0..=loc.xp.1);

    // +10% per level above the first.
    let level_pct = 100 + u64::from(profile.level.saturating_sub(1)) * 10;
    let base = Reward {
        coins: coins * level_pct / 100,
        xp: xp * level_pct / 100,
    };
    let reward = apply_luck(base, profile.luck);

    let mut items_found = Vec::new();
    if roll_with_luck(rng, ADVENTURE_ITEM_CHANCE, profile.luck) {
        if let Some(item) = loc.items.choose(rng) {
            items_found.push(item.to_string());
        }
    }

    profile.coins = profile.coins.saturating_add(reward.coins);
    profile.xp = profile.xp.saturating_add(reward.xp);
    profile.stats.adventure_count += 1;
    profile.inventory.extend(items_found.iter().cloned());

    let level_up = try_level_up(profile);
    debug!(user=%profile.user_id, location=%loc.id, coins=reward.coins, xp=reward.xp, "adventure finished");

    Ok(AdventureReport {
        location: loc.name.to_string(),
        description: loc.description.to_string(),
        luck: LuckTier::from_points(profile.luck),
        reward,
        items_found,
        level_up,
    })
}

pub fn open_lootbox<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &mut Profile,
) -> Result<LootboxReport, LootError> {
    check_level_requirement(profile, LOOTBOX_UNLOCK_LEVEL, "Lootboxes")?;
    if !profile.take_item(LOOTBOX_ITEM) {
        return Err(LootError::NoLootbox);
    }

    let coins = rng.gen_range(LOOTBOX_COINS.0..=LOOTBOX_COINS.1);
    let mut items = Vec::new();
    for _ in 0..LOOTBOX_ITEM_ROLLS {
        if roll_with_luck(rng, LOOTBOX_ITEM_CHANCE, profile.luck) {
            items.push(random_item(rng));
        }
    }
    if roll_with_luck(rng, LOOTBOX_JACKPOT_CHANCE, profile.luck) {
        if let Some(name) = OMNIPOTENT_ITEMS.choose(rng) {
            items.push((name.to_string(), Rarity::Omnipotent));
        }
    }

    profile.coins = profile.coins.saturating_add(coins);
    profile
        .inventory
        .extend(items.iter().map(|(name, _)| name.clone()));
    profile.stats.lootboxes_opened += 1;

    Ok(LootboxReport { coins, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::profile::UserId;
    use crate::model::tables::ADVENTURE_LOCATIONS;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn player(level: u32, luck: i32) -> Profile {
        let mut p = Profile::new(UserId::new("p"));
        p.level = level;
        p.luck = luck;
        p
    }

    #[test]
    fn luck_scales_rewards_by_tier() {
        let base = Reward { coins: 100, xp: 41 };
        assert_eq!(apply_luck(base, 0), base);
        assert_eq!(apply_luck(base, -500), Reward { coins: 75, xp: 30 });
        assert_eq!(apply_luck(base, -1), Reward { coins: 90, xp: 36 });
        assert_eq!(apply_luck(base, 150), Reward { coins: 115, xp: 47 });
        assert_eq!(apply_luck(base, 700), Reward { coins: 130, xp: 53 });
        assert_eq!(apply_luck(base, 5_000), Reward { coins: 150, xp: 61 });
    }

    #[test]
    fn adjusted_chance_is_clamped() {
        assert!((luck_adjusted_chance(0.3, 0) - 0.3).abs() < 1e-12);
        assert!((luck_adjusted_chance(0.4, 1000) - 0.6).abs() < 1e-12);
        assert_eq!(luck_adjusted_chance(0.9, 1000), 1.0);
        assert_eq!(luck_adjusted_chance(-0.5, 0), 0.0);
    }

    #[test]
    fn rarity_draw_tracks_the_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let draws = 100_000;
        let mut counts: HashMap<Rarity, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(roll_rarity(&mut rng)).or_default() += 1;
        }

        for rarity in [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Epic] {
            let observed = counts.get(&rarity).copied().unwrap_or(0) as f64 / draws as f64;
            assert!(
                (observed - rarity.weight()).abs() < 0.01,
                "{rarity:?}: observed {observed}"
            );
        }
        // Legendary is rare but must still appear.
        assert!(counts.get(&Rarity::Legendary).copied().unwrap_or(0) > 1_000);
    }

    #[test]
    fn random_items_come_from_the_catalogue() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let (name, rarity) = random_item(&mut rng);
            assert!(ITEM_CATALOG.iter().any(|i| i.name == name && i.rarity == rarity));
        }
    }

    #[test]
    fn adventure_is_level_gated() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = player(1, 0);
        assert!(matches!(
            adventure(&mut rng, &mut p, "dragon_lair"),
            Err(LootError::Gate(_))
        ));
        assert!(matches!(
            adventure(&mut rng, &mut p, "narnia"),
            Err(LootError::UnknownLocation(_))
        ));
        assert_eq!(p.stats.adventure_count, 0);
    }

    #[test]
    fn adventure_pays_within_the_scaled_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let loc = ADVENTURE_LOCATIONS.iter().find(|l| l.id == "forest").unwrap();
        for _ in 0..50 {
            // Level 3 -> +20%.
            let mut p = player(3, 0);
            p.xp = 0;
            let report = adventure(&mut rng, &mut p, "forest").unwrap();
            assert!(report.reward.coins >= loc.coins.0 * 120 / 100);
            assert!(report.reward.coins <= loc.coins.1 * 120 / 100);
            assert_eq!(p.coins, 100 + report.reward.coins);
            assert_eq!(p.stats.adventure_count, 1);
            for item in &report.items_found {
                assert!(loc.items.contains(&item.as_str()));
            }
        }
    }

    #[test]
    fn adventure_can_level_the_player() {
        // Always-succeeding rolls: max-range xp is not guaranteed, so seed the
        // profile right under the threshold instead.
        let mut rng = StepRng::new(0, 0);
        let mut p = player(1, 0);
        p.xp = 99;
        let report = adventure(&mut rng, &mut p, "training").unwrap();
        assert_eq!(report.level_up.map(|l| l.new_level), Some(2));
        assert_eq!(report.items_found.len(), 1);
    }

    #[test]
    fn lootbox_needs_level_and_a_box() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = player(10, 0);
        p.inventory.push(LOOTBOX_ITEM.into());
        assert!(matches!(open_lootbox(&mut rng, &mut p), Err(LootError::Gate(_))));

        let mut p = player(25, 0);
        assert!(matches!(open_lootbox(&mut rng, &mut p), Err(LootError::NoLootbox)));
    }

    #[test]
    fn lootbox_is_consumed_and_pays_out() {
        let mut rng = StepRng::new(0, 0);
        let mut p = player(25, 0);
        p.inventory.push(LOOTBOX_ITEM.into());

        let report = open_lootbox(&mut rng, &mut p).unwrap();
        assert!(!p.inventory.iter().any(|i| i == LOOTBOX_ITEM));
        assert!((100..=1000).contains(&report.coins));
        // Every roll succeeds: three catalogue items plus the jackpot.
        assert_eq!(report.items.len(), 4);
        assert_eq!(report.items[3].1, Rarity::Omnipotent);
        assert_eq!(p.inventory.len(), 4);
        assert_eq!(p.stats.lootboxes_opened, 1);
    }
}
