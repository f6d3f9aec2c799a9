use tracing::debug;

use crate::engine::error::ShopError;
use crate::engine::progression::check_level_requirement;
use crate::model::event_result::PurchaseReceipt;
use crate::model::profile::Profile;
use crate::model::tables::{find_shop_item, ShopItem, SHOP_ITEMS};

/// Items the profile's level allows, cheapest first.
pub fn listing(level: u32) -> Vec<&'static ShopItem> {
    let mut items: Vec<&'static ShopItem> = SHOP_ITEMS
        .iter()
        .filter(|i| i.level_requirement <= level)
        .collect();
    items.sort_by_key(|i| (i.category.label(), i.price));
    items
}

/// Buys one copy of `key`. Nothing changes unless every check passes.
pub fn purchase(profile: &mut Profile, key: &str) -> Result<PurchaseReceipt, ShopError> {
    let item = find_shop_item(key).ok_or_else(|| ShopError::UnknownItem(key.trim().to_string()))?;
    check_level_requirement(profile, item.level_requirement, item.name)?;
    if profile.coins < item.price {
        return Err(ShopError::InsufficientFunds {
            item: item.name.to_string(),
            price: item.price,
            coins: profile.coins,
        });
    }

    profile.coins -= item.price;
    profile.inventory.push(item.name.to_string());
    profile.stats.items_purchased += 1;
    debug!(user=%profile.user_id, item=%item.id, price=item.price, "purchase");

    Ok(PurchaseReceipt {
        item: item.name.to_string(),
        rarity: item.rarity,
        price: item.price,
        remaining_coins: profile.coins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::profile::UserId;
    use crate::model::tables::LOOTBOX_ITEM;

    fn buyer(level: u32, coins: u64) -> Profile {
        let mut p = Profile::new(UserId::new("buyer"));
        p.level = level;
        p.coins = coins;
        p
    }

    #[test]
    fn purchase_moves_coins_into_an_item() {
        let mut p = buyer(1, 100);
        let receipt = purchase(&mut p, "health potion").unwrap();
        assert_eq!(receipt.item, "Health Potion");
        assert_eq!((receipt.price, receipt.remaining_coins), (30, 70));
        assert_eq!(p.coins, 70);
        assert_eq!(p.inventory, vec!["Health Potion".to_string()]);
        assert_eq!(p.stats.items_purchased, 1);
    }

    #[test]
    fn short_of_coins_changes_nothing() {
        let mut p = buyer(30, 999);
        let before = p.clone();
        let err = purchase(&mut p, LOOTBOX_ITEM).unwrap_err();
        assert_eq!(
            err,
            ShopError::InsufficientFunds {
                item: LOOTBOX_ITEM.into(),
                price: 1000,
                coins: 999
            }
        );
        assert_eq!(err.to_string(), "Lootbox costs 1000 coins; you have 999");
        assert_eq!(p, before);
    }

    #[test]
    fn level_gate_and_unknown_items() {
        let mut p = buyer(24, 50_000);
        assert!(matches!(purchase(&mut p, "lootbox"), Err(ShopError::Gate(_))));
        assert!(matches!(
            purchase(&mut p, "excalibur"),
            Err(ShopError::UnknownItem(ref name)) if name == "excalibur"
        ));
        assert_eq!(p.coins, 50_000);
        assert!(p.inventory.is_empty());
    }

    #[test]
    fn listing_follows_level() {
        let names: Vec<&str> = listing(1).iter().map(|i| i.name).collect();
        assert!(names.contains(&"Health Potion"));
        assert!(!names.contains(&LOOTBOX_ITEM));
        assert!(listing(25).iter().any(|i| i.name == LOOTBOX_ITEM));
        assert_eq!(listing(100).len(), SHOP_ITEMS.len());
    }
}
