use rand::RngCore;
use tracing::info;

use crate::engine::error::PlayerError;
use crate::engine::progression::check_level_requirement;
use crate::engine::service::GameService;
use crate::engine::store::{relock, ProfileStore};
use crate::engine::{loot, shop};
use crate::model::event_result::{AdventureReport, LootboxReport, PurchaseReceipt};
use crate::model::profile::{Profile, UserId};
use crate::model::tables::{find_profession, Profession, ShopItem, PROFESSION_UNLOCK_LEVEL};

impl<S, R> GameService<S, R>
where
    S: ProfileStore,
    R: RngCore + Send,
{
    /// Creates a default profile for a new player.
    pub fn start_profile(&self, user: &UserId) -> Result<Profile, PlayerError> {
        let profile = Profile::new(user.clone());
        if !self.profiles.create(profile.clone())? {
            return Err(PlayerError::AlreadyStarted);
        }
        info!(user=%user, "new adventurer");
        Ok(profile)
    }

    pub fn profile(&self, user: &UserId) -> Result<Profile, PlayerError> {
        self.profiles.load(user)?.ok_or(PlayerError::NoProfile)
    }

    pub fn adventure(&self, user: &UserId, location: &str) -> Result<AdventureReport, PlayerError> {
        self.profiles
            .try_update(user, |profile| {
                let mut rng = relock(&self.rng);
                Ok::<_, PlayerError>(loot::adventure(&mut *rng, profile, location)?)
            })?
            .ok_or(PlayerError::NoProfile)
    }

    pub fn open_lootbox(&self, user: &UserId) -> Result<LootboxReport, PlayerError> {
        self.profiles
            .try_update(user, |profile| {
                let mut rng = relock(&self.rng);
                Ok::<_, PlayerError>(loot::open_lootbox(&mut *rng, profile)?)
            })?
            .ok_or(PlayerError::NoProfile)
    }

    /// The player's profile plus what the shop will sell them.
    pub fn shop(&self, user: &UserId) -> Result<(Profile, Vec<&'static ShopItem>), PlayerError> {
        let profile = self.profile(user)?;
        let items = shop::listing(profile.level);
        Ok((profile, items))
    }

    pub fn buy_item(&self, user: &UserId, item: &str) -> Result<PurchaseReceipt, PlayerError> {
        let receipt = self
            .profiles
            .try_update(user, |profile| Ok::<_, PlayerError>(shop::purchase(profile, item)?))?
            .ok_or(PlayerError::NoProfile)?;
        info!(user=%user, item=%receipt.item, price=receipt.price, "item bought");
        Ok(receipt)
    }

    /// Shows the current profession, or picks one when `choice` is given.
    ///
    /// Both require the profession level; a choice is permanent.
    pub fn profession(
        &self,
        user: &UserId,
        choice: Option<&str>,
    ) -> Result<Option<&'static Profession>, PlayerError> {
        self.profiles
            .try_update(user, |profile| {
                check_level_requirement(profile, PROFESSION_UNLOCK_LEVEL, "Professions")?;
                let current = profile.profession.as_deref().and_then(find_profession);
                let Some(choice) = choice else {
                    return Ok(current);
                };
                if let Some(held) = current {
                    return Err(PlayerError::ProfessionChosen(held.name.to_string()));
                }
                let picked = find_profession(choice)
                    .ok_or_else(|| PlayerError::UnknownProfession(choice.trim().to_string()))?;
                profile.profession = Some(picked.id.to_string());
                info!(user=%profile.user_id, profession=picked.id, "profession chosen");
                Ok(Some(picked))
            })?
            .ok_or(PlayerError::NoProfile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::{ErrorKind, LootError, ShopError, StoreError};
    use crate::engine::service::ServiceConfig;
    use crate::engine::store::MemoryProfileStore;
    use crate::model::tables::LOOTBOX_ITEM;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn service(profiles: Vec<Profile>) -> GameService<MemoryProfileStore, StdRng> {
        GameService::new(
            MemoryProfileStore::with_profiles(profiles),
            StdRng::seed_from_u64(9),
            ServiceConfig::default(),
        )
    }

    #[test]
    fn start_creates_once() {
        let svc = service(vec![]);
        let who = UserId::new("new");
        assert!(matches!(svc.profile(&who), Err(PlayerError::NoProfile)));

        let p = svc.start_profile(&who).unwrap();
        assert_eq!((p.level, p.coins), (1, 100));
        assert!(matches!(svc.start_profile(&who), Err(PlayerError::AlreadyStarted)));
    }

    #[test]
    fn adventure_persists_rewards() {
        let svc = service(vec![Profile::new(UserId::new("p"))]);
        let report = svc.adventure(&UserId::new("p"), "training").unwrap();

        let saved = svc.profile(&UserId::new("p")).unwrap();
        assert_eq!(saved.coins, 100 + report.reward.coins);
        assert_eq!(saved.stats.adventure_count, 1);
    }

    #[test]
    fn gated_adventure_changes_nothing() {
        let svc = service(vec![Profile::new(UserId::new("p"))]);
        let err = svc.adventure(&UserId::new("p"), "dungeon").unwrap_err();
        assert!(matches!(err, PlayerError::Loot(LootError::Gate(_))));
        assert_eq!(svc.profile(&UserId::new("p")).unwrap(), Profile::new(UserId::new("p")));
    }

    #[test]
    fn lootbox_is_removed_from_the_stored_profile() {
        let mut p = Profile::new(UserId::new("p"));
        p.level = 25;
        p.inventory.push(LOOTBOX_ITEM.into());
        let svc = service(vec![p]);

        svc.open_lootbox(&UserId::new("p")).unwrap();
        let saved = svc.profile(&UserId::new("p")).unwrap();
        assert!(!saved.inventory.iter().any(|i| i == LOOTBOX_ITEM));
        assert_eq!(saved.stats.lootboxes_opened, 1);

        assert!(matches!(
            svc.open_lootbox(&UserId::new("p")),
            Err(PlayerError::Loot(LootError::NoLootbox))
        ));
    }

    #[test]
    fn unknown_user_cannot_adventure() {
        let svc = service(vec![]);
        assert!(matches!(
            svc.adventure(&UserId::new("ghost"), "training"),
            Err(PlayerError::NoProfile)
        ));
    }

    #[test]
    fn buying_without_coins_is_refused() {
        let mut p = Profile::new(UserId::new("p"));
        p.coins = 20;
        let svc = service(vec![p.clone()]);

        let err = svc.buy_item(&UserId::new("p"), "health potion").unwrap_err();
        assert!(matches!(
            err,
            PlayerError::Shop(ShopError::InsufficientFunds { price: 30, coins: 20, .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(svc.profile(&UserId::new("p")).unwrap(), p);
    }

    #[test]
    fn bought_lootbox_can_be_opened() {
        let mut p = Profile::new(UserId::new("p"));
        p.level = 25;
        p.coins = 1_500;
        let svc = service(vec![p]);
        let who = UserId::new("p");

        let receipt = svc.buy_item(&who, "lootbox").unwrap();
        assert_eq!((receipt.price, receipt.remaining_coins), (1_000, 500));

        let bought = svc.profile(&who).unwrap();
        assert_eq!(bought.inventory, vec![LOOTBOX_ITEM.to_string()]);
        assert_eq!(bought.stats.items_purchased, 1);

        let report = svc.open_lootbox(&who).unwrap();
        let opened = svc.profile(&who).unwrap();
        assert!(!opened.inventory.iter().any(|i| i == LOOTBOX_ITEM));
        assert_eq!(opened.coins, 500 + report.coins);
        assert_eq!(opened.stats.lootboxes_opened, 1);
    }

    #[test]
    fn shop_lists_by_level() {
        let svc = service(vec![Profile::new(UserId::new("p"))]);
        let (profile, items) = svc.shop(&UserId::new("p")).unwrap();
        assert_eq!(profile.level, 1);
        assert!(items.iter().all(|i| i.level_requirement <= 1));
        assert!(matches!(svc.shop(&UserId::new("ghost")), Err(PlayerError::NoProfile)));
    }

    #[test]
    fn profession_is_gated_and_permanent() {
        let mut p = Profile::new(UserId::new("p"));
        p.level = 9;
        let svc = service(vec![p.clone()]);
        let who = UserId::new("p");
        assert!(matches!(svc.profession(&who, None), Err(PlayerError::Gate(_))));

        p.level = 10;
        let svc = service(vec![p]);
        assert_eq!(svc.profession(&who, None).unwrap(), None);
        assert!(matches!(
            svc.profession(&who, Some("bard")),
            Err(PlayerError::UnknownProfession(_))
        ));
        assert_eq!(svc.profession(&who, Some("Alchemist")).unwrap().map(|p| p.id), Some("alchemist"));
        assert!(matches!(
            svc.profession(&who, Some("blacksmith")),
            Err(PlayerError::ProfessionChosen(_))
        ));
        assert_eq!(svc.profile(&who).unwrap().profession.as_deref(), Some("alchemist"));
    }

    #[test]
    fn refused_command_leaves_the_store_untouched() {
        let store = Arc::new(MemoryProfileStore::with_profiles([Profile::new(UserId::new("p"))]));
        let svc = GameService::new(Arc::clone(&store), StdRng::seed_from_u64(9), ServiceConfig::default());
        store.fail_next_saves(1);

        // A gated adventure bails before the save, so the armed failure is still there.
        assert!(matches!(
            svc.adventure(&UserId::new("p"), "dungeon"),
            Err(PlayerError::Loot(LootError::Gate(_)))
        ));
        assert!(matches!(
            svc.adventure(&UserId::new("p"), "training"),
            Err(PlayerError::Store(StoreError::Unavailable(_)))
        ));
        assert_eq!(svc.profile(&UserId::new("p")).unwrap().stats.adventure_count, 0);
    }
}
