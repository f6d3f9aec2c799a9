use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use tracing::{debug, warn};

use crate::engine::error::StoreError;
use crate::model::profile::{Profile, UserId};

/// The external key-value store holding player profiles.
pub trait ProfileStore: Send + Sync {
    fn load(&self, user: &UserId) -> Result<Option<Profile>, StoreError>;
    fn save(&self, profile: &Profile) -> Result<(), StoreError>;
}

impl<S: ProfileStore + ?Sized> ProfileStore for Arc<S> {
    fn load(&self, user: &UserId) -> Result<Option<Profile>, StoreError> {
        (**self).load(user)
    }

    fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        (**self).save(profile)
    }
}

pub(crate) fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A store plus one lock per user, so read-modify-write cycles on the same
/// profile never interleave.
pub struct Profiles<S> {
    store: S,
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl<S: ProfileStore> Profiles<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn load(&self, user: &UserId) -> Result<Option<Profile>, StoreError> {
        self.store.load(user)
    }

    /// Runs `f` while holding the user's lock. The lock entry is dropped
    /// again once nobody else holds or waits on it, so the map only tracks
    /// users with a write in flight.
    fn with_user_lock<T>(&self, user: &UserId, f: impl FnOnce() -> T) -> T {
        let lock = relock(&self.locks)
            .entry(user.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let out = {
            let _guard = relock(&lock);
            f()
        };

        let mut locks = relock(&self.locks);
        // The map's copy plus ours.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user);
        }
        out
    }

    /// Atomically loads, mutates and saves one profile.
    ///
    /// Returns `Ok(None)` when the profile does not exist. The closure's
    /// changes are discarded if the save fails.
    pub fn update<T>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Profile) -> T,
    ) -> Result<Option<T>, StoreError> {
        self.try_update(user, |p| Ok::<T, StoreError>(f(p)))
    }

    /// Like [`Profiles::update`], but a closure error skips the save and is
    /// returned as is.
    pub fn try_update<T, E>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Profile) -> Result<T, E>,
    ) -> Result<Option<T>, E>
    where
        E: From<StoreError>,
    {
        self.with_user_lock(user, || {
            let Some(mut profile) = self.store.load(user)? else {
                return Ok(None);
            };
            let out = f(&mut profile)?;
            self.store.save(&profile)?;
            Ok(Some(out))
        })
    }

    /// Saves a brand-new profile unless one already exists.
    pub fn create(&self, profile: Profile) -> Result<bool, StoreError> {
        self.with_user_lock(&profile.user_id, || {
            if self.store.load(&profile.user_id)?.is_some() {
                return Ok(false);
            }
            self.store.save(&profile)?;
            Ok(true)
        })
    }
}

/* =========================
   In-memory store
   ========================= */

/// Process-local store. Can be told to fail saves, to exercise retry paths.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<UserId, Profile>>,
    failing_saves: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let store = Self::new();
        {
            let mut map = relock(&store.profiles);
            for p in profiles {
                map.insert(p.user_id.clone(), p);
            }
        }
        store
    }

    /// The next `n` saves return `StoreError::Unavailable`.
    pub fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self, user: &UserId) -> Result<Option<Profile>, StoreError> {
        Ok(relock(&self.profiles).get(user).cloned())
    }

    fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        let failing = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(StoreError::Unavailable("injected save failure".into()));
        }

        relock(&self.profiles).insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

/* =========================
   JSON file store
   ========================= */

/// All profiles in one JSON document, rewritten through a temp file.
pub struct JsonProfileStore {
    path: PathBuf,
    file_lock: Mutex<()>,
}

impl JsonProfileStore {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating data dir {}", dir.display()))?;

        let path = dir.join("profiles.json");
        if !path.exists() {
            fs::write(&path, "{}")
                .with_context(|| format!("initialising {}", path.display()))?;
        }
        debug!(path=%path.display(), "profile store opened");

        Ok(Self {
            path,
            file_lock: Mutex::new(()),
        })
    }

    fn read_all(&self) -> Result<HashMap<UserId, Profile>, StoreError> {
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

impl ProfileStore for JsonProfileStore {
    fn load(&self, user: &UserId) -> Result<Option<Profile>, StoreError> {
        let _guard = relock(&self.file_lock);
        Ok(self.read_all()?.remove(user))
    }

    fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        let _guard = relock(&self.file_lock);
        let mut all = self.read_all()?;
        all.insert(profile.user_id.clone(), profile.clone());

        let json = serde_json::to_string_pretty(&all)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!(err=%e, path=%self.path.display(), "profile store rename failed");
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn profile(id: &str) -> Profile {
        Profile::new(UserId::new(id))
    }

    #[test]
    fn update_of_missing_profile_is_none() {
        let profiles = Profiles::new(MemoryProfileStore::new());
        let out = profiles.update(&UserId::new("ghost"), |p| p.coins += 1).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn failed_save_discards_the_change() {
        let store = Arc::new(MemoryProfileStore::with_profiles([profile("a")]));
        let profiles = Profiles::new(Arc::clone(&store));
        store.fail_next_saves(1);

        let err = profiles.update(&UserId::new("a"), |p| p.coins += 50);
        assert!(matches!(err, Err(StoreError::Unavailable(_))));

        let p = profiles.load(&UserId::new("a")).unwrap().unwrap();
        assert_eq!(p.coins, 100);
    }

    #[test]
    fn concurrent_updates_do_not_lose_writes() {
        let profiles = Arc::new(Profiles::new(MemoryProfileStore::with_profiles([profile("a")])));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let profiles = Arc::clone(&profiles);
                thread::spawn(move || {
                    for _ in 0..25 {
                        profiles.update(&UserId::new("a"), |p| p.coins += 1).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let p = profiles.load(&UserId::new("a")).unwrap().unwrap();
        assert_eq!(p.coins, 100 + 8 * 25);
        assert!(relock(&profiles.locks).is_empty());
    }

    #[test]
    fn rejected_update_is_not_saved() {
        let store = Arc::new(MemoryProfileStore::with_profiles([profile("a")]));
        let profiles = Profiles::new(Arc::clone(&store));
        store.fail_next_saves(1);

        // The armed failure is not consumed by a closure that bails out.
        let out: Result<Option<()>, StoreError> = profiles.try_update(&UserId::new("a"), |p| {
            p.coins = 0;
            Err(StoreError::Unavailable("refused".into()))
        });
        assert!(matches!(out, Err(StoreError::Unavailable(ref m)) if m == "refused"));
        assert_eq!(profiles.load(&UserId::new("a")).unwrap().unwrap().coins, 100);

        let err = profiles.update(&UserId::new("a"), |p| p.coins += 1).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(ref m) if m == "injected save failure"));
    }

    #[test]
    fn lock_entries_are_released_after_use() {
        let profiles = Profiles::new(MemoryProfileStore::with_profiles([profile("a")]));
        for i in 0..50 {
            profiles.update(&UserId::new("a"), |p| p.coins += 1).unwrap();
            profiles.create(profile(&format!("new{i}"))).unwrap();
        }
        assert!(relock(&profiles.locks).is_empty());
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let profiles = Profiles::new(MemoryProfileStore::new());
        assert!(profiles.create(profile("a")).unwrap());

        let mut again = profile("a");
        again.coins = 9_999;
        assert!(!profiles.create(again).unwrap());
        assert_eq!(profiles.load(&UserId::new("a")).unwrap().unwrap().coins, 100);
    }

    #[test]
    fn json_store_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("rpg_arena_bot_store_{}", std::process::id()));
        let store = JsonProfileStore::open(&dir).unwrap();

        let mut p = profile("disk");
        p.inventory.push("Health Potion".into());
        store.save(&p).unwrap();

        let reopened = JsonProfileStore::open(&dir).unwrap();
        assert_eq!(reopened.load(&UserId::new("disk")).unwrap(), Some(p));
        assert_eq!(reopened.load(&UserId::new("nobody")).unwrap(), None);

        let _ = fs::remove_dir_all(&dir);
    }
}
