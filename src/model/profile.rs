use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque chat-platform user key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Per-player counters kept on the persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub pvp_wins: u32,
    pub pvp_losses: u32,
    pub adventure_count: u32,
    pub lootboxes_opened: u32,
    pub items_purchased: u32,
}

/// The durable player record held by the external store.
///
/// Battles only ever read a copy of this; the single write-back path is
/// settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub user_id: UserId,
    pub level: u32,
    pub xp: u64,
    pub max_xp: u64,
    pub coins: u64,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub mana: u32,
    pub max_mana: u32,

    /// Accumulated luck points, clamped on use.
    pub luck: i32,

    pub inventory: Vec<String>,
    pub stats: PlayerStats,

    /// Profession id once chosen; gates crafting.
    pub profession: Option<String>,
}

impl Profile {
    /// A fresh level-1 character.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Removes one copy of `item`, returning whether anything was removed.
    pub fn take_item(&mut self, item: &str) -> bool {
        match self.inventory.iter().position(|i| i == item) {
            Some(idx) => {
                self.inventory.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            user_id: UserId::default(),
            level: 1,
            xp: 0,
            max_xp: 100,
            coins: 100,
            hp: 100,
            max_hp: 100,
            attack: 10,
            defense: 5,
            mana: 50,
            max_mana: 50,
            luck: 0,
            inventory: Vec::new(),
            stats: PlayerStats::default(),
            profession: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_matches_starting_stats() {
        let p = Profile::new(UserId::new("42"));
        assert_eq!(p.level, 1);
        assert_eq!((p.hp, p.max_hp), (100, 100));
        assert_eq!((p.attack, p.defense), (10, 5));
        assert_eq!(p.coins, 100);
        assert_eq!(p.max_xp, 100);
    }

    #[test]
    fn take_item_removes_a_single_copy() {
        let mut p = Profile::new(UserId::new("1"));
        p.inventory = vec!["Health Potion".into(), "Health Potion".into()];
        assert!(p.take_item("Health Potion"));
        assert_eq!(p.inventory.len(), 1);
        assert!(!p.take_item("Lootbox"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let p: Profile = serde_json::from_str(r#"{"user_id":"7","coins":5}"#).unwrap();
        assert_eq!(p.user_id, UserId::new("7"));
        assert_eq!(p.coins, 5);
        assert_eq!(p.level, 1);
        assert_eq!(p.stats, PlayerStats::default());
    }
}
