use serde::{Deserialize, Serialize};

use crate::model::battle::BattleId;
use crate::model::profile::UserId;
use crate::model::tables::{Feature, LuckTier, Rarity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    Applied,
    /// Nothing left to write; a repeat call is a no-op.
    AlreadySettled,
    /// A write failed and was queued for retry.
    Deferred { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub battle_id: BattleId,
    pub winner: UserId,
    pub loser: UserId,
    pub coins_won: u64,
    pub coins_lost: u64,
    pub outcome: SettlementOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpSummary {
    pub new_level: u32,
    pub carried_xp: u64,
    pub next_level_xp: u64,
    pub hp_gain: u32,
    pub attack_gain: u32,
    pub defense_gain: u32,
    pub mana_gain: u32,
    pub unlocked: Vec<Feature>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub coins: u64,
    pub xp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureReport {
    pub location: String,
    pub description: String,
    pub luck: LuckTier,
    pub reward: Reward,
    pub items_found: Vec<String>,
    pub level_up: Option<LevelUpSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootboxReport {
    pub coins: u64,
    pub items: Vec<(String, Rarity)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub item: String,
    pub rarity: Rarity,
    pub price: u64,
    pub remaining_coins: u64,
}
