//! Static game tables the core arithmetic reads.
//!
//! Content here is configuration, not logic. Keep entries sorted the way the
//! help output lists them.

use serde::{Deserialize, Serialize};

/* =========================
   Arenas
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arena {
    pub id: &'static str,
    pub name: &'static str,
    pub entry_fee: u64,
    /// Winner payout as a percentage of the entry fee (180 = 1.8x).
    pub winner_multiplier_pct: u64,
    pub level_requirement: u32,
}

impl Arena {
    pub fn winner_reward(&self) -> u64 {
        self.entry_fee * self.winner_multiplier_pct / 100
    }
}

pub const DEFAULT_ARENA: &str = "training_ground";

pub static ARENAS: &[Arena] = &[
    Arena { id: "training_ground", name: "Training Ground", entry_fee: 0, winner_multiplier_pct: 120, level_requirement: 5 },
    Arena { id: "colosseum", name: "Colosseum", entry_fee: 100, winner_multiplier_pct: 180, level_requirement: 10 },
    Arena { id: "cheese_pit", name: "The Cheese Pit", entry_fee: 100, winner_multiplier_pct: 180, level_requirement: 10 },
    Arena { id: "dragon_pit", name: "Dragon Pit", entry_fee: 500, winner_multiplier_pct: 250, level_requirement: 20 },
    Arena { id: "miraculous_arena", name: "Miraculous Colosseum", entry_fee: 500, winner_multiplier_pct: 250, level_requirement: 20 },
    Arena { id: "kwami_realm", name: "Kwami Dimension", entry_fee: 1000, winner_multiplier_pct: 300, level_requirement: 30 },
    Arena { id: "shadow_realm", name: "Shadow Realm", entry_fee: 2000, winner_multiplier_pct: 400, level_requirement: 40 },
];

/// Looks an arena up by id or display name, ignoring case and `_`/space.
pub fn find_arena(key: &str) -> Option<&'static Arena> {
    let wanted = normalize(key);
    ARENAS
        .iter()
        .find(|a| normalize(a.id) == wanted || normalize(a.name) == wanted)
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/* =========================
   Battle constants
   ========================= */

pub const MAX_ENERGY: u32 = 100;
pub const ENERGY_REGEN: u32 = 25;
pub const ATTACK_COST: u32 = 20;
pub const DEFEND_COST: u32 = 15;
pub const SPECIAL_COST: u32 = 40;
pub const ITEM_COST: u32 = 0;

/// Crit chance for attack and special.
pub const CRIT_CHANCE: f64 = 0.15;
pub const CRIT_MULTIPLIER_PCT: u64 = 150;

pub const DEFEND_REDUCTION_PCT: u32 = 50;
pub const STUN_TURNS: u32 = 1;
pub const HEAL_AMOUNT: u32 = 50;

/// Healing items are anything sold as a potion.
pub fn is_healing_item(item: &str) -> bool {
    item.to_lowercase().contains("potion")
}

/* =========================
   Progression
   ========================= */

pub const BASE_XP: f64 = 100.0;
pub const XP_MULTIPLIER: f64 = 1.5;
pub const MAX_LEVEL: u32 = 100;

pub const LEVEL_HP_GAIN: u32 = 10;
pub const LEVEL_ATTACK_GAIN: u32 = 2;
pub const LEVEL_DEFENSE_GAIN: u32 = 1;
pub const LEVEL_MANA_GAIN: u32 = 5;

pub const PVP_UNLOCK_LEVEL: u32 = 5;
pub const LOOTBOX_UNLOCK_LEVEL: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    PvpCombat,
    Professions,
    Dungeons,
    Factions,
    Lootboxes,
    AuctionHouse,
    LegendaryEquipment,
}

impl Feature {
    pub fn label(&self) -> &'static str {
        match self {
            Feature::PvpCombat => "PvP Combat",
            Feature::Professions => "Professions",
            Feature::Dungeons => "Dungeons",
            Feature::Factions => "Factions",
            Feature::Lootboxes => "Lootboxes",
            Feature::AuctionHouse => "Auction House",
            Feature::LegendaryEquipment => "Legendary Equipment",
        }
    }
}

pub static FEATURE_UNLOCKS: &[(u32, Feature)] = &[
    (5, Feature::PvpCombat),
    (10, Feature::Professions),
    (15, Feature::Dungeons),
    (20, Feature::Factions),
    (25, Feature::Lootboxes),
    (30, Feature::AuctionHouse),
    (40, Feature::LegendaryEquipment),
];

/* =========================
   Luck
   ========================= */

pub const MAX_LUCK: i32 = 1000;
pub const MIN_LUCK: i32 = -1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LuckTier {
    Cursed,
    Unlucky,
    Normal,
    Lucky,
    Blessed,
    Divine,
}

impl LuckTier {
    pub fn from_points(points: i32) -> Self {
        match points.clamp(MIN_LUCK, MAX_LUCK) {
            i32::MIN..=-100 => LuckTier::Cursed,
            -99..=-1 => LuckTier::Unlucky,
            0..=99 => LuckTier::Normal,
            100..=499 => LuckTier::Lucky,
            500..=999 => LuckTier::Blessed,
            _ => LuckTier::Divine,
        }
    }

    pub fn bonus_percent(&self) -> i64 {
        match self {
            LuckTier::Cursed => -25,
            LuckTier::Unlucky => -10,
            LuckTier::Normal => 0,
            LuckTier::Lucky => 15,
            LuckTier::Blessed => 30,
            LuckTier::Divine => 50,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LuckTier::Cursed => "cursed",
            LuckTier::Unlucky => "unlucky",
            LuckTier::Normal => "normal",
            LuckTier::Lucky => "lucky",
            LuckTier::Blessed => "blessed",
            LuckTier::Divine => "divine",
        }
    }
}

/* =========================
   Rarity and items
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Divine,
    Omnipotent,
}

impl Rarity {
    pub const ALL: [Rarity; 8] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
        Rarity::Divine,
        Rarity::Omnipotent,
    ];

    /// Categorical draw weights, summing to 1 across all tiers.
    pub fn weight(&self) -> f64 {
        match self {
            Rarity::Common => 0.50,
            Rarity::Uncommon => 0.25,
            Rarity::Rare => 0.15,
            Rarity::Epic => 0.07,
            Rarity::Legendary => 0.025,
            Rarity::Mythic => 0.004,
            Rarity::Divine => 0.0009,
            Rarity::Omnipotent => 0.0001,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Mythic => "mythic",
            Rarity::Divine => "divine",
            Rarity::Omnipotent => "omnipotent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSlot {
    Weapon,
    Armor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: &'static str,
    pub slot: ItemSlot,
    pub rarity: Rarity,
}

pub static ITEM_CATALOG: &[CatalogItem] = &[
    CatalogItem { name: "Iron Petal", slot: ItemSlot::Weapon, rarity: Rarity::Common },
    CatalogItem { name: "Apprentice Wand", slot: ItemSlot::Weapon, rarity: Rarity::Common },
    CatalogItem { name: "Steel Sword", slot: ItemSlot::Weapon, rarity: Rarity::Uncommon },
    CatalogItem { name: "Mystic Blade", slot: ItemSlot::Weapon, rarity: Rarity::Rare },
    CatalogItem { name: "Guardian's Might", slot: ItemSlot::Weapon, rarity: Rarity::Epic },
    CatalogItem { name: "Archmage Staff", slot: ItemSlot::Weapon, rarity: Rarity::Legendary },
    CatalogItem { name: "The Last Echo", slot: ItemSlot::Weapon, rarity: Rarity::Mythic },
    CatalogItem { name: "The Paradox Core", slot: ItemSlot::Weapon, rarity: Rarity::Mythic },
    CatalogItem { name: "Leather Vest", slot: ItemSlot::Armor, rarity: Rarity::Common },
    CatalogItem { name: "Iron Chestplate", slot: ItemSlot::Armor, rarity: Rarity::Uncommon },
    CatalogItem { name: "Mage Robes", slot: ItemSlot::Armor, rarity: Rarity::Uncommon },
    CatalogItem { name: "Shadow Cloak", slot: ItemSlot::Armor, rarity: Rarity::Rare },
    CatalogItem { name: "Ranger's Coat", slot: ItemSlot::Armor, rarity: Rarity::Rare },
    CatalogItem { name: "Dragon Scale Armor", slot: ItemSlot::Armor, rarity: Rarity::Legendary },
];

/// Jackpot items from the lootbox's omnipotent roll.
pub static OMNIPOTENT_ITEMS: &[&str] = &["World Ender", "Reality Stone"];

pub const LOOTBOX_ITEM: &str = "Lootbox";

/* =========================
   Shop
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopCategory {
    Weapons,
    Armor,
    Consumables,
}

impl ShopCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ShopCategory::Weapons => "Weapons",
            ShopCategory::Armor => "Armor",
            ShopCategory::Consumables => "Consumables",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u64,
    pub level_requirement: u32,
    pub category: ShopCategory,
    pub rarity: Rarity,
    pub description: &'static str,
}

macro_rules! shop_item {
    ($id:literal, $name:literal, $price:literal, $level:literal, $cat:ident, $rarity:ident, $desc:literal) => {
        ShopItem {
            id: $id,
            name: $name,
            price: $price,
            level_requirement: $level,
            category: ShopCategory::$cat,
            rarity: Rarity::$rarity,
            description: $desc,
        }
    };
}

pub static SHOP_ITEMS: &[ShopItem] = &[
    shop_item!("weapon_001", "Training Sword", 50, 1, Weapons, Common, "A practice sword for beginners"),
    shop_item!("weapon_002", "Iron Sword", 150, 3, Weapons, Common, "A basic iron sword"),
    shop_item!("armor_001", "Cloth Armor", 80, 1, Armor, Common, "Simple cloth protection"),
    shop_item!("armor_002", "Leather Armor", 200, 3, Armor, Common, "Basic leather protection"),
    shop_item!("item_001", "Health Potion", 30, 1, Consumables, Common, "Restores 50 HP"),
    shop_item!("item_002", "Mana Potion", 40, 5, Consumables, Common, "Restores 50 MP"),
    shop_item!("item_003", "Energy Drink", 100, 5, Consumables, Uncommon, "Restores battle energy"),
    shop_item!("weapon_003", "Steel Sword", 500, 10, Weapons, Uncommon, "A well-forged steel blade"),
    shop_item!("weapon_004", "Enchanted Blade", 1200, 15, Weapons, Rare, "A blade infused with magic"),
    shop_item!("armor_003", "Chain Mail", 600, 10, Armor, Uncommon, "Interlocked metal rings"),
    shop_item!("armor_004", "Plate Armor", 1500, 15, Armor, Rare, "Heavy protective plates"),
    shop_item!("weapon_005", "Guardian's Shield", 2000, 15, Weapons, Epic, "A warrior's protective weapon"),
    shop_item!("weapon_006", "Sorcerer's Staff", 2200, 15, Weapons, Epic, "Amplifies magical power"),
    shop_item!("weapon_007", "Shadow Daggers", 2500, 15, Weapons, Epic, "Twin blades for assassins"),
    shop_item!("item_007", "Lootbox", 1000, 25, Consumables, Rare, "Contains random rewards"),
    shop_item!("item_008", "Lucky Charm", 800, 20, Consumables, Rare, "Increases luck temporarily"),
    shop_item!("weapon_008", "Dragon Slayer", 10000, 40, Weapons, Legendary, "Forged to slay dragons"),
    shop_item!("armor_005", "Celestial Robes", 12000, 40, Armor, Legendary, "Blessed by celestial beings"),
];

/// Looks a shop item up by id or name, ignoring case and `_`/space.
pub fn find_shop_item(key: &str) -> Option<&'static ShopItem> {
    let wanted = normalize(key);
    SHOP_ITEMS
        .iter()
        .find(|i| normalize(i.id) == wanted || normalize(i.name) == wanted)
}

/* =========================
   Professions
   ========================= */

/// Level needed for the profession (crafting) system.
pub const PROFESSION_UNLOCK_LEVEL: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profession {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Crafting disciplines. Choosing one is permanent; recipes hang off it.
pub static PROFESSIONS: &[Profession] = &[
    Profession {
        id: "blacksmith",
        name: "Forger",
        description: "Crafts weapons and armor",
    },
    Profession {
        id: "alchemist",
        name: "Potion Master",
        description: "Brews potions and elixirs",
    },
    Profession {
        id: "enchanter",
        name: "Enchanter",
        description: "Imbues items with magical properties",
    },
];

pub fn find_profession(key: &str) -> Option<&'static Profession> {
    let wanted = normalize(key);
    PROFESSIONS
        .iter()
        .find(|p| p.id == wanted || normalize(p.name) == wanted)
}

/* =========================
   Adventures
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdventureLocation {
    pub id: &'static str,
    pub name: &'static str,
    pub level_requirement: u32,
    pub coins: (u64, u64),
    pub xp: (u64, u64),
    pub items: &'static [&'static str],
    pub description: &'static str,
}

pub static ADVENTURE_LOCATIONS: &[AdventureLocation] = &[
    AdventureLocation {
        id: "training",
        name: "Training Grounds",
        level_requirement: 1,
        coins: (10, 30),
        xp: (5, 15),
        items: &["Training Sword", "Health Potion"],
        description: "You practice your combat skills in safety.",
    },
    AdventureLocation {
        id: "forest",
        name: "Peaceful Forest",
        level_requirement: 3,
        coins: (30, 70),
        xp: (15, 35),
        items: &["Iron Sword", "Leather Armor", "Health Potion"],
        description: "You venture through peaceful woodlands.",
    },
    AdventureLocation {
        id: "mountains",
        name: "Dangerous Mountains",
        level_requirement: 8,
        coins: (60, 120),
        xp: (30, 60),
        items: &["Steel Sword", "Chain Mail", "Mana Potion"],
        description: "You brave the treacherous mountain paths.",
    },
    AdventureLocation {
        id: "dungeon",
        name: "Ancient Dungeon",
        level_requirement: 15,
        coins: (100, 200),
        xp: (50, 100),
        items: &["Mystic Blade", "Plate Armor", "Lucky Charm"],
        description: "You explore dark underground chambers.",
    },
    AdventureLocation {
        id: "dragon_lair",
        name: "Dragon Lair",
        level_requirement: 25,
        coins: (200, 500),
        xp: (100, 250),
        items: &["Dragon Slayer", "Dragon Scale Armor", "Phoenix Feather"],
        description: "You dare to enter the legendary dragon's domain.",
    },
];

pub fn find_location(key: &str) -> Option<&'static AdventureLocation> {
    let wanted = normalize(key);
    ADVENTURE_LOCATIONS
        .iter()
        .find(|l| normalize(l.id) == wanted || normalize(l.name) == wanted)
}
