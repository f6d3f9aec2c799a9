use crate::engine::error::ErrorKind;
use crate::engine::service::TurnResult;
use crate::model::battle::{ActionKind, BattleId, BattleSnapshot};
use crate::model::event_result::{
    AdventureReport, LootboxReport, PurchaseReceipt, SettlementReport,
};
use crate::model::profile::{Profile, UserId};
use crate::model::tables::{Profession, ShopItem};

/// What a player asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Profile,
    Adventure { location: String },
    Lootbox,
    Shop,
    Buy { item: String },
    Profession { choice: Option<String> },
    Challenge { target: UserId, arena: Option<String> },
    Accept(BattleId),
    Decline(BattleId),
    Cancel(BattleId),
    Act {
        battle: BattleId,
        action: ActionKind,
        item: Option<String>,
    },
    Status(BattleId),
    Battles,
}

pub enum EngineCommand {
    Player { user: UserId, command: Command },
    Help { topic: Option<String> },
    Shutdown,
}

pub enum EngineResponse {
    ProfileCreated(Profile),
    Profile(Profile),
    Adventure {
        user: UserId,
        report: AdventureReport,
    },
    Lootbox {
        user: UserId,
        report: LootboxReport,
    },
    Shop {
        user: UserId,
        level: u32,
        coins: u64,
        items: Vec<&'static ShopItem>,
    },
    Purchase {
        user: UserId,
        receipt: PurchaseReceipt,
    },
    Profession {
        user: UserId,
        profession: Option<&'static Profession>,
    },
    Battle(BattleSnapshot),
    BattleList {
        user: UserId,
        battles: Vec<BattleSnapshot>,
    },
    Turn(TurnResult),

    /// Unprompted: battles that sat idle too long.
    BattlesExpired(Vec<BattleSnapshot>),
    /// Unprompted: queued settlements that finally went through.
    SettlementsCompleted(Vec<SettlementReport>),

    Help(String),
    Rejected {
        user: UserId,
        kind: ErrorKind,
        message: String,
    },
}
