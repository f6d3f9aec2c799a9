use thiserror::Error;

use crate::model::battle::{BattleId, Phase};
use crate::model::profile::UserId;

/// Broad class of a failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input; nothing was mutated.
    Validation,
    /// Required data was missing; the operation was abandoned.
    Data,
    /// The store failed; computed results may still be pending.
    Persistence,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum BattleError {
    #[error("unknown arena '{0}'")]
    InvalidArena(String),

    #[error("you cannot challenge yourself")]
    SelfChallenge,

    #[error("this challenge is not for you")]
    NotTarget,

    #[error("only the challenger can cancel this challenge")]
    NotChallenger,

    #[error("battle is {} and cannot do that", .0.label())]
    WrongPhase(Phase),

    #[error("it's not your turn")]
    NotYourTurn,

    #[error("you are not part of this battle")]
    NotParticipant,

    #[error("not enough energy (need {needed}, have {available})")]
    InsufficientEnergy { needed: u32, available: u32 },

    #[error("you have no healing items")]
    NoUsableItem,

    #[error("battle is not active")]
    BattleNotActive,

    #[error("no battle with id {0}")]
    UnknownBattle(BattleId),

    #[error("no profile for user {0}")]
    ProfileNotFound(UserId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BattleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BattleError::ProfileNotFound(_) => ErrorKind::Data,
            BattleError::Store(_) => ErrorKind::Persistence,
            _ => ErrorKind::Validation,
        }
    }
}

/// A feature was requested below its level gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{feature} requires level {required}; you are level {current}")]
pub struct GateError {
    pub feature: String,
    pub required: u32,
    pub current: u32,
}

#[derive(Debug, Error)]
pub enum LootError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    #[error("you don't have any lootboxes")]
    NoLootbox,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("the shop doesn't sell '{0}'")]
    UnknownItem(String),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("{item} costs {price} coins; you have {coins}")]
    InsufficientFunds { item: String, price: u64, coins: u64 },
}

/// Failures of the profile-level commands outside of battles.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("start your adventure first")]
    NoProfile,

    #[error("you've already started your adventure")]
    AlreadyStarted,

    #[error(transparent)]
    Loot(#[from] LootError),

    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("unknown profession '{0}'")]
    UnknownProfession(String),

    #[error("you are already a {0}")]
    ProfessionChosen(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlayerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlayerError::NoProfile => ErrorKind::Data,
            PlayerError::Store(_) => ErrorKind::Persistence,
            PlayerError::AlreadyStarted
            | PlayerError::Loot(_)
            | PlayerError::Shop(_)
            | PlayerError::Gate(_)
            | PlayerError::UnknownProfession(_)
            | PlayerError::ProfessionChosen(_) => ErrorKind::Validation,
        }
    }
}
