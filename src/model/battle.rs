use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::model::combatant::{Combatant, Effect};
use crate::model::profile::UserId;
use crate::model::tables::{Arena, ATTACK_COST, DEFEND_COST, ITEM_COST, SPECIAL_COST};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleId(pub u64);

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which participant. The challenger always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Challenger,
    Target,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Challenger => Side::Target,
            Side::Target => Side::Challenger,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Challenger => 0,
            Side::Target => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Proposed,
    Active,
    Concluded { winner: Side },
    Declined,
    Cancelled,
    /// Expired after sitting idle; never settled.
    Abandoned,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Phase::Proposed | Phase::Active)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Proposed => "proposed",
            Phase::Active => "active",
            Phase::Concluded { .. } => "concluded",
            Phase::Declined => "declined",
            Phase::Cancelled => "cancelled",
            Phase::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Attack,
    Defend,
    Special,
    UseItem,
}

impl ActionKind {
    pub fn energy_cost(&self) -> u32 {
        match self {
            ActionKind::Attack => ATTACK_COST,
            ActionKind::Defend => DEFEND_COST,
            ActionKind::Special => SPECIAL_COST,
            ActionKind::UseItem => ITEM_COST,
        }
    }
}

/// Progress of the one-time write-back for a concluded battle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementState {
    pub winner_applied: bool,
    pub loser_applied: bool,
}

impl SettlementState {
    pub fn is_complete(&self) -> bool {
        self.winner_applied && self.loser_applied
    }
}

#[derive(Debug, Clone)]
pub struct Battle {
    pub id: BattleId,
    pub arena: &'static Arena,
    pub challenger: UserId,
    pub target: UserId,

    /// Indexed by `Side::index`. Populated on acceptance.
    pub combatants: Option<[Combatant; 2]>,

    pub current_turn: Side,
    pub turn: u32,
    pub log: Vec<String>,
    pub phase: Phase,
    pub settlement: SettlementState,
    pub last_activity: Instant,
}

impl Battle {
    pub fn user(&self, side: Side) -> &UserId {
        match side {
            Side::Challenger => &self.challenger,
            Side::Target => &self.target,
        }
    }

    pub fn side_of(&self, user: &UserId) -> Option<Side> {
        if *user == self.challenger {
            Some(Side::Challenger)
        } else if *user == self.target {
            Some(Side::Target)
        } else {
            None
        }
    }

    pub fn winner(&self) -> Option<Side> {
        match self.phase {
            Phase::Concluded { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        let view = |side: Side| {
            self.combatants
                .as_ref()
                .map(|c| CombatantView::from(&c[side.index()]))
        };

        BattleSnapshot {
            id: self.id,
            arena: self.arena.name.to_string(),
            challenger: self.challenger.clone(),
            target: self.target.clone(),
            phase: self.phase,
            current_turn: match self.phase {
                Phase::Active => Some(self.user(self.current_turn).clone()),
                _ => None,
            },
            winner: self.winner().map(|side| self.user(side).clone()),
            turn: self.turn,
            challenger_view: view(Side::Challenger),
            target_view: view(Side::Target),
            log: self.log.clone(),
        }
    }
}

/// What the presentation layer gets to see. Never carries profile data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub id: BattleId,
    pub arena: String,
    pub challenger: UserId,
    pub target: UserId,
    pub phase: Phase,
    pub current_turn: Option<UserId>,
    pub winner: Option<UserId>,
    pub turn: u32,
    pub challenger_view: Option<CombatantView>,
    pub target_view: Option<CombatantView>,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantView {
    pub user_id: UserId,
    pub hp: u32,
    pub max_hp: u32,
    pub energy: u32,
    pub effects: Vec<Effect>,
}

impl From<&Combatant> for CombatantView {
    fn from(c: &Combatant) -> Self {
        CombatantView {
            user_id: c.user_id.clone(),
            hp: c.hp,
            max_hp: c.max_hp,
            energy: c.energy,
            effects: c.effects.clone(),
        }
    }
}
