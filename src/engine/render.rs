//! Plain-text rendering of engine responses for the console front end.

use std::fmt::Write;

use crate::engine::protocol::EngineResponse;
use crate::engine::service::TurnResult;
use crate::model::battle::{BattleSnapshot, CombatantView, Phase};
use crate::model::combatant::Effect;
use crate::model::event_result::{
    AdventureReport, LevelUpSummary, LootboxReport, PurchaseReceipt, SettlementOutcome,
    SettlementReport,
};
use crate::model::profile::Profile;
use crate::model::tables::{
    find_profession, LuckTier, Profession, ShopItem, ARENAS, ATTACK_COST, DEFEND_COST,
    ENERGY_REGEN, FEATURE_UNLOCKS, ITEM_COST, MAX_ENERGY, PROFESSIONS, SPECIAL_COST,
};

const BAR_WIDTH: u32 = 10;
const LOG_TAIL: usize = 3;

pub fn progress_bar(current: u32, max: u32) -> String {
    let filled = if max == 0 {
        0
    } else {
        (u64::from(current.min(max)) * u64::from(BAR_WIDTH) / u64::from(max)) as u32
    };
    let mut bar = String::new();
    for i in 0..BAR_WIDTH {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar
}

fn effect_tag(effect: &Effect) -> String {
    match effect {
        Effect::Defense { reduction_pct, .. } => format!("{} -{reduction_pct}%", effect.name()),
        Effect::Stun { turns_remaining } => format!("{} {turns_remaining}t", effect.name()),
    }
}

fn combatant_line(out: &mut String, view: &CombatantView) {
    let _ = write!(
        out,
        "  {:<12} HP {} {}/{}  EN {} {}/{}",
        view.user_id,
        progress_bar(view.hp, view.max_hp),
        view.hp,
        view.max_hp,
        progress_bar(view.energy, MAX_ENERGY),
        view.energy,
        MAX_ENERGY
    );
    if !view.effects.is_empty() {
        let tags: Vec<String> = view.effects.iter().map(effect_tag).collect();
        let _ = write!(out, "  [{}]", tags.join(", "));
    }
    out.push('\n');
}

pub fn snapshot(s: &BattleSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Battle #{} at {}: {} vs {} ({})",
        s.id,
        s.arena,
        s.challenger,
        s.target,
        s.phase.label()
    );

    match s.phase {
        Phase::Proposed => {
            let _ = writeln!(
                out,
                "  {} can `accept {}` or `decline {}`.",
                s.target, s.id, s.id
            );
        }
        _ => {
            for view in [&s.challenger_view, &s.target_view].into_iter().flatten() {
                combatant_line(&mut out, view);
            }
        }
    }

    if let Some(user) = &s.current_turn {
        let _ = writeln!(out, "  Turn {}: {} to move.", s.turn, user);
    }
    if let Some(winner) = &s.winner {
        let _ = writeln!(out, "  Winner: {winner}");
    }

    let skip = s.log.len().saturating_sub(LOG_TAIL);
    for line in &s.log[skip..] {
        let _ = writeln!(out, "  > {line}");
    }
    out
}

pub fn settlement(r: &SettlementReport) -> String {
    match &r.outcome {
        SettlementOutcome::Applied | SettlementOutcome::AlreadySettled => format!(
            "{} earns {} coins; {} pays {}.",
            r.winner, r.coins_won, r.loser, r.coins_lost
        ),
        SettlementOutcome::Deferred { reason } => format!(
            "Rewards for battle #{} are delayed ({reason}); they will be paid shortly.",
            r.battle_id
        ),
    }
}

fn turn(t: &TurnResult) -> String {
    let mut out = snapshot(&t.snapshot);
    if let Some(report) = &t.settlement {
        out.push_str(&settlement(report));
        out.push('\n');
    }
    out
}

pub fn profile(p: &Profile) -> String {
    let mut out = String::new();
    let luck = LuckTier::from_points(p.luck);
    let _ = writeln!(out, "{} (level {})", p.user_id, p.level);
    let _ = writeln!(out, "  XP   {} {}/{}", progress_bar(clamp_u32(p.xp), clamp_u32(p.max_xp)), p.xp, p.max_xp);
    let _ = writeln!(out, "  HP   {} {}/{}", progress_bar(p.hp, p.max_hp), p.hp, p.max_hp);
    let _ = writeln!(out, "  Mana {} {}/{}", progress_bar(p.mana, p.max_mana), p.mana, p.max_mana);
    let _ = writeln!(out, "  ATK {}  DEF {}  Coins {}", p.attack, p.defense, p.coins);
    let _ = writeln!(out, "  Luck {} ({})", p.luck, luck.name());
    let _ = writeln!(
        out,
        "  PvP {}W/{}L  Adventures {}  Lootboxes {}  Purchases {}",
        p.stats.pvp_wins,
        p.stats.pvp_losses,
        p.stats.adventure_count,
        p.stats.lootboxes_opened,
        p.stats.items_purchased
    );
    if let Some(prof) = p.profession.as_deref().and_then(find_profession) {
        let _ = writeln!(out, "  Profession: {}", prof.name);
    }
    if p.inventory.is_empty() {
        out.push_str("  Inventory: empty\n");
    } else {
        let _ = writeln!(out, "  Inventory: {}", p.inventory.join(", "));
    }
    out
}

fn clamp_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

pub fn level_up(l: &LevelUpSummary) -> String {
    let mut out = format!(
        "Level up! You are now level {} (+{} HP, +{} ATK, +{} DEF, +{} mana). Next level at {} XP.\n",
        l.new_level, l.hp_gain, l.attack_gain, l.defense_gain, l.mana_gain, l.next_level_xp
    );
    for feature in &l.unlocked {
        let _ = writeln!(out, "Unlocked: {}", feature.label());
    }
    out
}

pub fn adventure(r: &AdventureReport) -> String {
    let mut out = format!("{}: {}\n", r.location, r.description);
    let _ = writeln!(out, "  +{} coins, +{} XP", r.reward.coins, r.reward.xp);
    if r.luck != LuckTier::Normal {
        let _ = writeln!(out, "  Luck: {} ({:+}%)", r.luck.name(), r.luck.bonus_percent());
    }
    for item in &r.items_found {
        let _ = writeln!(out, "  Found: {item}");
    }
    if let Some(l) = &r.level_up {
        out.push_str(&level_up(l));
    }
    out
}

pub fn lootbox(r: &LootboxReport) -> String {
    let mut out = format!("The lootbox bursts open: {} coins!\n", r.coins);
    if r.items.is_empty() {
        out.push_str("  No items this time.\n");
    }
    for (name, rarity) in &r.items {
        let _ = writeln!(out, "  {} [{}]", name, rarity.label());
    }
    out
}

/// Items grouped by category, in the order given.
pub fn shop(level: u32, coins: u64, items: &[&ShopItem]) -> String {
    let mut out = format!("Shop (level {level}, {coins} coins)\n");
    if items.is_empty() {
        out.push_str("  Nothing for sale at your level.\n");
        return out;
    }
    let mut category = None;
    for item in items {
        if category != Some(item.category) {
            category = Some(item.category);
            let _ = writeln!(out, "{}:", item.category.label());
        }
        let mark = if item.price > coins { " (can't afford)" } else { "" };
        let _ = writeln!(
            out,
            "  {:<18} {:>6} coins  [{}] {}{mark}",
            item.name,
            item.price,
            item.rarity.label(),
            item.description
        );
    }
    out.push_str("Buy with `buy <item>`.\n");
    out
}

pub fn purchase(r: &PurchaseReceipt) -> String {
    format!(
        "Bought {} [{}] for {} coins. {} coins left.\n",
        r.item,
        r.rarity.label(),
        r.price,
        r.remaining_coins
    )
}

pub fn profession(p: Option<&Profession>) -> String {
    match p {
        Some(p) => format!("Profession: {} ({}).\n", p.name, p.description),
        None => {
            let mut out = String::from("Choose a profession with `profession <name>`:\n");
            for p in PROFESSIONS {
                let _ = writeln!(out, "  {:<12} {}: {}", p.id, p.name, p.description);
            }
            out
        }
    }
}

/* =========================
   Help
   ========================= */

pub const HELP_TOPICS: &[&str] = &["rpg", "shop", "pvp", "progression", "luck"];

pub fn help(topic: Option<&str>) -> String {
    match topic {
        None => {
            let mut out = String::from(
                "Commands are `<user> <command>`:\n  start, profile, adventure <location>, lootbox, battles\n  shop, buy <item>, profession [name]\n  pvp <target> [arena], accept|decline|cancel|status <id>\n  attack|defend|special <id>, item [name] <id>\n",
            );
            let _ = writeln!(out, "Topics: help {}", HELP_TOPICS.join(" | help "));
            out
        }
        Some("rpg") => String::from(
            "Start with `start`, then go on adventures to earn coins, XP and items.\nLocations open up as you level: training, forest, mountains, dungeon, dragon_lair.\n",
        ),
        Some("shop") => String::from(
            "`shop` lists what your level allows; `buy <item>` pays in coins.\nLootboxes go on sale at level 25. Professions open at level 10.\n",
        ),
        Some("pvp") => {
            let mut out = format!(
                "Turn-based duels. Energy starts at {MAX_ENERGY} and both sides regain {ENERGY_REGEN} every turn.\n  attack {ATTACK_COST}  defend {DEFEND_COST}  special {SPECIAL_COST}  item {ITEM_COST}\nDefend halves the next hit. Special hits twice as hard and stuns.\nArenas:\n"
            );
            for arena in ARENAS {
                let _ = writeln!(
                    out,
                    "  {:<18} fee {:>5}  prize {:>5}  level {}",
                    arena.id,
                    arena.entry_fee,
                    arena.winner_reward(),
                    arena.level_requirement
                );
            }
            out
        }
        Some("progression") => {
            let mut out = String::from("Unlocks:\n");
            for (level, feature) in FEATURE_UNLOCKS {
                let _ = writeln!(out, "  level {:>2}: {}", level, feature.label());
            }
            out
        }
        Some("luck") => {
            let mut out = String::from("Luck tiers scale rewards and drop chances:\n");
            for (points, tier) in [-100, -1, 0, 100, 500, 1000]
                .into_iter()
                .map(|p| (p, LuckTier::from_points(p)))
            {
                let _ = writeln!(
                    out,
                    "  {:<8} from {:>5}  {:+}%",
                    tier.name(),
                    points,
                    tier.bonus_percent()
                );
            }
            out
        }
        Some(other) => format!(
            "No help for '{other}'. Topics: {}\n",
            HELP_TOPICS.join(", ")
        ),
    }
}

pub fn response(r: &EngineResponse) -> String {
    match r {
        EngineResponse::ProfileCreated(p) => {
            format!("Welcome, {}! Your adventure begins.\n{}", p.user_id, profile(p))
        }
        EngineResponse::Profile(p) => profile(p),
        EngineResponse::Adventure { user, report } => format!("[{user}] {}", adventure(report)),
        EngineResponse::Lootbox { user, report } => format!("[{user}] {}", lootbox(report)),
        EngineResponse::Shop {
            user,
            level,
            coins,
            items,
        } => format!("[{user}] {}", shop(*level, *coins, items)),
        EngineResponse::Purchase { user, receipt } => format!("[{user}] {}", purchase(receipt)),
        EngineResponse::Profession { user, profession: p } => {
            format!("[{user}] {}", profession(*p))
        }
        EngineResponse::Battle(s) => snapshot(s),
        EngineResponse::BattleList { user, battles } => {
            if battles.is_empty() {
                return format!("{user} has no open battles.\n");
            }
            battles.iter().map(snapshot).collect()
        }
        EngineResponse::Turn(t) => turn(t),
        EngineResponse::BattlesExpired(list) => list
            .iter()
            .map(|s| format!("Battle #{} ({} vs {}) expired.\n", s.id, s.challenger, s.target))
            .collect(),
        EngineResponse::SettlementsCompleted(list) => list
            .iter()
            .map(|r| format!("{}\n", settlement(r)))
            .collect(),
        EngineResponse::Help(text) => text.clone(),
        EngineResponse::Rejected { user, message, .. } => format!("[{user}] {message}\n"),
    }
}
