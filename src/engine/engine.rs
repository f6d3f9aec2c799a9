use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::RngCore;
use tracing::{debug, info};

use crate::engine::error::{BattleError, ErrorKind, GateError, PlayerError};
use crate::engine::progression::check_level_requirement;
use crate::engine::protocol::{Command, EngineCommand, EngineResponse};
use crate::engine::render;
use crate::engine::service::GameService;
use crate::engine::store::ProfileStore;
use crate::model::profile::UserId;
use crate::model::tables::{find_arena, DEFAULT_ARENA, PVP_UNLOCK_LEVEL};

/// Owns the command loop. Everything stateful lives in the shared service.
pub struct Engine<S, R> {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    service: Arc<GameService<S, R>>,
    tick: Duration,
}

impl<S, R> Engine<S, R>
where
    S: ProfileStore,
    R: RngCore + Send,
{
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        service: Arc<GameService<S, R>>,
        tick: Duration,
    ) -> Self {
        Self {
            rx,
            tx,
            service,
            tick,
        }
    }

    pub fn run(&mut self) {
        let mut last_tick = Instant::now();
        loop {
            match self.rx.recv_timeout(self.tick) {
                Ok(EngineCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(cmd) => {
                    let response = self.handle(cmd);
                    let _ = self.tx.send(response);
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            if last_tick.elapsed() >= self.tick {
                last_tick = Instant::now();
                for response in self.housekeeping(last_tick) {
                    let _ = self.tx.send(response);
                }
            }
        }
        info!("engine stopped");
    }

    /// Idle expiry and settlement retries.
    pub fn housekeeping(&self, now: Instant) -> Vec<EngineResponse> {
        let mut out = Vec::new();

        let expired = self.service.expire_idle(now);
        if !expired.is_empty() {
            info!(count = expired.len(), "battles expired");
            out.push(EngineResponse::BattlesExpired(expired));
        }

        let settled = self.service.retry_pending_settlements();
        if !settled.is_empty() {
            out.push(EngineResponse::SettlementsCompleted(settled));
        }
        out
    }

    pub fn handle(&self, cmd: EngineCommand) -> EngineResponse {
        match cmd {
            EngineCommand::Help { topic } => EngineResponse::Help(render::help(topic.as_deref())),
            EngineCommand::Player { user, command } => {
                debug!(user=%user, ?command, "command");
                self.player_command(&user, command)
                    .unwrap_or_else(|rejection| rejection.into_response(user))
            }
            EngineCommand::Shutdown => EngineResponse::Help(String::from("Shutting down.\n")),
        }
    }

    fn player_command(&self, user: &UserId, command: Command) -> Result<EngineResponse, Rejection> {
        let svc = &self.service;
        let response = match command {
            Command::Start => EngineResponse::ProfileCreated(svc.start_profile(user)?),
            Command::Profile => EngineResponse::Profile(svc.profile(user)?),
            Command::Adventure { location } => EngineResponse::Adventure {
                user: user.clone(),
                report: svc.adventure(user, &location)?,
            },
            Command::Lootbox => EngineResponse::Lootbox {
                user: user.clone(),
                report: svc.open_lootbox(user)?,
            },
            Command::Shop => {
                let (profile, items) = svc.shop(user)?;
                EngineResponse::Shop {
                    user: user.clone(),
                    level: profile.level,
                    coins: profile.coins,
                    items,
                }
            }
            Command::Buy { item } => EngineResponse::Purchase {
                user: user.clone(),
                receipt: svc.buy_item(user, &item)?,
            },
            Command::Profession { choice } => EngineResponse::Profession {
                user: user.clone(),
                profession: svc.profession(user, choice.as_deref())?,
            },
            Command::Challenge { target, arena } => {
                let arena = arena.unwrap_or_else(|| DEFAULT_ARENA.to_string());
                self.check_pvp_gate(user, &arena)?;
                EngineResponse::Battle(svc.propose_battle(user, &target, &arena)?)
            }
            Command::Accept(id) => EngineResponse::Battle(svc.respond_to_challenge(id, user, true)?),
            Command::Decline(id) => {
                EngineResponse::Battle(svc.respond_to_challenge(id, user, false)?)
            }
            Command::Cancel(id) => EngineResponse::Battle(svc.cancel_challenge(id, user)?),
            Command::Act {
                battle,
                action,
                item,
            } => EngineResponse::Turn(svc.act(battle, user, action, item.as_deref())?),
            Command::Status(id) => EngineResponse::Battle(svc.snapshot(id)?),
            Command::Battles => EngineResponse::BattleList {
                user: user.clone(),
                battles: svc.battles_for(user),
            },
        };
        Ok(response)
    }

    /// PvP needs both the global unlock level and the arena's own level.
    fn check_pvp_gate(&self, user: &UserId, arena: &str) -> Result<(), Rejection> {
        let profile = self.service.profile(user)?;
        check_level_requirement(&profile, PVP_UNLOCK_LEVEL, "PvP Combat")?;
        if let Some(arena) = find_arena(arena) {
            check_level_requirement(&profile, arena.level_requirement, arena.name)?;
        }
        Ok(())
    }
}

/// A failed command, flattened for the player.
struct Rejection {
    kind: ErrorKind,
    message: String,
}

impl Rejection {
    fn into_response(self, user: UserId) -> EngineResponse {
        debug!(user=%user, kind=?self.kind, message=%self.message, "command rejected");
        EngineResponse::Rejected {
            user,
            kind: self.kind,
            message: self.message,
        }
    }
}

impl From<BattleError> for Rejection {
    fn from(e: BattleError) -> Self {
        Rejection {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<PlayerError> for Rejection {
    fn from(e: PlayerError) -> Self {
        Rejection {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl From<GateError> for Rejection {
    fn from(e: GateError) -> Self {
        Rejection {
            kind: ErrorKind::Validation,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::service::ServiceConfig;
    use crate::engine::store::MemoryProfileStore;
    use crate::model::battle::{ActionKind, BattleId, Phase};
    use crate::model::profile::Profile;
    use rand::rngs::mock::StepRng;
    use std::sync::mpsc;
    use std::thread;

    type TestEngine = Engine<MemoryProfileStore, StepRng>;

    fn leveled(id: &str, level: u32) -> Profile {
        let mut p = Profile::new(UserId::new(id));
        p.level = level;
        p
    }

    fn engine(profiles: Vec<Profile>) -> (TestEngine, Sender<EngineCommand>, Receiver<EngineResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let service = Arc::new(GameService::new(
            MemoryProfileStore::with_profiles(profiles),
            StepRng::new(u64::MAX, 0),
            ServiceConfig::default(),
        ));
        (
            Engine::new(cmd_rx, resp_tx, service, Duration::from_millis(10)),
            cmd_tx,
            resp_rx,
        )
    }

    fn player(user: &str, command: Command) -> EngineCommand {
        EngineCommand::Player {
            user: UserId::new(user),
            command,
        }
    }

    fn rejection(r: EngineResponse) -> (ErrorKind, String) {
        match r {
            EngineResponse::Rejected { kind, message, .. } => (kind, message),
            _ => panic!("expected a rejection"),
        }
    }

    #[test]
    fn pvp_is_gated_by_level_and_arena() {
        let (engine, _tx, _rx) = engine(vec![leveled("low", 4), leveled("mid", 12), leveled("b", 50)]);

        let challenge = |user: &str, arena: Option<&str>| {
            engine.handle(player(
                user,
                Command::Challenge {
                    target: UserId::new("b"),
                    arena: arena.map(str::to_string),
                },
            ))
        };

        let (kind, message) = rejection(challenge("low", None));
        assert_eq!(kind, ErrorKind::Validation);
        assert_eq!(message, "PvP Combat requires level 5; you are level 4");

        let (_, message) = rejection(challenge("mid", Some("dragon_pit")));
        assert!(message.starts_with("Dragon Pit requires level 20"), "{message}");

        assert!(matches!(
            challenge("mid", Some("colosseum")),
            EngineResponse::Battle(ref s) if s.phase == Phase::Proposed
        ));

        let (_, message) = rejection(challenge("mid", Some("moon")));
        assert_eq!(message, "unknown arena 'moon'");
    }

    #[test]
    fn unknown_players_must_start_first() {
        let (engine, _tx, _rx) = engine(vec![]);
        let (kind, message) = rejection(engine.handle(player("x", Command::Profile)));
        assert_eq!(kind, ErrorKind::Data);
        assert_eq!(message, "start your adventure first");

        assert!(matches!(
            engine.handle(player("x", Command::Start)),
            EngineResponse::ProfileCreated(_)
        ));
    }

    #[test]
    fn battle_commands_flow_through() {
        let (engine, _tx, _rx) = engine(vec![leveled("a", 10), leveled("b", 10)]);
        engine.handle(player(
            "a",
            Command::Challenge {
                target: UserId::new("b"),
                arena: None,
            },
        ));
        let accepted = engine.handle(player("b", Command::Accept(BattleId(1))));
        assert!(matches!(accepted, EngineResponse::Battle(ref s) if s.phase == Phase::Active));

        let (_, message) = rejection(engine.handle(player(
            "b",
            Command::Act {
                battle: BattleId(1),
                action: ActionKind::Attack,
                item: None,
            },
        )));
        assert_eq!(message, "it's not your turn");

        assert!(matches!(
            engine.handle(player(
                "a",
                Command::Act {
                    battle: BattleId(1),
                    action: ActionKind::Attack,
                    item: None,
                },
            )),
            EngineResponse::Turn(_)
        ));
    }

    #[test]
    fn shop_purchases_feed_the_lootbox() {
        let mut rich = leveled("r", 25);
        rich.coins = 1_200;
        let (engine, _tx, _rx) = engine(vec![rich, leveled("poor", 25)]);

        assert!(matches!(
            engine.handle(player("r", Command::Shop)),
            EngineResponse::Shop { level: 25, coins: 1_200, ref items, .. }
                if items.iter().any(|i| i.name == "Lootbox")
        ));
        assert!(matches!(
            engine.handle(player("r", Command::Buy { item: "lootbox".into() })),
            EngineResponse::Purchase { ref receipt, .. } if receipt.remaining_coins == 200
        ));
        assert!(matches!(
            engine.handle(player("r", Command::Lootbox)),
            EngineResponse::Lootbox { .. }
        ));

        let (kind, message) = rejection(engine.handle(player(
            "poor",
            Command::Buy {
                item: "lootbox".into(),
            },
        )));
        assert_eq!(kind, ErrorKind::Validation);
        assert_eq!(message, "Lootbox costs 1000 coins; you have 100");
    }

    #[test]
    fn status_and_professions() {
        let (engine, _tx, _rx) = engine(vec![leveled("a", 10), leveled("b", 10)]);
        engine.handle(player(
            "a",
            Command::Challenge {
                target: UserId::new("b"),
                arena: None,
            },
        ));
        assert!(matches!(
            engine.handle(player("b", Command::Status(BattleId(1)))),
            EngineResponse::Battle(ref s) if s.phase == Phase::Proposed
        ));
        let (_, message) = rejection(engine.handle(player("b", Command::Status(BattleId(9)))));
        assert_eq!(message, "no battle with id 9");

        assert!(matches!(
            engine.handle(player("a", Command::Profession { choice: Some("enchanter".into()) })),
            EngineResponse::Profession { profession: Some(p), .. } if p.id == "enchanter"
        ));
    }

    #[test]
    fn rejections_name_the_player() {
        let (engine, _tx, _rx) = engine(vec![]);
        assert!(matches!(
            engine.handle(player("who", Command::Lootbox)),
            EngineResponse::Rejected { ref user, kind: ErrorKind::Data, .. } if user.as_str() == "who"
        ));
    }

    #[test]
    fn housekeeping_reports_expired_battles() {
        let (engine, _tx, _rx) = engine(vec![leveled("a", 10), leveled("b", 10)]);
        engine.handle(player(
            "a",
            Command::Challenge {
                target: UserId::new("b"),
                arena: None,
            },
        ));
        assert!(engine.housekeeping(Instant::now()).is_empty());

        let later = Instant::now() + Duration::from_secs(301);
        let responses = engine.housekeeping(later);
        assert!(matches!(
            responses.as_slice(),
            [EngineResponse::BattlesExpired(list)] if list.len() == 1
        ));
    }

    #[test]
    fn run_answers_until_shutdown() {
        let (mut engine, tx, rx) = engine(vec![]);
        let worker = thread::spawn(move || engine.run());

        tx.send(EngineCommand::Help { topic: None }).unwrap();
        tx.send(player("p", Command::Start)).unwrap();
        tx.send(EngineCommand::Shutdown).unwrap();
        worker.join().unwrap();

        let responses: Vec<EngineResponse> = rx.try_iter().collect();
        assert!(matches!(responses[0], EngineResponse::Help(_)));
        assert!(matches!(responses[1], EngineResponse::ProfileCreated(_)));
    }
}
