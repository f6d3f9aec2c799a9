use thiserror::Error;

use crate::engine::protocol::Command;
use crate::model::battle::{ActionKind, BattleId};
use crate::model::profile::UserId;

/// One console line, already split into who and what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    Help(Option<String>),
    Player { user: UserId, command: Command },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("type `<user> <command>`, or `help`")]
    Empty,

    #[error("unknown command '{0}'; try `help`")]
    UnknownCommand(String),

    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("'{0}' is not a battle id")]
    BadBattleId(String),
}

fn battle_id(raw: Option<&str>, command: &'static str) -> Result<BattleId, ParseError> {
    let raw = raw.ok_or(ParseError::MissingArgument {
        command,
        what: "a battle id",
    })?;
    raw.trim_start_matches('#')
        .parse()
        .map(BattleId)
        .map_err(|_| ParseError::BadBattleId(raw.to_string()))
}

fn action(word: &str) -> Option<(ActionKind, &'static str)> {
    match word {
        "attack" => Some((ActionKind::Attack, "attack")),
        "defend" => Some((ActionKind::Defend, "defend")),
        "special" => Some((ActionKind::Special, "special")),
        "item" | "use" => Some((ActionKind::UseItem, "item")),
        _ => None,
    }
}

/// Parses `<user> <command> [args]`, or a bare `quit` / `help [topic]`.
pub fn parse_line(line: &str) -> Result<Input, ParseError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&first, rest)) = words.split_first() else {
        return Err(ParseError::Empty);
    };

    match first.to_lowercase().as_str() {
        "quit" | "exit" => return Ok(Input::Quit),
        "help" => return Ok(Input::Help(rest.first().map(|t| t.to_lowercase()))),
        _ => {}
    }

    let user = UserId::new(first);
    let Some((&verb, args)) = rest.split_first() else {
        return Err(ParseError::Empty);
    };
    let verb = verb.to_lowercase();

    let command = match verb.as_str() {
        "start" => Command::Start,
        "profile" => Command::Profile,
        "lootbox" => Command::Lootbox,
        "shop" => Command::Shop,
        "battles" => Command::Battles,
        "buy" => {
            if args.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "buy",
                    what: "an item",
                });
            }
            Command::Buy {
                item: args.join(" "),
            }
        }
        "profession" => Command::Profession {
            choice: (!args.is_empty()).then(|| args.join(" ")),
        },
        "adventure" => {
            if args.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "adventure",
                    what: "a location",
                });
            }
            Command::Adventure {
                location: args.join(" "),
            }
        }
        "pvp" | "challenge" => {
            let Some((&target, arena)) = args.split_first() else {
                return Err(ParseError::MissingArgument {
                    command: "pvp",
                    what: "a target",
                });
            };
            Command::Challenge {
                target: UserId::new(target),
                arena: (!arena.is_empty()).then(|| arena.join(" ")),
            }
        }
        "accept" => Command::Accept(battle_id(args.first().copied(), "accept")?),
        "decline" => Command::Decline(battle_id(args.first().copied(), "decline")?),
        "cancel" => Command::Cancel(battle_id(args.first().copied(), "cancel")?),
        "status" => Command::Status(battle_id(args.first().copied(), "status")?),
        other => {
            let Some((kind, name)) = action(other) else {
                return Err(ParseError::UnknownCommand(other.to_string()));
            };
            // The battle id is always last; anything before it names the item.
            let Some((&id, item)) = args.split_last() else {
                return Err(ParseError::MissingArgument {
                    command: name,
                    what: "a battle id",
                });
            };
            let battle = battle_id(Some(id), name)?;
            let item = (kind == ActionKind::UseItem && !item.is_empty()).then(|| item.join(" "));
            Command::Act {
                battle,
                action: kind,
                item,
            }
        }
    };

    Ok(Input::Player { user, command })
}
