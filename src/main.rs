use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use rpg_arena_bot::config::settings::BotSettings;
use rpg_arena_bot::config::settings_io::{data_dir, load_settings, save_settings, settings_path};
use rpg_arena_bot::engine::command_parser::{parse_line, Input};
use rpg_arena_bot::engine::engine::Engine;
use rpg_arena_bot::engine::protocol::EngineCommand;
use rpg_arena_bot::engine::render;
use rpg_arena_bot::engine::service::GameService;
use rpg_arena_bot::engine::store::JsonProfileStore;

fn main() -> anyhow::Result<()> {
    let loaded = load_settings();
    let settings = match &loaded {
        Ok(Some(settings)) => settings.clone(),
        _ => BotSettings::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match loaded {
        Ok(Some(_)) => {}
        Ok(None) => match save_settings(&settings) {
            Ok(()) => info!(path=%settings_path().display(), "wrote default settings"),
            Err(e) => warn!(err=%format!("{e:#}"), "could not write default settings"),
        },
        Err(e) => warn!(err=%format!("{e:#}"), "unreadable settings; using defaults"),
    }

    let dir = data_dir(&settings);
    let store = JsonProfileStore::open(&dir).context("opening profile store")?;
    let service = Arc::new(GameService::new(
        store,
        StdRng::from_entropy(),
        settings.service_config(),
    ));
    info!(data_dir=%dir.display(), "rpg arena bot ready");

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();

    let tick = settings.tick_interval();
    let engine = thread::spawn(move || {
        let mut engine = Engine::new(cmd_rx, resp_tx, service, tick);
        engine.run();
    });

    // Responses may arrive unprompted (expiry, late settlements).
    let printer = thread::spawn(move || {
        for response in resp_rx {
            print!("{}", render::response(&response));
            let _ = io::stdout().flush();
        }
    });

    println!("{}", render::help(None));
    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let cmd = match parse_line(&line) {
            Ok(Input::Quit) => break,
            Ok(Input::Help(topic)) => EngineCommand::Help { topic },
            Ok(Input::Player { user, command }) => EngineCommand::Player { user, command },
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if cmd_tx.send(cmd).is_err() {
            break;
        }
    }

    let _ = cmd_tx.send(EngineCommand::Shutdown);
    let _ = engine.join();
    let _ = printer.join();
    Ok(())
}
