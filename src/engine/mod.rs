pub mod battle;
pub mod damage;
pub mod error;
pub mod loot;
pub mod progression;
pub mod shop;
pub mod store;

pub mod command_parser;
pub mod engine;
pub mod player;
pub mod protocol;
pub mod render;
pub mod service;
