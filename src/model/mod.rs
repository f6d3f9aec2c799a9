pub mod battle;
pub mod combatant;
pub mod event_result;
pub mod profile;
pub mod tables;
