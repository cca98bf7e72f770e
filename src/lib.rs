//! Emberfall - active-time battle combat core for a turn-based RPG

pub mod battle;
pub mod core;
