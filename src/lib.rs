//! TabMate - tab state and command resolution for a browser tab assistant

pub mod bridge;
pub mod command;
pub mod core;
pub mod history;
pub mod interpreter;
pub mod session;
pub mod tabs;
