pub mod classify;
pub mod command;
pub mod console;
pub mod output;
pub mod params;
pub mod runtime;
pub mod stage;
