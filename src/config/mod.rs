pub mod assets;
pub mod defaults;
pub mod defs;
