// src/cli/handlers/mod.rs

// One module per command.

pub mod commons;
pub mod library;
pub mod locate;
pub mod pipeline;
pub mod run;
pub mod version;
