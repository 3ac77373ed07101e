// src/core/mod.rs

pub mod command;
pub mod config_loader;
pub mod environment;
pub mod executable;
pub mod identifier;
pub mod library;
pub mod output;
pub mod parameters;
pub mod paths;
pub mod pipeline;
pub mod pipeline_file;
pub mod temp_files;
pub mod tool;
