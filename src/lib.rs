//! # geochain
//!
//! A thin object model over the `saga_cmd` command line tool suite: navigate from an
//! [`Environment`](core::environment::Environment) to a library and a tool, assemble the
//! command line from typed parameters, run it, and chain several calls so that the
//! throwaway outputs of one step feed the next.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic))]

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
