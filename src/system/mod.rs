//! # System Interaction Layer
//!
//! The boundary between the object model and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: Spawns the external binary without a shell, captures its exit status
//!   and text, and echoes progress lines in verbose mode. The [`executor::ProcessRunner`]
//!   trait is the seam tests replace.
//! - **`discovery`**: Finds the binary on `PATH` or in the usual install locations.

pub mod discovery;
pub mod executor;

#[cfg(test)]
pub(crate) mod testing;
