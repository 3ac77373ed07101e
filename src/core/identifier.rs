// src/core/identifier.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("An empty identifier cannot name a library or a tool.")]
    EmptyIdentifier,
    #[error("Step '{0}' is not defined before it is referenced.")]
    UnknownStep(String),
    #[error("Call '{call}' has no parameter named '{param}'.")]
    UnknownParameter { call: String, param: String },
    #[error("Parameter '{param}' of call '{call}' is a switch and has no value to reference.")]
    ValuelessParameter { call: String, param: String },
}

/// Names a library or a tool, either by its name or by its index in the listing.
///
/// Navigation never asks the binary whether the identifier exists; a wrong identifier
/// only surfaces when the command runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Index(usize),
    Name(String),
}

impl Identifier {
    /// Parses user input, rejecting blank identifiers. A plain number becomes an index.
    pub fn parse(raw: &str) -> Result<Self, NavigationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NavigationError::EmptyIdentifier);
        }
        Ok(Self::from(trimmed))
    }

    /// The token this identifier contributes to a command.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        // Only digits that render back unchanged are an index; "007" stays a name.
        match value.parse::<usize>() {
            Ok(index) if index.to_string() == value => Self::Index(index),
            _ => Self::Name(value.to_string()),
        }
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&String> for Identifier {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<usize> for Identifier {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

// Lets bare integer literals (`i32` by default) name a library or tool.
macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Identifier {
                fn from(value: $ty) -> Self {
                    match usize::try_from(value) {
                        Ok(index) => Self::Index(index),
                        Err(_) => Self::Name(value.to_string()),
                    }
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64);

impl From<&Identifier> for Identifier {
    fn from(value: &Identifier) -> Self {
        value.clone()
    }
}
