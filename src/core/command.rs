// src/core/command.rs

use crate::constants::FLAG_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// An ordered sequence of tokens, exactly as they are handed to the external process.
///
/// The first token is the program. Tokens are never split, joined or interpreted by a
/// shell, so values containing spaces survive untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Command {
    tokens: Vec<String>,
}

impl Command {
    /// Creates a command holding only the program token.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            tokens: vec![program.into()],
        }
    }

    /// Builds the canonical token sequence `[program, flag?, ...tokens]`.
    pub fn compose<I, S>(program: impl Into<String>, flag: &Flag, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = Self::new(program);
        if let Some(flag_token) = flag.token() {
            command.tokens.push(flag_token);
        }
        command.extend(tokens);
        command
    }

    /// Appends one token.
    pub fn arg(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    /// Appends every token of `tokens`, in order.
    pub fn extend<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
    }

    /// The program token, if any.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Every token after the program.
    pub fn args(&self) -> &[String] {
        self.tokens.split_first().map_or(&[], |(_, rest)| rest)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl Deref for Command {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.tokens
    }
}

impl<S: Into<String>> FromIterator<S> for Command {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Renders the command as a copy-pasteable POSIX shell line.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match shlex::try_quote(token) {
                Ok(quoted) => f.write_str(&quoted)?,
                // Only tokens with interior NUL bytes end up here.
                Err(_) => write!(f, "{:?}", token)?,
            }
        }
        Ok(())
    }
}

/// An optional option placed right after the program token (e.g. `--cores=8`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Flag(Option<String>);

impl Flag {
    pub fn new(value: impl Into<String>) -> Self {
        let mut flag = Self::default();
        flag.set(value);
        flag
    }

    /// Sets the flag. Blank values clear it.
    pub fn set(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.0 = if value.trim().is_empty() {
            None
        } else {
            Some(value)
        };
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// The raw value, as given by the caller.
    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// The token emitted into a command: the value with a `--` prefix unless it has one.
    pub fn token(&self) -> Option<String> {
        self.0.as_ref().map(|value| {
            if value.starts_with(FLAG_PREFIX) {
                value.clone()
            } else {
                format!("{}{}", FLAG_PREFIX, value)
            }
        })
    }
}

impl From<Option<String>> for Flag {
    fn from(value: Option<String>) -> Self {
        value.map_or_else(Self::default, Self::new)
    }
}

// MARK: --- UNIT TESTS ---
