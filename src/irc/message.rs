//! Minimal IRC message model for the away reconciler.
//!
//! Covers what the bouncer core touches on the wire: the client-facing AWAY
//! command, the upstream AWAY request, and numeric replies. Lines follow the
//! RFC 2812 shape (`[:prefix] command params [:trailing]`); the CR-LF
//! terminator belongs to the transport, not to this type.
use std::fmt;

/// Numeric replies this crate cares about.
pub mod numeric {
    /// RPL_UNAWAY — the server confirms we are no longer away.
    pub const RPL_UNAWAY: u16 = 305;
    /// RPL_NOWAWAY — the server confirms we are now away.
    pub const RPL_NOWAWAY: u16 = 306;
}

/// A parsed IRC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Optional prefix (server name or `nick!user@host`).
    pub prefix: Option<String>,
    /// The command (e.g. `AWAY`, `305`).
    pub command: String,
    /// Parameters; the last may be a trailing param containing spaces.
    pub params: Vec<String>,
}

/// Errors that can occur during message parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("missing command after prefix")]
    MissingCommand,
}

impl Message {
    /// Build a message without a prefix.
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params,
        }
    }

    /// Build a message carrying a prefix.
    pub fn with_prefix(
        prefix: impl Into<String>,
        command: impl Into<String>,
        params: Vec<String>,
    ) -> Self {
        Self {
            prefix: Some(prefix.into()),
            command: command.into(),
            params,
        }
    }

    /// Parse a single IRC line. A trailing `\r\n` is tolerated and stripped.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let (prefix, rest) = match line.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, rest) = stripped
                    .split_once(' ')
                    .ok_or(ParseError::MissingCommand)?;
                (Some(prefix.to_owned()), rest.trim_start_matches(' '))
            }
            None => (None, line),
        };

        let (command, mut tail) = match rest.split_once(' ') {
            Some((command, tail)) => (command, tail),
            None => (rest, ""),
        };
        if command.is_empty() {
            return Err(ParseError::MissingCommand);
        }

        let mut params = Vec::new();
        while !tail.is_empty() {
            if let Some(trailing) = tail.strip_prefix(':') {
                // Trailing param: the rest of the line, spaces included.
                params.push(trailing.to_owned());
                break;
            }
            match tail.split_once(' ') {
                Some((param, rest)) => {
                    if !param.is_empty() {
                        params.push(param.to_owned());
                    }
                    tail = rest;
                }
                None => {
                    params.push(tail.to_owned());
                    break;
                }
            }
        }

        Ok(Message {
            prefix,
            command: command.to_owned(),
            params,
        })
    }

    /// The numeric reply code, if the command is a three-digit numeric.
    pub fn numeric_code(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// Serialize to the IRC wire format (without trailing `\r\n`).
    ///
    /// The last parameter is always written with a leading `:`. That form is
    /// valid for any content per RFC 2812 and sidesteps the question of
    /// whether a param needs trailing treatment.
    pub fn to_wire(&self) -> String {
        let mut line = String::with_capacity(64);
        if let Some(prefix) = &self.prefix {
            line.push(':');
            line.push_str(prefix);
            line.push(' ');
        }
        line.push_str(&self.command);
        if !self.params.is_empty() {
            let last = self.params.len() - 1;
            for (i, param) in self.params.iter().enumerate() {
                line.push(' ');
                if i == last {
                    line.push(':');
                }
                line.push_str(param);
            }
        }
        line
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}
