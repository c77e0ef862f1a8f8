//! Error types for the logic emulator.
//!
//! This module provides a unified error type [`EmuError`] covering every
//! failure the crate can report: structural problems found while building a
//! circuit graph, protocol violations on an emulation session, malformed
//! netlist input, and anything unexpected coming from outside the crate.
//!
//! The evaluator and scheduler never fail; all fallibility lives at the
//! boundaries (graph build, session commands, netlist loading).

use thiserror::Error;

use crate::engine::SessionState;

/// Result type alias using [`EmuError`].
pub type Result<T> = std::result::Result<T, EmuError>;

/// Coarse classification of an [`EmuError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised while building a graph; fatal to that build attempt.
    Structural,
    /// Raised by a session command; the session is left untouched.
    SessionProtocol,
    /// Malformed netlist text or unreadable netlist file.
    Input,
    /// Anything else. Reported, never recovered from automatically.
    Unexpected,
}

/// Unified error type for all emulator operations.
#[derive(Error, Debug)]
pub enum EmuError {
    // ============ Structural Errors ============
    /// Node has the wrong number of input or output pins for its kind
    #[error("Node '{node}' of kind {kind} has {inputs} input(s) and {outputs} output(s), expected {expected}")]
    InvalidNodeArity {
        node: String,
        kind: String,
        inputs: usize,
        outputs: usize,
        expected: &'static str,
    },

    /// Edge endpoint does not name any known pin
    #[error("Edge '{edge}' references unknown pin '{pin}'")]
    DanglingEdge { edge: String, pin: String },

    /// Edge endpoint names a pin of the wrong role
    #[error("Edge '{edge}': pin '{pin}' is an {actual} pin, expected an {expected} pin")]
    RoleMismatch {
        edge: String,
        pin: String,
        expected: String,
        actual: String,
    },

    /// Input pin is the target of more than one edge
    #[error("Input pin '{pin}' is driven by more than one edge")]
    MultipleDrivers { pin: String },

    /// Two nodes share the same id
    #[error("Duplicate node id '{node}'")]
    DuplicateNode { node: String },

    /// Two pins share the same id
    #[error("Duplicate pin id '{pin}'")]
    DuplicatePin { pin: String },

    // ============ Session Errors ============
    /// Operation not allowed in the session's current state
    #[error("Operation '{operation}' is not valid in state {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Operation targets a pin it cannot act on
    #[error("Invalid target '{target}': {message}")]
    InvalidTarget { target: String, message: String },

    /// Session could not be created
    #[error("Cannot create session: {message}")]
    Creation { message: String },

    // ============ Netlist Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Error reading a netlist file
    #[error("Failed to read netlist file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============ Unexpected Errors ============
    /// Failure from outside the crate's own taxonomy
    #[error("Unexpected failure: {message}")]
    Unexpected {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl EmuError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidNodeArity { .. }
            | Self::DanglingEdge { .. }
            | Self::RoleMismatch { .. }
            | Self::MultipleDrivers { .. }
            | Self::DuplicateNode { .. }
            | Self::DuplicatePin { .. } => ErrorKind::Structural,
            Self::InvalidState { .. } | Self::InvalidTarget { .. } | Self::Creation { .. } => {
                ErrorKind::SessionProtocol
            }
            Self::LexerError { .. } | Self::ParseError { .. } | Self::FileReadError { .. } => {
                ErrorKind::Input
            }
            Self::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(operation: &'static str, state: SessionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create an invalid target error
    pub fn invalid_target(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a session creation error
    pub fn creation(message: impl Into<String>) -> Self {
        Self::Creation {
            message: message.into(),
        }
    }

    /// Wrap a foreign error, keeping it as the source.
    pub fn unexpected<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unexpected {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_structural_kind() {
        let e = EmuError::DanglingEdge {
            edge: "a_o => nowhere".into(),
            pin: "nowhere".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Structural);
        assert!(e.to_string().contains("nowhere"));
    }

    #[test]
    fn test_session_kind() {
        let e = EmuError::invalid_state("step", SessionState::Disposed);
        assert_eq!(e.kind(), ErrorKind::SessionProtocol);
        assert!(e.to_string().contains("DISPOSED"));
    }

    #[test]
    fn test_unexpected_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let e = EmuError::unexpected("logging setup", io);
        assert_eq!(e.kind(), ErrorKind::Unexpected);
        assert_eq!(e.source().map(|s| s.to_string()), Some("disk on fire".into()));
    }
}
