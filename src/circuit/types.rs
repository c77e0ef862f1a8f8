//! Core types for circuit representation.

use std::fmt;
use std::ops::Not;
use std::str::FromStr;

/// A unique identifier for a pin in the circuit.
/// Doubles as the index into a level vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub usize);

impl PinId {
    /// Raw index into per-pin storage.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A unique identifier for a node in the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Logic level carried by a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    High,
    Low,
    /// Not yet driven, or derived from an undriven level
    #[default]
    Undefined,
}

impl Level {
    /// Convert a boolean into a defined level.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Level::High
        } else {
            Level::Low
        }
    }

    /// `Some(true)` for HIGH, `Some(false)` for LOW, `None` when undefined.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Level::High => Some(true),
            Level::Low => Some(false),
            Level::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Level::Undefined)
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::High => Level::Low,
            Level::Low => Level::High,
            Level::Undefined => Level::Undefined,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::High => write!(f, "HIGH"),
            Level::Low => write!(f, "LOW"),
            Level::Undefined => write!(f, "UNDEFINED"),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HIGH" | "H" | "1" | "TRUE" => Ok(Level::High),
            "LOW" | "L" | "0" | "FALSE" => Ok(Level::Low),
            "UNDEFINED" | "X" | "U" => Ok(Level::Undefined),
            _ => Err(format!("unknown logic level '{}'", s)),
        }
    }
}

/// Whether a pin receives or drives a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinRole {
    Input,
    Output,
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinRole::Input => write!(f, "input"),
            PinRole::Output => write!(f, "output"),
        }
    }
}

/// Node kinds supported by the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Externally driven source
    Entry,
    /// Observation sink
    Exit,
    /// Pass-through fan-out point
    Junction,
    And,
    Or,
    Not,
}

/// Allowed pin count for one side of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCount {
    Exactly(usize),
    AtLeast(usize),
}

impl PinCount {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            PinCount::Exactly(n) => count == n,
            PinCount::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for PinCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinCount::Exactly(n) => write!(f, "{}", n),
            PinCount::AtLeast(n) => write!(f, "{}+", n),
        }
    }
}

impl NodeKind {
    /// Parse a node kind from its keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "ENTRY" | "IN" | "INPUT" => Some(Self::Entry),
            "EXIT" | "OUT" | "OUTPUT" => Some(Self::Exit),
            "JUNCTION" | "JUNC" | "SPLIT" => Some(Self::Junction),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" | "INV" => Some(Self::Not),
            _ => None,
        }
    }

    /// Expected `(inputs, outputs)` pin counts for this kind.
    pub fn arity(&self) -> (PinCount, PinCount) {
        match self {
            Self::Entry => (PinCount::Exactly(0), PinCount::Exactly(1)),
            Self::Exit => (PinCount::Exactly(1), PinCount::Exactly(0)),
            Self::Junction => (PinCount::Exactly(1), PinCount::AtLeast(0)),
            Self::And | Self::Or => (PinCount::AtLeast(2), PinCount::Exactly(1)),
            Self::Not => (PinCount::Exactly(1), PinCount::Exactly(1)),
        }
    }

    /// Human readable arity, used in error messages.
    pub fn arity_description(&self) -> &'static str {
        match self {
            Self::Entry => "0 inputs and 1 output",
            Self::Exit => "1 input and 0 outputs",
            Self::Junction => "1 input and any number of outputs",
            Self::And | Self::Or => "at least 2 inputs and 1 output",
            Self::Not => "1 input and 1 output",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entry => "ENTRY",
            Self::Exit => "EXIT",
            Self::Junction => "JUNCTION",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_keyword(s).ok_or_else(|| format!("unknown node kind '{}'", s))
    }
}
