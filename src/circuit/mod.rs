//! Circuit graph representation and validation.
//!
//! This module turns the descriptors produced by a circuit front-end
//! ([`ParsedCircuitGraph`]) into an immutable [`Graph`] of nodes, pins and
//! edges that the emulation engine evaluates.

mod graph;
mod parsed;
mod types;
mod validate;

pub use graph::{Edge, Graph, Node, Pin};
pub use parsed::{EdgeDescriptor, NodeDescriptor, ParsedCircuitGraph};
pub use types::*;
pub use validate::{validate_arity, validate_role};
