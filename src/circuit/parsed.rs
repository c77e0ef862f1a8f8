//! Parsed circuit descriptors.
//!
//! This is the shape handed over by whatever front-end reads a circuit
//! document: ordered node descriptors and ordered edge descriptors, with
//! every pin named by a string id. [`Graph::build`](super::Graph::build)
//! consumes exactly this and nothing else.

use super::types::{Level, NodeKind};

/// Complete parsed representation of a circuit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCircuitGraph {
    /// Node descriptors in document order
    pub nodes: Vec<NodeDescriptor>,
    /// Edge descriptors in document order
    pub edges: Vec<EdgeDescriptor>,
}

impl ParsedCircuitGraph {
    /// Create a new empty circuit description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node descriptor.
    pub fn node(mut self, node: NodeDescriptor) -> Self {
        self.nodes.push(node);
        self
    }

    /// Append an edge from an output pin to an input pin.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(EdgeDescriptor::new(from, to));
        self
    }
}

/// A node as described by the front-end.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor {
    /// Unique node id
    pub id: String,
    pub kind: NodeKind,
    /// Input pin ids, in order
    pub input_pin_ids: Vec<String>,
    /// Output pin ids, in order
    pub output_pin_ids: Vec<String>,
    /// Declared starting level for the node's output pins
    pub initial_level: Option<Level>,
}

impl NodeDescriptor {
    pub fn new<I, O>(id: impl Into<String>, kind: NodeKind, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            id: id.into(),
            kind,
            input_pin_ids: inputs.into_iter().map(Into::into).collect(),
            output_pin_ids: outputs.into_iter().map(Into::into).collect(),
            initial_level: None,
        }
    }

    /// Set the declared starting level of the output pins.
    pub fn with_initial_level(mut self, level: Level) -> Self {
        self.initial_level = Some(level);
        self
    }
}

/// A directed connection from an output pin to an input pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDescriptor {
    pub from_pin_id: String,
    pub to_pin_id: String,
}

impl EdgeDescriptor {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_pin_id: from.into(),
            to_pin_id: to.into(),
        }
    }
}
