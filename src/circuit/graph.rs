//! Circuit graph structure.

use std::collections::HashMap;

use tracing::debug;

use super::parsed::ParsedCircuitGraph;
use super::types::{Level, NodeId, NodeKind, PinId, PinRole};
use super::validate::{validate_arity, validate_role};
use crate::error::{EmuError, Result};

/// A pin owned by exactly one node.
#[derive(Debug, Clone)]
pub struct Pin {
    pub id: PinId,
    /// Id the pin was declared with
    pub name: String,
    pub role: PinRole,
    /// Owning node
    pub node: NodeId,
}

/// A circuit node with its pins.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Id the node was declared with
    pub name: String,
    pub kind: NodeKind,
    pub inputs: Vec<PinId>,
    pub outputs: Vec<PinId>,
}

/// A directed connection from an output pin to an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: PinId,
    pub to: PinId,
}

/// An immutable circuit ready for emulation.
///
/// Nodes and pins live in arenas indexed by [`NodeId`] and [`PinId`]; edges
/// refer to pins by id only, so feedback loops need no cyclic ownership.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    pins: Vec<Pin>,
    edges: Vec<Edge>,

    /// Mapping from node names to node IDs
    node_map: HashMap<String, NodeId>,

    /// Mapping from pin names to pin IDs
    pin_map: HashMap<String, PinId>,

    /// Edge indices leaving each output pin
    fan_out: Vec<Vec<usize>>,

    /// Edge index driving each input pin, if any
    driver: Vec<Option<usize>>,

    /// Declared starting level of every pin
    initial_levels: Vec<Level>,
}

impl Graph {
    /// Build a graph from parsed descriptors.
    ///
    /// Fails on the first structural problem found; no partially built graph
    /// is ever returned. Cycles are legal.
    pub fn build(parsed: &ParsedCircuitGraph) -> Result<Self> {
        let mut nodes = Vec::with_capacity(parsed.nodes.len());
        let mut pins = Vec::new();
        let mut node_map = HashMap::new();
        let mut pin_map = HashMap::new();
        let mut initial_levels = Vec::new();

        for desc in &parsed.nodes {
            validate_arity(desc)?;

            let node_id = NodeId(nodes.len());
            if node_map.insert(desc.id.clone(), node_id).is_some() {
                return Err(EmuError::DuplicateNode {
                    node: desc.id.clone(),
                });
            }

            let mut intern = |name: &String, role: PinRole, level: Level| -> Result<PinId> {
                let pin_id = PinId(pins.len());
                if pin_map.insert(name.clone(), pin_id).is_some() {
                    return Err(EmuError::DuplicatePin { pin: name.clone() });
                }
                pins.push(Pin {
                    id: pin_id,
                    name: name.clone(),
                    role,
                    node: node_id,
                });
                initial_levels.push(level);
                Ok(pin_id)
            };

            let inputs = desc
                .input_pin_ids
                .iter()
                .map(|name| intern(name, PinRole::Input, Level::Undefined))
                .collect::<Result<Vec<_>>>()?;

            let output_level = desc.initial_level.unwrap_or_default();
            let outputs = desc
                .output_pin_ids
                .iter()
                .map(|name| intern(name, PinRole::Output, output_level))
                .collect::<Result<Vec<_>>>()?;

            nodes.push(Node {
                id: node_id,
                name: desc.id.clone(),
                kind: desc.kind,
                inputs,
                outputs,
            });
        }

        let mut edges = Vec::with_capacity(parsed.edges.len());
        let mut fan_out = vec![Vec::new(); pins.len()];
        let mut driver = vec![None; pins.len()];

        for (idx, desc) in parsed.edges.iter().enumerate() {
            let label = format!("#{} {} => {}", idx, desc.from_pin_id, desc.to_pin_id);

            let resolve = |name: &String| {
                pin_map.get(name).copied().ok_or_else(|| EmuError::DanglingEdge {
                    edge: label.clone(),
                    pin: name.clone(),
                })
            };
            let from = resolve(&desc.from_pin_id)?;
            let to = resolve(&desc.to_pin_id)?;

            validate_role(&label, &desc.from_pin_id, PinRole::Output, pins[from.0].role)?;
            validate_role(&label, &desc.to_pin_id, PinRole::Input, pins[to.0].role)?;

            if driver[to.0].is_some() {
                return Err(EmuError::MultipleDrivers {
                    pin: desc.to_pin_id.clone(),
                });
            }

            driver[to.0] = Some(edges.len());
            fan_out[from.0].push(edges.len());
            edges.push(Edge { from, to });
        }

        // Driven inputs start at their driver's declared level
        for edge in &edges {
            initial_levels[edge.to.0] = initial_levels[edge.from.0];
        }

        debug!(
            nodes = nodes.len(),
            pins = pins.len(),
            edges = edges.len(),
            "built circuit graph"
        );

        Ok(Graph {
            nodes,
            pins,
            edges,
            node_map,
            pin_map,
            fan_out,
            driver,
            initial_levels,
        })
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of pins (the length of a level vector).
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.0]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Input pins followed by output pins of a node.
    pub fn pins_of(&self, node: NodeId) -> impl Iterator<Item = &Pin> + '_ {
        let node = &self.nodes[node.0];
        node.inputs
            .iter()
            .chain(node.outputs.iter())
            .map(move |p| &self.pins[p.0])
    }

    /// Edges leaving a pin. Empty for input pins.
    pub fn edges_from(&self, pin: PinId) -> impl Iterator<Item = &Edge> + '_ {
        self.fan_out[pin.0].iter().map(move |&e| &self.edges[e])
    }

    /// The edge driving a pin, if any. Always `None` for output pins.
    pub fn edge_to(&self, pin: PinId) -> Option<&Edge> {
        self.driver[pin.0].map(|e| &self.edges[e])
    }

    /// The output pin driving an input pin, if any.
    pub fn driver_of(&self, pin: PinId) -> Option<PinId> {
        self.edge_to(pin).map(|e| e.from)
    }

    /// All ENTRY nodes, the externally drivable set.
    pub fn entry_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Entry)
    }

    /// All EXIT nodes.
    pub fn exit_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Exit)
    }

    /// Find a pin ID by name.
    pub fn find_pin(&self, name: &str) -> Option<PinId> {
        self.pin_map.get(name).copied()
    }

    /// Find a node ID by name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_map.get(name).copied()
    }

    /// Get the name of a pin.
    pub fn pin_name(&self, pin: PinId) -> &str {
        &self.pins[pin.0].name
    }

    /// Get the name of a node.
    pub fn node_name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].name
    }

    /// Kind of the node owning a pin.
    pub fn owner_kind(&self, pin: PinId) -> NodeKind {
        self.nodes[self.pins[pin.0].node.0].kind
    }

    /// Declared starting level of every pin, indexed by [`PinId`].
    pub fn initial_levels(&self) -> &[Level] {
        &self.initial_levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{NodeDescriptor, ParsedCircuitGraph};

    const NONE: [&str; 0] = [];

    fn inverter_chain() -> ParsedCircuitGraph {
        ParsedCircuitGraph::new()
            .node(NodeDescriptor::new("a", NodeKind::Entry, NONE, ["a_o"]))
            .node(NodeDescriptor::new("n", NodeKind::Not, ["n_i"], ["n_o"]))
            .node(NodeDescriptor::new("x", NodeKind::Exit, ["x_i"], NONE))
            .edge("a_o", "n_i")
            .edge("n_o", "x_i")
    }

    #[test]
    fn test_build_and_query() {
        let graph = Graph::build(&inverter_chain()).unwrap();
        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.pin_count(), 4);
        assert_eq!(graph.edges().len(), 2);

        let a_o = graph.find_pin("a_o").unwrap();
        let n_i = graph.find_pin("n_i").unwrap();
        assert_eq!(graph.driver_of(n_i), Some(a_o));
        assert_eq!(graph.edges_from(a_o).count(), 1);
        assert!(graph.edge_to(a_o).is_none());

        let n = graph.find_node("n").unwrap();
        let names: Vec<_> = graph.pins_of(n).map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["n_i", "n_o"]);

        let entries: Vec<_> = graph.entry_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(entries, vec!["a"]);
        assert_eq!(graph.exit_nodes().count(), 1);
    }

    #[test]
    fn test_dangling_edge() {
        let parsed = inverter_chain().edge("a_o", "ghost");
        match Graph::build(&parsed) {
            Err(EmuError::DanglingEdge { pin, .. }) => assert_eq!(pin, "ghost"),
            other => panic!("expected DanglingEdge, got {:?}", other),
        }
    }

    #[test]
    fn test_role_mismatch() {
        let parsed = inverter_chain().edge("x_i", "n_o");
        match Graph::build(&parsed) {
            Err(EmuError::RoleMismatch { pin, expected, .. }) => {
                assert_eq!(pin, "x_i");
                assert_eq!(expected, "output");
            }
            other => panic!("expected RoleMismatch, got {:?}", other),
        }

        // Output pin as the target
        let parsed = inverter_chain().edge("a_o", "n_o");
        match Graph::build(&parsed) {
            Err(EmuError::RoleMismatch { pin, expected, actual, .. }) => {
                assert_eq!(pin, "n_o");
                assert_eq!(expected, "input");
                assert_eq!(actual, "output");
            }
            other => panic!("expected RoleMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_junction_without_outputs_is_valid() {
        let parsed = inverter_chain()
            .node(NodeDescriptor::new("j", NodeKind::Junction, ["j_i"], NONE))
            .edge("n_o", "j_i");
        // n_o already drives x_i; a second fan-out edge is fine
        let graph = Graph::build(&parsed).unwrap();
        let j = graph.find_node("j").unwrap();
        assert!(graph.node(j).outputs.is_empty());
    }

    #[test]
    fn test_multiple_drivers() {
        let parsed = inverter_chain().edge("a_o", "x_i");
        match Graph::build(&parsed) {
            Err(EmuError::MultipleDrivers { pin }) => assert_eq!(pin, "x_i"),
            other => panic!("expected MultipleDrivers, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_arity() {
        let parsed = ParsedCircuitGraph::new().node(NodeDescriptor::new(
            "g",
            NodeKind::And,
            ["only"],
            ["g_o"],
        ));
        match Graph::build(&parsed) {
            Err(EmuError::InvalidNodeArity { node, kind, .. }) => {
                assert_eq!(node, "g");
                assert_eq!(kind, "AND");
            }
            other => panic!("expected InvalidNodeArity, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicates() {
        let parsed = inverter_chain().node(NodeDescriptor::new("a", NodeKind::Entry, NONE, ["z"]));
        assert!(matches!(
            Graph::build(&parsed),
            Err(EmuError::DuplicateNode { .. })
        ));

        let parsed = inverter_chain().node(NodeDescriptor::new("b", NodeKind::Entry, NONE, ["a_o"]));
        assert!(matches!(
            Graph::build(&parsed),
            Err(EmuError::DuplicatePin { .. })
        ));
    }

    #[test]
    fn test_cycles_are_legal() {
        let parsed = ParsedCircuitGraph::new()
            .node(NodeDescriptor::new("n1", NodeKind::Not, ["n1_i"], ["n1_o"]))
            .node(NodeDescriptor::new("n2", NodeKind::Not, ["n2_i"], ["n2_o"]))
            .edge("n1_o", "n2_i")
            .edge("n2_o", "n1_i");
        assert!(Graph::build(&parsed).is_ok());
    }

    #[test]
    fn test_initial_levels_follow_declared_defaults() {
        let parsed = ParsedCircuitGraph::new()
            .node(NodeDescriptor::new("a", NodeKind::Entry, NONE, ["a_o"]).with_initial_level(Level::High))
            .node(NodeDescriptor::new("x", NodeKind::Exit, ["x_i"], NONE))
            .node(NodeDescriptor::new("y", NodeKind::Exit, ["y_i"], NONE))
            .edge("a_o", "x_i");
        let graph = Graph::build(&parsed).unwrap();
        let levels = graph.initial_levels();
        assert_eq!(levels[graph.find_pin("a_o").unwrap().index()], Level::High);
        assert_eq!(levels[graph.find_pin("x_i").unwrap().index()], Level::High);
        assert_eq!(levels[graph.find_pin("y_i").unwrap().index()], Level::Undefined);
    }
}
