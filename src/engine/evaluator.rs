//! Single-generation evaluation of a circuit graph.
//!
//! Every node reads only from the current level vector and writes only to
//! the next one, so evaluation order is irrelevant and a feedback loop simply
//! delays a node's own output by one tick.

use crate::circuit::{Graph, Level, Node, NodeKind};

/// AND over any number of inputs. A LOW input dominates UNDEFINED.
pub fn and_levels<I>(inputs: I) -> Level
where
    I: IntoIterator<Item = Level>,
{
    let mut result = Level::High;
    for level in inputs {
        match level {
            Level::Low => return Level::Low,
            Level::Undefined => result = Level::Undefined,
            Level::High => {}
        }
    }
    result
}

/// OR over any number of inputs. A HIGH input dominates UNDEFINED.
pub fn or_levels<I>(inputs: I) -> Level
where
    I: IntoIterator<Item = Level>,
{
    let mut result = Level::Low;
    for level in inputs {
        match level {
            Level::High => return Level::High,
            Level::Undefined => result = Level::Undefined,
            Level::Low => {}
        }
    }
    result
}

pub fn not_level(input: Level) -> Level {
    !input
}

/// Copy each driving output pin's level onto the input pins it feeds.
///
/// Undriven input pins keep whatever level they hold.
pub fn resolve_wires(graph: &Graph, levels: &mut [Level]) {
    for edge in graph.edges() {
        levels[edge.to.index()] = levels[edge.from.index()];
    }
}

fn first_input(node: &Node, levels: &[Level]) -> Level {
    levels[node.inputs[0].index()]
}

/// Compute the next generation of pin levels.
///
/// One pass over all nodes: outputs are computed from `current` input
/// levels, then wires are resolved on the result. ENTRY outputs carry over
/// unchanged; EXIT nodes have nothing to compute.
pub fn evaluate_generation(graph: &Graph, current: &[Level]) -> Vec<Level> {
    debug_assert_eq!(current.len(), graph.pin_count());

    let mut next = current.to_vec();

    for node in graph.nodes() {
        let output = match node.kind {
            NodeKind::Entry | NodeKind::Exit => continue,
            NodeKind::Junction => first_input(node, current),
            NodeKind::Not => not_level(first_input(node, current)),
            NodeKind::And => and_levels(node.inputs.iter().map(|p| current[p.index()])),
            NodeKind::Or => or_levels(node.inputs.iter().map(|p| current[p.index()])),
        };

        for pin in &node.outputs {
            next[pin.index()] = output;
        }
    }

    resolve_wires(graph, &mut next);
    next
}
