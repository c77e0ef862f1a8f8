//! Structural validation of circuit descriptors.

use crate::error::{EmuError, Result};

use super::parsed::NodeDescriptor;
use super::types::PinRole;

/// Validate that a node has exactly the pins its kind requires.
pub fn validate_arity(node: &NodeDescriptor) -> Result<()> {
    let (inputs, outputs) = node.kind.arity();
    let n_in = node.input_pin_ids.len();
    let n_out = node.output_pin_ids.len();

    if inputs.accepts(n_in) && outputs.accepts(n_out) {
        return Ok(());
    }

    Err(EmuError::InvalidNodeArity {
        node: node.id.clone(),
        kind: node.kind.to_string(),
        inputs: n_in,
        outputs: n_out,
        expected: node.kind.arity_description(),
    })
}

/// Validate that an edge endpoint has the role its position requires.
pub fn validate_role(edge: &str, pin: &str, expected: PinRole, actual: PinRole) -> Result<()> {
    if expected == actual {
        return Ok(());
    }

    Err(EmuError::RoleMismatch {
        edge: edge.to_string(),
        pin: pin.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}
