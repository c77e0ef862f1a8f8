//! # Logic Emu
//!
//! A tick-based emulator for digital logic circuits.
//!
//! This library provides:
//! - An immutable circuit graph of ENTRY, EXIT, JUNCTION, AND, OR and NOT nodes
//! - A pure per-tick evaluator that handles fan-out and feedback loops
//! - A scheduler that paces ticks in real time and stops cooperatively
//! - An emulation session with a lifecycle, snapshots and per-tick subscriptions
//! - A small netlist format for describing circuits as text
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Graph model: nodes, pins, edges and structural validation
//! - [`engine`] - Evaluator, propagation scheduler and emulation session
//! - [`netlist`] - Parser for the circuit description text format
//! - [`error`] - The crate's error type
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! logic-emu circuit.net --set a_o=HIGH --ticks 10 --delay-ms 250
//! ```
//!
//! ### Library
//!
//! ```
//! use std::sync::Arc;
//! use logic_emu::circuit::{Graph, Level, NodeDescriptor, NodeKind, ParsedCircuitGraph};
//! use logic_emu::engine::{EvalDelay, Session};
//!
//! let none: [&str; 0] = [];
//! let parsed = ParsedCircuitGraph::new()
//!     .node(NodeDescriptor::new("in", NodeKind::Entry, none, ["in_o"]))
//!     .node(NodeDescriptor::new("inv", NodeKind::Not, ["inv_i"], ["inv_o"]))
//!     .node(NodeDescriptor::new("out", NodeKind::Exit, ["out_i"], none))
//!     .edge("in_o", "inv_i")
//!     .edge("inv_o", "out_i");
//!
//! let graph = Arc::new(Graph::build(&parsed)?);
//! let mut session = Session::create(graph, EvalDelay::ZERO)?;
//! session.set_entry_level("in_o", Level::High)?;
//! session.step()?;
//! assert_eq!(session.snapshot()?.level("out_i"), Some(Level::Low));
//! # Ok::<(), logic_emu::EmuError>(())
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmSession } from 'logic_emu';
//!
//! const session = new WasmSession(netlistText, 250);
//! session.set_entry_level('a_o', 'HIGH');
//! session.step();
//! ```

pub mod circuit;
pub mod engine;
pub mod error;
pub mod netlist;

// Re-export main types for convenience
pub use circuit::{Graph, Level};
pub use engine::{EvalDelay, Session, Snapshot};
pub use error::{EmuError, Result};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmSession;
