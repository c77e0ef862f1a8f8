//! Line-oriented netlist format for describing logic circuits.
//!
//! The netlist is the front-end used by the CLI and WASM bindings to produce
//! a [`ParsedCircuitGraph`]. Richer document formats can feed the engine the
//! same way without touching this module.
//!
//! # Grammar Overview
//!
//! ```text
//! netlist    = { line }
//! line       = comment | directive | node | edge | empty
//! comment    = ('#' | ';') { any_char }
//! directive  = ".delay" value | ".ticks" integer | ".init" node_id level
//! node       = kind node_id { pin_id } [ "->" { pin_id } ]
//! edge       = pin_id "=>" pin_id
//!
//! kind       = "ENTRY" | "EXIT" | "JUNCTION" | "AND" | "OR" | "NOT"
//! level      = "HIGH" | "LOW" | "UNDEFINED" | "1" | "0" | "X"
//! value      = digit+ ['.' digit+] [unit_suffix]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k'
//! ```
//!
//! # Example
//!
//! ```text
//! # a AND NOT b
//! .delay 100m
//! .init a HIGH
//!
//! ENTRY a -> a_o
//! ENTRY b -> b_o
//! NOT   nb nb_i -> nb_o
//! AND   g g_a g_b -> g_o
//! EXIT  q q_i
//!
//! a_o  => g_a
//! b_o  => nb_i
//! nb_o => g_b
//! g_o  => q_i
//! ```

mod lexer;
mod parser;

pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::circuit::{Graph, ParsedCircuitGraph};
use crate::engine::{EvalDelay, SchedulerConfig};
use crate::error::Result;

/// Run settings declared inside a netlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetlistOptions {
    /// From `.delay`
    pub eval_delay: Option<EvalDelay>,
    /// From `.ticks`
    pub tick_limit: Option<u64>,
}

impl NetlistOptions {
    /// Scheduler configuration carrying these options.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        let mut config = SchedulerConfig::new();
        if let Some(delay) = self.eval_delay {
            config = config.with_eval_delay(delay);
        }
        if let Some(ticks) = self.tick_limit {
            config = config.with_tick_limit(ticks);
        }
        config
    }
}

/// A parsed netlist: circuit descriptors plus declared options.
#[derive(Debug, Clone, PartialEq)]
pub struct Netlist {
    pub graph: ParsedCircuitGraph,
    pub options: NetlistOptions,
}

impl Netlist {
    /// Validate the descriptors into a [`Graph`].
    pub fn build_graph(&self) -> Result<Graph> {
        Graph::build(&self.graph)
    }
}

/// Parse netlist text.
pub fn parse(input: &str) -> Result<Netlist> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a netlist file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<Netlist> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::EmuError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
