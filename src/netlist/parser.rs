//! Parser for the netlist format.

use std::collections::HashMap;

use super::lexer::{parse_value, Lexer, Token, TokenKind};
use super::{Netlist, NetlistOptions};
use crate::circuit::{EdgeDescriptor, Level, NodeDescriptor, NodeKind, ParsedCircuitGraph};
use crate::engine::EvalDelay;
use crate::error::{EmuError, Result};

/// Parser for netlist text.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            peeked: None,
        })
    }

    /// Parse the entire netlist.
    pub fn parse(&mut self) -> Result<Netlist> {
        let mut graph = ParsedCircuitGraph::new();
        let mut options = NetlistOptions::default();
        let mut inits: Vec<(String, Level, usize)> = Vec::new();

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut options, &mut inits)?,
                TokenKind::Identifier => {
                    let is_node = NodeKind::from_keyword(&self.current.text).is_some()
                        && self.peek_kind()? != TokenKind::Wire;
                    if is_node {
                        graph.nodes.push(self.parse_node()?);
                    } else {
                        graph.edges.push(self.parse_edge()?);
                    }
                }
                _ => {
                    return Err(EmuError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }

            self.end_of_line()?;
        }

        // Declared levels apply once every node is known
        let index: HashMap<String, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        for (node, level, line) in inits {
            let i = *index
                .get(&node)
                .ok_or_else(|| EmuError::parse(line, format!(".init names unknown node '{}'", node)))?;
            graph.nodes[i].initial_level = Some(level);
        }

        Ok(Netlist { graph, options })
    }

    fn advance(&mut self) -> Result<()> {
        self.current = match self.peeked.take() {
            Some(tok) => tok,
            None => self.lexer.next_token()?,
        };
        Ok(())
    }

    fn peek_kind(&mut self) -> Result<TokenKind> {
        let tok = match self.peeked.take() {
            Some(tok) => tok,
            None => self.lexer.next_token()?,
        };
        let kind = tok.kind;
        self.peeked = Some(tok);
        Ok(kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(EmuError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => self.advance(),
            TokenKind::Eof => Ok(()),
            _ => Err(EmuError::parse(
                self.current.line,
                format!("unexpected trailing token: {:?}", self.current.text),
            )),
        }
    }

    fn parse_directive(
        &mut self,
        options: &mut NetlistOptions,
        inits: &mut Vec<(String, Level, usize)>,
    ) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match directive.to_lowercase().as_str() {
            ".delay" => {
                let text = self.expect(TokenKind::Number)?.text;
                let secs = parse_value(&text)
                    .ok_or_else(|| EmuError::parse(line, format!("invalid delay: {}", text)))?;
                let delay = EvalDelay::from_secs_f64(secs)
                    .map_err(|e| EmuError::parse(line, e.to_string()))?;
                options.eval_delay = Some(delay);
            }
            ".ticks" => {
                let text = self.expect(TokenKind::Number)?.text;
                let ticks = text
                    .parse::<u64>()
                    .map_err(|_| EmuError::parse(line, format!("invalid tick count: {}", text)))?;
                options.tick_limit = Some(ticks);
            }
            ".init" => {
                let node = self.expect(TokenKind::Identifier)?.text;
                let level = self.parse_level(line)?;
                inits.push((node, level, line));
            }
            _ => {
                return Err(EmuError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }

    fn parse_level(&mut self, line: usize) -> Result<Level> {
        match self.current.kind {
            TokenKind::Identifier | TokenKind::Number => {
                let level = self
                    .current
                    .text
                    .parse::<Level>()
                    .map_err(|message| EmuError::parse(line, message))?;
                self.advance()?;
                Ok(level)
            }
            _ => Err(EmuError::parse(line, "expected a logic level")),
        }
    }

    /// `KIND id in_pin* [-> out_pin*]`
    fn parse_node(&mut self) -> Result<NodeDescriptor> {
        let keyword = self.expect(TokenKind::Identifier)?;
        let kind = NodeKind::from_keyword(&keyword.text).ok_or_else(|| {
            EmuError::parse(keyword.line, format!("unknown node kind: {}", keyword.text))
        })?;
        let id = self.expect(TokenKind::Identifier)?.text;

        let inputs = self.pin_list()?;
        let outputs = if self.current.kind == TokenKind::Arrow {
            self.advance()?;
            self.pin_list()?
        } else {
            Vec::new()
        };

        Ok(NodeDescriptor::new(id, kind, inputs, outputs))
    }

    fn pin_list(&mut self) -> Result<Vec<String>> {
        let mut pins = Vec::new();
        while self.current.kind == TokenKind::Identifier {
            pins.push(self.current.text.clone());
            self.advance()?;
        }
        Ok(pins)
    }

    /// `from_pin => to_pin`
    fn parse_edge(&mut self) -> Result<EdgeDescriptor> {
        let from = self.expect(TokenKind::Identifier)?.text;
        self.expect(TokenKind::Wire)?;
        let to = self.expect(TokenKind::Identifier)?.text;
        Ok(EdgeDescriptor::new(from, to))
    }
}
