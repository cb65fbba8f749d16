//! Loader for the `N M` + `M` edge pairs text format.

use std::io::{self, Read};
use std::str::SplitAsciiWhitespace;

use thiserror::Error;
use tracing::{debug, warn};

use crate::graph::{GraphError, PropagationGraph};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input")]
    Io(#[from] io::Error),
    #[error("input ended early, expected {expected}")]
    MissingToken { expected: &'static str },
    #[error("expected {expected}, found {token:?}")]
    InvalidToken {
        token: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub fn read_graph(mut reader: impl Read) -> Result<PropagationGraph, InputError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_graph(&text)
}

/// Parses whitespace-separated unsigned integers: the node count, the edge
/// count, then one 1-based `person friend` pair per edge.
pub fn parse_graph(text: &str) -> Result<PropagationGraph, InputError> {
    let mut tokens = text.split_ascii_whitespace();
    let node_count = next_number(&mut tokens, "node count")?;
    let edge_count = next_number(&mut tokens, "edge count")?;

    let mut graph = PropagationGraph::try_new(node_count)?;
    for _ in 0..edge_count {
        let person = next_number(&mut tokens, "edge source")?;
        let friend = next_number(&mut tokens, "edge target")?;
        graph.add_edge(person, friend)?;
    }

    let trailing = tokens.count();
    if trailing > 0 {
        warn!(trailing, "ignoring tokens after the declared edges");
    }
    debug!(nodes = node_count, edges = edge_count, "graph parsed");
    Ok(graph)
}

fn next_number(
    tokens: &mut SplitAsciiWhitespace<'_>,
    expected: &'static str,
) -> Result<usize, InputError> {
    let token = tokens.next().ok_or(InputError::MissingToken { expected })?;
    token.parse().map_err(|_| InputError::InvalidToken {
        token: token.to_owned(),
        expected,
    })
}
