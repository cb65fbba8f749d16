//! Depth-first traversal over an explicit stack.
//!
//! The recursive formulation
//!
//! ```text
//! def visit(v):
//!     color[v] = GREY
//!     for w in edges[v]:
//!         if color[w] == WHITE:
//!             visit(w)
//!     color[v] = BLACK
//!     on_complete(v)
//! ```
//!
//! is turned into a loop that peeks at the top of the stack and only pops a
//! node once it has reached its terminal colour. Finish order matches the
//! recursive version's.

/// Per-node traversal state. Persists across the calls of one sweep, so nodes
/// finished from an earlier start are skipped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    White,
    Grey,
    Black,
}

/// Which adjacency list a traversal follows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    Outgoing,
    Incoming,
}

/// Walks everything reachable from `start` through still-white nodes and calls
/// `on_complete` once per node at the moment it turns black. The callback also
/// sees the colours as they stand at that moment.
///
/// `stack` is scratch space and is empty again when this returns.
pub fn visit(
    start: usize,
    edges: &[Vec<usize>],
    colors: &mut [Color],
    stack: &mut Vec<usize>,
    mut on_complete: impl FnMut(usize, &[Color]),
) {
    stack.push(start);
    while let Some(&v) = stack.last() {
        match colors[v] {
            Color::White => {
                colors[v] = Color::Grey;
                stack.extend(
                    edges[v]
                        .iter()
                        .copied()
                        .filter(|&w| colors[w] == Color::White),
                );
            }
            Color::Grey => {
                colors[v] = Color::Black;
                on_complete(v, colors);
            }
            Color::Black => {
                stack.pop();
            }
        }
    }
}
