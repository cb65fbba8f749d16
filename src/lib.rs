//! Longest chain of influence through a directed graph once every strongly
//! connected component is collapsed to a single step.
//!
//! ```
//! use propagation_depth::PropagationGraph;
//!
//! let mut graph = PropagationGraph::from_edges(3, [(1, 2), (2, 1), (1, 3)]).unwrap();
//! assert_eq!(graph.max_propagation(), 1);
//! ```
use static_assertions::const_assert_eq;
use std::thread;

mod dfs;
pub mod graph;
pub mod input;

pub use graph::{Component, GraphError, Orientation, ParseOrientationError, PropagationGraph};
pub use input::{parse_graph, read_graph, InputError};

const_assert_eq!(std::mem::size_of::<dfs::Color>(), 1);

/// Runs `f` on a fresh thread whose stack is limited to `size` bytes.
pub fn with_stack_size<F, T>(size: usize, f: F) -> thread::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match thread::Builder::new().stack_size(size).spawn(f) {
        Ok(handle) => handle.join(),
        Err(err) => Err(Box::new(err)),
    }
}
