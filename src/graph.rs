//! Influence graph, its strongly connected components, and the longest chain
//! of component crossings.
//!
//! Components are found Kosaraju-style with two sweeps of [`dfs::visit`]. The
//! first sweep records finish order; the second walks the opposite relation in
//! decreasing finish order, so every component is closed only after all the
//! components it can be entered from (through the relation it walks) are
//! closed. Propagation values are relaxed inside that second sweep.

use std::collections::TryReserveError;
use std::str::FromStr;

use static_assertions::assert_impl_all;
use thiserror::Error;
use tracing::{debug, trace};

use crate::dfs::{self, Color, Relation};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum GraphError {
    #[error("person {node} is outside 1..={node_count}")]
    NodeOutOfRange { node: usize, node_count: usize },
    #[error("cannot allocate a graph of {node_count} people")]
    TooLarge {
        node_count: usize,
        #[source]
        source: TryReserveError,
    },
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown orientation {0:?}, expected `reach` or `influence`")]
pub struct ParseOrientationError(String);

/// Which way propagation values are counted. The maximum over all nodes is the
/// same either way; the per-node values mirror each other.
///
/// In both orientations members of one component share a value, and the
/// components partition the nodes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Orientation {
    /// A node's value is the longest chain of crossings that reaches it.
    /// Components are numbered sources first.
    ///
    /// For every edge `u -> v` between components, `value(v) >= value(u) + 1`
    /// and `component_of(u) < component_of(v)`. A node outside any cycle with
    /// no incoming edges has value 0. Sinks generally do not.
    #[default]
    Reach,
    /// A node's value is the longest chain of crossings that leaves it.
    /// Components are numbered sinks first.
    ///
    /// For every edge `u -> v` between components, `value(u) >= value(v) + 1`
    /// and `component_of(u) > component_of(v)`. A sink outside any cycle has
    /// value 0.
    Influence,
}

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reach" => Ok(Self::Reach),
            "influence" => Ok(Self::Influence),
            other => Err(ParseOrientationError(other.to_owned())),
        }
    }
}

impl Orientation {
    /// Relations walked by the finish-order sweep and the component sweep.
    fn relations(self) -> (Relation, Relation) {
        match self {
            Self::Reach => (Relation::Outgoing, Relation::Incoming),
            Self::Influence => (Relation::Incoming, Relation::Outgoing),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Component {
    id: usize,
    nodes: Vec<usize>,
}

impl Component {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Members in the order they were finished.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
struct Adjacency {
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl Adjacency {
    fn get(&self, relation: Relation) -> &[Vec<usize>] {
        match relation {
            Relation::Outgoing => &self.outgoing,
            Relation::Incoming => &self.incoming,
        }
    }
}

/// Directed graph of people, built once and then computed on.
///
/// Edges are added with the 1-based ids of the input format; every accessor
/// afterwards takes 0-based node indices.
#[derive(Clone, Debug, Default)]
pub struct PropagationGraph {
    edges: Adjacency,
    orientation: Orientation,
    colors: Vec<Color>,
    component_of: Vec<Option<usize>>,
    values: Vec<usize>,
    components: Vec<Component>,
    finish_order: Vec<usize>,
}

assert_impl_all!(PropagationGraph: Send, Sync);

impl PropagationGraph {
    pub fn new(node_count: usize) -> Self {
        Self {
            edges: Adjacency {
                outgoing: vec![Vec::new(); node_count],
                incoming: vec![Vec::new(); node_count],
            },
            orientation: Orientation::default(),
            colors: vec![Color::White; node_count],
            component_of: vec![None; node_count],
            values: vec![0; node_count],
            components: Vec::new(),
            finish_order: Vec::with_capacity(node_count),
        }
    }

    /// Like [`new`](Self::new), but reports a node count that cannot be
    /// allocated instead of aborting.
    pub fn try_new(node_count: usize) -> Result<Self, GraphError> {
        let too_large = |source| GraphError::TooLarge { node_count, source };

        let mut graph = Self::default();
        graph.edges.outgoing.try_reserve_exact(node_count).map_err(too_large)?;
        graph.edges.incoming.try_reserve_exact(node_count).map_err(too_large)?;
        graph.colors.try_reserve_exact(node_count).map_err(too_large)?;
        graph.component_of.try_reserve_exact(node_count).map_err(too_large)?;
        graph.values.try_reserve_exact(node_count).map_err(too_large)?;
        graph.finish_order.try_reserve_exact(node_count).map_err(too_large)?;

        graph.edges.outgoing.resize_with(node_count, Vec::new);
        graph.edges.incoming.resize_with(node_count, Vec::new);
        graph.colors.resize(node_count, Color::White);
        graph.component_of.resize(node_count, None);
        graph.values.resize(node_count, 0);
        Ok(graph)
    }

    /// Builds a graph from 1-based `(person, friend)` pairs.
    pub fn from_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(node_count);
        for (person, friend) in edges {
            graph.add_edge(person, friend)?;
        }
        Ok(graph)
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn node_count(&self) -> usize {
        self.edges.outgoing.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.outgoing.iter().map(Vec::len).sum()
    }

    /// Adds the directed edge `person -> friend`, both 1-based. Duplicates and
    /// self-loops are kept as given.
    pub fn add_edge(&mut self, person: usize, friend: usize) -> Result<(), GraphError> {
        let source = self.index_of(person)?;
        let target = self.index_of(friend)?;
        self.edges.outgoing[source].push(target);
        self.edges.incoming[target].push(source);
        Ok(())
    }

    fn index_of(&self, id: usize) -> Result<usize, GraphError> {
        let node_count = self.node_count();
        if id == 0 || id > node_count {
            return Err(GraphError::NodeOutOfRange {
                node: id,
                node_count,
            });
        }
        Ok(id - 1)
    }

    pub fn outgoing(&self, node: usize) -> &[usize] {
        &self.edges.outgoing[node]
    }

    pub fn incoming(&self, node: usize) -> &[usize] {
        &self.edges.incoming[node]
    }

    /// Runs both sweeps and returns the largest propagation value.
    pub fn max_propagation(&mut self) -> usize {
        self.compute();
        self.max_value()
    }

    /// Largest value left by the last [`compute`](Self::compute), 0 before any.
    pub fn max_value(&self) -> usize {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// Assigns components and propagation values. Previous results are
    /// discarded, so this can be called again after adding edges.
    pub fn compute(&mut self) {
        self.reset();
        self.record_finish_order();
        self.assign_components();
        debug!(
            nodes = self.node_count(),
            components = self.components.len(),
            max = self.max_value(),
            orientation = ?self.orientation,
            "propagation computed"
        );
    }

    pub fn value(&self, node: usize) -> usize {
        self.values[node]
    }

    pub fn values(&self) -> &[usize] {
        &self.values
    }

    /// Component id of `node`, `None` until computed.
    pub fn component_of(&self, node: usize) -> Option<usize> {
        self.component_of[node]
    }

    /// Components in discovery order; a component's id is its position here.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    fn reset(&mut self) {
        self.colors.fill(Color::White);
        self.component_of.fill(None);
        self.values.fill(0);
        self.components.clear();
        self.finish_order.clear();
    }

    fn record_finish_order(&mut self) {
        let (relation, _) = self.orientation.relations();
        let edges = self.edges.get(relation);
        let finish_order = &mut self.finish_order;
        let mut stack = Vec::new();

        for start in 0..edges.len() {
            if self.colors[start] == Color::White {
                dfs::visit(start, edges, &mut self.colors, &mut stack, |v, _| {
                    finish_order.push(v)
                });
            }
        }
    }

    fn assign_components(&mut self) {
        self.colors.fill(Color::White);

        let (_, relation) = self.orientation.relations();
        let edges = self.edges.get(relation);
        let component_of = &mut self.component_of;
        let values = &mut self.values;
        let mut stack = Vec::new();

        while let Some(start) = self.finish_order.pop() {
            if component_of[start].is_some() {
                continue;
            }

            let id = self.components.len();
            let mut nodes = Vec::new();
            dfs::visit(start, edges, &mut self.colors, &mut stack, |v, colors| {
                component_of[v] = Some(id);
                nodes.push(v);
                values[v] = relaxed(v, id, edges, colors, component_of, values);
            });

            // Members finished before a later member raised its value have
            // not seen it yet.
            let peak = nodes.iter().map(|&v| values[v]).max().unwrap_or(0);
            for &v in &nodes {
                values[v] = peak;
            }

            trace!(component = id, size = nodes.len(), value = peak, "component closed");
            self.components.push(Component { id, nodes });
        }
    }
}

/// Value of `v` after taking every finished neighbour into account: a
/// neighbour in an earlier component costs one crossing, one in `component`
/// costs nothing.
fn relaxed(
    v: usize,
    component: usize,
    edges: &[Vec<usize>],
    colors: &[Color],
    component_of: &[Option<usize>],
    values: &[usize],
) -> usize {
    edges[v]
        .iter()
        .filter(|&&w| colors[w] == Color::Black)
        .map(|&w| {
            if component_of[w] == Some(component) {
                values[w]
            } else {
                values[w] + 1
            }
        })
        .fold(values[v], usize::max)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_add_edge_rejects_out_of_range() {
        let mut graph = PropagationGraph::new(2);
        assert_eq!(
            graph.add_edge(0, 1),
            Err(GraphError::NodeOutOfRange {
                node: 0,
                node_count: 2
            })
        );
        assert_eq!(
            graph.add_edge(1, 3),
            Err(GraphError::NodeOutOfRange {
                node: 3,
                node_count: 2
            })
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_edge_fills_both_relations() {
        let graph = PropagationGraph::from_edges(3, [(1, 2), (1, 2), (3, 1)]).unwrap();
        assert_eq!(graph.outgoing(0), &[1, 1]);
        assert_eq!(graph.incoming(1), &[0, 0]);
        assert_eq!(graph.incoming(0), &[2]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_components_numbered_in_discovery_order() {
        // 1 <-> 2 -> 3 -> 4 <-> 5
        let edges = [(1, 2), (2, 1), (2, 3), (3, 4), (4, 5), (5, 4)];

        let mut graph = PropagationGraph::from_edges(5, edges).unwrap();
        graph.compute();
        let ids: Vec<_> = (0..5).map(|v| graph.component_of(v).unwrap()).collect();
        assert_eq!(ids, vec![0, 0, 1, 2, 2]);
        assert_eq!(graph.values(), &[0, 0, 1, 2, 2]);

        let mut graph = PropagationGraph::from_edges(5, edges)
            .unwrap()
            .with_orientation(Orientation::Influence);
        graph.compute();
        let ids: Vec<_> = (0..5).map(|v| graph.component_of(v).unwrap()).collect();
        assert_eq!(ids, vec![2, 2, 1, 0, 0]);
        assert_eq!(graph.values(), &[2, 2, 1, 0, 0]);

        for (position, component) in graph.components().iter().enumerate() {
            assert_eq!(component.id(), position);
        }
    }

    #[test]
    fn test_saturation_reaches_early_finishers() {
        // 1 -> 2 -> 3 -> 1 with 1 -> 4 -> 5, walked so that 2 and 3 finish
        // before 1 has seen the chain through 4.
        let edges = [(1, 2), (2, 3), (3, 1), (1, 4), (4, 5)];
        let mut graph = PropagationGraph::from_edges(5, edges)
            .unwrap()
            .with_orientation(Orientation::Influence);
        assert_eq!(graph.max_propagation(), 2);
        assert_eq!(graph.values(), &[2, 2, 2, 1, 0]);
    }

    #[test]
    fn test_recompute_is_stable() {
        let mut graph = PropagationGraph::from_edges(3, [(1, 2), (2, 3)]).unwrap();
        assert_eq!(graph.max_propagation(), 2);
        assert_eq!(graph.max_propagation(), 2);
        assert_eq!(graph.components().len(), 3);

        graph.add_edge(3, 1).unwrap();
        assert_eq!(graph.max_propagation(), 0);
        assert_eq!(graph.components().len(), 1);
    }

    #[test]
    fn test_try_new_reports_oversized_graph() {
        assert!(matches!(
            PropagationGraph::try_new(usize::MAX),
            Err(GraphError::TooLarge {
                node_count: usize::MAX,
                ..
            })
        ));

        let mut graph = PropagationGraph::try_new(3).unwrap();
        assert_eq!(graph.node_count(), 3);
        graph.add_edge(1, 2).unwrap();
        graph.add_edge(2, 3).unwrap();
        assert_eq!(graph.max_propagation(), 2);
        assert_eq!(graph.orientation(), Orientation::Reach);
    }

    #[test]
    fn test_orientation_from_str() {
        assert_eq!("reach".parse(), Ok(Orientation::Reach));
        assert_eq!("influence".parse(), Ok(Orientation::Influence));
        assert_eq!(
            "Reach".parse::<Orientation>(),
            Err(ParseOrientationError("Reach".to_owned()))
        );
    }

    #[test]
    fn test_max_value_before_compute() {
        let graph = PropagationGraph::from_edges(2, [(1, 2)]).unwrap();
        assert_eq!(graph.max_value(), 0);
        assert_eq!(graph.component_of(0), None);
    }
}
