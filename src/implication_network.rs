use crate::error::RoofDualityError;
use crate::posiform::{Literal, Polarity, Posiform};
use sprs::{CsMat, TriMat};
use std::collections::{HashMap, VecDeque};

/// A residual at or below this fraction of the largest residual the edge has held counts as zero
const RELATIVE_TOLERANCE: f64 = 1e-13;

/// A node of the implication network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Source,
    Sink,
    Literal(Literal),
}

impl Node {
    /// The image of the node under complementation; swaps source and sink
    pub const fn mirror(self) -> Self {
        match self {
            Node::Source => Node::Sink,
            Node::Sink => Node::Source,
            Node::Literal(literal) => Node::Literal(literal.complement()),
        }
    }
}

/// An edge of the residual network.
///
/// Forward edges carry the capacity of an arc; their `reverse` partner starts with capacity zero
/// and accumulates the residual capacity created by pushing flow. `peak` is the largest residual
/// the edge has held, which bounds the rounding error in `residual`.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub reverse: usize,
    pub mirror: usize,
    pub capacity: f64,
    pub residual: f64,
    pub peak: f64,
}

#[derive(Clone, Debug)]
pub struct ImplicationNetwork {
    num_variables: usize,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<usize>>,
}

impl ImplicationNetwork {
    /// Builds the network of a posiform. Parallel contributions to the same ordered node pair are
    /// summed into a single arc.
    ///
    /// # Errors
    ///
    /// Returns a numeric error if a coefficient is negative or not finite, or if an arc ends up
    /// without a mirror. Neither can happen for a posiform built from a valid model.
    pub fn from_posiform(posiform: &Posiform) -> Result<Self, RoofDualityError> {
        let num_variables = posiform.num_variables();
        let num_nodes = 2 * num_variables + 2;
        let index = |node: Node| node_index(num_variables, node);

        let mut capacities = TriMat::<f64>::new((num_nodes, num_nodes));

        for term in posiform.terms() {
            if !term.coefficient.is_finite() || term.coefficient < 0.0 {
                return Err(RoofDualityError::Numeric(format!(
                    "posiform coefficient {} cannot be used as a capacity",
                    term.coefficient
                )));
            }

            let half = 0.5 * term.coefficient;
            let first = Node::Literal(term.first);

            match term.second {
                Some(second) => {
                    let second = Node::Literal(second);
                    capacities.add_triplet(index(first), index(second.mirror()), half);
                    capacities.add_triplet(index(second), index(first.mirror()), half);
                }
                None => {
                    capacities.add_triplet(index(first), index(Node::Sink), half);
                    capacities.add_triplet(index(Node::Source), index(first.mirror()), half);
                }
            }
        }

        // converting to CSR sums duplicate triplets
        let capacities: CsMat<f64> = capacities.to_csr();

        let mut network = Self {
            num_variables,
            edges: Vec::with_capacity(2 * capacities.nnz()),
            adjacency: vec![Vec::new(); num_nodes],
        };

        let mut arc_index = HashMap::with_capacity(capacities.nnz());

        for (&capacity, (from, to)) in &capacities {
            if capacity <= 0.0 {
                continue;
            }

            let forward = network.edges.len();
            arc_index.insert((from, to), forward);

            network.edges.push(Edge {
                from,
                to,
                reverse: forward + 1,
                mirror: forward,
                capacity,
                residual: capacity,
                peak: capacity,
            });
            network.edges.push(Edge {
                from: to,
                to: from,
                reverse: forward,
                mirror: forward + 1,
                capacity: 0.0,
                residual: 0.0,
                peak: 0.0,
            });

            network.adjacency[from].push(forward);
            network.adjacency[to].push(forward + 1);
        }

        // link every arc to its mirror, and every reverse edge to the mirror's reverse edge
        for forward in (0..network.edges.len()).step_by(2) {
            let (from, to) = (network.edges[forward].from, network.edges[forward].to);
            let key = (network.mirror_index(to), network.mirror_index(from));

            let mirror = *arc_index.get(&key).ok_or_else(|| {
                RoofDualityError::Numeric(format!("arc {from} -> {to} has no mirror arc"))
            })?;

            network.edges[forward].mirror = mirror;
            network.edges[forward + 1].mirror = mirror + 1;
        }

        Ok(network)
    }

    pub const fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub const fn num_nodes(&self) -> usize {
        2 * self.num_variables + 2
    }

    pub const fn source(&self) -> usize {
        2 * self.num_variables
    }

    pub const fn sink(&self) -> usize {
        2 * self.num_variables + 1
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Indices of the edges leaving `node`, forward and reverse
    pub fn out_edges(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    /// Indices of the forward edges, i.e. the arcs of the network
    pub fn arcs(&self) -> impl Iterator<Item = usize> {
        (0..self.edges.len()).step_by(2)
    }

    pub const fn node_index(&self, node: Node) -> usize {
        node_index(self.num_variables, node)
    }

    /// Inverse of [`ImplicationNetwork::node_index`]
    pub const fn node(&self, index: usize) -> Node {
        if index == self.source() {
            Node::Source
        } else if index == self.sink() {
            Node::Sink
        } else if index % 2 == 0 {
            Node::Literal(Literal::positive(index / 2))
        } else {
            Node::Literal(Literal::negative(index / 2))
        }
    }

    /// Index of the mirror image of a node
    pub const fn mirror_index(&self, index: usize) -> usize {
        self.node_index(self.node(index).mirror())
    }

    /// Whether `edge` can still carry flow, relative to the largest residual it has held
    pub fn has_residual(&self, edge: usize) -> bool {
        let edge = &self.edges[edge];
        edge.residual > RELATIVE_TOLERANCE * edge.peak
    }

    /// Flow currently carried by a forward edge, read off its reverse edge
    pub fn flow(&self, edge: usize) -> f64 {
        self.edges[self.edges[edge].reverse].residual
    }

    /// Pushes `amount` units along `edge`, updating the paired residual edge
    pub fn push(&mut self, edge: usize, amount: f64) {
        let reverse = self.edges[edge].reverse;
        self.edges[edge].residual -= amount;
        let residual = self.edges[reverse].residual + amount;
        self.edges[reverse].set_residual(residual);
    }

    /// Sets the flow on a forward edge, overwriting both residuals
    fn set_flow(&mut self, edge: usize, flow: f64) {
        let reverse = self.edges[edge].reverse;
        let capacity = self.edges[edge].capacity;
        self.edges[edge].set_residual(capacity - flow);
        self.edges[reverse].set_residual(flow);
    }

    /// Removes all flow from the network
    pub fn reset_flow(&mut self) {
        for edge in &mut self.edges {
            edge.residual = edge.capacity;
            edge.peak = edge.capacity;
        }
    }

    /// Net flow leaving the source
    pub fn flow_value(&self) -> f64 {
        let source = self.source();
        self.arcs()
            .map(|e| {
                let edge = &self.edges[e];
                if edge.from == source {
                    self.flow(e)
                } else if edge.to == source {
                    -self.flow(e)
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// Replaces the flow by the average of itself and its mirror image.
    ///
    /// The mirror of a maximum flow is a maximum flow of the same value, so the average is one as
    /// well, and its residual network keeps the mirror symmetry of the original network.
    pub fn symmetrize_flow(&mut self) {
        for forward in self.arcs().collect::<Vec<_>>() {
            let mirror = self.edges[forward].mirror;
            if mirror <= forward {
                continue;
            }

            let flow = 0.5 * (self.flow(forward) + self.flow(mirror));
            self.set_flow(forward, flow);
            self.set_flow(mirror, flow);

            // mirrored edges must agree on which residuals count as zero
            for (e, m) in [(forward, mirror), (forward + 1, mirror + 1)] {
                let peak = self.edges[e].peak.max(self.edges[m].peak);
                self.edges[e].peak = peak;
                self.edges[m].peak = peak;
            }
        }
    }

    /// Checks that every arc has a mirror arc with exactly the same capacity
    pub fn is_symmetric(&self) -> bool {
        self.arcs().all(|e| {
            let edge = &self.edges[e];
            let mirror = &self.edges[edge.mirror];
            mirror.capacity == edge.capacity
                && mirror.from == self.mirror_index(edge.to)
                && mirror.to == self.mirror_index(edge.from)
                && edge.reverse == e + 1
                && self.edges[e + 1].mirror == edge.mirror + 1
        })
    }

    /// Successor lists of the residual network
    pub fn residual_graph(&self) -> Vec<Vec<usize>> {
        self.adjacency
            .iter()
            .map(|out| {
                out.iter()
                    .filter(|&&e| self.has_residual(e))
                    .map(|&e| self.edges[e].to)
                    .collect()
            })
            .collect()
    }

    /// Nodes reachable from the source in the residual network
    pub fn source_side(&self) -> Vec<bool> {
        let mut reached = vec![false; self.num_nodes()];
        let mut queue = VecDeque::from([self.source()]);
        reached[self.source()] = true;

        while let Some(u) = queue.pop_front() {
            for &e in &self.adjacency[u] {
                let v = self.edges[e].to;
                if !reached[v] && self.has_residual(e) {
                    reached[v] = true;
                    queue.push_back(v);
                }
            }
        }

        reached
    }

    /// Total capacity of the arcs leaving `source_side`
    pub fn cut_capacity(&self, source_side: &[bool]) -> f64 {
        self.arcs()
            .map(|e| &self.edges[e])
            .filter(|edge| source_side[edge.from] && !source_side[edge.to])
            .map(|edge| edge.capacity)
            .sum()
    }
}

impl Edge {
    fn set_residual(&mut self, residual: f64) {
        self.residual = residual;
        self.peak = self.peak.max(residual);
    }
}

const fn node_index(num_variables: usize, node: Node) -> usize {
    match node {
        Node::Source => 2 * num_variables,
        Node::Sink => 2 * num_variables + 1,
        Node::Literal(Literal {
            variable,
            polarity: Polarity::Positive,
        }) => 2 * variable,
        Node::Literal(Literal {
            variable,
            polarity: Polarity::Negative,
        }) => 2 * variable + 1,
    }
}
