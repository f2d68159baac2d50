use crate::error::{RoofDualityError, ValidationError};
use crate::implication_network::ImplicationNetwork;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;
use tracing::trace;

const UNREACHED: usize = usize::MAX;

/// Anything that can saturate an implication network
pub trait MaxFlowSolver {
    /// Pushes a maximum flow through `network` and returns its value
    ///
    /// # Errors
    ///
    /// Returns a numeric error if a capacity or the resulting flow value is not finite.
    fn max_flow(&self, network: &mut ImplicationNetwork) -> Result<f64, RoofDualityError>;
}

/// Selection of the max-flow algorithm, set through the solver options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAlgorithm {
    #[default]
    Dinic,
    EdmondsKarp,
}

impl FromStr for FlowAlgorithm {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dinic" => Ok(FlowAlgorithm::Dinic),
            "edmonds_karp" | "edmondskarp" => Ok(FlowAlgorithm::EdmondsKarp),
            _ => Err(ValidationError::InvalidFlowAlgorithm(s.to_string())),
        }
    }
}

impl MaxFlowSolver for FlowAlgorithm {
    fn max_flow(&self, network: &mut ImplicationNetwork) -> Result<f64, RoofDualityError> {
        match self {
            FlowAlgorithm::Dinic => Dinic.max_flow(network),
            FlowAlgorithm::EdmondsKarp => EdmondsKarp.max_flow(network),
        }
    }
}

/// Dinic's blocking flow algorithm, with an explicit path stack instead of recursion
pub struct Dinic;

impl MaxFlowSolver for Dinic {
    fn max_flow(&self, network: &mut ImplicationNetwork) -> Result<f64, RoofDualityError> {
        check_capacities(network)?;

        let mut total = 0.0;
        let mut phase = 0usize;

        while let Some(mut level) = build_levels(network) {
            let mut next_edge = vec![0usize; network.num_nodes()];
            let mut pushed = 0.0;

            while let Some(path) = find_level_path(network, &mut level, &mut next_edge) {
                pushed += augment(network, &path);
            }

            phase += 1;
            trace!(phase, pushed, "blocking flow found");
            total += pushed;
        }

        check_flow_value(total)
    }
}

/// Edmonds-Karp, shortest augmenting paths found by breadth first search
pub struct EdmondsKarp;

impl MaxFlowSolver for EdmondsKarp {
    fn max_flow(&self, network: &mut ImplicationNetwork) -> Result<f64, RoofDualityError> {
        check_capacities(network)?;

        let (source, sink) = (network.source(), network.sink());
        let mut total = 0.0;

        loop {
            // breadth first search, remembering the edge used to enter each node
            let mut parent_edge = vec![UNREACHED; network.num_nodes()];
            let mut queue = VecDeque::from([source]);

            while let Some(u) = queue.pop_front() {
                if u == sink {
                    break;
                }
                for &e in network.out_edges(u) {
                    let v = network.edges()[e].to;
                    if v != source && parent_edge[v] == UNREACHED && network.has_residual(e) {
                        parent_edge[v] = e;
                        queue.push_back(v);
                    }
                }
            }

            if parent_edge[sink] == UNREACHED {
                break;
            }

            // walk back from the sink to recover the path
            let mut path = Vec::new();
            let mut v = sink;
            while v != source {
                let e = parent_edge[v];
                path.push(e);
                v = network.edges()[e].from;
            }

            let pushed = augment(network, &path);
            trace!(pushed, length = path.len(), "augmenting path found");
            total += pushed;
        }

        check_flow_value(total)
    }
}

/// Breadth first search levels of the residual network, `None` once the sink is unreachable
fn build_levels(network: &ImplicationNetwork) -> Option<Vec<usize>> {
    let source = network.source();
    let mut level = vec![UNREACHED; network.num_nodes()];
    let mut queue = VecDeque::from([source]);
    level[source] = 0;

    while let Some(u) = queue.pop_front() {
        for &e in network.out_edges(u) {
            let v = network.edges()[e].to;
            if level[v] == UNREACHED && network.has_residual(e) {
                level[v] = level[u] + 1;
                queue.push_back(v);
            }
        }
    }

    (level[network.sink()] != UNREACHED).then_some(level)
}

/// Finds the next source-sink path in the level graph, advancing `next_edge` past edges that can
/// no longer be used and removing dead ends from `level`.
fn find_level_path(
    network: &ImplicationNetwork,
    level: &mut [usize],
    next_edge: &mut [usize],
) -> Option<Vec<usize>> {
    let (source, sink) = (network.source(), network.sink());
    let mut path = Vec::new();
    let mut u = source;

    while u != sink {
        let out = network.out_edges(u);
        let mut advanced = false;

        while next_edge[u] < out.len() {
            let e = out[next_edge[u]];
            let v = network.edges()[e].to;
            if level[v] != UNREACHED && level[v] == level[u] + 1 && network.has_residual(e) {
                path.push(e);
                u = v;
                advanced = true;
                break;
            }
            next_edge[u] += 1;
        }

        if !advanced {
            // no way forward from u in this phase, drop it and retreat one step
            level[u] = UNREACHED;
            let e = path.pop()?;
            u = network.edges()[e].from;
            next_edge[u] += 1;
        }
    }

    Some(path)
}

/// Pushes the bottleneck capacity along `path` and returns it
fn augment(network: &mut ImplicationNetwork, path: &[usize]) -> f64 {
    let bottleneck = path
        .iter()
        .map(|&e| network.edges()[e].residual)
        .fold(f64::INFINITY, f64::min);

    for &e in path {
        network.push(e, bottleneck);
    }

    bottleneck
}

fn check_capacities(network: &ImplicationNetwork) -> Result<(), RoofDualityError> {
    match network
        .edges()
        .iter()
        .find(|edge| !edge.residual.is_finite() || edge.residual < 0.0)
    {
        Some(edge) => Err(RoofDualityError::Numeric(format!(
            "edge {} -> {} has residual capacity {}",
            edge.from, edge.to, edge.residual
        ))),
        None => Ok(()),
    }
}

fn check_flow_value(total: f64) -> Result<f64, RoofDualityError> {
    if total.is_finite() {
        Ok(total)
    } else {
        Err(RoofDualityError::Numeric(format!(
            "maximum flow value {total} is not finite"
        )))
    }
}
