use crate::error::RoofDualityError;
use crate::graph_utils::strongly_connected_components;
use crate::implication_network::{ImplicationNetwork, Node};
use crate::max_flow::MaxFlowSolver;
use crate::posiform::{Literal, Posiform};
use crate::preprocess::make_sub_problem;
use crate::qubo::QuadraticModel;
use crate::solver_options::FixOptions;
use std::cmp::min;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Resolves a variable whose literals lie in different strongly connected components.
///
/// `positive` and `negative` are the numbers of the components holding $x$ and $\bar{x}$, in the
/// order Tarjan's algorithm closes them (see
/// [`strongly_connected_components`](crate::graph_utils::strongly_connected_components)). Return
/// the binary value to fix the variable to, or `None` to leave it free.
pub trait TieBreak: Sync {
    fn resolve(&self, positive: usize, negative: usize) -> Option<usize>;
}

/// Sets true the literal whose component is closed first, i.e. the one further downstream in the
/// residual network. Under this assignment every residual arc is a satisfied implication.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClosedFirst;

impl TieBreak for ClosedFirst {
    fn resolve(&self, positive: usize, negative: usize) -> Option<usize> {
        match positive.cmp(&negative) {
            std::cmp::Ordering::Less => Some(1),
            std::cmp::Ordering::Greater => Some(0),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Never fixes a variable on component order alone, so only strong persistencies survive.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrongOnly;

impl TieBreak for StrongOnly {
    fn resolve(&self, _positive: usize, _negative: usize) -> Option<usize> {
        None
    }
}

/// Result of one roof duality pass over a model
#[derive(Clone, Debug, PartialEq)]
pub struct RoofDual {
    pub lower_bound: f64,
    pub flow_value: f64,
    pub strong: HashMap<usize, usize>,
    // disjoint from `strong`
    pub weak: HashMap<usize, usize>,
}

impl RoofDual {
    pub fn fixed(&self) -> HashMap<usize, usize> {
        let mut fixed = self.strong.clone();
        fixed.extend(self.weak.iter().map(|(&k, &v)| (k, v)));
        fixed
    }
}

/// Runs one roof duality pass: posiform, implication network, maximum flow, persistencies.
///
/// Weak persistencies are only computed when `with_weak` is set.
///
/// # Errors
///
/// Only numeric errors, which indicate a defect in the network construction.
pub fn compute_roof_dual<S, T>(
    model: &QuadraticModel,
    solver: &S,
    tie_break: &T,
    with_weak: bool,
) -> Result<RoofDual, RoofDualityError>
where
    S: MaxFlowSolver + ?Sized,
    T: TieBreak + ?Sized,
{
    let posiform = Posiform::from_model(model);
    let mut network = ImplicationNetwork::from_posiform(&posiform)?;

    let flow_value = solver.max_flow(&mut network)?;

    // weak persistencies need a residual network with the mirror symmetry of the network
    network.symmetrize_flow();

    let strong = compute_strong_persistencies(&network);
    let weak = if with_weak {
        compute_weak_persistencies(&network, &strong, tie_break)
    } else {
        HashMap::new()
    };

    let lower_bound = posiform.constant() + flow_value + model.offset();

    debug!(
        num_variables = model.num_variables(),
        flow_value,
        lower_bound,
        strong = strong.len(),
        weak = weak.len(),
        "roof dual computed"
    );

    Ok(RoofDual {
        lower_bound,
        flow_value,
        strong,
        weak,
    })
}

/// Repeats roof duality on the model left after substituting every fixing found so far, until a
/// round fixes nothing new.
///
/// Returns the fixings as binary values over the variables of `model` together with the best
/// lower bound seen over all rounds. Runs at least one round and never more than
/// `options.max_rounds` or the number of variables.
///
/// # Errors
///
/// Propagates numeric errors from the flow computation.
pub fn compute_iterative_persistence<T: TieBreak + ?Sized>(
    model: &QuadraticModel,
    options: &FixOptions,
    tie_break: &T,
) -> Result<(HashMap<usize, usize>, f64), RoofDualityError> {
    let mut fixed = HashMap::new();
    let mut lower_bound = f64::NEG_INFINITY;

    // every round that does not stop the loop fixes at least one variable
    let iters = min(options.max_rounds, model.num_variables()).max(1);

    for round in 0..iters {
        let (sub_model, unfixed_map, _) = make_sub_problem(model, &fixed);

        let roof_dual = compute_roof_dual(&sub_model, &options.flow_algorithm, tie_break, true)?;
        lower_bound = lower_bound.max(roof_dual.lower_bound);

        let incoming = roof_dual.fixed();
        debug!(
            round,
            remaining = sub_model.num_variables(),
            newly_fixed = incoming.len(),
            lower_bound = roof_dual.lower_bound,
            "strong mode round"
        );

        if incoming.is_empty() {
            break;
        }

        // map indices of the sub model back onto the model
        let mut original = vec![0usize; sub_model.num_variables()];
        for (&old, &new) in &unfixed_map {
            original[new] = old;
        }

        for (v, value) in incoming {
            fixed.insert(original[v], value);
        }

        if fixed.len() == model.num_variables() {
            break;
        }
    }

    Ok((fixed, lower_bound))
}

/// Variables with a literal reachable from the source in the residual network, mapped to the
/// binary value that makes that literal true
pub fn compute_strong_persistencies(network: &ImplicationNetwork) -> HashMap<usize, usize> {
    let reached = network.source_side();
    let mut persistent = HashMap::new();

    for variable in 0..network.num_variables() {
        let positive = reached[network.node_index(Node::Literal(Literal::positive(variable)))];
        let negative = reached[network.node_index(Node::Literal(Literal::negative(variable)))];

        match (positive, negative) {
            (true, false) => {
                persistent.insert(variable, 1);
            }
            (false, true) => {
                persistent.insert(variable, 0);
            }
            (true, true) => {
                // with a maximum flow this would imply a residual path to the sink
                warn!(variable, "both literals reachable from the source, leaving it free");
            }
            (false, false) => {}
        }
    }

    persistent
}

/// Variables outside `strong` whose literals fall in different strongly connected components of
/// the residual network, valued by `tie_break`.
///
/// The flow in `network` must be symmetric (see
/// [`ImplicationNetwork::symmetrize_flow`](crate::implication_network::ImplicationNetwork::symmetrize_flow)).
pub fn compute_weak_persistencies<T: TieBreak + ?Sized>(
    network: &ImplicationNetwork,
    strong: &HashMap<usize, usize>,
    tie_break: &T,
) -> HashMap<usize, usize> {
    let component = strongly_connected_components(&network.residual_graph());
    let mut persistent = HashMap::new();

    for variable in 0..network.num_variables() {
        if strong.contains_key(&variable) {
            continue;
        }

        let positive = component[network.node_index(Node::Literal(Literal::positive(variable)))];
        let negative = component[network.node_index(Node::Literal(Literal::negative(variable)))];

        // a literal in the same component as its complement is undetermined
        if positive == negative {
            continue;
        }

        if let Some(value) = tie_break.resolve(positive, negative) {
            persistent.insert(variable, value);
        }
    }

    persistent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::max_flow::{Dinic, FlowAlgorithm};
    use crate::qubo::Vartype;
    use crate::tests::make_scenario_model;
    use ndarray::Array1;

    #[test]
    fn scenario_is_solved_by_strong_persistencies() {
        // x0 x1 - x1 x2 + x0 x2 has the unique minimiser (0, 1, 1) with energy -1
        let model = make_scenario_model();

        let roof_dual = compute_roof_dual(&model, &Dinic, &ClosedFirst, false).unwrap();

        assert_eq!(roof_dual.lower_bound, -1.0);
        assert_eq!(roof_dual.flow_value, 0.0);
        assert_eq!(roof_dual.strong, HashMap::from([(0, 0), (1, 1), (2, 1)]));
        assert!(roof_dual.weak.is_empty());
    }

    #[test]
    fn ferromagnetic_pair_is_fixed_to_one() {
        let model = QuadraticModel::from_parts(
            Array1::zeros(2),
            &[(0, 1, -1.0)],
            0.5,
            Vartype::Binary,
        )
        .unwrap();

        let roof_dual = compute_roof_dual(&model, &Dinic, &ClosedFirst, true).unwrap();

        assert_eq!(roof_dual.lower_bound, -0.5);
        assert_eq!(roof_dual.strong, HashMap::from([(0, 1), (1, 1)]));
    }

    #[test]
    fn free_variables_are_only_fixed_weakly() {
        // variable 1 does not influence the energy, both of its values are optimal
        let model = QuadraticModel::from_parts(
            Array1::from_vec(vec![1.0, 0.0]),
            &[],
            0.0,
            Vartype::Binary,
        )
        .unwrap();

        let roof_dual = compute_roof_dual(&model, &Dinic, &ClosedFirst, true).unwrap();
        assert_eq!(roof_dual.strong, HashMap::from([(0, 0)]));
        assert_eq!(roof_dual.weak.len(), 1);
        assert!(roof_dual.weak.contains_key(&1));
        assert_eq!(roof_dual.fixed().len(), 2);

        let roof_dual = compute_roof_dual(&model, &Dinic, &StrongOnly, true).unwrap();
        assert_eq!(roof_dual.strong, HashMap::from([(0, 0)]));
        assert!(roof_dual.weak.is_empty());
    }

    #[test]
    fn frustrated_triangle_has_no_strong_persistencies() {
        // s0 s1 + s1 s2 + s0 s2 has six minimisers at energy -1
        let model = QuadraticModel::from_parts(
            Array1::zeros(3),
            &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)],
            0.0,
            Vartype::Spin,
        )
        .unwrap();

        for algorithm in [FlowAlgorithm::Dinic, FlowAlgorithm::EdmondsKarp] {
            let roof_dual = compute_roof_dual(&model, &algorithm, &ClosedFirst, true).unwrap();
            assert!(roof_dual.strong.is_empty());
            assert!(roof_dual.lower_bound <= -1.0);
        }
    }

    #[test]
    fn iteration_fixes_every_variable_of_a_chain() {
        // minimisers are x0 = 0 with x1 x2 = 0
        let model = QuadraticModel::from_parts(
            Array1::from_vec(vec![2.0, 0.0, 0.0]),
            &[(0, 1, -1.0), (1, 2, 1.0)],
            1.0,
            Vartype::Binary,
        )
        .unwrap();

        let options = FixOptions::new();
        let (fixed, lower_bound) =
            compute_iterative_persistence(&model, &options, &ClosedFirst).unwrap();

        assert_eq!(fixed.len(), 3);
        assert_eq!(fixed[&0], 0);
        assert_eq!(lower_bound, 1.0);

        let x = Array1::from_iter((0..3).map(|v| fixed[&v] as i8));
        assert_eq!(model.energy_dense(&x).unwrap(), 1.0);
    }

    #[test]
    fn iteration_respects_the_round_limit() {
        let model = make_scenario_model();
        let mut options = FixOptions::new();
        options.max_rounds = 0;

        // a zero limit still runs the first round
        let (fixed, lower_bound) =
            compute_iterative_persistence(&model, &options, &ClosedFirst).unwrap();
        assert_eq!(fixed, HashMap::from([(0, 0), (1, 1), (2, 1)]));
        assert_eq!(lower_bound, -1.0);
    }

    #[test]
    fn empty_model_bound_is_its_offset() {
        let mut model = QuadraticModel::new(0, Vartype::Binary);
        model.set_offset(2.5).unwrap();

        let (fixed, lower_bound) =
            compute_iterative_persistence(&model, &FixOptions::new(), &ClosedFirst).unwrap();
        assert!(fixed.is_empty());
        assert_eq!(lower_bound, 2.5);
    }

    #[test]
    fn closed_first_prefers_the_downstream_literal() {
        assert_eq!(ClosedFirst.resolve(0, 3), Some(1));
        assert_eq!(ClosedFirst.resolve(5, 2), Some(0));
        assert_eq!(ClosedFirst.resolve(4, 4), None);
        assert_eq!(StrongOnly.resolve(0, 3), None);
    }
}
