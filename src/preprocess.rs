use crate::error::RoofDualityError;
use crate::graph_utils::get_all_disconnected_graphs;
use crate::persistence::{compute_iterative_persistence, compute_roof_dual, ClosedFirst, TieBreak};
use crate::qubo::{QuadraticModel, Vartype};
use crate::solver_options::{FixMode, FixOptions};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Variables fixed by roof duality, with values in the vartype of the input model
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedVariables {
    pub fixed: HashMap<usize, i8>,
    /// Lower bound on the minimum energy of the model, offset included
    pub lower_bound: f64,
}

/// Finds variables whose optimal value can be determined without solving the model.
///
/// With [`FixMode::Standard`] every returned value holds in every minimiser. With
/// [`FixMode::Strong`] the returned values hold together in at least one minimiser, and usually
/// cover more variables.
///
/// # Errors
///
/// Fails on an invalid model before any work is done.
///
/// # Examples
///
/// ```
/// use ndarray::Array1;
/// use roofdual::{fix_variables, FixMode, QuadraticModel, Vartype};
///
/// // x0 x1 - x1 x2 + x0 x2 is minimised by (0, 1, 1)
/// let model = QuadraticModel::from_parts(
///     Array1::zeros(3),
///     &[(0, 1, 1.0), (1, 2, -1.0), (0, 2, 1.0)],
///     0.0,
///     Vartype::Binary,
/// )
/// .unwrap();
///
/// let result = fix_variables(&model, FixMode::Standard).unwrap();
/// assert_eq!(result.fixed[&0], 0);
/// assert_eq!(result.fixed[&1], 1);
/// assert_eq!(result.fixed[&2], 1);
/// assert_eq!(result.lower_bound, -1.0);
/// ```
pub fn fix_variables(
    model: &QuadraticModel,
    mode: FixMode,
) -> Result<FixedVariables, RoofDualityError> {
    fix_variables_with_options(model, &FixOptions::new().with_mode(mode))
}

/// [`fix_variables`] with every option exposed.
///
/// # Errors
///
/// Fails on an invalid model before any work is done.
pub fn fix_variables_with_options(
    model: &QuadraticModel,
    options: &FixOptions,
) -> Result<FixedVariables, RoofDualityError> {
    fix_variables_with_tie_break(model, options, &ClosedFirst)
}

/// [`fix_variables_with_options`] with a custom rule for weak persistencies, only consulted in
/// [`FixMode::Strong`].
///
/// # Errors
///
/// Fails on an invalid model before any work is done.
pub fn fix_variables_with_tie_break<T: TieBreak + ?Sized>(
    model: &QuadraticModel,
    options: &FixOptions,
    tie_break: &T,
) -> Result<FixedVariables, RoofDualityError> {
    model.validate()?;

    // converting large spin biases can overflow
    let binary = model.change_vartype(Vartype::Binary);
    binary.validate()?;
    let components = get_all_disconnected_graphs(&binary, &HashMap::new());

    let solve_component =
        |component: &Vec<usize>| -> Result<(HashMap<usize, usize>, f64), RoofDualityError> {
            let (sub_model, index_map) = make_component_model(&binary, component, &HashMap::new());

            let (fixed, lower_bound) = match options.mode {
                FixMode::Standard => {
                    let roof_dual =
                        compute_roof_dual(&sub_model, &options.flow_algorithm, tie_break, false)?;
                    (roof_dual.strong, roof_dual.lower_bound)
                }
                FixMode::Strong => compute_iterative_persistence(&sub_model, options, tie_break)?,
            };

            debug!(
                size = component.len(),
                fixed = fixed.len(),
                lower_bound,
                "component solved"
            );

            // map back onto the variables of the model
            let fixed = index_map
                .iter()
                .filter_map(|(&old, new)| fixed.get(new).map(|&value| (old, value)))
                .collect();

            Ok((fixed, lower_bound))
        };

    let solved = if options.parallel {
        components
            .par_iter()
            .map(solve_component)
            .collect::<Result<Vec<_>, _>>()?
    } else {
        components
            .iter()
            .map(solve_component)
            .collect::<Result<Vec<_>, _>>()?
    };

    // component models carry no offset
    let mut lower_bound = binary.offset();
    let mut fixed = HashMap::new();

    for (component_fixed, component_bound) in solved {
        lower_bound += component_bound;
        fixed.extend(
            component_fixed
                .into_iter()
                .map(|(v, bit)| (v, model.vartype().from_binary(bit))),
        );
    }

    info!(
        num_variables = model.num_variables(),
        num_components = components.len(),
        mode = %options.mode,
        num_fixed = fixed.len(),
        lower_bound,
        "variables fixed"
    );

    Ok(FixedVariables { fixed, lower_bound })
}

/// Builds the model over `component` alone. Interactions with variables in `fixed` (binary
/// values) are folded into the linear biases; interactions with any other variable are dropped,
/// as is the offset.
///
/// Returns the model and the map from variables of `model` to variables of the new model.
pub fn make_component_model(
    model: &QuadraticModel,
    component: &[usize],
    fixed_vars: &HashMap<usize, usize>,
) -> (QuadraticModel, HashMap<usize, usize>) {
    let mut sub_model = QuadraticModel::new(component.len(), model.vartype());

    let index_map = component
        .iter()
        .enumerate()
        .map(|(new_index, &old_index)| (old_index, new_index))
        .collect::<HashMap<_, _>>();

    for (&old_index, &new_index) in &index_map {
        let mut bias = model.linear_biases()[old_index];

        for (j, q_ij) in model.adjacency_row(old_index) {
            if let Some(&j_new) = index_map.get(&j) {
                // each pair is visited from both ends
                if new_index < j_new {
                    sub_model.adjacency_insert(new_index, j_new, q_ij);
                }
            } else if let Some(&bit) = fixed_vars.get(&j) {
                bias += q_ij * f64::from(model.vartype().from_binary(bit));
            }
        }

        sub_model.linear_biases_mut()[new_index] = bias;
    }

    (sub_model, index_map)
}

/// Substitutes the variables in `fixed_vars` (binary values, mapped onto the vartype of the model)
/// and returns the model over the remaining variables.
///
/// Also returns the map from remaining variables to their index in the new model, and the energy
/// contributed by the fixed variables alone, which has been added to the offset of the new model.
pub fn make_sub_problem(
    model: &QuadraticModel,
    fixed_vars: &HashMap<usize, usize>,
) -> (QuadraticModel, HashMap<usize, usize>, f64) {
    let value = |bit: usize| f64::from(model.vartype().from_binary(bit));

    // make a map between the unfixed variables and the new index
    let mut unfixed_map = HashMap::new();
    for i in 0..model.num_variables() {
        if !fixed_vars.contains_key(&i) {
            let new_index = unfixed_map.len();
            unfixed_map.insert(i, new_index);
        }
    }

    let mut sub_model = QuadraticModel::new(unfixed_map.len(), model.vartype());
    let mut constant = 0.0;

    for (i, &c_i) in model.linear_biases().iter().enumerate() {
        match (fixed_vars.get(&i), unfixed_map.get(&i)) {
            (Some(&bit), _) => constant += c_i * value(bit),
            (None, Some(&i_new)) => sub_model.linear_biases_mut()[i_new] += c_i,
            (None, None) => {}
        }
    }

    for (i, j, q_ij) in model.interactions() {
        match (fixed_vars.get(&i), fixed_vars.get(&j)) {
            (Some(&x_i), Some(&x_j)) => constant += q_ij * value(x_i) * value(x_j),
            (Some(&x_i), None) => {
                if let Some(&j_new) = unfixed_map.get(&j) {
                    sub_model.linear_biases_mut()[j_new] += q_ij * value(x_i);
                }
            }
            (None, Some(&x_j)) => {
                if let Some(&i_new) = unfixed_map.get(&i) {
                    sub_model.linear_biases_mut()[i_new] += q_ij * value(x_j);
                }
            }
            (None, None) => {
                if let (Some(&i_new), Some(&j_new)) = (unfixed_map.get(&i), unfixed_map.get(&j)) {
                    sub_model.adjacency_insert(i_new, j_new, q_ij);
                }
            }
        }
    }

    sub_model.set_offset_unchecked(model.offset() + constant);

    (sub_model, unfixed_map, constant)
}
