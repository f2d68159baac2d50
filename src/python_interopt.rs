//! Acts as the interface to rust code from python, enabled with the `python` feature.
use crate::error::{RoofDualityError, ValidationError};
use crate::graph_utils::get_all_disconnected_graphs;
use crate::preprocess::fix_variables_with_options;
use crate::qubo::{QuadraticModel, Vartype};
use crate::solver_options::FixOptions;
use std::collections::{BTreeMap, HashMap};

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

// type alias for the qubo data object from python, (rows, cols, values, c, num_x)
type QuboData = (Vec<usize>, Vec<usize>, Vec<f64>, Vec<f64>, usize);

impl From<ValidationError> for PyErr {
    fn from(err: ValidationError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

impl From<RoofDualityError> for PyErr {
    fn from(err: RoofDualityError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn make_options(
    mode: Option<String>,
    flow_algorithm: Option<String>,
    parallel: Option<bool>,
) -> Result<FixOptions, ValidationError> {
    let mut options = FixOptions::new();
    options.set_mode(mode)?;
    options.set_flow_algorithm(flow_algorithm)?;
    if let Some(parallel) = parallel {
        options.parallel = parallel;
    }
    Ok(options)
}

/// Fixes variables of a model given by its biases, returns the fixed values keyed by the original
/// labels together with a lower bound on the minimum energy.
///
/// Example
/// ``` python
/// import roofdual
///
/// linear = {0: 0.0, 1: 0.0, 2: 0.0}
/// quadratic = {(0, 1): 1.0, (1, 2): -1.0, (0, 2): 1.0}
///
/// fixed, lower_bound = roofdual.fix_variables(linear, quadratic, 0.0, "BINARY", mode="strong")
/// ```
///
/// # Errors
///
/// Raises a ValueError on an unknown vartype, mode or flow algorithm, and on an invalid model.
#[pyfunction]
#[pyo3(signature = (linear, quadratic, offset=0.0, vartype="BINARY".to_string(), mode=None, flow_algorithm=None, parallel=None))]
pub fn fix_variables(
    linear: HashMap<usize, f64>,
    quadratic: HashMap<(usize, usize), f64>,
    offset: f64,
    vartype: String,
    mode: Option<String>,
    flow_algorithm: Option<String>,
    parallel: Option<bool>,
) -> PyResult<(HashMap<usize, i8>, f64)> {
    let vartype = vartype.parse::<Vartype>()?;
    let options = make_options(mode, flow_algorithm, parallel)?;

    let linear = linear.into_iter().collect::<BTreeMap<usize, f64>>();
    let quadratic = quadratic.into_iter().collect::<Vec<_>>();
    let (model, labels) = QuadraticModel::from_labelled(&linear, &quadratic, offset, vartype)?;

    let result = fix_variables_with_options(&model, &options)?;

    // map the dense indices back onto the labels
    let fixed = result
        .fixed
        .into_iter()
        .map(|(v, value)| (labels[v], value))
        .collect();

    Ok((fixed, result.lower_bound))
}

/// Fixes variables of a QUBO in triplet form, returns binary values and a lower bound.
///
/// Example
/// ``` python
/// import roofdual
///
/// # 0.5 x^T Q x + c^T x as (rows, cols, values, c, num_x)
/// problem = ([0, 1], [1, 0], [1.0, 1.0], [-1.0, 0.5], 2)
///
/// fixed, lower_bound = roofdual.fix_qubo(problem)
/// ```
///
/// # Errors
///
/// Raises a ValueError on malformed triplets or an unknown mode.
#[pyfunction]
#[pyo3(signature = (problem, mode=None, flow_algorithm=None))]
pub fn fix_qubo(
    problem: QuboData,
    mode: Option<String>,
    flow_algorithm: Option<String>,
) -> PyResult<(HashMap<usize, usize>, f64)> {
    let p = QuadraticModel::from_vec(problem.0, problem.1, problem.2, problem.3, problem.4)?;
    let options = make_options(mode, flow_algorithm, None)?;

    let result = fix_variables_with_options(&p, &options)?;

    // binary models only ever produce 0 or 1
    let fixed = result
        .fixed
        .into_iter()
        .map(|(v, value)| (v, usize::from(value == 1)))
        .collect();

    Ok((fixed, result.lower_bound))
}

/// Finds the connected components of the interaction graph of a QUBO in triplet form, skipping
/// fixed variables
///
/// Example
/// ``` python
/// import roofdual
///
/// problem = ([0, 2], [1, 3], [1.0, 1.0], [0.0] * 4, 4)
///
/// components = roofdual.get_qubo_components(problem, {})
/// ```
///
/// # Errors
///
/// Raises a ValueError on malformed triplets.
#[pyfunction]
pub fn get_qubo_components(
    problem: QuboData,
    fixed_vars: HashMap<usize, usize>,
) -> PyResult<Vec<Vec<usize>>> {
    let p = QuadraticModel::from_vec(problem.0, problem.1, problem.2, problem.3, problem.4)?;

    Ok(get_all_disconnected_graphs(&p, &fixed_vars))
}

#[pymodule]
fn roofdual(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(fix_variables, m)?)?;
    m.add_function(wrap_pyfunction!(fix_qubo, m)?)?;
    m.add_function(wrap_pyfunction!(get_qubo_components, m)?)?;
    Ok(())
}
