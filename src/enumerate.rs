use crate::error::ValidationError;
use crate::qubo::QuadraticModel;
use ndarray::Array1;

/// Largest model [`enumerate_ground_states`] accepts
pub const MAX_ENUMERATION_SIZE: usize = 24;

/// Energies within this fraction of the magnitude of their terms of the minimum count as ties
const TIE_TOLERANCE: f64 = 1e-12;

/// Enumerates every assignment of a small model and returns the minimum energy together with all
/// assignments attaining it, in the vartype of the model.
///
/// # Errors
///
/// Fails if the model has more than [`MAX_ENUMERATION_SIZE`] variables.
pub fn enumerate_ground_states(
    model: &QuadraticModel,
) -> Result<(f64, Vec<Array1<i8>>), ValidationError> {
    let num_vars = model.num_variables();
    if num_vars > MAX_ENUMERATION_SIZE {
        return Err(ValidationError::TooManyVariables {
            found: num_vars,
            limit: MAX_ENUMERATION_SIZE,
        });
    }

    let mut best_obj = f64::INFINITY;
    let mut best_scale = 0.0f64;
    let mut best_solutions: Vec<(Array1<i8>, f64, f64)> = Vec::new();
    let mut solution = Array1::<i8>::zeros(num_vars);

    for i in 0..(1usize << num_vars) {
        for j in 0..num_vars {
            solution[j] = model.vartype().from_binary((i >> j) & 1);
        }

        let obj = model.energy_dense(&solution)?;
        let scale = term_magnitude(model, &solution);
        let tolerance = TIE_TOLERANCE * scale.max(best_scale);

        if obj < best_obj - tolerance {
            best_obj = obj;
            best_scale = scale;
            best_solutions.clear();
            best_solutions.push((solution.clone(), obj, scale));
        } else if obj <= best_obj + tolerance {
            if obj < best_obj {
                best_obj = obj;
                best_scale = scale;
            }
            best_solutions.push((solution.clone(), obj, scale));
        }
    }

    // a tie accepted early may have been undercut by less than the tolerance since
    best_solutions.retain(|&(_, obj, scale)| obj <= best_obj + TIE_TOLERANCE * scale.max(best_scale));

    Ok((
        best_obj,
        best_solutions.into_iter().map(|(x, _, _)| x).collect(),
    ))
}

/// Sum of the absolute values of the terms making up the energy of `x`
fn term_magnitude(model: &QuadraticModel, x: &Array1<i8>) -> f64 {
    let linear = model
        .linear_biases()
        .iter()
        .zip(x)
        .map(|(bias, &value)| (bias * f64::from(value)).abs())
        .sum::<f64>();

    let quadratic = model
        .interactions()
        .map(|(u, v, bias)| (bias * f64::from(x[u]) * f64::from(x[v])).abs())
        .sum::<f64>();

    model.offset().abs() + linear + quadratic
}
