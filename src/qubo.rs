use crate::error::ValidationError;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use smolprng::{Algorithm, PRNG};
use sprs::{CsMat, TriMat};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Value domain of the variables of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vartype {
    /// Bipolar variables, s in {-1, +1}
    Spin,
    /// Boolean variables, x in {0, 1}
    Binary,
}

impl Vartype {
    pub const fn name(&self) -> &'static str {
        match self {
            Vartype::Spin => "SPIN",
            Vartype::Binary => "BINARY",
        }
    }

    /// Returns true if the value is part of this domain
    pub const fn contains(&self, value: i64) -> bool {
        match self {
            Vartype::Spin => value == -1 || value == 1,
            Vartype::Binary => value == 0 || value == 1,
        }
    }

    /// Maps a boolean value (0 or 1) onto this domain
    pub const fn from_binary(&self, bit: usize) -> i8 {
        match (self, bit) {
            (Vartype::Spin, 0) => -1,
            (Vartype::Spin, _) => 1,
            (Vartype::Binary, 0) => 0,
            (Vartype::Binary, _) => 1,
        }
    }
}

impl fmt::Display for Vartype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vartype {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SPIN" => Ok(Vartype::Spin),
            "BINARY" => Ok(Vartype::Binary),
            _ => Err(ValidationError::InvalidVartype(s.to_string())),
        }
    }
}

/// A quadratic pseudo-boolean function
///
/// $$E(x) = \sum_i h_i x_i + \sum_{i<j} J_{ij} x_i x_j + c$$
#[derive(Clone, Debug, PartialEq)]
pub struct QuadraticModel {
    linear: Array1<f64>,
    adjacency: Vec<BTreeMap<usize, f64>>,
    offset: f64,
    vartype: Vartype,
}

impl QuadraticModel {
    /// Creates a model with `num_variables` variables and no biases
    pub fn new(num_variables: usize, vartype: Vartype) -> Self {
        Self {
            linear: Array1::zeros(num_variables),
            adjacency: vec![BTreeMap::new(); num_variables],
            offset: 0.0,
            vartype,
        }
    }

    /// Builds a model from dense linear biases and a list of `(u, v, bias)` interactions.
    ///
    /// # Errors
    ///
    /// Fails on out-of-range indices, self-interactions, pairs listed twice (in either order),
    /// and non-finite biases.
    pub fn from_parts(
        linear: Array1<f64>,
        quadratic: &[(usize, usize, f64)],
        offset: f64,
        vartype: Vartype,
    ) -> Result<Self, ValidationError> {
        let mut model = Self::new(linear.len(), vartype);

        for (i, &bias) in linear.iter().enumerate() {
            model.set_linear(i, bias)?;
        }

        for &(u, v, bias) in quadratic {
            model.check_pair(u, v)?;
            if model.adjacency[u].contains_key(&v) {
                return Err(ValidationError::DuplicateInteraction(u.min(v), u.max(v)));
            }
            model.set_quadratic(u, v, bias)?;
        }

        model.set_offset(offset)?;

        Ok(model)
    }

    /// Builds a model over arbitrary non-negative labels, returning the dense model together with
    /// the label of each dense index (sorted ascending).
    ///
    /// Variables that only appear in the quadratic part are given a zero linear bias.
    ///
    /// # Errors
    ///
    /// Same conditions as [`QuadraticModel::from_parts`], reported in terms of dense indices.
    pub fn from_labelled(
        linear: &BTreeMap<usize, f64>,
        quadratic: &[((usize, usize), f64)],
        offset: f64,
        vartype: Vartype,
    ) -> Result<(Self, Vec<usize>), ValidationError> {
        let mut labels = linear.keys().copied().collect::<BTreeSet<usize>>();
        for &((u, v), _) in quadratic {
            labels.insert(u);
            labels.insert(v);
        }
        let labels = labels.into_iter().collect::<Vec<usize>>();

        let index_of = labels
            .iter()
            .enumerate()
            .map(|(index, &label)| (label, index))
            .collect::<HashMap<usize, usize>>();

        let mut dense_linear = Array1::<f64>::zeros(labels.len());
        for (label, &bias) in linear {
            dense_linear[index_of[label]] = bias;
        }

        let dense_quadratic = quadratic
            .iter()
            .map(|&((u, v), bias)| (index_of[&u], index_of[&v], bias))
            .collect::<Vec<_>>();

        let model = Self::from_parts(dense_linear, &dense_quadratic, offset, vartype)?;

        Ok((model, labels))
    }

    /// Builds a binary model from the matrix form $0.5 x^T Q x + c^T x$.
    ///
    /// Q does not need to be symmetric, entries (i, j) and (j, i) are combined, and the diagonal is
    /// folded into the linear term since $x_i^2 = x_i$.
    ///
    /// # Errors
    ///
    /// Fails if the shapes of Q and c disagree or if any entry is not finite.
    pub fn from_matrix(q: &CsMat<f64>, c: &Array1<f64>) -> Result<Self, ValidationError> {
        let num_x = c.len();
        if q.rows() != num_x || q.cols() != num_x {
            return Err(ValidationError::LengthMismatch {
                expected: num_x,
                found: q.rows().max(q.cols()),
            });
        }

        let mut model = Self::new(num_x, Vartype::Binary);

        for (i, &c_i) in c.iter().enumerate() {
            model.add_linear(i, c_i)?;
        }

        for (&value, (i, j)) in q {
            if i == j {
                model.add_linear(i, 0.5 * value)?;
            } else {
                model.add_quadratic(i, j, 0.5 * value)?;
            }
        }

        Ok(model)
    }

    /// Builds a binary model from the flat triplet form (rows, cols, values, c, num_x) used when
    /// exchanging QUBOs with Python.
    ///
    /// # Errors
    ///
    /// Fails if the triplet vectors differ in length, an index is out of range, or a value is not
    /// finite.
    pub fn from_vec(
        i: Vec<usize>,
        j: Vec<usize>,
        q: Vec<f64>,
        c: Vec<f64>,
        num_x: usize,
    ) -> Result<Self, ValidationError> {
        if i.len() != q.len() || j.len() != q.len() {
            return Err(ValidationError::LengthMismatch {
                expected: q.len(),
                found: i.len().max(j.len()),
            });
        }

        if c.len() != num_x {
            return Err(ValidationError::LengthMismatch {
                expected: num_x,
                found: c.len(),
            });
        }

        if let Some(&variable) = i.iter().chain(j.iter()).find(|&&x| x >= num_x) {
            return Err(ValidationError::VariableOutOfRange {
                variable,
                num_variables: num_x,
            });
        }

        let q_tri = TriMat::from_triplets((num_x, num_x), i, j, q);

        Self::from_matrix(&q_tri.to_csr(), &Array1::from_vec(c))
    }

    /// Generates a random binary model where each pair interacts with probability `density`
    pub fn make_random_model<T: Algorithm>(
        num_x: usize,
        prng: &mut PRNG<T>,
        density: f64,
    ) -> Self {
        let mut model = Self::new(num_x, Vartype::Binary);

        for i in 0..num_x {
            model.linear[i] = prng.gen_f64() - 0.5f64;
        }

        for i in 0..num_x {
            for j in (i + 1)..num_x {
                if prng.gen_f64() < density {
                    let bias = prng.gen_f64() - 0.5f64;
                    model.adjacency[i].insert(j, bias);
                    model.adjacency[j].insert(i, bias);
                }
            }
        }

        model
    }

    pub fn num_variables(&self) -> usize {
        self.linear.len()
    }

    pub fn num_interactions(&self) -> usize {
        self.adjacency.iter().map(BTreeMap::len).sum::<usize>() / 2
    }

    pub const fn vartype(&self) -> Vartype {
        self.vartype
    }

    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Dense view of the linear biases
    pub const fn linear_biases(&self) -> &Array1<f64> {
        &self.linear
    }

    /// Linear bias of variable `v`
    ///
    /// # Errors
    ///
    /// Fails if `v` is out of range.
    pub fn linear(&self, v: usize) -> Result<f64, ValidationError> {
        self.check_variable(v)?;
        Ok(self.linear[v])
    }

    /// Quadratic bias between `u` and `v`, zero if they do not interact
    ///
    /// # Errors
    ///
    /// Fails if either index is out of range or if `u == v`.
    pub fn quadratic(&self, u: usize, v: usize) -> Result<f64, ValidationError> {
        self.check_pair(u, v)?;
        Ok(self.adjacency[u].get(&v).copied().unwrap_or(0.0))
    }

    /// Neighbours of `v` with the bias of each interaction, in increasing index order
    ///
    /// # Errors
    ///
    /// Fails if `v` is out of range.
    pub fn neighbors(
        &self,
        v: usize,
    ) -> Result<impl Iterator<Item = (usize, f64)> + '_, ValidationError> {
        self.check_variable(v)?;
        Ok(self.adjacency_row(v))
    }

    /// Number of interactions `v` takes part in
    ///
    /// # Errors
    ///
    /// Fails if `v` is out of range.
    pub fn degree(&self, v: usize) -> Result<usize, ValidationError> {
        self.check_variable(v)?;
        Ok(self.adjacency[v].len())
    }

    pub(crate) fn linear_biases_mut(&mut self) -> &mut Array1<f64> {
        &mut self.linear
    }

    /// Unchecked symmetric insert, `u` and `v` must be distinct variables of the model
    pub(crate) fn adjacency_insert(&mut self, u: usize, v: usize, bias: f64) {
        self.adjacency[u].insert(v, bias);
        self.adjacency[v].insert(u, bias);
    }

    pub(crate) fn set_offset_unchecked(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Unchecked neighbour iteration for callers that already range-checked `v`
    pub(crate) fn adjacency_row(&self, v: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency[v].iter().map(|(&u, &bias)| (u, bias))
    }

    /// Every interaction once, as `(u, v, bias)` with `u < v`, ordered by `u` then `v`
    pub fn interactions(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(u, row)| {
            row.range((u + 1)..)
                .map(move |(&v, &bias)| (u, v, bias))
        })
    }

    pub fn set_offset(&mut self, offset: f64) -> Result<(), ValidationError> {
        check_finite(|| "offset".to_string(), offset)?;
        self.offset = offset;
        Ok(())
    }

    pub fn set_linear(&mut self, v: usize, bias: f64) -> Result<(), ValidationError> {
        self.check_variable(v)?;
        check_finite(|| format!("variable {v}"), bias)?;
        self.linear[v] = bias;
        Ok(())
    }

    pub fn add_linear(&mut self, v: usize, bias: f64) -> Result<(), ValidationError> {
        self.check_variable(v)?;
        let value = self.linear[v] + bias;
        check_finite(|| format!("variable {v}"), value)?;
        self.linear[v] = value;
        Ok(())
    }

    /// Sets the bias of the interaction between `u` and `v`, creating it if needed
    pub fn set_quadratic(&mut self, u: usize, v: usize, bias: f64) -> Result<(), ValidationError> {
        self.check_pair(u, v)?;
        check_finite(|| format!("interaction ({u}, {v})"), bias)?;
        self.adjacency[u].insert(v, bias);
        self.adjacency[v].insert(u, bias);
        Ok(())
    }

    /// Adds to the bias of the interaction between `u` and `v`, creating it if needed
    pub fn add_quadratic(&mut self, u: usize, v: usize, bias: f64) -> Result<(), ValidationError> {
        self.check_pair(u, v)?;
        let value = self.adjacency[u].get(&v).copied().unwrap_or(0.0) + bias;
        self.set_quadratic(u, v, value)
    }

    /// Removes the interaction between `u` and `v`, returning whether it existed
    pub fn remove_interaction(&mut self, u: usize, v: usize) -> Result<bool, ValidationError> {
        self.check_pair(u, v)?;
        let existed = self.adjacency[u].remove(&v).is_some();
        self.adjacency[v].remove(&u);
        Ok(existed)
    }

    /// Energy of a full assignment given as a map from variable to value.
    ///
    /// # Errors
    ///
    /// Fails if a variable is missing, a key is not a variable of the model, or a value lies
    /// outside the model's vartype domain.
    pub fn energy(&self, sample: &HashMap<usize, i8>) -> Result<f64, ValidationError> {
        if let Some(&variable) = sample.keys().find(|&&v| v >= self.num_variables()) {
            return Err(ValidationError::UnknownVariable(variable));
        }

        let mut x = Array1::<i8>::zeros(self.num_variables());
        for v in 0..self.num_variables() {
            match sample.get(&v) {
                Some(&value) => x[v] = value,
                None => return Err(ValidationError::MissingVariable(v)),
            }
        }

        self.energy_dense(&x)
    }

    /// Energy of a full assignment given as a dense vector.
    ///
    /// # Errors
    ///
    /// Fails if the length differs from the number of variables or a value lies outside the
    /// model's vartype domain.
    pub fn energy_dense(&self, x: &Array1<i8>) -> Result<f64, ValidationError> {
        if x.len() != self.num_variables() {
            return Err(ValidationError::LengthMismatch {
                expected: self.num_variables(),
                found: x.len(),
            });
        }

        for (variable, &value) in x.iter().enumerate() {
            if !self.vartype.contains(i64::from(value)) {
                return Err(ValidationError::InvalidValue {
                    variable,
                    value: i64::from(value),
                    vartype: self.vartype.name(),
                });
            }
        }

        let mut energy = self.offset;

        for (v, &bias) in self.linear.iter().enumerate() {
            energy += bias * f64::from(x[v]);
        }

        for (u, v, bias) in self.interactions() {
            energy += bias * f64::from(x[u]) * f64::from(x[v]);
        }

        Ok(energy)
    }

    /// Returns an equivalent model over the `target` domain.
    ///
    /// Uses $x = (s + 1) / 2$ going to spin and $s = 2x - 1$ going to binary, so that energies
    /// agree on corresponding assignments.
    pub fn change_vartype(&self, target: Vartype) -> Self {
        if target == self.vartype {
            return self.clone();
        }

        let mut converted = Self::new(self.num_variables(), target);
        converted.offset = self.offset;

        match target {
            Vartype::Binary => {
                // h s = 2h x - h
                for (v, &h) in self.linear.iter().enumerate() {
                    converted.linear[v] += 2.0 * h;
                    converted.offset -= h;
                }

                // J s_u s_v = 4J x_u x_v - 2J x_u - 2J x_v + J
                for (u, v, j) in self.interactions() {
                    converted.adjacency[u].insert(v, 4.0 * j);
                    converted.adjacency[v].insert(u, 4.0 * j);
                    converted.linear[u] -= 2.0 * j;
                    converted.linear[v] -= 2.0 * j;
                    converted.offset += j;
                }
            }
            Vartype::Spin => {
                // h x = h/2 s + h/2
                for (v, &h) in self.linear.iter().enumerate() {
                    converted.linear[v] += 0.5 * h;
                    converted.offset += 0.5 * h;
                }

                // J x_u x_v = J/4 (s_u s_v + s_u + s_v + 1)
                for (u, v, j) in self.interactions() {
                    converted.adjacency[u].insert(v, 0.25 * j);
                    converted.adjacency[v].insert(u, 0.25 * j);
                    converted.linear[u] += 0.25 * j;
                    converted.linear[v] += 0.25 * j;
                    converted.offset += 0.25 * j;
                }
            }
        }

        converted
    }

    /// Multiplies every bias and the offset by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        let mut scaled = self.clone();
        scaled.linear.mapv_inplace(|bias| factor * bias);
        for row in &mut scaled.adjacency {
            for bias in row.values_mut() {
                *bias *= factor;
            }
        }
        scaled.offset *= factor;
        scaled
    }

    /// Re-checks every invariant of the model: finite biases, symmetric adjacency, no
    /// self-interactions.
    ///
    /// # Errors
    ///
    /// Reports the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_finite(|| "offset".to_string(), self.offset)?;

        for (v, &bias) in self.linear.iter().enumerate() {
            check_finite(|| format!("variable {v}"), bias)?;
        }

        for (u, row) in self.adjacency.iter().enumerate() {
            for (&v, &bias) in row {
                self.check_pair(u, v)?;
                check_finite(|| format!("interaction ({u}, {v})"), bias)?;
                if self.adjacency[v].get(&u) != Some(&bias) {
                    return Err(ValidationError::DuplicateInteraction(u.min(v), u.max(v)));
                }
            }
        }

        Ok(())
    }

    fn check_variable(&self, v: usize) -> Result<(), ValidationError> {
        if v >= self.num_variables() {
            return Err(ValidationError::VariableOutOfRange {
                variable: v,
                num_variables: self.num_variables(),
            });
        }
        Ok(())
    }

    fn check_pair(&self, u: usize, v: usize) -> Result<(), ValidationError> {
        self.check_variable(u)?;
        self.check_variable(v)?;
        if u == v {
            return Err(ValidationError::SelfInteraction(u));
        }
        Ok(())
    }
}

fn check_finite<F: FnOnce() -> String>(location: F, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteBias {
            location: location(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{all_assignments, make_test_prng};
    use proptest::prelude::*;

    fn make_triangle() -> QuadraticModel {
        QuadraticModel::from_parts(
            Array1::from_vec(vec![0.5, -1.0, 2.0]),
            &[(0, 1, 1.0), (1, 2, -1.0), (0, 2, 1.5)],
            0.25,
            Vartype::Binary,
        )
        .unwrap()
    }

    #[test]
    fn accessors_report_stored_biases() {
        let model = make_triangle();

        assert_eq!(model.num_variables(), 3);
        assert_eq!(model.num_interactions(), 3);
        assert_eq!(model.linear(1).unwrap(), -1.0);
        assert_eq!(model.quadratic(2, 1).unwrap(), -1.0);
        assert_eq!(model.offset(), 0.25);
        assert_eq!(model.degree(0).unwrap(), 2);

        let neighbors = model.neighbors(1).unwrap().collect::<Vec<_>>();
        assert_eq!(neighbors, vec![(0, 1.0), (2, -1.0)]);

        let interactions = model.interactions().collect::<Vec<_>>();
        assert_eq!(interactions, vec![(0, 1, 1.0), (0, 2, 1.5), (1, 2, -1.0)]);
    }

    #[test]
    fn absent_interactions_are_zero() {
        let mut model = QuadraticModel::new(3, Vartype::Spin);
        model.set_quadratic(0, 1, 2.0).unwrap();
        assert_eq!(model.quadratic(0, 2).unwrap(), 0.0);
        assert!(model.remove_interaction(1, 0).unwrap());
        assert!(!model.remove_interaction(1, 0).unwrap());
        assert_eq!(model.quadratic(0, 1).unwrap(), 0.0);
        assert_eq!(model.num_interactions(), 0);
    }

    #[test]
    fn malformed_models_are_rejected() {
        let linear = Array1::zeros(2);

        let err = QuadraticModel::from_parts(linear.clone(), &[(0, 0, 1.0)], 0.0, Vartype::Binary);
        assert_eq!(err, Err(ValidationError::SelfInteraction(0)));

        let err = QuadraticModel::from_parts(
            linear.clone(),
            &[(0, 1, 1.0), (1, 0, 2.0)],
            0.0,
            Vartype::Binary,
        );
        assert_eq!(err, Err(ValidationError::DuplicateInteraction(0, 1)));

        let err = QuadraticModel::from_parts(linear.clone(), &[(0, 5, 1.0)], 0.0, Vartype::Binary);
        assert!(matches!(
            err,
            Err(ValidationError::VariableOutOfRange { variable: 5, .. })
        ));

        let err = QuadraticModel::from_parts(
            linear,
            &[(0, 1, f64::NAN)],
            0.0,
            Vartype::Binary,
        );
        assert!(matches!(err, Err(ValidationError::NonFiniteBias { .. })));

        let err = QuadraticModel::from_parts(
            Array1::from_vec(vec![f64::INFINITY]),
            &[],
            0.0,
            Vartype::Binary,
        );
        assert!(matches!(err, Err(ValidationError::NonFiniteBias { .. })));
    }

    #[test]
    fn energy_matches_hand_computation() {
        let model = make_triangle();

        let sample = HashMap::from([(0, 1), (1, 1), (2, 0)]);
        // 0.5 - 1.0 + 1.0 + 0.25
        assert_eq!(model.energy(&sample).unwrap(), 0.75);

        let spin = QuadraticModel::from_parts(
            Array1::from_vec(vec![1.0, 0.0]),
            &[(0, 1, -2.0)],
            0.0,
            Vartype::Spin,
        )
        .unwrap();
        let x = Array1::from_vec(vec![-1, 1]);
        assert_eq!(spin.energy_dense(&x).unwrap(), 1.0);
    }

    #[test]
    fn energy_rejects_bad_assignments() {
        let model = make_triangle();

        let missing = HashMap::from([(0, 1), (1, 1)]);
        assert_eq!(model.energy(&missing), Err(ValidationError::MissingVariable(2)));

        let unknown = HashMap::from([(0, 1), (1, 1), (2, 0), (9, 1)]);
        assert_eq!(model.energy(&unknown), Err(ValidationError::UnknownVariable(9)));

        let wrong_domain = HashMap::from([(0, -1), (1, 1), (2, 0)]);
        assert!(matches!(
            model.energy(&wrong_domain),
            Err(ValidationError::InvalidValue { variable: 0, .. })
        ));

        let short = Array1::from_vec(vec![0, 1]);
        assert!(matches!(
            model.energy_dense(&short),
            Err(ValidationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn labelled_models_are_densified_in_label_order() {
        let linear = BTreeMap::from([(10, 1.0), (3, -2.0)]);
        let quadratic = [((10, 42), 0.5), ((3, 42), -1.0)];

        let (model, labels) =
            QuadraticModel::from_labelled(&linear, &quadratic, 1.0, Vartype::Spin).unwrap();

        assert_eq!(labels, vec![3, 10, 42]);
        assert_eq!(model.linear(0).unwrap(), -2.0);
        assert_eq!(model.linear(1).unwrap(), 1.0);
        assert_eq!(model.linear(2).unwrap(), 0.0);
        assert_eq!(model.quadratic(1, 2).unwrap(), 0.5);
        assert_eq!(model.quadratic(0, 2).unwrap(), -1.0);

        let duplicate = [((10, 42), 0.5), ((42, 10), -1.0)];
        let err = QuadraticModel::from_labelled(&linear, &duplicate, 1.0, Vartype::Spin);
        assert_eq!(err, Err(ValidationError::DuplicateInteraction(1, 2)));
    }

    #[test]
    fn matrix_form_matches_half_quadratic_energy() {
        // f(x) = 0.5 x'Qx + c'x
        let mut q = TriMat::new((2, 2));
        q.add_triplet(0, 0, 2.0);
        q.add_triplet(0, 1, -3.0);
        q.add_triplet(1, 0, -1.0);
        q.add_triplet(1, 1, 4.0);
        let c = Array1::from_vec(vec![1.0, -1.0]);

        let model = QuadraticModel::from_matrix(&q.to_csr(), &c).unwrap();

        assert_eq!(model.linear(0).unwrap(), 2.0);
        assert_eq!(model.linear(1).unwrap(), 1.0);
        assert_eq!(model.quadratic(0, 1).unwrap(), -2.0);

        // x = (1, 1): 0.5 * (2 - 3 - 1 + 4) + 1 - 1 = 1
        let x = Array1::from_vec(vec![1, 1]);
        assert_eq!(model.energy_dense(&x).unwrap(), 1.0);

        let from_vec = QuadraticModel::from_vec(
            vec![0, 0, 1, 1],
            vec![0, 1, 0, 1],
            vec![2.0, -3.0, -1.0, 4.0],
            vec![1.0, -1.0],
            2,
        )
        .unwrap();
        assert_eq!(from_vec, model);

        let err = QuadraticModel::from_vec(vec![0], vec![3], vec![1.0], vec![0.0, 0.0], 2);
        assert!(matches!(
            err,
            Err(ValidationError::VariableOutOfRange { variable: 3, .. })
        ));
    }

    #[test]
    fn vartype_parses_case_insensitively() {
        assert_eq!("spin".parse::<Vartype>().unwrap(), Vartype::Spin);
        assert_eq!("BINARY".parse::<Vartype>().unwrap(), Vartype::Binary);
        assert!(matches!(
            "ising".parse::<Vartype>(),
            Err(ValidationError::InvalidVartype(_))
        ));
    }

    #[test]
    fn random_models_are_valid() {
        let mut prng = make_test_prng();
        let model = QuadraticModel::make_random_model(40, &mut prng, 0.2);
        assert_eq!(model.num_variables(), 40);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn scaling_multiplies_every_energy() {
        let model = crate::tests::make_scenario_model();
        let scaled = model.scaled(-3.0);

        assert_eq!(scaled.quadratic(1, 2).unwrap(), 3.0);
        for x in all_assignments(3, Vartype::Binary) {
            assert_eq!(
                scaled.energy_dense(&x).unwrap(),
                -3.0 * model.energy_dense(&x).unwrap()
            );
        }
    }

    #[test]
    fn converting_huge_spin_biases_overflows() {
        let model = QuadraticModel::from_parts(
            Array1::zeros(2),
            &[(0, 1, 1e308)],
            0.0,
            Vartype::Spin,
        )
        .unwrap();

        assert!(model.validate().is_ok());
        assert!(matches!(
            model.change_vartype(Vartype::Binary).validate(),
            Err(ValidationError::NonFiniteBias { .. })
        ));
    }

    proptest! {
        #[test]
        fn vartype_round_trip_preserves_energy(model in crate::tests::model_strategy(6)) {
            let spin = model.change_vartype(Vartype::Spin);
            let back = spin.change_vartype(Vartype::Binary);

            for x in all_assignments(model.num_variables(), Vartype::Binary) {
                let s = x.mapv(|b| 2 * b - 1);
                let original = model.energy_dense(&x).unwrap();
                prop_assert!((original - spin.energy_dense(&s).unwrap()).abs() < 1e-9);
                prop_assert!((original - back.energy_dense(&x).unwrap()).abs() < 1e-9);
            }
        }
    }
}
