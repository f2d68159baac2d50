//! This module contains posiforms, quadratic functions over literals with non-negative coefficients

use crate::error::ValidationError;
use crate::qubo::{QuadraticModel, Vartype};
use ndarray::Array1;

/// Whether a literal stands for a variable or for its complement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub const fn flip(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// A variable or its logical complement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub variable: usize,
    pub polarity: Polarity,
}

impl Literal {
    pub const fn positive(variable: usize) -> Self {
        Self {
            variable,
            polarity: Polarity::Positive,
        }
    }

    pub const fn negative(variable: usize) -> Self {
        Self {
            variable,
            polarity: Polarity::Negative,
        }
    }

    /// The literal over the same variable with the opposite polarity
    pub const fn complement(self) -> Self {
        Self {
            variable: self.variable,
            polarity: self.polarity.flip(),
        }
    }

    /// Truth value of the literal when its variable takes the boolean value `x`
    pub const fn evaluate(self, x: bool) -> bool {
        match self.polarity {
            Polarity::Positive => x,
            Polarity::Negative => !x,
        }
    }

    /// Value the variable must take for this literal to be true
    pub const fn satisfying_value(self) -> usize {
        match self.polarity {
            Polarity::Positive => 1,
            Polarity::Negative => 0,
        }
    }
}

/// One term $a \ell_1 \ell_2$ of a posiform. `second == None` stands for the constant-true
/// literal, i.e. a linear term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PosiformTerm {
    pub first: Literal,
    pub second: Option<Literal>,
    pub coefficient: f64,
}

/// A posiform over `num_variables` boolean variables.
#[derive(Clone, Debug, PartialEq)]
pub struct Posiform {
    num_variables: usize,
    terms: Vec<PosiformTerm>,
    constant: f64,
}

impl Posiform {
    /// Rewrites the model as a posiform equal to `energy - offset` on every assignment.
    ///
    /// Spin models are first converted to binary (the affine map leaves energies unchanged). For an
    /// interaction with $J < 0$ the second variable is complemented,
    /// $J x_u x_v = J x_u + |J| x_u \bar{x}_v$, and for a linear bias $h < 0$ the variable is
    /// complemented, $h x = h + |h| \bar{x}$. Zero coefficients produce no term.
    pub fn from_model(model: &QuadraticModel) -> Self {
        let original_offset = model.offset();
        let binary;
        let model = match model.vartype() {
            Vartype::Binary => model,
            Vartype::Spin => {
                binary = model.change_vartype(Vartype::Binary);
                &binary
            }
        };

        let num_variables = model.num_variables();
        let mut terms = Vec::with_capacity(model.num_interactions() + num_variables);

        // the conversion to binary moved part of the energy into the offset, which is tracked in
        // the constant so that constant + terms = energy - original offset
        let mut constant = model.offset() - original_offset;

        let mut linear = model.linear_biases().clone();

        for (u, v, bias) in model.interactions() {
            if bias > 0.0 {
                terms.push(PosiformTerm {
                    first: Literal::positive(u),
                    second: Some(Literal::positive(v)),
                    coefficient: bias,
                });
            } else if bias < 0.0 {
                linear[u] += bias;
                terms.push(PosiformTerm {
                    first: Literal::positive(u),
                    second: Some(Literal::negative(v)),
                    coefficient: -bias,
                });
            }
        }

        for (v, &bias) in linear.iter().enumerate() {
            if bias > 0.0 {
                terms.push(PosiformTerm {
                    first: Literal::positive(v),
                    second: None,
                    coefficient: bias,
                });
            } else if bias < 0.0 {
                constant += bias;
                terms.push(PosiformTerm {
                    first: Literal::negative(v),
                    second: None,
                    coefficient: -bias,
                });
            }
        }

        Self {
            num_variables,
            terms,
            constant,
        }
    }

    /// Builds a posiform directly from its terms.
    ///
    /// # Errors
    ///
    /// Fails if a literal refers to a variable outside `0..num_variables`, or a coefficient is
    /// negative or not finite.
    pub fn from_terms(
        num_variables: usize,
        terms: Vec<PosiformTerm>,
        constant: f64,
    ) -> Result<Self, ValidationError> {
        for term in &terms {
            for literal in std::iter::once(term.first).chain(term.second) {
                if literal.variable >= num_variables {
                    return Err(ValidationError::VariableOutOfRange {
                        variable: literal.variable,
                        num_variables,
                    });
                }
            }

            if !term.coefficient.is_finite() {
                return Err(ValidationError::NonFiniteBias {
                    location: "posiform term".to_string(),
                    value: term.coefficient,
                });
            }

            if term.coefficient < 0.0 {
                return Err(ValidationError::NegativeCoefficient(term.coefficient));
            }

            if term.second.is_some_and(|second| second.variable == term.first.variable) {
                return Err(ValidationError::SelfInteraction(term.first.variable));
            }
        }

        if !constant.is_finite() {
            return Err(ValidationError::NonFiniteBias {
                location: "posiform constant".to_string(),
                value: constant,
            });
        }

        Ok(Self {
            num_variables,
            terms,
            constant,
        })
    }

    pub const fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn terms(&self) -> &[PosiformTerm] {
        &self.terms
    }

    /// The constant $a_0$; a lower bound on the posiform by itself
    pub const fn constant(&self) -> f64 {
        self.constant
    }

    /// Evaluates the posiform on a binary assignment (entries 0 or 1)
    pub fn evaluate(&self, x: &Array1<i8>) -> f64 {
        let value_of = |literal: Literal| literal.evaluate(x[literal.variable] != 0);

        let mut value = self.constant;

        for term in &self.terms {
            let first = value_of(term.first);
            let second = term.second.map_or(true, value_of);
            if first && second {
                value += term.coefficient;
            }
        }

        value
    }
}
