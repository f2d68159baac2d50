//! Roof duality for quadratic pseudo-boolean models.
//!
//! Given a model over spin or binary variables, [`fix_variables`] computes the roof dual lower
//! bound of its minimum energy through a maximum flow on the implication network of a posiform,
//! and reads off variables whose optimal value is already determined.
//!
//! ```
//! use ndarray::Array1;
//! use roofdual::{fix_variables, FixMode, QuadraticModel, Vartype};
//!
//! // -s0 + s0 s1 is minimised by s0 = 1, s1 = -1
//! let model = QuadraticModel::from_parts(
//!     Array1::from_vec(vec![-1.0, 0.0]),
//!     &[(0, 1, 1.0)],
//!     0.0,
//!     Vartype::Spin,
//! )
//! .unwrap();
//!
//! let result = fix_variables(&model, FixMode::Standard).unwrap();
//! assert_eq!(result.fixed[&0], 1);
//! assert_eq!(result.fixed[&1], -1);
//! ```

pub mod enumerate;
pub mod error;
pub mod graph_utils;
pub mod implication_network;
pub mod max_flow;
pub mod persistence;
pub mod posiform;
pub mod preprocess;
#[cfg(feature = "python")]
pub mod python_interopt;
pub mod qubo;
pub mod solver_options;

pub use enumerate::enumerate_ground_states;
pub use error::{RoofDualityError, ValidationError};
pub use max_flow::{FlowAlgorithm, MaxFlowSolver};
pub use persistence::{ClosedFirst, StrongOnly, TieBreak};
pub use preprocess::{
    fix_variables, fix_variables_with_options, fix_variables_with_tie_break, make_sub_problem,
    FixedVariables,
};
pub use qubo::{QuadraticModel, Vartype};
pub use solver_options::{FixMode, FixOptions};
