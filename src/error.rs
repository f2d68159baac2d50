use thiserror::Error;

/// Malformed input, either in the model itself or in the arguments handed to it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("variable {variable} is out of range for a model with {num_variables} variables")]
    VariableOutOfRange { variable: usize, num_variables: usize },

    #[error("interaction ({0}, {0}) refers to the same variable twice")]
    SelfInteraction(usize),

    #[error("interaction ({0}, {1}) is given more than once")]
    DuplicateInteraction(usize, usize),

    #[error("bias on {location} is not finite: {value}")]
    NonFiniteBias { location: String, value: f64 },

    #[error("posiform coefficient {0} is negative")]
    NegativeCoefficient(f64),

    #[error("assignment is missing variable {0}")]
    MissingVariable(usize),

    #[error("assignment contains unknown variable {0}")]
    UnknownVariable(usize),

    #[error("value {value} of variable {variable} is not in the {vartype} domain")]
    InvalidValue {
        variable: usize,
        value: i64,
        vartype: &'static str,
    },

    #[error("assignment has {found} entries but the model has {expected} variables")]
    LengthMismatch { expected: usize, found: usize },

    #[error("model has {found} variables, exhaustive enumeration is limited to {limit}")]
    TooManyVariables { found: usize, limit: usize },

    #[error("unknown fixing mode {0:?}, expected \"standard\" or \"strong\"")]
    InvalidMode(String),

    #[error("unknown vartype {0:?}, expected \"SPIN\" or \"BINARY\"")]
    InvalidVartype(String),

    #[error("unknown flow algorithm {0:?}, expected \"dinic\" or \"edmonds_karp\"")]
    InvalidFlowAlgorithm(String),
}

/// Top level error returned by [`crate::preprocess::fix_variables`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoofDualityError {
    #[error("invalid model: {0}")]
    Validation(#[from] ValidationError),

    /// A non-finite quantity appeared while building or solving the network. Finite biases
    /// always produce finite capacities, so this points at a defect rather than bad input.
    #[error("numeric failure: {0}")]
    Numeric(String),
}
