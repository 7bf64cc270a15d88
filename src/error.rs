use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A tensor does not have the shape a module expects.
    #[error("shape mismatch in {context}: expected {expected}, but found {found:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        found: Vec<i64>,
    },
    /// A module was constructed with inconsistent hyper-parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
