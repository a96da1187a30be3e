//! Crate-wide error type.
//!
//! Every fatal condition aborts the current attempt with a descriptive
//! error instead of handing back a partially valid layout. There are no
//! internal retries: rerunning with a different seed is the caller's call.

/// Errors produced by the layout constructors and optimizers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed input rejected before any work starts (negative or
    /// non-finite demand, dimension mismatch, empty vertex set, ...).
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// A constructor or the crossover operator finished with a layout that
    /// is not a valid binary tree.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A gain computation produced NaN or infinity.
    #[error("numeric anomaly in {strategy} gain: {value}")]
    NumericAnomaly { strategy: &'static str, value: f64 },

    /// The requested combination of options cannot run in this build.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
}

/// Shorthand result type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::NumericAnomaly {
            strategy: "onehop",
            value: f64::NAN,
        };
        assert_eq!(err.to_string(), "numeric anomaly in onehop gain: NaN");

        let err = Error::Precondition("demand matrix is empty".into());
        assert_eq!(
            err.to_string(),
            "precondition violated: demand matrix is empty"
        );
    }
}
