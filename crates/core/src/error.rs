//! Error types for the flamefield core.
//!
//! Only configuration faults are errors. Numeric faults inside the hot loop
//! (non-finite points, zero denominators) are repaired in place and never
//! reach the caller.

use thiserror::Error;

/// Errors produced when constructing or configuring an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero when creating a canvas or accumulator.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A chaos-game system was built without any transforms.
    #[error("chaos game requires at least one transform")]
    EmptyTransforms,

    /// The selection weights do not line up with the transforms.
    #[error("weight count mismatch: {transforms} transforms but {weights} weights")]
    WeightCountMismatch { transforms: usize, weights: usize },

    /// A transform was built without any (variation, weight) pairs.
    #[error("transform requires at least one variation")]
    EmptyVariations,

    /// A formula was built without any entries.
    #[error("formula requires at least one entry")]
    EmptyFormula,

    /// A palette could not be constructed from the given hues.
    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    /// A parameter value was present but unusable.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// No engine is registered under this name.
    #[error("unknown engine: {0}")]
    UnknownEngine(String),

    /// A variation name did not match the catalog.
    #[error("unknown variation: {0}")]
    UnknownVariation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_displays_readable_message() {
        let err = EngineError::InvalidDimensions;
        let msg = format!("{err}");
        assert!(
            msg.contains("width") && msg.contains("height"),
            "expected message mentioning width and height, got: {msg}"
        );
    }

    #[test]
    fn weight_count_mismatch_includes_both_counts() {
        let err = EngineError::WeightCountMismatch {
            transforms: 3,
            weights: 5,
        };
        let msg = format!("{err}");
        assert!(msg.contains('3'), "missing transform count in: {msg}");
        assert!(msg.contains('5'), "missing weight count in: {msg}");
    }

    #[test]
    fn invalid_parameter_includes_name_and_reason() {
        let err = EngineError::InvalidParameter {
            name: "speed".into(),
            reason: "must be finite".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("speed"), "missing param name in: {msg}");
        assert!(msg.contains("must be finite"), "missing reason in: {msg}");
    }

    #[test]
    fn unknown_variation_includes_name() {
        let err = EngineError::UnknownVariation("butterfly".into());
        assert!(format!("{err}").contains("butterfly"));
    }

    #[test]
    fn unknown_engine_includes_name() {
        let err = EngineError::UnknownEngine("mandelbrot".into());
        assert!(format!("{err}").contains("mandelbrot"));
    }

    #[test]
    fn empty_configurations_have_distinct_messages() {
        let a = EngineError::EmptyTransforms.to_string();
        let b = EngineError::EmptyVariations.to_string();
        let c = EngineError::EmptyFormula.to_string();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn engine_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }

    #[test]
    fn engine_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<EngineError>();
    }
}
