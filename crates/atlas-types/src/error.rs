// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Atlas kernel failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AtlasError {
    /// Invalid shape, length or non-finite static parameter.
    /// Detected at construction; fatal to the run.
    #[error("config error: {0}")]
    Config(String),

    /// Invalid per-step input (e.g. a non-finite driver phase).
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-finite value produced during integration.
    #[error("numerical instability at step {step}: {detail}")]
    Numerical { step: u64, detail: String },

    /// Unknown or malformed preset.
    #[error("preset error: {0}")]
    Preset(String),
}

pub type AtlasResult<T> = Result<T, AtlasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numerical_display_carries_step() {
        let err = AtlasError::Numerical {
            step: 17,
            detail: "layer 1 phase NaN".into(),
        };
        assert_eq!(
            err.to_string(),
            "numerical instability at step 17: layer 1 phase NaN"
        );
    }
}
