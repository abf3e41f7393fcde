use thiserror::Error;

/// Conditions the engine absorbs locally instead of propagating non-finite values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("parameter `{name}` must be finite")]
    NonFinite { name: &'static str },

    #[error("parameter `{name}` is degenerate ({value}); it is used as a denominator")]
    Degenerate { name: &'static str, value: f64 },

    #[error("integration produced a non-finite value in state component {index}")]
    Diverged { index: usize },
}

pub type SimResult<T> = Result<T, SimError>;
