//! Error types for the processor crate.
//!
//! Only configuration and policy loading can fail; batch processing is
//! total. A malformed policy set is rejected at compile time and the hot
//! path never sees it.

use palisade_policy::ProviderError;

/// Errors surfaced while configuring or wiring up the processor.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Policy loading or compilation error.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
