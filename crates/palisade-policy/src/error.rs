//! Error types for policy compilation and loading.

/// Compilation failure: the offending policy set is rejected as a whole and
/// any previously active snapshot stays in place.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A matcher regex failed to compile.
    #[error("policy {policy_id}: invalid regex {pattern:?}: {source}")]
    Regex {
        policy_id: String,
        pattern: String,
        source: regex::Error,
    },

    /// A trace sampling percentage outside `0..=100` (or NaN).
    #[error("policy {policy_id}: sampling percentage {percentage} outside 0..=100")]
    InvalidPercentage { policy_id: String, percentage: f64 },
}

/// Failure loading policies from a provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not produce a policy list.
    #[error("provider {name}: {message}")]
    Load { name: String, message: String },

    /// The combined policy set failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),
}
