//! Crate error type.
//!
//! Only malformed input fails: an invalid catalog or an out-of-range search
//! parameter. Constraint violations inside a plan are scored, never raised.

use thiserror::Error;

use crate::models::FeatureId;
use crate::validation::ValidationError;

/// Result alias using [`RoadmapError`].
pub type Result<T> = std::result::Result<T, RoadmapError>;

/// Errors raised while building a catalog or configuring a search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoadmapError {
    /// The feature catalog failed one or more integrity checks.
    #[error("invalid feature catalog: {}", join_messages(.0))]
    InvalidCatalog(Vec<ValidationError>),

    /// A plan operation named a feature the plan does not contain.
    #[error("unknown feature {0}")]
    UnknownFeature(FeatureId),

    /// A search or plan parameter is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl RoadmapError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_display_joins_catalog_errors() {
        let err = RoadmapError::InvalidCatalog(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate feature ID: 1"),
            ValidationError::new(ValidationErrorKind::CyclicDependency, "cycle at 2"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid feature catalog: Duplicate feature ID: 1; cycle at 2"
        );
    }

    #[test]
    fn test_display_parameter() {
        let err = RoadmapError::parameter("population_size", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter `population_size`: must be positive"
        );
    }
}
