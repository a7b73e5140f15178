//! Input validation for feature catalogs.
//!
//! Checks structural integrity of a catalog before any plan is built.
//! Detects:
//! - Duplicate IDs
//! - Parent/child references to unknown features
//! - Circular dependencies (DAG validation)
//! - Non-positive effort and negative or non-finite economics
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::models::{Feature, FeatureId};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two features share the same ID.
    DuplicateId,
    /// A parent or child ID is absent from the catalog.
    InvalidFeatureReference,
    /// The dependency graph contains a cycle.
    CyclicDependency,
    /// Effort, cost, or revenue is out of range.
    InvalidEconomics,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a feature catalog.
///
/// Checks:
/// 1. No duplicate feature IDs
/// 2. Effort is finite and positive; cost and revenue are finite and non-negative
/// 3. All parent and child references point to existing features
/// 4. No circular dependencies (edges from either side are merged)
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_catalog(features: &[Feature]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    for f in features {
        if !ids.insert(f.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate feature ID: {}", f.id),
            ));
        }

        if !f.effort.is_finite() || f.effort <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidEconomics,
                format!("Feature {} has non-positive effort {}", f.id, f.effort),
            ));
        }
        for (label, value) in [("cost", f.cost), ("revenue", f.revenue)] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidEconomics,
                    format!("Feature {} has invalid {label} {value}", f.id),
                ));
            }
        }
    }

    for f in features {
        for (label, refs) in [("parent", &f.parents), ("child", &f.children)] {
            for r in refs {
                if !ids.contains(r) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidFeatureReference,
                        format!("Feature {} references unknown {label} {r}", f.id),
                    ));
                }
            }
        }
    }

    if let Err(node) = topological_order(&dependency_graph(features)) {
        errors.push(ValidationError::new(
            ValidationErrorKind::CyclicDependency,
            format!("Circular dependency detected involving feature {node}"),
        ));
    }

    if errors.is_empty() {
        tracing::trace!(features = features.len(), "catalog validated");
        Ok(())
    } else {
        tracing::trace!(errors = errors.len(), "catalog rejected");
        Err(errors)
    }
}

/// Builds the parent → child adjacency list, merging edges declared on
/// either side. Unknown references are dropped; neighbors are sorted and
/// deduplicated so traversal order is deterministic.
pub(crate) fn dependency_graph(features: &[Feature]) -> BTreeMap<FeatureId, Vec<FeatureId>> {
    let mut adj: BTreeMap<FeatureId, Vec<FeatureId>> =
        features.iter().map(|f| (f.id, Vec::new())).collect();

    for f in features {
        for &child in &f.children {
            if adj.contains_key(&child) {
                adj.entry(f.id).or_default().push(child);
            }
        }
        for &parent in &f.parents {
            if let Some(succ) = adj.get_mut(&parent) {
                succ.push(f.id);
            }
        }
    }

    for succ in adj.values_mut() {
        succ.sort_unstable();
        succ.dedup();
    }
    adj
}

/// Orders features so every prerequisite precedes its dependents.
///
/// # Algorithm
/// Iterative DFS with an explicit stack; the reversed post-order is a
/// topological order. Reaching a node that is still open is a back edge.
///
/// # Returns
/// The order, or `Err(id)` naming a feature on a cycle.
pub(crate) fn topological_order(
    adj: &BTreeMap<FeatureId, Vec<FeatureId>>,
) -> Result<Vec<FeatureId>, FeatureId> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unseen,
        Open,
        Done,
    }

    let mut marks: HashMap<FeatureId, Mark> = adj.keys().map(|&id| (id, Mark::Unseen)).collect();
    let mut post_order = Vec::with_capacity(adj.len());

    for &root in adj.keys() {
        if marks[&root] != Mark::Unseen {
            continue;
        }
        marks.insert(root, Mark::Open);
        let mut stack: Vec<(FeatureId, usize)> = vec![(root, 0)];

        while let Some((node, cursor)) = stack.last_mut() {
            let node = *node;
            let successors = adj.get(&node).map(Vec::as_slice).unwrap_or(&[]);

            if let Some(&next) = successors.get(*cursor) {
                *cursor += 1;
                match marks.get(&next).copied() {
                    Some(Mark::Unseen) => {
                        marks.insert(next, Mark::Open);
                        stack.push((next, 0));
                    }
                    Some(Mark::Open) => return Err(next), // Back edge → cycle
                    _ => {}
                }
            } else {
                marks.insert(node, Mark::Done);
                post_order.push(node);
                stack.pop();
            }
        }
    }

    post_order.reverse();
    Ok(post_order)
}
