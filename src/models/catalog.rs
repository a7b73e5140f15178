//! Validated feature catalog.
//!
//! The catalog is the read-only input every plan deep-copies from. It is
//! validated once at construction, has its dependency edges symmetrized,
//! and carries a topological placement order so dependency-aware
//! placement never has to walk the graph recursively.

use std::collections::BTreeMap;

use super::{Feature, FeatureId};
use crate::error::{Result, RoadmapError};
use crate::validation::{
    ValidationError, ValidationErrorKind, dependency_graph, topological_order, validate_catalog,
};

/// A validated, acyclic set of features keyed by ID.
///
/// # Example
/// ```
/// use u_roadmap::models::{Feature, FeatureCatalog};
///
/// let catalog = FeatureCatalog::new(vec![
///     Feature::new(1, "Login", 20.0, 2000.0, 5000.0).with_child(2),
///     Feature::new(2, "Billing", 40.0, 4000.0, 20000.0),
/// ])
/// .unwrap();
///
/// // Edges declared on one side are mirrored on the other.
/// assert_eq!(catalog.get(2).unwrap().parents, vec![1]);
/// assert_eq!(catalog.placement_order(), &[1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct FeatureCatalog {
    features: BTreeMap<FeatureId, Feature>,
    order: Vec<FeatureId>,
}

impl FeatureCatalog {
    /// Validates `features` and builds the catalog.
    ///
    /// # Errors
    /// [`RoadmapError::InvalidCatalog`] listing every integrity problem found,
    /// or [`RoadmapError::InvalidParameter`] for an empty feature list.
    pub fn new(features: Vec<Feature>) -> Result<Self> {
        if features.is_empty() {
            return Err(RoadmapError::parameter("features", "catalog is empty"));
        }
        validate_catalog(&features).map_err(RoadmapError::InvalidCatalog)?;

        let adj = dependency_graph(&features);
        let order = topological_order(&adj).map_err(|node| {
            RoadmapError::InvalidCatalog(vec![ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving feature {node}"),
            )])
        })?;

        let mut features: BTreeMap<FeatureId, Feature> =
            features.into_iter().map(|f| (f.id, f)).collect();

        for f in features.values_mut() {
            f.parents.clear();
            f.children = adj.get(&f.id).cloned().unwrap_or_default();
        }
        for (&parent, children) in &adj {
            for child in children {
                if let Some(f) = features.get_mut(child) {
                    f.parents.push(parent);
                }
            }
        }

        Ok(Self { features, order })
    }

    /// Looks up a feature.
    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    /// Iterates features in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the catalog has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature IDs ordered so every prerequisite precedes its dependents.
    pub fn placement_order(&self) -> &[FeatureId] {
        &self.order
    }

    /// An independent copy of every feature, for a plan to own.
    pub(crate) fn to_owned_features(&self) -> BTreeMap<FeatureId, Feature> {
        self.features.clone()
    }
}
