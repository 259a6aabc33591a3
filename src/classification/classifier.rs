//! Collection classifier
//!
//! Pure mapping from a collection name to [`Classification`]. No I/O, no
//! logging: the warning for an unrecognized collection is returned to the
//! caller, which decides how to surface it.

use super::policy::{CollectionPolicy, TenantOverride};
use crate::config::schema::ClassificationConfig;
use crate::domain::{Classification, ClassificationWarning, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of classifying one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// Applied classification
    pub classification: Classification,

    /// Present when the collection matched neither list
    pub warning: Option<ClassificationWarning>,
}

impl ClassificationResult {
    /// Whether the collection was routed as PHI
    pub fn is_phi(&self) -> bool {
        self.classification == Classification::Phi
    }
}

/// Classifier over a base policy and optional per-tenant policies
///
/// # Examples
///
/// ```
/// use phigate::classification::{Classifier, CollectionPolicy};
/// use phigate::domain::Classification;
///
/// let classifier = Classifier::new(CollectionPolicy::default_health_platform());
///
/// assert_eq!(classifier.classify("menopause_symptoms").classification, Classification::Phi);
/// assert_eq!(classifier.classify("usage_tracking").classification, Classification::NonPhi);
///
/// let unknown = classifier.classify("unknown_future_table");
/// assert_eq!(unknown.classification, Classification::Phi);
/// assert!(unknown.warning.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    base: Arc<CollectionPolicy>,
    tenants: HashMap<String, Arc<CollectionPolicy>>,
}

impl Classifier {
    /// Creates a classifier over a single policy
    pub fn new(policy: CollectionPolicy) -> Self {
        Self {
            base: Arc::new(policy),
            tenants: HashMap::new(),
        }
    }

    /// Builds the classifier from the `[classification]` section
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid names, overlapping lists,
    /// indexed fields on a non-PHI collection or a tenant downgrade.
    pub fn from_config(config: &ClassificationConfig) -> Result<Self> {
        let mut policy =
            CollectionPolicy::new(&config.phi_collections, &config.non_phi_collections)?;
        for (collection, fields) in &config.indexed_fields {
            policy = policy.with_indexed_fields(collection, fields.iter().cloned())?;
        }

        let mut classifier = Self::new(policy);
        for (tenant_id, tenant) in &config.tenants {
            classifier = classifier.with_tenant(tenant_id.clone(), tenant)?;
        }
        Ok(classifier)
    }

    /// Registers a tenant-specific policy derived from the base policy
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the override is invalid.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>, tenant: &TenantOverride) -> Result<Self> {
        let derived = self.base.with_override(tenant)?;
        self.tenants.insert(tenant_id.into(), Arc::new(derived));
        Ok(self)
    }

    /// Classifies a collection against the base policy
    pub fn classify(&self, collection: &str) -> ClassificationResult {
        classify_with(&self.base, collection)
    }

    /// Classifies a collection for a tenant, falling back to the base policy
    pub fn classify_for(&self, tenant_id: Option<&str>, collection: &str) -> ClassificationResult {
        classify_with(self.policy_for(tenant_id), collection)
    }

    /// Policy in effect for a tenant
    pub fn policy_for(&self, tenant_id: Option<&str>) -> &CollectionPolicy {
        tenant_id
            .and_then(|t| self.tenants.get(t))
            .unwrap_or(&self.base)
    }

    /// Base policy
    pub fn policy(&self) -> &CollectionPolicy {
        &self.base
    }
}

fn classify_with(policy: &CollectionPolicy, collection: &str) -> ClassificationResult {
    if policy.is_phi_listed(collection) {
        return ClassificationResult {
            classification: Classification::Phi,
            warning: None,
        };
    }
    if policy.is_non_phi_listed(collection) {
        return ClassificationResult {
            classification: Classification::NonPhi,
            warning: None,
        };
    }
    // Fail closed
    ClassificationResult {
        classification: Classification::Phi,
        warning: Some(ClassificationWarning::unrecognized(collection)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::policy::{default_non_phi_collections, default_phi_collections};
    use test_case::test_case;

    fn classifier() -> Classifier {
        Classifier::new(CollectionPolicy::default_health_platform())
    }

    #[test]
    fn test_every_phi_listed_name_is_phi() {
        let classifier = classifier();
        for name in default_phi_collections() {
            let result = classifier.classify(name);
            assert_eq!(result.classification, Classification::Phi, "{name}");
            assert!(result.warning.is_none());
        }
    }

    #[test]
    fn test_every_non_phi_listed_name_is_non_phi() {
        let classifier = classifier();
        for name in default_non_phi_collections() {
            let result = classifier.classify(name);
            assert_eq!(result.classification, Classification::NonPhi, "{name}");
            assert!(result.warning.is_none());
        }
    }

    #[test_case("unknown_future_table" ; "unlisted name")]
    #[test_case("" ; "empty string")]
    #[test_case("USAGE_TRACKING" ; "wrong case")]
    #[test_case("usage_tracking; --" ; "injection attempt")]
    fn test_unlisted_defaults_to_phi_with_warning(name: &str) {
        let result = classifier().classify(name);
        assert_eq!(result.classification, Classification::Phi);
        let warning = result.warning.expect("warning expected");
        assert_eq!(warning.collection, name);
    }

    #[test]
    fn test_from_config_carries_indexed_fields() {
        let mut config = ClassificationConfig::default();
        config
            .indexed_fields
            .insert("symptom_logs".to_string(), vec!["logged_on".to_string()]);
        let classifier = Classifier::from_config(&config).unwrap();

        let name = crate::domain::CollectionName::new("symptom_logs").unwrap();
        assert_eq!(classifier.policy().indexed_fields(&name), ["logged_on".to_string()]);
        assert!(classifier.classify("menopause_symptoms").is_phi());
    }

    #[test]
    fn test_tenant_policy_applies_only_to_tenant() {
        let tenant = TenantOverride {
            phi_collections: vec!["analytics_events".to_string()],
            non_phi_collections: vec![],
        };
        let classifier = classifier().with_tenant("clinic-a", &tenant).unwrap();

        assert!(classifier
            .classify_for(Some("clinic-a"), "analytics_events")
            .is_phi());
        assert!(!classifier
            .classify_for(Some("clinic-b"), "analytics_events")
            .is_phi());
        assert!(!classifier.classify_for(None, "analytics_events").is_phi());
    }
}
