//! Collection allow-lists
//!
//! A [`CollectionPolicy`] is the immutable configuration object injected into
//! the classifier. It holds the PHI list, the NON_PHI list and the fields of
//! each PHI collection that are stored as one-way index hashes.

use crate::domain::{CollectionName, PhiGateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// PHI collections of the health platform
pub fn default_phi_collections() -> Vec<&'static str> {
    vec![
        "menopause_symptoms",
        "symptom_logs",
        "therapy_sessions",
        "therapy_notes",
        "mood_entries",
        "medication_logs",
        "hormone_levels",
        "sleep_logs",
        "cycle_tracking",
        "health_profiles",
        "lab_results",
        "care_plans",
    ]
}

/// Ordinary application collections of the health platform
pub fn default_non_phi_collections() -> Vec<&'static str> {
    vec![
        "usage_tracking",
        "feature_flags",
        "app_settings",
        "notification_preferences",
        "subscription_plans",
        "content_articles",
        "analytics_events",
    ]
}

/// Per-tenant additions to the base allow-lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantOverride {
    /// Extra collections treated as PHI for this tenant
    #[serde(default)]
    pub phi_collections: Vec<String>,

    /// Extra collections treated as NON_PHI for this tenant
    #[serde(default)]
    pub non_phi_collections: Vec<String>,
}

/// Immutable PHI / NON_PHI allow-lists
///
/// # Examples
///
/// ```
/// use phigate::classification::CollectionPolicy;
///
/// let policy = CollectionPolicy::new(["menopause_symptoms"], ["usage_tracking"]).unwrap();
/// assert!(policy.is_phi_listed("menopause_symptoms"));
/// assert!(policy.is_non_phi_listed("usage_tracking"));
///
/// // The two lists must be disjoint
/// assert!(CollectionPolicy::new(["a"], ["a"]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPolicy {
    phi: BTreeSet<CollectionName>,
    non_phi: BTreeSet<CollectionName>,
    indexed_fields: BTreeMap<CollectionName, Vec<String>>,
}

impl CollectionPolicy {
    /// Builds a policy from the two allow-lists
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a name is invalid or appears on both lists.
    pub fn new<P, N, S, T>(phi: P, non_phi: N) -> Result<Self>
    where
        P: IntoIterator<Item = S>,
        N: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let phi = parse_names(phi)?;
        let non_phi = parse_names(non_phi)?;

        let overlap: Vec<&str> = phi.intersection(&non_phi).map(|n| n.as_str()).collect();
        if !overlap.is_empty() {
            return Err(PhiGateError::Configuration(format!(
                "Collections cannot be both PHI and NON_PHI: {}",
                overlap.join(", ")
            )));
        }

        Ok(Self {
            phi,
            non_phi,
            indexed_fields: BTreeMap::new(),
        })
    }

    /// The platform's built-in allow-lists
    pub fn default_health_platform() -> Self {
        Self {
            phi: default_phi_collections()
                .into_iter()
                .filter_map(|n| CollectionName::new(n).ok())
                .collect(),
            non_phi: default_non_phi_collections()
                .into_iter()
                .filter_map(|n| CollectionName::new(n).ok())
                .collect(),
            indexed_fields: BTreeMap::new(),
        }
    }

    /// Declares the fields of a PHI collection stored as index hashes
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the collection is not on the PHI list.
    pub fn with_indexed_fields<I, S>(mut self, collection: &str, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = CollectionName::new(collection).map_err(PhiGateError::Configuration)?;
        if !self.phi.contains(&name) {
            return Err(PhiGateError::Configuration(format!(
                "Indexed fields declared for '{name}', which is not a PHI collection"
            )));
        }
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.indexed_fields.insert(name, fields);
        Ok(self)
    }

    /// Derives the policy of a tenant
    ///
    /// A tenant may add PHI collections (moving them off the NON_PHI list) or
    /// allow-list new NON_PHI collections, but can never downgrade a base PHI
    /// collection.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on an invalid name or an attempted downgrade.
    pub fn with_override(&self, tenant: &TenantOverride) -> Result<Self> {
        let extra_phi = parse_names(&tenant.phi_collections)?;
        let extra_non_phi = parse_names(&tenant.non_phi_collections)?;

        if let Some(name) = extra_non_phi
            .iter()
            .find(|n| self.phi.contains(*n) || extra_phi.contains(*n))
        {
            return Err(PhiGateError::Configuration(format!(
                "Tenant override cannot classify PHI collection '{name}' as NON_PHI"
            )));
        }

        let mut derived = self.clone();
        for name in extra_phi {
            derived.non_phi.remove(&name);
            derived.phi.insert(name);
        }
        derived.non_phi.extend(extra_non_phi);
        Ok(derived)
    }

    /// Whether a collection is on the PHI list
    pub fn is_phi_listed(&self, collection: &str) -> bool {
        CollectionName::new(collection)
            .map(|n| self.phi.contains(&n))
            .unwrap_or(false)
    }

    /// Whether a collection is on the NON_PHI list
    pub fn is_non_phi_listed(&self, collection: &str) -> bool {
        CollectionName::new(collection)
            .map(|n| self.non_phi.contains(&n))
            .unwrap_or(false)
    }

    /// Fields of a collection stored as index hashes
    pub fn indexed_fields(&self, collection: &CollectionName) -> &[String] {
        self.indexed_fields
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// PHI list
    pub fn phi_collections(&self) -> impl Iterator<Item = &CollectionName> {
        self.phi.iter()
    }

    /// NON_PHI list
    pub fn non_phi_collections(&self) -> impl Iterator<Item = &CollectionName> {
        self.non_phi.iter()
    }
}

fn parse_names<I, S>(names: I) -> Result<BTreeSet<CollectionName>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| CollectionName::new(n.as_ref()).map_err(PhiGateError::Configuration))
        .collect()
}
