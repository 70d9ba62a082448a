//! File-backed policy catalogs.
//!
//! Policies normally come from the ERP database; operators and tests load them
//! from JSON (a top-level array) or TOML (`[[policies]]` tables) exports.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::{
    context::TenantId,
    policy::{CommercialPolicy, PolicyId},
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse JSON in `{path}`: {source}")]
    ParseJson { path: PathBuf, source: serde_json::Error },
    #[error("could not parse TOML in `{path}`: {source}")]
    ParseToml { path: PathBuf, source: toml::de::Error },
    #[error("unsupported file format `{path}` (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },
    #[error("duplicate policy id `{0}` in catalog")]
    DuplicatePolicyId(PolicyId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyCatalog {
    policies: Vec<CommercialPolicy>,
}

#[derive(Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    policies: Vec<CommercialPolicy>,
}

impl PolicyCatalog {
    pub fn new(policies: Vec<CommercialPolicy>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for policy in &policies {
            if !seen.insert(&policy.id) {
                return Err(CatalogError::DuplicatePolicyId(policy.id.clone()));
            }
        }
        Ok(Self { policies })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let policies = match Format::of(path)? {
            Format::Json => read_json::<Vec<CommercialPolicy>>(path)?,
            Format::Toml => read_toml::<TomlCatalog>(path)?.policies,
        };
        let catalog = Self::new(policies)?;

        info!(
            event_name = "catalog.policies.loaded",
            path = %path.display(),
            policy_count = catalog.policies.len(),
            active_count = catalog.active().count(),
            "policy catalog loaded"
        );

        Ok(catalog)
    }

    pub fn policies(&self) -> &[CommercialPolicy] {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &CommercialPolicy> {
        self.policies.iter().filter(|policy| policy.active)
    }

    /// Candidates visible to a tenant: its own policies plus unscoped ones,
    /// in catalog order.
    pub fn for_tenant(&self, tenant_id: &TenantId) -> Vec<CommercialPolicy> {
        self.policies
            .iter()
            .filter(|policy| policy.belongs_to_tenant(tenant_id))
            .cloned()
            .collect()
    }

    pub fn into_policies(self) -> Vec<CommercialPolicy> {
        self.policies
    }
}

/// Reads any serde document (context, sale lines) from a `.json` or `.toml` file.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    match Format::of(path)? {
        Format::Json => read_json(path),
        Format::Toml => read_toml(path),
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, CatalogError> {
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(CatalogError::UnsupportedFormat { path: path.to_path_buf() }),
        }
    }
}

fn read(path: &Path) -> Result<String, CatalogError> {
    fs::read_to_string(path)
        .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    serde_json::from_str(&read(path)?)
        .map_err(|source| CatalogError::ParseJson { path: path.to_path_buf(), source })
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    toml::from_str(&read(path)?)
        .map_err(|source| CatalogError::ParseToml { path: path.to_path_buf(), source })
}
