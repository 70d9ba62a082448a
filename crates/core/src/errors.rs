use thiserror::Error;

use crate::{catalog::CatalogError, config::ConfigError};

/// Failures at the edges of the engine. Resolution and validation themselves
/// are total and never produce one of these.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "config_validation",
            Self::Catalog(CatalogError::DuplicatePolicyId(_)) => "catalog_integrity",
            Self::Catalog(_) => "input_load",
            Self::InvalidInput(_) => "invalid_input",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Catalog(_) | Self::InvalidInput(_) => 3,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => {
                "Configuration is invalid. Check pricerule.toml and PRICERULE_* variables."
            }
            Self::Catalog(_) => "Input files could not be loaded. Check paths and file contents.",
            Self::InvalidInput(_) => {
                "The request could not be processed. Check inputs and try again."
            }
        }
    }
}
