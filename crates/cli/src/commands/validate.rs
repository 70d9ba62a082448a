use std::path::PathBuf;

use pricerule_core::catalog::load_document;
use pricerule_core::config::{AppConfig, LoadOptions};
use pricerule_core::domain::context::PolicyContext;
use pricerule_core::domain::sale_line::SaleLineItem;
use pricerule_core::engine::{DeterministicPricingRuntime, OrderReview};
use pricerule_core::errors::ApplicationError;
use serde::Deserialize;

use crate::commands::{load_candidates, CommandResult};

const COMMAND: &str = "validate";

#[derive(Debug, Clone)]
pub struct ValidateRequest {
    pub load: LoadOptions,
    pub context_path: PathBuf,
    pub line_path: PathBuf,
}

/// Accepted shapes of a line file: `{ lines = [...] }` (the only form TOML
/// allows), a bare JSON array, or a single line object.
#[derive(Deserialize)]
#[serde(untagged)]
enum LineDocument {
    Table { lines: Vec<SaleLineItem> },
    Many(Vec<SaleLineItem>),
    One(SaleLineItem),
}

impl LineDocument {
    fn into_lines(self) -> Vec<SaleLineItem> {
        match self {
            Self::Table { lines } | Self::Many(lines) => lines,
            Self::One(line) => vec![line],
        }
    }
}

pub fn run(request: ValidateRequest) -> CommandResult {
    match execute(request) {
        Ok(review) => CommandResult::with_body(COMMAND, &review),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn execute(request: ValidateRequest) -> Result<OrderReview, ApplicationError> {
    let config = AppConfig::load(request.load)?;
    let context: PolicyContext = load_document(&request.context_path)?;
    let lines = load_document::<LineDocument>(&request.line_path)?.into_lines();
    if lines.is_empty() {
        return Err(ApplicationError::InvalidInput(format!(
            "`{}` contains no sale lines",
            request.line_path.display()
        )));
    }

    let candidates = load_candidates(&config, &context)?;
    let runtime = DeterministicPricingRuntime::with_markup_tolerance(
        config.engine.markup_tolerance_pct,
    );

    Ok(runtime.review_order(&candidates, &context, &lines))
}
