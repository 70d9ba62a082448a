use std::path::PathBuf;

use pricerule_core::catalog::load_document;
use pricerule_core::config::{AppConfig, LoadOptions};
use pricerule_core::domain::context::PolicyContext;
use pricerule_core::engine::resolver::{
    AllApplicablePolicyResolver, BestPolicyResolver, RankedPolicy,
};
use pricerule_core::engine::scoring::{MatchTrace, Score, SpecificityScorer};
use pricerule_core::errors::ApplicationError;
use pricerule_core::rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{load_candidates, CommandResult};

const COMMAND: &str = "resolve";

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub load: LoadOptions,
    pub context_path: PathBuf,
    pub all: bool,
    pub trace: bool,
}

#[derive(Debug, Serialize)]
struct ResolveOutput {
    candidate_count: usize,
    winner: Option<PolicyView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    applicable: Option<Vec<PolicyView>>,
}

#[derive(Debug, Serialize)]
struct PolicyView {
    policy_id: String,
    name: String,
    score: Score,
    price_table_ref: Option<String>,
    max_discount_pct: Option<Decimal>,
    max_markup_pct: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<MatchTrace>>,
}

impl PolicyView {
    fn from_ranked(ranked: RankedPolicy<'_>, include_trace: bool) -> Self {
        Self {
            policy_id: ranked.policy.id.0.clone(),
            name: ranked.policy.name.clone(),
            score: ranked.score,
            price_table_ref: ranked.policy.price_table_ref.clone(),
            max_discount_pct: ranked.policy.max_discount_pct,
            max_markup_pct: ranked.policy.max_markup_pct,
            trace: include_trace.then_some(ranked.trace),
        }
    }
}

pub fn run(request: ResolveRequest) -> CommandResult {
    match execute(request) {
        Ok(output) => CommandResult::with_body(COMMAND, &output),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn execute(request: ResolveRequest) -> Result<ResolveOutput, ApplicationError> {
    let config = AppConfig::load(request.load)?;
    let context: PolicyContext = load_document(&request.context_path)?;
    let candidates = load_candidates(&config, &context)?;
    let include_trace = request.trace || config.engine.include_trace;

    let winner = BestPolicyResolver::new(SpecificityScorer)
        .resolve_ranked(&candidates, &context)
        .map(|ranked| PolicyView::from_ranked(ranked, include_trace));
    let applicable = request.all.then(|| {
        AllApplicablePolicyResolver::new(SpecificityScorer)
            .resolve(&candidates, &context)
            .into_iter()
            .map(|ranked| PolicyView::from_ranked(ranked, include_trace))
            .collect()
    });

    Ok(ResolveOutput { candidate_count: candidates.len(), winner, applicable })
}
