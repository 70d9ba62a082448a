pub mod resolver;
pub mod scoring;
pub mod violation;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    context::PolicyContext,
    policy::{CommercialPolicy, PolicyId},
    sale_line::SaleLineItem,
};

use self::{
    resolver::{PolicyResolver, SpecificityResolver},
    scoring::{Score, SpecificityScorer},
    violation::{LineValidator, Violation, ViolationValidator},
};

/// Price-table assignment for an order, taken from the governing policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingDecision {
    pub policy_id: Option<PolicyId>,
    pub policy_name: Option<String>,
    pub price_table_ref: Option<String>,
    pub score: Option<Score>,
}

impl PricingDecision {
    fn governed_by(policy: &CommercialPolicy, score: Score) -> Self {
        Self {
            policy_id: Some(policy.id.clone()),
            policy_name: Some(policy.name.clone()),
            price_table_ref: policy.price_table_ref.clone(),
            score: Some(score),
        }
    }

    pub fn is_governed(&self) -> bool {
        self.policy_id.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRoute {
    AutoApprove,
    ManagerApproval,
}

impl ApprovalRoute {
    fn for_violation(violation: &Violation) -> Self {
        if violation.violated {
            Self::ManagerApproval
        } else {
            Self::AutoApprove
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineReview {
    pub line_index: usize,
    pub violation: Violation,
    pub route: ApprovalRoute,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReview {
    pub decision: PricingDecision,
    pub lines: Vec<LineReview>,
    pub route: ApprovalRoute,
}

impl OrderReview {
    pub fn violated_lines(&self) -> impl Iterator<Item = &LineReview> {
        self.lines.iter().filter(|line| line.violation.violated)
    }
}

pub type DeterministicPricingRuntime =
    PricingDecisionRuntime<SpecificityResolver, ViolationValidator>;

pub struct PricingDecisionRuntime<R, V> {
    resolver: R,
    validator: V,
}

impl<R, V> PricingDecisionRuntime<R, V> {
    pub fn new(resolver: R, validator: V) -> Self {
        Self { resolver, validator }
    }
}

impl Default for DeterministicPricingRuntime {
    fn default() -> Self {
        Self::new(SpecificityResolver::default(), ViolationValidator::default())
    }
}

impl DeterministicPricingRuntime {
    pub fn with_markup_tolerance(markup_tolerance_pct: Decimal) -> Self {
        Self::new(
            SpecificityResolver::new(SpecificityScorer),
            ViolationValidator::new(markup_tolerance_pct),
        )
    }
}

impl<R, V> PricingDecisionRuntime<R, V>
where
    R: PolicyResolver,
    V: LineValidator,
{
    pub fn decide(
        &self,
        policies: &[CommercialPolicy],
        context: &PolicyContext,
    ) -> PricingDecision {
        self.resolver
            .resolve_best(policies, context)
            .map(|ranked| PricingDecision::governed_by(ranked.policy, ranked.score))
            .unwrap_or_default()
    }

    pub fn review_line(
        &self,
        policy: Option<&CommercialPolicy>,
        line_index: usize,
        item: &SaleLineItem,
    ) -> LineReview {
        let violation = self.validator.validate(policy, item);
        let route = ApprovalRoute::for_violation(&violation);
        LineReview { line_index, violation, route }
    }

    /// Resolves the governing policy once and checks every line against it.
    /// One violated line sends the whole order to manager approval.
    pub fn review_order(
        &self,
        policies: &[CommercialPolicy],
        context: &PolicyContext,
        items: &[SaleLineItem],
    ) -> OrderReview {
        let winner = self.resolver.resolve_best(policies, context);
        let policy = winner.as_ref().map(|ranked| ranked.policy);
        let decision = winner
            .as_ref()
            .map(|ranked| PricingDecision::governed_by(ranked.policy, ranked.score))
            .unwrap_or_default();

        let lines: Vec<LineReview> = items
            .iter()
            .enumerate()
            .map(|(index, item)| self.review_line(policy, index, item))
            .collect();
        let route = if lines.iter().any(|line| line.route == ApprovalRoute::ManagerApproval) {
            ApprovalRoute::ManagerApproval
        } else {
            ApprovalRoute::AutoApprove
        };

        info!(
            event_name = "engine.order.reviewed",
            policy_id = decision.policy_id.as_ref().map(|id| id.0.as_str()).unwrap_or("none"),
            price_table_ref = decision.price_table_ref.as_deref().unwrap_or("none"),
            line_count = lines.len(),
            violated_lines = lines.iter().filter(|line| line.violation.violated).count(),
            route = ?route,
            "order lines reviewed against governing policy"
        );

        OrderReview { decision, lines, route }
    }
}
