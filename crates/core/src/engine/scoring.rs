//! Specificity scoring of a single policy against a pricing context.
//!
//! A policy scores one point per non-wildcard constraint the context satisfies,
//! plus `priority / 1000` as a tie-break. Any unsatisfied constraint rejects the
//! policy outright; rejection is a distinct outcome, never a score of zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    context::{ContextValue, PolicyContext, TenantId},
    policy::{CommercialPolicy, PolicyConstraints},
};

/// Decimal places applied to `priority` before it is added to the field count.
pub const PRIORITY_SCALE: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score(Decimal);

impl Score {
    pub const ZERO: Score = Score(Decimal::ZERO);

    pub fn new(matched_fields: u32, priority: i32) -> Self {
        Self(Decimal::from(matched_fields) + Decimal::new(i64::from(priority), PRIORITY_SCALE))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintField {
    CommercialCondition,
    Company,
    State,
    City,
    Neighborhood,
    Region,
    Customer,
    Salesperson,
    Team,
    Product,
    Brand,
    ProductGroup,
}

impl ConstraintField {
    /// Evaluation order. The score does not depend on it; traces and the
    /// first-rejection reason do.
    pub const EVALUATION_ORDER: [ConstraintField; 12] = [
        Self::CommercialCondition,
        Self::Company,
        Self::State,
        Self::City,
        Self::Neighborhood,
        Self::Region,
        Self::Customer,
        Self::Salesperson,
        Self::Team,
        Self::Product,
        Self::Brand,
        Self::ProductGroup,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::CommercialCondition => "commercial_condition",
            Self::Company => "company",
            Self::State => "state",
            Self::City => "city",
            Self::Neighborhood => "neighborhood",
            Self::Region => "region",
            Self::Customer => "customer",
            Self::Salesperson => "salesperson",
            Self::Team => "team",
            Self::Product => "product",
            Self::Brand => "brand",
            Self::ProductGroup => "product_group",
        }
    }

    pub fn rule(self, constraints: &PolicyConstraints) -> Option<&str> {
        let raw = match self {
            Self::CommercialCondition => &constraints.commercial_conditions,
            Self::Company => &constraints.companies,
            Self::State => &constraints.states,
            Self::City => &constraints.cities,
            Self::Neighborhood => &constraints.neighborhoods,
            Self::Region => &constraints.regions,
            Self::Customer => &constraints.customers,
            Self::Salesperson => &constraints.salespeople,
            Self::Team => &constraints.teams,
            Self::Product => &constraints.products,
            Self::Brand => &constraints.brands,
            Self::ProductGroup => &constraints.product_groups,
        };
        raw.as_deref()
    }

    pub fn context_value(self, context: &PolicyContext) -> Option<ContextValue> {
        let value = match self {
            Self::Company => return context.company(),
            Self::CommercialCondition => &context.commercial_condition_id,
            Self::State => &context.state_code,
            Self::City => &context.city_id,
            Self::Neighborhood => &context.neighborhood_id,
            Self::Region => &context.region_id,
            Self::Customer => &context.customer_id,
            Self::Salesperson => &context.salesperson_id,
            Self::Team => &context.team_id,
            Self::Product => &context.product_id,
            Self::Brand => &context.brand,
            Self::ProductGroup => &context.product_group,
        };
        value.clone().filter(ContextValue::is_present)
    }
}

impl std::fmt::Display for ConstraintField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    TenantMismatch { policy_tenant: TenantId, context_tenant: TenantId },
    MissingContextValue { field: ConstraintField },
    ValueNotAllowed { field: ConstraintField, value: String },
}

impl Rejection {
    pub fn reason(&self) -> String {
        match self {
            Self::TenantMismatch { policy_tenant, context_tenant } => {
                format!("policy tenant `{policy_tenant}` does not match context tenant `{context_tenant}`")
            }
            Self::MissingContextValue { field } => {
                format!("`{field}` is constrained but the context carries no value")
            }
            Self::ValueNotAllowed { field, value } => {
                format!("`{field}` value `{value}` is not in the allowed list")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchVerdict {
    Matched { score: Score },
    Rejected { rejection: Rejection },
}

/// One evaluated constraint, in evaluation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTrace {
    pub field: ConstraintField,
    pub rule: Option<String>,
    pub context_value: Option<String>,
    pub matched: bool,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMatch {
    pub verdict: MatchVerdict,
    pub trace: Vec<MatchTrace>,
}

impl PolicyMatch {
    pub fn score(&self) -> Option<Score> {
        match self.verdict {
            MatchVerdict::Matched { score } => Some(score),
            MatchVerdict::Rejected { .. } => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.verdict {
            MatchVerdict::Matched { .. } => None,
            MatchVerdict::Rejected { rejection } => Some(rejection),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection().is_some()
    }

    fn rejected(rejection: Rejection, trace: Vec<MatchTrace>) -> Self {
        Self { verdict: MatchVerdict::Rejected { rejection }, trace }
    }
}

pub trait PolicyScorer: Send + Sync {
    fn score(&self, policy: &CommercialPolicy, context: &PolicyContext) -> PolicyMatch;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SpecificityScorer;

impl PolicyScorer for SpecificityScorer {
    fn score(&self, policy: &CommercialPolicy, context: &PolicyContext) -> PolicyMatch {
        score_policy(policy, context)
    }
}

pub fn score_policy(policy: &CommercialPolicy, context: &PolicyContext) -> PolicyMatch {
    if let (Some(context_tenant), Some(policy_tenant)) = (context.tenant(), policy.tenant()) {
        if context_tenant != policy_tenant {
            return PolicyMatch::rejected(
                Rejection::TenantMismatch {
                    policy_tenant: policy_tenant.clone(),
                    context_tenant: context_tenant.clone(),
                },
                Vec::new(),
            );
        }
    }

    let mut trace = Vec::with_capacity(ConstraintField::EVALUATION_ORDER.len());
    let folded = ConstraintField::EVALUATION_ORDER.iter().try_fold(0_u32, |matched, field| {
        let (step, outcome) = match_field(*field, &policy.constraints, context);
        trace.push(step);
        outcome.map(|hit| matched + u32::from(hit))
    });

    match folded {
        Ok(matched) => PolicyMatch {
            verdict: MatchVerdict::Matched { score: Score::new(matched, policy.priority) },
            trace,
        },
        Err(rejection) => PolicyMatch::rejected(rejection, trace),
    }
}

/// Evaluates one constraint. `Ok(true)` counts toward the score, `Ok(false)` is
/// a wildcard pass.
fn match_field(
    field: ConstraintField,
    constraints: &PolicyConstraints,
    context: &PolicyContext,
) -> (MatchTrace, Result<bool, Rejection>) {
    let rule = field.rule(constraints).map(str::trim).filter(|rule| !rule.is_empty());
    let value = field.context_value(context);
    let mut step = MatchTrace {
        field,
        rule: rule.map(str::to_owned),
        context_value: value.as_ref().map(|value| value.as_str().to_owned()),
        matched: true,
        reason: String::new(),
    };

    let allowed = rule.map(allowed_tokens).unwrap_or_default();
    if allowed.is_empty() {
        step.reason = "wildcard".to_string();
        return (step, Ok(false));
    }

    let Some(value) = value else {
        step.matched = false;
        let rejection = Rejection::MissingContextValue { field };
        step.reason = rejection.reason();
        return (step, Err(rejection));
    };

    let normalized = value.normalized();
    if allowed.iter().any(|token| *token == normalized) {
        step.reason = format!("`{normalized}` is allowed");
        return (step, Ok(true));
    }

    step.matched = false;
    let rejection = Rejection::ValueNotAllowed { field, value: value.as_str().to_owned() };
    step.reason = rejection.reason();
    (step, Err(rejection))
}

fn allowed_tokens(rule: &str) -> Vec<String> {
    rule.split(',')
        .map(|token| token.trim().to_uppercase())
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{score_policy, ConstraintField, MatchVerdict, Rejection, Score};
    use crate::domain::{
        context::{ContextValue, PolicyContext, TenantId},
        policy::CommercialPolicy,
    };

    fn context() -> PolicyContext {
        PolicyContext {
            customer_id: Some(ContextValue::from(4_012_i64)),
            state_code: Some(ContextValue::from("MG")),
            city_id: Some(ContextValue::from(3_106_200_i64)),
            product_id: Some(ContextValue::from("SKU-9")),
            brand: Some(ContextValue::from("Acme")),
            ..PolicyContext::new("01")
        }
    }

    #[test]
    fn all_wildcard_policy_scores_zero() {
        let policy = CommercialPolicy::new("p-any", "Any");

        assert_eq!(score_policy(&policy, &context()).score(), Some(Score::ZERO));
        assert_eq!(score_policy(&policy, &PolicyContext::new("99")).score(), Some(Score::ZERO));
        assert_eq!(score_policy(&policy, &PolicyContext::default()).score(), Some(Score::ZERO));
    }

    #[test]
    fn tenant_mismatch_rejects_even_a_wildcard_policy() {
        let mut policy = CommercialPolicy::new("p-t1", "Tenant one");
        policy.tenant_id = Some(TenantId::from(1_i64));
        let context = context().with_tenant(2_i64);

        let result = score_policy(&policy, &context);
        assert!(matches!(result.rejection(), Some(Rejection::TenantMismatch { .. })));
        assert!(result.trace.is_empty(), "tenant cut happens before any field");
    }

    #[test]
    fn missing_tenant_on_either_side_does_not_reject() {
        let mut policy = CommercialPolicy::new("p-t1", "Tenant one");
        policy.tenant_id = Some(TenantId::from(1_i64));
        assert!(!score_policy(&policy, &context()).is_rejected());

        let policy = CommercialPolicy::new("p-shared", "Shared");
        assert!(!score_policy(&policy, &context().with_tenant(2_i64)).is_rejected());
    }

    #[test]
    fn blank_context_tenant_does_not_reject_scoped_policies() {
        let mut policy = CommercialPolicy::new("p-t1", "Tenant one");
        policy.tenant_id = Some(TenantId::from(1_i64));
        let mut context = context();
        context.tenant_id = Some(TenantId::from(""));

        assert_eq!(score_policy(&policy, &context).score(), Some(Score::ZERO));
    }

    #[test]
    fn matching_value_set_adds_one_per_field() {
        let mut policy = CommercialPolicy::new("p-1", "Minas");
        policy.constraints.states = Some(" mg , sp ".to_string());
        assert_eq!(score_policy(&policy, &context()).score(), Some(Score::new(1, 0)));

        policy.constraints.brands = Some("ACME".to_string());
        assert_eq!(score_policy(&policy, &context()).score(), Some(Score::new(2, 0)));

        policy.constraints.customers = Some("1,4012,77".to_string());
        assert_eq!(score_policy(&policy, &context()).score(), Some(Score::new(3, 0)));
    }

    #[test]
    fn narrowing_a_wildcard_that_still_matches_adds_exactly_one() {
        let mut policy = CommercialPolicy::new("p-1", "Minas");
        policy.priority = 7;
        let context = context();

        for field in ConstraintField::EVALUATION_ORDER {
            let before = score_policy(&policy, &context).score().expect("policy matches");
            let Some(value) = field.context_value(&context) else {
                continue;
            };
            set_rule(&mut policy, field, value.as_str());

            let after = score_policy(&policy, &context).score().expect("still matches");
            assert_eq!(after.value() - before.value(), Decimal::ONE, "field {field}");
        }
    }

    #[test]
    fn mismatching_value_rejects_and_stops_evaluation() {
        let mut policy = CommercialPolicy::new("p-1", "Sul");
        policy.constraints.states = Some("RS,SC,PR".to_string());
        policy.constraints.brands = Some("ACME".to_string());

        let result = score_policy(&policy, &context());
        assert_eq!(
            result.rejection(),
            Some(&Rejection::ValueNotAllowed {
                field: ConstraintField::State,
                value: "MG".to_string()
            })
        );
        let last = result.trace.last().expect("trace has the failing step");
        assert_eq!(last.field, ConstraintField::State);
        assert!(!last.matched);
        assert!(result.trace.iter().all(|step| step.field != ConstraintField::Brand));
    }

    #[test]
    fn constrained_field_without_context_value_rejects() {
        let mut policy = CommercialPolicy::new("p-1", "Team");
        policy.constraints.teams = Some("T1".to_string());

        let result = score_policy(&policy, &context());
        assert_eq!(
            result.rejection(),
            Some(&Rejection::MissingContextValue { field: ConstraintField::Team })
        );

        let mut blank = context();
        blank.team_id = Some(ContextValue::from("  "));
        assert!(score_policy(&policy, &blank).is_rejected());
    }

    #[test]
    fn numeric_zero_context_value_matches_a_zero_token() {
        let mut policy = CommercialPolicy::new("p-1", "Centro");
        policy.constraints.neighborhoods = Some("0,5,9".to_string());
        let mut context = context();
        context.neighborhood_id = Some(ContextValue::from(0_i64));

        assert_eq!(score_policy(&policy, &context).score(), Some(Score::new(1, 0)));
    }

    #[test]
    fn blank_or_comma_only_rules_are_wildcards() {
        let mut policy = CommercialPolicy::new("p-1", "Loose");
        policy.constraints.regions = Some("   ".to_string());
        policy.constraints.teams = Some(" , ,".to_string());

        assert_eq!(score_policy(&policy, &PolicyContext::new("01")).score(), Some(Score::ZERO));
    }

    #[test]
    fn priority_is_a_sub_unit_tie_break() {
        let mut policy = CommercialPolicy::new("p-1", "Priority");
        policy.priority = 50;
        let result = score_policy(&policy, &context());

        assert_eq!(result.verdict, MatchVerdict::Matched { score: Score::new(0, 50) });
        assert_eq!(result.score().map(|score| score.value()), Some(Decimal::new(5, 2)));
        assert_eq!(result.trace.len(), ConstraintField::EVALUATION_ORDER.len());
    }

    #[test]
    fn company_scope_uses_the_company_code() {
        let mut policy = CommercialPolicy::new("p-1", "Filial");
        policy.constraints.companies = Some("01,02".to_string());

        assert_eq!(score_policy(&policy, &context()).score(), Some(Score::new(1, 0)));
        assert!(score_policy(&policy, &PolicyContext::new("03")).is_rejected());
        assert!(matches!(
            score_policy(&policy, &PolicyContext::default()).rejection(),
            Some(Rejection::MissingContextValue { field: ConstraintField::Company })
        ));
    }

    fn set_rule(policy: &mut CommercialPolicy, field: ConstraintField, value: &str) {
        let constraints = &mut policy.constraints;
        let slot = match field {
            ConstraintField::CommercialCondition => &mut constraints.commercial_conditions,
            ConstraintField::Company => &mut constraints.companies,
            ConstraintField::State => &mut constraints.states,
            ConstraintField::City => &mut constraints.cities,
            ConstraintField::Neighborhood => &mut constraints.neighborhoods,
            ConstraintField::Region => &mut constraints.regions,
            ConstraintField::Customer => &mut constraints.customers,
            ConstraintField::Salesperson => &mut constraints.salespeople,
            ConstraintField::Team => &mut constraints.teams,
            ConstraintField::Product => &mut constraints.products,
            ConstraintField::Brand => &mut constraints.brands,
            ConstraintField::ProductGroup => &mut constraints.product_groups,
        };
        *slot = Some(format!("OTHER,{value}"));
    }
}
