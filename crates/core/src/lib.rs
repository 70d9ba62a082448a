pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;

pub use catalog::{CatalogError, PolicyCatalog};
pub use domain::context::{ContextValue, PolicyContext, TenantId};
pub use domain::policy::{CommercialPolicy, PolicyConstraints, PolicyId};
pub use domain::sale_line::SaleLineItem;
pub use engine::resolver::{
    resolve_all, resolve_best, AllApplicablePolicyResolver, BestPolicyResolver, PolicyResolver,
    RankedPolicy, SpecificityResolver,
};
pub use engine::scoring::{
    score_policy, ConstraintField, MatchTrace, MatchVerdict, PolicyMatch, PolicyScorer, Rejection,
    Score, SpecificityScorer,
};
pub use engine::violation::{
    validate_line, LineValidator, Violation, ViolationFinding, ViolationValidator,
};
pub use engine::{
    ApprovalRoute, DeterministicPricingRuntime, LineReview, OrderReview, PricingDecision,
    PricingDecisionRuntime,
};
pub use errors::ApplicationError;

pub use rust_decimal;
