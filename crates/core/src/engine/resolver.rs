use serde::Serialize;
use tracing::debug;

use crate::domain::{context::PolicyContext, policy::CommercialPolicy};
use crate::engine::scoring::{MatchTrace, PolicyScorer, Score, SpecificityScorer};

/// An active policy that survived scoring, with the evidence for its score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedPolicy<'a> {
    pub policy: &'a CommercialPolicy,
    pub score: Score,
    pub trace: Vec<MatchTrace>,
}

pub trait PolicyResolver: Send + Sync {
    fn resolve_best<'a>(
        &self,
        policies: &'a [CommercialPolicy],
        context: &PolicyContext,
    ) -> Option<RankedPolicy<'a>>;

    fn resolve_all<'a>(
        &self,
        policies: &'a [CommercialPolicy],
        context: &PolicyContext,
    ) -> Vec<RankedPolicy<'a>>;
}

/// Picks the single most specific active policy.
///
/// Only non-negative scores are applicable, so a negative priority can keep an
/// otherwise matching policy out of both resolvers.
/// Equal scores keep the first policy in input order; callers that need a
/// different tie-break should order the candidate list before resolving.
#[derive(Clone, Debug, Default)]
pub struct BestPolicyResolver<S = SpecificityScorer> {
    scorer: S,
}

impl<S: PolicyScorer> BestPolicyResolver<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn resolve<'a>(
        &self,
        policies: &'a [CommercialPolicy],
        context: &PolicyContext,
    ) -> Option<&'a CommercialPolicy> {
        self.resolve_ranked(policies, context).map(|ranked| ranked.policy)
    }

    pub fn resolve_ranked<'a>(
        &self,
        policies: &'a [CommercialPolicy],
        context: &PolicyContext,
    ) -> Option<RankedPolicy<'a>> {
        let best = candidates(&self.scorer, policies, context).fold(
            None::<RankedPolicy<'a>>,
            |best, candidate| match best {
                Some(current) if candidate.score <= current.score => Some(current),
                _ => Some(candidate),
            },
        );

        match &best {
            Some(winner) => debug!(
                event_name = "engine.policy.resolved",
                policy_id = %winner.policy.id,
                score = %winner.score,
                candidates = policies.len(),
                "most specific policy selected"
            ),
            None => debug!(
                event_name = "engine.policy.unresolved",
                candidates = policies.len(),
                "no active policy applies to context"
            ),
        }

        best
    }
}

/// Returns every applicable active policy, most specific first.
#[derive(Clone, Debug, Default)]
pub struct AllApplicablePolicyResolver<S = SpecificityScorer> {
    scorer: S,
}

impl<S: PolicyScorer> AllApplicablePolicyResolver<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn resolve<'a>(
        &self,
        policies: &'a [CommercialPolicy],
        context: &PolicyContext,
    ) -> Vec<RankedPolicy<'a>> {
        let mut ranked: Vec<_> = candidates(&self.scorer, policies, context).collect();
        // stable: equal scores keep input order
        ranked.sort_by(|left, right| right.score.cmp(&left.score));

        debug!(
            event_name = "engine.policy.ranked",
            candidates = policies.len(),
            applicable = ranked.len(),
            "applicable policies ranked"
        );

        ranked
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpecificityResolver<S = SpecificityScorer> {
    best: BestPolicyResolver<S>,
    all: AllApplicablePolicyResolver<S>,
}

impl<S: PolicyScorer + Clone> SpecificityResolver<S> {
    pub fn new(scorer: S) -> Self {
        Self {
            best: BestPolicyResolver::new(scorer.clone()),
            all: AllApplicablePolicyResolver::new(scorer),
        }
    }
}

impl<S: PolicyScorer> PolicyResolver for SpecificityResolver<S> {
    fn resolve_best<'a>(
        &self,
        policies: &'a [CommercialPolicy],
        context: &PolicyContext,
    ) -> Option<RankedPolicy<'a>> {
        self.best.resolve_ranked(policies, context)
    }

    fn resolve_all<'a>(
        &self,
        policies: &'a [CommercialPolicy],
        context: &PolicyContext,
    ) -> Vec<RankedPolicy<'a>> {
        self.all.resolve(policies, context)
    }
}

pub fn resolve_best<'a>(
    policies: &'a [CommercialPolicy],
    context: &PolicyContext,
) -> Option<&'a CommercialPolicy> {
    BestPolicyResolver::new(SpecificityScorer).resolve(policies, context)
}

pub fn resolve_all<'a>(
    policies: &'a [CommercialPolicy],
    context: &PolicyContext,
) -> Vec<RankedPolicy<'a>> {
    AllApplicablePolicyResolver::new(SpecificityScorer).resolve(policies, context)
}

fn candidates<'a, 's, S: PolicyScorer>(
    scorer: &'s S,
    policies: &'a [CommercialPolicy],
    context: &'s PolicyContext,
) -> impl Iterator<Item = RankedPolicy<'a>> + 's
where
    'a: 's,
{
    policies.iter().filter(|policy| policy.active).filter_map(move |policy| {
        let matched = scorer.score(policy, context);
        match matched.score() {
            Some(score) if score >= Score::ZERO => {
                Some(RankedPolicy { policy, score, trace: matched.trace })
            }
            Some(score) => {
                debug!(
                    event_name = "engine.policy.below_zero",
                    policy_id = %policy.id,
                    score = %score,
                    "policy matches but scores below zero"
                );
                None
            }
            None => {
                if let Some(rejection) = matched.rejection() {
                    debug!(
                        event_name = "engine.policy.rejected",
                        policy_id = %policy.id,
                        reason = %rejection.reason(),
                        "policy does not apply to context"
                    );
                }
                None
            }
        }
    })
}
