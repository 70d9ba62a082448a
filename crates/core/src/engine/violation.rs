use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{policy::CommercialPolicy, sale_line::SaleLineItem};

pub fn default_markup_tolerance_pct() -> Decimal {
    Decimal::new(1, 2)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationFinding {
    DiscountAboveCeiling {
        actual_pct: Decimal,
        allowed_pct: Decimal,
    },
    /// `actual_pct` is `None` when a zero base price is marked up.
    MarkupAboveCeiling {
        actual_pct: Option<Decimal>,
        allowed_pct: Decimal,
    },
}

impl ViolationFinding {
    pub fn reason(&self, policy_name: &str) -> String {
        match self {
            Self::DiscountAboveCeiling { actual_pct, allowed_pct } => format!(
                "discount of {}% exceeds the {}% allowed by policy `{policy_name}`",
                display_pct(*actual_pct),
                display_pct(*allowed_pct)
            ),
            Self::MarkupAboveCeiling { actual_pct: Some(actual_pct), allowed_pct } => format!(
                "markup of {}% exceeds the {}% allowed by policy `{policy_name}`",
                display_pct(actual_pct.round_dp(2)),
                display_pct(*allowed_pct)
            ),
            Self::MarkupAboveCeiling { actual_pct: None, allowed_pct } => format!(
                "markup over a zero base price exceeds the {}% allowed by policy `{policy_name}`",
                display_pct(*allowed_pct)
            ),
        }
    }
}

/// Advisory outcome of checking one line against its governing policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub violated: bool,
    pub reasons: Vec<String>,
    pub findings: Vec<ViolationFinding>,
}

impl Violation {
    pub fn none() -> Self {
        Self::default()
    }

    fn record(&mut self, finding: ViolationFinding, policy_name: &str) {
        self.violated = true;
        self.reasons.push(finding.reason(policy_name));
        self.findings.push(finding);
    }
}

pub trait LineValidator: Send + Sync {
    fn validate(&self, policy: Option<&CommercialPolicy>, item: &SaleLineItem) -> Violation;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViolationValidator {
    markup_tolerance_pct: Decimal,
}

impl Default for ViolationValidator {
    fn default() -> Self {
        Self { markup_tolerance_pct: default_markup_tolerance_pct() }
    }
}

impl ViolationValidator {
    pub fn new(markup_tolerance_pct: Decimal) -> Self {
        Self { markup_tolerance_pct }
    }

    pub fn markup_tolerance_pct(&self) -> Decimal {
        self.markup_tolerance_pct
    }
}

impl LineValidator for ViolationValidator {
    fn validate(&self, policy: Option<&CommercialPolicy>, item: &SaleLineItem) -> Violation {
        let Some(policy) = policy else {
            return Violation::none();
        };

        let mut violation = Violation::none();

        if let Some(allowed_pct) = policy.max_discount_pct {
            if item.discount_pct > allowed_pct {
                violation.record(
                    ViolationFinding::DiscountAboveCeiling {
                        actual_pct: item.discount_pct,
                        allowed_pct,
                    },
                    &policy.name,
                );
            }
        }

        if let Some(allowed_pct) = policy.max_markup_pct {
            if item.has_markup() {
                let actual_pct = item.markup_pct();
                let exceeded = actual_pct
                    .map(|actual| actual > allowed_pct + self.markup_tolerance_pct)
                    .unwrap_or(true);
                if exceeded {
                    violation.record(
                        ViolationFinding::MarkupAboveCeiling { actual_pct, allowed_pct },
                        &policy.name,
                    );
                }
            }
        }

        violation
    }
}

pub fn validate_line(policy: Option<&CommercialPolicy>, item: &SaleLineItem) -> Violation {
    ViolationValidator::default().validate(policy, item)
}

fn display_pct(value: Decimal) -> Decimal {
    value.normalize()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{validate_line, LineValidator, ViolationFinding, ViolationValidator};
    use crate::domain::{policy::CommercialPolicy, sale_line::SaleLineItem};

    fn norte() -> CommercialPolicy {
        let mut policy = CommercialPolicy::new("p-norte", "Norte");
        policy.max_discount_pct = Some(Decimal::new(10, 0));
        policy.max_markup_pct = Some(Decimal::new(15, 0));
        policy
    }

    fn line(discount_pct: Decimal, base_price: i64, final_price: Decimal) -> SaleLineItem {
        SaleLineItem::new(Decimal::ONE, discount_pct, Decimal::new(base_price, 0), final_price)
    }

    #[test]
    fn no_policy_means_no_violation() {
        let item = line(Decimal::new(90, 0), 100, Decimal::new(500, 0));
        let result = validate_line(None, &item);

        assert!(!result.violated);
        assert!(result.reasons.is_empty());
        assert!(result.findings.is_empty());
    }

    #[test]
    fn discount_above_ceiling_cites_actual_allowed_and_policy() {
        let item = line(Decimal::new(12, 0), 100, Decimal::new(88, 0));
        let result = validate_line(Some(&norte()), &item);

        assert!(result.violated);
        assert_eq!(result.reasons.len(), 1);
        let reason = &result.reasons[0];
        assert!(reason.contains("12%"), "{reason}");
        assert!(reason.contains("10%"), "{reason}");
        assert!(reason.contains("Norte"), "{reason}");
    }

    #[test]
    fn discount_boundary_is_inclusive() {
        let at_ceiling = line(Decimal::new(1000, 2), 100, Decimal::new(90, 0));
        assert!(!validate_line(Some(&norte()), &at_ceiling).violated);

        let just_above = line(Decimal::new(1001, 2), 100, Decimal::new(90, 0));
        assert!(validate_line(Some(&norte()), &just_above).violated);
    }

    #[test]
    fn markup_within_tolerance_is_accepted() {
        let at_ceiling = line(Decimal::ZERO, 100, Decimal::new(115, 0));
        assert!(!validate_line(Some(&norte()), &at_ceiling).violated);

        let within_epsilon = line(Decimal::ZERO, 100, Decimal::new(115_01, 2));
        assert!(!validate_line(Some(&norte()), &within_epsilon).violated);

        let beyond_epsilon = line(Decimal::ZERO, 100, Decimal::new(115_02, 2));
        let result = validate_line(Some(&norte()), &beyond_epsilon);
        assert!(result.violated);
        assert!(result.reasons[0].contains("15.02%"), "{}", result.reasons[0]);
        assert!(result.reasons[0].contains("Norte"));
    }

    #[test]
    fn markup_never_fires_when_final_price_is_not_above_base() {
        let mut strict = norte();
        strict.max_markup_pct = Some(Decimal::ZERO);

        for final_price in [Decimal::new(100, 0), Decimal::new(60, 0), Decimal::ZERO] {
            let item = line(Decimal::ZERO, 100, final_price);
            assert!(!validate_line(Some(&strict), &item).violated);
        }
    }

    #[test]
    fn discount_and_markup_violations_accumulate() {
        let item = line(Decimal::new(20, 0), 100, Decimal::new(130, 0));
        let result = validate_line(Some(&norte()), &item);

        assert!(result.violated);
        assert_eq!(result.reasons.len(), 2);
        assert!(matches!(result.findings[0], ViolationFinding::DiscountAboveCeiling { .. }));
        assert!(matches!(result.findings[1], ViolationFinding::MarkupAboveCeiling { .. }));
    }

    #[test]
    fn absent_ceilings_are_unrestricted() {
        let open = CommercialPolicy::new("p-open", "Open");
        let item = line(Decimal::new(80, 0), 100, Decimal::new(400, 0));
        assert!(!validate_line(Some(&open), &item).violated);
    }

    #[test]
    fn zero_base_price_with_positive_final_price_exceeds_markup_ceiling() {
        let item = line(Decimal::ZERO, 0, Decimal::new(10, 0));
        let result = validate_line(Some(&norte()), &item);

        assert!(result.violated);
        assert_eq!(
            result.findings,
            vec![ViolationFinding::MarkupAboveCeiling {
                actual_pct: None,
                allowed_pct: Decimal::new(15, 0)
            }]
        );
    }

    #[test]
    fn negative_base_price_markup_stays_under_ceiling() {
        let mut strict = norte();
        strict.max_markup_pct = Some(Decimal::ZERO);
        let item = line(Decimal::ZERO, -50, Decimal::new(10, 0));

        assert!(!validate_line(Some(&strict), &item).violated);
    }

    #[test]
    fn custom_tolerance_widens_markup_ceiling() {
        let validator = ViolationValidator::new(Decimal::ONE);
        let item = line(Decimal::ZERO, 100, Decimal::new(1159, 1));

        assert!(!validator.validate(Some(&norte()), &item).violated);
        assert!(validate_line(Some(&norte()), &item).violated);
    }
}
