use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::context::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyId(pub String);

impl std::fmt::Display for PolicyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scope constraints of a commercial policy.
///
/// Each field holds the raw comma-separated value list as stored by the back
/// office. `None` or blank text is a wildcard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConstraints {
    pub commercial_conditions: Option<String>,
    pub companies: Option<String>,
    pub states: Option<String>,
    pub cities: Option<String>,
    pub neighborhoods: Option<String>,
    pub regions: Option<String>,
    pub customers: Option<String>,
    pub salespeople: Option<String>,
    pub teams: Option<String>,
    pub products: Option<String>,
    pub brands: Option<String>,
    pub product_groups: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialPolicy {
    pub id: PolicyId,
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub constraints: PolicyConstraints,
    #[serde(default)]
    pub price_table_ref: Option<String>,
    #[serde(default)]
    pub max_discount_pct: Option<Decimal>,
    #[serde(default)]
    pub max_markup_pct: Option<Decimal>,
}

fn default_active() -> bool {
    true
}

impl CommercialPolicy {
    /// An active, unscoped policy with no ceilings. Matches every context with score 0.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PolicyId(id.into()),
            tenant_id: None,
            name: name.into(),
            active: true,
            priority: 0,
            constraints: PolicyConstraints::default(),
            price_table_ref: None,
            max_discount_pct: None,
            max_markup_pct: None,
        }
    }

    /// Owning tenant. A blank tenant id leaves the policy unscoped.
    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref().filter(|tenant| tenant.is_present())
    }

    pub fn belongs_to_tenant(&self, tenant_id: &TenantId) -> bool {
        if !tenant_id.is_present() {
            return true;
        }
        self.tenant().map(|own| own == tenant_id).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::CommercialPolicy;
    use crate::domain::context::TenantId;

    #[test]
    fn policy_defaults_fill_in_missing_fields() {
        let policy: CommercialPolicy = serde_json::from_str(
            r#"{"id":"p-1","name":"Norte","constraints":{"states":"MG,SP"},"max_discount_pct":"10"}"#,
        )
        .expect("policy json");

        assert!(policy.active);
        assert_eq!(policy.priority, 0);
        assert_eq!(policy.constraints.states.as_deref(), Some("MG,SP"));
        assert!(policy.constraints.cities.is_none());
        assert_eq!(policy.max_discount_pct, Some(Decimal::new(10, 0)));
        assert!(policy.max_markup_pct.is_none());
    }

    #[test]
    fn unscoped_policy_belongs_to_every_tenant() {
        let mut policy = CommercialPolicy::new("p-1", "Base");
        assert!(policy.belongs_to_tenant(&TenantId::from("1")));

        policy.tenant_id = Some(TenantId::from("2"));
        assert!(!policy.belongs_to_tenant(&TenantId::from("1")));
        assert!(policy.belongs_to_tenant(&TenantId::from("2")));
    }

    #[test]
    fn blank_policy_tenant_is_unscoped() {
        let mut policy = CommercialPolicy::new("p-1", "Base");
        policy.tenant_id = Some(TenantId::from(""));

        assert!(policy.tenant().is_none());
        assert!(policy.belongs_to_tenant(&TenantId::from("1")));

        policy.tenant_id = Some(TenantId::from("2"));
        assert!(policy.belongs_to_tenant(&TenantId::from(" ")), "blank tenant sees everything");
    }
}
