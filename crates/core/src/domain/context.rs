use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawContextValue", into = "String")]
pub struct TenantId(pub String);

impl TenantId {
    /// Blank tenant text is treated like a missing tenant.
    pub fn is_present(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<i64> for TenantId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

impl From<RawContextValue> for TenantId {
    fn from(value: RawContextValue) -> Self {
        Self(ContextValue::from(value).0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single lookup dimension of a pricing decision.
///
/// Codes arrive from the ERP either as text or as integers; both are kept as
/// text. The integer `0` is a real code (neighborhood and region tables use it)
/// and is always present. Only blank text counts as absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawContextValue", into = "String")]
pub struct ContextValue(String);

impl ContextValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_present(&self) -> bool {
        !self.0.trim().is_empty()
    }

    pub fn normalized(&self) -> String {
        self.0.trim().to_uppercase()
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<ContextValue> for String {
    fn from(value: ContextValue) -> Self {
        value.0
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire form of a code: JSON and TOML sources mix text and integer codes.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawContextValue {
    Text(String),
    Integer(i64),
}

impl From<RawContextValue> for ContextValue {
    fn from(value: RawContextValue) -> Self {
        match value {
            RawContextValue::Text(text) => Self(text),
            RawContextValue::Integer(number) => Self(number.to_string()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyContext {
    pub tenant_id: Option<TenantId>,
    pub company_code: String,
    pub customer_id: Option<ContextValue>,
    pub state_code: Option<ContextValue>,
    pub city_id: Option<ContextValue>,
    pub neighborhood_id: Option<ContextValue>,
    pub region_id: Option<ContextValue>,
    pub product_id: Option<ContextValue>,
    pub brand: Option<ContextValue>,
    pub product_group: Option<ContextValue>,
    pub salesperson_id: Option<ContextValue>,
    pub team_id: Option<ContextValue>,
    pub commercial_condition_id: Option<ContextValue>,
}

impl PolicyContext {
    pub fn new(company_code: impl Into<String>) -> Self {
        Self { company_code: company_code.into(), ..Self::default() }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<TenantId>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Tenant scope of the sale, if any. A blank tenant id is absent.
    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref().filter(|tenant| tenant.is_present())
    }

    /// Company scope as a matchable value. A blank company code is absent.
    pub fn company(&self) -> Option<ContextValue> {
        let company = ContextValue::new(self.company_code.clone());
        company.is_present().then_some(company)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContextValue, PolicyContext, TenantId};

    #[test]
    fn zero_is_a_present_value() {
        assert!(ContextValue::from(0_i64).is_present());
        assert_eq!(ContextValue::from(0_i64).normalized(), "0");
    }

    #[test]
    fn blank_text_is_absent() {
        assert!(!ContextValue::from("").is_present());
        assert!(!ContextValue::from("   ").is_present());
    }

    #[test]
    fn context_deserializes_numeric_and_text_codes() {
        let context: PolicyContext = serde_json::from_str(
            r#"{"tenant_id":"7","company_code":"01","neighborhood_id":0,"state_code":"mg"}"#,
        )
        .expect("context json");

        assert_eq!(context.neighborhood_id, Some(ContextValue::from(0_i64)));
        assert_eq!(context.state_code.as_ref().map(ContextValue::normalized), Some("MG".into()));
        assert!(context.city_id.is_none());
        assert_eq!(context.company(), Some(ContextValue::from("01")));
    }

    #[test]
    fn blank_tenant_is_absent() {
        let context: PolicyContext =
            serde_json::from_str(r#"{"tenant_id":"  ","company_code":"01"}"#).expect("context json");
        assert!(context.tenant().is_none());

        let context = PolicyContext::new("01").with_tenant(0_i64);
        assert_eq!(context.tenant(), Some(&TenantId::from("0")));
    }
}
