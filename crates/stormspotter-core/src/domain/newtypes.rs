//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for the identifiers and
//! values that flow through the collector and ingestor. Each newtype
//! ensures data validity (and canonical form, e.g. lowercasing) at
//! construction time rather than leaving it to call sites.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Principal and resource identity (§3 DATA MODEL)
// ============================================================================

/// A stable AAD principal identifier (user, group, service principal, application, role).
///
/// Stored lowercase per §3: "for AAD, the object's `objectId` or `id`
/// (UUID, case-insensitive, stored lowercase)".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Creates a new `PrincipalId`, lowercasing it for case-insensitive identity.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidId` if the value is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidId(
                "principal id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id.to_lowercase()))
    }

    /// Returns the canonical (lowercase) string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PrincipalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PrincipalId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PrincipalId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PrincipalId> for String {
    fn from(id: PrincipalId) -> Self {
        id.0
    }
}

/// A fully-qualified ARM resource path, e.g.
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}`.
///
/// Stored lowercase per §3 ("lowercased before use as graph key"). Exposes
/// the resource-group and subscription prefixes used to synthesize the
/// default `Contains` edges in §4H.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a new `ResourceId` from a raw ARM `id` field.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidResourcePath` if the value does not
    /// start with `/subscriptions/`.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let lowered = id.to_lowercase();
        if !lowered.starts_with("/subscriptions/") {
            return Err(DomainError::InvalidResourcePath(id));
        }
        Ok(Self(lowered))
    }

    /// Returns the canonical (lowercase) resource path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource-group-scoped id prefix: everything before `/providers`.
    ///
    /// `None` for resources that are not nested under a resource group
    /// (subscriptions, resource groups, tenants themselves never reach
    /// this type).
    #[must_use]
    pub fn resource_group_scope(&self) -> Option<&str> {
        self.0.split("/providers").next().filter(|p| *p != self.0)
    }

    /// The subscription-scoped id prefix: everything before `/resourcegroups`.
    #[must_use]
    pub fn subscription_scope(&self) -> Option<&str> {
        self.0
            .split("/resourcegroups")
            .next()
            .filter(|p| *p != self.0)
    }

    /// Extracts the subscription id component, if present.
    #[must_use]
    pub fn subscription_id(&self) -> Option<&str> {
        self.0
            .strip_prefix("/subscriptions/")
            .and_then(|rest| rest.split('/').next())
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// An AAD tenant identifier (GUID, stored lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new `TenantId`.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidId` if the value is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidId(
                "tenant id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id.to_lowercase()))
    }

    /// Returns the canonical (lowercase) string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// An Azure subscription identifier (GUID, stored lowercase).
///
/// Kept distinct from `TenantId` even though both wrap a GUID string, since
/// mixing the two up would misfile a record store under the wrong archive
/// member (§6 archive layout names files by subscription id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Creates a new `SubscriptionId`.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidId` if the value is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidId(
                "subscription id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id.to_lowercase()))
    }

    /// Returns the canonical (lowercase) string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SubscriptionId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SubscriptionId> for String {
    fn from(id: SubscriptionId) -> Self {
        id.0
    }
}

// ============================================================================
// Relation name (closed vocabulary, §3 / §4H / §4I)
// ============================================================================

/// A relationship type drawn from the closed vocabulary in §3, or a
/// dynamically-derived RBAC role name (§4I: "relation name is the role
/// name with whitespace removed").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationName {
    Contains,
    MemberOf,
    Owns,
    HasAccessPolicies,
    AttachedTo,
    AssociatedTo,
    Exposes,
    HasConfig,
    Is,
    Manages,
    Trusts,
    Authenticates,
    ConnectedTo,
    RepresentedBy,
    HasRbac,
    HasRole,
    /// An RBAC role name, with whitespace stripped (§4I, §9 Open Question 1).
    Role(String),
}

impl RelationName {
    /// Builds the RBAC role-derived relation name by stripping whitespace.
    ///
    /// Role names that collide after stripping (e.g. "KeyVaultAdministrator"
    /// vs "Key Vault Administrator") are intentionally allowed to merge;
    /// see SPEC_FULL.md §9 Open Question 1 for the rationale this preserves.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRelationName` if stripping whitespace
    /// leaves an empty string.
    pub fn from_role_name(role_name: &str) -> Result<Self, DomainError> {
        let stripped: String = role_name.chars().filter(|c| !c.is_whitespace()).collect();
        if stripped.is_empty() {
            return Err(DomainError::InvalidRelationName(role_name.to_string()));
        }
        Ok(Self::Role(stripped))
    }

    /// Returns the Cypher relationship-type token for this relation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Contains => "Contains",
            Self::MemberOf => "MemberOf",
            Self::Owns => "Owns",
            Self::HasAccessPolicies => "HasAccessPolicies",
            Self::AttachedTo => "AttachedTo",
            Self::AssociatedTo => "AssociatedTo",
            Self::Exposes => "Exposes",
            Self::HasConfig => "HasConfig",
            Self::Is => "Is",
            Self::Manages => "Manages",
            Self::Trusts => "Trusts",
            Self::Authenticates => "Authenticates",
            Self::ConnectedTo => "ConnectedTo",
            Self::RepresentedBy => "RepresentedBy",
            Self::HasRbac => "HasRbac",
            Self::HasRole => "HasRole",
            Self::Role(name) => name.as_str(),
        }
    }
}

impl Display for RelationName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ARM api version (§4E)
// ============================================================================

/// An ARM `api-version` query value, e.g. `2020-06-01` or `2018-02-14-preview`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion(String);

impl ApiVersion {
    /// Creates a new `ApiVersion`.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidApiVersion` if the value is empty or
    /// does not start with a 4-digit year.
    pub fn new(version: impl Into<String>) -> Result<Self, DomainError> {
        let version = version.into();
        let year_prefix_ok = version
            .split('-')
            .next()
            .is_some_and(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()));
        if version.is_empty() || !year_prefix_ok {
            return Err(DomainError::InvalidApiVersion(version));
        }
        Ok(Self(version))
    }

    /// Returns the raw api-version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ApiVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ApiVersion> for String {
    fn from(version: ApiVersion) -> Self {
        version.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod principal_id_tests {
        use super::*;

        #[test]
        fn lowercases_on_construction() {
            let id = PrincipalId::new("ABC-123-DEF").unwrap();
            assert_eq!(id.as_str(), "abc-123-def");
        }

        #[test]
        fn case_insensitive_identity() {
            let a = PrincipalId::new("Object-Id").unwrap();
            let b = PrincipalId::new("object-id").unwrap();
            assert_eq!(a, b);
        }

        #[test]
        fn empty_fails() {
            assert!(PrincipalId::new("").is_err());
            assert!(PrincipalId::new("   ").is_err());
        }
    }

    mod resource_id_tests {
        use super::*;

        #[test]
        fn parses_resource_group_and_subscription_scope() {
            let id = ResourceId::new(
                "/subscriptions/S1/resourceGroups/RG/providers/Microsoft.KeyVault/vaults/V",
            )
            .unwrap();
            assert_eq!(
                id.resource_group_scope(),
                Some("/subscriptions/s1/resourcegroups/rg")
            );
            assert_eq!(id.subscription_scope(), Some("/subscriptions/s1"));
            assert_eq!(id.subscription_id(), Some("s1"));
        }

        #[test]
        fn resource_group_itself_has_no_providers_scope() {
            let id = ResourceId::new("/subscriptions/S1/resourceGroups/RG").unwrap();
            assert_eq!(id.resource_group_scope(), None);
        }

        #[test]
        fn rejects_non_arm_path() {
            assert!(ResourceId::new("not-a-resource-path").is_err());
        }

        #[test]
        fn lowercases_for_graph_key() {
            let id = ResourceId::new("/Subscriptions/ABC/ResourceGroups/RG").unwrap();
            assert_eq!(id.as_str(), "/subscriptions/abc/resourcegroups/rg");
        }
    }

    mod relation_name_tests {
        use super::*;

        #[test]
        fn strips_whitespace_from_role_names() {
            let r = RelationName::from_role_name("Key Vault Administrator").unwrap();
            assert_eq!(r.as_str(), "KeyVaultAdministrator");
        }

        #[test]
        fn colliding_role_names_merge_after_stripping() {
            let a = RelationName::from_role_name("KeyVaultAdministrator").unwrap();
            let b = RelationName::from_role_name("Key Vault Administrator").unwrap();
            assert_eq!(a, b);
        }

        #[test]
        fn whitespace_only_role_name_fails() {
            assert!(RelationName::from_role_name("   ").is_err());
        }

        #[test]
        fn builtin_relations_render_exact_tokens() {
            assert_eq!(RelationName::Contains.as_str(), "Contains");
            assert_eq!(RelationName::HasAccessPolicies.as_str(), "HasAccessPolicies");
        }
    }

    mod api_version_tests {
        use super::*;

        #[test]
        fn accepts_year_prefixed_versions() {
            assert!(ApiVersion::new("2020-06-01").is_ok());
            assert!(ApiVersion::new("2018-02-14-preview").is_ok());
        }

        #[test]
        fn rejects_non_year_prefixed_versions() {
            assert!(ApiVersion::new("latest").is_err());
            assert!(ApiVersion::new("").is_err());
        }
    }
}
