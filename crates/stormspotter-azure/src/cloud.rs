//! Azure cloud endpoint resolution (§6 "Cloud profile file").
//!
//! Resolves the four endpoint audiences every enumerator needs — the AD
//! authority used to fetch tokens, and the AAD Graph, ARM, and Microsoft
//! Graph resource audiences — either from one of the four well-known
//! national clouds or from a custom INI file.

use std::path::Path;

use stormspotter_core::config::CloudProfileName;

/// The resolved endpoint set for a cloud (§6, SPEC_FULL.md national-cloud
/// table resolving the original implementation's USGOV/AAD-Graph mixup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEndpoints {
    /// OAuth2 authority base, e.g. `https://login.microsoftonline.com`.
    pub ad_authority: String,
    /// Legacy Azure AD Graph resource audience, e.g. `https://graph.windows.net`.
    pub aad_graph_resource: String,
    /// ARM resource audience, e.g. `https://management.azure.com`.
    pub arm_resource: String,
    /// Microsoft Graph resource audience, e.g. `https://graph.microsoft.com`.
    pub ms_graph_resource: String,
    /// Classic service-management (pre-ARM) audience, used only for the
    /// optional management-certificate enumeration (§4E.e). Every
    /// well-known cloud defines one; a custom config may omit it.
    pub management_resource: Option<String>,
}

impl CloudEndpoints {
    fn public() -> Self {
        Self {
            ad_authority: "https://login.microsoftonline.com".into(),
            aad_graph_resource: "https://graph.windows.net".into(),
            arm_resource: "https://management.azure.com".into(),
            ms_graph_resource: "https://graph.microsoft.com".into(),
            management_resource: Some("https://management.core.windows.net".into()),
        }
    }

    fn german() -> Self {
        Self {
            ad_authority: "https://login.microsoftonline.de".into(),
            aad_graph_resource: "https://graph.cloudapi.de".into(),
            arm_resource: "https://management.microsoftazure.de".into(),
            ms_graph_resource: "https://graph.microsoft.de".into(),
            management_resource: Some("https://management.core.cloudapi.de".into()),
        }
    }

    fn china() -> Self {
        Self {
            ad_authority: "https://login.chinacloudapi.cn".into(),
            aad_graph_resource: "https://graph.chinacloudapi.cn".into(),
            arm_resource: "https://management.chinacloudapi.cn".into(),
            ms_graph_resource: "https://microsoftgraph.chinacloudapi.cn".into(),
            management_resource: Some("https://management.core.chinacloudapi.cn".into()),
        }
    }

    fn us_gov() -> Self {
        Self {
            ad_authority: "https://login.microsoftonline.us".into(),
            aad_graph_resource: "https://graph.windows.net".into(),
            arm_resource: "https://management.usgovcloudapi.net".into(),
            ms_graph_resource: "https://graph.microsoft.us".into(),
            management_resource: Some("https://management.core.usgovcloudapi.net".into()),
        }
    }

    /// Resolves the built-in endpoint set for a well-known cloud.
    #[must_use]
    pub fn for_profile(profile: CloudProfileName) -> Self {
        match profile {
            CloudProfileName::Public => Self::public(),
            CloudProfileName::German => Self::german(),
            CloudProfileName::China => Self::china(),
            CloudProfileName::UsGov => Self::us_gov(),
        }
    }

    /// Parses a custom-config INI file with an `[ENDPOINTS]` section
    /// (`Resource_Manager`, `AD`, `AD_Graph_ResourceId`, `MS_Graph`,
    /// `Management`) per §6. `Management` is optional; when absent,
    /// management-certificate enumeration (§4E.e) is skipped for this
    /// cloud.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed as INI, or is
    /// missing a required key.
    pub fn from_custom_config(path: &Path) -> anyhow::Result<Self> {
        let conf = ini::Ini::load_from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to parse cloud config {}: {}", path.display(), e))?;
        let endpoints = conf
            .section(Some("ENDPOINTS"))
            .ok_or_else(|| anyhow::anyhow!("{} has no [ENDPOINTS] section", path.display()))?;

        let required = |key: &str| -> anyhow::Result<String> {
            endpoints
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("[ENDPOINTS] is missing {key} in {}", path.display()))
        };

        Ok(Self {
            ad_authority: required("AD")?,
            aad_graph_resource: required("AD_Graph_ResourceId")?,
            arm_resource: required("Resource_Manager")?,
            ms_graph_resource: required("MS_Graph")?,
            management_resource: endpoints.get("Management").map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn public_cloud_uses_commercial_endpoints() {
        let endpoints = CloudEndpoints::for_profile(CloudProfileName::Public);
        assert_eq!(endpoints.arm_resource, "https://management.azure.com");
        assert_eq!(endpoints.ms_graph_resource, "https://graph.microsoft.com");
    }

    #[test]
    fn us_gov_does_not_reuse_public_ad_authority() {
        let endpoints = CloudEndpoints::for_profile(CloudProfileName::UsGov);
        assert_eq!(endpoints.ad_authority, "https://login.microsoftonline.us");
        assert_eq!(endpoints.arm_resource, "https://management.usgovcloudapi.net");
    }

    #[test]
    fn every_profile_has_distinct_arm_resource() {
        let profiles = [
            CloudProfileName::Public,
            CloudProfileName::German,
            CloudProfileName::China,
            CloudProfileName::UsGov,
        ];
        let arm_resources: std::collections::HashSet<_> = profiles
            .iter()
            .map(|p| CloudEndpoints::for_profile(*p).arm_resource)
            .collect();
        assert_eq!(arm_resources.len(), profiles.len());
    }

    #[test]
    fn custom_config_overrides_all_four_endpoints() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[ENDPOINTS]\nResource_Manager=https://arm.example.com\nAD=https://ad.example.com\nAD_Graph_ResourceId=https://aadgraph.example.com\nMS_Graph=https://msgraph.example.com\nManagement=https://mgmt.example.com\n"
        )
        .unwrap();

        let endpoints = CloudEndpoints::from_custom_config(file.path()).unwrap();
        assert_eq!(endpoints.arm_resource, "https://arm.example.com");
        assert_eq!(endpoints.ad_authority, "https://ad.example.com");
        assert_eq!(endpoints.aad_graph_resource, "https://aadgraph.example.com");
        assert_eq!(endpoints.ms_graph_resource, "https://msgraph.example.com");
    }

    #[test]
    fn custom_config_missing_section_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[SUFFIXES]\nStorage_Endpoint=core.windows.net\n").unwrap();
        assert!(CloudEndpoints::from_custom_config(file.path()).is_err());
    }
}
