//! ARM api-version negotiation (§4E, §7 `ApiVersionUnsupported`, §8 Testable
//! Property 6, Scenario S5).
//!
//! When a resource's provider-inventory api version is rejected, ARM
//! returns an error body naming the versions it does accept. This module
//! extracts that list and picks the next one to try.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::ApiVersion;

fn suggested_versions_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"supported api-versions are '([^']*)'").expect("static regex is valid")
    })
}

/// Parses the server-suggested api-version list out of an ARM error
/// message such as:
///
/// `"No registered resource provider found for location '...'. ... The
/// supported api-versions are '2019-03-01, 2020-06-01'. The supported
/// locations are ..."`
///
/// Malformed versions are skipped rather than failing the whole parse,
/// since a partially-useful suggestion list is better than none.
#[must_use]
pub fn parse_suggested_versions(message: &str) -> Vec<ApiVersion> {
    let Some(captures) = suggested_versions_regex().captures(message) else {
        return Vec::new();
    };
    captures[1]
        .split(',')
        .filter_map(|v| ApiVersion::new(v.trim()).ok())
        .collect()
}

/// Picks the next api version to retry with: the latest entry in
/// `suggested` that is not already in `tried`.
///
/// Versions are compared as plain strings, which is sufficient since ARM
/// api versions are `YYYY-MM-DD[-suffix]` and sort correctly in that form.
/// Returns `None` once every suggested version has been tried (§4E: "If
/// none remain, skip the resource with a warning").
#[must_use]
pub fn negotiate_api_version(tried: &[ApiVersion], suggested: &[ApiVersion]) -> Option<ApiVersion> {
    suggested
        .iter()
        .filter(|v| !tried.contains(v))
        .max_by(|a, b| a.as_str().cmp(b.as_str()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_suggestion_list() {
        let message = "No registered resource provider found for location 'eastus'. \
             The supported api-versions are '2019-03-01, 2020-06-01'. \
             The supported locations are 'eastus, westus'.";
        let versions = parse_suggested_versions(message);
        assert_eq!(
            versions,
            vec![
                ApiVersion::new("2019-03-01").unwrap(),
                ApiVersion::new("2020-06-01").unwrap(),
            ]
        );
    }

    #[test]
    fn returns_empty_when_message_has_no_suggestion_list() {
        assert!(parse_suggested_versions("totally unrelated error").is_empty());
    }

    #[test]
    fn negotiates_latest_untried_version() {
        let tried = vec![ApiVersion::new("2018-02-14").unwrap()];
        let suggested = vec![
            ApiVersion::new("2019-03-01").unwrap(),
            ApiVersion::new("2020-06-01").unwrap(),
        ];
        assert_eq!(
            negotiate_api_version(&tried, &suggested),
            Some(ApiVersion::new("2020-06-01").unwrap())
        );
    }

    #[test]
    fn never_retries_an_already_tried_version() {
        let tried = vec![
            ApiVersion::new("2019-03-01").unwrap(),
            ApiVersion::new("2020-06-01").unwrap(),
        ];
        let suggested = tried.clone();
        assert_eq!(negotiate_api_version(&tried, &suggested), None);
    }

    #[test]
    fn scenario_s5_end_to_end() {
        let message = "No registered resource provider found for location 'eastus'. \
             The supported api-versions are '2019-03-01, 2020-06-01'. \
             The supported locations are 'eastus'.";
        let suggested = parse_suggested_versions(message);
        let tried = vec![ApiVersion::new("2018-02-14").unwrap()];
        let retry = negotiate_api_version(&tried, &suggested).unwrap();
        assert_eq!(retry.as_str(), "2020-06-01");
    }
}
