//! Stormspotter Azure - Azure AD and ARM collection adapters
//!
//! Implements the collector side of the pipeline: credential providers for
//! the two auth modes (§4A, §6), shared authenticated-HTTP plumbing
//! (§4C), the AAD Enumerator (§4D), the ARM Enumerator (§4E), and the
//! RBAC Collector (§4F).
//!
//! ## Modules
//!
//! - [`cloud`] - national cloud endpoint resolution (§6)
//! - [`auth`] - `azcli`/`spn` credential providers (§4A, §6)
//! - [`http`] - shared authenticated-HTTP client and pagination helpers
//! - [`errors`] - the collector-side error taxonomy (§7)
//! - [`aad`] - the AAD Enumerator (§4D)
//! - [`arm`] - the ARM Enumerator (§4E)
//! - [`rbac`] - the RBAC Collector (§4F)
//! - [`certs`] - classic management-certificate XML parsing (§4E.e)

pub mod aad;
pub mod arm;
pub mod auth;
pub mod certs;
pub mod cloud;
pub mod errors;
pub mod http;
pub mod rbac;

pub use cloud::CloudEndpoints;
pub use errors::CollectError;
pub use http::AzureHttp;
