//! Custom request extractors.

mod client_info;
mod tenant;
mod validated_json;

pub use client_info::ClientInfo;
pub use tenant::{church_domain_from_host, TenantHost};
pub use validated_json::ValidatedJson;
