//! Church resolution from the request host.
//!
//! Each branch is served from its own subdomain, e.g.
//! `kasiglahan.jcsgo.com` or `kasiglahan.localhost:3000`.

use axum::{
    async_trait,
    extract::{FromRequestParts, Host},
    http::request::Parts,
};

use crate::errors::AppError;

/// Church domain taken from the first label of the `Host` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantHost(pub String);

const RESERVED_LABELS: [&str; 3] = ["www", "api", "admin"];

/// First host label, or `None` for bare hosts, IP addresses and reserved labels.
pub fn church_domain_from_host(host: &str) -> Option<String> {
    let host = host.split(':').next()?.trim().to_ascii_lowercase();
    let (first, rest) = host.split_once('.')?;

    if rest.is_empty() || first.is_empty() || RESERVED_LABELS.contains(&first) {
        return None;
    }
    if host.split('.').all(|label| label.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    Some(first.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantHost
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Host(host) = Host::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest("Missing Host header".to_string()))?;

        church_domain_from_host(&host)
            .map(TenantHost)
            .ok_or_else(|| {
                AppError::BadRequest(format!("No church subdomain in host '{}'", host))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_is_first_label() {
        assert_eq!(
            church_domain_from_host("kasiglahan.jcsgo.com"),
            Some("kasiglahan".into())
        );
        assert_eq!(
            church_domain_from_host("3pmfamily.localhost:3000"),
            Some("3pmfamily".into())
        );
    }

    #[test]
    fn test_hosts_without_church() {
        assert_eq!(church_domain_from_host("localhost:3000"), None);
        assert_eq!(church_domain_from_host("127.0.0.1:3000"), None);
        assert_eq!(church_domain_from_host("www.jcsgo.com"), None);
    }
}
