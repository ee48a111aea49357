//! Request origin for the activity log.

use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{headers::UserAgent, TypedHeader};

use crate::domain::ClientMeta;
use crate::errors::AppError;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Client IP address and user agent. Never rejects; missing values stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo(pub ClientMeta);

fn header_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            parts
                .headers
                .get(REAL_IP)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = header_ip(parts).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        let user_agent = TypedHeader::<UserAgent>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(agent)| agent.as_str().to_string());

        Ok(ClientInfo(ClientMeta {
            ip_address,
            user_agent,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_forwarded_for_wins() {
        let (mut parts, _) = Request::builder()
            .header(FORWARDED_FOR, "203.0.113.7, 10.0.0.1")
            .header(REAL_IP, "10.0.0.2")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap()
            .into_parts();

        let ClientInfo(meta) = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[tokio::test]
    async fn test_missing_headers_leave_blanks() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let ClientInfo(meta) = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(meta, ClientMeta::default());
    }
}
