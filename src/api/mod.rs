// src/api/mod.rs

pub mod admin;
pub mod health;
pub mod intents;
pub mod sequence;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::{RateLimiter, RelayerService};

#[derive(Clone)]
pub struct AppState {
    pub relayer: Arc<RelayerService>,
    pub limiter: Arc<RateLimiter>,
    pub config: Config,
}

/// Rate-limit key for a request. The TCP peer is the origin unless it is a
/// trusted proxy, in which case `X-Forwarded-For` is walked from the right
/// and the first hop that is not itself a trusted proxy wins.
pub fn client_origin(headers: &HeaderMap, peer: Option<SocketAddr>, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer.map(|addr| addr.ip()) else {
        return "unknown".to_string();
    };
    if !trusted.contains(&peer) {
        if headers.contains_key("x-forwarded-for") {
            tracing::debug!("Ignoring X-Forwarded-For from untrusted peer {}", peer);
        }
        return peer.to_string();
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    for hop in forwarded.rsplit(',').map(str::trim).filter(|hop| !hop.is_empty()) {
        match hop.parse::<IpAddr>() {
            Ok(ip) if trusted.contains(&ip) => continue,
            Ok(ip) => return ip.to_string(),
            Err(_) => break,
        }
    }
    peer.to_string()
}

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let origin = client_origin(
        request.headers(),
        peer,
        &state.config.rate_limit_trusted_proxies,
    );

    if !state.limiter.allow(&origin) {
        tracing::warn!("Rate limited {} {}", origin, request.uri().path());
        return AppError::RateLimitExceeded.into_response();
    }
    next.run(request).await
}

/// Turns axum's JSON extractor rejections into our 400 body.
pub fn parse_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    fn ip(value: &str) -> IpAddr {
        value.parse().expect("ip")
    }

    fn peer(value: &str) -> Option<SocketAddr> {
        Some(value.parse().expect("socket addr"))
    }

    #[test]
    fn untrusted_peer_cannot_choose_its_origin() {
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_origin(&headers, peer("192.0.2.1:4000"), &[]), "192.0.2.1");
        assert_eq!(
            client_origin(&headers, peer("192.0.2.1:4000"), &[ip("10.0.0.1")]),
            "192.0.2.1"
        );
    }

    #[test]
    fn trusted_proxy_yields_rightmost_untrusted_hop() {
        let trusted = [ip("10.0.0.1"), ip("10.0.0.2")];
        let headers = forwarded("198.51.100.9, 203.0.113.7, 10.0.0.2");
        assert_eq!(
            client_origin(&headers, peer("10.0.0.1:80"), &trusted),
            "203.0.113.7"
        );
    }

    #[test]
    fn trusted_proxy_without_usable_header_is_its_own_origin() {
        let trusted = [ip("10.0.0.1")];
        assert_eq!(
            client_origin(&HeaderMap::new(), peer("10.0.0.1:80"), &trusted),
            "10.0.0.1"
        );
        assert_eq!(
            client_origin(&forwarded("not-an-ip"), peer("10.0.0.1:80"), &trusted),
            "10.0.0.1"
        );
    }

    #[test]
    fn missing_peer_is_bucketed_together() {
        assert_eq!(client_origin(&forwarded("203.0.113.7"), None, &[]), "unknown");
    }
}
