//! Client IP extraction from HTTP headers.
//!
//! Forwarding headers are only honored when the proxy mode says they come
//! from a trusted hop; otherwise the socket address is used.

use axum::http::HeaderMap;
use std::net::IpAddr;
use tracing::warn;

use crate::config::TrustedProxyMode;

/// Extract the client IP address according to the trusted proxy mode
pub fn extract_client_ip(headers: &HeaderMap, socket_addr: IpAddr, mode: TrustedProxyMode) -> IpAddr {
    match mode {
        TrustedProxyMode::Cloudflare => header_ip(headers, "cf-connecting-ip").unwrap_or_else(|| {
            warn!("CF-Connecting-IP header missing in Cloudflare mode, using socket address");
            socket_addr
        }),
        TrustedProxyMode::Standard => extract_from_x_forwarded_for(headers)
            .or_else(|| header_ip(headers, "x-real-ip"))
            .unwrap_or(socket_addr),
        TrustedProxyMode::None => socket_addr,
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// The leftmost parseable X-Forwarded-For entry is the originating client.
fn extract_from_x_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;

    xff.split(',')
        .find_map(|s| s.trim().parse::<IpAddr>().ok())
}
