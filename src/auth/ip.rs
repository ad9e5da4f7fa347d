//! Client IP extraction utilities.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

use crate::cli::IpExtractor;

/// Extract the client IP address based on configuration.
///
/// If `ip_extractor` is set, the IP comes from the configured proxy header and a
/// missing or invalid header is an error (no fallback to the socket address).
///
/// If `ip_extractor` is None, proxy headers are ignored and the peer address
/// from `ConnectInfo` is used.
pub fn extract_client_ip<B>(
    request: &Request<B>,
    ip_extractor: Option<&IpExtractor>,
) -> Result<String, &'static str> {
    match ip_extractor {
        Some(extractor) => {
            let header_value = request
                .headers()
                .get(extractor.header_name)
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            extractor.extract(header_value)
        }
        None => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .ok_or("No client IP available"),
    }
}
