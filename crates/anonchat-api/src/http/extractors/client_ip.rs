//! Client IP extractor.
//!
//! Resolution order: first hop of `X-Forwarded-For`, then `X-Real-IP`,
//! then the socket peer address. The result is an opaque string key for
//! the limiter and conversation store -- no format validation happens
//! here or downstream, and trusting the forwarding headers is a
//! deployment concern (the service is expected to sit behind a reverse
//! proxy).

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

/// The requesting client's IP address (or best available stand-in).
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(forwarded) = header_str(parts, "x-forwarded-for") {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Ok(ClientIp(first.to_string()));
                }
            }
        }

        if let Some(real_ip) = header_str(parts, "x-real-ip") {
            let real_ip = real_ip.trim();
            if !real_ip.is_empty() {
                return Ok(ClientIp(real_ip.to_string()));
            }
        }

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect_info| connect_info.0.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ClientIp(ip))
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> ClientIp {
        let (mut parts, ()) = request.into_parts();
        ClientIp::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_forwarded_for_first_hop_wins() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();

        let ClientIp(ip) = extract(request).await;
        assert_eq!(ip, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_real_ip_fallback() {
        let request = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();

        let ClientIp(ip) = extract(request).await;
        assert_eq!(ip, "198.51.100.2");
    }

    #[tokio::test]
    async fn test_connect_info_fallback() {
        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo::<SocketAddr>("192.0.2.9:4444".parse().unwrap()));

        let ClientIp(ip) = extract(request).await;
        assert_eq!(ip, "192.0.2.9");
    }

    #[tokio::test]
    async fn test_no_information_yields_unknown() {
        let request = Request::builder().body(()).unwrap();
        let ClientIp(ip) = extract(request).await;
        assert_eq!(ip, "unknown");
    }

    #[tokio::test]
    async fn test_empty_forwarded_header_falls_through() {
        let request = Request::builder()
            .header("x-forwarded-for", "  ")
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();

        let ClientIp(ip) = extract(request).await;
        assert_eq!(ip, "198.51.100.2");
    }
}
