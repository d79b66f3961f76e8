//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use route_discovery::dag::{
    Dag, PathMatchCondition, ProxyRoute, Route, RouteAction, SecureVirtualHost, VirtualHost,
};
use route_discovery::protocol::RouteConfiguration;

/// A prefix route proxying to one cluster.
pub fn proxy(prefix: &str, cluster: &str) -> Route {
    Route::new(
        PathMatchCondition::prefix(prefix),
        RouteAction::Proxy(ProxyRoute::to(cluster)),
    )
}

/// A prefix route that upgrades plaintext clients to HTTPS.
pub fn upgrade(prefix: &str, cluster: &str) -> Route {
    Route::new(
        PathMatchCondition::prefix(prefix),
        RouteAction::HttpsUpgrade(ProxyRoute::to(cluster)),
    )
}

pub fn vhost(name: &str, routes: Vec<Route>) -> VirtualHost {
    let mut vh = VirtualHost::new(name);
    vh.routes = routes;
    vh
}

pub fn secure_vhost(name: &str, routes: Vec<Route>, fallback: bool) -> SecureVirtualHost {
    let mut svh = SecureVirtualHost::new(name);
    svh.virtual_host.routes = routes;
    svh.fallback_certificate = fallback;
    svh
}

pub fn dag(virtual_hosts: Vec<VirtualHost>, secure_virtual_hosts: Vec<SecureVirtualHost>) -> Dag {
    Dag {
        virtual_hosts,
        secure_virtual_hosts,
    }
}

pub fn names(values: &[Arc<RouteConfiguration>]) -> Vec<String> {
    values.iter().map(|c| c.name.clone()).collect()
}

/// Issue a plain HTTP/1.1 GET and return the status code and body.
pub async fn http_get(addr: SocketAddr, path: &str, api_key: &str) -> (u16, String) {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nAuthorization: Bearer {}\r\nConnection: close\r\n\r\n",
        path, addr, api_key
    );
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    socket.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}
