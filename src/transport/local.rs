//! Local network plumbing
//!
//! - The upload listener binds all interfaces so phones on the LAN can reach it.
//! - The advertised address comes from an outbound route probe, never from config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, UdpSocket};

/// Public address whose route reveals the LAN interface. Nothing is sent to it.
pub const DEFAULT_PROBE_TARGET: &str = "8.8.8.8:80";

/// Address exposure policy for the listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BindScope {
    #[serde(rename = "loopback")]
    Loopback,
    #[default]
    #[serde(rename = "all")]
    AllInterfaces,
}

pub fn bind_addr(scope: BindScope, port: u16) -> SocketAddr {
    match scope {
        BindScope::Loopback => SocketAddr::from(([127, 0, 0, 1], port)),
        BindScope::AllInterfaces => SocketAddr::from(([0, 0, 0, 0], port)),
    }
}

/// Binds the listener socket, ready to hand to `axum_server::from_tcp`.
pub fn bind_local(scope: BindScope, port: u16) -> Result<TcpListener> {
    let addr = bind_addr(scope, port);
    let listener = TcpListener::bind(addr).with_context(|| {
        format!(
            "Failed to bind to {addr} - port already in use.\n\n\
             Is another photobridge instance running?\n\
             Or is another service using this port?"
        )
    })?;

    listener
        .set_nonblocking(true)
        .context("Failed to set listener to non-blocking mode")?;

    Ok(listener)
}

/// Best-effort LAN address of this host, probing the default route.
///
/// Falls back to loopback; multi-homed hosts may get the wrong interface.
pub fn resolve_local_address() -> IpAddr {
    resolve_local_address_via(DEFAULT_PROBE_TARGET)
}

/// Like [`resolve_local_address`], probing the route to `probe_target`.
pub fn resolve_local_address_via(probe_target: &str) -> IpAddr {
    match probe_route(probe_target) {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(ip) => {
            tracing::debug!(%ip, "Route probe gave an unspecified address, using loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
        Err(err) => {
            tracing::debug!("Route probe failed, using loopback: {:#}", err);
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn probe_route(probe_target: &str) -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind socket for IP detection")?;

    // UDP connect only selects a route; no packet leaves the host
    socket
        .connect(probe_target)
        .context("Failed to connect socket for IP detection")?;

    let local_addr = socket.local_addr().context("Failed to get local address")?;

    Ok(local_addr.ip())
}
