use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use anyhow::Context;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::info;

/// Largest datagram accepted; seven TS packets fit a standard 1500-byte MTU
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// Binds a UDP socket for TS reception, joining the group when `addr` is multicast.
pub fn create_udp_socket(addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let ip = match addr.ip() {
        IpAddr::V4(v4) => v4,
        _ => anyhow::bail!("only IPv4 is supported"),
    };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket
        .bind(&addr.into())
        .with_context(|| format!("binding {addr}"))?;

    if ip.is_multicast() {
        let iface = Ipv4Addr::UNSPECIFIED; // default interface
        socket
            .join_multicast_v4(&ip, &iface)
            .with_context(|| format!("joining multicast group {ip}"))?;
        info!(%addr, "joined multicast group");
    } else {
        info!(%addr, "listening");
    }

    socket.set_nonblocking(true)?;
    Ok(UdpSocket::from_std(socket.into())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_unicast() {
        let sock = create_udp_socket("127.0.0.1:0".parse().unwrap()).unwrap();
        assert!(sock.local_addr().unwrap().port() > 0);
    }

    #[tokio::test]
    async fn rejects_ipv6() {
        assert!(create_udp_socket("[::1]:0".parse().unwrap()).is_err());
    }
}
