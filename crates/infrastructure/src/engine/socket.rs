use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV6, UdpSocket};
use tracing::debug;

/// Non-blocking UDP socket the engine sends queries from.
///
/// Bound dual-stack when the host has IPv6, so one descriptor reaches
/// servers of both families.
pub struct ResolverSocket {
    socket: UdpSocket,
    dual_stack: bool,
}

impl ResolverSocket {
    pub fn bind() -> io::Result<Self> {
        match Self::bind_dual_stack() {
            Ok(socket) => Ok(Self {
                socket,
                dual_stack: true,
            }),
            Err(e) => {
                debug!(error = %e, "IPv6 unavailable, binding resolver socket to IPv4");
                Ok(Self {
                    socket: Self::bind_v4()?,
                    dual_stack: false,
                })
            }
        }
    }

    fn bind_dual_stack() -> io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_only_v6(false)?;
        socket.set_recv_buffer_size(256 * 1024)?;
        let bind_addr = SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0));
        socket.bind(&bind_addr.into())?;
        socket.set_nonblocking(true)?;
        Ok(socket.into())
    }

    fn bind_v4() -> io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_recv_buffer_size(256 * 1024)?;
        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
        socket.bind(&bind_addr.into())?;
        socket.set_nonblocking(true)?;
        Ok(socket.into())
    }

    pub fn send_to(&self, packet: &[u8], server: SocketAddr) -> io::Result<usize> {
        let target = match server {
            SocketAddr::V4(v4) if self.dual_stack => {
                SocketAddr::V6(SocketAddrV6::new(v4.ip().to_ipv6_mapped(), v4.port(), 0, 0))
            }
            other => other,
        };
        self.socket.send_to(packet, target)
    }

    /// Source addresses are reported in canonical form, v4-mapped peers as
    /// plain IPv4.
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let (len, from) = self.socket.recv_from(buf)?;
        Ok((len, SocketAddr::new(from.ip().to_canonical(), from.port())))
    }

    pub fn get_ref(&self) -> &UdpSocket {
        &self.socket
    }
}
