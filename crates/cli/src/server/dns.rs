use ferrous_forwarder_domain::ServerConfig;
use ferrous_forwarder_infrastructure::dns::server::{
    run_tcp_listener, run_udp_listener, DnsServerHandler, TcpListenerOptions,
};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Binds `udp_workers` SO_REUSEPORT socket pairs and spawns a UDP and a TCP
/// listener on each. Any bind failure is returned before a listener starts.
pub async fn start_dns_server(
    config: &ServerConfig,
    handler: DnsServerHandler,
    shutdown: CancellationToken,
) -> anyhow::Result<JoinSet<()>> {
    let socket_addr: SocketAddr = config.listen_address().parse()?;
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let num_workers = config.udp_workers.max(1);
    let tcp_options = TcpListenerOptions::from_config(config);

    info!(bind_address = %socket_addr, num_workers, "Starting DNS server with SO_REUSEPORT");

    let mut sockets = Vec::with_capacity(num_workers);
    for _ in 0..num_workers {
        let udp_socket = create_udp_socket(domain, socket_addr)?;
        let tcp_listener = create_tcp_listener(domain, socket_addr)?;
        sockets.push((udp_socket, tcp_listener));
    }

    let handler = Arc::new(handler);
    let mut join_set: JoinSet<()> = JoinSet::new();
    for (udp_socket, tcp_listener) in sockets {
        join_set.spawn(run_udp_listener(
            Arc::new(udp_socket),
            handler.clone(),
            shutdown.clone(),
        ));
        join_set.spawn(run_tcp_listener(
            tcp_listener,
            handler.clone(),
            tcp_options,
            shutdown.clone(),
        ));
    }

    info!(
        "DNS server ready: {} workers on {} (UDP+TCP)",
        num_workers, socket_addr
    );

    Ok(join_set)
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
