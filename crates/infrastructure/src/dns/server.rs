mod handler;
pub mod tcp;
pub mod udp;

pub use handler::DnsServerHandler;
pub use tcp::{run_tcp_listener, serve_tcp_connection, TcpListenerOptions};
pub use udp::run_udp_listener;
