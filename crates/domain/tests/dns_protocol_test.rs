use ferrous_forwarder_domain::{DnsProtocol, TransportKind};
use std::net::SocketAddr;

#[test]
fn test_parse_udp() {
    let protocol: DnsProtocol = "udp://8.8.8.8:53".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Udp { .. }));
}

#[test]
fn test_parse_udp_default() {
    let protocol: DnsProtocol = "8.8.8.8:53".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Udp { .. }));
}

#[test]
fn test_parse_bare_ip_uses_port_53() {
    let protocol: DnsProtocol = "9.9.9.9".parse().unwrap();
    let expected: SocketAddr = "9.9.9.9:53".parse().unwrap();
    assert_eq!(protocol.socket_addr(), expected);
}

#[test]
fn test_parse_tcp() {
    let protocol: DnsProtocol = "tcp://8.8.8.8:53".parse().unwrap();
    assert!(matches!(protocol, DnsProtocol::Tcp { .. }));
    assert_eq!(protocol.protocol_name(), "TCP");
}

#[test]
fn test_parse_ipv6() {
    let protocol: DnsProtocol = "[2001:4860:4860::8888]:53".parse().unwrap();
    assert!(protocol.socket_addr().is_ipv6());

    let bare: DnsProtocol = "udp://2001:4860:4860::8844".parse().unwrap();
    assert_eq!(bare.socket_addr().port(), 53);
}

#[test]
fn test_parse_invalid() {
    assert!("not-an-address".parse::<DnsProtocol>().is_err());
    assert!("tcp://dns.google:53".parse::<DnsProtocol>().is_err());
    assert!("tls://1.1.1.1:853".parse::<DnsProtocol>().is_err());
}

#[test]
fn test_display_roundtrip() {
    for s in ["udp://1.1.1.1:53", "tcp://10.0.0.1:5353"] {
        let protocol: DnsProtocol = s.parse().unwrap();
        assert_eq!(protocol.to_string(), s);
    }
}

#[test]
fn test_transport_kind_labels() {
    assert_eq!(TransportKind::Udp.to_string(), "UDP");
    assert_eq!(TransportKind::Tcp.as_str(), "TCP");
}
