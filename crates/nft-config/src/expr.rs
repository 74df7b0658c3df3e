// Builders for the match statements rulesets use most
use ipnet::IpNet;
use nft_schema::{Expression, Match, Meta, Operator, Payload, Prefix, Statement};
use std::net::IpAddr;

/// `<key> == right` on a meta key, e.g. `meta l4proto tcp`
pub fn match_meta(key: &str, right: impl Into<Expression>) -> Statement {
    Match::new(Operator::Eq, Meta::new(key), right).into()
}

/// `iifname`/`oifname` match
pub fn match_iface(key: &str, iface: &str) -> Statement {
    match_meta(key, iface)
}

pub fn match_l4proto(proto: &str) -> Statement {
    match_meta("l4proto", proto)
}

pub fn match_payload(protocol: &str, field: &str, right: impl Into<Expression>) -> Statement {
    Match::new(Operator::Eq, Payload::new(protocol, field), right).into()
}

/// `tcp dport 80`
pub fn match_port(proto: &str, field: &str, port: u16) -> Statement {
    match_payload(proto, field, port)
}

pub fn match_ip_addr(field: &str, ip: &IpAddr) -> Statement {
    match_payload(ip_protocol(ip), field, ip.to_string())
}

/// Match on a network, e.g. `ip saddr 10.33.0.0/24`.
/// Host routes (`/32`, `/128`) are still written as prefixes.
pub fn match_ip_prefix(field: &str, net: &IpNet) -> Statement {
    let prefix = Prefix {
        addr: net.addr().to_string(),
        len: net.prefix_len(),
    };
    match_payload(ipnet_protocol(net), field, prefix)
}

pub fn ip_protocol(ip: &IpAddr) -> &'static str {
    match ip {
        IpAddr::V4(_) => "ip",
        IpAddr::V6(_) => "ip6",
    }
}

pub fn ipnet_protocol(net: &IpNet) -> &'static str {
    match net {
        IpNet::V4(_) => "ip",
        IpNet::V6(_) => "ip6",
    }
}
