//! dhcpd.conf host reservation parser.
//!
//! Only `host <name> { ... }` blocks are understood. Everything else in the
//! file (subnets, pools, options) is skipped, and blocks are assumed not to
//! nest: a body ends at the first closing brace.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{classify, DeviceTypeMap, HostReservation};

static HOST_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bhost\s+([^\s{]+)\s*\{([^}]*)\}").expect("host block pattern")
});

static HARDWARE_ETHERNET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bhardware\s+ethernet\s+([0-9a-fA-F]{2}(?::[0-9a-fA-F]{2}){5})(?:\s*;|\s|$)")
        .expect("hardware ethernet pattern")
});

static FIXED_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfixed-address\s+([0-9]{1,3}(?:\.[0-9]{1,3}){3})(?:\s*;|\s|$)")
        .expect("fixed-address pattern")
});

/// Parser for the host reservations of one dhcpd.conf text.
pub struct ConfParser<'a> {
    device_types: &'a DeviceTypeMap,
}

impl<'a> ConfParser<'a> {
    /// Create a parser that labels reservations with `device_types`.
    pub fn new(device_types: &'a DeviceTypeMap) -> Self {
        Self { device_types }
    }

    /// Extract every complete host reservation, sorted by type octet.
    ///
    /// Blocks without both a `hardware ethernet` and a `fixed-address`
    /// are dropped silently. Text without any host blocks yields an empty
    /// list; this never fails.
    pub fn parse(&self, raw: &str) -> Vec<HostReservation> {
        let cleaned = strip_comments(raw);
        let mut reservations = Vec::new();

        // Running newline count so line numbers cost one pass overall.
        let mut line = 1;
        let mut counted_to = 0;

        for caps in HOST_BLOCK.captures_iter(&cleaned) {
            let (Some(whole), Some(name), Some(body)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            line += count_newlines(&cleaned[counted_to..whole.start()]);
            counted_to = whole.start();

            let Some(reservation) = self.reservation(name.as_str(), body.as_str(), line) else {
                tracing::trace!("Skipping incomplete host block '{}' at line {}", name.as_str(), line);
                continue;
            };
            reservations.push(reservation);
        }

        // Stable string sort: "100" lands before "20".
        reservations.sort_by(|a, b| a.type_octet.cmp(&b.type_octet));
        reservations
    }

    fn reservation(&self, hostname: &str, body: &str, line: usize) -> Option<HostReservation> {
        let mac = HARDWARE_ETHERNET.captures(body)?.get(1)?.as_str();
        let ip = FIXED_ADDRESS.captures(body)?.get(1)?.as_str();
        let octets = dotted_quad(ip)?;
        let type_octet = octets[2];

        Some(HostReservation {
            hostname: hostname.to_string(),
            ip_address: ip.to_string(),
            mac_address: mac.to_string(),
            type_octet: type_octet.to_string(),
            type_label: classify(type_octet, self.device_types),
            source_line: line,
        })
    }
}

/// Parse `raw` with the given classification table.
pub fn parse_dhcpd_conf(raw: &str, device_types: &DeviceTypeMap) -> Vec<HostReservation> {
    ConfParser::new(device_types).parse(raw)
}

/// Drop `#` comments and surrounding whitespace from every line, keeping
/// the line count unchanged.
fn strip_comments(raw: &str) -> String {
    raw.split('\n')
        .map(|line| match line.find('#') {
            Some(pos) => line[..pos].trim(),
            None => line.trim(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

/// Split a dotted quad, rejecting components above 255.
fn dotted_quad(ip: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = ip.split('.');
    for slot in octets.iter_mut() {
        *slot = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}
