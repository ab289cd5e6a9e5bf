use std::net::Ipv4Addr;

use macaddr::MacAddr6;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid MAC address format: {0}")]
    InvalidMac(String),

    #[error("Invalid IP address format: {0}")]
    InvalidIp(String),

    #[error("Invalid hostname '{0}': must be non-empty without whitespace, braces, ';' or '#'")]
    InvalidHostname(String),
}

/// Length of `aa:bb:cc:dd:ee:ff`.
const MAC_TEXT_LEN: usize = 17;

/// Normalize a MAC address written with `:` or `-` separators to
/// lowercase colon form (aa:bb:cc:dd:ee:ff).
pub fn normalize_mac(mac: &str) -> Result<String, ValidationError> {
    let mac = mac.trim();
    if mac.len() != MAC_TEXT_LEN {
        return Err(ValidationError::InvalidMac(mac.to_string()));
    }
    let parsed: MacAddr6 = mac
        .parse()
        .map_err(|_| ValidationError::InvalidMac(mac.to_string()))?;

    Ok(parsed
        .as_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":"))
}

/// Validate a dotted-quad IPv4 address.
#[must_use = "validation result must be checked"]
pub fn validate_ipv4(ip: &str) -> Result<(), ValidationError> {
    ip.trim()
        .parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidIp(ip.to_string()))
}

/// Validate a hostname: one token that cannot break a host block.
#[must_use = "validation result must be checked"]
pub fn validate_hostname(hostname: &str) -> Result<(), ValidationError> {
    let bad = |c: char| c.is_whitespace() || matches!(c, '{' | '}' | ';' | '#');
    if hostname.is_empty() || hostname.chars().any(bad) {
        return Err(ValidationError::InvalidHostname(hostname.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod normalize_mac_tests {
        use super::*;

        #[test]
        fn colon_separated() {
            assert_eq!(normalize_mac("AA:BB:CC:DD:EE:FF").unwrap(), "aa:bb:cc:dd:ee:ff");
        }

        #[test]
        fn hyphen_separated() {
            assert_eq!(normalize_mac("aa-bb-cc-0d-0e-0f").unwrap(), "aa:bb:cc:0d:0e:0f");
        }

        #[test]
        fn surrounding_whitespace() {
            assert_eq!(normalize_mac(" 00:11:22:33:44:55 ").unwrap(), "00:11:22:33:44:55");
        }

        #[test]
        fn rejects_bare_hex() {
            assert!(normalize_mac("AABBCCDDEEFF").is_err());
        }

        #[test]
        fn rejects_short() {
            assert!(normalize_mac("aa:bb:cc:dd:ee").is_err());
        }

        #[test]
        fn rejects_non_hex() {
            assert!(normalize_mac("gg:bb:cc:dd:ee:ff").is_err());
        }

        #[test]
        fn rejects_empty() {
            assert_eq!(normalize_mac(""), Err(ValidationError::InvalidMac(String::new())));
        }
    }

    mod validate_ipv4_tests {
        use super::*;

        #[test]
        fn valid() {
            assert!(validate_ipv4("10.110.5.20").is_ok());
        }

        #[test]
        fn out_of_range() {
            assert!(validate_ipv4("10.110.5.256").is_err());
        }

        #[test]
        fn too_few_parts() {
            assert!(validate_ipv4("10.110.5").is_err());
        }

        #[test]
        fn not_a_number() {
            assert!(validate_ipv4("ten.0.0.1").is_err());
        }
    }

    mod validate_hostname_tests {
        use super::*;

        #[test]
        fn valid() {
            assert!(validate_hostname("pos-01.store").is_ok());
        }

        #[test]
        fn empty() {
            assert!(validate_hostname("").is_err());
        }

        #[test]
        fn whitespace() {
            assert!(validate_hostname("two words").is_err());
        }

        #[test]
        fn block_syntax() {
            assert!(validate_hostname("evil{").is_err());
            assert!(validate_hostname("a;b").is_err());
            assert!(validate_hostname("x#y").is_err());
        }
    }
}
