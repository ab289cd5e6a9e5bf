//! dhcpd.conf parsing module.
//!
//! Turns raw configuration text into domain reservations (SRP).

mod conf_parser;

pub use conf_parser::{parse_dhcpd_conf, ConfParser};
