//! dhcpview - browse and edit fixed IP reservations in ISC dhcpd.conf
//! files on remote servers over SSH.
//!
//! The configuration model (`parser`, `leases`, `editor`) works on plain
//! text and never touches the network; `services` and `routes` drive it
//! against live servers through a [`transport::Transport`].

pub mod config;
pub mod domain;
pub mod editor;
pub mod error;
pub mod leases;
pub mod parser;
pub mod routes;
pub mod services;
pub mod transport;
pub mod utils;
