//! Domain models for the dhcpd.conf view.
//!
//! These types describe reservations, lease tables and the server
//! inventory, independent of how the configuration text is parsed or
//! edited.

mod device_types;
mod reservation;
mod server;

pub use device_types::{classify, fallback_label, DeviceTypeMap};
pub use reservation::{AddressRangeEntry, HostReservation, LeaseStatus};
pub use server::{AddressScope, Inventory, InventoryError, Server, ServerLayout, Subnet};
