//! Services for handling business logic.

pub mod activity;
pub mod dhcpd;

pub use activity::{ActivityEntry, ActivitySink, FileActivityLog};
pub use dhcpd::{DhcpdService, ServiceState, ServiceStatus};
