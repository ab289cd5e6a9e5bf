//! dhcpd.conf text editing.

mod host_editor;

pub use host_editor::{delete_host, upsert_host, Edit, EditOutcome, HostChange};
