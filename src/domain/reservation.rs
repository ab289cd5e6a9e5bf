//! Host reservation and lease table models.
//!
//! Reservations are rebuilt from the raw dhcpd.conf on every request; the
//! remote file stays the single source of truth.

use serde::{Serialize, Serializer};

/// A `host <name> { ... }` block that carried both a MAC and an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReservation {
    pub hostname: String,
    pub ip_address: String,
    /// As written in the file; serialized uppercase.
    #[serde(serialize_with = "uppercase_mac")]
    pub mac_address: String,
    /// Address component used for classification, kept as text.
    pub type_octet: String,
    pub type_label: String,
    /// 1-based line of the `host` keyword. Only valid for the text it was
    /// parsed from.
    pub source_line: usize,
}

impl HostReservation {
    /// MAC address in the uppercase form shown to operators.
    pub fn display_mac(&self) -> String {
        self.mac_address.to_uppercase()
    }
}

fn uppercase_mac<S: Serializer>(mac: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&mac.to_uppercase())
}

/// Whether an address in a lease table is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeaseStatus {
    Free,
    Taken,
}

/// One address of a lease table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRangeEntry {
    pub ip: String,
    pub status: LeaseStatus,
    /// Empty when free.
    pub hostname: String,
    /// Uppercase; empty when free.
    pub mac_address: String,
}

impl AddressRangeEntry {
    pub fn free(ip: String) -> Self {
        Self {
            ip,
            status: LeaseStatus::Free,
            hostname: String::new(),
            mac_address: String::new(),
        }
    }

    pub fn taken(ip: String, reservation: &HostReservation) -> Self {
        Self {
            ip,
            status: LeaseStatus::Taken,
            hostname: reservation.hostname.clone(),
            mac_address: reservation.display_mac(),
        }
    }

    pub fn is_taken(&self) -> bool {
        self.status == LeaseStatus::Taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(mac: &str) -> HostReservation {
        HostReservation {
            hostname: "lab-07".to_string(),
            ip_address: "10.1.40.7".to_string(),
            mac_address: mac.to_string(),
            type_octet: "40".to_string(),
            type_label: "Lab".to_string(),
            source_line: 3,
        }
    }

    #[test]
    fn test_json_shows_uppercase_mac() {
        let host = reservation("0a:1b:2c:3d:4e:5f");
        let json = serde_json::to_value(&host).unwrap();
        assert_eq!(json["macAddress"], "0A:1B:2C:3D:4E:5F");
        assert_eq!(json["sourceLine"], 3);
        assert_eq!(host.mac_address, "0a:1b:2c:3d:4e:5f");
    }

    #[test]
    fn test_taken_entry_uses_display_mac() {
        let entry = AddressRangeEntry::taken("10.1.40.7".to_string(), &reservation("0a:1b:2c:3d:4e:5f"));
        assert!(entry.is_taken());
        assert_eq!(entry.hostname, "lab-07");
        assert_eq!(entry.mac_address, "0A:1B:2C:3D:4E:5F");
        assert!(AddressRangeEntry::free("10.1.40.8".to_string()).mac_address.is_empty());
    }
}
