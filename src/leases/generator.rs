//! Free/Taken tables over a device type's address range.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{AddressRangeEntry, HostReservation};

/// Host addresses generated per type octet (`.1` through `.255`).
pub const ADDRESSES_PER_OCTET: usize = 255;

/// Types with more octets than this are served a page at a time.
pub const LARGE_RANGE_THRESHOLD: usize = 50;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Address -> reservation lookup. The first reservation wins when two
/// blocks claim the same address.
struct ReservationIndex<'a> {
    by_ip: HashMap<&'a str, &'a HostReservation>,
}

impl<'a> ReservationIndex<'a> {
    fn new(reservations: &'a [HostReservation]) -> Self {
        let mut by_ip = HashMap::with_capacity(reservations.len());
        for reservation in reservations {
            by_ip.entry(reservation.ip_address.as_str()).or_insert(reservation);
        }
        Self { by_ip }
    }

    fn entry(&self, ip: String) -> AddressRangeEntry {
        match self.by_ip.get(ip.as_str()) {
            Some(reservation) => AddressRangeEntry::taken(ip, reservation),
            None => AddressRangeEntry::free(ip),
        }
    }
}

/// Build one address of a type's range.
///
/// A two-component prefix (`10.110`) takes the type octet as its third
/// component; longer prefixes already name the whole network.
pub fn address_for(ip_prefix: &str, type_octet: u8, host: u8) -> String {
    if prefix_names_network(ip_prefix) {
        format!("{}.{}", ip_prefix, host)
    } else {
        format!("{}.{}.{}", ip_prefix, type_octet, host)
    }
}

/// True when the prefix already fixes the third component, so every type
/// octet maps onto the same 255 addresses.
pub fn prefix_names_network(ip_prefix: &str) -> bool {
    ip_prefix.split('.').count() != 2
}

/// Status of every address `start..=end` for one type octet.
pub fn generate_range(
    reservations: &[HostReservation],
    type_octet: u8,
    ip_prefix: &str,
    start: u8,
    end: u8,
) -> Vec<AddressRangeEntry> {
    let index = ReservationIndex::new(reservations);
    (start..=end)
        .map(|host| index.entry(address_for(ip_prefix, type_octet, host)))
        .collect()
}

/// Status of `.1` through `.255` for one type octet.
pub fn generate_full_range(
    reservations: &[HostReservation],
    type_octet: u8,
    ip_prefix: &str,
) -> Vec<AddressRangeEntry> {
    generate_range(reservations, type_octet, ip_prefix, 1, 255)
}

/// One page of the concatenated ranges of `type_octets`.
///
/// Pages are 1-based (page 0 is read as page 1). Only the addresses inside
/// the requested window are generated.
pub fn generate_paged(
    reservations: &[HostReservation],
    ip_prefix: &str,
    type_octets: &[u8],
    page: usize,
    page_size: usize,
) -> Vec<AddressRangeEntry> {
    let total = type_octets.len() * ADDRESSES_PER_OCTET;
    let first = page.max(1).saturating_sub(1).saturating_mul(page_size);
    if page_size == 0 || first >= total {
        return Vec::new();
    }
    let last = first.saturating_add(page_size - 1).min(total - 1);

    let index = ReservationIndex::new(reservations);
    (first..=last)
        .map(|position| {
            let type_octet = type_octets[position / ADDRESSES_PER_OCTET];
            // position % 255 is at most 254, so the host always fits.
            let host = (position % ADDRESSES_PER_OCTET + 1) as u8;
            index.entry(address_for(ip_prefix, type_octet, host))
        })
        .collect()
}

/// Number of pages needed for `type_octets` at `page_size` per page.
pub fn total_pages_for(type_octets: &[u8], page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    (type_octets.len() * ADDRESSES_PER_OCTET).div_ceil(page_size)
}

/// A lease table ready for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTable {
    pub entries: Vec<AddressRangeEntry>,
    pub page: usize,
    pub total_pages: usize,
    /// Whether `entries` is a single page of a larger table.
    pub paged: bool,
}

/// Lease table for a device type, paging only large types.
///
/// Up to [`LARGE_RANGE_THRESHOLD`] octets the full range of every octet is
/// returned in declaration order and `page` is ignored.
pub fn lease_table(
    reservations: &[HostReservation],
    ip_prefix: &str,
    type_octets: &[u8],
    page: usize,
    page_size: usize,
) -> LeaseTable {
    if type_octets.len() > LARGE_RANGE_THRESHOLD {
        return LeaseTable {
            entries: generate_paged(reservations, ip_prefix, type_octets, page, page_size),
            page: page.max(1),
            total_pages: total_pages_for(type_octets, page_size),
            paged: true,
        };
    }

    let entries = type_octets
        .iter()
        .flat_map(|&octet| generate_full_range(reservations, octet, ip_prefix))
        .collect();
    LeaseTable {
        entries,
        page: 1,
        total_pages: 1,
        paged: false,
    }
}
