//! Lease table generation.

mod generator;

pub use generator::{
    address_for, generate_full_range, generate_paged, generate_range, lease_table, prefix_names_network,
    total_pages_for, LeaseTable, ADDRESSES_PER_OCTET, DEFAULT_PAGE_SIZE, LARGE_RANGE_THRESHOLD,
};
