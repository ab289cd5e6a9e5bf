//! Device type classification.
//!
//! A type octet is the address component that identifies what kind of
//! device sits in a block of addresses. Each server or subnet carries its
//! own label -> octets table; anything it does not cover falls back to a
//! fixed district-wide table.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered mapping from device type label to the octets it owns.
///
/// Declaration order matters: lookups return the first label that owns an
/// octet, and the dashboard lists types in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTypeMap {
    entries: Vec<(String, Vec<u8>)>,
}

impl DeviceTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label, replacing the octets of an existing label of the same name.
    pub fn insert(&mut self, label: impl Into<String>, octets: Vec<u8>) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = octets,
            None => self.entries.push((label, octets)),
        }
    }

    /// Label owning `octet`, if any.
    pub fn label_for(&self, octet: u8) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, octets)| octets.contains(&octet))
            .map(|(label, _)| label.as_str())
    }

    /// Octets belonging to `label`, in declaration order.
    pub fn octets(&self, label: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, octets)| octets.as_slice())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<L: Into<String>> FromIterator<(L, Vec<u8>)> for DeviceTypeMap {
    fn from_iter<I: IntoIterator<Item = (L, Vec<u8>)>>(iter: I) -> Self {
        let mut map = DeviceTypeMap::new();
        for (label, octets) in iter {
            map.insert(label, octets);
        }
        map
    }
}

impl Serialize for DeviceTypeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, octets) in &self.entries {
            map.serialize_entry(label, octets)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DeviceTypeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = DeviceTypeMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of device type labels to octet lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = DeviceTypeMap::new();
                while let Some((label, octets)) = access.next_entry::<String, Vec<u8>>()? {
                    map.insert(label, octets);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// One row of the fallback table.
struct TypeRange {
    first: u8,
    last: u8,
    label: &'static str,
}

const fn range(first: u8, last: u8, label: &'static str) -> TypeRange {
    TypeRange { first, last, label }
}

/// Checked top to bottom, first match wins.
const FALLBACK_TYPES: &[TypeRange] = &[
    range(3, 9, "Special Equipment"),
    range(10, 14, "Network Switches"),
    range(15, 19, "Access Points"),
    range(20, 29, "Servers"),
    range(30, 39, "Printers"),
    range(40, 49, "Staff Computers"),
    range(50, 51, "Student Computers - District"),
    range(52, 54, "Student Computers - Elementary"),
    range(55, 57, "Student Computers - Middle School"),
    range(58, 62, "Student Computers - High School"),
    range(63, 69, "Student Devices"),
    range(70, 70, "Projectors"),
    range(75, 79, "HVAC and Appliances"),
    range(100, 109, "Gaming Equipment"),
    range(250, 255, "Dynamic Pool"),
];

/// Label for a type octet using only the built-in table.
pub fn fallback_label(type_octet: u8) -> String {
    FALLBACK_TYPES
        .iter()
        .find(|r| (r.first..=r.last).contains(&type_octet))
        .map(|r| r.label.to_string())
        .unwrap_or_else(|| format!("Unknown Type {}", type_octet))
}

/// Classify a type octet, preferring the caller's table.
pub fn classify(type_octet: u8, device_types: &DeviceTypeMap) -> String {
    match device_types.label_for(type_octet) {
        Some(label) => label.to_string(),
        None => fallback_label(type_octet),
    }
}
