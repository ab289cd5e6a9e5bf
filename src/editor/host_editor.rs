//! In-place edits of host blocks in raw dhcpd.conf text.
//!
//! The file is treated as lines to splice, never re-serialized, so
//! subnets, options and comments the parser does not understand survive
//! byte for byte. Blocks written here are always a single line; the
//! update path relies on that and replaces exactly one line.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::DeviceTypeMap;
use crate::parser::parse_dhcpd_conf;

static FIXED_ADDRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"fixed-address\s+([0-9]{1,3}(?:\.[0-9]{1,3}){3})(?:\s*;|\s|$)")
        .expect("fixed-address pattern")
});

static HOST_OPENING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bhost\s+[^\s{]+\s*\{").expect("host opening pattern"));

/// What an edit did to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditOutcome {
    Inserted,
    Updated,
    Deleted,
    /// The target host was not found; the text is unchanged.
    NotFound,
}

/// Result of an edit: the new text and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "the edited text is only in the returned value"]
pub struct Edit {
    pub text: String,
    pub outcome: EditOutcome,
}

impl Edit {
    fn unchanged(raw: &str) -> Self {
        Self {
            text: raw.to_string(),
            outcome: EditOutcome::NotFound,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.outcome == EditOutcome::NotFound
    }
}

/// New values for a host. `None` keeps the current value on update.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostChange<'a> {
    pub ip_address: Option<&'a str>,
    pub mac_address: Option<&'a str>,
    pub hostname: Option<&'a str>,
}

/// Remove the first `host <hostname> {` block.
///
/// Commented-out text is never matched or counted. The block ends where per-line brace counting returns to zero. When the
/// host is missing (or its block never closes) the text comes back
/// unchanged with [`EditOutcome::NotFound`].
pub fn delete_host(raw: &str, hostname: &str) -> Edit {
    if hostname.is_empty() {
        return Edit::unchanged(raw);
    }
    let Ok(opening) = Regex::new(&format!(r"\bhost\s+{}\s*\{{", regex::escape(hostname))) else {
        return Edit::unchanged(raw);
    };

    let lines: Vec<&str> = raw.split('\n').collect();

    let Some(start) = lines.iter().position(|line| opening.is_match(code(line))) else {
        tracing::warn!("Host entry '{}' not found", hostname);
        return Edit::unchanged(raw);
    };

    let mut depth = 0i32;
    let mut end = None;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        let line = code(line);
        if line.contains('{') {
            depth += 1;
        }
        if line.contains('}') {
            depth -= 1;
        }
        if depth == 0 {
            end = Some(idx);
            break;
        }
    }

    let Some(end) = end else {
        tracing::warn!("Host entry '{}' has no closing brace", hostname);
        return Edit::unchanged(raw);
    };

    let kept: Vec<&str> = lines[..start]
        .iter()
        .chain(&lines[end + 1..])
        .copied()
        .collect();

    Edit {
        text: kept.join("\n"),
        outcome: EditOutcome::Deleted,
    }
}

/// Update the reservation named `target`, or insert a new one.
///
/// Update rewrites the single line the host keyword sits on, keeping its
/// indentation. Insert places a one-line block before the first
/// reservation whose address compares greater as a string, or at the end
/// of the file. Text ending in a newline splits into a trailing empty line,
/// so an appended block follows that empty line and the result has no
/// final newline.
pub fn upsert_host(
    raw: &str,
    target: &str,
    change: HostChange<'_>,
    device_types: &DeviceTypeMap,
) -> Edit {
    let hostname = change.hostname.unwrap_or(target);
    let existing = parse_dhcpd_conf(raw, device_types)
        .into_iter()
        .find(|r| r.hostname == target);

    let mut lines: Vec<&str> = raw.split('\n').collect();

    let Some(existing) = existing else {
        let block = render_block("", hostname, change.mac_address, change.ip_address);
        let at = insertion_line(&lines, change.ip_address.unwrap_or(""));
        lines.insert(at, &block);
        return Edit {
            text: lines.join("\n"),
            outcome: EditOutcome::Inserted,
        };
    };

    let idx = existing.source_line - 1;
    let Some(current) = lines.get(idx).copied() else {
        return Edit::unchanged(raw);
    };
    let indent = &current[..current.len() - current.trim_start().len()];
    let block = render_block(
        indent,
        hostname,
        Some(change.mac_address.unwrap_or(&existing.mac_address)),
        Some(change.ip_address.unwrap_or(&existing.ip_address)),
    );
    lines[idx] = &block;

    Edit {
        text: lines.join("\n"),
        outcome: EditOutcome::Updated,
    }
}

fn render_block(indent: &str, hostname: &str, mac: Option<&str>, ip: Option<&str>) -> String {
    let mut block = format!("{}host {} {{", indent, hostname);
    if let Some(mac) = mac {
        let _ = write!(block, " hardware ethernet {};", mac);
    }
    if let Some(ip) = ip {
        let _ = write!(block, " fixed-address {};", ip);
    }
    block.push_str(" }");
    block
}

/// Line index a new block for `ip` goes in front of.
fn insertion_line(lines: &[&str], ip: &str) -> usize {
    let mut placed: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let m = FIXED_ADDRESS_LINE.captures(code(line))?.get(1)?;
            Some((idx, m.as_str()))
        })
        .collect();
    placed.sort_by(|a, b| a.1.cmp(b.1));

    match placed.iter().find(|(_, existing)| *existing > ip) {
        Some(&(idx, _)) => block_start(lines, idx),
        None => lines.len(),
    }
}

/// Line holding the `host` keyword of the block that contains `idx`.
/// Single-line blocks start on `idx` itself.
fn block_start(lines: &[&str], idx: usize) -> usize {
    (0..=idx)
        .rev()
        .take_while(|&i| i == idx || !code(lines[i]).contains('}'))
        .find(|&i| HOST_OPENING.is_match(code(lines[i])))
        .unwrap_or(idx)
}

/// The part of a line before any `#` comment.
fn code(line: &str) -> &str {
    line.find('#').map_or(line, |pos| &line[..pos])
}
