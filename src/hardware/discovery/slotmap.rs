//! Slot Map Parsing
//!
//! Parses the NMC `show lun slotmap` listing into a [`SlotMap`]. Each mapped
//! disk line looks like
//!
//! ```text
//! c0t5000C500A1B2C3D4d0     jbod:1     3     ...
//! ```
//!
//! and the listing ends at the `Unmapped disks` section.

use crate::domain::ports::SlotMap;
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

const SOURCE: &str = "slotmap";

/// Marks the start of the unmapped-disk section
const UNMAPPED_MARKER: &str = "Unmapped disks";

static LUN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"c[0-9]+t.*d[0-9]+\s").expect("valid LUN pattern"));

/// Parse slot map output
pub fn parse_slotmap(output: &str) -> Result<SlotMap> {
    let mut slotmap = SlotMap::new();

    for (idx, line) in output.lines().enumerate() {
        let line_no = idx + 1;

        if line.contains(UNMAPPED_MARKER) {
            debug!("Slot map ends at line {}", line_no);
            break;
        }
        if !LUN_PATTERN.is_match(line) {
            continue;
        }

        let (lun, enclosure, slot) = parse_line(line, line_no)?;
        if let Some(previous) = slotmap.insert(enclosure, slot, lun) {
            if previous != lun {
                return Err(parse_error(
                    line_no,
                    format!(
                        "slot {} of {} mapped to both {} and {}",
                        slot, enclosure, previous, lun
                    ),
                ));
            }
        }
    }

    Ok(slotmap)
}

/// Split a mapped-disk line into LUN, enclosure and slot.
///
/// The last token is an annotation; enclosure and slot precede it.
fn parse_line(line: &str, line_no: usize) -> Result<(&str, &str, u32)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(parse_error(
            line_no,
            format!("expected LUN, enclosure, slot and status in '{}'", line.trim()),
        ));
    }

    let n = tokens.len();
    let slot = tokens[n - 2]
        .parse::<u32>()
        .map_err(|_| parse_error(line_no, format!("invalid slot number '{}'", tokens[n - 2])))?;

    Ok((tokens[0], tokens[n - 3], slot))
}

fn parse_error(line_no: usize, reason: String) -> Error {
    Error::Parse {
        source_name: SOURCE.to_string(),
        line_no,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SAMPLE: &str = "\
LUN                         JBOD       Slot#   Status
c0t5000C500A1B2C3D4d0       jbod:1     1       ONLINE
c0t5000C500A1B2C3D5d0       jbod:1     2       ONLINE
c1t5000A72A3007811Bd0       jbod:2     1       ONLINE

Unmapped disks:
c2t0d0                      -          7       -
";

    #[test]
    fn test_parse_slotmap() {
        let slotmap = parse_slotmap(SAMPLE).unwrap();

        assert_eq!(slotmap.len(), 3);
        assert_eq!(slotmap.get("jbod:1", 1), Some("c0t5000C500A1B2C3D4d0"));
        assert_eq!(slotmap.get("jbod:1", 2), Some("c0t5000C500A1B2C3D5d0"));
        assert_eq!(slotmap.get("jbod:2", 1), Some("c1t5000A72A3007811Bd0"));
    }

    #[test]
    fn test_stops_at_unmapped_marker() {
        let slotmap = parse_slotmap(SAMPLE).unwrap();
        assert_eq!(slotmap.get("-", 7), None);
        assert_eq!(slotmap.enclosures().count(), 2);
    }

    #[test]
    fn test_lines_after_marker_not_parsed() {
        // would be a parse error if it were read
        let output = "c0t0d0 J1 1 ok\nUnmapped disks\nc0t1d0 J1 notanumber ok\n";
        let slotmap = parse_slotmap(output).unwrap();
        assert_eq!(slotmap.len(), 1);
    }

    #[test]
    fn test_non_matching_lines_ignored() {
        let output = "header line\n=====\nc0t0d0 J1 1 ok\nsummary: 1 disk\n";
        let slotmap = parse_slotmap(output).unwrap();
        assert_eq!(slotmap.len(), 1);
        assert_eq!(slotmap.get("J1", 1), Some("c0t0d0"));
    }

    #[test]
    fn test_bad_slot_number() {
        let err = parse_slotmap("c0t0d0 J1 one ok\n").unwrap_err();
        assert_matches!(err, Error::Parse { line_no: 1, .. });
    }

    #[test]
    fn test_short_line() {
        let err = parse_slotmap("ok\nc0t0d0 J1 1\n").unwrap_err();
        assert_matches!(err, Error::Parse { line_no: 2, .. });
    }

    #[test]
    fn test_conflicting_slot() {
        let output = "c0t0d0 J1 1 ok\nc0t1d0 J1 1 ok\n";
        assert_matches!(parse_slotmap(output), Err(Error::Parse { line_no: 2, .. }));

        let repeated = "c0t0d0 J1 1 ok\nc0t0d0 J1 1 ok\n";
        assert_eq!(parse_slotmap(repeated).unwrap().len(), 1);
    }
}
