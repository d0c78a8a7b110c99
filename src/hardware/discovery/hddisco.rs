//! hddisco Parsing
//!
//! Parses `hddisco` output into [`DeviceInfo`]. The output is a sequence of
//! device sections:
//!
//! ```text
//! =c0t5000C500A1B2C3D4d0
//! vendor SEAGATE
//! product ST4000NM0023
//! is_ssd no
//! P start ================================================
//! P path_count 1
//! ```
//!
//! Lines starting with `P` describe individual paths and are not modelled.

use crate::domain::ports::DeviceInfo;
use crate::error::{Error, Result};

const SOURCE: &str = "hddisco";

/// Parse hddisco output
pub fn parse_hddisco(output: &str) -> Result<DeviceInfo> {
    let mut info = DeviceInfo::new();
    let mut current: Option<String> = None;

    for (idx, line) in output.lines().enumerate() {
        let line_no = idx + 1;

        if let Some(header) = line.strip_prefix('=') {
            let device = header.trim_start_matches('=').trim().to_string();
            info.add_device(device.as_str());
            current = Some(device);
            continue;
        }
        if line.starts_with('P') || line.trim().is_empty() {
            continue;
        }

        let device = current.as_deref().ok_or_else(|| Error::Parse {
            source_name: SOURCE.to_string(),
            line_no,
            reason: format!("attribute before any device section: '{}'", line.trim()),
        })?;

        let (key, value) = split_attribute(line).ok_or_else(|| Error::Parse {
            source_name: SOURCE.to_string(),
            line_no,
            reason: format!("expected 'name value', got '{}'", line.trim()),
        })?;

        info.set_attribute(device, key, value);
    }

    Ok(info)
}

/// Split on the first run of whitespace, keeping inner whitespace in the value
fn split_attribute(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    let split = line.find(char::is_whitespace)?;
    let (key, rest) = line.split_at(split);
    let value = rest.trim();
    if value.is_empty() {
        return None;
    }
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ATTR_IS_SSD, ATTR_PRODUCT, ATTR_VENDOR};
    use assert_matches::assert_matches;

    #[test]
    fn test_two_sections() {
        let output = "=c0t0d0\nproduct ZeusRAM\n=c0t1d0\nis_ssd yes\n";
        let info = parse_hddisco(output).unwrap();

        assert_eq!(info.devices().collect::<Vec<_>>(), vec!["c0t0d0", "c0t1d0"]);
        assert_eq!(info.attributes("c0t0d0").unwrap().len(), 1);
        assert_eq!(info.attribute("c0t0d0", ATTR_PRODUCT).unwrap(), "ZeusRAM");
        assert_eq!(info.attributes("c0t1d0").unwrap().len(), 1);
        assert_eq!(info.attribute("c0t1d0", ATTR_IS_SSD).unwrap(), "yes");
    }

    #[test]
    fn test_path_lines_and_inner_whitespace() {
        let output = "\
= c0t5000C500A1B2C3D4d0
vendor SEAGATE
product   ST4000NM0023
is_ssd no
P start ====
P path_count 1
";
        let info = parse_hddisco(output).unwrap();

        assert_eq!(info.len(), 1);
        let attrs = info.attributes("c0t5000C500A1B2C3D4d0").unwrap();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[ATTR_VENDOR], "SEAGATE");
        assert_eq!(attrs[ATTR_PRODUCT], "ST4000NM0023");

        let info = parse_hddisco("=c0t0d0\ndescription HGST Ultrastar 7K4000\n").unwrap();
        assert_eq!(
            info.attribute("c0t0d0", "description").unwrap(),
            "HGST Ultrastar 7K4000"
        );
    }

    #[test]
    fn test_malformed_attribute_line() {
        let err = parse_hddisco("=c0t0d0\nvendor\n").unwrap_err();
        assert_matches!(err, Error::Parse { line_no: 2, .. });
    }

    #[test]
    fn test_attribute_without_section() {
        let err = parse_hddisco("vendor STEC\n").unwrap_err();
        assert_matches!(err, Error::Parse { line_no: 1, .. });
    }
}
