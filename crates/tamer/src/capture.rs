//! Packet capture files
//!
//! One record per line:
//!
//! ```text
//! # comment
//! in  <hex frame>
//! out <hex frame>
//! disconnect
//! ```
//!
//! A hex frame is the full wire frame: `u32` length, `u16` header, payload.

use anyhow::{anyhow, bail, Context, Result};
use bytes::BytesMut;
use tamer_protocol::{Direction, FramedCodec, Intercept, Packet};

/// One line of a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRecord {
    Packet(Direction, Packet),
    Disconnect,
}

impl CaptureRecord {
    pub fn into_intercept(self) -> Option<Intercept> {
        match self {
            CaptureRecord::Packet(direction, packet) => Some(Intercept::new(direction, packet)),
            CaptureRecord::Disconnect => None,
        }
    }
}

/// Parse a whole capture; errors name the offending line
pub fn parse_capture(text: &str) -> Result<Vec<CaptureRecord>> {
    let mut records = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record = parse_line(line).with_context(|| format!("capture line {}", number + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn parse_line(line: &str) -> Result<CaptureRecord> {
    let (tag, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));

    let direction = match tag {
        "disconnect" => return Ok(CaptureRecord::Disconnect),
        "in" => Direction::Incoming,
        "out" => Direction::Outgoing,
        other => bail!("unknown record type {other:?}"),
    };

    let raw = hex::decode(rest.trim()).context("invalid hex frame")?;
    let mut buf = BytesMut::from(&raw[..]);
    let packet = FramedCodec::decode(&mut buf)?
        .ok_or_else(|| anyhow!("incomplete frame"))?;
    if !buf.is_empty() {
        bail!("{} trailing bytes after frame", buf.len());
    }

    Ok(CaptureRecord::Packet(direction, packet))
}

/// Render a packet as a capture line
pub fn format_record(record: &CaptureRecord) -> Result<String> {
    match record {
        CaptureRecord::Disconnect => Ok("disconnect".to_string()),
        CaptureRecord::Packet(direction, packet) => {
            let mut buf = BytesMut::new();
            FramedCodec::encode(packet, &mut buf)?;
            let tag = match direction {
                Direction::Incoming => "in",
                Direction::Outgoing => "out",
            };
            Ok(format!("{tag} {}", hex::encode(&buf)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tamer_protocol::Header;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "# header\n\nin 00000002abcd\ndisconnect\n";
        let records = parse_capture(text).unwrap();
        assert_eq!(
            records,
            vec![
                CaptureRecord::Packet(Direction::Incoming, Packet::empty(Header(0xabcd))),
                CaptureRecord::Disconnect,
            ]
        );
    }

    #[test]
    fn test_bad_line_reports_number() {
        let err = parse_capture("in 00000002abcd\nsideways 00").unwrap_err();
        assert!(format!("{err:#}").contains("capture line 2"));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert!(parse_capture("in 00000002abcdff").is_err());
    }
}
