//! Stream spec types
//!
//! A [`StreamSpec`] describes one relay: where to pull from, how the
//! payload is encoded, and where to push it. Specs are created by the
//! parser and never change afterwards.

use std::fmt;
use std::str::FromStr;

use super::error::RecordError;

/// Hard limit on the number of supervised streams
pub const MAX_STREAMS: usize = 256;

/// ASCII record separator used by the configuration files
pub const RECORD_SEP: char = '\n';

/// ASCII field separator used by the configuration files
pub const UNIT_SEP: char = '\t';

/// Header-mode keyword for periodic configuration headers
pub const HEADER_PERIODIC: &str = "PERIODIC";

/// Header-mode keyword for a single leading configuration header
pub const HEADER_ONCE: &str = "ONCE";

/// Payload encoding of a relayed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// MPEG-4 Part 2 video
    Mpeg4,
    /// H.264 / AVC video
    H264,
}

impl Encoding {
    /// Keyword used in the stream file
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Mpeg4 => "MPEG4",
            Encoding::H264 => "H264",
        }
    }
}

impl FromStr for Encoding {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MPEG4" => Ok(Encoding::Mpeg4),
            "H264" => Ok(Encoding::H264),
            other => Err(RecordError::UnknownEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured source-to-destination relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    /// Position among accepted records (0-based)
    pub index: u8,

    /// Source location, e.g. `rtsp://camera/stream`
    pub source_uri: String,

    /// Payload encoding
    pub encoding: Encoding,

    /// Destination host (unicast or multicast address)
    pub dest_host: String,

    /// Destination UDP port (0 if the field did not parse)
    pub dest_port: u16,

    /// Repeat configuration headers throughout the stream
    pub periodic_header_enabled: bool,
}

impl StreamSpec {
    /// Build a spec from one stream-file record
    ///
    /// Fields are `source_uri`, `encoding`, `dest_host`, `dest_port` and an
    /// optional header-mode keyword, separated by [`UNIT_SEP`].
    pub fn from_record(index: u8, record: &str) -> Result<Self, RecordError> {
        let mut fields = record.trim_end_matches('\r').split(UNIT_SEP);

        let source_uri = required(fields.next(), "source_uri")?;
        let encoding = required(fields.next(), "encoding")?.parse::<Encoding>()?;
        let dest_host = required(fields.next(), "dest_host")?;
        let dest_port = fields.next().map(parse_port).unwrap_or(0);
        let periodic_header_enabled = fields.next().map(parse_header_mode).unwrap_or(true);

        Ok(Self {
            index,
            source_uri: source_uri.to_string(),
            encoding,
            dest_host: dest_host.to_string(),
            dest_port,
            periodic_header_enabled,
        })
    }

    /// Serialize back to stream-file record form (without separator)
    pub fn to_record(&self) -> String {
        let mode = if self.periodic_header_enabled {
            HEADER_PERIODIC
        } else {
            HEADER_ONCE
        };
        [
            self.source_uri.as_str(),
            self.encoding.as_str(),
            self.dest_host.as_str(),
            &self.dest_port.to_string(),
            mode,
        ]
        .join(&UNIT_SEP.to_string())
    }

    /// Destination as `host:port`
    pub fn destination(&self) -> String {
        format!("{}:{}", self.dest_host, self.dest_port)
    }
}

fn required<'a>(field: Option<&'a str>, name: &'static str) -> Result<&'a str, RecordError> {
    match field.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RecordError::MissingField(name)),
    }
}

/// Parse a port field; anything that is not a valid port becomes 0
pub(crate) fn parse_port(field: &str) -> u16 {
    field.trim().parse::<u16>().unwrap_or(0)
}

/// Interpret the header-mode keyword
///
/// Only an explicit "once"-style keyword disables periodic headers.
pub(crate) fn parse_header_mode(field: &str) -> bool {
    let keyword = field.trim();
    if keyword.is_empty() {
        return true;
    }
    match keyword.to_ascii_uppercase().as_str() {
        HEADER_PERIODIC | "ON" | "TRUE" | "1" => true,
        HEADER_ONCE | "SINGLE" | "OFF" | "FALSE" | "0" => false,
        _ => {
            tracing::warn!(keyword = keyword, "Unknown header mode, using periodic");
            true
        }
    }
}
