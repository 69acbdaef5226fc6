//! Configuration text parser
//!
//! Turns the raw text of the stream file into an ordered list of
//! [`StreamSpec`]s and the global config file into a [`GlobalConfig`].
//! Nothing here touches the filesystem.

use super::error::RecordError;
use super::spec::{StreamSpec, MAX_STREAMS, RECORD_SEP, UNIT_SEP};

/// Keyword that opens the global config record
pub const GLOBAL_COMMAND: &str = "config";

/// Monitor count used when the global config is missing or zero
pub const DEFAULT_MONITOR_COUNT: u32 = 1;

/// Global (non-stream) settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Number of monitors to drive; never zero
    pub monitor_count: u32,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            monitor_count: DEFAULT_MONITOR_COUNT,
        }
    }
}

/// A record the parser refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// 1-based line number in the stream file
    pub line: usize,
    /// Why it was refused
    pub reason: RecordError,
}

/// Result of parsing the stream file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStreams {
    /// Accepted specs in file order; `specs[n].index == n`
    pub specs: Vec<StreamSpec>,
    /// Records that were skipped
    pub rejected: Vec<RejectedRecord>,
    /// Records left unread because the stream limit was reached
    pub truncated: usize,
}

/// Parse the stream file
///
/// Blank records are ignored. A record that fails to parse is logged and
/// skipped without consuming an index.
pub fn parse_streams(text: &str) -> ParsedStreams {
    let mut parsed = ParsedStreams::default();

    for (line_no, record) in text.split(RECORD_SEP).enumerate() {
        if record.trim().is_empty() {
            continue;
        }
        if parsed.specs.len() >= MAX_STREAMS {
            parsed.truncated += 1;
            continue;
        }

        let index = parsed.specs.len() as u8;
        match StreamSpec::from_record(index, record) {
            Ok(spec) => {
                tracing::debug!(
                    index = spec.index,
                    source = %spec.source_uri,
                    encoding = %spec.encoding,
                    dest = %spec.destination(),
                    "Stream accepted"
                );
                parsed.specs.push(spec);
            }
            Err(reason) => {
                tracing::error!(line = line_no + 1, error = %reason, "Stream record rejected");
                parsed.rejected.push(RejectedRecord {
                    line: line_no + 1,
                    reason,
                });
            }
        }
    }

    if parsed.truncated > 0 {
        tracing::warn!(
            limit = MAX_STREAMS,
            ignored = parsed.truncated,
            "Stream limit reached, remaining records ignored"
        );
    }

    parsed
}

/// Parse the global config file
///
/// Only the first record is considered. Anything other than
/// `config <TAB> <n>` with `n > 0` yields the default.
pub fn parse_global(text: &str) -> GlobalConfig {
    let record = text.split(RECORD_SEP).next().unwrap_or("");
    if record.is_empty() {
        return GlobalConfig::default();
    }

    let mut fields = record.trim_end_matches('\r').split(UNIT_SEP);
    if fields.next() != Some(GLOBAL_COMMAND) {
        tracing::error!(record = record, "Invalid command");
        return GlobalConfig::default();
    }

    let monitor_count = fields
        .next()
        .and_then(|f| f.trim().parse::<u32>().ok())
        .unwrap_or(0);

    if monitor_count == 0 {
        tracing::warn!(default = DEFAULT_MONITOR_COUNT, "Monitor count missing or zero");
        return GlobalConfig::default();
    }

    GlobalConfig { monitor_count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Encoding;

    #[test]
    fn test_indices_follow_acceptance_order() {
        let text = "rtsp://a\tH264\th\t1\n\
                    rtsp://b\tVP9\th\t2\n\
                    rtsp://c\tMPEG4\th\t3\n";
        let parsed = parse_streams(text);

        assert_eq!(parsed.specs.len(), 2);
        assert_eq!(parsed.specs[0].index, 0);
        assert_eq!(parsed.specs[0].source_uri, "rtsp://a");
        assert_eq!(parsed.specs[1].index, 1);
        assert_eq!(parsed.specs[1].source_uri, "rtsp://c");
        assert_eq!(parsed.specs[1].encoding, Encoding::Mpeg4);

        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].line, 2);
        assert_eq!(
            parsed.rejected[0].reason,
            RecordError::UnknownEncoding("VP9".into())
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        let text = "\nrtsp://a\tH264\th\t1\n\n\nrtsp://b\tH264\th\t2";
        let parsed = parse_streams(text);

        assert_eq!(parsed.specs.len(), 2);
        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.specs[1].index, 1);
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_streams("");
        assert!(parsed.specs.is_empty());
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_stream_limit() {
        let mut text = String::new();
        for i in 0..(MAX_STREAMS + 4) {
            text.push_str(&format!("rtsp://cam{}\tH264\thost\t{}\n", i, 5000 + i));
        }
        let parsed = parse_streams(&text);

        assert_eq!(parsed.specs.len(), MAX_STREAMS);
        assert_eq!(parsed.truncated, 4);
        assert_eq!(parsed.specs.last().unwrap().index, 255);
        assert_eq!(parsed.specs.last().unwrap().source_uri, "rtsp://cam255");
    }

    #[test]
    fn test_rejected_records_do_not_count_toward_limit() {
        let mut text = String::from("rtsp://x\tVP8\thost\t1\n");
        for i in 0..MAX_STREAMS {
            text.push_str(&format!("rtsp://cam{}\tMPEG4\thost\t1\n", i));
        }
        let parsed = parse_streams(&text);

        assert_eq!(parsed.specs.len(), MAX_STREAMS);
        assert_eq!(parsed.truncated, 0);
        assert_eq!(parsed.specs[0].source_uri, "rtsp://cam0");
    }

    #[test]
    fn test_global_config_value() {
        assert_eq!(parse_global("config\t7\n").monitor_count, 7);
        assert_eq!(parse_global("config\t3").monitor_count, 3);
    }

    #[test]
    fn test_global_config_defaults() {
        assert_eq!(parse_global("config\t0\n").monitor_count, 1);
        assert_eq!(parse_global("").monitor_count, 1);
        assert_eq!(parse_global("config\tmany\n").monitor_count, 1);
        assert_eq!(parse_global("config\n").monitor_count, 1);
        assert_eq!(parse_global("monitors\t4\n").monitor_count, 1);
    }

    #[test]
    fn test_global_config_only_first_record() {
        assert_eq!(parse_global("config\t2\nconfig\t9\n").monitor_count, 2);
    }
}
