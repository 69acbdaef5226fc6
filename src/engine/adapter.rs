//! gst-launch pipeline description and output adaptation
//!
//! Builds the `gst-launch-1.0` argument list for a stream and maps the
//! lines the launcher prints onto [`EngineEvent`]s.
//!
//! ```text
//! rtspsrc ─► video caps ─► depay ─► pay (config-interval) ─► udpsink
//!                    └────────── periodic headers disabled ──────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Encoding, RelayConfig, StreamSpec};

use super::EngineEvent;

/// Only the video stream of an RTSP session is relayed
const VIDEO_CAPS: &str = "application/x-rtp,media=video";

/// Settings shared by every pipeline a launcher builds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Launcher executable
    pub program: PathBuf,
    /// RTSP jitter buffer latency in milliseconds
    pub latency_ms: u32,
    /// Multicast TTL of the UDP sink
    pub multicast_ttl: u32,
    /// Source silence before a timeout is reported
    pub source_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for PipelineSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            program: config.launch_program.clone(),
            latency_ms: config.source_latency_ms,
            multicast_ttl: config.multicast_ttl,
            source_timeout: config.source_timeout,
        }
    }
}

/// Build the launcher arguments for `spec`
///
/// Returns the error message to report when the spec cannot be relayed.
pub fn describe_pipeline(
    spec: &StreamSpec,
    settings: &PipelineSettings,
) -> Result<Vec<String>, String> {
    if !spec.source_uri.starts_with("rtsp") {
        return Err(format!("Invalid location: {}", spec.source_uri));
    }

    let mut args: Vec<String> = vec![
        "-m".into(),
        "rtspsrc".into(),
        format!("location={}", spec.source_uri),
        format!("latency={}", settings.latency_ms),
        format!("timeout={}", settings.source_timeout.as_micros()),
        "!".into(),
        VIDEO_CAPS.into(),
        "!".into(),
    ];

    if spec.periodic_header_enabled {
        let (depay, pay, interval) = match spec.encoding {
            Encoding::Mpeg4 => ("rtpmp4vdepay", "rtpmp4vpay", 1),
            // -1 sends SPS/PPS with every IDR frame
            Encoding::H264 => ("rtph264depay", "rtph264pay", -1),
        };
        args.extend([
            depay.to_string(),
            "!".into(),
            pay.to_string(),
            format!("config-interval={}", interval),
            "!".into(),
        ]);
    }

    args.extend([
        "udpsink".to_string(),
        format!("host={}", spec.dest_host),
        format!("port={}", spec.dest_port),
        format!("ttl-mc={}", settings.multicast_ttl),
    ]);

    Ok(args)
}

/// Map one line of launcher output to an engine event
pub fn classify_line(line: &str) -> Option<EngineEvent> {
    let line = line.trim();

    if line.contains("GstUDPSrcTimeout") {
        return Some(EngineEvent::SourceTimeout);
    }
    if line.contains("(async-done)") {
        return Some(EngineEvent::Started);
    }
    if line.starts_with("Got EOS from element") {
        return Some(EngineEvent::EndOfStream);
    }
    if let Some(msg) = line.strip_prefix("ERROR:") {
        return Some(EngineEvent::Error(message_text(msg)));
    }
    if let Some(msg) = line.strip_prefix("WARNING:") {
        return Some(EngineEvent::Warning(message_text(msg)));
    }

    None
}

/// Strip the `from element <path>:` prefix the launcher puts on messages
fn message_text(msg: &str) -> String {
    let msg = msg.trim();
    match msg.strip_prefix("from element ") {
        Some(rest) => match rest.split_once(": ") {
            Some((element, text)) => format!("{} ({})", text.trim(), element),
            None => rest.to_string(),
        },
        None => msg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(record: &str) -> StreamSpec {
        StreamSpec::from_record(0, record).unwrap()
    }

    #[test]
    fn test_describe_h264_periodic() {
        let args = describe_pipeline(
            &spec("rtsp://cam/1\tH264\t239.0.0.1\t5000"),
            &PipelineSettings::default(),
        )
        .unwrap();

        let joined = args.join(" ");
        assert!(joined.starts_with("-m rtspsrc location=rtsp://cam/1 latency=0 timeout=5000000"));
        assert!(joined.contains("rtph264depay ! rtph264pay config-interval=-1 !"));
        assert!(joined.ends_with("udpsink host=239.0.0.1 port=5000 ttl-mc=15"));
    }

    #[test]
    fn test_describe_mpeg4_periodic() {
        let args = describe_pipeline(
            &spec("rtsp://cam/2\tMPEG4\t10.0.0.2\t6000"),
            &PipelineSettings::default(),
        )
        .unwrap();

        let joined = args.join(" ");
        assert!(joined.contains("rtpmp4vdepay ! rtpmp4vpay config-interval=1 !"));
    }

    #[test]
    fn test_describe_passthrough() {
        let args = describe_pipeline(
            &spec("rtsp://cam/3\tH264\t10.0.0.3\t6000\tONCE"),
            &PipelineSettings::default(),
        )
        .unwrap();

        let joined = args.join(" ");
        assert!(!joined.contains("depay"));
        assert!(joined.contains(&format!("{} ! udpsink", VIDEO_CAPS)));
    }

    #[test]
    fn test_describe_uses_settings() {
        let settings = PipelineSettings::from(
            &RelayConfig::default()
                .source_latency_ms(250)
                .multicast_ttl(3)
                .source_timeout(Duration::from_secs(2)),
        );
        let args = describe_pipeline(&spec("rtsp://cam\tH264\th\t1"), &settings).unwrap();

        assert!(args.contains(&"latency=250".to_string()));
        assert!(args.contains(&"ttl-mc=3".to_string()));
        assert!(args.contains(&"timeout=2000000".to_string()));
    }

    #[test]
    fn test_describe_rejects_non_rtsp() {
        let result = describe_pipeline(
            &spec("http://cam/video\tH264\th\t1"),
            &PipelineSettings::default(),
        );

        assert_eq!(result, Err("Invalid location: http://cam/video".to_string()));
    }

    #[test]
    fn test_classify_started() {
        let line = "Got message #42 from pipeline \"pipeline0\" (async-done): GstMessageAsyncDone";
        assert_eq!(classify_line(line), Some(EngineEvent::Started));
    }

    #[test]
    fn test_classify_eos() {
        assert_eq!(
            classify_line("Got EOS from element \"pipeline0\"."),
            Some(EngineEvent::EndOfStream)
        );
    }

    #[test]
    fn test_classify_error() {
        let line = "ERROR: from element /GstPipeline:pipeline0/GstRTSPSrc:rtspsrc0: Could not open resource for reading and writing.";
        assert_eq!(
            classify_line(line),
            Some(EngineEvent::Error(
                "Could not open resource for reading and writing. (/GstPipeline:pipeline0/GstRTSPSrc:rtspsrc0)"
                    .into()
            ))
        );

        let line = "ERROR: pipeline could not be constructed: no element \"rtph264depay\".";
        assert!(matches!(classify_line(line), Some(EngineEvent::Error(_))));
    }

    #[test]
    fn test_classify_warning() {
        let line = "WARNING: from element /GstPipeline:pipeline0/GstUDPSink:udpsink0: Pipeline construction is invalid";
        assert!(matches!(classify_line(line), Some(EngineEvent::Warning(_))));
    }

    #[test]
    fn test_classify_source_timeout() {
        let line = "Got message #77 from element \"udpsrc0\" (element): GstUDPSrcTimeout, timeout=(guint64)5000000000;";
        assert_eq!(classify_line(line), Some(EngineEvent::SourceTimeout));
    }

    #[test]
    fn test_classify_noise() {
        assert_eq!(classify_line("Setting pipeline to PAUSED ..."), None);
        assert_eq!(classify_line("Additional debug info:"), None);
        assert_eq!(classify_line(""), None);
    }
}
