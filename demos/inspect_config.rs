//! Show what the relay would do with a stream file
//!
//! Run with: cargo run --example inspect_config [STREAMS_FILE]
//!
//! Parses the file the same way the supervisor does and prints, for every
//! accepted stream, the pipeline a worker would launch. Rejected records
//! are listed with the reason.
//!
//! Example stream file:
//!
//! ```text
//! rtsp://10.0.0.5/stream1	H264	239.1.1.5	5000
//! rtsp://10.0.0.6/video	MPEG4	239.1.1.6	5000	ONCE
//! ```

use std::path::PathBuf;

use polystream::config::loader::{load_text, STREAMS_FILE, STREAMS_FILE_LIMIT};
use polystream::config::parse_streams;
use polystream::engine::adapter::describe_pipeline;
use polystream::engine::PipelineSettings;
use polystream::RelayConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polystream=debug".parse()?),
        )
        .init();

    let config = RelayConfig::from_env();
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.config_dir.join(STREAMS_FILE));

    let parsed = parse_streams(&load_text(&path, STREAMS_FILE_LIMIT));
    let settings = PipelineSettings::from(&config);

    println!(
        "{}: {} accepted, {} rejected",
        path.display(),
        parsed.specs.len(),
        parsed.rejected.len()
    );
    println!();

    for spec in &parsed.specs {
        println!(
            "[{}] {} ({}) -> {}",
            spec.index,
            spec.source_uri,
            spec.encoding,
            spec.destination()
        );
        match describe_pipeline(spec, &settings) {
            Ok(args) => println!("    {} {}", settings.program.display(), args.join(" ")),
            Err(msg) => println!("    not relayable: {}", msg),
        }
    }

    for rejected in &parsed.rejected {
        println!("line {}: {}", rejected.line, rejected.reason);
    }

    Ok(())
}
