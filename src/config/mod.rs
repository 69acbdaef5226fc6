//! Relay configuration
//!
//! Two plain-text files drive the relay, both using `\n` between records
//! and `\t` between fields:
//!
//! ```text
//! config    config <TAB> <monitor count>
//! streams   <source uri> <TAB> <encoding> <TAB> <host> <TAB> <port> [<TAB> <header mode>]
//! ```
//!
//! Parsing is forgiving: a bad record is logged and skipped, a bad file is
//! treated as empty. Runtime knobs that are not part of these files live in
//! [`RelayConfig`].

pub mod error;
pub mod loader;
pub mod parser;
pub mod settings;
pub mod spec;

pub use error::RecordError;
pub use loader::{load_global, load_streams};
pub use parser::{parse_global, parse_streams, GlobalConfig, ParsedStreams, RejectedRecord};
pub use settings::RelayConfig;
pub use spec::{Encoding, StreamSpec, MAX_STREAMS};
