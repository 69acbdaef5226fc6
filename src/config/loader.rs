//! Configuration file loading
//!
//! Reads the two configuration files from the config directory. Both are
//! capped in size; a file that is missing, unreadable, a symlink, or too
//! large is logged and treated as empty.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use crate::error::{Error, Result};

use super::parser::{parse_global, parse_streams, GlobalConfig, ParsedStreams};

/// File name of the global config
pub const GLOBAL_FILE: &str = "config";

/// Size cap of the global config
pub const GLOBAL_FILE_LIMIT: usize = 128;

/// File name of the stream list
pub const STREAMS_FILE: &str = "streams";

/// Size cap of the stream list
pub const STREAMS_FILE_LIMIT: usize = 64 * 1024;

/// Read a whole file, refusing symlinks and anything over `limit` bytes
pub fn read_capped(path: &Path, limit: usize) -> Result<String> {
    if fs::symlink_metadata(path)?.file_type().is_symlink() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "refusing to follow symlink",
        )));
    }

    let mut buf = Vec::with_capacity(limit.min(8 * 1024));
    File::open(path)?
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)?;

    if buf.len() > limit {
        return Err(Error::Oversized { limit });
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read a file, degrading any failure to empty text
pub fn load_text(path: &Path, limit: usize) -> String {
    match read_capped(path, limit) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Config file unusable");
            String::new()
        }
    }
}

/// Load the global config from `dir`
pub fn load_global(dir: &Path) -> GlobalConfig {
    parse_global(&load_text(&dir.join(GLOBAL_FILE), GLOBAL_FILE_LIMIT))
}

/// Load the stream list from `dir`
pub fn load_streams(dir: &Path) -> ParsedStreams {
    parse_streams(&load_text(&dir.join(STREAMS_FILE), STREAMS_FILE_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &[u8]) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents).unwrap();
    }

    #[test]
    fn test_load_global() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), GLOBAL_FILE, b"config\t7\n");

        assert_eq!(load_global(dir.path()).monitor_count, 7);
    }

    #[test]
    fn test_load_global_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(load_global(dir.path()).monitor_count, 1);
    }

    #[test]
    fn test_load_global_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = b"config\t4\n".to_vec();
        contents.resize(GLOBAL_FILE_LIMIT + 1, b' ');
        write_file(dir.path(), GLOBAL_FILE, &contents);

        assert_eq!(load_global(dir.path()).monitor_count, 1);
    }

    #[test]
    fn test_read_capped_exact_limit() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "f", &[b'a'; 16]);

        let text = read_capped(&dir.path().join("f"), 16).unwrap();
        assert_eq!(text.len(), 16);
        assert!(matches!(
            read_capped(&dir.path().join("f"), 15),
            Err(Error::Oversized { limit: 15 })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_capped_refuses_symlink() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "real", b"config\t3\n");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join(GLOBAL_FILE)).unwrap();

        assert!(read_capped(&dir.path().join(GLOBAL_FILE), GLOBAL_FILE_LIMIT).is_err());
        assert_eq!(load_global(dir.path()).monitor_count, 1);
    }

    #[test]
    fn test_load_streams() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            STREAMS_FILE,
            b"rtsp://a\tH264\t239.1.1.1\t5000\nrtsp://b\tVP9\th\t1\n",
        );

        let parsed = load_streams(dir.path());
        assert_eq!(parsed.specs.len(), 1);
        assert_eq!(parsed.rejected.len(), 1);
    }

    #[test]
    fn test_load_streams_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        assert!(load_streams(dir.path()).specs.is_empty());
    }
}
