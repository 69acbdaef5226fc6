//! Worker assignment passed from the supervisor to a worker process
//!
//! The supervisor re-executes its own binary for every stream and hands the
//! stream over through two environment variables: the stream index and the
//! spec in stream-file record form.

use crate::config::StreamSpec;
use crate::error::{Error, Result};

/// Environment variable carrying the stream index
pub const INDEX_ENV: &str = "POLYSTREAM_STREAM_INDEX";

/// Environment variable carrying the stream record
pub const RECORD_ENV: &str = "POLYSTREAM_STREAM_RECORD";

/// Environment entries that assign `spec` to a worker process
pub fn assignment_env(spec: &StreamSpec) -> [(&'static str, String); 2] {
    [
        (INDEX_ENV, spec.index.to_string()),
        (RECORD_ENV, spec.to_record()),
    ]
}

/// Stream assigned to this process, if it is a worker
pub fn assignment_from_env() -> Option<Result<StreamSpec>> {
    assignment_from_lookup(|key| std::env::var(key).ok())
}

/// Stream assignment read through `lookup`
///
/// `None` means no assignment at all (supervisor mode); a partial or
/// malformed assignment is an error.
pub fn assignment_from_lookup<F>(lookup: F) -> Option<Result<StreamSpec>>
where
    F: Fn(&str) -> Option<String>,
{
    let index = lookup(INDEX_ENV);
    let record = lookup(RECORD_ENV);

    match (index, record) {
        (None, None) => None,
        (Some(index), Some(record)) => Some(decode(&index, &record)),
        (Some(_), None) => Some(Err(Error::Assignment(format!("{} not set", RECORD_ENV)))),
        (None, Some(_)) => Some(Err(Error::Assignment(format!("{} not set", INDEX_ENV)))),
    }
}

fn decode(index: &str, record: &str) -> Result<StreamSpec> {
    let index = index
        .trim()
        .parse::<u8>()
        .map_err(|_| Error::Assignment(format!("bad stream index {:?}", index)))?;
    Ok(StreamSpec::from_record(index, record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_assignment_carries_spec() {
        let spec = StreamSpec::from_record(42, "rtsp://cam/42\tMPEG4\t239.1.1.42\t5042\tONCE").unwrap();
        let vars: HashMap<_, _> = assignment_env(&spec).into_iter().collect();

        let decoded = assignment_from_lookup(lookup_in(vars)).unwrap().unwrap();
        assert_eq!(decoded, spec);
    }

    #[test]
    fn test_no_assignment() {
        assert!(assignment_from_lookup(|_| None).is_none());
    }

    #[test]
    fn test_partial_assignment() {
        let vars = HashMap::from([(INDEX_ENV, "1".to_string())]);

        let result = assignment_from_lookup(lookup_in(vars)).unwrap();
        assert!(matches!(result, Err(Error::Assignment(_))));
    }

    #[test]
    fn test_bad_index() {
        let vars = HashMap::from([
            (INDEX_ENV, "300".to_string()),
            (RECORD_ENV, "rtsp://cam\tH264\th\t1".to_string()),
        ]);

        let result = assignment_from_lookup(lookup_in(vars)).unwrap();
        assert!(matches!(result, Err(Error::Assignment(_))));
    }

    #[test]
    fn test_bad_record() {
        let vars = HashMap::from([
            (INDEX_ENV, "0".to_string()),
            (RECORD_ENV, "rtsp://cam\tVP9\th\t1".to_string()),
        ]);

        let result = assignment_from_lookup(lookup_in(vars)).unwrap();
        assert!(matches!(result, Err(Error::Record(_))));
    }
}
