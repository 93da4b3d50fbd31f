//! Parameter inheritance from persisted configuration sets.
//!
//! Reprocessed data carries the parameter sets of every stage that
//! produced it, serialized as JSON objects. A provider can inherit a
//! numeric parameter from its own historical sets: sets belonging to
//! other subsystems are skipped by a key-set match, values equal to the
//! current configuration are ignored, and two disagreeing historical
//! values are a fatal conflict.

use argonrec_core::error::{Error, Result};
use serde_json::Value;

/// Whether a persisted set looks like it came from the calling
/// subsystem: every match key must be present.
fn matches_subsystem(set: &Value, match_keys: &[&str]) -> bool {
    match_keys.iter().all(|key| set.get(key).is_some())
}

fn numeric(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Scans `history` for overrides of `key`, returning the inherited value
/// if any historical set disagrees with `current`.
///
/// # Errors
///
/// [`Error::InheritConflict`] if two historical sets carry different
/// values for `key`.
pub fn resolve_numeric(
    key: &'static str,
    current: f64,
    history: &[Value],
    match_keys: &[&str],
) -> Result<Option<f64>> {
    let mut inherited: Option<f64> = None;
    for set in history {
        if !matches_subsystem(set, match_keys) {
            continue;
        }
        let Some(value) = set.get(key).and_then(numeric) else {
            continue;
        };
        if value == current {
            continue;
        }
        match inherited {
            None => inherited = Some(value),
            Some(first) if first == value => {}
            Some(first) => {
                return Err(Error::InheritConflict {
                    key,
                    first,
                    second: value,
                });
            }
        }
    }
    Ok(inherited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEYS: &[&str] = &["NumberTimeSamples", "ReadOutWindowSize"];

    #[test]
    fn test_no_history_keeps_current() {
        assert_eq!(
            resolve_numeric("NumberTimeSamples", 6400.0, &[], KEYS).unwrap(),
            None
        );
    }

    #[test]
    fn test_agreeing_history_is_ignored() {
        let history = vec![json!({"NumberTimeSamples": 6400.0, "ReadOutWindowSize": 6400.0})];
        assert_eq!(
            resolve_numeric("NumberTimeSamples", 6400.0, &history, KEYS).unwrap(),
            None
        );
    }

    #[test]
    fn test_single_override_wins() {
        let history = vec![
            json!({"NumberTimeSamples": 9600.0, "ReadOutWindowSize": 9600.0}),
            json!({"NumberTimeSamples": 9600.0, "ReadOutWindowSize": 9600.0}),
        ];
        assert_eq!(
            resolve_numeric("NumberTimeSamples", 6400.0, &history, KEYS).unwrap(),
            Some(9600.0)
        );
    }

    #[test]
    fn test_foreign_sets_are_skipped() {
        // Same key name, but the key set does not match the subsystem.
        let history = vec![json!({"NumberTimeSamples": 1.0, "FFTSize": 4096.0})];
        assert_eq!(
            resolve_numeric("NumberTimeSamples", 6400.0, &history, KEYS).unwrap(),
            None
        );
    }

    #[test]
    fn test_conflicting_overrides_fail() {
        let history = vec![
            json!({"NumberTimeSamples": 9600.0, "ReadOutWindowSize": 9600.0}),
            json!({"NumberTimeSamples": 3200.0, "ReadOutWindowSize": 3200.0}),
        ];
        let err = resolve_numeric("NumberTimeSamples", 6400.0, &history, KEYS).unwrap_err();
        assert!(matches!(
            err,
            Error::InheritConflict {
                key: "NumberTimeSamples",
                ..
            }
        ));
    }
}
