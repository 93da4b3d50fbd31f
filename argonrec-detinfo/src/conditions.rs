//! Run-conditions access with a configurable failure policy.
//!
//! Measured conditions (electron lifetime, trigger offset, temperature,
//! drift field) live in an external database reached through the
//! [`ConditionsDb`] trait. Depending on the policy, a missing record is
//! either fatal or silently replaced by the configured defaults.

use argonrec_core::error::{Error, Result};
use argonrec_core::ids::Channel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies one data-taking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunId {
    pub run: u32,
    pub subrun: u32,
}

impl RunId {
    #[must_use]
    pub fn new(run: u32, subrun: u32) -> Self {
        Self { run, subrun }
    }
}

/// Measured conditions of one run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConditionsRecord {
    /// Electron lifetime (ms).
    pub electron_lifetime: f64,
    /// Measured trigger offset (ticks).
    pub trigger_offset: f64,
    /// LAr temperature (K).
    pub temperature: f64,
    /// Drift field (kV/cm).
    pub efield: f64,
    /// Protons on target delivered during the run.
    pub pot: f64,
}

/// Per-run channel status map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelMapping {
    dead: Vec<Channel>,
    noisy: Vec<Channel>,
}

impl ChannelMapping {
    #[must_use]
    pub fn new(mut dead: Vec<Channel>, mut noisy: Vec<Channel>) -> Self {
        dead.sort_unstable();
        dead.dedup();
        noisy.sort_unstable();
        noisy.dedup();
        Self { dead, noisy }
    }

    /// Whether a channel was dead during the run.
    #[must_use]
    pub fn is_dead(&self, channel: Channel) -> bool {
        self.dead.binary_search(&channel).is_ok()
    }

    /// Whether a channel was flagged noisy during the run.
    #[must_use]
    pub fn is_noisy(&self, channel: Channel) -> bool {
        self.noisy.binary_search(&channel).is_ok()
    }

    /// Whether a channel is usable for reconstruction.
    #[must_use]
    pub fn is_good(&self, channel: Channel) -> bool {
        !self.is_dead(channel) && !self.is_noisy(channel)
    }
}

/// Access to the run-conditions database.
pub trait ConditionsDb: Send + Sync {
    /// Fetches the conditions of a run, `Ok(None)` when the run has no
    /// record yet.
    fn conditions(&self, run: RunId) -> Result<Option<ConditionsRecord>>;

    /// Fetches the channel status map of a run.
    fn channel_mapping(&self, run: RunId) -> Result<Option<ChannelMapping>>;
}

/// How missing or unreachable conditions are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionsPolicy {
    /// Treat missing records as errors instead of falling back to the
    /// configured defaults.
    pub tough_error_treatment: bool,
    /// Whether the database should be consulted at all.
    pub should_connect: bool,
}

impl Default for ConditionsPolicy {
    fn default() -> Self {
        Self {
            tough_error_treatment: false,
            should_connect: true,
        }
    }
}

impl ConditionsPolicy {
    /// Fetches a run record under this policy.
    ///
    /// With the database disabled, or a record missing under lenient
    /// treatment, `defaults` is returned. Under tough treatment a
    /// missing record or failed lookup is fatal.
    pub fn fetch(
        &self,
        db: &dyn ConditionsDb,
        run: RunId,
        defaults: &ConditionsRecord,
    ) -> Result<ConditionsRecord> {
        if !self.should_connect {
            return Ok(defaults.clone());
        }
        match db.conditions(run) {
            Ok(Some(record)) => Ok(record),
            Ok(None) if self.tough_error_treatment => Err(Error::Conditions(format!(
                "no conditions record for run {}/{}",
                run.run, run.subrun
            ))),
            Ok(None) => Ok(defaults.clone()),
            Err(err) if self.tough_error_treatment => Err(err),
            Err(_) => Ok(defaults.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDb {
        known: RunId,
        record: ConditionsRecord,
        fail: bool,
    }

    impl ConditionsDb for FakeDb {
        fn conditions(&self, run: RunId) -> Result<Option<ConditionsRecord>> {
            if self.fail {
                return Err(Error::Conditions("connection refused".into()));
            }
            Ok((run == self.known).then(|| self.record.clone()))
        }

        fn channel_mapping(&self, _run: RunId) -> Result<Option<ChannelMapping>> {
            Ok(None)
        }
    }

    fn record(lifetime: f64) -> ConditionsRecord {
        ConditionsRecord {
            electron_lifetime: lifetime,
            trigger_offset: 60.0,
            temperature: 87.3,
            efield: 0.5,
            pot: 0.0,
        }
    }

    fn db() -> FakeDb {
        FakeDb {
            known: RunId::new(1000, 1),
            record: record(8.0),
            fail: false,
        }
    }

    #[test]
    fn test_fetch_known_run() {
        let policy = ConditionsPolicy::default();
        let fetched = policy.fetch(&db(), RunId::new(1000, 1), &record(3.0)).unwrap();
        assert_eq!(fetched.electron_lifetime, 8.0);
    }

    #[test]
    fn test_missing_run_falls_back_when_lenient() {
        let policy = ConditionsPolicy::default();
        let fetched = policy.fetch(&db(), RunId::new(2000, 1), &record(3.0)).unwrap();
        assert_eq!(fetched.electron_lifetime, 3.0);
    }

    #[test]
    fn test_missing_run_fatal_when_tough() {
        let policy = ConditionsPolicy {
            tough_error_treatment: true,
            should_connect: true,
        };
        assert!(policy.fetch(&db(), RunId::new(2000, 1), &record(3.0)).is_err());
    }

    #[test]
    fn test_disconnected_policy_never_queries() {
        let policy = ConditionsPolicy {
            tough_error_treatment: true,
            should_connect: false,
        };
        let mut broken = db();
        broken.fail = true;
        let fetched = policy
            .fetch(&broken, RunId::new(1000, 1), &record(3.0))
            .unwrap();
        assert_eq!(fetched.electron_lifetime, 3.0);
    }

    #[test]
    fn test_channel_mapping_status() {
        let map = ChannelMapping::new(
            vec![Channel::new(7), Channel::new(3), Channel::new(7)],
            vec![Channel::new(11)],
        );
        assert!(map.is_dead(Channel::new(3)));
        assert!(map.is_noisy(Channel::new(11)));
        assert!(!map.is_good(Channel::new(7)));
        assert!(map.is_good(Channel::new(5)));
    }
}
