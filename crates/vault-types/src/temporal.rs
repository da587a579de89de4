use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Persisted textual layout: `YYYYMMDDThhmmss.ffffffZ`.
const FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";
const RENDERED_LEN: usize = 23;

/// A UTC instant at microsecond precision.
///
/// Anything finer than a microsecond is dropped on construction so that the
/// value survives a render/parse round trip unchanged.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerTimestamp(DateTime<Utc>);

impl LedgerTimestamp {
    /// The current wall-clock instant.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(6))
    }

    /// Build from whole seconds plus microseconds since the UNIX epoch.
    pub fn from_unix_micros(micros: i64) -> Option<Self> {
        Utc.timestamp_micros(micros).single().map(Self)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn unix_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }
}

impl fmt::Display for LedgerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl fmt::Debug for LedgerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerTimestamp({self})")
    }
}

impl FromStr for LedgerTimestamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| TypeError::InvalidTimestamp {
            value: s.to_string(),
            reason,
        };
        if s.len() != RENDERED_LEN {
            return Err(invalid(format!(
                "expected {RENDERED_LEN} characters, got {}",
                s.len()
            )));
        }
        let naive =
            NaiveDateTime::parse_from_str(s, FORMAT).map_err(|e| invalid(e.to_string()))?;
        Ok(Self(naive.and_utc()))
    }
}

impl Serialize for LedgerTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LedgerTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
