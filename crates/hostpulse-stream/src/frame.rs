//! Immutable serialized frames.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// One encoded tick, ready to be written to any number of clients.
///
/// Cloning a frame only bumps a reference count on the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    sequence: u64,
    timestamp: DateTime<Utc>,
    collection: Duration,
    payload: Bytes,
}

impl Frame {
    /// Wrap an encoded payload.
    pub fn new(
        sequence: u64,
        timestamp: DateTime<Utc>,
        collection: Duration,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            sequence,
            timestamp,
            collection,
            payload: payload.into(),
        }
    }

    /// Tick sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wall-clock time the tick started.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Duration of the slowest collector for the tick.
    pub fn collection(&self) -> Duration {
        self.collection
    }

    /// Serialized snapshot.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}
