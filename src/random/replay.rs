//! Audit logging and replay of random draws.
//!
//! The authoritative peer wraps its source in a [`RecordingRandomSource`];
//! the records it produces are shipped (by some external transport) to the
//! other peers, whose [`ReplayRandomSource`] answers the same calls in the
//! same order from the log.

use tracing::warn;

use crate::error::{BattleError, Result};

use super::{DrawRecord, DrawRequest, RandomSource};

/// Wraps a source and keeps every answered request.
#[derive(Clone, Debug)]
pub struct RecordingRandomSource<R> {
    inner: R,
    log: Vec<DrawRecord>,
}

impl<R: RandomSource> RecordingRandomSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            log: Vec::new(),
        }
    }

    /// Records in call order.
    #[must_use]
    pub fn log(&self) -> &[DrawRecord] {
        &self.log
    }

    /// Take the records produced since the last call.
    pub fn drain_log(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.log)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: RandomSource> RandomSource for RecordingRandomSource<R> {
    fn draw(&mut self, request: &DrawRequest) -> Result<Vec<u32>> {
        let values = self.inner.draw(request)?;
        self.log.push(DrawRecord {
            request: request.clone(),
            values: values.clone(),
        });
        Ok(values)
    }
}

/// Answers requests from a log, keyed by call order.
///
/// - When the log is exhausted the source reports
///   [`BattleError::RandomUnavailable`]: the authority has not sent the
///   draw yet, and the battle suspends until [`ReplayRandomSource::extend`]
///   supplies it.
/// - When a request differs from the logged call in any field (bound,
///   count, participant, dice type or annotation), the peers have diverged
///   and the source reports [`BattleError::ReplayDesync`].
#[derive(Clone, Debug, Default)]
pub struct ReplayRandomSource {
    log: Vec<DrawRecord>,
    cursor: usize,
}

impl ReplayRandomSource {
    pub fn new(log: Vec<DrawRecord>) -> Self {
        Self { log, cursor: 0 }
    }

    /// Append records that arrived from the authority.
    pub fn extend(&mut self, records: impl IntoIterator<Item = DrawRecord>) {
        self.log.extend(records);
    }

    /// Records not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.log.len() - self.cursor
    }
}

impl RandomSource for ReplayRandomSource {
    fn draw(&mut self, request: &DrawRequest) -> Result<Vec<u32>> {
        request.validate()?;
        let Some(record) = self.log.get(self.cursor) else {
            warn!(
                index = self.cursor,
                annotation = %request.annotation,
                "replay log exhausted, waiting for authority"
            );
            return Err(BattleError::RandomUnavailable(format!(
                "no draw logged at index {}",
                self.cursor
            )));
        };

        if record.request != *request {
            let logged = &record.request;
            return Err(BattleError::ReplayDesync {
                index: self.cursor,
                detail: format!(
                    "logged {} {:?} {}x[0,{}) \"{}\" but requested {} {:?} {}x[0,{}) \"{}\"",
                    logged.participant,
                    logged.dice_type,
                    logged.count,
                    logged.upper_bound,
                    logged.annotation,
                    request.participant,
                    request.dice_type,
                    request.count,
                    request.upper_bound,
                    request.annotation
                ),
            });
        }

        self.cursor += 1;
        Ok(record.values.clone())
    }
}
