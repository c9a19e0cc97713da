//! Serialized access to one random source from many battles.

use std::sync::{Arc, Mutex};

use crate::error::{BattleError, Result};

use super::{DrawRequest, RandomSource};

/// A cloneable handle to a single random source.
///
/// Battles resolving on different threads each hold a clone. Every draw
/// takes the lock for the whole request, so the draws form one total order
/// and a request's values are never interleaved with another battle's.
#[derive(Debug)]
pub struct SharedRandomSource<R> {
    inner: Arc<Mutex<R>>,
}

impl<R> Clone for SharedRandomSource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RandomSource> SharedRandomSource<R> {
    pub fn new(source: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    /// Run `f` against the underlying source while holding the lock.
    pub fn with_source<T>(&self, f: impl FnOnce(&mut R) -> T) -> Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| BattleError::invariant("random source lock poisoned"))?;
        Ok(f(&mut guard))
    }
}

impl<R: RandomSource> RandomSource for SharedRandomSource<R> {
    fn draw(&mut self, request: &DrawRequest) -> Result<Vec<u32>> {
        self.with_source(|source| source.draw(request))?
    }
}
