//! Replayed classification ratios for dry runs and tests

use super::ClassificationSource;
use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Returns queued ratios in order; `None` entries simulate a failed capture.
/// Once the queue is empty every call fails.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    queue: VecDeque<Option<f32>>,
}

impl ScriptedSource {
    pub fn new(ratios: impl IntoIterator<Item = f32>) -> Self {
        Self::with_failures(ratios.into_iter().map(Some))
    }

    pub fn with_failures(entries: impl IntoIterator<Item = Option<f32>>) -> Self {
        Self {
            queue: entries.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl ClassificationSource for ScriptedSource {
    fn capture_and_classify(&mut self) -> Result<f32> {
        match self.queue.pop_front() {
            Some(Some(ratio)) => Ok(ratio),
            Some(None) => Err(Error::Classification("scripted failure".to_string())),
            None => Err(Error::Classification("script exhausted".to_string())),
        }
    }
}
