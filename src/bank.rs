// Recoil queue
//
// Holds the fission fragments of an event and every recoil they knock on.
// Ions are transported in the order they were queued.

use crate::ion::Ion;
use std::collections::VecDeque;

/// FIFO of ions waiting to be transported.
#[derive(Debug, Clone)]
pub struct RecoilQueue<P = ()> {
    queue: VecDeque<Ion<P>>,
}

impl<P> RecoilQueue<P> {
    pub fn new() -> Self {
        RecoilQueue {
            queue: VecDeque::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RecoilQueue {
            queue: VecDeque::with_capacity(capacity),
        }
    }

    /// Queue a primary ion.
    pub fn add_source_ion(&mut self, ion: Ion<P>) {
        self.queue.push_back(ion);
    }

    /// Queue a recoil produced during transport.
    pub fn bank_recoil(&mut self, ion: Ion<P>) {
        self.queue.push_back(ion);
    }

    /// Next ion to transport, `None` when the cascade is finished.
    pub fn pop_ion(&mut self) -> Option<Ion<P>> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ion<P>> {
        self.queue.iter()
    }
}

impl<P> Default for RecoilQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}
