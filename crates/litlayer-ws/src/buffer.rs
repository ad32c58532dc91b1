//! Pending-frame buffer
//!
//! Frames written while the socket is not ready wait here in insertion
//! order. A frame identical to one already waiting is not queued twice.

use std::collections::{HashSet, VecDeque};

/// FIFO of serialized frames with duplicate suppression
#[derive(Debug, Default)]
pub struct PendingFrameBuffer {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl PendingFrameBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame; returns `false` if an identical frame is already waiting
    pub fn push(&mut self, frame: String) -> bool {
        if !self.members.insert(frame.clone()) {
            return false;
        }
        self.order.push_back(frame);
        true
    }

    /// Oldest waiting frame
    pub fn front(&self) -> Option<&String> {
        self.order.front()
    }

    /// Drop the oldest frame once it has been written, if it is still `frame`
    pub fn complete_front(&mut self, frame: &str) -> bool {
        if self.order.front().map(String::as_str) != Some(frame) {
            return false;
        }
        if let Some(done) = self.order.pop_front() {
            self.members.remove(&done);
        }
        true
    }

    /// Number of waiting frames
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Copy of the waiting frames, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    /// Discard everything
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}
