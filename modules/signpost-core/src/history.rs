//! Per-session page navigation history.

use std::collections::VecDeque;

/// One navigation the session performed: where it went and whether it
/// got there by redirect. back-to-caller forwards replay both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub uri: String,
    pub redirect: bool,
}

impl HistoryEntry {
    pub fn new(uri: impl Into<String>, redirect: bool) -> Self {
        Self {
            uri: uri.into(),
            redirect,
        }
    }
}

/// LIFO stack with a fixed capacity. Pushing beyond capacity evicts the
/// oldest entry, so the stack always holds the most recent navigations.
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> BoundedStack<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an item, evicting the oldest if full. A zero-capacity stack
    /// silently drops everything.
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Pop the most recent item.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    /// Peek at the most recent item without removing it.
    pub fn top(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
