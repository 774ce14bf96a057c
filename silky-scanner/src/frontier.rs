//! Discovered-but-not-yet-visited URLs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
    /// Seed-to-`url` route, ending with `url`.
    pub path: Vec<String>,
    pub priority: i64,
}

impl FrontierEntry {
    pub fn seed(url: &str) -> Self {
        Self {
            url: url.to_string(),
            depth: 0,
            path: vec![url.to_string()],
            priority: 0,
        }
    }

    /// Entry for a link found on this entry's page.
    pub fn child(&self, url: &str, priority: i64) -> Self {
        let mut path = self.path.clone();
        path.push(url.to_string());
        Self {
            url: url.to_string(),
            depth: self.depth + 1,
            path,
            priority,
        }
    }
}

#[derive(Debug)]
struct Queued {
    entry: FrontierEntry,
    seq: u64,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    // Higher priority first; among equals the earlier insertion wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.entry
            .priority
            .cmp(&other.entry.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Max-priority queue with insertion-order tie break.
#[derive(Debug, Default)]
pub struct PriorityFrontier {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

impl PriorityFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FrontierEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Queued { entry, seq });
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop().map(|queued| queued.entry)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Work list of a traversal: a LIFO stack for depth-first direct mode or a
/// priority queue for smart mode.
#[derive(Debug)]
pub enum Frontier {
    Stack(Vec<FrontierEntry>),
    Priority(PriorityFrontier),
}

impl Frontier {
    pub fn stack() -> Self {
        Frontier::Stack(Vec::new())
    }

    pub fn priority() -> Self {
        Frontier::Priority(PriorityFrontier::new())
    }

    /// Adds links found on one page. On the stack they are pushed in reverse
    /// so the first link in document order is popped first.
    pub fn extend(&mut self, entries: Vec<FrontierEntry>) {
        match self {
            Frontier::Stack(stack) => stack.extend(entries.into_iter().rev()),
            Frontier::Priority(queue) => {
                for entry in entries {
                    queue.push(entry);
                }
            }
        }
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        match self {
            Frontier::Stack(stack) => stack.pop(),
            Frontier::Priority(queue) => queue.pop(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Frontier::Stack(stack) => stack.is_empty(),
            Frontier::Priority(queue) => queue.is_empty(),
        }
    }
}
