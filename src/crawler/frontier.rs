//! Breadth-first frontier and visited set for one root crawl
//!
//! The visited check happens when an entry is dequeued, not when it is
//! enqueued. The same URL may sit in the queue several times but is handed
//! out for fetching only once.

use std::collections::{HashSet, VecDeque};

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,

    /// Link distance from the root (root is 0)
    pub depth: u32,

    /// Page the link was found on; `None` for the root
    pub parent: Option<String>,
}

/// Outcome of taking the head of the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Not yet visited and within depth; now marked visited
    Visit(FrontierEntry),

    /// Already visited or too deep; dropped without fetching
    Skip(FrontierEntry),
}

/// FIFO frontier plus visited set
#[derive(Debug, Clone)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    max_depth: u32,
    enqueued: usize,
    skipped: usize,
}

impl Frontier {
    /// Starts a crawl of `root_url` with an empty visited set
    pub fn new(root_url: &str, max_depth: u32) -> Self {
        Self::with_visited(root_url, max_depth, std::iter::empty())
    }

    /// Starts a crawl with a pre-seeded visited set
    ///
    /// The root URL is removed from the seed so it is always fetched again.
    /// Only the exact root string is removed.
    pub fn with_visited<I>(root_url: &str, max_depth: u32, visited: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut visited: HashSet<String> = visited.into_iter().collect();
        visited.remove(root_url);

        let mut queue = VecDeque::new();
        queue.push_back(FrontierEntry {
            url: root_url.to_string(),
            depth: 0,
            parent: None,
        });

        Self {
            queue,
            visited,
            max_depth,
            enqueued: 1,
            skipped: 0,
        }
    }

    /// Pops the head of the queue
    ///
    /// # Returns
    ///
    /// * `Some(Step::Visit)` - The entry must be fetched; it is now visited
    /// * `Some(Step::Skip)` - The entry was discarded
    /// * `None` - The frontier is exhausted
    pub fn next_step(&mut self) -> Option<Step> {
        let entry = self.queue.pop_front()?;

        if entry.depth > self.max_depth || self.visited.contains(&entry.url) {
            self.skipped += 1;
            return Some(Step::Skip(entry));
        }

        self.visited.insert(entry.url.clone());
        Some(Step::Visit(entry))
    }

    /// Appends links found on `parent` to the tail of the queue
    ///
    /// Links already visited are dropped, as are all links when the child
    /// depth would exceed the maximum.
    ///
    /// # Returns
    ///
    /// The number of entries appended
    pub fn enqueue_children<I>(&mut self, parent: &FrontierEntry, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let depth = parent.depth + 1;
        if depth > self.max_depth {
            return 0;
        }

        let before = self.queue.len();
        for url in urls {
            if self.visited.contains(&url) {
                continue;
            }
            self.queue.push_back(FrontierEntry {
                url,
                depth,
                parent: Some(parent.url.clone()),
            });
        }

        let added = self.queue.len() - before;
        self.enqueued += added;
        added
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of entries still queued
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Total entries ever queued, the root included
    pub fn enqueued(&self) -> usize {
        self.enqueued
    }

    /// Entries dequeued so far, visited or skipped
    pub fn processed(&self) -> usize {
        self.enqueued - self.queue.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
