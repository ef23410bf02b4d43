//! Default identifiers for unnamed reporters.
//!
//! Names are cosmetic and only show up in logs and diagnostics. The
//! process-wide generator is created on first use and never reset, so every
//! unnamed reporter in a process gets a distinct `reporter_<n>` label.

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const DEFAULT_PREFIX: &str = "reporter";
pub const DEFAULT_SEPARATOR: &str = "_";

lazy_static! {
    static ref GLOBAL_NAMES: Arc<NameGenerator> = Arc::new(NameGenerator::default());
}

#[derive(Debug)]
pub struct NameGenerator {
    prefix: String,
    separator: String,
    next: AtomicU64,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_SEPARATOR)
    }
}

impl NameGenerator {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            next: AtomicU64::new(0),
        }
    }

    /// The shared process-wide generator.
    pub fn global() -> Arc<NameGenerator> {
        Arc::clone(&GLOBAL_NAMES)
    }

    pub fn next_name(&self) -> String {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}{}", self.prefix, self.separator, index)
    }

    /// Number of names handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn names_are_sequential() {
        let names = NameGenerator::default();
        assert_eq!(names.next_name(), "reporter_0");
        assert_eq!(names.next_name(), "reporter_1");
        assert_eq!(names.issued(), 2);
    }

    #[test]
    fn custom_prefix_and_separator() {
        let names = NameGenerator::new("walk", "-");
        assert_eq!(names.next_name(), "walk-0");
    }

    #[test]
    fn global_is_one_instance() {
        assert!(Arc::ptr_eq(&NameGenerator::global(), &NameGenerator::global()));
    }

    #[test]
    fn concurrent_names_are_unique() {
        let names = Arc::new(NameGenerator::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let names = Arc::clone(&names);
                thread::spawn(move || (0..100).map(|_| names.next_name()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for name in h.join().unwrap() {
                assert!(seen.insert(name), "duplicate name issued");
            }
        }
        assert_eq!(seen.len(), 800);
        assert_eq!(names.issued(), 800);
    }
}
