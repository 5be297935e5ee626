// src/pipeline/work.rs
use crate::harvester::SourceDescriptor;

/// One harvest call: a single (source, keyword, location) search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit<'a> {
    pub source: &'a SourceDescriptor,
    pub keyword: &'a str,
    pub location: &'a str,
}

/// Yields the keyword x location cross-product for one source, keyword-major,
/// one unit at a time.
#[derive(Debug, Clone)]
pub struct WorkQueue<'a> {
    source: &'a SourceDescriptor,
    keywords: &'a [String],
    locations: &'a [String],
    next: usize,
}

impl<'a> WorkQueue<'a> {
    pub fn new(source: &'a SourceDescriptor, keywords: &'a [String], locations: &'a [String]) -> Self {
        Self {
            source,
            keywords,
            locations,
            next: 0,
        }
    }

    fn total(&self) -> usize {
        self.keywords.len() * self.locations.len()
    }
}

impl<'a> Iterator for WorkQueue<'a> {
    type Item = WorkUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total() {
            return None;
        }

        let (keywords, locations) = (self.keywords, self.locations);
        let per_keyword = locations.len();
        let unit = WorkUnit {
            source: self.source,
            keyword: &keywords[self.next / per_keyword],
            location: &locations[self.next % per_keyword],
        };
        self.next += 1;
        Some(unit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WorkQueue<'_> {}
