use serde::{Deserialize, Serialize};

/// Run of flagged contour indices. `end < start` marks a run that wraps past
/// the last index back to 0; `length` counts every index from `start` to
/// `end`, gaps included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpan {
    pub start: usize,
    pub end: usize,
    pub length: usize,
}

impl RegionSpan {
    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    /// Whether contour index `i` lies inside the span on a ring of `n` points.
    pub fn contains(&self, i: usize, n: usize) -> bool {
        if n == 0 {
            return false;
        }
        (i + n - self.start) % n < self.length
    }
}

/// Groups flagged indices of a closed sequence into spans. Consecutive flagged
/// indices at most `gap_tolerance` apart share a span, including across the
/// wrap from the last index to the first. Spans shorter than `min_length`
/// are dropped.
pub fn find_regions(flags: &[bool], min_length: usize, gap_tolerance: usize) -> Vec<RegionSpan> {
    let n = flags.len();
    let mut indices = flags
        .iter()
        .enumerate()
        .filter_map(|(i, &f)| f.then_some(i));

    let Some(first) = indices.next() else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    let (mut start, mut prev) = (first, first);
    for idx in indices {
        if idx - prev > gap_tolerance {
            spans.push(span(start, prev, n));
            start = idx;
        }
        prev = idx;
    }
    spans.push(span(start, prev, n));

    if spans.len() >= 2 {
        let head = spans[0];
        let tail = spans[spans.len() - 1];
        if head.start + n - tail.end <= gap_tolerance {
            spans.remove(0);
            let last = spans.len() - 1;
            spans[last] = span(tail.start, head.end, n);
        }
    }

    spans.retain(|s| s.length >= min_length);
    spans
}

fn span(start: usize, end: usize, n: usize) -> RegionSpan {
    let length = if end >= start {
        end - start + 1
    } else {
        end + n - start + 1
    };
    RegionSpan { start, end, length }
}
