use core::fmt;

use alloc::vec::Vec;

/// Live keys of a single bucket.
#[derive(Debug, Clone)]
pub struct BucketReport<'a, K> {
    index: usize,
    keys: Vec<&'a K>,
}

impl<'a, K> BucketReport<'a, K> {
    #[inline]
    pub(crate) fn new(index: usize, keys: Vec<&'a K>) -> Self {
        Self { index, keys }
    }

    /// Position of the bucket in the table.
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Distinct live keys, in chain order from the head.
    #[inline(always)]
    pub fn keys(&self) -> &[&'a K] {
        &self.keys
    }

    /// Number of keys sharing the bucket beyond the first.
    #[inline(always)]
    pub fn conflicts(&self) -> usize {
        self.keys.len().saturating_sub(1)
    }
}

impl<K: fmt::Display> fmt::Display for BucketReport<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index {}: ({} conflicts), {{", self.index, self.conflicts())?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str("}")
    }
}

/// Per-bucket collision summary of a [`BucketMap`](crate::BucketMap).
///
/// Its `Display` form is the table printed by
/// `BucketMap::print_table`:
///
/// ```text
/// Index 0: (0 conflicts), {}
/// Index 1: (1 conflicts), {i,a}
/// ...
/// Total # of conflicts: 1
/// ```
#[derive(Debug, Clone)]
pub struct ConflictReport<'a, K> {
    buckets: Vec<BucketReport<'a, K>>,
}

impl<'a, K> ConflictReport<'a, K> {
    #[inline]
    pub(crate) fn new(buckets: Vec<BucketReport<'a, K>>) -> Self {
        Self { buckets }
    }

    /// One report per bucket, in table order.
    #[inline(always)]
    pub fn buckets(&self) -> &[BucketReport<'a, K>] {
        &self.buckets
    }

    /// Sum of the per-bucket conflicts.
    pub fn total_conflicts(&self) -> usize {
        self.buckets.iter().map(BucketReport::conflicts).sum()
    }
}

impl<K: fmt::Display> fmt::Display for ConflictReport<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bucket in &self.buckets {
            writeln!(f, "{bucket}")?;
        }
        write!(f, "Total # of conflicts: {}", self.total_conflicts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn test_empty_bucket_line() {
        let bucket = BucketReport::<u8>::new(4, Vec::new());
        assert_eq!(bucket.conflicts(), 0);
        assert_eq!(bucket.to_string(), "Index 4: (0 conflicts), {}");
    }

    #[test]
    fn test_total_sums_buckets() {
        let (a, b, c) = ("a", "i", "q");
        let report = ConflictReport::new(vec![
            BucketReport::new(0, vec![&a]),
            BucketReport::new(1, vec![&b, &c, &a]),
        ]);
        assert_eq!(report.total_conflicts(), 2);
        assert_eq!(
            report.to_string(),
            "Index 0: (0 conflicts), {a}\nIndex 1: (2 conflicts), {i,q,a}\nTotal # of conflicts: 2"
        );
    }
}
