/// Errors raised while building a container.
///
/// Lookups and removals never fail: absence is reported as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A bucket table was requested with no buckets.
    #[error("a bucket table needs at least one bucket")]
    ZeroBuckets,
}
