#![doc = include_str!("../README.md")]

#![no_std]

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod error;
mod map;
mod queue;
mod report;
mod stack;

#[cfg(feature = "std")]
mod sync;

pub use error::Error;
pub use map::{BucketMap, FixedState, Iter, DEFAULT_BUCKETS};
pub use queue::ListQueue;
pub use report::{BucketReport, ConflictReport};
pub use stack::ListStack;

#[cfg(feature = "std")]
pub use sync::Shared;

/// Iterators over the list containers.
pub mod iter {
    pub use crate::queue::Iter as QueueIter;
    pub use crate::stack::Iter as StackIter;
}
