use core::fmt;

use alloc::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// A locked handle to a container that clones by aliasing.
///
/// Cloning a `Shared` hands out another handle to the same container, so a
/// change made through one handle is seen through every other. For an
/// independent copy, take a [`snapshot`](Shared::snapshot).
///
/// # Examples
///
/// ```
/// use bucket_map::{BucketMap, Shared};
///
/// let map = Shared::new(BucketMap::new());
/// let alias = map.clone();
/// alias.lock().put("k", 1);
/// assert_eq!(map.lock().get(&"k"), Some(&1));
///
/// let copy = map.snapshot();
/// map.lock().remove(&"k");
/// assert_eq!(copy.get(&"k"), Some(&1));
/// ```
pub struct Shared<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Shared<T> {
    /// Wraps `value` in a fresh handle.
    #[inline]
    pub fn new(value: T) -> Self {
        Self { inner: Arc::new(Mutex::new(value)) }
    }

    /// Locks the container, blocking until no other handle holds it.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Runs `f` with the container locked.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Returns `true` if both handles refer to the same container.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }

    /// Number of live handles to this container.
    #[inline]
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns the container if this is the last handle, or the handle back.
    pub fn try_unwrap(self) -> Result<T, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<T: Clone> Shared<T> {
    /// Deep copy of the container as it is now.
    #[inline]
    pub fn snapshot(&self) -> T {
        self.inner.lock().clone()
    }
}

impl<T> Clone for Shared<T> {
    /// Another handle to the same container.
    #[inline]
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Default> Default for Shared<T> {
    #[inline]
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Shared<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Shared");
        match self.inner.try_lock() {
            Some(guard) => d.field("value", &*guard),
            None => d.field("value", &format_args!("<locked>")),
        };
        d.finish()
    }
}
