use core::fmt;
use core::iter::{FromIterator, FusedIterator};

use alloc::vec::Vec;

/// One queue node; an empty `value` marks a recycled slot.
#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    next: Option<usize>,
}

/// A FIFO queue over a singly-linked list.
///
/// Nodes live in a slot vec and link to their successor by index; the queue
/// tracks both ends, so enqueue and dequeue are O(1). Freed slots are reused
/// by later enqueues. Dequeuing or peeking an empty queue yields `None` and
/// changes nothing.
///
/// # Examples
///
/// ```
/// use bucket_map::ListQueue;
///
/// let mut queue = ListQueue::new();
/// queue.enqueue(1);
/// queue.enqueue(2);
/// queue.enqueue(3);
/// assert_eq!(queue.to_string(), "{1,2,3}");
/// assert_eq!(queue.dequeue(), Some(1));
/// assert_eq!(queue.peek(), Some(&2));
/// ```
#[derive(Clone)]
pub struct ListQueue<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>, // recyclable slot indexes

    head: Option<usize>, // front, next to dequeue
    tail: Option<usize>, // back, last enqueued

    len: usize,
}

impl<T> ListQueue<T> {
    /// Creates an empty queue.
    #[inline]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates an empty queue with room for `n` values before reallocating.
    #[inline]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            slots: Vec::with_capacity(n),
            ..Self::new()
        }
    }

    /// Adds `value` at the back.
    pub fn enqueue(&mut self, value: T) {
        let slot = Slot { value: Some(value), next: None };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.link_tail(idx);
        self.len += 1;
    }

    /// Takes the front value off.
    pub fn dequeue(&mut self) -> Option<T> {
        let idx = self.head?;
        let slot = &mut self.slots[idx];
        let value = slot.value.take();

        self.head = slot.next.take();
        self.len -= 1;

        if self.head.is_none() {
            // drained, so every slot is free
            self.tail = None;
            self.slots.clear();
            self.free.clear();
        } else {
            self.free.push(idx);
        }

        value
    }

    /// Returns the front value without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.head.and_then(|idx| self.slots[idx].value.as_ref())
    }

    /// Returns the number of queued values.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the queue holds no values.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterates from front to back.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            curr: self.head,
            remaining: self.len,
        }
    }

    /// Appends the slot at `idx` to the back of the list.
    #[inline]
    fn link_tail(&mut self, idx: usize) {
        if let Some(tail_idx) = self.tail {
            self.slots[tail_idx].next = Some(idx)
        } else {
            self.head = Some(idx)
        }

        self.tail = Some(idx)
    }
}

/// Borrowing iterator over a [`ListQueue`], front first.
#[derive(Debug)]
pub struct Iter<'a, T> {
    slots: &'a [Slot<T>],
    curr: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = &self.slots[self.curr?];
        self.curr = slot.next;
        self.remaining -= 1;
        slot.value.as_ref()
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a ListQueue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Default for ListQueue<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ListQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut queue = Self::with_capacity(iter.size_hint().0);
        queue.extend(iter);
        queue
    }
}

impl<T> Extend<T> for ListQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| self.enqueue(value));
    }
}

impl<T: PartialEq> PartialEq for ListQueue<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for ListQueue<T> {}

impl<T: fmt::Debug> fmt::Debug for ListQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// `{front,...,back}`, or `{}` when empty.
impl<T: fmt::Display> fmt::Display for ListQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("}")
    }
}
