use core::fmt;
use core::iter::{FromIterator, FusedIterator};

use alloc::boxed::Box;
use alloc::vec::Vec;

type Link<T> = Option<Box<Node<T>>>;

#[derive(Debug)]
struct Node<T> {
    value: T,
    next: Link<T>,
}

/// A LIFO stack over a singly-linked list.
///
/// Each node owns the one below it. Popping or peeking an empty stack yields
/// `None` and changes nothing.
///
/// # Examples
///
/// ```
/// use bucket_map::ListStack;
///
/// let mut stack = ListStack::new();
/// stack.push(1);
/// stack.push(2);
/// stack.push(3);
/// assert_eq!(stack.to_string(), "{3,2,1}");
/// assert_eq!(stack.pop(), Some(3));
/// assert_eq!(stack.peek(), Some(&2));
/// ```
pub struct ListStack<T> {
    head: Link<T>,
    len: usize,
}

impl<T> ListStack<T> {
    /// Creates an empty stack.
    #[inline]
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Puts `value` on top.
    #[inline]
    pub fn push(&mut self, value: T) {
        let next = self.head.take();
        self.head = Some(Box::new(Node { value, next }));
        self.len += 1;
    }

    /// Takes the top value off.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.head.take().map(|node| {
            let Node { value, next } = *node;
            self.head = next;
            self.len -= 1;
            value
        })
    }

    /// Returns the top value without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.head.as_deref().map(|node| &node.value)
    }

    /// Returns the top value, mutably, without removing it.
    #[inline]
    pub fn peek_mut(&mut self) -> Option<&mut T> {
        self.head.as_deref_mut().map(|node| &mut node.value)
    }

    /// Returns the number of values on the stack.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the stack holds no values.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        // unlink node by node so long stacks don't recurse in Drop
        let mut curr = self.head.take();
        while let Some(mut node) = curr {
            curr = node.next.take();
        }
        self.len = 0;
    }

    /// Iterates from the top down.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            curr: self.head.as_deref(),
            remaining: self.len,
        }
    }
}

impl<T> Drop for ListStack<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Borrowing iterator over a [`ListStack`], top first.
#[derive(Debug)]
pub struct Iter<'a, T> {
    curr: Option<&'a Node<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.curr?;
        self.curr = node.next.as_deref();
        self.remaining -= 1;
        Some(&node.value)
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

impl<'a, T> IntoIterator for &'a ListStack<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Default for ListStack<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for ListStack<T> {
    /// Deep copy: the clone shares no nodes with `self`.
    fn clone(&self) -> Self {
        let values = self.iter().collect::<Vec<_>>();
        let mut out = Self::new();
        for value in values.into_iter().rev() {
            out.push(value.clone());
        }
        out
    }
}

/// Pushes in iteration order, so the last item ends up on top.
impl<T> FromIterator<T> for ListStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut stack = Self::new();
        stack.extend(iter);
        stack
    }
}

impl<T> Extend<T> for ListStack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|value| self.push(value));
    }
}

impl<T: PartialEq> PartialEq for ListStack<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for ListStack<T> {}

impl<T: fmt::Debug> fmt::Debug for ListStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// `{top,...,bottom}`, or `{}` when empty.
impl<T: fmt::Display> fmt::Display for ListStack<T> {
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
