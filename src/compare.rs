//! Key orderings a tree can be built with.

use std::cmp::Ordering;

use crate::error::Error;

/// A total order over keys, consulted on every descent through a tree.
///
/// Closures of the form `Fn(&K, &K) -> Ordering` are comparators too:
///
/// ```
/// use bstree::BsTree;
/// let mut tree = BsTree::with_comparator(|a: &i32, b: &i32| b.cmp(a));
/// tree.insert(1);
/// tree.insert(2);
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [2, 1]);
/// ```
pub trait Comparator<K: ?Sized> {
    /// Compares `lhs` against `rhs`.
    ///
    /// Returns [`Error::Unordered`] if the two keys cannot be ordered.
    fn compare(&self, lhs: &K, rhs: &K) -> Result<Ordering, Error>;
}

/// The key type's own total order (`Ord`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Natural;

impl<K: Ord + ?Sized> Comparator<K> for Natural {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Result<Ordering, Error> {
        Ok(lhs.cmp(rhs))
    }
}

/// The key type's partial order (`PartialOrd`).
///
/// Fails with [`Error::Unordered`] when a comparison has no answer,
/// e.g. when a floating point key is NaN.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PartialOrder;

impl<K: PartialOrd + ?Sized> Comparator<K> for PartialOrder {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Result<Ordering, Error> {
        lhs.partial_cmp(rhs).ok_or(Error::Unordered)
    }
}

/// Inverts the order of the wrapped comparator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reverse<C>(pub C);

impl<K: ?Sized, C: Comparator<K>> Comparator<K> for Reverse<C> {
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Result<Ordering, Error> {
        self.0.compare(lhs, rhs).map(Ordering::reverse)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, lhs: &K, rhs: &K) -> Result<Ordering, Error> {
        Ok(self(lhs, rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural() {
        assert_eq!(Natural.compare(&1, &2), Ok(Ordering::Less));
        assert_eq!(Natural.compare("b", "a"), Ok(Ordering::Greater));
    }

    #[test]
    fn test_partial_order() {
        assert_eq!(PartialOrder.compare(&1.0, &1.0), Ok(Ordering::Equal));
        assert_eq!(PartialOrder.compare(&f64::NAN, &1.0), Err(Error::Unordered));
    }

    #[test]
    fn test_reverse() {
        assert_eq!(Reverse(Natural).compare(&1, &2), Ok(Ordering::Greater));
        assert_eq!(
            Reverse(PartialOrder).compare(&1.0, &f64::NAN),
            Err(Error::Unordered)
        );
    }

    #[test]
    fn test_closure() {
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
        assert_eq!(by_len.compare(&"abc", &"de"), Ok(Ordering::Greater));
    }
}
