//! Priority ordering for synchronized lists.

use crate::model::Prioritized;

/// Sort prioritized items before the rest, in place.
///
/// `sort_by_key` is a stable sort, so items with equal priority keep their
/// relative input order. Applying it twice is the same as applying it once.
pub fn sort_by_priority<T: Prioritized>(items: &mut [T]) {
    items.sort_by_key(|item| !item.is_prioritized());
}

/// Sorted copy of `items`, leaving the input untouched.
pub fn sorted_by_priority<T: Prioritized + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sort_by_priority(&mut sorted);
    sorted
}
