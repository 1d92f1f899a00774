//! Display ordering for comment ranges
//!
//! Implements the comparison used when listing comments for presentation:
//! offset ascending, then length ascending, with an invertible direction.
//!
//! Note this is deliberately the opposite length tie-break from containment
//! construction (which establishes ancestry largest-first): once containment
//! is applied, same-offset keys end up at different tree depths, so display
//! ordering mainly governs root-level and cross-branch order.

use std::cmp::Ordering;

use super::types::RangeKey;

/// Direction for display ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Offset ascending, length ascending
    #[default]
    Ascending,
    /// Offset descending, length descending
    Descending,
}

/// Compare two range keys for display
pub fn display_order(a: &RangeKey, b: &RangeKey, order: SortOrder) -> Ordering {
    let result = a.cmp(b);
    match order {
        SortOrder::Ascending => result,
        SortOrder::Descending => result.reverse(),
    }
}

/// Determine if key `a` is listed before key `b` in ascending display order
pub fn is_before(a: &RangeKey, b: &RangeKey) -> bool {
    display_order(a, b, SortOrder::Ascending) == Ordering::Less
}
