//! Low-stock detection.

/// `true` iff `quantity` is strictly below `threshold`.
///
/// Stateless: a record that stays low is reported low on every evaluation.
pub fn is_low(quantity: i64, threshold: i64) -> bool {
    quantity < threshold
}
