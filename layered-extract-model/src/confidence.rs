//! Pooling functions for combining field confidences.

/// Combines the confidences of a record's fields. `None` when there is
/// nothing to combine.
pub type Pooling = fn(&[f64]) -> Option<f64>;

/// The lowest confidence.
pub fn min_value(confidences: &[f64]) -> Option<f64> {
    confidences.iter().copied().reduce(f64::min)
}

pub fn max_value(confidences: &[f64]) -> Option<f64> {
    confidences.iter().copied().reduce(f64::max)
}

/// The joint confidence of independent fields.
pub fn product_value(confidences: &[f64]) -> Option<f64> {
    confidences.iter().copied().reduce(|lhs, rhs| lhs * rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooling() {
        assert_eq!(min_value(&[0.9, 0.4, 0.7]), Some(0.4));
        assert_eq!(max_value(&[0.9, 0.4, 0.7]), Some(0.9));
        assert_eq!(product_value(&[0.5, 0.5]), Some(0.25));
        assert_eq!(min_value(&[]), None);
    }
}
