//! Fractional order keys for sibling ordering
//!
//! A move rewrites exactly one row: the moved category gets a key that sorts
//! between its new neighbours, and no sibling is renumbered.
//!
//! ```text
//! keys = [0, 10000]
//! allocate(&keys, 0) => -10000   // before first
//! allocate(&keys, 1) =>   5000   // between
//! allocate(&keys, 2) =>  20000   // after last
//! allocate(&[],   0) =>  10000   // empty sibling set
//! ```

use crate::config::OrderingConfig;

/// Calculates the fractional order for inserting a category among its siblings
#[derive(Debug, Clone, Copy, Default)]
pub struct FractionalOrderCalculator {
    config: OrderingConfig,
}

impl FractionalOrderCalculator {
    pub fn new(config: OrderingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    /// Compute the key for a node landing at `insert_index` in `sibling_keys`.
    ///
    /// `sibling_keys` must be ascending and must not contain the moving node.
    /// Indexes past the end append.
    pub fn allocate(&self, sibling_keys: &[f64], insert_index: usize) -> f64 {
        if insert_index == 0 {
            return self.calculate_order(None, sibling_keys.first().copied());
        }
        if insert_index >= sibling_keys.len() {
            return self.calculate_order(sibling_keys.last().copied(), None);
        }
        self.calculate_order(
            Some(sibling_keys[insert_index - 1]),
            Some(sibling_keys[insert_index]),
        )
    }

    /// Calculate order value for inserting between prev and next
    pub fn calculate_order(&self, prev_order: Option<f64>, next_order: Option<f64>) -> f64 {
        let OrderingConfig {
            initial_key,
            boundary_gap,
            min_spacing,
        } = self.config;

        match (prev_order, next_order) {
            (None, None) => initial_key,
            (None, Some(next)) => next - boundary_gap,
            (Some(prev), None) => prev + boundary_gap,
            (Some(prev), Some(next)) => {
                let spacing = next - prev;
                let midpoint = (prev + next) / 2.0;

                if spacing >= min_spacing && prev < midpoint && midpoint < next {
                    return midpoint;
                }

                // Collapsed spacing: step away from both neighbours instead of
                // returning a midpoint that may equal one of them. The result can
                // land past `next`; siblings are not renumbered.
                let key = prev + spacing * 0.5 + boundary_gap * 0.01;
                tracing::warn!(
                    "Order key spacing collapsed between {} and {} (spacing {}), allocated {}",
                    prev,
                    next,
                    spacing,
                    key
                );
                key
            }
        }
    }

    /// Check if any adjacent pair of keys is closer than the minimum spacing
    pub fn needs_rebalancing(&self, orders: &[f64]) -> bool {
        orders
            .windows(2)
            .any(|pair| pair[1] - pair[0] < self.config.min_spacing)
    }
}
