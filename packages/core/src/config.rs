//! Runtime configuration for the ordering engine
//!
//! `TreeConfig` is built once by the embedding application (usually via
//! [`TreeConfig::from_env`]) and handed to `CategoryService::with_config`.
//! It is immutable for the lifetime of the service.

use serde::{Deserialize, Serialize};
use std::env;

/// Key handed out when a sibling set is empty
pub const DEFAULT_INITIAL_KEY: f64 = 10_000.0;

/// Distance kept from the first/last sibling on prepend/append
pub const DEFAULT_BOUNDARY_GAP: f64 = 10_000.0;

/// Smallest neighbour spacing that is still bisected exactly
pub const DEFAULT_MIN_SPACING: f64 = 1e-6;

const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Constants used by the order-key allocator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Key for the first node of an empty sibling set
    pub initial_key: f64,

    /// Increment/decrement used when landing before the first or after the last sibling
    pub boundary_gap: f64,

    /// Below this spacing the precision guard replaces exact bisection
    pub min_spacing: f64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            initial_key: DEFAULT_INITIAL_KEY,
            boundary_gap: DEFAULT_BOUNDARY_GAP,
            min_spacing: DEFAULT_MIN_SPACING,
        }
    }
}

impl OrderingConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial_key.is_finite() {
            return Err("initial_key must be a finite number".to_string());
        }

        if !self.boundary_gap.is_finite() || self.boundary_gap <= 0.0 {
            return Err("boundary_gap must be a positive finite number".to_string());
        }

        if !self.min_spacing.is_finite() || self.min_spacing <= 0.0 {
            return Err("min_spacing must be a positive finite number".to_string());
        }

        if self.min_spacing >= self.boundary_gap {
            return Err(format!(
                "min_spacing ({}) must be smaller than boundary_gap ({})",
                self.min_spacing, self.boundary_gap
            ));
        }

        Ok(())
    }
}

/// Top-level configuration for `CategoryService`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Allocator constants
    pub ordering: OrderingConfig,

    /// Capacity of the domain event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            ordering: OrderingConfig::default(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl TreeConfig {
    /// Build configuration from environment variables, falling back to defaults.
    ///
    /// - `CATEGORY_TREE_INITIAL_KEY`
    /// - `CATEGORY_TREE_BOUNDARY_GAP`
    /// - `CATEGORY_TREE_MIN_SPACING`
    /// - `CATEGORY_TREE_EVENT_CAPACITY`
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            ordering: OrderingConfig {
                initial_key: env_or("CATEGORY_TREE_INITIAL_KEY", defaults.ordering.initial_key),
                boundary_gap: env_or(
                    "CATEGORY_TREE_BOUNDARY_GAP",
                    defaults.ordering.boundary_gap,
                ),
                min_spacing: env_or("CATEGORY_TREE_MIN_SPACING", defaults.ordering.min_spacing),
            },
            event_channel_capacity: env_or(
                "CATEGORY_TREE_EVENT_CAPACITY",
                defaults.event_channel_capacity,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.ordering.validate()?;

        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
