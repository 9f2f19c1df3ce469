use serde::{Deserialize, Serialize};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Assumed average serialized row size, in bytes, per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSizes {
    pub user: f64,
    pub product: f64,
    pub order: f64,
}

impl Default for RowSizes {
    fn default() -> Self {
        Self {
            user: 300.0,
            product: 400.0,
            order: 500.0,
        }
    }
}

/// Fixed ratio between the entity populations, relative to the user count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationRatio {
    /// One product is generated for every `products_divisor` users.
    pub products_divisor: u64,
    /// Orders generated per user.
    pub orders_per_user: u64,
}

impl Default for PopulationRatio {
    fn default() -> Self {
        Self {
            products_divisor: 10,
            orders_per_user: 10,
        }
    }
}

/// Target record counts, computed once per process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCountPlan {
    pub users: u64,
    pub products: u64,
    pub orders: u64,
}

impl RecordCountPlan {
    /// Explicit counts, bypassing estimation.
    pub fn new(users: u64, products: u64, orders: u64) -> Self {
        Self {
            users,
            products,
            orders,
        }
    }

    /// Derive counts from a storage budget.
    ///
    /// Solves `u*user + (u/div)*product + (u*mul)*order ≈ target_bytes` for the
    /// user count `u` and derives the other counts with integer arithmetic.
    /// Degenerate inputs (non-positive budget, non-positive or non-finite row
    /// sizes) yield smaller or all-zero plans; this never fails.
    pub fn estimate(target_bytes: i64, sizes: RowSizes, ratio: PopulationRatio) -> Self {
        if target_bytes <= 0 {
            return Self::default();
        }

        let per_product = if ratio.products_divisor == 0 {
            0.0
        } else {
            positive_or_zero(sizes.product) / ratio.products_divisor as f64
        };
        let factor = positive_or_zero(sizes.user)
            + per_product
            + positive_or_zero(sizes.order) * ratio.orders_per_user as f64;
        if !factor.is_finite() || factor <= 0.0 {
            return Self::default();
        }

        // `as` saturates and maps NaN to zero.
        let users = (target_bytes as f64 / factor) as u64;
        Self {
            users,
            products: users.checked_div(ratio.products_divisor).unwrap_or(0),
            orders: users.saturating_mul(ratio.orders_per_user),
        }
    }

    pub fn total(&self) -> u64 {
        self.users
            .saturating_add(self.products)
            .saturating_add(self.orders)
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Convert a GiB budget to bytes, clamping invalid values to zero.
pub fn gib_to_bytes(gib: f64) -> i64 {
    if !gib.is_finite() || gib <= 0.0 {
        return 0;
    }
    (gib * BYTES_PER_GIB) as i64
}

fn positive_or_zero(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(target_bytes: i64) -> RecordCountPlan {
        RecordCountPlan::estimate(target_bytes, RowSizes::default(), PopulationRatio::default())
    }

    #[test]
    fn fifty_gib_budget_matches_default_ratio() {
        let plan = estimate(gib_to_bytes(50.0));
        assert_eq!(plan.users, 10_053_762);
        assert_eq!(plan.products, 1_005_376);
        assert_eq!(plan.orders, 100_537_620);
    }

    #[test]
    fn positive_targets_keep_ratio() {
        for target in [1_i64, 5_339, 5_340, 53_400, 1_000_003, 987_654_321, i64::MAX] {
            let plan = estimate(target);
            assert_eq!(plan.products, plan.users / 10, "target {target}");
            assert_eq!(plan.orders, plan.users * 10, "target {target}");
        }
    }

    #[test]
    fn small_budget_rounds_down_to_zero() {
        assert_eq!(estimate(5_339), RecordCountPlan::default());
        assert_eq!(estimate(5_340).users, 1);
    }

    #[test]
    fn non_positive_target_yields_empty_plan() {
        assert!(estimate(0).is_empty());
        assert!(estimate(-1).is_empty());
        assert!(estimate(i64::MIN).is_empty());
    }

    #[test]
    fn degenerate_sizes_do_not_fail() {
        let zero_sizes = RowSizes {
            user: 0.0,
            product: 0.0,
            order: 0.0,
        };
        assert!(RecordCountPlan::estimate(1_000, zero_sizes, PopulationRatio::default()).is_empty());

        let nan_sizes = RowSizes {
            user: f64::NAN,
            product: -4.0,
            order: 100.0,
        };
        let plan = RecordCountPlan::estimate(10_000, nan_sizes, PopulationRatio::default());
        assert_eq!(plan.users, 10);
        assert_eq!(plan.products, 1);
        assert_eq!(plan.orders, 100);
    }

    #[test]
    fn zero_divisor_drops_products_only() {
        let ratio = PopulationRatio {
            products_divisor: 0,
            orders_per_user: 1,
        };
        let sizes = RowSizes {
            user: 10.0,
            product: 10.0,
            order: 10.0,
        };
        let plan = RecordCountPlan::estimate(200, sizes, ratio);
        assert_eq!(plan, RecordCountPlan::new(10, 0, 10));
    }

    #[test]
    fn gib_conversion_clamps_invalid_values() {
        assert_eq!(gib_to_bytes(1.0), 1_073_741_824);
        assert_eq!(gib_to_bytes(0.0), 0);
        assert_eq!(gib_to_bytes(-2.0), 0);
        assert_eq!(gib_to_bytes(f64::NAN), 0);
    }
}
