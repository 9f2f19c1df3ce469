use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier stored in an order when no parent record was available.
pub const NO_PARENT: i64 = 0;

/// The three generated entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Product,
    Order,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::User, EntityKind::Product, EntityKind::Order];

    /// Table name and log label for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Product => "products",
            EntityKind::Order => "orders",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated user. `id` stays zero until storage assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub gender: String,
    pub age: i32,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub nationality: String,
    pub occupation: String,
    pub marital_status: String,
    pub education: String,
    pub hobby: String,
    pub income: f64,
    pub registration_date: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub loyalty_points: i32,
    pub preferred_language: String,
    pub currency: String,
    pub timezone: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A generated product. `id` stays zero until storage assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    pub sku: String,
    pub manufacturer: String,
    pub weight: f64,
    pub dimensions: String,
    pub color: String,
    pub material: String,
    pub release_date: NaiveDate,
    pub warranty_months: i32,
    pub country_of_origin: String,
    pub rating: f64,
    pub review_count: i32,
    pub discount: f64,
    pub stock_status: String,
    pub supplier: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A generated order.
///
/// `user_id` and `product_id` are logical references only; the schema does not
/// enforce them and [`NO_PARENT`] marks a missing parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub product_id: i64,
    pub order_date: DateTime<Utc>,
    pub quantity: i32,
    pub total_amount: f64,
    pub payment_method: String,
    pub shipping_address: String,
    pub billing_address: String,
    pub order_status: String,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub shipping_cost: f64,
    pub tracking_number: String,
    pub delivery_date: DateTime<Utc>,
    pub return_status: String,
    pub customer_note: String,
    pub internal_note: String,
    pub is_gift: bool,
    pub gift_message: String,
    pub extra_info: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// True when either logical reference is missing.
    pub fn is_orphan(&self) -> bool {
        self.user_id == NO_PARENT || self.product_id == NO_PARENT
    }
}

/// Row returned by the order/user/product join read-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedOrder {
    pub order_number: String,
    pub username: String,
    pub product_name: String,
    pub total_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_table_names() {
        let names: Vec<&str> = EntityKind::ALL.iter().map(EntityKind::as_str).collect();
        assert_eq!(names, vec!["users", "products", "orders"]);
        assert_eq!(EntityKind::Order.to_string(), "orders");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntityKind::Product).expect("serialize kind");
        assert_eq!(json, "\"product\"");
    }
}
