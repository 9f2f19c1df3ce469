#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};

use bulkseed_core::{NO_PARENT, OrderRecord, ProductRecord, UserRecord};

pub fn user(index: u64, tag: &str) -> UserRecord {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().unwrap_or_default();
    UserRecord {
        id: 0,
        username: format!("user{index}"),
        gender: "female".to_string(),
        age: 34,
        email: format!("user{index}.{tag}@example.com"),
        phone: format!("+1-555-{tag}-{index:07}"),
        address: "12 Harbour Lane".to_string(),
        city: "Porto".to_string(),
        country: "Portugal".to_string(),
        nationality: "Portuguese".to_string(),
        occupation: "engineer".to_string(),
        marital_status: "single".to_string(),
        education: "master".to_string(),
        hobby: "cycling".to_string(),
        income: 4200.5,
        registration_date: at,
        last_login: at,
        loyalty_points: 120,
        preferred_language: "en".to_string(),
        currency: "EUR".to_string(),
        timezone: "Europe/Lisbon".to_string(),
        status: "active".to_string(),
        created_at: at,
        updated_at: at,
    }
}

pub fn product(index: u64, tag: &str) -> ProductRecord {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().unwrap_or_default();
    ProductRecord {
        id: 0,
        product_name: format!("Lamp {index}"),
        category: "home".to_string(),
        description: "A desk lamp".to_string(),
        price: 25.0,
        stock: 40,
        sku: format!("SKU-{tag}-{index:06}"),
        manufacturer: "Acme".to_string(),
        weight: 1.5,
        dimensions: "10x20x30".to_string(),
        color: "black".to_string(),
        material: "steel".to_string(),
        release_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
        warranty_months: 12,
        country_of_origin: "Portugal".to_string(),
        rating: 4.5,
        review_count: 10,
        discount: 0.1,
        stock_status: "in_stock".to_string(),
        supplier: "Supply Co".to_string(),
        created_at: at,
        updated_at: at,
    }
}

pub fn order(index: u64, tag: &str, user_id: i64, product_id: i64) -> OrderRecord {
    let at = Utc.with_ymd_and_hms(2025, 3, 2, 8, 30, 0).single().unwrap_or_default();
    OrderRecord {
        id: 0,
        order_number: format!("ORD-{tag}-{index:010}"),
        user_id,
        product_id,
        order_date: at,
        quantity: 2,
        total_amount: 50.0,
        payment_method: "card".to_string(),
        shipping_address: "12 Harbour Lane".to_string(),
        billing_address: "12 Harbour Lane".to_string(),
        order_status: "paid".to_string(),
        discount_amount: 0.0,
        tax_amount: 4.0,
        shipping_cost: 3.5,
        tracking_number: format!("TRK{index:08}"),
        delivery_date: at,
        return_status: "none".to_string(),
        customer_note: String::new(),
        internal_note: String::new(),
        is_gift: false,
        gift_message: String::new(),
        extra_info: "{}".to_string(),
        created_at: at,
        updated_at: at,
    }
}

pub fn orphan_order(index: u64, tag: &str) -> OrderRecord {
    order(index, tag, NO_PARENT, NO_PARENT)
}
