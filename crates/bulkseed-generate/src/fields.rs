//! Field synthesis for users, products and orders.
//!
//! Every value is drawn from the caller's RNG, so a batch generated from a
//! seeded `ChaCha8Rng` is reproducible apart from the wall-clock timestamps.
//! Unique columns (email, phone, sku, order number) embed the generator's tag
//! and the record's 1-based index, which keeps separate runs from colliding.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use fake::Fake;
use fake::faker::address::en::{CityName, CountryName, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use rand::Rng;

use bulkseed_core::{NO_PARENT, OrderRecord, ProductRecord, UserRecord};

const GENDERS: &[&str] = &["male", "female", "other"];
const OCCUPATIONS: &[&str] = &["engineer", "doctor", "teacher", "artist", "lawyer"];
const MARITAL_STATUSES: &[&str] = &["single", "married", "divorced"];
const EDUCATION: &[&str] = &["high_school", "bachelor", "master", "doctorate"];
const LANGUAGES: &[&str] = &["en", "pt", "es", "de", "zh"];
const CURRENCIES: &[&str] = &["USD", "EUR", "BRL", "GBP", "CNY"];
const USER_STATUSES: &[&str] = &["active", "inactive", "suspended"];
const HOBBIES: &[&str] = &["reading", "cycling", "chess", "cooking", "hiking"];
const TIMEZONES: &[&str] = &["UTC", "America/New_York", "Europe/Lisbon", "Asia/Shanghai"];

const PRODUCT_NAMES: &[&str] = &["Lamp", "Chair", "Headphones", "Backpack", "Kettle"];
const CATEGORIES: &[&str] = &["electronics", "home", "apparel", "sports", "food"];
const COLORS: &[&str] = &["red", "blue", "green", "black", "white"];
const MATERIALS: &[&str] = &["plastic", "steel", "wood", "glass", "cotton"];
const STOCK_STATUSES: &[&str] = &["in_stock", "out_of_stock", "preorder"];

const PAYMENT_METHODS: &[&str] = &["credit_card", "debit_card", "paypal", "cash"];
const ORDER_STATUSES: &[&str] = &[
    "pending_payment",
    "paid",
    "awaiting_shipment",
    "shipped",
    "completed",
    "cancelled",
];
const RETURN_STATUSES: &[&str] = &["none", "requested", "returned"];
const CHANNELS: &[&str] = &["web", "mobile", "store"];

/// Generates full field sets for each entity kind.
#[derive(Debug, Clone)]
pub struct FieldGenerator {
    tag: String,
}

impl FieldGenerator {
    /// `tag` is embedded in every unique column.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Generator for the live feed; its unique values never overlap the
    /// bulk ones of the same run.
    pub fn live(&self) -> Self {
        Self::new(format!("{}l", self.tag))
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn user<R: Rng>(&self, index: u64, rng: &mut R) -> UserRecord {
        let now = Utc::now();
        let username: String = Username().fake_with_rng(rng);
        UserRecord {
            id: 0,
            username: format!("{username}{index}"),
            gender: pick(rng, GENDERS),
            age: rng.random_range(18..=80),
            email: format!("user{index}.{}@example.com", self.tag),
            phone: format!("+1-555-{}-{index:07}", self.tag),
            address: street_address(rng),
            city: CityName().fake_with_rng(rng),
            country: CountryName().fake_with_rng(rng),
            nationality: CountryName().fake_with_rng(rng),
            occupation: pick(rng, OCCUPATIONS),
            marital_status: pick(rng, MARITAL_STATUSES),
            education: pick(rng, EDUCATION),
            hobby: pick(rng, HOBBIES),
            income: money(rng.random_range(3_000.0..13_000.0)),
            registration_date: now - Duration::hours(rng.random_range(0..10_000)),
            last_login: now - Duration::minutes(rng.random_range(0..10_000)),
            loyalty_points: rng.random_range(0..1_000),
            preferred_language: pick(rng, LANGUAGES),
            currency: pick(rng, CURRENCIES),
            timezone: pick(rng, TIMEZONES),
            status: pick(rng, USER_STATUSES),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn product<R: Rng>(&self, index: u64, rng: &mut R) -> ProductRecord {
        let now = Utc::now();
        let name = pick(rng, PRODUCT_NAMES);
        let manufacturer: String = CompanyName().fake_with_rng(rng);
        let supplier: String = CompanyName().fake_with_rng(rng);
        let description: String = Sentence(6..14).fake_with_rng(rng);
        ProductRecord {
            id: 0,
            product_name: format!("{name} {index}"),
            category: pick(rng, CATEGORIES),
            description,
            price: money(rng.random_range(1.0..1_000.0)),
            stock: rng.random_range(0..5_000),
            sku: format!("SKU-{}-{index:06}", self.tag),
            manufacturer,
            weight: money(rng.random_range(0.1..10.0)),
            dimensions: format!(
                "{}x{}x{}",
                rng.random_range(1..100),
                rng.random_range(1..100),
                rng.random_range(1..100)
            ),
            color: pick(rng, COLORS),
            material: pick(rng, MATERIALS),
            release_date: years_ago(now.date_naive(), rng.random_range(0..10)),
            warranty_months: rng.random_range(1..=24),
            country_of_origin: CountryName().fake_with_rng(rng),
            rating: money(rng.random_range(0.0..5.0)),
            review_count: rng.random_range(0..1_000),
            discount: money(rng.random_range(0.0..0.5)),
            stock_status: pick(rng, STOCK_STATUSES),
            supplier,
            created_at: now,
            updated_at: now,
        }
    }

    /// Order referencing `user` and `product`; a missing parent is stored as
    /// [`NO_PARENT`] and yields a zero total.
    pub fn order<R: Rng>(
        &self,
        index: u64,
        user: Option<&UserRecord>,
        product: Option<&ProductRecord>,
        rng: &mut R,
    ) -> OrderRecord {
        let now = Utc::now();
        let quantity: i32 = rng.random_range(1..=10);
        let price = product.map(|product| product.price).unwrap_or(0.0);
        let shipping_address = match user {
            Some(user) => user.address.clone(),
            None => street_address(rng),
        };
        let is_gift = rng.random_bool(0.5);
        OrderRecord {
            id: 0,
            order_number: format!("ORD-{}-{index:010}", self.tag),
            user_id: user.map(|user| user.id).unwrap_or(NO_PARENT),
            product_id: product.map(|product| product.id).unwrap_or(NO_PARENT),
            order_date: now - Duration::minutes(rng.random_range(0..1_000)),
            quantity,
            total_amount: money(price * f64::from(quantity)),
            payment_method: pick(rng, PAYMENT_METHODS),
            billing_address: shipping_address.clone(),
            shipping_address,
            order_status: pick(rng, ORDER_STATUSES),
            discount_amount: money(rng.random_range(0.0..50.0)),
            tax_amount: money(rng.random_range(0.0..20.0)),
            shipping_cost: money(rng.random_range(0.0..10.0)),
            tracking_number: format!("TRK{:08}", rng.random_range(0..100_000_000)),
            delivery_date: now + Duration::minutes(rng.random_range(0..1_000)),
            return_status: pick(rng, RETURN_STATUSES),
            customer_note: Sentence(3..8).fake_with_rng(rng),
            internal_note: Sentence(3..8).fake_with_rng(rng),
            is_gift,
            gift_message: if is_gift {
                let from: String = Name().fake_with_rng(rng);
                format!("Enjoy! From {from}")
            } else {
                String::new()
            },
            extra_info: format!(
                r#"{{"channel":"{}","priority":{}}}"#,
                pick(rng, CHANNELS),
                rng.random_range(1..=5)
            ),
            created_at: now,
            updated_at: now,
        }
    }
}

fn pick<R: Rng>(rng: &mut R, options: &[&str]) -> String {
    options[rng.random_range(0..options.len())].to_string()
}

fn street_address<R: Rng>(rng: &mut R) -> String {
    let street: String = StreetName().fake_with_rng(rng);
    let zip: String = ZipCode().fake_with_rng(rng);
    format!("{} {street}, {zip}", rng.random_range(1..2_000))
}

fn money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn years_ago(today: NaiveDate, years: i32) -> NaiveDate {
    today.with_year(today.year() - years).unwrap_or(today)
}
