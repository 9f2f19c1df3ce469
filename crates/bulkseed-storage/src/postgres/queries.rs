use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use bulkseed_core::{Error, JoinedOrder, OrderRecord, ProductRecord, Result, UserRecord};

/// Postgres rejects statements with more bind parameters than this.
const MAX_BIND_PARAMS: usize = 65_535;

const USER_COLUMNS: &[&str] = &[
    "username",
    "gender",
    "age",
    "email",
    "phone",
    "address",
    "city",
    "country",
    "nationality",
    "occupation",
    "marital_status",
    "education",
    "hobby",
    "income",
    "registration_date",
    "last_login",
    "loyalty_points",
    "preferred_language",
    "currency",
    "timezone",
    "status",
    "created_at",
    "updated_at",
];

const PRODUCT_COLUMNS: &[&str] = &[
    "product_name",
    "category",
    "description",
    "price",
    "stock",
    "sku",
    "manufacturer",
    "weight",
    "dimensions",
    "color",
    "material",
    "release_date",
    "warranty_months",
    "country_of_origin",
    "rating",
    "review_count",
    "discount",
    "stock_status",
    "supplier",
    "created_at",
    "updated_at",
];

const ORDER_COLUMNS: &[&str] = &[
    "order_number",
    "user_id",
    "product_id",
    "order_date",
    "quantity",
    "total_amount",
    "payment_method",
    "shipping_address",
    "billing_address",
    "order_status",
    "discount_amount",
    "tax_amount",
    "shipping_cost",
    "tracking_number",
    "delivery_date",
    "return_status",
    "customer_note",
    "internal_note",
    "is_gift",
    "gift_message",
    "extra_info",
    "created_at",
    "updated_at",
];

/// Schema statements, applied in order. `user_id`/`product_id` are
/// deliberately not foreign keys.
pub const MIGRATIONS: &[&str] = &[
    r#"
    create table if not exists users (
      id bigserial primary key,
      username varchar(64) not null,
      gender varchar(16) not null,
      age integer not null,
      email varchar(160) not null unique,
      phone varchar(32) not null unique,
      address varchar(256) not null,
      city varchar(96) not null,
      country varchar(96) not null,
      nationality varchar(96) not null,
      occupation varchar(64) not null,
      marital_status varchar(16) not null,
      education varchar(64) not null,
      hobby varchar(128) not null,
      income double precision not null,
      registration_date timestamptz not null,
      last_login timestamptz not null,
      loyalty_points integer not null,
      preferred_language varchar(32) not null,
      currency varchar(8) not null,
      timezone varchar(32) not null,
      status varchar(16) not null,
      created_at timestamptz not null,
      updated_at timestamptz not null
    )
    "#,
    "create index if not exists idx_users_username on users (username)",
    "create index if not exists idx_users_registration_date on users (registration_date)",
    "create index if not exists idx_users_status on users (status)",
    r#"
    create table if not exists products (
      id bigserial primary key,
      product_name varchar(160) not null,
      category varchar(64) not null,
      description text not null,
      price double precision not null,
      stock integer not null,
      sku varchar(64) not null unique,
      manufacturer varchar(160) not null,
      weight double precision not null,
      dimensions varchar(64) not null,
      color varchar(32) not null,
      material varchar(64) not null,
      release_date date not null,
      warranty_months integer not null,
      country_of_origin varchar(96) not null,
      rating double precision not null,
      review_count integer not null,
      discount double precision not null,
      stock_status varchar(32) not null,
      supplier varchar(160) not null,
      created_at timestamptz not null,
      updated_at timestamptz not null
    )
    "#,
    "create index if not exists idx_products_product_name on products (product_name)",
    "create index if not exists idx_products_category on products (category)",
    "create index if not exists idx_products_rating on products (rating)",
    r#"
    create table if not exists orders (
      id bigserial primary key,
      order_number varchar(64) not null unique,
      user_id bigint not null,
      product_id bigint not null,
      order_date timestamptz not null,
      quantity integer not null,
      total_amount double precision not null,
      payment_method varchar(32) not null,
      shipping_address varchar(256) not null,
      billing_address varchar(256) not null,
      order_status varchar(32) not null,
      discount_amount double precision not null,
      tax_amount double precision not null,
      shipping_cost double precision not null,
      tracking_number varchar(64) not null,
      delivery_date timestamptz not null,
      return_status varchar(32) not null,
      customer_note text not null,
      internal_note text not null,
      is_gift boolean not null,
      gift_message text not null,
      extra_info text not null,
      created_at timestamptz not null,
      updated_at timestamptz not null
    )
    "#,
    "create index if not exists idx_orders_user_id on orders (user_id)",
    "create index if not exists idx_orders_product_id on orders (product_id)",
    "create index if not exists idx_orders_order_date on orders (order_date)",
    "create index if not exists idx_orders_order_status on orders (order_status)",
];

pub async fn apply_migrations(pool: &PgPool) -> Result<()> {
    for statement in MIGRATIONS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(db_error)?;
    }
    Ok(())
}

/// Rows per INSERT statement for a table with `columns` bound columns.
pub fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

pub async fn insert_users(conn: &mut PgConnection, users: &mut [UserRecord]) -> Result<()> {
    for chunk in users.chunks_mut(rows_per_statement(USER_COLUMNS.len())) {
        let ids = {
            let mut builder = insert_prefix("users", USER_COLUMNS);
            builder.push_values(chunk.iter(), |mut row, user| {
                row.push_bind(&user.username)
                    .push_bind(&user.gender)
                    .push_bind(user.age)
                    .push_bind(&user.email)
                    .push_bind(&user.phone)
                    .push_bind(&user.address)
                    .push_bind(&user.city)
                    .push_bind(&user.country)
                    .push_bind(&user.nationality)
                    .push_bind(&user.occupation)
                    .push_bind(&user.marital_status)
                    .push_bind(&user.education)
                    .push_bind(&user.hobby)
                    .push_bind(user.income)
                    .push_bind(user.registration_date)
                    .push_bind(user.last_login)
                    .push_bind(user.loyalty_points)
                    .push_bind(&user.preferred_language)
                    .push_bind(&user.currency)
                    .push_bind(&user.timezone)
                    .push_bind(&user.status)
                    .push_bind(user.created_at)
                    .push_bind(user.updated_at);
            });
            builder.push(" returning id");
            builder
                .build_query_scalar::<i64>()
                .fetch_all(&mut *conn)
                .await
                .map_err(db_error)?
        };
        assign_ids(chunk, ids, |user, id| user.id = id)?;
    }
    Ok(())
}

pub async fn insert_products(
    conn: &mut PgConnection,
    products: &mut [ProductRecord],
) -> Result<()> {
    for chunk in products.chunks_mut(rows_per_statement(PRODUCT_COLUMNS.len())) {
        let ids = {
            let mut builder = insert_prefix("products", PRODUCT_COLUMNS);
            builder.push_values(chunk.iter(), |mut row, product| {
                row.push_bind(&product.product_name)
                    .push_bind(&product.category)
                    .push_bind(&product.description)
                    .push_bind(product.price)
                    .push_bind(product.stock)
                    .push_bind(&product.sku)
                    .push_bind(&product.manufacturer)
                    .push_bind(product.weight)
                    .push_bind(&product.dimensions)
                    .push_bind(&product.color)
                    .push_bind(&product.material)
                    .push_bind(product.release_date)
                    .push_bind(product.warranty_months)
                    .push_bind(&product.country_of_origin)
                    .push_bind(product.rating)
                    .push_bind(product.review_count)
                    .push_bind(product.discount)
                    .push_bind(&product.stock_status)
                    .push_bind(&product.supplier)
                    .push_bind(product.created_at)
                    .push_bind(product.updated_at);
            });
            builder.push(" returning id");
            builder
                .build_query_scalar::<i64>()
                .fetch_all(&mut *conn)
                .await
                .map_err(db_error)?
        };
        assign_ids(chunk, ids, |product, id| product.id = id)?;
    }
    Ok(())
}

pub async fn insert_orders(conn: &mut PgConnection, orders: &mut [OrderRecord]) -> Result<()> {
    for chunk in orders.chunks_mut(rows_per_statement(ORDER_COLUMNS.len())) {
        let ids = {
            let mut builder = insert_prefix("orders", ORDER_COLUMNS);
            builder.push_values(chunk.iter(), |mut row, order| {
                row.push_bind(&order.order_number)
                    .push_bind(order.user_id)
                    .push_bind(order.product_id)
                    .push_bind(order.order_date)
                    .push_bind(order.quantity)
                    .push_bind(order.total_amount)
                    .push_bind(&order.payment_method)
                    .push_bind(&order.shipping_address)
                    .push_bind(&order.billing_address)
                    .push_bind(&order.order_status)
                    .push_bind(order.discount_amount)
                    .push_bind(order.tax_amount)
                    .push_bind(order.shipping_cost)
                    .push_bind(&order.tracking_number)
                    .push_bind(order.delivery_date)
                    .push_bind(&order.return_status)
                    .push_bind(&order.customer_note)
                    .push_bind(&order.internal_note)
                    .push_bind(order.is_gift)
                    .push_bind(&order.gift_message)
                    .push_bind(&order.extra_info)
                    .push_bind(order.created_at)
                    .push_bind(order.updated_at);
            });
            builder.push(" returning id");
            builder
                .build_query_scalar::<i64>()
                .fetch_all(&mut *conn)
                .await
                .map_err(db_error)?
        };
        assign_ids(chunk, ids, |order, id| order.id = id)?;
    }
    Ok(())
}

pub async fn fetch_joined_order(pool: &PgPool, order_id: i64) -> Result<Option<JoinedOrder>> {
    let row = sqlx::query_as::<_, (String, String, String, f64)>(
        r#"
        select o.order_number, u.username, p.product_name, o.total_amount
        from orders o
        join users u on o.user_id = u.id
        join products p on o.product_id = p.id
        where o.id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error)?;

    Ok(row.map(
        |(order_number, username, product_name, total_amount)| JoinedOrder {
            order_number,
            username,
            product_name,
            total_amount,
        },
    ))
}

fn insert_prefix<'args>(table: &str, columns: &[&str]) -> QueryBuilder<'args, Postgres> {
    QueryBuilder::new(format!("insert into {table} ({}) ", columns.join(", ")))
}

fn assign_ids<T>(rows: &mut [T], ids: Vec<i64>, mut set: impl FnMut(&mut T, i64)) -> Result<()> {
    if ids.len() != rows.len() {
        return Err(Error::Db(format!(
            "insert returned {} ids for {} rows",
            ids.len(),
            rows.len()
        )));
    }
    for (row, id) in rows.iter_mut().zip(ids) {
        set(row, id);
    }
    Ok(())
}

pub(crate) fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_stays_under_bind_limit() {
        for columns in [USER_COLUMNS, PRODUCT_COLUMNS, ORDER_COLUMNS] {
            let rows = rows_per_statement(columns.len());
            assert!(rows * columns.len() <= MAX_BIND_PARAMS);
            assert!(rows >= 1_000, "a default batch should fit one statement");
        }
    }

    #[test]
    fn every_bound_column_is_created() {
        let ddl = MIGRATIONS.concat();
        for column in USER_COLUMNS.iter().chain(PRODUCT_COLUMNS).chain(ORDER_COLUMNS) {
            assert!(ddl.contains(&format!("\n      {column} ")), "missing {column}");
        }
        assert_eq!(USER_COLUMNS.len(), 23);
        assert_eq!(PRODUCT_COLUMNS.len(), 21);
        assert_eq!(ORDER_COLUMNS.len(), 24);
    }

    #[test]
    fn orders_table_has_no_foreign_keys() {
        assert!(MIGRATIONS.iter().all(|sql| !sql.contains("references")));
    }

    #[test]
    fn assign_ids_rejects_count_mismatch() {
        let mut rows = vec![0_i64; 3];
        let err = assign_ids(&mut rows, vec![1, 2], |row, id| *row = id);
        assert!(matches!(err, Err(Error::Db(_))));

        assign_ids(&mut rows, vec![7, 8, 9], |row, id| *row = id).expect("ids assigned");
        assert_eq!(rows, vec![7, 8, 9]);
    }
}
