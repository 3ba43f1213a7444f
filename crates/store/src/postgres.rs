use std::collections::HashMap;

use async_trait::async_trait;
use common::{CategoryId, OrderId, OrderItemId, ProductId, ProductTypeId, UserId};
use domain::{
    Category, Money, Order, OrderItem, OrderStatus, Product, ProductType, Quantity, User,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderQuery, ProductQuery, Result, StoreError,
    store::{Store, Transaction},
};

const USER_COLUMNS: &str = "id, telegram_id, first_name, user_name, age, phone_number, is_registered, language, created_at";
const PRODUCT_COLUMNS: &str =
    "id, name, category_id, product_type_id, price, unit, description, quantity";
const ORDER_COLUMNS: &str = "id, user_id, created_at, status, is_confirmed, total_price";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, total_price";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(PostgresTransaction {
            tx: self.pool.begin().await?,
        })
    }
}

/// Transaction over a [`PostgresStore`].
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

fn row_to_user(row: PgRow) -> Result<User> {
    let age = row
        .try_get::<Option<i32>, _>("age")?
        .map(u32::try_from)
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("user age: {e}")))?;

    Ok(User {
        id: UserId::from_uuid(row.try_get("id")?),
        telegram_id: row.try_get("telegram_id")?,
        first_name: row.try_get("first_name")?,
        user_name: row.try_get("user_name")?,
        age,
        phone_number: row.try_get("phone_number")?,
        is_registered: row.try_get("is_registered")?,
        language: row.try_get("language")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_category(row: PgRow) -> Result<Category> {
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
    })
}

fn row_to_product_type(row: PgRow) -> Result<ProductType> {
    Ok(ProductType {
        id: ProductTypeId::from_uuid(row.try_get("id")?),
        category_id: CategoryId::from_uuid(row.try_get("category_id")?),
        name: row.try_get("name")?,
    })
}

fn row_to_product(row: PgRow) -> Result<Product> {
    let name: String = row.try_get("name")?;
    let category_id = CategoryId::from_uuid(row.try_get("category_id")?);
    let price = Money::new(row.try_get("price")?);

    let product = Product::new(name, category_id, price)?
        .with_id(ProductId::from_uuid(row.try_get("id")?))
        .with_product_type(
            row.try_get::<Option<Uuid>, _>("product_type_id")?
                .map(ProductTypeId::from_uuid),
        )
        .with_unit_label(row.try_get::<String, _>("unit")?)
        .with_description(row.try_get("description")?)
        .with_stock(Quantity::new(row.try_get("quantity")?))?;
    Ok(product)
}

fn row_to_item(row: PgRow) -> Result<OrderItem> {
    Ok(OrderItem {
        id: OrderItemId::from_uuid(row.try_get("id")?),
        order_id: OrderId::from_uuid(row.try_get("order_id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        quantity: Quantity::new(row.try_get("quantity")?),
        total_price: Money::new(row.try_get("total_price")?),
    })
}

fn row_to_order(row: PgRow, items: Vec<OrderItem>) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let status: OrderStatus = status
        .parse()
        .map_err(|e: domain::UnknownStatus| StoreError::Corrupt(e.to_string()))?;
    // Rows written before the total column was maintained hold NULL.
    let total: Option<Decimal> = row.try_get("total_price")?;

    Ok(Order::restore(
        OrderId::from_uuid(row.try_get("id")?),
        UserId::from_uuid(row.try_get("user_id")?),
        row.try_get("created_at")?,
        status,
        row.try_get("is_confirmed")?,
        Money::new(total.unwrap_or_default()),
        items,
    ))
}

fn age_column(user: &User) -> Result<Option<i32>> {
    user.age
        .map(i32::try_from)
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("user age: {e}")))
}

fn expect_row(rows_affected: u64, entity: &'static str, id: impl std::fmt::Display) -> Result<()> {
    if rows_affected == 0 {
        return Err(StoreError::row_not_found(entity, id));
    }
    Ok(())
}

impl PostgresTransaction {
    async fn items_for_orders(&mut self, order_ids: &[Uuid]) -> Result<HashMap<OrderId, Vec<OrderItem>>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY seq ASC"
        ))
        .bind(order_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = row_to_item(row)?;
            items.entry(item.order_id).or_default().push(item);
        }
        Ok(items)
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn insert_user(&mut self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, telegram_id, first_name, user_name, age, phone_number, is_registered, language, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.notification_address())
        .bind(&user.first_name)
        .bind(&user.user_name)
        .bind(age_column(user)?)
        .bind(&user.phone_number)
        .bind(user.is_registered)
        .bind(&user.language)
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET telegram_id = $2, first_name = $3, user_name = $4, age = $5,
                phone_number = $6, is_registered = $7, language = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.notification_address())
        .bind(&user.first_name)
        .bind(&user.user_name)
        .bind(age_column(user)?)
        .bind(&user.phone_number)
        .bind(user.is_registered)
        .bind(&user.language)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result.rows_affected(), "User", user.id)
    }

    async fn get_user(&mut self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(row_to_user).transpose()
    }

    async fn find_user_by_telegram_id(&mut self, telegram_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = $1"
        ))
        .bind(telegram_id.trim())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_user).transpose()
    }

    async fn list_users(&mut self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn insert_category(&mut self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> Result<()> {
        let result = sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected(), "Category", category.id)
    }

    async fn get_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(row_to_category).transpose()
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name ASC")
            .fetch_all(&mut *self.tx)
            .await?;
        rows.into_iter().map(row_to_category).collect()
    }

    async fn insert_product_type(&mut self, product_type: &ProductType) -> Result<()> {
        sqlx::query("INSERT INTO product_types (id, category_id, name) VALUES ($1, $2, $3)")
            .bind(product_type.id.as_uuid())
            .bind(product_type.category_id.as_uuid())
            .bind(&product_type.name)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn get_product_type(&mut self, id: ProductTypeId) -> Result<Option<ProductType>> {
        let row = sqlx::query("SELECT id, category_id, name FROM product_types WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(row_to_product_type).transpose()
    }

    async fn list_product_types(&mut self, category_id: CategoryId) -> Result<Vec<ProductType>> {
        let rows = sqlx::query(
            "SELECT id, category_id, name FROM product_types WHERE category_id = $1 ORDER BY name ASC",
        )
        .bind(category_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_product_type).collect()
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, category_id, product_type_id, price, unit, description, quantity, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.category_id.as_uuid())
        .bind(product.product_type_id.map(|id| id.as_uuid()))
        .bind(product.unit_price().amount())
        .bind(&product.unit_label)
        .bind(&product.description)
        .bind(product.on_hand_quantity().value())
        .bind(product.is_available())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_product).transpose()
    }

    async fn query_products(&mut self, query: &ProductQuery) -> Result<Vec<Product>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut param_count = 0;

        if query.category_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category_id = ${param_count}"));
        }
        if query.product_type_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND product_type_id = ${param_count}"));
        }
        if query.available_only {
            sql.push_str(" AND available");
        }

        sql.push_str(" ORDER BY name ASC, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(id) = query.category_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(id) = query.product_type_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&mut *self.tx).await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn update_product_stock(&mut self, product: &Product) -> Result<()> {
        let result = sqlx::query("UPDATE products SET quantity = $2, available = $3 WHERE id = $1")
            .bind(product.id.as_uuid())
            .bind(product.on_hand_quantity().value())
            .bind(product.is_available())
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected(), "Product", product.id)
    }

    async fn update_product_price(&mut self, product: &Product) -> Result<()> {
        let result = sqlx::query("UPDATE products SET price = $2 WHERE id = $1")
            .bind(product.id.as_uuid())
            .bind(product.unit_price().amount())
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected(), "Product", product.id)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, created_at, status, is_confirmed, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(order.created_at())
        .bind(order.status().as_str())
        .bind(order.is_confirmed())
        .bind(order.total_price().amount())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut items = self.items_for_orders(&[id.as_uuid()]).await?;
        row_to_order(row, items.remove(&id).unwrap_or_default()).map(Some)
    }

    async fn query_orders(&mut self, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;

        if query.user_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(id) = query.user_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&mut *self.tx).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut items = self.items_for_orders(&ids).await?;

        rows.into_iter()
            .zip(ids)
            .map(|(row, id)| {
                let order_items = items.remove(&OrderId::from_uuid(id)).unwrap_or_default();
                row_to_order(row, order_items)
            })
            .collect()
    }

    async fn update_order_status(&mut self, order: &Order) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2, is_confirmed = $3 WHERE id = $1")
            .bind(order.id().as_uuid())
            .bind(order.status().as_str())
            .bind(order.is_confirmed())
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected(), "Order", order.id())
    }

    async fn update_order_total(&mut self, order: &Order) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET total_price = $2 WHERE id = $1")
            .bind(order.id().as_uuid())
            .bind(order.total_price().amount())
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected(), "Order", order.id())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_item(&mut self, item: &OrderItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, total_price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET quantity = EXCLUDED.quantity, total_price = EXCLUDED.total_price
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.order_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity.value())
        .bind(item.total_price.amount())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_item(&mut self, id: OrderItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM order_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| StoreError::CommitFailed(e.to_string()))
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
