use async_trait::async_trait;
use chrono::NaiveDate;
use common::{Cart, CartId, CartItem, Money, Order, OrderId, OrderItem, OrderStatus, Product,
    ProductId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{CartStore, OrderStore, ProductFilter, ProductStore},
};

/// PostgreSQL-backed store implementation.
///
/// The lifecycle writes (`commit_placement`, `commit_cancellation`) run in a
/// single database transaction. Inventory debits are guarded UPDATEs
/// (`inventory = inventory - q ... AND inventory >= q`), so two placements
/// racing the same product row serialize on the row lock and the loser sees
/// the already-debited value; stock can never go negative.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            brand: row.try_get("brand")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            inventory: decode_quantity(row.try_get("inventory")?)?,
        })
    }

    fn row_to_cart_item(row: &PgRow) -> Result<CartItem> {
        Ok(CartItem {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: decode_quantity(row.try_get("quantity")?)?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        })
    }

    fn row_to_order_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: decode_quantity(row.try_get("quantity")?)?,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }

    async fn load_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity, unit_price_cents
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY id
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_cart_item).collect()
    }

    async fn load_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order_item).collect()
    }

    async fn row_to_cart(&self, row: &PgRow) -> Result<Cart> {
        let id = CartId::from_uuid(row.try_get::<Uuid, _>("id")?);
        Ok(Cart {
            id,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            total: Money::from_cents(row.try_get("total_cents")?),
            items: self.load_cart_items(id).await?,
        })
    }

    async fn row_to_order(&self, row: &PgRow) -> Result<Order> {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let status: String = row.try_get("status")?;
        Ok(Order {
            id,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            order_date: row.try_get::<NaiveDate, _>("order_date")?,
            status: OrderStatus::parse(&status)
                .ok_or_else(|| StoreError::CorruptRow(format!("unknown order status: {status}")))?,
            total: Money::from_cents(row.try_get("total_cents")?),
            items: self.load_order_items(id).await?,
        })
    }
}

fn decode_quantity(raw: i64) -> Result<u32> {
    u32::try_from(raw)
        .map_err(|_| StoreError::CorruptRow(format!("quantity out of range: {raw}")))
}

/// Debits inventory for every order line inside the given transaction.
///
/// Each line is a guarded check-and-decrement; a line that would go negative
/// aborts with `InsufficientInventory` and the caller rolls back.
async fn debit_inventory(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    items: &[OrderItem],
) -> Result<()> {
    for item in items {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET inventory = inventory - $1
            WHERE id = $2 AND inventory >= $1
            "#,
        )
        .bind(i64::from(item.quantity))
        .bind(item.product_id.as_uuid())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT inventory FROM products WHERE id = $1")
                    .bind(item.product_id.as_uuid())
                    .fetch_optional(&mut **tx)
                    .await?;
            return Err(match exists {
                Some(_) => StoreError::InsufficientInventory {
                    product_id: item.product_id,
                },
                None => StoreError::MissingRow {
                    entity: "product",
                    id: item.product_id.to_string(),
                },
            });
        }
    }
    Ok(())
}

async fn insert_order(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, user_id, order_date, status, total_cents)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE
        SET status = EXCLUDED.status, total_cents = EXCLUDED.total_cents
        "#,
    )
    .bind(order.id.as_uuid())
    .bind(order.user_id.as_uuid())
    .bind(order.order_date)
    .bind(order.status.as_str())
    .bind(order.total.cents())
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
        .bind(order.id.as_uuid())
        .execute(&mut **tx)
        .await?;

    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, quantity, price_cents)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(&item.product_name)
        .bind(i64::from(item.quantity))
        .bind(item.price.cents())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Deletes a cart's item rows and zeroes its total inside the transaction.
async fn clear_cart_rows(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cart_id: CartId,
) -> Result<()> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id.as_uuid())
        .execute(&mut **tx)
        .await?;

    let result = sqlx::query("UPDATE carts SET total_cents = 0 WHERE id = $1")
        .bind(cart_id.as_uuid())
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::MissingRow {
            entity: "cart",
            id: cart_id.to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, brand, description, category, price_cents, inventory
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn save_product(&self, product: Product) -> Result<Product> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, brand, description, category, price_cents, inventory)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                brand = EXCLUDED.brand,
                description = EXCLUDED.description,
                category = EXCLUDED.category,
                price_cents = EXCLUDED.price_cents,
                inventory = EXCLUDED.inventory
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.cents())
        .bind(i64::from(product.inventory))
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, brand, description, category, price_cents, inventory
            FROM products
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR brand = $2)
              AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
            ORDER BY name
            "#,
        )
        .bind(filter.category.as_deref())
        .bind(filter.brand.as_deref())
        .bind(filter.name.as_deref())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT id, user_id, total_cents FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_cart(&row).await?)),
            None => Ok(None),
        }
    }

    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT id, user_id, total_cents FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_cart(&row).await?)),
            None => Ok(None),
        }
    }

    async fn save_cart(&self, cart: Cart) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, total_cents)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET total_cents = EXCLUDED.total_cents
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(cart.total.cents())
        .execute(&mut *tx)
        .await?;

        // Replace the item rows to match the aggregate.
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for item in &cart.items {
            sqlx::query(
                r#"
                INSERT INTO cart_items (cart_id, product_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(cart.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(cart)
    }

    async fn delete_cart_items(&self, cart_id: CartId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        clear_cart_rows(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            "SELECT id, user_id, order_date, status, total_cents FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_order(&row).await?)),
            None => Ok(None),
        }
    }

    async fn find_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, order_date, status, total_cents
            FROM orders
            WHERE user_id = $1
            ORDER BY order_date
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(self.row_to_order(row).await?);
        }
        Ok(orders)
    }

    async fn save_order(&self, order: Order) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        insert_order(&mut tx, &order).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn commit_placement(&self, order: Order, cart_id: CartId) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        debit_inventory(&mut tx, &order.items).await?;
        insert_order(&mut tx, &order).await?;
        clear_cart_rows(&mut tx, cart_id).await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn commit_cancellation(&self, order: Order) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Guarded status flip first: a racing cancellation that committed
        // ahead of us leaves zero rows here and no credit is applied.
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(order.status.as_str())
            .bind(order.id.as_uuid())
            .bind(OrderStatus::Pending.as_str())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            let exists: Option<String> =
                sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                    .bind(order.id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => StoreError::AlreadyCancelled { order_id: order.id },
                None => StoreError::MissingRow {
                    entity: "order",
                    id: order.id.to_string(),
                },
            });
        }

        for item in &order.items {
            let result = sqlx::query("UPDATE products SET inventory = inventory + $1 WHERE id = $2")
                .bind(i64::from(item.quantity))
                .bind(item.product_id.as_uuid())
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                // The product left the catalog after the order was placed;
                // there is no stock row left to credit.
                tracing::warn!(
                    product_id = %item.product_id,
                    "skipping inventory credit for deleted product"
                );
            }
        }

        tx.commit().await?;
        Ok(order)
    }
}
