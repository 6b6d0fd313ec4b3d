//! Order placement, promo application, and inventory bookkeeping.
//!
//! Every public operation here is one database transaction: it either
//! commits all of its writes (order row, balance debit, stock decrements,
//! promo usage) or none of them.

mod error;

pub use error::CheckoutError;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use verdant_core::{OrderId, PaymentMethod, PaymentStatus, ProductId};

use crate::db::orders::{self, AdminOrderUpdate, NewOrder, OrderRepository};
use crate::db::promo_codes::{self, PromoCodeRepository};
use crate::db::{notifications, products, users};
use crate::models::{Order, OrderItem, PromoCode, User};

/// One requested cart line.
#[derive(Debug, Clone, Copy)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Everything the customer submits at checkout.
#[derive(Debug, Clone)]
pub struct PlaceOrderInput {
    pub items: Vec<CartLine>,
    pub delivery_amount: Decimal,
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub delivery_type: String,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
}

/// Checkout service: order creation, status transitions, promo application,
/// and the inventory decrement that ties them together.
pub struct CheckoutService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Place an order from a cart.
    ///
    /// Validates stock and promo eligibility, computes totals, persists the
    /// order with a frozen line-item snapshot, and (for the balance payment
    /// path) debits the balance and decrements inventory. One transaction;
    /// any failure leaves no side effects.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]; each validation failure maps to a distinct
    /// variant and nothing is committed.
    pub async fn place_order(
        &self,
        user: &User,
        input: &PlaceOrderInput,
    ) -> Result<Order, CheckoutError> {
        if input.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if input.delivery_amount < Decimal::ZERO {
            return Err(CheckoutError::InvalidDeliveryAmount);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Snapshot every line; the whole request fails if any line does.
        let mut items = Vec::with_capacity(input.items.len());
        let mut items_total = Decimal::ZERO;
        for line in &input.items {
            if line.quantity <= 0 {
                return Err(CheckoutError::InvalidQuantity {
                    product_id: line.product_id,
                });
            }
            let product = products::get_tx(&mut tx, line.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound {
                    product_id: line.product_id,
                })?;
            if !product.is_available {
                return Err(CheckoutError::ProductUnavailable { name: product.name });
            }
            if !product.has_stock(line.quantity) {
                return Err(CheckoutError::InsufficientStock {
                    name: product.name,
                    available: product.quantity,
                    requested: line.quantity,
                });
            }

            let item = OrderItem {
                product_id: product.id,
                name: product.name,
                price: product.price,
                quantity: line.quantity,
            };
            items_total += item.subtotal();
            items.push(item);
        }

        let promo = match &input.promo_code {
            Some(code) => Some(validate_promo_tx(&mut tx, user, code, items_total, now).await?),
            None => None,
        };
        let discount = promo
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.compute_discount(items_total));

        let total_amount = items_total - discount + input.delivery_amount;

        // Balance orders are settled immediately: debit, mark completed,
        // decrement stock before commit.
        let payment_status = match input.payment_method {
            PaymentMethod::Balance => {
                let fresh = users::get_by_id_tx(&mut tx, user.id)
                    .await?
                    .ok_or(CheckoutError::Repository(
                        crate::db::RepositoryError::NotFound,
                    ))?;
                if fresh.balance < total_amount {
                    return Err(CheckoutError::InsufficientBalance);
                }
                users::set_balance_tx(&mut tx, user.id, fresh.balance - total_amount).await?;
                PaymentStatus::Completed
            }
            PaymentMethod::BankTransfer | PaymentMethod::CashOnDelivery => PaymentStatus::Pending,
        };

        let mut order = orders::insert_tx(
            &mut tx,
            &NewOrder {
                user_id: user.id,
                items,
                items_total,
                discount,
                delivery_amount: input.delivery_amount,
                total_amount,
                full_name: input.full_name.clone(),
                address: input.address.clone(),
                phone: input.phone.clone(),
                delivery_type: input.delivery_type.clone(),
                payment_method: input.payment_method,
                payment_status,
                status: verdant_core::OrderStatus::Pending,
                promo_code: promo.as_ref().map(|p| p.code.clone()),
            },
        )
        .await?;

        if let Some(promo) = &promo {
            promo_codes::record_use_tx(&mut tx, promo.id, user.id, order.id, discount).await?;
        }

        if payment_status == PaymentStatus::Completed {
            reduce_quantities_tx(&mut tx, &order).await?;
            order = orders::get_tx(&mut tx, order.id)
                .await?
                .ok_or(CheckoutError::OrderNotFound)?;
        }

        tx.commit().await?;
        tracing::info!(order_id = %order.id, user_id = %user.id, total = %order.total_amount, "order placed");
        Ok(order)
    }

    /// Preview a promo code against a cart total without recording anything.
    ///
    /// Enforces the same rule set as order creation, including
    /// single-use-per-user.
    ///
    /// # Errors
    ///
    /// Returns the same promo errors as [`CheckoutService::place_order`].
    pub async fn preview_promo(
        &self,
        user: &User,
        code: &str,
        cart_total: Decimal,
    ) -> Result<(PromoCode, Decimal), CheckoutError> {
        let repo = PromoCodeRepository::new(self.pool);
        let promo = repo
            .get_by_code(code)
            .await?
            .ok_or(CheckoutError::PromoNotFound)?;

        promo.check_eligibility(cart_total, Utc::now())?;
        if repo.has_user_used(promo.id, user.id).await? {
            return Err(CheckoutError::PromoAlreadyUsed);
        }

        let discount = promo.compute_discount(cart_total);
        Ok((promo, discount))
    }

    /// Apply a promo code to an existing order.
    ///
    /// Recomputes the discount against the order's frozen item subtotal and
    /// rewrites the total. Same eligibility rules as order creation.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::PromoAlreadyApplied` if the order already has
    /// a code, plus the usual promo errors.
    pub async fn apply_promo(
        &self,
        user: &User,
        order_id: OrderId,
        code: &str,
    ) -> Result<Order, CheckoutError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = orders::get_tx(&mut tx, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;
        if order.user_id != user.id && !user.is_admin {
            return Err(CheckoutError::NotOrderOwner);
        }
        if order.promo_code.is_some() {
            return Err(CheckoutError::PromoAlreadyApplied);
        }

        let promo = validate_promo_tx(&mut tx, user, code, order.items_total, now).await?;
        let discount = promo.compute_discount(order.items_total);
        let total_amount = order.items_total - discount + order.delivery_amount;

        let updated =
            orders::set_promo_tx(&mut tx, order.id, &promo.code, discount, total_amount).await?;
        promo_codes::record_use_tx(&mut tx, promo.id, order.user_id, order.id, discount).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Admin update of an order (status, payment status, comment, tracking,
    /// delivery date).
    ///
    /// Status changes are checked against the transition table. Entering
    /// `paid` or `processing` from a state that is neither decrements
    /// inventory exactly once, guarded by the order's flag; replaying the
    /// same update is a no-op for stock.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::IllegalTransition` for moves the table
    /// forbids, `CheckoutError::OrderNotFound` for unknown orders.
    pub async fn update_order(
        &self,
        order_id: OrderId,
        update: &AdminOrderUpdate,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let order = orders::get_tx(&mut tx, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if let Some(new_status) = update.status {
            if !order.status.can_transition_to(new_status) {
                return Err(CheckoutError::IllegalTransition {
                    from: order.status,
                    to: new_status,
                });
            }
            if new_status.triggers_inventory_decrement(order.status) {
                reduce_quantities_tx(&mut tx, &order).await?;
            }
        }

        let updated = orders::update_admin_fields_tx(&mut tx, order_id, update).await?;

        if let Some(new_status) = update.status
            && new_status != order.status
        {
            notifications::create_tx(
                &mut tx,
                order.user_id,
                Some(order.id),
                "order_status",
                &format!("Your order #{} is now {new_status}", order.id),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Attach an uploaded payment proof to the owner's order.
    ///
    /// Moves the payment to pending verification and decrements inventory
    /// (once) since the order is now effectively pre-paid.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotOrderOwner` if the caller doesn't own the
    /// order.
    pub async fn attach_payment_proof(
        &self,
        user: &User,
        order_id: OrderId,
        proof_url: &str,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let order = orders::get_tx(&mut tx, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;
        if order.user_id != user.id {
            return Err(CheckoutError::NotOrderOwner);
        }

        orders::set_payment_proof_tx(
            &mut tx,
            order_id,
            proof_url,
            PaymentStatus::PendingVerification,
        )
        .await?;
        reduce_quantities_tx(&mut tx, &order).await?;

        let updated = orders::get_tx(&mut tx, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete an order, reversing its side effects.
    ///
    /// If inventory was decremented, each line's quantity is restored; if a
    /// promo was used, the usage row is removed and the code's counter
    /// decremented. One transaction.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't exist.
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let order = orders::get_tx(&mut tx, order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if order.quantities_reduced {
            for item in &order.items {
                if item.quantity <= 0 {
                    continue;
                }
                products::restore_quantity_tx(&mut tx, item.product_id, item.quantity).await?;
            }
        }

        if let Some(use_record) = promo_codes::get_use_for_order_tx(&mut tx, order_id).await? {
            promo_codes::reverse_use_tx(&mut tx, &use_record).await?;
        }

        orders::delete_tx(&mut tx, order_id).await?;

        tx.commit().await?;
        tracing::info!(order_id = %order_id, "order deleted, side effects reversed");
        Ok(())
    }

    /// Get an order, enforcing ownership unless the caller is an admin.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` / `CheckoutError::NotOrderOwner`.
    pub async fn get_order(&self, user: &User, order_id: OrderId) -> Result<Order, CheckoutError> {
        let order = OrderRepository::new(self.pool)
            .get(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if order.user_id != user.id && !user.is_admin {
            return Err(CheckoutError::NotOrderOwner);
        }
        Ok(order)
    }
}

/// Full promo validation inside an open transaction: existence, eligibility
/// rules, and the single-use-per-user check. Shared by order creation and
/// the apply-to-existing-order path so the rule set cannot drift apart.
async fn validate_promo_tx(
    conn: &mut SqliteConnection,
    user: &User,
    code: &str,
    items_total: Decimal,
    now: DateTime<Utc>,
) -> Result<PromoCode, CheckoutError> {
    let promo = promo_codes::get_by_code_tx(&mut *conn, code)
        .await?
        .ok_or(CheckoutError::PromoNotFound)?;

    promo.check_eligibility(items_total, now)?;

    if promo_codes::has_user_used_tx(conn, promo.id, user.id).await? {
        return Err(CheckoutError::PromoAlreadyUsed);
    }

    Ok(promo)
}

/// Decrement stock for an order's lines exactly once.
///
/// No-op if the order's `quantities_reduced` flag is already set. Skips
/// non-positive quantities, clamps stock at zero, and sets the flag in the
/// same transaction as the decrements.
async fn reduce_quantities_tx(
    conn: &mut SqliteConnection,
    order: &Order,
) -> Result<(), CheckoutError> {
    if order.quantities_reduced {
        return Ok(());
    }

    for item in &order.items {
        if item.quantity <= 0 {
            continue;
        }
        products::decrement_quantity_tx(&mut *conn, item.product_id, item.quantity).await?;
    }

    orders::set_quantities_reduced_tx(conn, order.id).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::dec;
    use verdant_core::{DiscountType, OrderStatus};

    use crate::db::products::{ProductInput, ProductRepository};
    use crate::db::promo_codes::PromoCodeInput;
    use crate::db::test_support::memory_pool;
    use crate::db::users::UserRepository;
    use verdant_core::Email;

    async fn make_user(pool: &SqlitePool, email: &str, balance: Decimal) -> User {
        let repo = UserRepository::new(pool);
        let user = repo
            .create(&Email::parse(email).unwrap(), "hash", "Test User", false)
            .await
            .unwrap();
        if balance > Decimal::ZERO {
            repo.add_balance(user.id, balance).await.unwrap()
        } else {
            user
        }
    }

    async fn make_product(pool: &SqlitePool, name: &str, price: Decimal, quantity: i64) -> ProductId {
        ProductRepository::new(pool)
            .create(&ProductInput {
                name: Some(name.to_owned()),
                price: Some(price),
                quantity: Some(quantity),
                ..ProductInput::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn make_promo(pool: &SqlitePool, code: &str, input: PromoCodeInput) -> PromoCode {
        let now = Utc::now();
        PromoCodeRepository::new(pool)
            .create(&PromoCodeInput {
                code: Some(code.to_owned()),
                starts_at: Some(input.starts_at.unwrap_or(now - Duration::days(1))),
                ends_at: Some(input.ends_at.unwrap_or(now + Duration::days(30))),
                ..input
            })
            .await
            .unwrap()
    }

    fn order_input(product_id: ProductId, quantity: i64, delivery: Decimal) -> PlaceOrderInput {
        PlaceOrderInput {
            items: vec![CartLine {
                product_id,
                quantity,
            }],
            delivery_amount: delivery,
            full_name: "Fern Fan".to_owned(),
            address: "1 Greenhouse Lane".to_owned(),
            phone: "+1000000".to_owned(),
            delivery_type: "courier".to_owned(),
            payment_method: PaymentMethod::CashOnDelivery,
            promo_code: None,
        }
    }

    async fn stock_of(pool: &SqlitePool, id: ProductId) -> i64 {
        ProductRepository::new(pool).get(id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_totals_without_promo() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        let checkout = CheckoutService::new(&pool);

        let order = checkout
            .place_order(&user, &order_input(product, 2, dec!(300)))
            .await
            .unwrap();

        assert_eq!(order.items_total, dec!(1000));
        assert_eq!(order.discount, Decimal::ZERO);
        assert_eq!(order.total_amount, dec!(1300));
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.quantities_reduced);
        // Cash orders leave stock untouched until a qualifying transition.
        assert_eq!(stock_of(&pool, product).await, 10);
    }

    #[tokio::test]
    async fn test_balance_payment_settles_immediately() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "rich@example.com", dec!(2000)).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        let checkout = CheckoutService::new(&pool);

        let mut input = order_input(product, 2, dec!(300));
        input.payment_method = PaymentMethod::Balance;
        let order = checkout.place_order(&user, &input).await.unwrap();

        assert!(order.quantities_reduced);
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(stock_of(&pool, product).await, 8);

        let after = UserRepository::new(&pool)
            .get_by_id(user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.balance, dec!(700));
    }

    #[tokio::test]
    async fn test_insufficient_balance_rolls_back_everything() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "poor@example.com", dec!(100)).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        let checkout = CheckoutService::new(&pool);

        let mut input = order_input(product, 2, dec!(300));
        input.payment_method = PaymentMethod::Balance;
        let err = checkout.place_order(&user, &input).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientBalance));

        assert_eq!(stock_of(&pool, product).await, 10);
        assert!(OrderRepository::new(&pool).list_for_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_over_quantity_fails_whole_order() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let scarce = make_product(&pool, "Rare fern", dec!(100), 1).await;
        let plenty = make_product(&pool, "Common ivy", dec!(10), 50).await;
        let checkout = CheckoutService::new(&pool);

        let input = PlaceOrderInput {
            items: vec![
                CartLine {
                    product_id: plenty,
                    quantity: 2,
                },
                CartLine {
                    product_id: scarce,
                    quantity: 3,
                },
            ],
            ..order_input(plenty, 1, dec!(0))
        };
        let err = checkout.place_order(&user, &input).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        assert!(OrderRepository::new(&pool).list_for_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        let checkout = CheckoutService::new(&pool);

        let mut input = order_input(product, 1, dec!(0));
        input.items.clear();
        let err = checkout.place_order(&user, &input).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_percentage_promo_ignores_delivery() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        make_promo(
            &pool,
            "TEN",
            PromoCodeInput {
                discount_type: Some(DiscountType::Percentage),
                discount_value: Some(dec!(10)),
                ..PromoCodeInput::default()
            },
        )
        .await;
        let checkout = CheckoutService::new(&pool);

        let mut input = order_input(product, 2, dec!(200));
        input.promo_code = Some("ten".to_owned());
        let order = checkout.place_order(&user, &input).await.unwrap();

        // Items 1000, delivery 200: 10% discounts the subtotal only.
        assert_eq!(order.discount, dec!(100));
        assert_eq!(order.total_amount, dec!(1100));
        assert_eq!(order.promo_code.as_deref(), Some("TEN"));

        let promo = PromoCodeRepository::new(&pool)
            .get_by_code("TEN")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promo.current_uses, 1);
    }

    #[tokio::test]
    async fn test_promo_single_use_per_user_at_creation() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        make_promo(
            &pool,
            "ONCE",
            PromoCodeInput {
                discount_type: Some(DiscountType::Fixed),
                discount_value: Some(dec!(50)),
                ..PromoCodeInput::default()
            },
        )
        .await;
        let checkout = CheckoutService::new(&pool);

        let mut input = order_input(product, 1, dec!(0));
        input.promo_code = Some("ONCE".to_owned());
        checkout.place_order(&user, &input).await.unwrap();

        let err = checkout.place_order(&user, &input).await.unwrap_err();
        assert!(matches!(err, CheckoutError::PromoAlreadyUsed));
    }

    #[tokio::test]
    async fn test_status_replay_never_double_decrements() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        let checkout = CheckoutService::new(&pool);

        let order = checkout
            .place_order(&user, &order_input(product, 2, dec!(0)))
            .await
            .unwrap();
        assert_eq!(stock_of(&pool, product).await, 10);

        let to_paid = AdminOrderUpdate {
            status: Some(OrderStatus::Paid),
            ..AdminOrderUpdate::default()
        };
        let updated = checkout.update_order(order.id, &to_paid).await.unwrap();
        assert!(updated.quantities_reduced);
        assert_eq!(stock_of(&pool, product).await, 8);

        // Replaying the same status is accepted but must not decrement again.
        checkout.update_order(order.id, &to_paid).await.unwrap();
        assert_eq!(stock_of(&pool, product).await, 8);

        // Moving between the two decrementing states must not re-trigger.
        checkout
            .update_order(
                order.id,
                &AdminOrderUpdate {
                    status: Some(OrderStatus::Processing),
                    ..AdminOrderUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(stock_of(&pool, product).await, 8);
    }

    #[tokio::test]
    async fn test_illegal_transitions_rejected() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        let checkout = CheckoutService::new(&pool);

        let order = checkout
            .place_order(&user, &order_input(product, 1, dec!(0)))
            .await
            .unwrap();

        let err = checkout
            .update_order(
                order.id,
                &AdminOrderUpdate {
                    status: Some(OrderStatus::Shipped),
                    ..AdminOrderUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::IllegalTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped
            }
        ));

        checkout
            .update_order(
                order.id,
                &AdminOrderUpdate {
                    status: Some(OrderStatus::Cancelled),
                    ..AdminOrderUpdate::default()
                },
            )
            .await
            .unwrap();

        // Cancelled is terminal.
        let err = checkout
            .update_order(
                order.id,
                &AdminOrderUpdate {
                    status: Some(OrderStatus::Processing),
                    ..AdminOrderUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn test_delete_restores_stock_and_promo_counter() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "rich@example.com", dec!(5000)).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        make_promo(
            &pool,
            "BACK",
            PromoCodeInput {
                discount_type: Some(DiscountType::Fixed),
                discount_value: Some(dec!(100)),
                ..PromoCodeInput::default()
            },
        )
        .await;
        let checkout = CheckoutService::new(&pool);

        let mut input = order_input(product, 3, dec!(0));
        input.payment_method = PaymentMethod::Balance;
        input.promo_code = Some("BACK".to_owned());
        let order = checkout.place_order(&user, &input).await.unwrap();
        assert_eq!(stock_of(&pool, product).await, 7);

        checkout.delete_order(order.id).await.unwrap();

        assert_eq!(stock_of(&pool, product).await, 10);
        let promo = PromoCodeRepository::new(&pool)
            .get_by_code("BACK")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promo.current_uses, 0);
        assert!(OrderRepository::new(&pool).get(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_without_decrement_leaves_stock() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        let checkout = CheckoutService::new(&pool);

        let order = checkout
            .place_order(&user, &order_input(product, 3, dec!(0)))
            .await
            .unwrap();
        checkout.delete_order(order.id).await.unwrap();
        assert_eq!(stock_of(&pool, product).await, 10);
    }

    #[tokio::test]
    async fn test_apply_promo_to_existing_order() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        make_promo(
            &pool,
            "LATER",
            PromoCodeInput {
                discount_type: Some(DiscountType::Percentage),
                discount_value: Some(dec!(20)),
                ..PromoCodeInput::default()
            },
        )
        .await;
        let checkout = CheckoutService::new(&pool);

        let order = checkout
            .place_order(&user, &order_input(product, 2, dec!(150)))
            .await
            .unwrap();
        assert_eq!(order.total_amount, dec!(1150));

        let updated = checkout.apply_promo(&user, order.id, "later").await.unwrap();
        assert_eq!(updated.discount, dec!(200));
        assert_eq!(updated.total_amount, dec!(950));

        // A second application is rejected.
        let err = checkout.apply_promo(&user, order.id, "later").await.unwrap_err();
        assert!(matches!(err, CheckoutError::PromoAlreadyApplied));
    }

    #[tokio::test]
    async fn test_apply_promo_rejects_reuse_by_same_user() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        make_promo(
            &pool,
            "SINGLE",
            PromoCodeInput {
                discount_type: Some(DiscountType::Fixed),
                discount_value: Some(dec!(50)),
                ..PromoCodeInput::default()
            },
        )
        .await;
        let checkout = CheckoutService::new(&pool);

        let mut first = order_input(product, 1, dec!(0));
        first.promo_code = Some("SINGLE".to_owned());
        checkout.place_order(&user, &first).await.unwrap();

        let second = checkout
            .place_order(&user, &order_input(product, 1, dec!(0)))
            .await
            .unwrap();
        let err = checkout
            .apply_promo(&user, second.id, "SINGLE")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::PromoAlreadyUsed));
    }

    #[tokio::test]
    async fn test_preview_promo_checks_reuse() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        make_promo(
            &pool,
            "PREVIEW",
            PromoCodeInput {
                discount_type: Some(DiscountType::Percentage),
                discount_value: Some(dec!(10)),
                min_order_amount: Some(Some(dec!(300))),
                ..PromoCodeInput::default()
            },
        )
        .await;
        let checkout = CheckoutService::new(&pool);

        let (_, discount) = checkout
            .preview_promo(&user, "preview", dec!(1000))
            .await
            .unwrap();
        assert_eq!(discount, dec!(100));

        let err = checkout
            .preview_promo(&user, "preview", dec!(200))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::PromoRejected(crate::models::PromoRejection::BelowMinimum)
        ));

        let mut input = order_input(product, 1, dec!(0));
        input.promo_code = Some("PREVIEW".to_owned());
        checkout.place_order(&user, &input).await.unwrap();

        let err = checkout
            .preview_promo(&user, "preview", dec!(1000))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::PromoAlreadyUsed));
    }

    #[tokio::test]
    async fn test_payment_proof_decrements_once() {
        let pool = memory_pool().await;
        let user = make_user(&pool, "a@example.com", Decimal::ZERO).await;
        let product = make_product(&pool, "Monstera", dec!(500), 10).await;
        let checkout = CheckoutService::new(&pool);

        let mut input = order_input(product, 2, dec!(0));
        input.payment_method = PaymentMethod::BankTransfer;
        let order = checkout.place_order(&user, &input).await.unwrap();
        assert_eq!(stock_of(&pool, product).await, 10);

        let updated = checkout
            .attach_payment_proof(&user, order.id, "/uploads/proof-1.jpg")
            .await
            .unwrap();
        assert!(updated.quantities_reduced);
        assert_eq!(updated.payment_status, PaymentStatus::PendingVerification);
        assert_eq!(stock_of(&pool, product).await, 8);

        // Re-uploading a proof must not decrement again.
        checkout
            .attach_payment_proof(&user, order.id, "/uploads/proof-2.jpg")
            .await
            .unwrap();
        assert_eq!(stock_of(&pool, product).await, 8);
    }
}
