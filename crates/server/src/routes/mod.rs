//! HTTP route composition.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (verifies database)
//!
//! # Auth
//! POST /api/auth/register           - Create account + session
//! POST /api/auth/login              - Login
//! POST /api/auth/logout             - Logout
//! GET  /api/auth/me                 - Current user
//! POST /api/auth/change-password    - Change password
//!
//! # Catalog
//! GET  /api/products                - List with filters
//! GET  /api/products/{id}           - Product detail
//! POST /api/products                - Create (admin)
//! PUT  /api/products/{id}           - Update (admin)
//! DELETE /api/products/{id}         - Delete (admin)
//!
//! # Orders
//! POST /api/orders                  - Place order
//! GET  /api/orders                  - All orders (admin)
//! GET  /api/orders/mine             - Own orders
//! GET  /api/orders/{id}             - Order detail (owner or admin)
//! PUT  /api/orders/{id}             - Update status/comment/tracking (admin)
//! PUT  /api/orders/{id}/status      - Status-only transition (admin)
//! DELETE /api/orders/{id}           - Delete + reverse side effects (admin)
//! POST /api/orders/{id}/apply-promo - Attach promo to existing order
//! POST /api/orders/{id}/payment-proof - Upload payment proof (owner)
//! POST /api/orders/{id}/receipt     - Generate PDF receipt (admin)
//!
//! # Promo codes
//! POST /api/promo-codes/validate    - Discount preview
//! GET/POST /api/promo-codes         - List/create (admin)
//! GET/PUT/DELETE /api/promo-codes/{id} - CRUD (admin)
//!
//! # Users
//! GET/POST... /api/users            - Admin CRUD
//! POST /api/users/{id}/balance      - Balance top-up (admin)
//!
//! # Reviews
//! GET  /api/reviews?productId=      - Approved reviews
//! GET  /api/reviews/all             - Moderation queue (admin)
//! POST /api/reviews                 - Submit review
//! PUT  /api/reviews/{id}/approve    - Approve (admin)
//! DELETE /api/reviews/{id}          - Delete (admin)
//!
//! # Configuration
//! GET/PUT /api/payment-details      - Checkout payment instructions
//! GET/PUT /api/settings             - Site settings
//!
//! # Notifications
//! GET  /api/notifications           - Own notifications
//! PUT  /api/notifications/{id}/read - Mark read
//!
//! # Exports
//! GET  /api/export/{users,products,orders,statistics} - CSV (admin)
//!
//! # Uploads
//! POST /api/uploads                 - Product image upload (admin)
//! ```

pub mod api;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))
        .route("/logout", post(api::auth::logout))
        .route("/me", get(api::auth::me))
        .route("/change-password", post(api::auth::change_password))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::products::list).post(api::products::create))
        .route(
            "/{id}",
            get(api::products::get)
                .put(api::products::update)
                .delete(api::products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(api::orders::create).get(api::orders::list_all))
        .route("/mine", get(api::orders::list_mine))
        .route(
            "/{id}",
            get(api::orders::get)
                .put(api::orders::update)
                .delete(api::orders::delete),
        )
        .route("/{id}/status", put(api::orders::update_status))
        .route("/{id}/apply-promo", post(api::orders::apply_promo))
        .route("/{id}/payment-proof", post(api::orders::upload_payment_proof))
        .route("/{id}/receipt", post(api::orders::generate_receipt))
}

/// Create the promo code routes router.
pub fn promo_code_routes() -> Router<AppState> {
    Router::new()
        .route("/validate", post(api::promo_codes::validate))
        .route(
            "/",
            get(api::promo_codes::list).post(api::promo_codes::create),
        )
        .route(
            "/{id}",
            get(api::promo_codes::get)
                .put(api::promo_codes::update)
                .delete(api::promo_codes::delete),
        )
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::users::list))
        .route(
            "/{id}",
            get(api::users::get)
                .put(api::users::update)
                .delete(api::users::delete),
        )
        .route("/{id}/balance", post(api::users::top_up_balance))
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::reviews::list).post(api::reviews::create))
        .route("/all", get(api::reviews::list_all))
        .route("/{id}/approve", put(api::reviews::approve))
        .route("/{id}", axum::routing::delete(api::reviews::delete))
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::notifications::list))
        .route("/{id}/read", put(api::notifications::mark_read))
}

/// Create the CSV export routes router.
pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(api::export::users))
        .route("/products", get(api::export::products))
        .route("/orders", get(api::export::orders))
        .route("/statistics", get(api::export::statistics))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/promo-codes", promo_code_routes())
        .nest("/users", user_routes())
        .nest("/reviews", review_routes())
        .nest("/notifications", notification_routes())
        .nest("/export", export_routes())
        .route(
            "/payment-details",
            get(api::settings::get_payment_details).put(api::settings::update_payment_details),
        )
        .route(
            "/settings",
            get(api::settings::get_settings).put(api::settings::update_settings),
        )
        .route("/uploads", post(api::uploads::upload));

    Router::new().nest("/api", api)
}
