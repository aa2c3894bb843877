use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers::{auth, catalog, expenses, rates, stats, users, vehicles};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/auth/login", post(auth::login));

    // Any signed-in user
    let operator_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/rate", get(rates::current_rate))
        .route("/rate/refresh", post(rates::refresh_rate))
        .route("/pricing/quote", post(rates::quote))
        .route("/catalog", get(catalog::get_catalog))
        .route("/categories", get(catalog::list_categories))
        .route("/vehicle-types", get(catalog::list_vehicle_types))
        .route("/services", get(catalog::list_services))
        .route("/extras", get(catalog::list_extras))
        .route("/payment-methods", get(catalog::list_payment_methods))
        .route(
            "/vehicles",
            get(vehicles::list_vehicles).post(vehicles::create_vehicle),
        )
        .route("/vehicles/lookup/{plate}", get(vehicles::lookup_plate))
        .route(
            "/vehicles/{id}",
            get(vehicles::get_vehicle)
                .put(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        .route("/vehicles/{id}/status", patch(vehicles::update_status))
        .route(
            "/expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route("/expenses/balance", get(expenses::get_balance))
        .route(
            "/expenses/{id}",
            put(expenses::update_expense).delete(expenses::delete_expense),
        )
        .route("/stats", get(stats::get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Catalog and account administration, under /api/admin
    let admin_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/categories", post(catalog::create_category))
        .route(
            "/categories/{id}",
            put(catalog::update_category).delete(catalog::delete_category),
        )
        .route("/vehicle-types", post(catalog::create_vehicle_type))
        .route(
            "/vehicle-types/{id}",
            put(catalog::update_vehicle_type).delete(catalog::delete_vehicle_type),
        )
        .route("/services", post(catalog::create_service))
        .route(
            "/services/{id}",
            put(catalog::update_service).delete(catalog::delete_service),
        )
        .route("/extras", post(catalog::create_extra))
        .route(
            "/extras/{id}",
            put(catalog::update_extra).delete(catalog::delete_extra),
        )
        .route("/payment-methods", post(catalog::create_payment_method))
        .route(
            "/payment-methods/{id}",
            put(catalog::update_payment_method).delete(catalog::delete_payment_method),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", public_routes.merge(operator_routes))
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
