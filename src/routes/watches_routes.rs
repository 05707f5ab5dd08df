use axum::{Router, routing::{delete, get}};
use crate::{AppState, controllers::watches_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/users/:owner/watches",
            get(watches_controller::get_watches).post(watches_controller::post_create_watch),
        )
        .route("/users/:owner/watches/:id", delete(watches_controller::delete_watch))
        .route("/stats", get(watches_controller::get_stats))
        .route("/prices/:symbol", get(watches_controller::get_prices))
}
