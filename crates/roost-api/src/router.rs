use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::{AppState, listings, reviews, users};

/// The full route table. Protected handlers authenticate through the
/// `CurrentUser` extractor; everything else is public.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/refresh", post(users::refresh))
        .route("/users/change-password", patch(users::change_password))
        .route("/users/current-user", get(users::current_user))
        .route("/users/update-account", patch(users::update_account))
        .route("/users/delete-account", delete(users::delete_account))
        .route("/users/image", patch(users::update_image))
        .route("/listings", get(listings::list).post(listings::create))
        .route("/listings/search", get(listings::search))
        .route(
            "/listings/{listing_id}",
            get(listings::get_by_id)
                .patch(listings::update)
                .delete(listings::remove),
        )
        .route(
            "/reviews/{listing_id}",
            get(reviews::list).post(reviews::create),
        )
        .route(
            "/reviews/c/{review_id}",
            patch(reviews::update).delete(reviews::remove),
        )
        .with_state(state)
}
