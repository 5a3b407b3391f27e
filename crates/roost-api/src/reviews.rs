use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use roost_db::models::{ReviewOwnerRow, ReviewRow};
use roost_types::api::{CreateReviewRequest, OwnerRef, ReviewResponse, ReviewWithOwner, UpdateReviewRequest};

use crate::extract::{Json, Query};
use crate::listings::parse_uuid;
use crate::tokens::CurrentUser;
use crate::{AppState, error::ApiError, parse_timestamp, response::ApiResponse};

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(listing_id): Path<String>,
    Query(query): Query<ReviewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_review_target(&listing_id)?;

    let db = state.clone();
    let (page, limit) = (query.page, query.limit);
    let rows = tokio::task::spawn_blocking(move || {
        db.db.reviews_for_listing(&id.to_string(), page, limit)
    })
    .await
    .map_err(|e| anyhow!("spawn_blocking join error: {}", e))??;

    let reviews: Vec<ReviewWithOwner> = rows.into_iter().map(review_with_owner).collect();
    Ok(ApiResponse::ok(reviews, "reviews retrieved successfully"))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(listing_id): Path<String>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = parse_review_target(&listing_id)?;

    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content is required".into()));
    }
    validate_rating(req.rating)?;

    let review_id = Uuid::new_v4();
    state.db.insert_review(
        &review_id.to_string(),
        &listing.to_string(),
        &user.id.to_string(),
        &req.content,
        req.rating,
    )?;

    let row = state
        .db
        .get_review(&review_id.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow!("review not created")))?;

    Ok(ApiResponse::ok(
        review_response(&row),
        "review created successfully",
    ))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(review_id): Path<String>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id: Uuid = review_id
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid review id".into()))?;

    validate_rating(req.rating)?;

    let existing = state
        .db
        .get_review(&id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;
    require_owner(&existing, &user)?;

    state
        .db
        .update_review(&id.to_string(), req.content.as_deref(), req.rating)?;

    let row = state
        .db
        .get_review(&id.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow!("review not updated")))?;

    Ok(ApiResponse::ok(
        review_response(&row),
        "review updated successfully",
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(review_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: Uuid = review_id
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid review id".into()))?;

    let existing = state
        .db
        .get_review(&id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;
    require_owner(&existing, &user)?;

    state.db.delete_review(&id.to_string())?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "review deleted successfully",
    ))
}

// -- helpers --

fn parse_review_target(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("invalid listing id".into()))
}

/// Rating, when present, must lie in [1, 5].
fn validate_rating(rating: Option<i64>) -> Result<(), ApiError> {
    match rating {
        Some(r) if !(1..=5).contains(&r) => Err(ApiError::BadRequest(
            "rating must be between 1 and 5".into(),
        )),
        _ => Ok(()),
    }
}

fn require_owner(review: &ReviewRow, user: &CurrentUser) -> Result<(), ApiError> {
    if review.owner_id != user.id.to_string() {
        return Err(ApiError::Unauthorized(
            "Only the owner can modify this review".into(),
        ));
    }
    Ok(())
}

fn review_response(row: &ReviewRow) -> ReviewResponse {
    ReviewResponse {
        id: parse_uuid(&row.id, "review"),
        content: row.content.clone(),
        rating: row.rating,
        listing: parse_uuid(&row.listing_id, "listing"),
        owner: parse_uuid(&row.owner_id, "owner"),
        created_at: parse_timestamp(&row.created_at),
    }
}

fn review_with_owner(row: ReviewOwnerRow) -> ReviewWithOwner {
    ReviewWithOwner {
        id: parse_uuid(&row.id, "review"),
        content: row.content,
        rating: row.rating,
        created_at: parse_timestamp(&row.created_at),
        owner: OwnerRef {
            id: parse_uuid(&row.owner_id, "owner"),
            username: row.owner_username,
            full_name: Some(row.owner_full_name),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(Some(0)).is_err());
        assert!(validate_rating(Some(6)).is_err());
        assert!(validate_rating(Some(1)).is_ok());
        assert!(validate_rating(Some(5)).is_ok());
        assert!(validate_rating(None).is_ok());
    }
}
