use anyhow::anyhow;
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use roost_db::PageParams;
use roost_db::models::{ListingCardRow, ListingRecord, ListingRow};
use roost_types::api::{ListingCard, ListingResponse, OwnerRef};
use roost_types::models::Geometry;

use crate::extract::Query;
use crate::tokens::CurrentUser;
use crate::users::{next_field, text};
use crate::{AppState, error::ApiError, parse_timestamp, response::ApiResponse, storage};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_type")]
    pub sort_type: i32,
    #[serde(default)]
    pub query: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    2
}

fn default_sort_by() -> String {
    "createdAt".into()
}

fn default_sort_type() -> i32 {
    -1
}

impl ListingQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
            sort_by: self.sort_by.clone(),
            descending: self.sort_type <= 0,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query.page_params();

    // Run the blocking read off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_page(&params))
        .await
        .map_err(|e| anyhow!("spawn_blocking join error: {}", e))?
        .map_err(store_unavailable)?;

    let cards: Vec<ListingCard> = rows.into_iter().map(card_from_row).collect();
    Ok(ApiResponse::ok(cards, "listings found"))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query.page_params();
    let needle = query.query.clone().unwrap_or_default();

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.search_page(&needle, &params))
        .await
        .map_err(|e| anyhow!("spawn_blocking join error: {}", e))?
        .map_err(store_unavailable)?;

    let cards: Vec<ListingCard> = rows.into_iter().map(card_from_row).collect();
    Ok(ApiResponse::ok(cards, "searched listings found"))
}

/// Multipart fields of a listing create/update request.
#[derive(Default)]
struct ListingForm {
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    price: Option<f64>,
    country: Option<String>,
    image_path: Option<std::path::PathBuf>,
}

/// Reads the listing form; a parse failure after the image field has
/// spooled must not strand the spool file.
async fn read_listing_form(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<ListingForm, ApiError> {
    let mut form = ListingForm::default();
    if let Err(e) = fill_listing_form(state, multipart, &mut form).await {
        if let Some(path) = form.image_path.take() {
            storage::discard_spool(&path).await;
        }
        return Err(e);
    }
    Ok(form)
}

async fn fill_listing_form(
    state: &AppState,
    multipart: &mut Multipart,
    form: &mut ListingForm,
) -> Result<(), ApiError> {
    while let Some(field) = next_field(multipart).await? {
        match field.name().unwrap_or_default() {
            "title" => form.title = Some(text(field).await?),
            "description" => form.description = Some(text(field).await?),
            "location" => form.location = Some(text(field).await?),
            "country" => form.country = Some(text(field).await?),
            "price" => {
                let raw = text(field).await?;
                form.price = Some(
                    raw.parse()
                        .map_err(|_| ApiError::BadRequest(format!("invalid price '{}'", raw)))?,
                );
            }
            "image" => {
                form.image_path = Some(
                    storage::spool_upload(&state.upload_dir, field)
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("invalid image upload: {:#}", e)))?,
                )
            }
            _ => {}
        }
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = read_listing_form(&state, &mut multipart).await?;

    let (title, location) = match checked_listing_fields(&mut form) {
        Ok(fields) => fields,
        Err(e) => {
            if let Some(path) = form.image_path.take() {
                storage::discard_spool(&path).await;
            }
            return Err(e);
        }
    };
    let image_path = form
        .image_path
        .take()
        .ok_or_else(|| ApiError::BadRequest("image required".into()))?;

    let geometry = match state.geocoder.forward(&location).await {
        Ok(geometry) => geometry,
        Err(e) => {
            warn!("Geocoding '{}' failed: {:#}", location, e);
            storage::discard_spool(&image_path).await;
            return Err(ApiError::BadRequest("could not geocode location".into()));
        }
    };
    let (lon, lat) = geometry.coordinates();

    let image = state.storage.upload(&image_path).await.map_err(|e| {
        warn!("Image upload failed: {:#}", e);
        ApiError::BadRequest("Upload failed".into())
    })?;

    let listing_id = Uuid::new_v4();
    let inserted = state.db.insert_listing(
        &listing_id.to_string(),
        &user.id.to_string(),
        &ListingRecord {
            title: &title,
            description: form.description.as_deref(),
            image: &image.url,
            price: form.price,
            location: Some(&location),
            country: form.country.as_deref(),
            lon,
            lat,
        },
    );

    // Upload-then-persist is not transactional; compensate by deleting the
    // just-uploaded object when the insert fails.
    if let Err(e) = inserted {
        if let Err(del) = state.storage.delete(&image.public_id).await {
            warn!("Orphaned object {} left behind: {:#}", image.public_id, del);
        }
        return Err(ApiError::Internal(e));
    }

    let row = state
        .db
        .get_listing(&listing_id.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow!("listing not created")))?;

    Ok(ApiResponse::created(
        listing_response(&row),
        "listing created successfully",
    ))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(listing_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_listing_id(&listing_id)?;

    let row = state
        .db
        .get_listing(&id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Listing not found".into()))?;

    Ok(ApiResponse::ok(listing_response(&row), "Listing found"))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(listing_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_listing_id(&listing_id)?;

    let existing = state
        .db
        .get_listing(&id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Listing not found".into()))?;
    require_owner(&existing, &user)?;

    let mut form = read_listing_form(&state, &mut multipart).await?;
    let (title, location) = match checked_listing_fields(&mut form) {
        Ok(fields) => fields,
        Err(e) => {
            if let Some(path) = form.image_path.take() {
                storage::discard_spool(&path).await;
            }
            return Err(e);
        }
    };
    let image_path = form
        .image_path
        .take()
        .ok_or_else(|| ApiError::BadRequest("image required".into()))?;

    let geometry = match state.geocoder.forward(&location).await {
        Ok(geometry) => geometry,
        Err(e) => {
            warn!("Geocoding '{}' failed: {:#}", location, e);
            storage::discard_spool(&image_path).await;
            return Err(ApiError::BadRequest("could not geocode location".into()));
        }
    };
    let (lon, lat) = geometry.coordinates();

    // Replace the stored image: the old object goes, the new one comes in.
    let old_public_id = storage::extract_public_id(&existing.image);
    if let Err(e) = state.storage.delete(old_public_id).await {
        warn!("Failed to delete old listing image {}: {:#}", old_public_id, e);
    }
    let image = state.storage.upload(&image_path).await.map_err(|e| {
        warn!("Image upload failed: {:#}", e);
        ApiError::BadRequest("Error while uploading image".into())
    })?;

    let updated = state.db.update_listing(
        &id.to_string(),
        &ListingRecord {
            title: &title,
            description: form.description.as_deref(),
            image: &image.url,
            price: form.price,
            location: Some(&location),
            country: form.country.as_deref(),
            lon,
            lat,
        },
    )?;
    if !updated {
        return Err(ApiError::Internal(anyhow!("listing not updated")));
    }

    let row = state
        .db
        .get_listing(&id.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow!("listing not updated")))?;

    Ok(ApiResponse::ok(
        listing_response(&row),
        "listing updated successfully",
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(listing_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_listing_id(&listing_id)?;

    // 404 before any external-storage call.
    let existing = state
        .db
        .get_listing(&id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Listing not found".into()))?;
    require_owner(&existing, &user)?;

    let public_id = storage::extract_public_id(&existing.image);
    if let Err(e) = state.storage.delete(public_id).await {
        warn!("Failed to delete listing image {}: {:#}", public_id, e);
    }

    state.db.delete_listing(&id.to_string())?;

    Ok(ApiResponse::ok(json!({}), "listing deleted successfully"))
}

// -- helpers --

/// Required text fields of a create/update form; the caller discards any
/// spooled image when this fails.
fn checked_listing_fields(form: &mut ListingForm) -> Result<(String, String), ApiError> {
    let title = form
        .title
        .take()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("title is required".into()))?;
    let location = form
        .location
        .take()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("location is required".into()))?;
    Ok((title, location))
}

fn parse_listing_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("invalid listing id".into()))
}

fn require_owner(listing: &ListingRow, user: &CurrentUser) -> Result<(), ApiError> {
    if listing.owner_id != user.id.to_string() {
        return Err(ApiError::Unauthorized(
            "Only the owner can modify this listing".into(),
        ));
    }
    Ok(())
}

fn store_unavailable(e: anyhow::Error) -> ApiError {
    error!("Listing store query failed: {:#}", e);
    ApiError::ServiceUnavailable("listing store unavailable".into())
}

fn card_from_row(row: ListingCardRow) -> ListingCard {
    ListingCard {
        id: parse_uuid(&row.id, "listing"),
        title: row.title,
        description: row.description,
        image: row.image,
        owner: OwnerRef {
            id: parse_uuid(&row.owner_id, "owner"),
            username: row.owner_username,
            full_name: None,
        },
    }
}

fn listing_response(row: &ListingRow) -> ListingResponse {
    ListingResponse {
        id: parse_uuid(&row.id, "listing"),
        title: row.title.clone(),
        description: row.description.clone(),
        image: row.image.clone(),
        price: row.price,
        location: row.location.clone(),
        country: row.country.clone(),
        geometry: Geometry::point(row.lon, row.lat),
        owner: parse_uuid(&row.owner_id, "owner"),
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}
