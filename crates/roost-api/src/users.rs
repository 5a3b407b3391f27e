use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use roost_db::models::UserRow;
use roost_types::api::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest, TokenPairResponse,
    UpdateAccountRequest, UserPublic,
};

use crate::extract::Json;
use crate::tokens::{ACCESS_COOKIE, CurrentUser, REFRESH_COOKIE, TokenPair};
use crate::{AppState, error::ApiError, parse_timestamp, response::ApiResponse, storage};

pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = read_register_form(&state, &mut multipart).await?;

    let (Some(full_name), Some(email), Some(username), Some(password)) = (
        form.full_name.take(),
        form.email.take(),
        form.username.take(),
        form.password.take(),
    ) else {
        discard_spooled(form.image_path).await;
        return Err(ApiError::BadRequest("All fields are required".into()));
    };
    if [&full_name, &email, &username, &password]
        .iter()
        .any(|f| f.trim().is_empty())
    {
        discard_spooled(form.image_path).await;
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    // Usernames are stored lowercased; the existence check sees the same
    // casing the insert will use.
    let username = username.to_lowercase();
    match state.db.get_user_by_login(Some(&username), Some(&email)) {
        Ok(None) => {}
        Ok(Some(_)) => {
            discard_spooled(form.image_path).await;
            return Err(ApiError::Conflict("User already exists".into()));
        }
        Err(e) => {
            discard_spooled(form.image_path).await;
            return Err(e.into());
        }
    }

    let image_path = form
        .image_path
        .ok_or_else(|| ApiError::BadRequest("image is required".into()))?;
    let image = state.storage.upload(&image_path).await.map_err(|e| {
        warn!("Image upload failed: {:#}", e);
        ApiError::BadRequest("Upload failed".into())
    })?;

    let password_hash = hash_password(&password)?;
    let user_id = Uuid::new_v4();
    state.db.create_user(
        &user_id.to_string(),
        &username,
        &email,
        &full_name,
        &image.url,
        &password_hash,
    )?;

    let user = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow!("User not created")))?;

    Ok(ApiResponse::created(
        user_public(&user)?,
        "User created successfully",
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_none() && req.email.is_none() {
        return Err(ApiError::BadRequest("Username or email is required".into()));
    }

    let user = state
        .db
        .get_user_by_login(req.username.as_deref(), req.email.as_deref())?
        .ok_or_else(|| ApiError::BadRequest("User not found".into()))?;

    verify_password(&user.password, &req.password, "Invalid password")?;

    let pair = state.tokens.issue_pair(&state.db, &user)?;
    let response = LoginResponse {
        user: user_public(&user)?,
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
    };

    Ok((
        set_auth_cookies(jar, &pair),
        ApiResponse::ok(response, "Login successful"),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    state.tokens.revoke(&state.db, &user.id)?;

    Ok((
        clear_auth_cookies(jar),
        ApiResponse::ok(json!({}), "Logout successful"),
    ))
}

pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body.and_then(|Json(req)| req.refresh_token))
        .ok_or_else(|| ApiError::Unauthorized("Refresh token is required".into()))?;

    let (_user, pair) = state.tokens.rotate(&state.db, &presented)?;
    let response = TokenPairResponse {
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
    };

    Ok((
        set_auth_cookies(jar, &pair),
        ApiResponse::ok(response, "Token refreshed successfully"),
    ))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_user_by_id(&user.id.to_string())?
        .ok_or_else(|| ApiError::Unauthorized("Invalid access token".into()))?;

    verify_password(&row.password, &req.old_password, "Invalid old password")?;

    let new_hash = hash_password(&req.new_password)?;
    state.db.update_password(&row.id, &new_hash)?;

    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

pub async fn current_user(user: CurrentUser) -> Result<impl IntoResponse, ApiError> {
    Ok(ApiResponse::ok(user.public(), "User found successfully"))
}

pub async fn update_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.full_name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    state
        .db
        .update_account(&user.id.to_string(), &req.full_name, &req.email)?;

    let row = state
        .db
        .get_user_by_id(&user.id.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow!("Account update lost the user row")))?;

    Ok(ApiResponse::ok(
        user_public(&row)?,
        "Account details updated successfully",
    ))
}

pub async fn delete_account(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    // The external profile image goes first; a failed delete is logged and
    // does not block account deletion.
    let public_id = storage::extract_public_id(&user.image);
    if let Err(e) = state.storage.delete(public_id).await {
        warn!("Failed to delete profile image {}: {:#}", public_id, e);
    }

    state.db.delete_user(&user.id.to_string())?;

    Ok((
        clear_auth_cookies(jar),
        ApiResponse::ok(json!({}), "User deleted successfully"),
    ))
}

pub async fn update_image(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut image_path = None;
    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("image") {
            image_path = Some(
                storage::spool_upload(&state.upload_dir, field)
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("invalid image upload: {:#}", e)))?,
            );
        }
    }
    let image_path = image_path.ok_or_else(|| ApiError::BadRequest("Image is required".into()))?;

    let old_public_id = storage::extract_public_id(&user.image);
    if let Err(e) = state.storage.delete(old_public_id).await {
        warn!("Failed to delete old profile image {}: {:#}", old_public_id, e);
    }

    let image = state.storage.upload(&image_path).await.map_err(|e| {
        warn!("Image upload failed: {:#}", e);
        ApiError::BadRequest("Error while uploading image".into())
    })?;

    state.db.update_user_image(&user.id.to_string(), &image.url)?;
    let row = state
        .db
        .get_user_by_id(&user.id.to_string())?
        .ok_or_else(|| ApiError::Internal(anyhow!("Image update lost the user row")))?;

    Ok(ApiResponse::ok(user_public(&row)?, "Image updated successfully"))
}

// -- helpers --

/// Multipart fields of the registration request.
#[derive(Default)]
struct RegisterForm {
    full_name: Option<String>,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    image_path: Option<std::path::PathBuf>,
}

/// Reads the registration form; a parse failure after the image field has
/// spooled must not strand the spool file.
async fn read_register_form(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<RegisterForm, ApiError> {
    let mut form = RegisterForm::default();
    if let Err(e) = fill_register_form(state, multipart, &mut form).await {
        discard_spooled(form.image_path.take()).await;
        return Err(e);
    }
    Ok(form)
}

async fn fill_register_form(
    state: &AppState,
    multipart: &mut Multipart,
    form: &mut RegisterForm,
) -> Result<(), ApiError> {
    while let Some(field) = next_field(multipart).await? {
        match field.name().unwrap_or_default() {
            "fullName" => form.full_name = Some(text(field).await?),
            "email" => form.email = Some(text(field).await?),
            "username" => form.username = Some(text(field).await?),
            "password" => form.password = Some(text(field).await?),
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

async fn discard_spooled(path: Option<std::path::PathBuf>) {
    if let Some(path) = path {
        storage::discard_spool(&path).await;
    }
}

pub(crate) async fn next_field<'a>(
    multipart: &'a mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'a>>, ApiError> {
    multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))
}

pub(crate) async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    storage::field_text(field)
        .await
        .map_err(|e| ApiError::BadRequest(format!("{:#}", e)))
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?
        .to_string())
}

fn verify_password(stored_hash: &str, password: &str, mismatch: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow!("Corrupt password hash: {}", e))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::BadRequest(mismatch.into()))
}

/// User view with password hash and refresh token excluded.
pub(crate) fn user_public(row: &UserRow) -> Result<UserPublic, ApiError> {
    Ok(UserPublic {
        id: row
            .id
            .parse()
            .map_err(|e| anyhow!("corrupt user id '{}': {}", row.id, e))?,
        username: row.username.clone(),
        email: row.email.clone(),
        full_name: row.full_name.clone(),
        image: row.image.clone(),
        created_at: parse_timestamp(&row.created_at),
    })
}

fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_path("/");
    cookie
}

fn set_auth_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(auth_cookie(ACCESS_COOKIE, pair.access_token.clone()))
        .add(auth_cookie(REFRESH_COOKIE, pair.refresh_token.clone()))
}

fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    let removal = |name: &'static str| {
        let mut cookie = Cookie::new(name, "");
        cookie.set_path("/");
        cookie
    };
    jar.remove(removal(ACCESS_COOKIE)).remove(removal(REFRESH_COOKIE))
}
