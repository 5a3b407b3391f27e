//! Database row types mapping directly to SQLite rows, kept separate from
//! the wire-level API models.

#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub image: String,
    pub password: String,
    pub refresh_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ListingRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image: String,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub lon: f64,
    pub lat: f64,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Field set for creating or fully replacing a listing record.
pub struct ListingRecord<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub image: &'a str,
    pub price: Option<f64>,
    pub location: Option<&'a str>,
    pub country: Option<&'a str>,
    pub lon: f64,
    pub lat: f64,
}

/// Projected row for the paginated listing reads: card fields plus the
/// owner's id and username, nothing else.
pub struct ListingCardRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image: String,
    pub owner_id: String,
    pub owner_username: String,
}

pub struct ReviewRow {
    pub id: String,
    pub rating: Option<i64>,
    pub content: String,
    pub owner_id: String,
    pub listing_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Review joined with its owner's {id, username, full_name} projection.
pub struct ReviewOwnerRow {
    pub id: String,
    pub rating: Option<i64>,
    pub content: String,
    pub created_at: String,
    pub owner_id: String,
    pub owner_username: String,
    pub owner_full_name: String,
}
