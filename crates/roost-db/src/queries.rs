use crate::Database;
use crate::models::{
    ListingCardRow, ListingRecord, ListingRow, ReviewOwnerRow, ReviewRow, UserRow,
};
use anyhow::Result;
use rusqlite::Connection;

/// Pagination and sort parameters for the listing reads.
///
/// `page` and `limit` are clamped to a minimum of 1 before the offset is
/// computed, so a page/limit of 0 behaves like the first page rather than
/// producing a negative offset. `sort_by` takes the wire names
/// (`createdAt`, `price`, `title`); anything else falls back to `createdAt`.
#[derive(Debug, Clone)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
    pub sort_by: String,
    pub descending: bool,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 2,
            sort_by: "createdAt".into(),
            descending: true,
        }
    }
}

impl PageParams {
    fn limit(&self) -> u32 {
        self.limit.max(1)
    }

    /// Widened to i64 before multiplying: page and limit are caller
    /// controlled and their u32 product can overflow.
    fn offset(&self) -> i64 {
        let offset = u64::from(self.page.max(1) - 1) * u64::from(self.limit());
        i64::try_from(offset).unwrap_or(i64::MAX)
    }

    /// ORDER BY clause with a secondary key on the listing id so that
    /// consecutive pages stay disjoint when the primary sort key ties.
    fn order_clause(&self) -> String {
        let dir = if self.descending { "DESC" } else { "ASC" };
        format!("{} {}, l.id ASC", sort_column(&self.sort_by), dir)
    }
}

fn sort_column(sort_by: &str) -> &'static str {
    match sort_by {
        "price" => "l.price",
        "title" => "l.title",
        _ => "l.created_at",
    }
}

/// Lowercased `%...%` LIKE pattern with `%`, `_` and the escape character
/// itself escaped, so the query string is matched as a literal substring.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

const LISTING_CARD_SELECT: &str =
    "SELECT l.id, l.title, l.description, l.image, u.id, u.username
     FROM listings l
     JOIN users u ON l.owner_id = u.id";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        full_name: &str,
        image: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, full_name, image, password)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, username, email, full_name, image, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", &[&id]))
    }

    /// Login lookup: matches on username OR email, either may be absent.
    pub fn get_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1 OR email = ?2", &[&username, &email]))
    }

    /// Overwrites the stored refresh token; `None` clears it (logout).
    pub fn set_refresh_token(&self, id: &str, token: Option<&str>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET refresh_token = ?2, updated_at = datetime('now') WHERE id = ?1",
                rusqlite::params![id, token],
            )?;
            Ok(())
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET password = ?2, updated_at = datetime('now') WHERE id = ?1",
                rusqlite::params![id, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn update_account(&self, id: &str, full_name: &str, email: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET full_name = ?2, email = ?3, updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, full_name, email],
            )?;
            Ok(())
        })
    }

    pub fn update_user_image(&self, id: &str, image: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET image = ?2, updated_at = datetime('now') WHERE id = ?1",
                rusqlite::params![id, image],
            )?;
            Ok(())
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Listings --

    pub fn insert_listing(&self, id: &str, owner_id: &str, record: &ListingRecord) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO listings
                     (id, title, description, image, price, location, country, lon, lat, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    id,
                    record.title,
                    record.description,
                    record.image,
                    record.price,
                    record.location,
                    record.country,
                    record.lon,
                    record.lat,
                    owner_id,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, image, price, location, country,
                        lon, lat, owner_id, created_at, updated_at
                 FROM listings WHERE id = ?1",
            )?;
            stmt.query_row([id], map_listing_row).optional()
        })
    }

    pub fn update_listing(&self, id: &str, record: &ListingRecord) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute(
                "UPDATE listings
                 SET title = ?2, description = ?3, image = ?4, price = ?5,
                     location = ?6, country = ?7, lon = ?8, lat = ?9,
                     updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    record.title,
                    record.description,
                    record.image,
                    record.price,
                    record.location,
                    record.country,
                    record.lon,
                    record.lat,
                ],
            )?;
            Ok(affected > 0)
        })
    }

    pub fn delete_listing(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute("DELETE FROM listings WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }

    /// Paginated listing cards joined with the owner projection.
    pub fn list_page(&self, params: &PageParams) -> Result<Vec<ListingCardRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} ORDER BY {} LIMIT ?1 OFFSET ?2",
                LISTING_CARD_SELECT,
                params.order_clause()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![params.limit(), params.offset()],
                    map_listing_card,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Same page contract as `list_page`, additionally filtering on a
    /// case-insensitive substring of title or description. An empty query
    /// matches every listing.
    pub fn search_page(&self, query: &str, params: &PageParams) -> Result<Vec<ListingCardRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE lower(l.title) LIKE ?1 ESCAPE '\\'
                     OR lower(coalesce(l.description, '')) LIKE ?1 ESCAPE '\\'
                 ORDER BY {} LIMIT ?2 OFFSET ?3",
                LISTING_CARD_SELECT,
                params.order_clause()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![like_pattern(query), params.limit(), params.offset()],
                    map_listing_card,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reviews --

    pub fn insert_review(
        &self,
        id: &str,
        listing_id: &str,
        owner_id: &str,
        content: &str,
        rating: Option<i64>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reviews (id, rating, content, owner_id, listing_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, rating, content, owner_id, listing_id],
            )?;
            Ok(())
        })
    }

    pub fn get_review(&self, id: &str) -> Result<Option<ReviewRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, rating, content, owner_id, listing_id, created_at, updated_at
                 FROM reviews WHERE id = ?1",
            )?;
            stmt.query_row([id], |row| {
                Ok(ReviewRow {
                    id: row.get(0)?,
                    rating: row.get(1)?,
                    content: row.get(2)?,
                    owner_id: row.get(3)?,
                    listing_id: row.get(4)?,
                    created_at: row.get(5)?,
                    updated_at: row.get(6)?,
                })
            })
            .optional()
        })
    }

    /// Partial update: absent fields keep their stored value.
    pub fn update_review(
        &self,
        id: &str,
        content: Option<&str>,
        rating: Option<i64>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute(
                "UPDATE reviews
                 SET content = coalesce(?2, content),
                     rating = coalesce(?3, rating),
                     updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, content, rating],
            )?;
            Ok(affected > 0)
        })
    }

    pub fn delete_review(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute("DELETE FROM reviews WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }

    /// Reviews of one listing, oldest first, joined with the owner's
    /// {id, username, full_name} projection.
    pub fn reviews_for_listing(
        &self,
        listing_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ReviewOwnerRow>> {
        let limit = limit.max(1);
        let offset = i64::try_from(u64::from(page.max(1) - 1) * u64::from(limit))
            .unwrap_or(i64::MAX);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.rating, r.content, r.created_at, u.id, u.username, u.full_name
                 FROM reviews r
                 JOIN users u ON r.owner_id = u.id
                 WHERE r.listing_id = ?1
                 ORDER BY r.created_at ASC, r.id ASC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![listing_id, limit, offset], |row| {
                    Ok(ReviewOwnerRow {
                        id: row.get(0)?,
                        rating: row.get(1)?,
                        content: row.get(2)?,
                        created_at: row.get(3)?,
                        owner_id: row.get(4)?,
                        owner_username: row.get(5)?,
                        owner_full_name: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(
    conn: &Connection,
    where_clause: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, email, full_name, image, password, refresh_token,
                created_at, updated_at
         FROM users WHERE {}",
        where_clause
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row(params, |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            full_name: row.get(3)?,
            image: row.get(4)?,
            password: row.get(5)?,
            refresh_token: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    })
    .optional()
}

fn map_listing_row(row: &rusqlite::Row) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image: row.get(3)?,
        price: row.get(4)?,
        location: row.get(5)?,
        country: row.get(6)?,
        lon: row.get(7)?,
        lat: row.get(8)?,
        owner_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn map_listing_card(row: &rusqlite::Row) -> rusqlite::Result<ListingCardRow> {
    Ok(ListingCardRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image: row.get(3)?,
        owner_id: row.get(4)?,
        owner_username: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
