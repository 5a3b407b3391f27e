use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            full_name       TEXT NOT NULL,
            image           TEXT NOT NULL,
            password        TEXT NOT NULL,
            refresh_token   TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- owner_id is a weak reference on purpose: listings outlive their
        -- owner's account and reviews outlive their listing, so neither
        -- column carries a foreign-key constraint.
        CREATE TABLE IF NOT EXISTS listings (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT,
            image       TEXT NOT NULL,
            price       REAL,
            location    TEXT,
            country     TEXT,
            lon         REAL NOT NULL,
            lat         REAL NOT NULL,
            owner_id    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_listings_owner
            ON listings(owner_id);
        CREATE INDEX IF NOT EXISTS idx_listings_created
            ON listings(created_at, id);

        CREATE TABLE IF NOT EXISTS reviews (
            id          TEXT PRIMARY KEY,
            rating      INTEGER CHECK (rating BETWEEN 1 AND 5),
            content     TEXT NOT NULL,
            owner_id    TEXT NOT NULL,
            listing_id  TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_listing
            ON reviews(listing_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
