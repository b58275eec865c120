use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{Comment, Credits, Enquiry, Identity, Listing};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_FEEDBACK};

const LISTING_COLUMNS: &str = "id, owner, name, item_name, product_label, price, continent, country, location, zipcode, description, listed_at, updated_at";

/// Repository for persisting and querying the marketplace collections:
/// listings, account balances, sale records and feedback. Constructed once
/// at startup and handed to the service; there is no ambient store.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_FEEDBACK)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Listing operations
    // ========================

    /// Save a new listing to the database.
    pub async fn save_listing(&self, listing: &Listing) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO listings (id, owner, name, item_name, product_label, price, continent, country, location, zipcode, description, listed_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&listing.id)
        .bind(listing.owner.as_str())
        .bind(&listing.name)
        .bind(&listing.item_name)
        .bind(&listing.product_label)
        .bind(listing.price)
        .bind(&listing.continent)
        .bind(&listing.country)
        .bind(&listing.location)
        .bind(&listing.zipcode)
        .bind(&listing.description)
        .bind(listing.listed_at.to_rfc3339())
        .bind(listing.updated_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save listing")?;
        Ok(())
    }

    /// Get a listing by id.
    pub async fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        let query = format!("SELECT {} FROM listings WHERE id = ?", LISTING_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch listing")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_listing(&row)?)),
            None => Ok(None),
        }
    }

    /// List all current listings, oldest first.
    pub async fn list_listings(&self) -> Result<Vec<Listing>> {
        let query = format!(
            "SELECT {} FROM listings ORDER BY listed_at, id",
            LISTING_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list listings")?;

        rows.iter().map(Self::row_to_listing).collect()
    }

    /// Remove a listing, predicated on ownership in the same statement.
    /// Returns the removed record, or None when no row matched both the id
    /// and the owner.
    pub async fn remove_listing(&self, id: &str, owner: &Identity) -> Result<Option<Listing>> {
        let query = format!(
            "DELETE FROM listings WHERE id = ? AND owner = ? RETURNING {}",
            LISTING_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to remove listing")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_listing(&row)?)),
            None => Ok(None),
        }
    }

    // ========================
    // Account operations
    // ========================

    /// Current balance for an identity. An identity with no account row
    /// reads as balance 0.
    pub async fn balance(&self, identity: &Identity) -> Result<Credits> {
        Self::fetch_balance(&self.pool, identity).await
    }

    /// Credit an account, creating it if absent. Returns the new balance.
    pub async fn credit_account(&self, identity: &Identity, amount: Credits) -> Result<Credits> {
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (identity, balance) VALUES (?, ?)
            ON CONFLICT(identity) DO UPDATE SET balance = balance + excluded.balance
            RETURNING balance
            "#,
        )
        .bind(identity.as_str())
        .bind(amount)
        .fetch_one(&self.pool)
        .await
        .context("Failed to credit account")?;

        Ok(row.get("balance"))
    }

    /// Commit a validated purchase as a single transaction: debit the
    /// buyer, credit the seller, record the sale, remove the listing.
    /// Either all four writes land or none do. Returns the post-transfer
    /// buyer and seller balances.
    pub async fn commit_purchase(
        &self,
        listing: &Listing,
        buyer: &Identity,
        seller: &Identity,
    ) -> Result<(Credits, Credits)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin purchase transaction")?;

        // The debit re-checks the balance in the statement itself, so a
        // concurrent writer cannot drive the buyer negative.
        let debited =
            sqlx::query("UPDATE accounts SET balance = balance - ? WHERE identity = ? AND balance >= ?")
                .bind(listing.price)
                .bind(buyer.as_str())
                .bind(listing.price)
                .execute(&mut *tx)
                .await
                .context("Failed to debit buyer")?;
        if debited.rows_affected() == 0 {
            anyhow::bail!(
                "buyer {} no longer covers price {} for listing {}",
                buyer,
                listing.price,
                listing.id
            );
        }

        sqlx::query(
            r#"
            INSERT INTO accounts (identity, balance) VALUES (?, ?)
            ON CONFLICT(identity) DO UPDATE SET balance = balance + excluded.balance
            "#,
        )
        .bind(seller.as_str())
        .bind(listing.price)
        .execute(&mut *tx)
        .await
        .context("Failed to credit seller")?;

        sqlx::query("INSERT INTO sold_records (item_id, buyer, sold_at) VALUES (?, ?, ?)")
            .bind(&listing.id)
            .bind(buyer.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Failed to record sale")?;

        let removed = sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(&listing.id)
            .execute(&mut *tx)
            .await
            .context("Failed to remove sold listing")?;
        if removed.rows_affected() == 0 {
            anyhow::bail!("listing {} disappeared during purchase", listing.id);
        }

        let buyer_balance = Self::fetch_balance(&mut *tx, buyer).await?;
        let seller_balance = Self::fetch_balance(&mut *tx, seller).await?;

        tx.commit()
            .await
            .context("Failed to commit purchase transaction")?;

        Ok((buyer_balance, seller_balance))
    }

    // ========================
    // Sale records
    // ========================

    /// Who bought an item, if a sale has been recorded for it.
    pub async fn sold_record(&self, item_id: &str) -> Result<Option<Identity>> {
        let row = sqlx::query("SELECT buyer FROM sold_records WHERE item_id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch sale record")?;

        Ok(row.map(|row| Identity::new(row.get::<String, _>("buyer"))))
    }

    // ========================
    // Feedback operations
    // ========================

    /// Save a new comment to the database.
    pub async fn save_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, item_id, seller, rate, text, author, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.item_id)
        .bind(comment.seller.as_str())
        .bind(comment.rate)
        .bind(&comment.text)
        .bind(comment.author.as_str())
        .bind(comment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save comment")?;
        Ok(())
    }

    /// List comments for an item, oldest first.
    pub async fn comments_for(&self, item_id: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, seller, rate, text, author, created_at
            FROM comments
            WHERE item_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comments")?;

        rows.iter().map(Self::row_to_comment).collect()
    }

    /// Save a new enquiry to the database.
    pub async fn save_enquiry(&self, enquiry: &Enquiry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO enquiries (id, listing_id, question, author, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&enquiry.id)
        .bind(&enquiry.listing_id)
        .bind(&enquiry.question)
        .bind(enquiry.author.as_str())
        .bind(enquiry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save enquiry")?;
        Ok(())
    }

    /// List enquiries for a listing, oldest first.
    pub async fn enquiries_for(&self, listing_id: &str) -> Result<Vec<Enquiry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, listing_id, question, author, created_at
            FROM enquiries
            WHERE listing_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list enquiries")?;

        rows.iter().map(Self::row_to_enquiry).collect()
    }

    // ========================
    // Row mapping
    // ========================

    async fn fetch_balance<'e, E>(executor: E, identity: &Identity) -> Result<Credits>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query("SELECT balance FROM accounts WHERE identity = ?")
            .bind(identity.as_str())
            .fetch_optional(executor)
            .await
            .context("Failed to fetch balance")?;

        Ok(row.map(|row| row.get("balance")).unwrap_or(0))
    }

    fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(raw)
            .context("Invalid timestamp")?
            .with_timezone(&Utc))
    }

    fn row_to_listing(row: &sqlx::sqlite::SqliteRow) -> Result<Listing> {
        let owner: String = row.get("owner");
        let listed_at_str: String = row.get("listed_at");
        let updated_at_str: Option<String> = row.get("updated_at");

        Ok(Listing {
            id: row.get("id"),
            owner: Identity::new(owner),
            name: row.get("name"),
            item_name: row.get("item_name"),
            product_label: row.get("product_label"),
            price: row.get("price"),
            continent: row.get("continent"),
            country: row.get("country"),
            location: row.get("location"),
            zipcode: row.get("zipcode"),
            description: row.get("description"),
            listed_at: Self::parse_timestamp(&listed_at_str)?,
            updated_at: updated_at_str
                .map(|raw| Self::parse_timestamp(&raw))
                .transpose()?,
        })
    }

    fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
        let seller: String = row.get("seller");
        let author: String = row.get("author");
        let created_at_str: String = row.get("created_at");

        Ok(Comment {
            id: row.get("id"),
            item_id: row.get("item_id"),
            seller: Identity::new(seller),
            rate: row.get("rate"),
            text: row.get("text"),
            author: Identity::new(author),
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_enquiry(row: &sqlx::sqlite::SqliteRow) -> Result<Enquiry> {
        let author: String = row.get("author");
        let created_at_str: String = row.get("created_at");

        Ok(Enquiry {
            id: row.get("id"),
            listing_id: row.get("listing_id"),
            question: row.get("question"),
            author: Identity::new(author),
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }
}
