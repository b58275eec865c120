use chrono::Utc;
use tracing::info;

use crate::domain::{
    Comment, CommentDraft, Credits, Enquiry, IdGen, Identity, LedgerError, Listing, ListingDraft,
    UuidIds, settle_purchase,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the marketplace operations.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
/// The caller's identity is an explicit parameter on every call; the
/// service never reads it from ambient state.
pub struct MarketService {
    repo: Repository,
    ids: Box<dyn IdGen>,
}

/// Result of a committed purchase: the listing as it was at the moment of
/// sale, plus both balances after the transfer.
#[derive(Debug)]
pub struct PurchaseReceipt {
    pub listing: Listing,
    pub buyer_balance: Credits,
    pub seller_balance: Credits,
}

impl MarketService {
    /// Create a new market service with the given repository and the
    /// production UUID id source.
    pub fn new(repo: Repository) -> Self {
        Self::with_ids(repo, Box::new(UuidIds))
    }

    /// Create a market service with an explicit id source. Tests use this
    /// to substitute a deterministic generator.
    pub fn with_ids(repo: Repository, ids: Box<dyn IdGen>) -> Self {
        Self { repo, ids }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Listing operations
    // ========================

    /// Publish a new listing owned by the caller.
    /// Rejects the draft without writing if any required field is missing.
    pub async fn create_listing(
        &self,
        caller: &Identity,
        draft: ListingDraft,
    ) -> Result<Listing, AppError> {
        if let Some(field) = draft.missing_field() {
            return Err(AppError::MissingField(field));
        }

        let listing = draft.into_listing(self.ids.next_id(), caller.clone(), Utc::now());
        self.repo.save_listing(&listing).await?;

        info!(id = %listing.id, owner = %listing.owner, price = listing.price, "listing created");
        Ok(listing)
    }

    /// Look up a single listing by id. Read-only.
    pub async fn get_listing(&self, id: &str) -> Result<Listing, AppError> {
        if id.trim().is_empty() {
            return Err(AppError::MissingField("id"));
        }
        self.repo
            .get_listing(id)
            .await?
            .ok_or_else(|| AppError::ListingNotFound(id.to_string()))
    }

    /// List every current listing. No pagination or filtering.
    pub async fn list_listings(&self) -> Result<Vec<Listing>, AppError> {
        Ok(self.repo.list_listings().await?)
    }

    /// Remove a listing. Only the recorded owner may do this; the removal
    /// predicates on ownership inside the delete statement itself, so the
    /// check and the remove are one step against the store.
    pub async fn delete_listing(&self, caller: &Identity, id: &str) -> Result<Listing, AppError> {
        let listing = self.get_listing(id).await?;
        if listing.owner != *caller {
            return Err(AppError::NotOwner(id.to_string()));
        }

        let removed = self
            .repo
            .remove_listing(id, caller)
            .await?
            .ok_or_else(|| AppError::ListingNotFound(id.to_string()))?;

        info!(id = %removed.id, owner = %caller, "listing removed by owner");
        Ok(removed)
    }

    // ========================
    // Ledger operations
    // ========================

    /// Purchase a listing, transferring its price from the caller to the
    /// named seller. The seller argument is credited verbatim; it is not
    /// cross-checked against the listing owner.
    ///
    /// All validation happens before any write; the balance updates, sale
    /// record and listing removal then commit as one storage transaction.
    pub async fn buy_product(
        &self,
        caller: &Identity,
        item_id: &str,
        seller: &Identity,
    ) -> Result<PurchaseReceipt, AppError> {
        let listing = self.get_listing(item_id).await?;

        if listing.owner == *caller {
            return Err(AppError::OwnListing);
        }

        let buyer_balance = self.repo.balance(caller).await?;
        let seller_balance = self.repo.balance(seller).await?;

        if let Err(err) = settle_purchase(buyer_balance, seller_balance, listing.price) {
            return Err(match err {
                LedgerError::InsufficientFunds { balance, required } => {
                    AppError::InsufficientFunds { balance, required }
                }
                other => AppError::Database(anyhow::Error::new(other)),
            });
        }

        let (buyer_balance, seller_balance) =
            self.repo.commit_purchase(&listing, caller, seller).await?;

        info!(
            item = %listing.id,
            buyer = %caller,
            seller = %seller,
            price = listing.price,
            "purchase committed"
        );

        Ok(PurchaseReceipt {
            listing,
            buyer_balance,
            seller_balance,
        })
    }

    /// Credit an account with new supply. Returns the new balance.
    pub async fn deposit(&self, identity: &Identity, amount: Credits) -> Result<Credits, AppError> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount(format!(
                "deposit must be positive, got {}",
                amount
            )));
        }

        let balance = self.repo.credit_account(identity, amount).await?;
        info!(account = %identity, amount, balance, "deposit credited");
        Ok(balance)
    }

    /// Current balance for an identity. An account with no entry reads as 0.
    pub async fn balance_of(&self, identity: &Identity) -> Result<Credits, AppError> {
        Ok(self.repo.balance(identity).await?)
    }

    /// Who bought an item, if it has been sold.
    pub async fn sold_to(&self, item_id: &str) -> Result<Option<Identity>, AppError> {
        Ok(self.repo.sold_record(item_id).await?)
    }

    // ========================
    // Feedback operations
    // ========================

    /// Record a buyer comment against a sold item.
    /// The item must have a sale record; the comment author is the caller
    /// and is not cross-checked against the recorded buyer.
    pub async fn add_comment(
        &self,
        caller: &Identity,
        draft: CommentDraft,
    ) -> Result<Comment, AppError> {
        if let Some(field) = draft.missing_field() {
            return Err(AppError::MissingField(field));
        }
        if self.repo.sold_record(&draft.item_id).await?.is_none() {
            return Err(AppError::NotSold(draft.item_id));
        }

        let comment = Comment {
            id: self.ids.next_id(),
            item_id: draft.item_id,
            seller: Identity::new(draft.seller),
            rate: draft.rate,
            text: draft.text,
            author: caller.clone(),
            created_at: Utc::now(),
        };
        self.repo.save_comment(&comment).await?;

        info!(item = %comment.item_id, author = %caller, rate = comment.rate, "comment recorded");
        Ok(comment)
    }

    /// All comments recorded against an item, oldest first.
    pub async fn comments_for(&self, item_id: &str) -> Result<Vec<Comment>, AppError> {
        Ok(self.repo.comments_for(item_id).await?)
    }

    /// Record an enquiry about a live listing. Unlike comments, enquiries
    /// carry no sold-item precondition; the listing just has to exist.
    pub async fn submit_enquiry(
        &self,
        caller: &Identity,
        listing_id: &str,
        question: &str,
    ) -> Result<Enquiry, AppError> {
        if listing_id.trim().is_empty() {
            return Err(AppError::MissingField("listing_id"));
        }
        if question.trim().is_empty() {
            return Err(AppError::MissingField("question"));
        }

        let listing = self.get_listing(listing_id).await?;

        let enquiry = Enquiry {
            id: self.ids.next_id(),
            listing_id: listing.id,
            question: question.to_string(),
            author: caller.clone(),
            created_at: Utc::now(),
        };
        self.repo.save_enquiry(&enquiry).await?;

        info!(listing = %enquiry.listing_id, author = %caller, "enquiry recorded");
        Ok(enquiry)
    }

    /// All enquiries recorded against a listing, oldest first.
    pub async fn enquiries_for(&self, listing_id: &str) -> Result<Vec<Enquiry>, AppError> {
        Ok(self.repo.enquiries_for(listing_id).await?)
    }
}
