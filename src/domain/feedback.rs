use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Credits, Identity, ListingId};

/// A buyer's comment against a sold item. Append-only.
/// The seller identity is taken from the submitted payload, not derived
/// from the sale record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub item_id: ListingId,
    pub seller: Identity,
    pub rate: Credits,
    pub text: String,
    pub author: Identity,
    pub created_at: DateTime<Utc>,
}

/// Payload for submitting a comment on a purchased item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentDraft {
    pub item_id: String,
    pub seller: String,
    pub text: String,
    pub rate: Credits,
}

impl CommentDraft {
    /// Returns the first missing required field, in declaration order.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.item_id.trim().is_empty() {
            return Some("item_id");
        }
        if self.seller.trim().is_empty() {
            return Some("seller");
        }
        if self.text.trim().is_empty() {
            return Some("text");
        }
        if self.rate <= 0 {
            return Some("rate");
        }
        None
    }
}

/// A question asked about a live listing. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enquiry {
    pub id: String,
    pub listing_id: ListingId,
    pub question: String,
    pub author: Identity,
    pub created_at: DateTime<Utc>,
}
