use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Credits, Identity};

pub type ListingId = String;

/// A seller's published product record, available for purchase.
/// Listings are immutable once created; they leave the collection either
/// through an owner delete or through a purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    /// Identity recorded as the seller at creation time
    pub owner: Identity,
    /// Business name
    pub name: String,
    /// Name of the item offered
    pub item_name: String,
    /// Product label/category
    pub product_label: String,
    /// Asking price in credits (always positive)
    pub price: Credits,
    pub continent: String,
    pub country: String,
    pub location: String,
    pub zipcode: String,
    pub description: String,
    /// When the listing was published
    pub listed_at: DateTime<Utc>,
    /// Reserved for future partial updates; never set by this core
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for publishing a listing. Every field is required: strings must
/// be non-empty and the price positive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingDraft {
    pub name: String,
    pub continent: String,
    pub country: String,
    pub location: String,
    pub zipcode: String,
    pub product_label: String,
    pub description: String,
    pub item_name: String,
    pub price: Credits,
}

impl ListingDraft {
    /// Returns the first missing required field, in declaration order.
    pub fn missing_field(&self) -> Option<&'static str> {
        let required = [
            ("name", &self.name),
            ("continent", &self.continent),
            ("country", &self.country),
            ("location", &self.location),
            ("zipcode", &self.zipcode),
            ("product_label", &self.product_label),
            ("description", &self.description),
            ("item_name", &self.item_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Some(field);
            }
        }
        if self.price <= 0 {
            return Some("price");
        }
        None
    }

    /// Materialize the draft into a listing owned by `owner`.
    pub fn into_listing(
        self,
        id: ListingId,
        owner: Identity,
        listed_at: DateTime<Utc>,
    ) -> Listing {
        Listing {
            id,
            owner,
            name: self.name,
            item_name: self.item_name,
            product_label: self.product_label,
            price: self.price,
            continent: self.continent,
            country: self.country,
            location: self.location,
            zipcode: self.zipcode,
            description: self.description,
            listed_at,
            updated_at: None,
        }
    }
}
