use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::application::MarketService;
use crate::domain::{
    CommentDraft, Identity, Listing, ListingDraft, format_credits, parse_credits,
};

/// Mercato - Marketplace Ledger
#[derive(Parser)]
#[command(name = "mercato")]
#[command(about = "A local-first marketplace ledger with token-balance purchases")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "mercato.db")]
    pub database: String,

    /// Caller identity for this invocation (required for mutating commands)
    #[arg(long = "as", value_name = "IDENTITY", global = true)]
    pub caller: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Listing management commands
    #[command(subcommand)]
    Listing(ListingCommands),

    /// Buy a listed item, transferring its price to the named seller
    Buy {
        /// Listing id to purchase
        item_id: String,

        /// Identity to credit with the sale proceeds
        #[arg(long)]
        seller: String,
    },

    /// Credit your account with new supply
    Deposit {
        /// Amount in whole credits (e.g., "100")
        amount: String,
    },

    /// Show the balance of an identity (defaults to the caller)
    Balance {
        /// Identity to inspect (omit for the caller)
        identity: Option<String>,
    },

    /// Comment on an item you bought
    Comment {
        /// Listing id of the purchased item
        item_id: String,

        /// Seller the comment refers to
        #[arg(long)]
        seller: String,

        /// Rating (positive integer)
        #[arg(long)]
        rate: String,

        /// Comment text
        #[arg(long)]
        text: String,
    },

    /// List comments recorded against an item
    Comments {
        /// Listing id of the item
        item_id: String,
    },

    /// Ask a question about a live listing
    Enquire {
        /// Listing id
        listing_id: String,

        /// The question to record
        question: String,
    },

    /// List enquiries recorded against a listing
    Enquiries {
        /// Listing id
        listing_id: String,
    },
}

#[derive(Subcommand)]
pub enum ListingCommands {
    /// Publish a new listing owned by the caller
    Create {
        /// Business name
        #[arg(long)]
        name: String,

        /// Name of the item offered
        #[arg(long)]
        item: String,

        /// Product label/category
        #[arg(long)]
        label: String,

        /// Asking price in whole credits
        #[arg(long)]
        price: String,

        #[arg(long)]
        continent: String,

        #[arg(long)]
        country: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        zipcode: String,

        /// Item description
        #[arg(long)]
        description: String,
    },

    /// List all current listings
    List {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show a single listing
    Show {
        /// Listing id
        id: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Remove a listing you own
    Delete {
        /// Listing id
        id: String,
    },
}

impl Cli {
    fn caller(&self) -> Result<Identity> {
        let raw = self
            .caller
            .as_deref()
            .context("This command needs a caller identity; pass --as <identity>")?;
        Ok(Identity::new(raw))
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            Commands::Init => {
                MarketService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Listing(listing_cmd) => {
                let service = MarketService::connect(&self.database).await?;
                self.run_listing_command(&service, listing_cmd).await?;
            }

            Commands::Buy { item_id, seller } => {
                let service = MarketService::connect(&self.database).await?;
                let receipt = service
                    .buy_product(&self.caller()?, item_id, &Identity::new(seller.clone()))
                    .await?;

                println!(
                    "Bought {} for {} from {}",
                    receipt.listing.item_name,
                    format_credits(receipt.listing.price),
                    seller
                );
                println!("Your balance: {}", format_credits(receipt.buyer_balance));
            }

            Commands::Deposit { amount } => {
                let service = MarketService::connect(&self.database).await?;
                let amount = parse_credits(amount)
                    .context("Invalid amount format. Use a whole number like '100'")?;
                let balance = service.deposit(&self.caller()?, amount).await?;

                println!(
                    "Deposited {}, new balance: {}",
                    format_credits(amount),
                    format_credits(balance)
                );
            }

            Commands::Balance { identity } => {
                let service = MarketService::connect(&self.database).await?;
                let identity = match identity {
                    Some(raw) => Identity::new(raw.clone()),
                    None => self.caller()?,
                };
                let balance = service.balance_of(&identity).await?;

                println!("{}: {}", identity, format_credits(balance));
            }

            Commands::Comment {
                item_id,
                seller,
                rate,
                text,
            } => {
                let service = MarketService::connect(&self.database).await?;
                let rate = parse_credits(rate).context("Invalid rate; use a positive integer")?;
                let draft = CommentDraft {
                    item_id: item_id.clone(),
                    seller: seller.clone(),
                    text: text.clone(),
                    rate,
                };
                let comment = service.add_comment(&self.caller()?, draft).await?;

                println!("Recorded comment {} on item {}", comment.id, comment.item_id);
            }

            Commands::Comments { item_id } => {
                let service = MarketService::connect(&self.database).await?;
                let comments = service.comments_for(item_id).await?;

                if comments.is_empty() {
                    println!("No comments for item {}", item_id);
                }
                for comment in comments {
                    println!(
                        "[{}] {} ({}): {}",
                        comment.created_at.format("%Y-%m-%d"),
                        comment.author,
                        comment.rate,
                        comment.text
                    );
                }
            }

            Commands::Enquire {
                listing_id,
                question,
            } => {
                let service = MarketService::connect(&self.database).await?;
                let enquiry = service
                    .submit_enquiry(&self.caller()?, listing_id, question)
                    .await?;

                println!(
                    "Recorded enquiry {} on listing {}",
                    enquiry.id, enquiry.listing_id
                );
            }

            Commands::Enquiries { listing_id } => {
                let service = MarketService::connect(&self.database).await?;
                let enquiries = service.enquiries_for(listing_id).await?;

                if enquiries.is_empty() {
                    println!("No enquiries for listing {}", listing_id);
                }
                for enquiry in enquiries {
                    println!(
                        "[{}] {}: {}",
                        enquiry.created_at.format("%Y-%m-%d"),
                        enquiry.author,
                        enquiry.question
                    );
                }
            }
        }

        Ok(())
    }

    async fn run_listing_command(
        &self,
        service: &MarketService,
        command: &ListingCommands,
    ) -> Result<()> {
        match command {
            ListingCommands::Create {
                name,
                item,
                label,
                price,
                continent,
                country,
                location,
                zipcode,
                description,
            } => {
                let price = parse_credits(price)
                    .context("Invalid price format. Use a whole number like '40'")?;
                let draft = ListingDraft {
                    name: name.clone(),
                    continent: continent.clone(),
                    country: country.clone(),
                    location: location.clone(),
                    zipcode: zipcode.clone(),
                    product_label: label.clone(),
                    description: description.clone(),
                    item_name: item.clone(),
                    price,
                };
                let listing = service.create_listing(&self.caller()?, draft).await?;

                println!(
                    "Created listing: {} at {} ({})",
                    listing.item_name,
                    format_credits(listing.price),
                    listing.id
                );
            }

            ListingCommands::List { format } => {
                let listings = service.list_listings().await?;

                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&listings)?),
                    "table" => {
                        if listings.is_empty() {
                            println!("No listings.");
                        }
                        for listing in listings {
                            println!(
                                "{}  {:20} {:>12}  {} ({})",
                                listing.id,
                                listing.item_name,
                                format_credits(listing.price),
                                listing.name,
                                listing.owner
                            );
                        }
                    }
                    other => bail!("Unknown format: {} (expected table or json)", other),
                }
            }

            ListingCommands::Show { id, format } => {
                let listing = service.get_listing(id).await?;

                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&listing)?),
                    "table" => print_listing(&listing),
                    other => bail!("Unknown format: {} (expected table or json)", other),
                }
            }

            ListingCommands::Delete { id } => {
                let removed = service.delete_listing(&self.caller()?, id).await?;
                println!("Removed listing: {} ({})", removed.item_name, removed.id);
            }
        }

        Ok(())
    }
}

fn print_listing(listing: &Listing) {
    println!("Listing:     {}", listing.id);
    println!("Business:    {}", listing.name);
    println!("Item:        {} [{}]", listing.item_name, listing.product_label);
    println!("Price:       {}", format_credits(listing.price));
    println!("Seller:      {}", listing.owner);
    println!(
        "Where:       {}, {}, {} {}",
        listing.location, listing.country, listing.continent, listing.zipcode
    );
    println!("Description: {}", listing.description);
    println!("Listed at:   {}", listing.listed_at.format("%Y-%m-%d %H:%M"));
}
