mod credits;
mod feedback;
mod identity;
mod ledger;
mod listing;

pub use credits::*;
pub use feedback::*;
pub use identity::*;
pub use ledger::*;
pub use listing::*;
