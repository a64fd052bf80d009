pub mod listing;
pub mod merge;
pub mod reconcile;

pub use listing::{ConsolidatedListing, ListingStatus, RawListing, ReconciledRow};
pub use merge::merge;
pub use reconcile::reconcile;
