pub mod columns;
pub mod store;

pub use store::{ListingStore, StoreError, XlsxStore};
