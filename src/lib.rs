//! Pantry
//!
//! Token-addressed storage for a personal kitchen inventory: pantry, fridge
//! and freezer contents, recipes, a shopping list and a weekly meal plan.

pub mod client;
pub mod db;
pub mod directory;
pub mod documents;
pub mod models;
pub mod protocol;
pub mod server;
pub mod session;
pub mod store;
pub mod token;

#[cfg(test)]
mod test_support;

pub use client::{ClientError, PantryClient};
pub use db::SqliteStore;
pub use directory::{DirectoryError, UserDirectory};
pub use documents::{DocumentError, Documents};
pub use models::{Account, Category};
pub use session::{Session, SessionContext, SessionError, SessionEvent};
pub use store::{AccountStore, DocumentStore, MemoryStore, Store, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
