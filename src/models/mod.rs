mod account;
mod category;

pub use account::Account;
pub use category::{Category, StoredDocument, WEEKDAYS};
