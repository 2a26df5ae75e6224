pub use super::store_entries::Entity as StoreEntries;
