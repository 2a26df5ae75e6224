pub mod prelude;
pub mod store_entries;
