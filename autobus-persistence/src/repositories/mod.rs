pub mod store_entry_repository;

pub use store_entry_repository::StoreEntryRepository;
