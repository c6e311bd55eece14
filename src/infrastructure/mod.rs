pub mod in_memory;
pub mod niubiz;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
