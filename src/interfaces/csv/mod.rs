//! CSV import and export of the product catalog (`id,name,price`).

pub mod product_reader;
pub mod product_writer;
