use crate::domain::product::Product;
use crate::error::Result;
use std::io::Write;

/// Writes catalog products as CSV with an `id,name,price` header.
pub struct ProductWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ProductWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_products(&mut self, products: impl IntoIterator<Item = Product>) -> Result<()> {
        for product in products {
            self.writer.serialize(product)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
