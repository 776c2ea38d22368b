//! Reading and writing the flat tab-delimited meta format.

mod tsv;

pub use tsv::{from_reader, read_meta, read_meta_with, to_writer, write_meta};
