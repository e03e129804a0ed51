// File adapters behind the app ports
pub mod chunk_writer;
pub mod json_store;
pub mod splitter;

pub use chunk_writer::ChunkWriter;
pub use json_store::JsonRecordStore;
pub use splitter::{split_json_file, SplitInfo, SplitResult};
