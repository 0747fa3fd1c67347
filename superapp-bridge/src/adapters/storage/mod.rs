pub mod json_file;
pub mod local_data;

pub use json_file::JsonFileMap;
pub use local_data::{FileLocalDataStore, InMemoryLocalDataStore};
