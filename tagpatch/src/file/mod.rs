//! Generic file handling utilities

mod file_type;

pub use file_type::{EXTENSIONS, FileType};
