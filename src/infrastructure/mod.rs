pub mod atomic_file;
pub mod model_artifact;
pub mod object_store;
pub mod record_csv;

pub use object_store::{InMemoryObjectStore, LocalObjectStore};
