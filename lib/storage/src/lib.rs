pub mod builder;
pub mod corpus;
pub mod store;

pub use builder::{BuiltIndex, IndexBuilder};
pub use corpus::load_corpus;
pub use store::{build_files, index_file_name, open_context, BuildMetadata, FORMAT_VERSION};
