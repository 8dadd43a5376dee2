pub mod classifier;
pub mod decoder;
pub mod dispatcher;
pub mod registry;

pub use classifier::ErrorClassifier;
pub use decoder::RecordDecoder;
pub use dispatcher::{CompletionDispatcher, Dispatch};
pub use registry::{EntryState, Registry};
