//! Shared presentation state: the document model, the store it lives in and the
//! master/viewer synchronizer on top.

pub mod state;
pub mod store;
pub mod synchronizer;

pub use state::{LiveMode, SessionStatePatch, SharedSessionState, SlideMode, SlideStyle, SlideStylePatch};
pub use store::{DocumentStore, LoroDocumentStore};
pub use synchronizer::{PresentationSync, SessionStateStream, SyncUpdate};
