//! Slide decks, the navigation cursor and the thumbnail prefetch pipeline.

pub mod cache;
pub mod controller;
pub mod cursor;
pub mod deck;
pub mod lookup;
pub mod pipeline;

pub use cache::ThumbnailCache;
pub use controller::{DeckLoad, SlideController, DECK_LOAD_FAILED_NOTICE, LOADING_TITLE};
pub use cursor::NavigationCursor;
pub use deck::{DeckResolver, SlideDeck};
pub use lookup::{SlideListing, SlideLookup};
pub use pipeline::{SlideEvent, ThumbnailPipeline};
