pub mod cursor;
pub mod deck;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod presence;
pub mod ready;

pub use cursor::*;
pub use deck::*;
pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use presence::*;
pub use ready::*;
