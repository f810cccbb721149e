pub mod cursor;
pub mod deck;
pub mod diagnostics;
pub mod health;
pub mod presence;
pub mod session_state;
pub mod session_ws;

pub use cursor::*;
pub use deck::*;
pub use diagnostics::*;
pub use health::*;
pub use presence::*;
pub use session_state::*;
pub use session_ws::*;
