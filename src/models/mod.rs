pub mod catalogue;
pub mod game;
pub mod status;

pub use catalogue::*;
pub use game::*;
pub use status::*;
