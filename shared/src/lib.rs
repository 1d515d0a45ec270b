pub mod colors;
pub mod entities;
pub mod events;
pub mod orders;

pub use colors::player_color;
pub use entities::*;
pub use events::*;
pub use orders::*;
