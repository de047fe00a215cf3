//! Domain models for the Stockroom inventory platform

mod allocation;
mod item;
mod location;
mod movement;
mod user;

pub use allocation::*;
pub use item::*;
pub use location::*;
pub use movement::*;
pub use user::*;
