pub mod atlas;
pub mod group;
pub mod item;
pub mod schema;

pub use atlas::*;
pub use group::*;
pub use item::*;
pub use schema::*;
