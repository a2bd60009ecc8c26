//! Service Layer
//!
//! Business logic behind the route handlers. Services take the durable
//! store and the cache-aside accessor explicitly; every write commits to the
//! store first and then invalidates the cache keys that embed the written
//! resource, before returning.

mod activities;
mod albums;
mod authentications;
mod authorizer;
mod collaborations;
mod exports;
mod likes;
mod playlists;
mod songs;
mod users;

pub use activities::*;
pub use albums::*;
pub use authentications::*;
pub use authorizer::*;
pub use collaborations::*;
pub use exports::*;
pub use likes::*;
pub use playlists::*;
pub use songs::*;
pub use users::*;
