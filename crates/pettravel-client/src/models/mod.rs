//! Wire types for the PetTravel REST API.
//!
//! One canonical shape per entity: numeric ids, email-based login, ISO dates.

mod auth;
mod pet;
mod plan;
mod travel;

pub use auth::*;
pub use pet::*;
pub use plan::*;
pub use travel::*;
