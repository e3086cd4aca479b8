//! Data types shared between the protocol layer and the client map state.

mod face;
mod location;

pub use face::Face;
pub use location::Location;
