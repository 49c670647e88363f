//! Artifact Rotation
//!
//! Decides when a storage target's current artifact must be closed and a new
//! one opened, based on calendar-day boundaries and/or a size threshold.
//!
//! Artifact identifiers follow `<prefix>[_<date>].<ext>[_<generation>]`.
//! Generation 0 carries no suffix; every size rotation increments the
//! generation and leaves prior artifacts untouched.
//!
//! The policy here is pure: it never touches a backend. Reading sizes and
//! seeding new artifacts happens in [`crate::storage::ArtifactTarget`].

mod name;
mod policy;

pub use name::ArtifactName;
pub use policy::{Rotation, RotationPolicy};
