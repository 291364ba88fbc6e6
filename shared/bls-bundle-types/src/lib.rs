//! Shared types for BLS operations, bundles and their relay wire form.

pub mod bundle;
pub mod keys;

pub use bundle::{ActionData, Bundle, Operation};
pub use keys::{PublicKey, Signature};
