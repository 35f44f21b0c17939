//! Token models, unsigned claim decoding, and the expiry policy.

pub mod claims;
pub mod expiry;
pub mod pair;
pub mod secret;

pub use claims::*;
pub use expiry::*;
pub use pair::*;
pub use secret::*;
