//! Support stores shared read-only with the engine components.

mod keys;
mod pointer;
mod scroll;

pub use keys::KeyStore;
pub use pointer::PointerStore;
pub use scroll::ScrollStore;
