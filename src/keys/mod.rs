//! Key derivation: from a call context to the key sequence a record lives under.

pub mod context;
pub mod strategy;

pub use context::{CallContext, CallSite};
pub use strategy::{args_fingerprint, KeyStrategy};
