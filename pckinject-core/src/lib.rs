//! pckinject core library: domain types, fixed layout conventions, errors.
//!
//! Public API surface:
//! - [`types`]: [`Platform`], [`AssetBundle`], [`BundleSource`]
//! - [`layout`]: where bundles live and where they are installed
//! - [`error`]: [`CoreError`]

pub mod error;
pub mod layout;
pub mod types;

pub use error::CoreError;
pub use types::{AssetBundle, BundleSource, Platform};
