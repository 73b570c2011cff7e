//! Convenience re-exports for common usage.
//!
//! # Example
//!
//! ```
//! use kin::prelude::*;
//!
//! let kin = Kin::new();
//! kin.define("User", Blueprint::new().with_value("username", "joe"));
//! assert!(kin.blueprints().has("User"));
//! ```

pub use crate::blueprint::{Blueprint, Generator, Overrides, Property};
pub use crate::builder::Generated;
pub use crate::error::{KinError, KinResult};
pub use crate::generator::{GeneratorHandle, PostProcessor};
pub use crate::kin::Kin;
pub use crate::model::{Instance, Model, ModelConstructor, ModelRegistry};
pub use crate::resolve::Context;
pub use crate::settings::{Concurrency, KinSettings};
