//! Blueprint-driven fixture generation.
//!
//! `kin` produces fully resolved objects from named templates so that test
//! suites and seed scripts can build realistic, related object graphs
//! without hand-writing every fixture.
//!
//! - **Blueprints**: ordered property maps of literals and async generators,
//!   optionally naming the model to instantiate
//! - **Overrides**: per-call values that win over the blueprint; an integer
//!   override on a generator key asks for that many independent values
//! - **Sibling references**: generators pull other properties through their
//!   [`Context`], each generator running at most once per generation
//! - **Hidden properties**: keys starting with `_` (except `_id`) feed the
//!   generation but land in the metadata instead of on the model
//! - **Generator handles**: reusable generators with post-processing
//!   pipelines and an item cache
//!
//! # Quick Start
//!
//! ```
//! use kin::prelude::*;
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct User {
//!     username: String,
//!     email: String,
//!     tags: Vec<String>,
//! }
//!
//! impl Model for User {}
//!
//! # futures::executor::block_on(async {
//! let kin = Kin::new();
//! kin.define(
//!     "User",
//!     Blueprint::new()
//!         .with_model(ModelConstructor::of::<User>())
//!         .with_generator(
//!             "email",
//!             Generator::new(|ctx| async move {
//!                 let username: String = ctx.resolve_as("username").await?;
//!                 Ok(json!(format!("{}@example.com", username)))
//!             }),
//!         )
//!         .with_value("username", "joe")
//!         .with_generator("tags", Generator::from_fn(|_| Ok(json!("rust"))))
//!         .with_value("_source", "quick-start"),
//! );
//!
//! let generated = kin
//!     .generate("User", Overrides::new().with_count("tags", 2))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(generated.meta["source"], json!("quick-start"));
//! let user: User = generated.into_model().unwrap();
//! assert_eq!(user.email, "joe@example.com");
//! assert_eq!(user.tags, vec!["rust", "rust"]);
//! # });
//! ```
//!
//! # Architecture
//!
//! - [`BlueprintRegistry`] stores named blueprints
//! - [`PropertyLinker`] merges a blueprint with overrides and expands counts
//! - [`Context`] resolves and memoizes properties, detecting cycles
//! - [`ModelBuilder`] runs one generation and splits off the metadata
//! - [`GeneratorHandle`] adds post-processing and caching on top
//! - [`Kin`] ties them together

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod blueprint;
pub mod builder;
pub mod error;
pub mod generator;
pub mod kin;
pub mod model;
pub mod prelude;
pub mod resolve;
pub mod settings;

// Re-export commonly used types at crate root
pub use blueprint::{Blueprint, BlueprintRegistry, Generator, GeneratorFuture, Overrides, Property, PropertyMap};
pub use builder::{Generated, ModelBuilder, Stage};
pub use error::{KinError, KinResult};
pub use generator::{GeneratorHandle, PostProcessor};
pub use kin::{Kin, KinBuilder};
pub use model::{AnyModel, Instance, Model, ModelConstructor, ModelRef, ModelRegistry, ModelResolver, Properties};
pub use resolve::{Context, PropertyLinker, evaluate_property, random_between};
pub use settings::{Concurrency, KinSettings};
