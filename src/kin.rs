//! Engine facade.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::blueprint::{Blueprint, BlueprintRegistry, Overrides};
use crate::builder::{Generated, ModelBuilder};
use crate::error::KinResult;
use crate::generator::{GeneratorHandle, PostProcessor, Steps};
use crate::model::ModelResolver;
use crate::settings::KinSettings;

struct KinInner {
	blueprints: BlueprintRegistry,
	post: RwLock<HashMap<String, Steps>>,
	models: Option<Arc<dyn ModelResolver>>,
	settings: KinSettings,
}

/// Fixture-generation engine.
///
/// Owns the blueprints, the type-level post-processing steps and the
/// optional model resolver. Cloning is cheap and every clone shares the same
/// state, so blueprint generators can capture the engine to generate nested
/// objects.
///
/// # Example
///
/// ```
/// use kin::{Blueprint, Kin, Overrides};
/// use serde_json::json;
///
/// # futures::executor::block_on(async {
/// let kin = Kin::new();
/// kin.define(
///     "User",
///     Blueprint::new()
///         .with_value("username", "joe")
///         .with_value("email", "joe@example.com"),
/// );
///
/// let generated = kin
///     .generate("User", Overrides::new().with_value("username", "bill"))
///     .await
///     .unwrap();
///
/// assert_eq!(generated.model.get("username"), Some(json!("bill")));
/// # });
/// ```
#[derive(Clone)]
pub struct Kin {
	inner: Arc<KinInner>,
}

impl Default for Kin {
	fn default() -> Self {
		Self::new()
	}
}

impl Kin {
	/// Creates an engine with default settings and no model resolver.
	pub fn new() -> Self {
		Self::builder().build()
	}

	/// Returns a builder for configuring an engine.
	pub fn builder() -> KinBuilder {
		KinBuilder::new()
	}

	/// Defines and/or reads a blueprint.
	///
	/// See [`BlueprintRegistry::blueprint`].
	pub fn blueprint(&self, type_name: &str, definition: Option<Blueprint>) -> Option<Arc<Blueprint>> {
		self.inner.blueprints.blueprint(type_name, definition)
	}

	/// Stores `definition` under `type_name`, replacing any prior definition.
	pub fn define(&self, type_name: impl Into<String>, definition: Blueprint) -> Arc<Blueprint> {
		self.inner.blueprints.define(type_name, definition)
	}

	/// Returns the blueprint registry.
	pub fn blueprints(&self) -> &BlueprintRegistry {
		&self.inner.blueprints
	}

	/// Returns the engine settings.
	pub fn settings(&self) -> &KinSettings {
		&self.inner.settings
	}

	/// Appends a type-level post-processing step.
	///
	/// Type-level steps are shared by every generator of `type_name` and run
	/// before any generator's own steps.
	pub fn post(&self, type_name: impl Into<String>, step: impl PostProcessor + 'static) -> &Self {
		let type_name = type_name.into();
		tracing::debug!(blueprint = %type_name, "Registered post-processing step");
		self.inner
			.post
			.write()
			.entry(type_name)
			.or_default()
			.push(Arc::new(step));
		self
	}

	/// Generates one `type_name` object, running the type-level steps.
	pub async fn generate(&self, type_name: &str, overrides: Overrides) -> KinResult<Generated> {
		self.make_generator(type_name, Overrides::new())
			.generate_with(overrides)
			.await
	}

	/// Creates a reusable generator for `type_name` with base overrides.
	pub fn make_generator(&self, type_name: impl Into<String>, base: Overrides) -> GeneratorHandle {
		GeneratorHandle::new(self.clone(), type_name, base)
	}

	/// Runs one generation without post-processing.
	pub(crate) async fn build(&self, type_name: &str, overrides: &Overrides) -> KinResult<Generated> {
		ModelBuilder::new(
			&self.inner.blueprints,
			self.inner.models.as_deref(),
			&self.inner.settings,
		)
		.generate(type_name, overrides)
		.await
	}

	pub(crate) fn post_steps(&self, type_name: &str) -> Steps {
		self.inner
			.post
			.read()
			.get(type_name)
			.cloned()
			.unwrap_or_default()
	}
}

impl fmt::Debug for Kin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Kin")
			.field("blueprints", &self.inner.blueprints.type_names())
			.field("settings", &self.inner.settings)
			.field("model_resolver", &self.inner.models.is_some())
			.finish()
	}
}

/// Builder for [`Kin`].
///
/// # Example
///
/// ```
/// use kin::{Concurrency, Kin, KinSettings, Model, ModelRegistry};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct User {
///     username: String,
/// }
///
/// impl Model for User {}
///
/// let models = ModelRegistry::new();
/// models.register::<User>("User");
///
/// let kin = Kin::builder()
///     .with_settings(KinSettings::new().with_concurrency(Concurrency::Concurrent))
///     .with_model_resolver(models)
///     .build();
///
/// assert_eq!(kin.settings().concurrency, Concurrency::Concurrent);
/// ```
#[derive(Default)]
pub struct KinBuilder {
	settings: KinSettings,
	models: Option<Arc<dyn ModelResolver>>,
}

impl KinBuilder {
	/// Creates a builder with default settings.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the engine settings.
	pub fn with_settings(mut self, settings: KinSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Sets the resolver used for blueprints that name their model.
	pub fn with_model_resolver(self, resolver: impl ModelResolver + 'static) -> Self {
		self.with_shared_model_resolver(Arc::new(resolver))
	}

	/// Sets a resolver that stays shared with the caller, e.g. a registry
	/// that keeps receiving models after the engine is built.
	pub fn with_shared_model_resolver(mut self, resolver: Arc<dyn ModelResolver>) -> Self {
		self.models = Some(resolver);
		self
	}

	/// Builds the engine.
	pub fn build(self) -> Kin {
		Kin {
			inner: Arc::new(KinInner {
				blueprints: BlueprintRegistry::new(),
				post: RwLock::new(HashMap::new()),
				models: self.models,
				settings: self.settings,
			}),
		}
	}
}
