//! Model registry for named model references.
//!
//! Blueprints can name their model instead of holding the constructor. The
//! name is resolved through a [`ModelResolver`] when the blueprint is
//! generated.

use std::any::TypeId;
use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Model, ModelConstructor};

/// Resolves a model name to its constructor.
///
/// Any `Fn(&str) -> Option<ModelConstructor>` closure is a resolver.
pub trait ModelResolver: Send + Sync {
	/// Returns the constructor registered under `name`.
	fn resolve_model(&self, name: &str) -> Option<ModelConstructor>;
}

impl<F> ModelResolver for F
where
	F: Fn(&str) -> Option<ModelConstructor> + Send + Sync,
{
	fn resolve_model(&self, name: &str) -> Option<ModelConstructor> {
		self(name)
	}
}

/// Registry mapping model names to constructors.
///
/// # Example
///
/// ```
/// use kin::{Model, ModelRegistry, ModelResolver};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct User {
///     username: String,
/// }
///
/// impl Model for User {}
///
/// let registry = ModelRegistry::new();
/// registry.register::<User>("auth.User");
///
/// assert!(registry.resolve_model("auth.User").is_some());
/// assert!(registry.resolve_model("auth.Group").is_none());
/// ```
#[derive(Debug, Default)]
pub struct ModelRegistry {
	constructors: RwLock<HashMap<String, ModelConstructor>>,
	type_names: RwLock<HashMap<TypeId, String>>,
}

impl ModelRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `M` under `name` using its default constructor.
	pub fn register<M: Model>(&self, name: impl Into<String>) {
		let name = name.into();
		self.type_names
			.write()
			.insert(TypeId::of::<M>(), name.clone());
		self.register_constructor(name, ModelConstructor::of::<M>());
	}

	/// Registers a custom constructor under `name`.
	pub fn register_constructor(&self, name: impl Into<String>, constructor: ModelConstructor) {
		let name = name.into();
		tracing::debug!(model = %name, constructor = %constructor.name(), "Registered model");
		self.constructors.write().insert(name, constructor);
	}

	/// Gets the constructor registered under `name`.
	pub fn get(&self, name: &str) -> Option<ModelConstructor> {
		self.constructors.read().get(name).cloned()
	}

	/// Returns the name `M` was registered under.
	pub fn name_of<M: Model>(&self) -> Option<String> {
		self.type_names.read().get(&TypeId::of::<M>()).cloned()
	}

	/// Checks if a constructor is registered under `name`.
	pub fn has(&self, name: &str) -> bool {
		self.constructors.read().contains_key(name)
	}

	/// Returns all registered model names.
	pub fn model_names(&self) -> Vec<String> {
		self.constructors.read().keys().cloned().collect()
	}

	/// Returns the number of registered models.
	pub fn len(&self) -> usize {
		self.constructors.read().len()
	}

	/// Returns true if no models are registered.
	pub fn is_empty(&self) -> bool {
		self.constructors.read().is_empty()
	}

	/// Clears all registered models.
	pub fn clear(&self) {
		self.constructors.write().clear();
		self.type_names.write().clear();
	}
}

impl ModelResolver for ModelRegistry {
	fn resolve_model(&self, name: &str) -> Option<ModelConstructor> {
		self.get(name)
	}
}
