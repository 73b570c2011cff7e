//! Blueprint registry.
//!
//! Stores named blueprints. Registration performs no validation of the
//! blueprint's shape; malformed blueprints surface as errors during
//! generation instead.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Blueprint;

/// Registry of named blueprints.
#[derive(Debug, Default)]
pub struct BlueprintRegistry {
	blueprints: RwLock<HashMap<String, Arc<Blueprint>>>,
}

impl BlueprintRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Defines and/or reads a blueprint.
	///
	/// If `definition` is supplied it is stored under `type_name`, replacing
	/// any prior definition. Always returns the definition now stored for
	/// `type_name`, or `None` if none was ever registered.
	///
	/// # Example
	///
	/// ```
	/// use kin::{Blueprint, BlueprintRegistry};
	///
	/// let registry = BlueprintRegistry::new();
	/// assert!(registry.blueprint("User", None).is_none());
	///
	/// registry.blueprint("User", Some(Blueprint::new().with_value("user", "tim")));
	/// assert_eq!(registry.blueprint("User", None).unwrap().len(), 1);
	/// ```
	pub fn blueprint(&self, type_name: &str, definition: Option<Blueprint>) -> Option<Arc<Blueprint>> {
		match definition {
			Some(definition) => Some(self.define(type_name, definition)),
			None => self.get(type_name),
		}
	}

	/// Stores `definition` under `type_name`, replacing any prior definition.
	pub fn define(&self, type_name: impl Into<String>, definition: Blueprint) -> Arc<Blueprint> {
		let type_name = type_name.into();
		let definition = Arc::new(definition);
		let previous = self
			.blueprints
			.write()
			.insert(type_name.clone(), Arc::clone(&definition));
		if previous.is_some() {
			tracing::warn!(blueprint = %type_name, "Replaced blueprint definition");
		} else {
			tracing::debug!(blueprint = %type_name, "Registered blueprint");
		}
		definition
	}

	/// Gets the blueprint registered under `type_name`.
	pub fn get(&self, type_name: &str) -> Option<Arc<Blueprint>> {
		self.blueprints.read().get(type_name).cloned()
	}

	/// Checks if a blueprint is registered under `type_name`.
	pub fn has(&self, type_name: &str) -> bool {
		self.blueprints.read().contains_key(type_name)
	}

	/// Returns all registered type names.
	pub fn type_names(&self) -> Vec<String> {
		self.blueprints.read().keys().cloned().collect()
	}

	/// Returns the number of registered blueprints.
	pub fn len(&self) -> usize {
		self.blueprints.read().len()
	}

	/// Returns true if no blueprints are registered.
	pub fn is_empty(&self) -> bool {
		self.blueprints.read().is_empty()
	}

	/// Removes every blueprint.
	pub fn clear(&self) {
		self.blueprints.write().clear();
	}
}
