//! Blueprints and override sets.
//!
//! A [`Blueprint`] is a named template describing how to produce one kind of
//! object: an ordered map from property key to [`Property`], plus an optional
//! model reference used to instantiate the result. [`Overrides`] have the
//! same shape and take precedence over the blueprint for a single generation.

mod property;
mod registry;

pub use property::{Generator, GeneratorFuture, Property};
pub use registry::BlueprintRegistry;

use indexmap::IndexMap;
use serde_json::Value;

use crate::model::{ModelRef, Properties};
use crate::resolve::random_between;

/// Ordered map of property slots.
pub type PropertyMap = IndexMap<String, Property>;

/// A named template describing how to produce one kind of object.
///
/// # Example
///
/// ```
/// use kin::{Blueprint, Generator};
/// use serde_json::json;
///
/// let blueprint = Blueprint::new()
///     .with_model("User")
///     .with_value("username", "joe")
///     .with_generator("email", Generator::from_fn(|_| Ok(json!("joe@example.com"))));
///
/// assert_eq!(blueprint.len(), 2);
/// assert!(blueprint.model().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Blueprint {
	model: Option<ModelRef>,
	properties: PropertyMap,
}

impl Blueprint {
	/// Creates an empty blueprint producing plain records.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the model constructor, either directly or by registered name.
	pub fn with_model(mut self, model: impl Into<ModelRef>) -> Self {
		self.model = Some(model.into());
		self
	}

	/// Declares a property slot.
	pub fn with_property(mut self, key: impl Into<String>, property: impl Into<Property>) -> Self {
		self.properties.insert(key.into(), property.into());
		self
	}

	/// Declares a literal property.
	pub fn with_value(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.with_property(key, Property::Literal(value.into()))
	}

	/// Declares a generated property.
	pub fn with_generator(self, key: impl Into<String>, generator: Generator) -> Self {
		self.with_property(key, Property::Generator(generator))
	}

	/// Returns the declared model reference.
	pub fn model(&self) -> Option<&ModelRef> {
		self.model.as_ref()
	}

	/// Returns the property declared under `key`.
	pub fn get(&self, key: &str) -> Option<&Property> {
		self.properties.get(key)
	}

	/// Returns the declared properties in declaration order.
	pub fn properties(&self) -> &PropertyMap {
		&self.properties
	}

	/// Returns the declared keys in declaration order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.properties.keys().map(String::as_str)
	}

	/// Returns the number of declared properties.
	pub fn len(&self) -> usize {
		self.properties.len()
	}

	/// Returns true if no properties are declared.
	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}
}

/// Caller-supplied values that take precedence over a blueprint.
///
/// A non-negative integer override for a key the blueprint declares as a
/// generator requests that many independent invocations of the generator.
/// A `null` override for a declared key counts as no override at all; for a
/// key the blueprint does not declare it is passed through as `null`.
///
/// # Example
///
/// ```
/// use kin::Overrides;
///
/// let overrides = Overrides::new()
///     .with_value("username", "bill")
///     .with_count("tags", 5);
///
/// assert_eq!(overrides.get("tags").and_then(|p| p.as_count()), Some(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	properties: PropertyMap,
}

impl Overrides {
	/// Creates an empty override set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides a slot with any property.
	pub fn with_property(mut self, key: impl Into<String>, property: impl Into<Property>) -> Self {
		self.properties.insert(key.into(), property.into());
		self
	}

	/// Overrides a slot with a literal.
	pub fn with_value(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.with_property(key, Property::Literal(value.into()))
	}

	/// Overrides a slot with a generator.
	pub fn with_generator(self, key: impl Into<String>, generator: Generator) -> Self {
		self.with_property(key, Property::Generator(generator))
	}

	/// Requests `count` invocations of the blueprint generator for `key`.
	pub fn with_count(self, key: impl Into<String>, count: usize) -> Self {
		self.with_value(key, count)
	}

	/// Requests a random number of invocations in `[min, max]`.
	///
	/// The count is drawn immediately; a `max` below `min` yields zero.
	pub fn with_count_between(self, key: impl Into<String>, min: usize, max: usize) -> Self {
		self.with_count(key, random_between(min, max))
	}

	/// Returns the override for `key`.
	pub fn get(&self, key: &str) -> Option<&Property> {
		self.properties.get(key)
	}

	/// Returns true if `key` is overridden.
	pub fn contains_key(&self, key: &str) -> bool {
		self.properties.contains_key(key)
	}

	/// Returns the overrides in insertion order.
	pub fn properties(&self) -> &PropertyMap {
		&self.properties
	}

	/// Returns the number of overridden keys.
	pub fn len(&self) -> usize {
		self.properties.len()
	}

	/// Returns true if nothing is overridden.
	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}

	/// Shallow-merges `other` on top of these overrides; `other` wins.
	pub fn merged(&self, other: &Overrides) -> Overrides {
		let mut properties = self.properties.clone();
		for (key, property) in &other.properties {
			properties.insert(key.clone(), property.clone());
		}
		Overrides { properties }
	}
}

impl From<Properties> for Overrides {
	fn from(values: Properties) -> Self {
		values
			.into_iter()
			.map(|(key, value)| (key, Property::Literal(value)))
			.collect()
	}
}

impl<K: Into<String>> FromIterator<(K, Property)> for Overrides {
	fn from_iter<I: IntoIterator<Item = (K, Property)>>(iter: I) -> Self {
		Overrides {
			properties: iter.into_iter().map(|(k, p)| (k.into(), p)).collect(),
		}
	}
}
