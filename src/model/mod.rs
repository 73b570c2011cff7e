//! Models produced by generation.
//!
//! A blueprint without a model reference yields a plain [`Instance::Record`].
//! A blueprint with one yields an [`Instance::Model`] built by a
//! [`ModelConstructor`] from the non-hidden generated properties.

mod registry;

pub use registry::{ModelRegistry, ModelResolver};

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{KinError, KinResult};

/// Resolved property values, in key order.
pub type Properties = Map<String, Value>;

/// A type that can be instantiated from generated properties.
///
/// The default constructor deserializes the property map; override
/// [`Model::from_properties`] to run custom construction logic.
///
/// # Example
///
/// ```
/// use kin::Model;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct User {
///     username: String,
/// }
///
/// impl Model for User {}
///
/// assert_eq!(User::model_name(), "User");
/// ```
pub trait Model: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
	/// Returns the model name used in errors and logs.
	fn model_name() -> &'static str {
		let full = std::any::type_name::<Self>();
		full.rsplit("::").next().unwrap_or(full)
	}

	/// Builds the model from its generated properties.
	fn from_properties(properties: Properties) -> KinResult<Self> {
		serde_json::from_value(Value::Object(properties)).map_err(|e| KinError::ModelConstruction {
			model: <Self as Model>::model_name().to_string(),
			message: e.to_string(),
		})
	}
}

/// Object-safe view of a [`Model`].
pub trait AnyModel: Any + Send + Sync + fmt::Debug {
	/// Returns the model name.
	fn model_name(&self) -> &'static str;

	/// Returns the model as an Any reference for downcasting.
	fn as_any(&self) -> &dyn Any;

	/// Returns the model as a mutable Any reference for downcasting.
	fn as_any_mut(&mut self) -> &mut dyn Any;

	/// Converts the boxed model into a boxed Any.
	fn into_any(self: Box<Self>) -> Box<dyn Any>;

	/// Serializes the model.
	fn to_value(&self) -> KinResult<Value>;

	/// Clones the model behind a new box.
	fn clone_boxed(&self) -> Box<dyn AnyModel>;
}

impl<M: Model> AnyModel for M {
	fn model_name(&self) -> &'static str {
		<M as Model>::model_name()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn into_any(self: Box<Self>) -> Box<dyn Any> {
		self
	}

	fn to_value(&self) -> KinResult<Value> {
		serde_json::to_value(self).map_err(|e| KinError::ModelConstruction {
			model: <M as Model>::model_name().to_string(),
			message: e.to_string(),
		})
	}

	fn clone_boxed(&self) -> Box<dyn AnyModel> {
		Box::new(self.clone())
	}
}

/// The object produced by one generation.
#[derive(Debug)]
pub enum Instance {
	/// Plain resolved record (blueprint declared no model).
	Record(Properties),

	/// Instantiated model.
	Model(Box<dyn AnyModel>),
}

impl Clone for Instance {
	fn clone(&self) -> Self {
		match self {
			Self::Record(properties) => Self::Record(properties.clone()),
			Self::Model(model) => Self::Model(model.clone_boxed()),
		}
	}
}

impl Instance {
	/// Returns true for a plain record.
	pub fn is_record(&self) -> bool {
		matches!(self, Self::Record(_))
	}

	/// Returns the model name, or `None` for a plain record.
	pub fn model_name(&self) -> Option<&'static str> {
		match self {
			Self::Record(_) => None,
			Self::Model(model) => Some(model.model_name()),
		}
	}

	/// Returns true if this is an instance of `M`.
	pub fn is<M: Model>(&self) -> bool {
		self.downcast_ref::<M>().is_some()
	}

	/// Downcasts to a concrete model.
	pub fn downcast_ref<M: Model>(&self) -> Option<&M> {
		match self {
			Self::Model(model) => model.as_any().downcast_ref::<M>(),
			Self::Record(_) => None,
		}
	}

	/// Mutably downcasts to a concrete model.
	pub fn downcast_mut<M: Model>(&mut self) -> Option<&mut M> {
		match self {
			Self::Model(model) => model.as_any_mut().downcast_mut::<M>(),
			Self::Record(_) => None,
		}
	}

	/// Returns the record, if this is a plain record.
	pub fn as_record(&self) -> Option<&Properties> {
		match self {
			Self::Record(properties) => Some(properties),
			Self::Model(_) => None,
		}
	}

	/// Returns the mutable record, if this is a plain record.
	pub fn as_record_mut(&mut self) -> Option<&mut Properties> {
		match self {
			Self::Record(properties) => Some(properties),
			Self::Model(_) => None,
		}
	}

	/// Returns one property of the instance.
	pub fn get(&self, key: &str) -> Option<Value> {
		match self {
			Self::Record(properties) => properties.get(key).cloned(),
			Self::Model(model) => model.to_value().ok()?.get(key).cloned(),
		}
	}

	/// Serializes the instance, e.g. to embed it in a parent property.
	pub fn to_value(&self) -> KinResult<Value> {
		match self {
			Self::Record(properties) => Ok(Value::Object(properties.clone())),
			Self::Model(model) => model.to_value(),
		}
	}

	/// Converts the instance into the concrete model `M`.
	///
	/// A model instance of another type is rejected; a plain record is
	/// constructed through [`Model::from_properties`].
	pub fn into_model<M: Model>(self) -> KinResult<M> {
		match self {
			Self::Record(properties) => M::from_properties(properties),
			Self::Model(model) => {
				let found = model.model_name();
				model
					.into_any()
					.downcast::<M>()
					.map(|model| *model)
					.map_err(|_| KinError::ModelConstruction {
						model: <M as Model>::model_name().to_string(),
						message: format!("instance is a {}", found),
					})
			}
		}
	}
}

type ConstructFn = dyn Fn(Properties) -> KinResult<Box<dyn AnyModel>> + Send + Sync;

/// Builds a model from generated properties.
#[derive(Clone)]
pub struct ModelConstructor {
	name: String,
	construct: Arc<ConstructFn>,
}

impl ModelConstructor {
	/// Constructor using [`Model::from_properties`].
	pub fn of<M: Model>() -> Self {
		Self {
			name: <M as Model>::model_name().to_string(),
			construct: Arc::new(|properties| {
				M::from_properties(properties).map(|model| Box::new(model) as Box<dyn AnyModel>)
			}),
		}
	}

	/// Constructor using a custom function.
	pub fn new<M, F>(name: impl Into<String>, f: F) -> Self
	where
		M: Model,
		F: Fn(Properties) -> KinResult<M> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			construct: Arc::new(move |properties| {
				f(properties).map(|model| Box::new(model) as Box<dyn AnyModel>)
			}),
		}
	}

	/// Returns the constructor name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Instantiates the model with `properties` as its sole argument.
	pub fn construct(&self, properties: Properties) -> KinResult<Instance> {
		(self.construct)(properties).map(Instance::Model)
	}
}

impl fmt::Debug for ModelConstructor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelConstructor")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Model declared by a blueprint.
#[derive(Debug, Clone)]
pub enum ModelRef {
	/// Direct constructor reference.
	Constructor(ModelConstructor),

	/// Name resolved through a [`ModelResolver`] at generation time.
	Named(String),
}

impl fmt::Display for ModelRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Constructor(constructor) => f.write_str(constructor.name()),
			Self::Named(name) => f.write_str(name),
		}
	}
}

impl From<ModelConstructor> for ModelRef {
	fn from(constructor: ModelConstructor) -> Self {
		Self::Constructor(constructor)
	}
}

impl From<&str> for ModelRef {
	fn from(name: &str) -> Self {
		Self::Named(name.to_string())
	}
}

impl From<String> for ModelRef {
	fn from(name: String) -> Self {
		Self::Named(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::Deserialize;
	use serde_json::json;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct User {
		username: String,
		#[serde(default)]
		email: Option<String>,
	}

	impl Model for User {}

	#[derive(Debug, Clone, Serialize, Deserialize)]
	struct Stream {
		title: String,
	}

	impl Model for Stream {
		fn model_name() -> &'static str {
			"feeds.Stream"
		}
	}

	fn props(value: Value) -> Properties {
		value.as_object().cloned().unwrap()
	}

	#[rstest]
	fn test_default_model_name_is_short_type_name() {
		assert_eq!(<User as Model>::model_name(), "User");
		assert_eq!(<Stream as Model>::model_name(), "feeds.Stream");
	}

	#[rstest]
	fn test_constructor_builds_model() {
		let constructor = ModelConstructor::of::<User>();

		let instance = constructor.construct(props(json!({"username": "joe"}))).unwrap();

		assert_eq!(instance.model_name(), Some("User"));
		assert!(instance.is::<User>());
		assert!(!instance.is::<Stream>());
		assert_eq!(instance.downcast_ref::<User>().unwrap().username, "joe");
	}

	#[rstest]
	fn test_constructor_reports_invalid_properties() {
		let constructor = ModelConstructor::of::<User>();

		let result = constructor.construct(props(json!({"email": "joe@example.com"})));

		assert!(matches!(
			result,
			Err(KinError::ModelConstruction { ref model, .. }) if model == "User"
		));
	}

	#[rstest]
	fn test_custom_constructor() {
		let constructor = ModelConstructor::new("User", |properties: Properties| {
			let mut user = User::from_properties(properties)?;
			user.email.get_or_insert_with(|| format!("{}@example.com", user.username));
			Ok(user)
		});

		let instance = constructor.construct(props(json!({"username": "joe"}))).unwrap();

		assert_eq!(
			instance.downcast_ref::<User>().unwrap().email.as_deref(),
			Some("joe@example.com")
		);
	}

	#[rstest]
	fn test_instance_get_and_mutation() {
		let mut instance = ModelConstructor::of::<User>()
			.construct(props(json!({"username": "joe"})))
			.unwrap();

		instance.downcast_mut::<User>().unwrap().username = "bill".to_string();

		assert_eq!(instance.get("username"), Some(json!("bill")));
		assert_eq!(instance.get("missing"), None);
	}

	#[rstest]
	fn test_record_into_model() {
		let instance = Instance::Record(props(json!({"username": "joe"})));

		let user: User = instance.into_model().unwrap();

		assert_eq!(user.username, "joe");
	}

	#[rstest]
	fn test_model_into_wrong_model_fails() {
		let instance = ModelConstructor::of::<User>()
			.construct(props(json!({"username": "joe"})))
			.unwrap();

		let result = instance.into_model::<Stream>();

		assert!(matches!(result, Err(KinError::ModelConstruction { .. })));
	}

	#[rstest]
	fn test_clone_is_deep() {
		let original = ModelConstructor::of::<User>()
			.construct(props(json!({"username": "joe"})))
			.unwrap();
		let mut copy = original.clone();

		copy.downcast_mut::<User>().unwrap().username = "bill".to_string();

		assert_eq!(original.get("username"), Some(json!("joe")));
	}

	#[rstest]
	fn test_model_ref_display() {
		assert_eq!(ModelRef::from("User").to_string(), "User");
		assert_eq!(ModelRef::from(ModelConstructor::of::<User>()).to_string(), "User");
	}
}
