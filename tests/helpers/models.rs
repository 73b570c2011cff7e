//! Shared test models and blueprints.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fake::Fake;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::Word;
use kin::{Blueprint, Generator, Kin, Model, ModelConstructor, ModelRegistry};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub username: String,
	pub email: String,
	#[serde(default)]
	pub tags: Vec<String>,
}

impl Model for User {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
	#[serde(rename = "_id")]
	pub id: String,
	pub title: String,
	pub owner: serde_json::Value,
}

impl Model for Stream {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
	pub verb: String,
	pub actor: serde_json::Value,
	pub streams: Vec<serde_json::Value>,
}

impl Model for Activity {}

/// Generator yielding one random word.
pub fn word() -> Generator {
	Generator::from_fn(|_| Ok(json!(Word().fake::<String>())))
}

/// Generator yielding a random username.
pub fn username() -> Generator {
	Generator::from_fn(|_| Ok(json!(Username().fake::<String>())))
}

/// Generator yielding a random identity key.
pub fn identity() -> Generator {
	Generator::from_fn(|_| Ok(json!(Uuid::new_v4().to_string())))
}

/// Generator counting its own invocations, starting at 1.
pub fn counter(calls: &Arc<AtomicUsize>) -> Generator {
	let calls = Arc::clone(calls);
	Generator::from_fn(move |_| Ok(json!(calls.fetch_add(1, Ordering::SeqCst) + 1)))
}

/// Generator whose email is derived from the sibling username.
pub fn email_from_username() -> Generator {
	Generator::new(|ctx| async move {
		let username: String = ctx.resolve_as("username").await?;
		Ok(json!(format!("{}@example.com", username.to_lowercase())))
	})
}

/// Blueprint for [`User`] with random data.
pub fn user_blueprint() -> Blueprint {
	Blueprint::new()
		.with_model(ModelConstructor::of::<User>())
		.with_generator("username", username())
		.with_generator("email", Generator::from_fn(|_| Ok(json!(SafeEmail().fake::<String>()))))
}

/// Model registry holding every test model under its short name.
pub fn model_registry() -> ModelRegistry {
	let registry = ModelRegistry::new();
	registry.register::<User>("User");
	registry.register::<Stream>("Stream");
	registry.register::<Activity>("Activity");
	registry
}

/// Engine resolving the test models by name.
pub fn kin_with_models() -> Kin {
	Kin::builder().with_model_resolver(model_registry()).build()
}
