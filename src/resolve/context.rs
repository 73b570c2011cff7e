//! Generator context.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use futures::future;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::arena::{Arena, Demand};
use crate::blueprint::PropertyMap;
use crate::error::{KinError, KinResult};
use crate::model::Properties;
use crate::settings::Concurrency;

/// Handle to the in-progress property map of one generation.
///
/// Every generator invocation receives a context. Through it a generator can
/// pull the value of any sibling property, whatever the declaration order:
/// the sibling is resolved on first demand and memoized for every later one.
///
/// # Example
///
/// ```
/// use kin::{Context, Generator, Property, PropertyMap};
/// use serde_json::json;
///
/// # futures::executor::block_on(async {
/// let mut properties = PropertyMap::new();
/// properties.insert(
///     "email".to_string(),
///     Property::from(Generator::new(|ctx| async move {
///         let username = ctx.resolve("username").await?;
///         Ok(json!(format!("{}@example.com", username.as_str().unwrap_or_default())))
///     })),
/// );
/// properties.insert("username".to_string(), Property::literal("joe"));
///
/// let context = Context::from_properties(properties);
/// assert_eq!(context.resolve("email").await.unwrap(), json!("joe@example.com"));
/// # });
/// ```
#[derive(Clone)]
pub struct Context {
	arena: Arc<Arena>,
	path: Vec<String>,
}

impl Context {
	/// Creates a detached context over `properties`.
	pub fn new(properties: PropertyMap, concurrency: Concurrency) -> Self {
		Self {
			arena: Arc::new(Arena::new(properties, concurrency)),
			path: Vec::new(),
		}
	}

	/// Creates a detached context over `properties` with sequential scheduling.
	pub fn from_properties(properties: PropertyMap) -> Self {
		Self::new(properties, Concurrency::default())
	}

	/// Creates a context with no properties.
	pub fn empty() -> Self {
		Self::from_properties(PropertyMap::new())
	}

	pub(crate) fn child(arena: Arc<Arena>, path: Vec<String>) -> Self {
		Self { arena, path }
	}

	/// Resolves the value of `key`, running its generator on first demand.
	///
	/// # Errors
	///
	/// - [`KinError::UndefinedProperty`] if `key` has no slot at all.
	/// - [`KinError::CyclicDependency`] if resolving `key` would wait on itself.
	/// - Any error returned by the generator, unchanged. The slot is left
	///   unresolved in that case.
	pub async fn resolve(&self, key: &str) -> KinResult<Value> {
		match self.arena.demand(key, &self.path)? {
			Demand::Ready(value) => Ok(value),
			Demand::Wait(shared, _wait) => shared.await,
		}
	}

	/// Resolves `key` and deserializes it into `T`.
	pub async fn resolve_as<T: DeserializeOwned>(&self, key: &str) -> KinResult<T> {
		let value = self.resolve(key).await?;
		serde_json::from_value(value).map_err(KinError::generator)
	}

	/// Resolves every key, in order, using the context's scheduling mode.
	pub async fn resolve_all(&self) -> KinResult<()> {
		let keys = self.keys();
		match self.concurrency() {
			Concurrency::Sequential => {
				for key in &keys {
					self.resolve(key).await?;
				}
			}
			Concurrency::Concurrent => {
				future::try_join_all(keys.iter().map(|key| self.resolve(key))).await?;
			}
		}
		Ok(())
	}

	/// Returns the value of `key` if it is already resolved, without running
	/// any generator.
	pub fn peek(&self, key: &str) -> Option<Value> {
		self.arena.peek(key)
	}

	/// Returns every key of the property map, blueprint keys first.
	pub fn keys(&self) -> Vec<String> {
		self.arena.keys()
	}

	/// Returns true if `key` has a slot.
	pub fn contains(&self, key: &str) -> bool {
		self.arena.contains(key)
	}

	/// Returns true if `key` is resolved.
	pub fn is_resolved(&self, key: &str) -> bool {
		self.peek(key).is_some()
	}

	/// Returns a snapshot of the properties resolved so far.
	pub fn resolved(&self) -> Properties {
		self.arena.resolved()
	}

	/// Returns the chain of keys being resolved on behalf of this context,
	/// outermost first. Empty for the context driving the generation.
	pub fn path(&self) -> &[String] {
		&self.path
	}

	/// Returns the key whose generator received this context.
	pub fn current_key(&self) -> Option<&str> {
		self.path.last().map(String::as_str)
	}

	/// Returns the scheduling mode of the generation.
	pub fn concurrency(&self) -> Concurrency {
		self.arena.concurrency()
	}

	pub(crate) fn take_resolved(&self) -> KinResult<Properties> {
		self.arena.take_resolved()
	}

	pub(crate) fn clear(&self) {
		self.arena.clear();
	}
}

/// Owns the context of one generation and clears its arena when dropped.
///
/// In-flight resolutions keep the arena alive, so a generation abandoned
/// mid-await would otherwise never release it.
pub(crate) struct ContextGuard {
	context: Context,
	armed: bool,
}

impl ContextGuard {
	pub(crate) fn new(context: Context) -> Self {
		Self {
			context,
			armed: true,
		}
	}

	/// Hands the context to the caller without clearing it.
	pub(crate) fn into_inner(mut self) -> Context {
		self.armed = false;
		self.context.clone()
	}
}

impl Deref for ContextGuard {
	type Target = Context;

	fn deref(&self) -> &Context {
		&self.context
	}
}

impl Drop for ContextGuard {
	fn drop(&mut self) {
		if self.armed {
			self.context.clear();
		}
	}
}

impl fmt::Debug for Context {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context")
			.field("path", &self.path)
			.field("keys", &self.keys())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::blueprint::{Generator, Property};
	use rstest::rstest;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn properties(entries: Vec<(&str, Property)>) -> PropertyMap {
		entries
			.into_iter()
			.map(|(key, property)| (key.to_string(), property))
			.collect()
	}

	#[rstest]
	#[tokio::test]
	async fn test_literal_resolves_without_invocation() {
		// Arrange
		let context = Context::from_properties(properties(vec![("username", Property::literal("joe"))]));

		// Act
		let value = context.resolve("username").await.unwrap();

		// Assert
		assert_eq!(value, json!("joe"));
		assert!(context.is_resolved("username"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_key_is_undefined() {
		// Arrange
		let context = Context::empty();

		// Act
		let result = context.resolve("username").await;

		// Assert
		assert!(matches!(result, Err(KinError::UndefinedProperty(key)) if key == "username"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_generator_result_is_memoized() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let context = Context::from_properties(properties(vec![(
			"count",
			Property::from(Generator::from_fn(move |_| {
				Ok(json!(counter.fetch_add(1, Ordering::SeqCst) + 1))
			})),
		)]));

		// Act
		let first = context.resolve("count").await.unwrap();
		let second = context.resolve("count").await.unwrap();

		// Assert
		assert_eq!(first, json!(1));
		assert_eq!(second, json!(1));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_generator_sees_its_key_on_path() {
		// Arrange
		let context = Context::from_properties(properties(vec![(
			"owner",
			Property::from(Generator::from_fn(|ctx| {
				Ok(json!(ctx.current_key().unwrap_or_default()))
			})),
		)]));

		// Act
		let value = context.resolve("owner").await.unwrap();

		// Assert
		assert_eq!(value, json!("owner"));
		assert!(context.path().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_generator_leaves_slot_unresolved() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let context = Context::from_properties(properties(vec![(
			"flaky",
			Property::from(Generator::from_fn(move |_| {
				if counter.fetch_add(1, Ordering::SeqCst) == 0 {
					Err(KinError::generator("first call fails"))
				} else {
					Ok(json!("ok"))
				}
			})),
		)]));

		// Act
		let first = context.resolve("flaky").await;
		let second = context.resolve("flaky").await;

		// Assert
		assert!(first.unwrap_err().is_generator_failure());
		assert_eq!(second.unwrap(), json!("ok"));
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_resolve_as_deserializes() {
		// Arrange
		let context = Context::from_properties(properties(vec![("tags", Property::literal(json!(["a", "b"])))]));

		// Act
		let tags: Vec<String> = context.resolve_as("tags").await.unwrap();

		// Assert
		assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_resolve_all_then_snapshot_in_key_order() {
		// Arrange
		let context = Context::from_properties(properties(vec![
			(
				"email",
				Property::from(Generator::new(|ctx| async move {
					let username: String = ctx.resolve_as("username").await?;
					Ok(json!(format!("{}@example.com", username)))
				})),
			),
			("username", Property::literal("joe")),
		]));

		// Act
		context.resolve_all().await.unwrap();

		// Assert
		let resolved = context.resolved();
		let keys: Vec<&String> = resolved.keys().collect();
		assert_eq!(keys, vec!["email", "username"]);
		assert_eq!(resolved["email"], json!("joe@example.com"));
	}
}
