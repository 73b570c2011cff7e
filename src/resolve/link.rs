//! Blueprint and override linking.

use futures::future;
use rand::Rng;
use serde_json::Value;

use super::context::{Context, ContextGuard};
use crate::blueprint::{Blueprint, Generator, Overrides, Property, PropertyMap};
use crate::error::KinResult;
use crate::settings::Concurrency;

/// Merges a blueprint with overrides into the property map of one generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyLinker {
	concurrency: Concurrency,
}

impl PropertyLinker {
	/// Creates a linker scheduling multiplicity batches with `concurrency`.
	pub fn new(concurrency: Concurrency) -> Self {
		Self { concurrency }
	}

	/// Merges `overrides` on top of `blueprint` without evaluating anything.
	///
	/// Blueprint keys come first in declaration order, followed by keys only
	/// the overrides define. An override wins over the blueprint value, except
	/// that a non-negative integer override for a generator key turns the key
	/// into a [`Property::Counted`] slot, and a `null` override leaves the
	/// declared property in place.
	///
	/// # Example
	///
	/// ```
	/// use kin::{Blueprint, Generator, Overrides, Property, PropertyLinker};
	/// use serde_json::json;
	///
	/// let blueprint = Blueprint::new()
	///     .with_value("username", "joe")
	///     .with_generator("tags", Generator::from_fn(|_| Ok(json!("rust"))));
	/// let overrides = Overrides::new()
	///     .with_value("username", "bill")
	///     .with_count("tags", 3)
	///     .with_value("manager", "alice");
	///
	/// let merged = PropertyLinker::merge(&blueprint, &overrides);
	///
	/// let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
	/// assert_eq!(keys, vec!["username", "tags", "manager"]);
	/// assert!(matches!(merged["tags"], Property::Counted { count: 3, .. }));
	/// ```
	pub fn merge(blueprint: &Blueprint, overrides: &Overrides) -> PropertyMap {
		let mut merged = PropertyMap::with_capacity(blueprint.len() + overrides.len());
		for (key, declared) in blueprint.properties() {
			let property = match overrides.get(key) {
				None => declared.clone(),
				Some(overridden) if overridden.as_literal().is_some_and(Value::is_null) => declared.clone(),
				Some(overridden) => match (declared.as_generator(), overridden.as_count()) {
					(Some(generator), Some(count)) => Property::counted(generator.clone(), count),
					_ => overridden.clone(),
				},
			};
			merged.insert(key.clone(), property);
		}
		for (key, overridden) in overrides.properties() {
			if !merged.contains_key(key) {
				merged.insert(key.clone(), overridden.clone());
			}
		}
		merged
	}

	/// Merges and builds the generation's context, expanding counted keys.
	///
	/// Counted keys are expanded eagerly in blueprint declaration order. If
	/// any invocation fails the whole link fails with that error and the
	/// partial results are discarded.
	pub async fn link(&self, blueprint: &Blueprint, overrides: &Overrides) -> KinResult<Context> {
		let merged = Self::merge(blueprint, overrides);
		let counted: Vec<String> = merged
			.iter()
			.filter(|(_, property)| matches!(property, Property::Counted { .. }))
			.map(|(key, _)| key.clone())
			.collect();

		let context = ContextGuard::new(Context::new(merged, self.concurrency));
		for key in &counted {
			context.resolve(key).await?;
		}
		Ok(context.into_inner())
	}
}

/// Invokes `generator` `count` independent times against `context`.
///
/// Results are returned in invocation order. Whether invocations are awaited
/// one after another or polled together follows the context's scheduling
/// mode. Any failing invocation fails the batch.
pub async fn evaluate_property(
	context: &Context,
	generator: &Generator,
	count: usize,
) -> KinResult<Vec<Value>> {
	tracing::trace!(
		key = context.current_key().unwrap_or_default(),
		count,
		"Evaluating counted property"
	);
	match context.concurrency() {
		Concurrency::Sequential => {
			let mut values = Vec::with_capacity(count);
			for _ in 0..count {
				values.push(generator.invoke(context.clone()).await?);
			}
			Ok(values)
		}
		Concurrency::Concurrent => {
			future::try_join_all((0..count).map(|_| generator.invoke(context.clone()))).await
		}
	}
}

/// Returns a random integer in `[min, max]`, or `0` if `max < min`.
///
/// # Example
///
/// ```
/// use kin::random_between;
///
/// assert_eq!(random_between(3, 3), 3);
/// assert_eq!(random_between(5, 2), 0);
/// assert!((1..=4).contains(&random_between(1, 4)));
/// ```
pub fn random_between(min: usize, max: usize) -> usize {
	if max < min {
		return 0;
	}
	rand::thread_rng().gen_range(min..=max)
}
