//! Reusable generators and post-processing.
//!
//! A [`GeneratorHandle`] is bound to one blueprint type and a set of base
//! overrides. Every generation it performs runs through two post-processing
//! pipelines, the type-level steps registered with [`Kin::post`] followed by
//! the handle's own steps, and is then appended to the handle's item cache.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::blueprint::Overrides;
use crate::builder::{Generated, Stage};
use crate::error::KinResult;
use crate::kin::Kin;

/// A step applied to every freshly generated result.
///
/// A step may mutate the model or its metadata. Returning an error skips the
/// remaining steps and fails the generation.
///
/// Async closures taking a [`Generated`] are post-processors:
///
/// ```
/// use kin::{Generated, PostProcessor};
///
/// fn assert_post_processor<P: PostProcessor>(_: P) {}
///
/// assert_post_processor(|mut generated: Generated| async move {
///     generated.meta.insert("seen".to_string(), true.into());
///     Ok::<_, kin::KinError>(generated)
/// });
/// ```
#[async_trait]
pub trait PostProcessor: Send + Sync {
	/// Processes one generated result.
	async fn process(&self, generated: Generated) -> KinResult<Generated>;
}

#[async_trait]
impl<F, Fut> PostProcessor for F
where
	F: Fn(Generated) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = KinResult<Generated>> + Send + 'static,
{
	async fn process(&self, generated: Generated) -> KinResult<Generated> {
		self(generated).await
	}
}

/// Ordered list of post-processing steps.
pub(crate) type Steps = Vec<Arc<dyn PostProcessor>>;

/// Threads `generated` through `steps` in order, stopping at the first error.
pub(crate) async fn run_pipeline(steps: &[Arc<dyn PostProcessor>], generated: Generated) -> KinResult<Generated> {
	let mut generated = generated;
	for (index, step) in steps.iter().enumerate() {
		generated = match step.process(generated).await {
			Ok(generated) => generated,
			Err(error) => {
				tracing::debug!(step = index, error = %error, "Post-processing step failed");
				return Err(error);
			}
		};
	}
	Ok(generated)
}

/// A reusable generator bound to one blueprint type.
///
/// Clones share the same steps and item cache.
///
/// # Example
///
/// ```
/// use kin::{Blueprint, Kin, Overrides};
///
/// # futures::executor::block_on(async {
/// let kin = Kin::new();
/// kin.define("User", Blueprint::new().with_value("username", "joe").with_value("role", "user"));
///
/// let admins = kin.make_generator("User", Overrides::new().with_value("role", "admin"));
/// let admin = admins.generate().await.unwrap();
///
/// assert_eq!(admin.model.get("role"), Some(serde_json::json!("admin")));
/// assert_eq!(admins.item_count(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct GeneratorHandle {
	kin: Kin,
	type_name: String,
	base: Overrides,
	post: Arc<RwLock<Steps>>,
	items: Arc<RwLock<Vec<Generated>>>,
}

impl GeneratorHandle {
	pub(crate) fn new(kin: Kin, type_name: impl Into<String>, base: Overrides) -> Self {
		Self {
			kin,
			type_name: type_name.into(),
			base,
			post: Arc::new(RwLock::new(Vec::new())),
			items: Arc::new(RwLock::new(Vec::new())),
		}
	}

	/// Appends a post-processing step for this handle.
	///
	/// Handle steps run after the type-level steps, in registration order.
	pub fn post(&self, step: impl PostProcessor + 'static) -> &Self {
		self.post.write().push(Arc::new(step));
		self
	}

	/// Generates one object with the base overrides.
	pub async fn generate(&self) -> KinResult<Generated> {
		self.generate_with(Overrides::new()).await
	}

	/// Generates one object with `overrides` merged over the base overrides.
	///
	/// Call-time values win on conflicting keys. The result is appended to
	/// the item cache only if every step succeeds.
	pub async fn generate_with(&self, overrides: Overrides) -> KinResult<Generated> {
		let overrides = self.base.merged(&overrides);
		let generated = self.kin.build(&self.type_name, &overrides).await?;

		let steps: Steps = self
			.kin
			.post_steps(&self.type_name)
			.into_iter()
			.chain(self.post.read().iter().cloned())
			.collect();
		tracing::debug!(
			blueprint = %self.type_name,
			stage = %Stage::PostProcessing,
			steps = steps.len(),
			"Post-processing"
		);
		let generated = run_pipeline(&steps, generated).await.map_err(|error| {
			tracing::debug!(blueprint = %self.type_name, stage = %Stage::Failed, "Generation failed");
			error
		})?;

		self.items.write().push(generated.clone());
		tracing::debug!(blueprint = %self.type_name, stage = %Stage::Done, "Generated");
		Ok(generated)
	}

	/// Returns a new handle whose base overrides are these merged with
	/// `overrides`.
	///
	/// The new handle starts with a copy of this handle's steps and an empty
	/// item cache of its own.
	pub fn bind(&self, overrides: Overrides) -> GeneratorHandle {
		Self {
			kin: self.kin.clone(),
			type_name: self.type_name.clone(),
			base: self.base.merged(&overrides),
			post: Arc::new(RwLock::new(self.post.read().clone())),
			items: Arc::new(RwLock::new(Vec::new())),
		}
	}

	/// Returns every generated item, in completion order.
	pub fn items(&self) -> Vec<Generated> {
		self.items.read().clone()
	}

	/// Returns the number of generated items.
	pub fn item_count(&self) -> usize {
		self.items.read().len()
	}

	/// Returns the most recently generated item.
	pub fn last_item(&self) -> Option<Generated> {
		self.items.read().last().cloned()
	}

	/// Returns the blueprint type this handle generates.
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	/// Returns the base overrides.
	pub fn base_overrides(&self) -> &Overrides {
		&self.base
	}
}

impl std::fmt::Debug for GeneratorHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GeneratorHandle")
			.field("type_name", &self.type_name)
			.field("base", &self.base)
			.field("steps", &self.post.read().len())
			.field("items", &self.item_count())
			.finish()
	}
}
