//! Single-generation orchestration.

use std::fmt;

use crate::blueprint::{Blueprint, BlueprintRegistry, Overrides};
use crate::error::{KinError, KinResult};
use crate::model::{Instance, Model, ModelConstructor, ModelRef, ModelResolver, Properties};
use crate::resolve::{ContextGuard, PropertyLinker};
use crate::settings::KinSettings;

/// Result of one generation: the instance and its hidden-property metadata.
#[derive(Debug, Clone)]
pub struct Generated {
	/// Constructed model, or plain record if the blueprint declares no model.
	pub model: Instance,

	/// Hidden properties, keyed without their prefix.
	pub meta: Properties,
}

impl Generated {
	/// Creates a result from its parts.
	pub fn new(model: Instance, meta: Properties) -> Self {
		Self { model, meta }
	}

	/// Converts the generated instance into the concrete model `M`.
	pub fn into_model<M: Model>(self) -> KinResult<M> {
		self.model.into_model()
	}

	/// Splits the result into instance and metadata.
	pub fn into_parts(self) -> (Instance, Properties) {
		(self.model, self.meta)
	}
}

/// Stage of one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Blueprint looked up, model constructor resolved.
	Created,
	/// Blueprint and overrides being merged, counted keys expanded.
	Linking,
	/// Every property being forced.
	ResolvingProperties,
	/// Hidden properties being moved into metadata.
	PartitioningMetadata,
	/// Model being constructed.
	Instantiating,
	/// Post-processing pipeline running.
	PostProcessing,
	/// Generation completed and cached.
	Done,
	/// Generation failed.
	Failed,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Created => "created",
			Self::Linking => "linking",
			Self::ResolvingProperties => "resolving_properties",
			Self::PartitioningMetadata => "partitioning_metadata",
			Self::Instantiating => "instantiating",
			Self::PostProcessing => "post_processing",
			Self::Done => "done",
			Self::Failed => "failed",
		};
		f.write_str(name)
	}
}

/// Runs one generation of a registered blueprint.
///
/// Post-processing is not part of the builder; see
/// [`GeneratorHandle`](crate::GeneratorHandle).
pub struct ModelBuilder<'a> {
	blueprints: &'a BlueprintRegistry,
	models: Option<&'a dyn ModelResolver>,
	settings: &'a KinSettings,
}

impl<'a> ModelBuilder<'a> {
	/// Creates a builder over `blueprints`.
	pub fn new(
		blueprints: &'a BlueprintRegistry,
		models: Option<&'a dyn ModelResolver>,
		settings: &'a KinSettings,
	) -> Self {
		Self {
			blueprints,
			models,
			settings,
		}
	}

	/// Generates one `type_name` object with `overrides` applied.
	///
	/// # Errors
	///
	/// - [`KinError::NoType`] if `type_name` is empty.
	/// - [`KinError::UnknownBlueprint`] if nothing is registered under it.
	/// - [`KinError::InvalidModelReference`] if a named model cannot be resolved.
	/// - Any property resolution or construction error. No partial result
	///   is returned.
	pub async fn generate(&self, type_name: &str, overrides: &Overrides) -> KinResult<Generated> {
		if type_name.is_empty() {
			return Err(KinError::NoType);
		}
		let blueprint = self
			.blueprints
			.get(type_name)
			.ok_or_else(|| KinError::UnknownBlueprint(type_name.to_string()))?;
		let constructor = self.constructor(type_name, &blueprint)?;
		tracing::debug!(blueprint = %type_name, stage = %Stage::Created, "Generating");

		tracing::debug!(blueprint = %type_name, stage = %Stage::Linking, "Linking properties");
		let context = PropertyLinker::new(self.settings.concurrency)
			.link(&blueprint, overrides)
			.await
			.map(ContextGuard::new)
			.map_err(|e| failed(type_name, Stage::Linking, e))?;

		tracing::debug!(
			blueprint = %type_name,
			stage = %Stage::ResolvingProperties,
			keys = context.keys().len(),
			"Resolving properties"
		);
		context
			.resolve_all()
			.await
			.map_err(|e| failed(type_name, Stage::ResolvingProperties, e))?;
		let properties = context.take_resolved()?;
		drop(context);

		tracing::debug!(blueprint = %type_name, stage = %Stage::PartitioningMetadata, "Partitioning metadata");
		let (fields, meta) = self.partition(properties);

		let model = match constructor {
			Some(constructor) => {
				tracing::debug!(
					blueprint = %type_name,
					stage = %Stage::Instantiating,
					model = %constructor.name(),
					"Instantiating model"
				);
				constructor
					.construct(fields)
					.map_err(|e| failed(type_name, Stage::Instantiating, e))?
			}
			None => Instance::Record(fields),
		};
		Ok(Generated::new(model, meta))
	}

	fn constructor(&self, type_name: &str, blueprint: &Blueprint) -> KinResult<Option<ModelConstructor>> {
		match blueprint.model() {
			None => Ok(None),
			Some(ModelRef::Constructor(constructor)) => Ok(Some(constructor.clone())),
			Some(ModelRef::Named(name)) => self
				.models
				.and_then(|models| models.resolve_model(name))
				.map(Some)
				.ok_or_else(|| KinError::InvalidModelReference {
					blueprint: type_name.to_string(),
					model: name.clone(),
				}),
		}
	}

	/// Moves hidden keys into metadata under their un-prefixed names.
	fn partition(&self, properties: Properties) -> (Properties, Properties) {
		let mut fields = Properties::new();
		let mut meta = Properties::new();
		for (key, value) in properties {
			if self.settings.is_hidden(&key) {
				meta.insert(self.settings.metadata_key(&key).to_string(), value);
			} else {
				fields.insert(key, value);
			}
		}
		(fields, meta)
	}
}

fn failed(type_name: &str, stage: Stage, error: KinError) -> KinError {
	tracing::debug!(
		blueprint = %type_name,
		stage = %Stage::Failed,
		failed_during = %stage,
		error = %error,
		"Generation failed"
	);
	error
}
