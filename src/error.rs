//! Error types for fixture generation.
//!
//! Every fallible operation in this crate reports a [`KinError`]. Errors are
//! fail-fast: a failed generation yields neither a model nor metadata.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while defining blueprints or generating fixtures.
///
/// `KinError` is `Clone` so that a single in-flight property resolution can
/// report the same failure to every sibling waiting on it.
#[derive(Debug, Clone, Error)]
pub enum KinError {
	/// Generation was requested with an empty type name.
	#[error("No type")]
	NoType,

	/// No blueprint was ever registered under the requested type.
	#[error("Unknown blueprint: {0}")]
	UnknownBlueprint(String),

	/// The blueprint names a model that cannot be resolved.
	#[error("Invalid model in {blueprint} blueprint: {model}")]
	InvalidModelReference {
		/// Blueprint declaring the model.
		blueprint: String,
		/// Model reference as declared.
		model: String,
	},

	/// A property was referenced that has no value at all.
	#[error("Property not defined: {0}")]
	UndefinedProperty(String),

	/// A property (directly or through siblings) depends on itself.
	#[error("Circular property dependency detected: {key}\n  Path: {path}")]
	CyclicDependency {
		/// Property whose resolution closed the cycle.
		key: String,
		/// Circular path (format: a -> b -> a).
		path: String,
	},

	/// The model constructor rejected the generated properties.
	#[error("Failed to construct {model}: {message}")]
	ModelConstruction {
		/// Model being constructed.
		model: String,
		/// Constructor error message.
		message: String,
	},

	/// Engine settings could not be loaded.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// A settings file could not be read.
	#[error("Failed to read settings from {}: {source}", path.display())]
	ConfigurationIo {
		/// File that was being read.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: Arc<io::Error>,
	},

	/// A caller-supplied generator or post-processing step failed.
	#[error("{0}")]
	GeneratorFailure(Arc<dyn StdError + Send + Sync>),
}

impl KinError {
	/// Wraps an error raised by a blueprint generator or post-processing step.
	///
	/// # Example
	///
	/// ```
	/// use kin::KinError;
	///
	/// let error = KinError::generator("database unavailable");
	/// assert_eq!(error.to_string(), "database unavailable");
	/// ```
	pub fn generator(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
		Self::GeneratorFailure(Arc::from(error.into()))
	}

	/// Returns true if this error came from caller-supplied code.
	pub fn is_generator_failure(&self) -> bool {
		matches!(self, Self::GeneratorFailure(_))
	}
}

/// Result type alias for fixture generation.
pub type KinResult<T> = Result<T, KinError>;
