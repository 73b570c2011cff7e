//! Engine settings.
//!
//! Settings control which keys are treated as hidden properties and how
//! independent units of work are scheduled. They can be built in code or
//! loaded from a TOML document:
//!
//! ```toml
//! hidden_prefix = "_"
//! identity_key = "_id"
//! concurrency = "concurrent"
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{KinError, KinResult};

/// How independent units of work within one generation are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concurrency {
	/// Properties and counted invocations are awaited one after another.
	#[default]
	Sequential,

	/// Properties and counted invocations are polled together on the
	/// current task. Results are still collected in invocation order.
	Concurrent,
}

/// Settings for a [`Kin`](crate::Kin) engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinSettings {
	/// Prefix marking a property as hidden. An empty prefix disables hiding.
	pub hidden_prefix: String,

	/// Key that starts with the hidden prefix but stays on the model.
	pub identity_key: String,

	/// Scheduling of the force pass and of multiplicity batches.
	pub concurrency: Concurrency,
}

impl Default for KinSettings {
	fn default() -> Self {
		Self {
			hidden_prefix: "_".to_string(),
			identity_key: "_id".to_string(),
			concurrency: Concurrency::Sequential,
		}
	}
}

impl KinSettings {
	/// Creates the default settings.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the hidden property prefix.
	pub fn with_hidden_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.hidden_prefix = prefix.into();
		self
	}

	/// Sets the identity key.
	pub fn with_identity_key(mut self, key: impl Into<String>) -> Self {
		self.identity_key = key.into();
		self
	}

	/// Sets the scheduling mode.
	pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
		self.concurrency = concurrency;
		self
	}

	/// Parses settings from a TOML document. Missing keys keep their defaults.
	///
	/// # Example
	///
	/// ```
	/// use kin::{Concurrency, KinSettings};
	///
	/// let settings = KinSettings::from_toml_str(r#"concurrency = "concurrent""#).unwrap();
	/// assert_eq!(settings.concurrency, Concurrency::Concurrent);
	/// assert_eq!(settings.hidden_prefix, "_");
	/// ```
	pub fn from_toml_str(source: &str) -> KinResult<Self> {
		toml::from_str(source).map_err(|e| KinError::Configuration(e.to_string()))
	}

	/// Reads settings from a TOML file.
	///
	/// # Errors
	///
	/// - [`KinError::ConfigurationIo`] if the file cannot be read.
	/// - [`KinError::Configuration`] if it is not valid settings TOML.
	pub fn from_path(path: &Path) -> KinResult<Self> {
		let source = std::fs::read_to_string(path).map_err(|e| KinError::ConfigurationIo {
			path: path.to_path_buf(),
			source: Arc::new(e),
		})?;
		Self::from_toml_str(&source)
	}

	/// Returns true if `key` is a hidden property under these settings.
	///
	/// # Example
	///
	/// ```
	/// use kin::KinSettings;
	///
	/// let settings = KinSettings::default();
	/// assert!(settings.is_hidden("_count"));
	/// assert!(!settings.is_hidden("_id"));
	/// assert!(!settings.is_hidden("count"));
	/// ```
	pub fn is_hidden(&self, key: &str) -> bool {
		!self.hidden_prefix.is_empty()
			&& key != self.identity_key
			&& key.starts_with(&self.hidden_prefix)
	}

	/// Returns the metadata name of a hidden key (the key without its prefix).
	pub fn metadata_key<'a>(&self, key: &'a str) -> &'a str {
		key.strip_prefix(self.hidden_prefix.as_str()).unwrap_or(key)
	}
}
