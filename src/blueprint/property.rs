//! Property values and generators.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::error::KinResult;
use crate::resolve::Context;

/// Future produced by a single generator invocation.
pub type GeneratorFuture = BoxFuture<'static, KinResult<Value>>;

type GeneratorFn = dyn Fn(Context) -> GeneratorFuture + Send + Sync;

/// A zero-argument asynchronous value generator.
///
/// Each invocation receives a [`Context`] over the in-progress property map,
/// through which it can pull the resolved value of any sibling property.
/// Cloning a generator is cheap and shares the underlying closure.
///
/// # Example
///
/// ```
/// use kin::Generator;
/// use serde_json::json;
///
/// let email = Generator::new(|ctx| async move {
///     let username = ctx.resolve("username").await?;
///     Ok(json!(format!("{}@example.com", username.as_str().unwrap_or_default())))
/// });
/// # let _ = email;
/// ```
#[derive(Clone)]
pub struct Generator {
	inner: Arc<GeneratorFn>,
}

impl Generator {
	/// Creates a generator from an async closure.
	pub fn new<F, Fut>(f: F) -> Self
	where
		F: Fn(Context) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = KinResult<Value>> + Send + 'static,
	{
		Self {
			inner: Arc::new(move |ctx| f(ctx).boxed()),
		}
	}

	/// Creates a generator from a synchronous closure.
	///
	/// The closure only sees sibling values that are already resolved
	/// (see [`Context::peek`]); use [`Generator::new`] to force siblings.
	pub fn from_fn<F>(f: F) -> Self
	where
		F: Fn(&Context) -> KinResult<Value> + Send + Sync + 'static,
	{
		Self {
			inner: Arc::new(move |ctx| future::ready(f(&ctx)).boxed()),
		}
	}

	/// Runs one independent invocation against `context`.
	pub fn invoke(&self, context: Context) -> GeneratorFuture {
		(self.inner)(context)
	}

	/// Returns true if both handles share the same closure.
	pub fn ptr_eq(&self, other: &Generator) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for Generator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Generator").finish_non_exhaustive()
	}
}

/// One property slot of a blueprint or override set.
#[derive(Debug, Clone)]
pub enum Property {
	/// A fixed value, returned as-is.
	Literal(Value),

	/// A generator invoked once per generation.
	Generator(Generator),

	/// A generator invoked `count` independent times, collected in order.
	Counted {
		/// Generator to invoke.
		generator: Generator,
		/// Number of invocations.
		count: usize,
	},
}

impl Property {
	/// Creates a literal property.
	pub fn literal(value: impl Into<Value>) -> Self {
		Self::Literal(value.into())
	}

	/// Creates a counted property.
	pub fn counted(generator: Generator, count: usize) -> Self {
		Self::Counted { generator, count }
	}

	/// Returns the literal value, if this is a literal.
	pub fn as_literal(&self) -> Option<&Value> {
		match self {
			Self::Literal(value) => Some(value),
			_ => None,
		}
	}

	/// Returns the generator backing this property, if any.
	pub fn as_generator(&self) -> Option<&Generator> {
		match self {
			Self::Generator(generator) | Self::Counted { generator, .. } => Some(generator),
			Self::Literal(_) => None,
		}
	}

	/// Returns true for generator-backed properties.
	pub fn is_generator(&self) -> bool {
		self.as_generator().is_some()
	}

	/// Interprets a literal as a multiplicity: a non-negative integer.
	pub fn as_count(&self) -> Option<usize> {
		self.as_literal()
			.and_then(Value::as_u64)
			.and_then(|n| usize::try_from(n).ok())
	}
}

impl From<Value> for Property {
	fn from(value: Value) -> Self {
		Self::Literal(value)
	}
}

impl From<Generator> for Property {
	fn from(generator: Generator) -> Self {
		Self::Generator(generator)
	}
}
