//! Per-generation property arena.
//!
//! Every property slot of one generation lives in a [`Cell`]. A slot moves
//! from `Pending` to `Resolving` the first time it is demanded and to
//! `Resolved` when its generator completes, so each generator runs at most
//! once no matter how many dependents pull the value. A failed generator
//! puts the slot back to `Pending`.
//!
//! Cycles are caught two ways. Each [`Context`] carries the chain of keys
//! being resolved on its behalf, so a generator that demands a key already in
//! its own chain fails immediately. For resolutions that were started by an
//! unrelated chain (concurrent force pass), the arena keeps a waits-for table
//! of which key is blocked on which; a wait that would close a loop through
//! that table fails the same way.

use std::collections::{HashMap, HashSet};
use std::mem;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

use super::context::Context;
use super::link::evaluate_property;
use crate::blueprint::{Property, PropertyMap};
use crate::error::{KinError, KinResult};
use crate::model::Properties;
use crate::settings::Concurrency;

type SharedResolution = Shared<BoxFuture<'static, KinResult<Value>>>;

enum Cell {
	Pending(Property),
	Resolving(SharedResolution),
	Resolved(Value),
}

impl From<Property> for Cell {
	fn from(property: Property) -> Self {
		match property {
			Property::Literal(value) => Cell::Resolved(value),
			other => Cell::Pending(other),
		}
	}
}

#[derive(Default)]
struct ArenaState {
	cells: IndexMap<String, Cell>,
	/// Owner key -> keys whose in-flight resolution it is awaiting
	waits: HashMap<String, Vec<String>>,
}

/// Outcome of demanding one key.
pub(crate) enum Demand {
	Ready(Value),
	Wait(SharedResolution, Option<WaitGuard>),
}

pub(crate) struct Arena {
	state: Mutex<ArenaState>,
	concurrency: Concurrency,
}

impl Arena {
	pub(crate) fn new(properties: PropertyMap, concurrency: Concurrency) -> Self {
		let cells = properties
			.into_iter()
			.map(|(key, property)| (key, Cell::from(property)))
			.collect();
		Self {
			state: Mutex::new(ArenaState {
				cells,
				waits: HashMap::new(),
			}),
			concurrency,
		}
	}

	pub(crate) fn concurrency(&self) -> Concurrency {
		self.concurrency
	}

	/// Demands `key` on behalf of the resolution chain `path`.
	pub(crate) fn demand(self: &Arc<Self>, key: &str, path: &[String]) -> KinResult<Demand> {
		let mut guard = self.state.lock();
		let state = &mut *guard;

		let Some(cell) = state.cells.get_mut(key) else {
			return Err(KinError::UndefinedProperty(key.to_string()));
		};
		let shared = match &mut *cell {
			Cell::Resolved(value) => return Ok(Demand::Ready(value.clone())),
			Cell::Resolving(shared) => {
				if let Some(cycle) = cycle_path(&state.waits, key, path) {
					tracing::warn!(key = %key, path = %cycle, "Circular property dependency");
					return Err(KinError::CyclicDependency {
						key: key.to_string(),
						path: cycle,
					});
				}
				shared.clone()
			}
			Cell::Pending(property) => {
				let shared = self.start(key, property.clone(), path);
				*cell = Cell::Resolving(shared.clone());
				shared
			}
		};

		let wait = path.last().map(|owner| {
			state
				.waits
				.entry(owner.clone())
				.or_default()
				.push(key.to_string());
			WaitGuard {
				arena: Arc::clone(self),
				owner: owner.clone(),
				key: key.to_string(),
			}
		});
		Ok(Demand::Wait(shared, wait))
	}

	fn start(self: &Arc<Self>, key: &str, property: Property, path: &[String]) -> SharedResolution {
		let mut child_path = path.to_vec();
		child_path.push(key.to_string());
		let context = Context::child(Arc::clone(self), child_path);
		let arena = Arc::clone(self);
		let key = key.to_string();

		async move {
			tracing::trace!(key = %key, "Resolving property");
			let result = match &property {
				Property::Literal(value) => Ok(value.clone()),
				Property::Generator(generator) => generator.invoke(context).await,
				Property::Counted { generator, count } => evaluate_property(&context, generator, *count)
					.await
					.map(Value::Array),
			};
			arena.settle(&key, property, &result);
			result
		}
		.boxed()
		.shared()
	}

	fn settle(&self, key: &str, property: Property, result: &KinResult<Value>) {
		let previous = {
			let mut state = self.state.lock();
			match state.cells.get_mut(key) {
				Some(cell) => {
					let next = match result {
						Ok(value) => Cell::Resolved(value.clone()),
						Err(_) => Cell::Pending(property),
					};
					Some(mem::replace(cell, next))
				}
				None => None,
			}
		};
		drop(previous);
	}

	fn release(&self, owner: &str, key: &str) {
		let mut state = self.state.lock();
		if let Some(keys) = state.waits.get_mut(owner) {
			if let Some(pos) = keys.iter().position(|k| k == key) {
				keys.remove(pos);
			}
			if keys.is_empty() {
				state.waits.remove(owner);
			}
		}
	}

	pub(crate) fn keys(&self) -> Vec<String> {
		self.state.lock().cells.keys().cloned().collect()
	}

	pub(crate) fn contains(&self, key: &str) -> bool {
		self.state.lock().cells.contains_key(key)
	}

	pub(crate) fn peek(&self, key: &str) -> Option<Value> {
		match self.state.lock().cells.get(key) {
			Some(Cell::Resolved(value)) => Some(value.clone()),
			_ => None,
		}
	}

	pub(crate) fn resolved(&self) -> Properties {
		self.state
			.lock()
			.cells
			.iter()
			.filter_map(|(key, cell)| match cell {
				Cell::Resolved(value) => Some((key.clone(), value.clone())),
				_ => None,
			})
			.collect()
	}

	/// Takes every resolved value out of the arena, leaving it empty.
	pub(crate) fn take_resolved(&self) -> KinResult<Properties> {
		let cells = mem::take(&mut self.state.lock().cells);
		let mut properties = Properties::new();
		for (key, cell) in cells {
			match cell {
				Cell::Resolved(value) => {
					properties.insert(key, value);
				}
				_ => return Err(KinError::UndefinedProperty(key)),
			}
		}
		Ok(properties)
	}

	/// Drops every cell, including in-flight resolutions.
	pub(crate) fn clear(&self) {
		let (cells, waits) = {
			let mut state = self.state.lock();
			(mem::take(&mut state.cells), mem::take(&mut state.waits))
		};
		// In-flight futures may release wait edges when dropped
		drop(cells);
		drop(waits);
	}
}

/// Wait-for edge from an owner key to the key it awaits. Removed on drop.
pub(crate) struct WaitGuard {
	arena: Arc<Arena>,
	owner: String,
	key: String,
}

impl Drop for WaitGuard {
	fn drop(&mut self) {
		self.arena.release(&self.owner, &self.key);
	}
}

/// Returns the cycle closed by `path` waiting on `key`, formatted as
/// `a -> b -> a`, or `None` if the wait is safe.
fn cycle_path(waits: &HashMap<String, Vec<String>>, key: &str, path: &[String]) -> Option<String> {
	if let Some(start) = path.iter().position(|k| k == key) {
		let mut cycle: Vec<&str> = path[start..].iter().map(String::as_str).collect();
		cycle.push(key);
		return Some(cycle.join(" -> "));
	}

	let mut trail = vec![key.to_string()];
	let mut visited = HashSet::new();
	visited.insert(key.to_string());
	let start = reach_path(waits, key, path, &mut visited, &mut trail)?;
	let cycle: Vec<&str> = path[start..]
		.iter()
		.chain(trail.iter())
		.map(String::as_str)
		.collect();
	Some(cycle.join(" -> "))
}

/// Follows wait edges from `from` until one lands on a key in `path`.
fn reach_path(
	waits: &HashMap<String, Vec<String>>,
	from: &str,
	path: &[String],
	visited: &mut HashSet<String>,
	trail: &mut Vec<String>,
) -> Option<usize> {
	for next in waits.get(from).into_iter().flatten() {
		if let Some(start) = path.iter().position(|k| k == next) {
			trail.push(next.clone());
			return Some(start);
		}
		if visited.insert(next.clone()) {
			trail.push(next.clone());
			if let Some(start) = reach_path(waits, next, path, visited, trail) {
				return Some(start);
			}
			trail.pop();
		}
	}
	None
}
