//! The reflector: handler registry, parsed-argument cache and field walker.
//!
//! # Lifecycle
//!
//! 1. Setup: build a [`Reflector`] and register handlers (`&mut self`).
//! 2. Steady state: share it (`&self`) across threads and walk records
//!    concurrently. Only the argument cache changes, through atomic snapshot
//!    publication.
//!
//! # Failure modes
//!
//! * A handler's `run` error aborts the walk and is returned as
//!   [`Error::Field`](crate::Error::Field).
//! * A tag value its handler cannot `parse` panics on first dispatch.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use crate::handler::{Arg, Cursor, Handler, RunResult, Runner, SimpleRunner};
use crate::reflect::Value;

mod args;
mod walk;

use args::ArgCache;

/// Reserved tag name. `reflect:"-"` stops the walker from descending into
/// the field; the field's other handlers still run.
pub const STOP_TAG: &str = "reflect";

/// Dispatches handlers by the tags of struct fields.
pub struct Reflector {
	handlers: HashMap<Box<str>, Arc<dyn Handler>>,
	args: ArgCache,
	name_tag: Option<&'static str>,
}

impl Reflector {
	/// Creates a reflector with no handlers.
	pub fn new() -> Self {
		Self {
			handlers: HashMap::default(),
			args: ArgCache::new(),
			name_tag: None,
		}
	}

	/// Creates a reflector with the bundled `set`, `setfmt` and `default`
	/// handlers.
	pub fn with_builtins() -> Self {
		let mut reflector = Self::new();
		crate::handlers::install(&mut reflector);
		reflector
	}

	/// Binds `handler` to the tag `name`, replacing any previous binding.
	///
	/// Panics if `name` is empty.
	pub fn register(&mut self, name: impl Into<String>, handler: impl Handler + 'static) {
		self.register_arc(name, Arc::new(handler));
	}

	/// Same as [`register`](Self::register) for an already shared handler.
	pub fn register_arc(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
		let name: Box<str> = name.into().into_boxed_str();
		assert!(!name.is_empty(), "register: the handler name must not be empty");
		if &*name == STOP_TAG {
			tracing::warn!(
				tag = STOP_TAG,
				"handler registered under the reserved tag; `reflect:\"-\"` still stops recursion"
			);
		}

		self.args.forget(&name);
		tracing::debug!(tag = &*name, "registered tag handler");
		if self.handlers.insert(name.clone(), handler).is_some() {
			tracing::warn!(tag = &*name, "replaced an existing tag handler");
		}
	}

	/// Registers a function with the full `run` signature.
	pub fn register_runner<F>(&mut self, name: impl Into<String>, run: F)
	where
		F: Fn(&dyn Any, &mut Cursor<'_>, &Arg) -> RunResult + Send + Sync + 'static,
	{
		self.register(name, Runner(run));
	}

	/// Registers a function that only needs the field value and the argument.
	pub fn register_simple<F>(&mut self, name: impl Into<String>, run: F)
	where
		F: Fn(&mut dyn Value, &Arg) -> RunResult + Send + Sync + 'static,
	{
		self.register(name, SimpleRunner(run));
	}

	/// Removes the handler bound to `name`, if any.
	pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Handler>> {
		let removed = self.handlers.remove(name);
		if removed.is_some() {
			self.args.forget(name);
			tracing::debug!(tag = name, "unregistered tag handler");
		}
		removed
	}

	pub fn handler(&self, name: &str) -> Option<&Arc<dyn Handler>> {
		self.handlers.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.handlers.contains_key(name)
	}

	/// Registered tag names, in no particular order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.handlers.keys().map(|k| &**k)
	}

	/// Names failing fields in [`Error::Field`](crate::Error::Field) by their
	/// value under `tag`, such as `json`. Fields without a usable value (absent,
	/// empty or `-`) keep their declared name.
	///
	/// Panics if `tag` is empty.
	pub fn with_name_tag(mut self, tag: &'static str) -> Self {
		self.set_name_tag(Some(tag));
		self
	}

	pub fn set_name_tag(&mut self, tag: Option<&'static str>) {
		assert!(tag != Some(""), "set_name_tag: the tag name must not be empty");
		self.name_tag = tag;
	}

	pub fn name_tag(&self) -> Option<&'static str> {
		self.name_tag
	}

	/// Number of cached parsed arguments.
	pub fn cached_args(&self) -> usize {
		self.args.len()
	}
}

impl Default for Reflector {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Reflector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.names().collect();
		names.sort_unstable();
		f.debug_struct("Reflector")
			.field("handlers", &names)
			.field("cached_args", &self.cached_args())
			.field("name_tag", &self.name_tag)
			.finish()
	}
}
