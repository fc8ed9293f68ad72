//! Parsed-argument cache.
//!
//! Keyed by `(tag name, quoted value)` as written in the annotation, so every
//! field and instance sharing an identical pair shares one parse.

use crate::cache::SnapshotCache;
use crate::field::tag;
use crate::handler::{Arg, Handler};

pub(super) struct ArgCache {
	cache: SnapshotCache<(&'static str, &'static str), Arg>,
}

impl ArgCache {
	pub(super) fn new() -> Self {
		Self {
			cache: SnapshotCache::new(),
		}
	}

	/// Returns the parsed argument for one tag pair.
	///
	/// Panics if the value is not a valid quoted string or `handler` fails to
	/// parse it: the annotation itself is broken.
	pub(super) fn get(&self, handler: &dyn Handler, name: &'static str, quoted: &'static str) -> Arg {
		self.cache.get_or_insert_with((name, quoted), || {
			let value = tag::unquote(quoted)
				.unwrap_or_else(|err| panic!("invalid tag '{name}' value: {err}"));
			let arg = handler
				.parse(&value)
				.unwrap_or_else(|err| panic!("invalid tag '{name}' value '{value}': {err}"));
			tracing::debug!(tag = name, value = %value, "parsed tag argument");
			arg
		})
	}

	/// Drops the cached arguments of one tag name.
	pub(super) fn forget(&self, name: &str) {
		self.cache.retain(|(tag, _), _| *tag != name);
	}

	pub(super) fn len(&self) -> usize {
		self.cache.len()
	}
}
