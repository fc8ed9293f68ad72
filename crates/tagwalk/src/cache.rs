//! Copy-on-write map with atomic snapshot publication.
//!
//! # Concurrency & ordering
//!
//! * Readers load the current `Arc` snapshot and never take a lock.
//! * Writers serialize on one mutex, re-check the snapshot after acquiring it,
//!   build a full copy with the new entry and publish it with a single store.
//! * A published snapshot is never mutated, so a reader cannot observe a
//!   half-built map.

use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

pub(crate) struct SnapshotCache<K, V> {
	snap: ArcSwap<HashMap<K, V>>,
	write: Mutex<()>,
}

impl<K, V> SnapshotCache<K, V>
where
	K: Eq + Hash + Clone,
	V: Clone,
{
	pub(crate) fn new() -> Self {
		Self {
			snap: ArcSwap::from_pointee(HashMap::default()),
			write: Mutex::new(()),
		}
	}

	#[inline]
	pub(crate) fn get(&self, key: &K) -> Option<V> {
		self.snap.load().get(key).cloned()
	}

	/// Returns the cached value for `key`, computing it with `make` on a miss.
	///
	/// `make` runs at most once per key, under the writer lock. If it panics
	/// nothing is published.
	pub(crate) fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
		if let Some(value) = self.get(&key) {
			return value;
		}

		let _guard = self.write.lock();
		if let Some(value) = self.get(&key) {
			return value;
		}

		let value = make();
		let mut next = HashMap::clone(&self.snap.load());
		next.insert(key, value.clone());
		self.snap.store(Arc::new(next));
		value
	}

	/// Drops every entry rejected by `keep`.
	pub(crate) fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) {
		let _guard = self.write.lock();
		let current = self.snap.load_full();
		if current.iter().all(|(k, v)| keep(k, v)) {
			return;
		}
		let next = current
			.iter()
			.filter(|(k, v)| keep(k, v))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect();
		self.snap.store(Arc::new(next));
	}

	pub(crate) fn len(&self) -> usize {
		self.snap.load().len()
	}

	/// Pins the current snapshot.
	#[cfg(test)]
	pub(crate) fn snapshot(&self) -> Arc<HashMap<K, V>> {
		self.snap.load_full()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::thread;

	use super::*;

	#[test]
	fn test_insert_publishes_new_snapshot() {
		let cache: SnapshotCache<u32, &'static str> = SnapshotCache::new();
		let before = cache.snapshot();

		assert_eq!(cache.get_or_insert_with(1, || "one"), "one");

		let after = cache.snapshot();
		assert!(!Arc::ptr_eq(&before, &after));
		assert!(before.is_empty(), "published snapshots are never mutated");
		assert_eq!(after.get(&1), Some(&"one"));
	}

	#[test]
	fn test_hit_does_not_republish() {
		let cache: SnapshotCache<u32, u32> = SnapshotCache::new();
		cache.get_or_insert_with(7, || 49);
		let before = cache.snapshot();

		assert_eq!(cache.get_or_insert_with(7, || unreachable!()), 49);
		assert!(Arc::ptr_eq(&before, &cache.snapshot()));
	}

	#[test]
	fn test_concurrent_misses_compute_once() {
		let cache: SnapshotCache<&'static str, usize> = SnapshotCache::new();
		let calls = AtomicUsize::new(0);

		thread::scope(|s| {
			for _ in 0..16 {
				s.spawn(|| {
					let v = cache.get_or_insert_with("key", || {
						calls.fetch_add(1, Ordering::SeqCst);
						42
					});
					assert_eq!(v, 42);
				});
			}
		});

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn test_panicking_make_publishes_nothing() {
		let cache: SnapshotCache<u32, u32> = SnapshotCache::new();
		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
			cache.get_or_insert_with(1, || panic!("boom"));
		}));
		assert!(result.is_err());
		assert_eq!(cache.len(), 0);
		assert_eq!(cache.get_or_insert_with(1, || 2), 2);
	}

	#[test]
	fn test_retain() {
		let cache: SnapshotCache<u32, u32> = SnapshotCache::new();
		for i in 0..4 {
			cache.get_or_insert_with(i, || i * 10);
		}
		cache.retain(|k, _| k % 2 == 0);
		assert_eq!(cache.len(), 2);
		assert_eq!(cache.get(&2), Some(20));
		assert_eq!(cache.get(&3), None);
	}
}
