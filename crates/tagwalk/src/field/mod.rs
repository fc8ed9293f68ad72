//! Field descriptors and the per-type descriptor caches.
//!
//! # Key types
//!
//! | Type | Meaning | Constructed in |
//! |---|---|---|
//! | [`FieldDescriptor`] | Static metadata of one field | `#[derive(Reflect)]` |
//! | [`StructDescriptor`] | Ordered fields of one type plus a name index | [`fields_of`] |
//! | [`TaggedFields`] | Fields resolved through one tag name | [`fields_with_tag`] |
//!
//! Both caches are process-wide, keyed by `TypeId` (and tag name), built on
//! first request and never evicted.

use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use rustc_hash::FxHashMap as HashMap;

use crate::cache::SnapshotCache;
use crate::reflect::{TypeInfo, Value, ValueRef};

pub mod tag;

/// Whether a field is part of the record's public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
	Exported,
	Private,
}

/// Immutable metadata about one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
	name: &'static str,
	visibility: Visibility,
	tag: &'static str,
	index: usize,
}

impl FieldDescriptor {
	pub const fn new(
		name: &'static str,
		visibility: Visibility,
		tag: &'static str,
		index: usize,
	) -> Self {
		Self {
			name,
			visibility,
			tag,
			index,
		}
	}

	/// Declared field name.
	#[inline]
	pub fn name(&self) -> &'static str {
		self.name
	}

	#[inline]
	pub fn visibility(&self) -> Visibility {
		self.visibility
	}

	#[inline]
	pub fn is_exported(&self) -> bool {
		self.visibility == Visibility::Exported
	}

	/// The raw annotation string.
	#[inline]
	pub fn tag(&self) -> &'static str {
		self.tag
	}

	/// Position among the reflected fields of the record.
	#[inline]
	pub fn index(&self) -> usize {
		self.index
	}
}

/// Ordered field list of one struct type.
pub struct StructDescriptor {
	type_name: &'static str,
	fields: &'static [FieldDescriptor],
	by_name: HashMap<&'static str, usize>,
}

impl StructDescriptor {
	fn build(info: TypeInfo) -> Self {
		let fields = info.fields();
		let by_name = fields.iter().map(|f| (f.name(), f.index())).collect();
		Self {
			type_name: info.type_name(),
			fields,
			by_name,
		}
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub fn fields(&self) -> &'static [FieldDescriptor] {
		self.fields
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.by_name.get(name).copied()
	}

	pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
		self.index_of(name).map(|i| &self.fields[i])
	}
}

impl fmt::Debug for StructDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StructDescriptor")
			.field("type_name", &self.type_name)
			.field("fields", &self.fields)
			.finish()
	}
}

impl PartialEq for StructDescriptor {
	fn eq(&self, other: &Self) -> bool {
		self.type_name == other.type_name && self.fields == other.fields
	}
}

/// Value and trailing argument of one tag, split at the first comma.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagValue {
	pub value: String,
	pub arg: String,
}

/// Returns the `name` tag of `field`, split into value and argument.
///
/// Panics if `name` is empty.
pub fn get_tag(field: &FieldDescriptor, name: &str) -> Option<TagValue> {
	assert!(!name.is_empty(), "get_tag: the tag name must not be empty");
	let raw = tag::lookup(field.tag(), name)?;
	let (value, arg) = tag::split_arg(&raw);
	Some(TagValue {
		value: value.to_owned(),
		arg: arg.to_owned(),
	})
}

/// A field resolved through a tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedField {
	/// The tag value when non-empty, the declared name otherwise.
	pub name: String,
	pub value: String,
	pub arg: String,
	pub descriptor: &'static FieldDescriptor,
}

impl TaggedField {
	pub fn index(&self) -> usize {
		self.descriptor.index()
	}
}

/// Fields of a type keyed by their resolved name, in declaration order.
pub type TaggedFields = IndexMap<String, TaggedField>;

static FIELDS: LazyLock<SnapshotCache<TypeId, Arc<StructDescriptor>>> =
	LazyLock::new(SnapshotCache::new);

static TAGGED: LazyLock<SnapshotCache<(TypeId, &'static str), Arc<TaggedFields>>> =
	LazyLock::new(SnapshotCache::new);

/// Returns the descriptor of a struct type, building it on first use.
pub fn fields_of(info: TypeInfo) -> Arc<StructDescriptor> {
	FIELDS.get_or_insert_with(info.type_id(), || {
		tracing::trace!(type_name = info.type_name(), "building struct descriptor");
		Arc::new(StructDescriptor::build(info))
	})
}

/// Returns the descriptor of `value`'s type.
///
/// Panics if `value` is not a struct.
pub fn fields_of_value(value: &dyn Value) -> Arc<StructDescriptor> {
	match value.reflect_ref() {
		ValueRef::Struct(s) => fields_of(s.info()),
		_ => panic!("fields_of_value: {} is not a struct type", value.type_name()),
	}
}

/// Returns the fields of a struct type resolved through the `tag` tag.
///
/// Fields whose tag value is `-` are left out. A field is keyed by its tag
/// value when that is non-empty, by its declared name otherwise.
///
/// Panics if `tag` is empty.
pub fn fields_with_tag(info: TypeInfo, tag: &'static str) -> Arc<TaggedFields> {
	assert!(!tag.is_empty(), "fields_with_tag: the tag must not be empty");
	TAGGED.get_or_insert_with((info.type_id(), tag), || {
		let mut fields = TaggedFields::with_capacity(info.fields().len());
		for descriptor in info.fields() {
			let TagValue { value, arg } = get_tag(descriptor, tag).unwrap_or_default();
			let name = match value.as_str() {
				"-" => continue,
				"" => descriptor.name().to_owned(),
				v => v.to_owned(),
			};
			fields.insert(
				name.clone(),
				TaggedField {
					name,
					value,
					arg,
					descriptor,
				},
			);
		}
		Arc::new(fields)
	})
}

#[cfg(test)]
mod tests;
