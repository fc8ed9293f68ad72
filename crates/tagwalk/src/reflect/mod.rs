//! Introspection capability consumed by the walker.
//!
//! # Mental model
//!
//! * Every walkable value implements [`Value`] and reports one of four
//!   [`Kind`]s through [`Value::reflect_ref`] / [`Value::reflect_mut`].
//! * Records implement [`Struct`] (positional field access) and [`Typed`]
//!   (static field table). `#[derive(Reflect)]` generates all three.
//! * `Option<T>` and `Box<T>` are [`Pointer`]s, `Vec<T>` and `[T; N]` are
//!   [`Sequence`]s, everything else is a scalar.
//!
//! # Invariants
//!
//! * `Struct::field(i)` is `Some` for every `i` below the length of the
//!   type's field table, and `None` past it.
//! * `TypeInfo::fields` is the same static slice for every instance of a type.

use std::any::{Any, TypeId};
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::BoxError;
use crate::field::FieldDescriptor;
use crate::handler::Arg;

mod impls;
#[cfg(test)]
mod tests;

/// Coarse shape of a value, as far as the walker cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
	Struct,
	Pointer,
	Sequence,
	Scalar,
}

impl fmt::Display for Kind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Kind::Struct => "struct",
			Kind::Pointer => "pointer",
			Kind::Sequence => "sequence",
			Kind::Scalar => "scalar",
		})
	}
}

/// Borrowed, kind-specific view of a value.
pub enum ValueRef<'a> {
	Struct(&'a dyn Struct),
	Pointer(&'a dyn Pointer),
	Sequence(&'a dyn Sequence),
	Scalar(&'a dyn Value),
}

impl ValueRef<'_> {
	pub fn kind(&self) -> Kind {
		match self {
			ValueRef::Struct(_) => Kind::Struct,
			ValueRef::Pointer(_) => Kind::Pointer,
			ValueRef::Sequence(_) => Kind::Sequence,
			ValueRef::Scalar(_) => Kind::Scalar,
		}
	}
}

/// Mutably borrowed, kind-specific view of a value.
pub enum ValueMut<'a> {
	Struct(&'a mut dyn Struct),
	Pointer(&'a mut dyn Pointer),
	Sequence(&'a mut dyn Sequence),
	Scalar(&'a mut dyn Value),
}

/// A dynamically inspectable value.
pub trait Value: Any {
	fn reflect_ref(&self) -> ValueRef<'_>;

	fn reflect_mut(&mut self) -> ValueMut<'_>;

	fn kind(&self) -> Kind {
		self.reflect_ref().kind()
	}

	fn type_name(&self) -> &'static str {
		std::any::type_name::<Self>()
	}

	/// Whether the value equals the zero value of its type.
	fn is_zero(&self) -> bool;

	/// An owned copy, for types that support one.
	fn clone_value(&self) -> Option<Box<dyn Value>> {
		None
	}

	/// Assigns `other` to `self` when both have the same concrete type.
	///
	/// Returns `false` on a type mismatch or when the type does not support
	/// assignment.
	fn set_from(&mut self, _other: &dyn Value) -> bool {
		false
	}

	fn as_setter(&mut self) -> Option<&mut dyn Setter> {
		None
	}

	fn as_format_setter(&mut self) -> Option<&mut dyn FormatSetter> {
		None
	}
}

impl dyn Value {
	pub fn is<T: Any>(&self) -> bool {
		(self as &dyn Any).is::<T>()
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		(self as &dyn Any).downcast_ref::<T>()
	}

	pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
		(self as &mut dyn Any).downcast_mut::<T>()
	}
}

impl fmt::Debug for dyn Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Value<{}>({})", self.type_name(), self.kind())
	}
}

/// A record with a fixed, ordered set of fields.
pub trait Struct: Value {
	fn info(&self) -> TypeInfo;

	fn field(&self, index: usize) -> Option<&dyn Value>;

	fn field_mut(&mut self, index: usize) -> Option<&mut dyn Value>;

	/// Looks a field up by its declared name.
	fn field_by_name(&self, name: &str) -> Option<&dyn Value> {
		let desc = crate::field::fields_of(self.info());
		self.field(desc.index_of(name)?)
	}
}

/// Static type metadata of a [`Struct`].
pub trait Typed: Struct + Sized {
	fn type_info() -> TypeInfo;
}

/// A value that may refer to another value.
pub trait Pointer: Value {
	fn pointee(&self) -> Option<&dyn Value>;

	fn pointee_mut(&mut self) -> Option<&mut dyn Value>;

	/// Returns the pointee, allocating a default one first when nil.
	fn alloc(&mut self) -> &mut dyn Value;

	fn is_nil(&self) -> bool {
		self.pointee().is_none()
	}
}

/// An indexable run of values of one type.
pub trait Sequence: Value {
	fn len(&self) -> usize;

	fn get(&self, index: usize) -> Option<&dyn Value>;

	fn get_mut(&mut self, index: usize) -> Option<&mut dyn Value>;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Assignment from a parsed tag argument.
pub trait Setter {
	fn set(&mut self, arg: &Arg) -> Result<(), BoxError>;
}

/// Assignment from a format string.
pub trait FormatSetter {
	fn set_format(&mut self, format: &str) -> Result<(), BoxError>;
}

/// Identity and field table of a struct type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
	type_id: TypeId,
	type_name: &'static str,
	fields: &'static [FieldDescriptor],
}

impl TypeInfo {
	pub fn new<T: Any>(fields: &'static [FieldDescriptor]) -> Self {
		Self {
			type_id: TypeId::of::<T>(),
			type_name: std::any::type_name::<T>(),
			fields,
		}
	}

	#[inline]
	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	#[inline]
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	#[inline]
	pub fn fields(&self) -> &'static [FieldDescriptor] {
		self.fields
	}
}

impl fmt::Debug for TypeInfo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypeInfo")
			.field("type_name", &self.type_name)
			.field("fields", &self.fields.len())
			.finish()
	}
}

/// Seconds from 0001-01-01T00:00:00Z to the unix epoch.
const ZERO_TIME_OFFSET: i64 = -62_135_596_800;

/// The zero instant, January 1 of year 1 UTC.
///
/// A `DateTime<Utc>` is zero only at this instant. The unix epoch, which is
/// what `DateTime::default()` returns, is an ordinary value.
pub fn zero_time() -> DateTime<Utc> {
	DateTime::from_timestamp(ZERO_TIME_OFFSET, 0).expect("year 1 is within the chrono range")
}

/// Dereferences one pointer level. Nil pointers yield `None`, non-pointers
/// yield themselves.
pub fn indirect(value: &dyn Value) -> Option<&dyn Value> {
	match value.reflect_ref() {
		ValueRef::Pointer(ptr) => ptr.pointee(),
		_ => Some(value),
	}
}

/// Mutable counterpart of [`indirect`].
pub fn indirect_mut(value: &mut dyn Value) -> Option<&mut dyn Value> {
	if value.kind() != Kind::Pointer {
		return Some(value);
	}
	match value.reflect_mut() {
		ValueMut::Pointer(ptr) => ptr.pointee_mut(),
		_ => None,
	}
}
