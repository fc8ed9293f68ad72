//! The two-phase handler contract.
//!
//! A [`Handler`] is bound to one tag name. `parse` turns the tag's raw value
//! into an [`Arg`] once per distinct value (the reflector memoizes it);
//! `run` is invoked on every dispatch with the live field behind a [`Cursor`].
//!
//! Adapters lift narrower function shapes into the contract:
//!
//! * [`Runner`] - the full `run` signature, identity `parse`
//! * [`SimpleRunner`] - only the field value and the argument
//! * [`FieldRunner`] - the field value, its descriptor and the argument
//! * [`FnHandler`] - separate `parse` and `run` functions

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::field::FieldDescriptor;
use crate::reflect::{Struct, Value, ValueMut, ValueRef};

/// Result of a handler's `run`.
pub type RunResult = Result<(), BoxError>;

/// A parsed tag argument, shared read-only between dispatches.
#[derive(Clone)]
pub struct Arg(Arc<dyn Any + Send + Sync>);

impl Arg {
	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self(Arc::new(value))
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref::<T>()
	}

	/// The argument as a string slice when it holds a `String`.
	pub fn as_str(&self) -> Option<&str> {
		self.downcast_ref::<String>().map(String::as_str)
	}

	pub fn ptr_eq(&self, other: &Arg) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl From<String> for Arg {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for Arg {
	fn from(value: &str) -> Self {
		Self::new(value.to_owned())
	}
}

impl fmt::Debug for Arg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.as_str() {
			Some(s) => f.debug_tuple("Arg").field(&s).finish(),
			None => f.write_str("Arg(..)"),
		}
	}
}

/// A pluggable field behavior.
pub trait Handler: Send + Sync {
	/// Pre-parses a raw tag value. Must be pure: the result is cached per
	/// `(tag name, raw value)` for the lifetime of the reflector.
	fn parse(&self, raw: &str) -> Result<Arg, BoxError> {
		Ok(Arg::from(raw))
	}

	fn run(&self, ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
	fn parse(&self, raw: &str) -> Result<Arg, BoxError> {
		(**self).parse(raw)
	}

	fn run(&self, ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		(**self).run(ctx, cursor, arg)
	}
}

impl<H: Handler + ?Sized> Handler for Box<H> {
	fn parse(&self, raw: &str) -> Result<Arg, BoxError> {
		(**self).parse(raw)
	}

	fn run(&self, ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		(**self).run(ctx, cursor, arg)
	}
}

/// One step from a value to a value nested in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	/// Field at this position of a struct.
	Field(usize),
	/// The pointee of a pointer.
	Deref,
	/// Element at this position of a sequence.
	Index(usize),
}

/// Walks `path` from `root`, returning `None` if a step does not apply.
pub fn resolve<'a>(root: &'a dyn Value, path: &[Step]) -> Option<&'a dyn Value> {
	path.iter().try_fold(root, |value, step| match (value.reflect_ref(), *step) {
		(ValueRef::Struct(s), Step::Field(i)) => s.field(i),
		(ValueRef::Pointer(p), Step::Deref) => p.pointee(),
		(ValueRef::Sequence(s), Step::Index(i)) => s.get(i),
		_ => None,
	})
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a>(root: &'a mut dyn Value, path: &[Step]) -> Option<&'a mut dyn Value> {
	path.iter().try_fold(root, |value, step| match (value.reflect_mut(), *step) {
		(ValueMut::Struct(s), Step::Field(i)) => s.field_mut(i),
		(ValueMut::Pointer(p), Step::Deref) => p.pointee_mut(),
		(ValueMut::Sequence(s), Step::Index(i)) => s.get_mut(i),
		_ => None,
	})
}

/// The field being dispatched, seen from the root of the walk.
///
/// The field may be read and written; the root may only be read.
pub struct Cursor<'w> {
	root: &'w mut dyn Struct,
	path: &'w [Step],
	field: &'static FieldDescriptor,
}

impl<'w> Cursor<'w> {
	/// `path` must resolve from `root`.
	pub(crate) fn new(
		root: &'w mut dyn Struct,
		path: &'w [Step],
		field: &'static FieldDescriptor,
	) -> Self {
		debug_assert!(resolve(&*root, path).is_some());
		Self { root, path, field }
	}

	/// The record passed to the walk.
	pub fn root(&self) -> &dyn Struct {
		&*self.root
	}

	pub fn value(&self) -> &dyn Value {
		resolve(&*self.root, self.path).expect("cursor path resolves from the walk root")
	}

	pub fn value_mut(&mut self) -> &mut dyn Value {
		resolve_mut(&mut *self.root, self.path).expect("cursor path resolves from the walk root")
	}

	pub fn field(&self) -> &'static FieldDescriptor {
		self.field
	}

	/// Steps from the root to this field.
	pub fn path(&self) -> &[Step] {
		self.path
	}
}

impl fmt::Debug for Cursor<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Cursor")
			.field("field", &self.field.name())
			.field("path", &self.path)
			.finish()
	}
}

/// Pre-parse function for [`FnHandler`].
pub type Parser = fn(&str) -> Result<Arg, BoxError>;

/// Adapts a function with the full `run` signature. `parse` is the identity.
#[derive(Clone, Copy)]
pub struct Runner<F>(pub F);

impl<F> Handler for Runner<F>
where
	F: Fn(&dyn Any, &mut Cursor<'_>, &Arg) -> RunResult + Send + Sync,
{
	fn run(&self, ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		(self.0)(ctx, cursor, arg)
	}
}

/// Adapts a function of the field value and the argument.
#[derive(Clone, Copy)]
pub struct SimpleRunner<F>(pub F);

impl<F> Handler for SimpleRunner<F>
where
	F: Fn(&mut dyn Value, &Arg) -> RunResult + Send + Sync,
{
	fn run(&self, _ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		(self.0)(cursor.value_mut(), arg)
	}
}

/// Adapts a function of the field value, its descriptor and the argument.
#[derive(Clone, Copy)]
pub struct FieldRunner<F>(pub F);

impl<F> Handler for FieldRunner<F>
where
	F: Fn(&mut dyn Value, &FieldDescriptor, &Arg) -> RunResult + Send + Sync,
{
	fn run(&self, _ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		let field = cursor.field();
		(self.0)(cursor.value_mut(), field, arg)
	}
}

/// A handler built from a separate parser and runner.
pub struct FnHandler<R> {
	parse: Parser,
	run: R,
}

impl<R> Handler for FnHandler<R>
where
	R: Fn(&dyn Any, &mut Cursor<'_>, &Arg) -> RunResult + Send + Sync,
{
	fn parse(&self, raw: &str) -> Result<Arg, BoxError> {
		(self.parse)(raw)
	}

	fn run(&self, ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		(self.run)(ctx, cursor, arg)
	}
}

/// Builds a handler from `parse` and `run`. A `None` parser is the identity.
pub fn from_fns<R>(parse: Option<Parser>, run: R) -> FnHandler<R>
where
	R: Fn(&dyn Any, &mut Cursor<'_>, &Arg) -> RunResult + Send + Sync,
{
	FnHandler {
		parse: parse.unwrap_or(identity),
		run,
	}
}

fn identity(raw: &str) -> Result<Arg, BoxError> {
	Ok(Arg::from(raw))
}
