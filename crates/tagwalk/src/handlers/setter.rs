//! `set` and `setfmt`: assignment through a field's own setter capability.

use std::any::Any;

use crate::error::BoxError;
use crate::handler::{Arg, Cursor, Handler, Parser, RunResult};
use crate::reflect::{Value, ValueMut};

/// Assignment step of a [`SetterHandler`], run after nil pointers are
/// allocated.
pub type SetFn = Box<dyn Fn(&dyn Any, &mut Cursor<'_>, &Arg) -> RunResult + Send + Sync>;

/// Allocates a nil pointer field, then assigns it with a set function.
pub struct SetterHandler {
	parse: Option<Parser>,
	set: SetFn,
}

impl SetterHandler {
	/// Assigns through the field's [`Setter`](crate::Setter). Panics on
	/// dispatch if the field type has none.
	pub fn new() -> Self {
		Self::with(None, Box::new(use_setter))
	}

	/// Assigns through the field's [`FormatSetter`](crate::FormatSetter).
	/// Panics on dispatch if the field type has none.
	pub fn format() -> Self {
		Self::with(None, Box::new(use_format_setter))
	}

	/// Custom parser and set function. A `None` parser is the identity.
	pub fn with(parse: Option<Parser>, set: SetFn) -> Self {
		Self { parse, set }
	}

	/// Custom parser with the default [`Setter`](crate::Setter) assignment.
	pub fn with_parser(parse: Parser) -> Self {
		Self::with(Some(parse), Box::new(use_setter))
	}
}

impl Default for SetterHandler {
	fn default() -> Self {
		Self::new()
	}
}

impl Handler for SetterHandler {
	fn parse(&self, raw: &str) -> Result<Arg, BoxError> {
		match self.parse {
			Some(parse) => parse(raw),
			None => Ok(Arg::from(raw)),
		}
	}

	fn run(&self, ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		target_mut(cursor);
		(self.set)(ctx, cursor, arg)
	}
}

/// The field value behind at most one pointer level, allocating a nil
/// pointer first.
pub fn target_mut<'c>(cursor: &'c mut Cursor<'_>) -> &'c mut dyn Value {
	match cursor.value_mut().reflect_mut() {
		ValueMut::Pointer(pointer) => pointer.alloc(),
		ValueMut::Struct(value) => value,
		ValueMut::Sequence(value) => value,
		ValueMut::Scalar(value) => value,
	}
}

fn use_setter(_ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
	let name = cursor.field().name();
	let target = target_mut(cursor);
	let type_name = target.type_name();
	match target.as_setter() {
		Some(setter) => setter.set(arg),
		None => panic!("{name}({type_name}) does not implement Setter"),
	}
}

fn use_format_setter(_ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
	let name = cursor.field().name();
	let format = arg.as_str().ok_or("setfmt expects a string argument")?.to_owned();
	let target = target_mut(cursor);
	let type_name = target.type_name();
	match target.as_format_setter() {
		Some(setter) => setter.set_format(&format),
		None => panic!("{name}({type_name}) does not implement FormatSetter"),
	}
}
