//! Depth-first traversal of a record.
//!
//! For every exported field, in declaration order, the registered handlers
//! named by the field's tag pairs run in annotation order. The walker then
//! descends into the field unless it carries `reflect:"-"`:
//!
//! * a struct field is walked;
//! * a non-nil pointer to a struct is walked through the pointer;
//! * each struct element of a sequence is walked. Pointer elements are not
//!   followed.
//!
//! The first handler error aborts the whole walk.

use std::any::Any;
use std::borrow::Cow;

use super::{Reflector, STOP_TAG};
use crate::error::Error;
use crate::field::tag::{TagPairs, lookup, split_arg, unquote_lenient};
use crate::field::{FieldDescriptor, fields_of};
use crate::handler::{Cursor, Step, resolve};
use crate::reflect::{Kind, Struct, Value, ValueMut, ValueRef};

impl Reflector {
	/// Walks `value` with the unit context.
	pub fn reflect(&self, value: &mut dyn Value) -> Result<(), Error> {
		self.reflect_context(&(), value)
	}

	/// Walks `value`, handing `ctx` to every handler.
	///
	/// `value` must be a struct or a pointer to one. A nil pointer is a no-op.
	pub fn reflect_context(&self, ctx: &dyn Any, value: &mut dyn Value) -> Result<(), Error> {
		let type_name = value.type_name();
		match value.reflect_mut() {
			ValueMut::Struct(record) => self.reflect_struct(ctx, record),
			ValueMut::Pointer(pointer) => match pointer.pointee_mut() {
				None => Ok(()),
				Some(pointee) => match pointee.reflect_mut() {
					ValueMut::Struct(record) => self.reflect_struct(ctx, record),
					_ => Err(Error::NotPointerToStruct { type_name }),
				},
			},
			_ => Err(Error::NotStruct { type_name }),
		}
	}

	/// Walks a struct value.
	pub fn reflect_struct(&self, ctx: &dyn Any, record: &mut dyn Struct) -> Result<(), Error> {
		tracing::trace!(type_name = record.type_name(), "reflecting record");
		let mut path = Vec::new();
		self.walk_struct(ctx, record, &mut path)
	}

	/// Walks the struct at `path`.
	fn walk_struct(
		&self,
		ctx: &dyn Any,
		root: &mut dyn Struct,
		path: &mut Vec<Step>,
	) -> Result<(), Error> {
		let Some(ValueRef::Struct(current)) = resolve(&*root, path).map(|v| v.reflect_ref()) else {
			return Ok(());
		};
		let descriptor = fields_of(current.info());

		for field in descriptor.fields() {
			if !field.is_exported() {
				continue;
			}
			path.push(Step::Field(field.index()));
			let result = self.walk_field(ctx, root, path, field);
			path.pop();
			result?;
		}
		Ok(())
	}

	fn walk_field(
		&self,
		ctx: &dyn Any,
		root: &mut dyn Struct,
		path: &mut Vec<Step>,
		field: &'static FieldDescriptor,
	) -> Result<(), Error> {
		if self.dispatch(ctx, root, path, field)? {
			tracing::trace!(field = field.name(), "recursion suppressed");
			return Ok(());
		}
		self.descend(ctx, root, path)
	}

	/// Runs the handlers of `field`. Returns whether recursion is suppressed.
	fn dispatch(
		&self,
		ctx: &dyn Any,
		root: &mut dyn Struct,
		path: &[Step],
		field: &'static FieldDescriptor,
	) -> Result<bool, Error> {
		let mut stop = false;
		for pair in TagPairs::new(field.tag()) {
			let name = pair.name();
			if name == STOP_TAG
				&& (pair.quoted() == r#""-""# || unquote_lenient(pair.quoted()) == "-")
			{
				stop = true;
				continue;
			}

			let Some(handler) = self.handlers.get(name) else {
				continue;
			};
			let arg = self.args.get(&**handler, name, pair.quoted());

			tracing::trace!(field = field.name(), handler = name, "dispatching handler");
			let mut cursor = Cursor::new(&mut *root, path, field);
			handler
				.run(ctx, &mut cursor, &arg)
				.map_err(|source| Error::Field {
					field: self.field_name(field),
					handler: name,
					source,
				})?;
		}
		Ok(stop)
	}

	/// Name reported for `field` in errors.
	fn field_name(&self, field: &'static FieldDescriptor) -> Cow<'static, str> {
		let declared = Cow::Borrowed(field.name());
		let Some(tag) = self.name_tag else {
			return declared;
		};
		match lookup(field.tag(), tag) {
			Some(Cow::Borrowed(value)) => match split_arg(value).0 {
				"" | "-" => declared,
				name => Cow::Borrowed(name),
			},
			Some(Cow::Owned(value)) => match split_arg(&value).0 {
				"" | "-" => declared,
				name => Cow::Owned(name.to_owned()),
			},
			None => declared,
		}
	}

	/// Recurses into the value at `path` where it holds nested records.
	fn descend(
		&self,
		ctx: &dyn Any,
		root: &mut dyn Struct,
		path: &mut Vec<Step>,
	) -> Result<(), Error> {
		match kind_at(root, path) {
			Some(Kind::Struct) => self.walk_struct(ctx, root, path),
			Some(Kind::Pointer) => {
				path.push(Step::Deref);
				let result = match kind_at(root, path) {
					Some(Kind::Struct) => self.walk_struct(ctx, root, path),
					_ => Ok(()),
				};
				path.pop();
				result
			}
			Some(Kind::Sequence) => {
				let len = match resolve(&*root, path).map(|v| v.reflect_ref()) {
					Some(ValueRef::Sequence(seq)) => seq.len(),
					_ => 0,
				};
				for i in 0..len {
					path.push(Step::Index(i));
					let result = match kind_at(root, path) {
						Some(Kind::Struct) => self.walk_struct(ctx, root, path),
						_ => Ok(()),
					};
					path.pop();
					result?;
				}
				Ok(())
			}
			Some(Kind::Scalar) | None => Ok(()),
		}
	}
}

fn kind_at(root: &dyn Struct, path: &[Step]) -> Option<Kind> {
	resolve(root, path).map(|v| v.kind())
}
