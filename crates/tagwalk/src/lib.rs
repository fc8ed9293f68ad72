//! Tag-driven struct field walker.
//!
//! A [`Reflector`] walks a record field by field, reads the annotation string
//! attached to each field and dispatches the named [`Handler`]s against the
//! live field value. Nested structs, pointers to structs and sequences of
//! structs are walked recursively unless a field carries `reflect:"-"`.
//!
//! # Modules
//!
//! - [`reflect`] - the introspection capability (`Value`, `Struct`, ...)
//! - [`field`] - field descriptors, cached per type, and tag grammar
//! - [`handler`] - the two-phase handler contract and its adapters
//! - [`handlers`] - bundled `set`, `setfmt`, `default` and `validate` handlers
//!
//! # Example
//!
//! ```ignore
//! use tagwalk::{Reflect, Reflector, handler::SimpleRunner};
//!
//! #[derive(Reflect, Default)]
//! struct Request {
//!     #[tag = r#"default:"10""#]
//!     pub page_size: i64,
//! }
//!
//! let mut reflector = Reflector::new();
//! tagwalk::handlers::install(&mut reflector);
//!
//! let mut request = Request::default();
//! reflector.reflect(&mut request)?;
//! assert_eq!(request.page_size, 10);
//! ```

extern crate self as tagwalk;

mod cache;
mod error;
pub mod field;
mod global;
pub mod handler;
pub mod handlers;
pub mod reflect;
mod reflector;

pub use error::{BoxError, Error};
pub use global::{
	default_reflector, reflect, reflect_context, reflect_struct, register, register_runner,
	register_simple, unregister,
};
pub use handler::{Arg, Cursor, Handler, Step};
pub use reflect::{
	FormatSetter, Kind, Pointer, Sequence, Setter, Struct, TypeInfo, Typed, Value, ValueMut,
	ValueRef,
};
pub use reflector::{Reflector, STOP_TAG};
pub use tagwalk_macros::Reflect;

#[doc(hidden)]
pub mod __private {
	pub use crate::field::{FieldDescriptor, Visibility};
	pub use crate::reflect::{
		FormatSetter, Setter, Struct, TypeInfo, Typed, Value, ValueMut, ValueRef,
	};
}
