//! Procedural macros for tagwalk.
//!
//! Provides `#[derive(Reflect)]`, which makes a struct walkable by a
//! `tagwalk::Reflector`.

use proc_macro::TokenStream;

/// Reflect derive macro implementation.
mod reflect;

/// Derives `Value`, `Struct` and `Typed` for a struct.
///
/// ```ignore
/// #[derive(Reflect, Default)]
/// pub struct Request {
///     #[tag = r#"default:"10" validate:"min(1)""#]
///     pub page_size: i64,
///     #[tag(skip)]
///     cache: Vec<u8>,
/// }
/// ```
///
/// # Field attributes
///
/// - `#[tag = "..."]` - the annotation string. Repeated attributes are joined
///   with a space, in order.
/// - `#[tag(skip)]` - leave the field out of reflection entirely. Its type
///   need not implement `Value`.
///
/// `pub` fields are exported; the walker skips every other field, including
/// `pub(crate)` ones.
///
/// # Container attributes
///
/// - `#[reflect(setter)]` - the type implements `Setter`.
/// - `#[reflect(format_setter)]` - the type implements `FormatSetter`.
/// - `#[reflect(opaque)]` - reflect the type as a scalar instead of a record.
///   Requires `Clone + PartialEq + Default`.
///
/// Type parameters get a `Value` bound. Lifetime parameters are rejected,
/// as are enums and unions unless `opaque`.
#[proc_macro_derive(Reflect, attributes(tag, reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
	reflect::derive_reflect(input)
}
