//! `#[derive(Reflect)]` implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
	Data, DeriveInput, Expr, ExprLit, Fields, GenericParam, Generics, Lit, LitStr, Member, Meta,
	parse_macro_input, parse_quote,
};

/// Options from `#[reflect(...)]` on the container.
#[derive(Default)]
struct Container {
	setter: bool,
	format_setter: bool,
	opaque: bool,
}

/// One reflected field.
struct ReflectedField {
	member: Member,
	name: LitStr,
	exported: bool,
	tag: String,
}

pub fn derive_reflect(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	expand(input).unwrap_or_else(|e| e.to_compile_error()).into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
	if let Some(lifetime) = input.generics.lifetimes().next() {
		return Err(syn::Error::new_spanned(
			lifetime,
			"Reflect cannot be derived for types with lifetime parameters",
		));
	}

	let container = parse_container(&input)?;
	let generics = add_value_bounds(input.generics.clone());
	if container.opaque {
		return Ok(expand_opaque(&input, &generics, &container));
	}

	let Data::Struct(data) = &input.data else {
		return Err(syn::Error::new_spanned(
			&input.ident,
			"Reflect can only be derived for structs",
		));
	};
	let fields = parse_fields(&data.fields)?;

	let ident = &input.ident;
	let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
	let capabilities = capability_methods(&container);

	let members: Vec<_> = fields.iter().map(|f| &f.member).collect();
	let indices: Vec<_> = (0..fields.len()).collect();
	let descriptors = fields.iter().enumerate().map(|(index, field)| {
		let name = &field.name;
		let tag = &field.tag;
		let visibility = if field.exported {
			quote!(Exported)
		} else {
			quote!(Private)
		};
		quote! {
			::tagwalk::__private::FieldDescriptor::new(
				#name,
				::tagwalk::__private::Visibility::#visibility,
				#tag,
				#index,
			)
		}
	});

	Ok(quote! {
		impl #impl_generics ::tagwalk::__private::Value for #ident #ty_generics #where_clause {
			#[inline]
			fn reflect_ref(&self) -> ::tagwalk::__private::ValueRef<'_> {
				::tagwalk::__private::ValueRef::Struct(self)
			}

			#[inline]
			fn reflect_mut(&mut self) -> ::tagwalk::__private::ValueMut<'_> {
				::tagwalk::__private::ValueMut::Struct(self)
			}

			fn is_zero(&self) -> bool {
				true #(&& ::tagwalk::__private::Value::is_zero(&self.#members))*
			}

			#capabilities
		}

		impl #impl_generics ::tagwalk::__private::Struct for #ident #ty_generics #where_clause {
			#[inline]
			fn info(&self) -> ::tagwalk::__private::TypeInfo {
				<Self as ::tagwalk::__private::Typed>::type_info()
			}

			fn field(&self, index: usize) -> ::core::option::Option<&dyn ::tagwalk::__private::Value> {
				match index {
					#(#indices => ::core::option::Option::Some(&self.#members as &dyn ::tagwalk::__private::Value),)*
					_ => ::core::option::Option::None,
				}
			}

			fn field_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn ::tagwalk::__private::Value> {
				match index {
					#(#indices => ::core::option::Option::Some(&mut self.#members as &mut dyn ::tagwalk::__private::Value),)*
					_ => ::core::option::Option::None,
				}
			}
		}

		impl #impl_generics ::tagwalk::__private::Typed for #ident #ty_generics #where_clause {
			fn type_info() -> ::tagwalk::__private::TypeInfo {
				const FIELDS: &[::tagwalk::__private::FieldDescriptor] = &[#(#descriptors),*];
				::tagwalk::__private::TypeInfo::new::<Self>(FIELDS)
			}
		}
	})
}

fn expand_opaque(input: &DeriveInput, generics: &Generics, container: &Container) -> TokenStream2 {
	let ident = &input.ident;
	let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
	let capabilities = capability_methods(container);

	quote! {
		impl #impl_generics ::tagwalk::__private::Value for #ident #ty_generics #where_clause {
			#[inline]
			fn reflect_ref(&self) -> ::tagwalk::__private::ValueRef<'_> {
				::tagwalk::__private::ValueRef::Scalar(self)
			}

			#[inline]
			fn reflect_mut(&mut self) -> ::tagwalk::__private::ValueMut<'_> {
				::tagwalk::__private::ValueMut::Scalar(self)
			}

			fn is_zero(&self) -> bool {
				*self == <Self as ::core::default::Default>::default()
			}

			fn clone_value(&self) -> ::core::option::Option<::std::boxed::Box<dyn ::tagwalk::__private::Value>> {
				::core::option::Option::Some(::std::boxed::Box::new(::core::clone::Clone::clone(self)))
			}

			fn set_from(&mut self, other: &dyn ::tagwalk::__private::Value) -> bool {
				match other.downcast_ref::<Self>() {
					::core::option::Option::Some(value) => {
						*self = ::core::clone::Clone::clone(value);
						true
					}
					::core::option::Option::None => false,
				}
			}

			#capabilities
		}
	}
}

fn capability_methods(container: &Container) -> TokenStream2 {
	let setter = container.setter.then(|| {
		quote! {
			fn as_setter(&mut self) -> ::core::option::Option<&mut dyn ::tagwalk::__private::Setter> {
				::core::option::Option::Some(self)
			}
		}
	});
	let format_setter = container.format_setter.then(|| {
		quote! {
			fn as_format_setter(&mut self) -> ::core::option::Option<&mut dyn ::tagwalk::__private::FormatSetter> {
				::core::option::Option::Some(self)
			}
		}
	});
	quote!(#setter #format_setter)
}

fn parse_container(input: &DeriveInput) -> syn::Result<Container> {
	let mut container = Container::default();
	for attr in input.attrs.iter().filter(|a| a.path().is_ident("reflect")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("setter") {
				container.setter = true;
			} else if meta.path.is_ident("format_setter") {
				container.format_setter = true;
			} else if meta.path.is_ident("opaque") {
				container.opaque = true;
			} else {
				return Err(meta.error("unknown reflect attribute"));
			}
			Ok(())
		})?;
	}
	Ok(container)
}

fn parse_fields(fields: &Fields) -> syn::Result<Vec<ReflectedField>> {
	let mut out = Vec::with_capacity(fields.len());
	for (position, field) in fields.iter().enumerate() {
		if let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("reflect")) {
			return Err(syn::Error::new_spanned(
				attr,
				"#[reflect] applies to the container, annotate fields with #[tag]",
			));
		}

		let mut skip = false;
		let mut parts = Vec::new();
		for attr in field.attrs.iter().filter(|a| a.path().is_ident("tag")) {
			match &attr.meta {
				Meta::NameValue(nv) => match &nv.value {
					Expr::Lit(ExprLit {
						lit: Lit::Str(lit), ..
					}) => parts.push(lit.value()),
					other => {
						return Err(syn::Error::new_spanned(other, "expected a string literal"));
					}
				},
				Meta::List(_) => attr.parse_nested_meta(|meta| {
					if meta.path.is_ident("skip") {
						skip = true;
						Ok(())
					} else {
						Err(meta.error("unknown tag attribute"))
					}
				})?,
				Meta::Path(path) => {
					return Err(syn::Error::new_spanned(
						path,
						"expected #[tag = \"...\"] or #[tag(skip)]",
					));
				}
			}
		}
		if skip {
			continue;
		}

		let (member, name) = match &field.ident {
			Some(ident) => (
				Member::Named(ident.clone()),
				LitStr::new(&ident.to_string(), ident.span()),
			),
			None => (
				Member::Unnamed(position.into()),
				LitStr::new(&position.to_string(), proc_macro2::Span::call_site()),
			),
		};
		out.push(ReflectedField {
			member,
			name,
			exported: matches!(field.vis, syn::Visibility::Public(_)),
			tag: parts.join(" "),
		});
	}
	Ok(out)
}

fn add_value_bounds(mut generics: Generics) -> Generics {
	for param in &mut generics.params {
		if let GenericParam::Type(ty) = param {
			ty.bounds.push(parse_quote!(::tagwalk::__private::Value));
		}
	}
	generics
}
