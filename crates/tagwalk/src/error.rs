use std::borrow::Cow;

/// Error produced by a handler's `parse` or `run`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Recoverable walk failure.
///
/// Programming errors (empty tag names, tag values a handler cannot parse,
/// cross-field references to missing fields) are not represented here: they
/// panic at the point of detection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A handler's `run` failed. The first failure aborts the walk.
	#[error("{field}: {source}")]
	Field {
		/// Name of the failing field: its value under the reflector's name
		/// tag when set, otherwise the declared name.
		field: Cow<'static, str>,
		/// Tag name of the handler that failed.
		handler: &'static str,
		source: BoxError,
	},

	/// The walk root is neither a struct nor a pointer.
	#[error("the value {type_name} is not a struct")]
	NotStruct { type_name: &'static str },

	/// The walk root is a non-nil pointer to something other than a struct.
	#[error("the value {type_name} is not a pointer to struct")]
	NotPointerToStruct { type_name: &'static str },
}

impl Error {
	/// Name of the field whose handler failed, if any.
	pub fn field(&self) -> Option<&str> {
		match self {
			Error::Field { field, .. } => Some(field),
			_ => None,
		}
	}
}
