//! `validate`: check a field against a rule string.

use std::any::Any;

use crate::error::BoxError;
use crate::handler::{Arg, Cursor, Handler, RunResult};
use crate::reflect::Value;

/// Checks a value against one rule.
pub trait RuleValidator: Send + Sync {
	fn validate(&self, value: &dyn Value, rule: &str) -> Result<(), BoxError>;
}

impl<F> RuleValidator for F
where
	F: Fn(&dyn Value, &str) -> Result<(), BoxError> + Send + Sync,
{
	fn validate(&self, value: &dyn Value, rule: &str) -> Result<(), BoxError> {
		(self)(value, rule)
	}
}

/// Runs a [`RuleValidator`] with the tag value as the rule.
///
/// The value is handed over as declared, pointers included. Nested records
/// are walked by the reflector, so rules never need to descend themselves.
pub struct ValidatorHandler<V> {
	validator: V,
}

impl<V: RuleValidator> ValidatorHandler<V> {
	pub fn new(validator: V) -> Self {
		Self { validator }
	}
}

impl<F> ValidatorHandler<F>
where
	F: Fn(&dyn Value, &str) -> Result<(), BoxError> + Send + Sync,
{
	/// Same as [`new`](Self::new), with closure argument types inferred.
	pub fn from_fn(validate: F) -> Self {
		Self::new(validate)
	}
}

impl<V: RuleValidator> Handler for ValidatorHandler<V> {
	fn run(&self, _ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		let rule = arg.as_str().ok_or("validate expects a string rule")?;
		self.validator.validate(cursor.value(), rule)
	}
}
