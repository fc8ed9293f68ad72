//! Process-wide default reflector.
//!
//! Pre-loaded with the bundled handlers. Walks take the read lock,
//! registration the write lock, so register handlers during startup.

use std::any::Any;
use std::sync::LazyLock;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::error::Error;
use crate::handler::{Arg, Cursor, Handler, RunResult};
use crate::reflect::{Struct, Value};
use crate::reflector::Reflector;

static DEFAULT: LazyLock<RwLock<Reflector>> =
	LazyLock::new(|| RwLock::new(Reflector::with_builtins()));

/// Read access to the default reflector.
pub fn default_reflector() -> RwLockReadGuard<'static, Reflector> {
	DEFAULT.read()
}

/// Registers `handler` on the default reflector. See [`Reflector::register`].
pub fn register(name: impl Into<String>, handler: impl Handler + 'static) {
	DEFAULT.write().register(name, handler);
}

pub fn register_runner<F>(name: impl Into<String>, run: F)
where
	F: Fn(&dyn Any, &mut Cursor<'_>, &Arg) -> RunResult + Send + Sync + 'static,
{
	DEFAULT.write().register_runner(name, run);
}

pub fn register_simple<F>(name: impl Into<String>, run: F)
where
	F: Fn(&mut dyn Value, &Arg) -> RunResult + Send + Sync + 'static,
{
	DEFAULT.write().register_simple(name, run);
}

/// Removes a handler from the default reflector. Returns whether one was bound.
pub fn unregister(name: &str) -> bool {
	DEFAULT.write().unregister(name).is_some()
}

/// Walks `value` with the default reflector and the unit context.
pub fn reflect(value: &mut dyn Value) -> Result<(), Error> {
	DEFAULT.read().reflect(value)
}

pub fn reflect_context(ctx: &dyn Any, value: &mut dyn Value) -> Result<(), Error> {
	DEFAULT.read().reflect_context(ctx, value)
}

pub fn reflect_struct(ctx: &dyn Any, record: &mut dyn Struct) -> Result<(), Error> {
	DEFAULT.read().reflect_struct(ctx, record)
}
