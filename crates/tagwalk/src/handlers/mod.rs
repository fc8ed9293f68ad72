//! Bundled handlers.
//!
//! | Tag | Handler | Registered by [`install`] |
//! |---|---|---|
//! | `set` | [`SetterHandler::new`] | yes |
//! | `setfmt` | [`SetterHandler::format`] | yes |
//! | `default` | [`SetDefault`] | yes |
//! | `validate` | [`ValidatorHandler`] | no, it needs a rule validator |

use crate::reflector::Reflector;

mod setdefault;
mod setter;
mod validate;

pub use setdefault::{
	Clock, DefaultError, FixedClock, SetDefault, SetDefaultConfig, SystemClock, parse_duration,
	parse_time,
};
pub use setter::{SetFn, SetterHandler, target_mut};
pub use validate::{RuleValidator, ValidatorHandler};

/// Registers `set`, `setfmt` and `default` on `reflector`.
pub fn install(reflector: &mut Reflector) {
	reflector.register("set", SetterHandler::new());
	reflector.register("setfmt", SetterHandler::format());
	reflector.register("default", SetDefault::new());
}
