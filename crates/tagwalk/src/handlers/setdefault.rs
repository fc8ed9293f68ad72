//! `default`: fill zero-valued fields.
//!
//! The tag value is either a literal converted to the field's type, or
//! `.Name` to copy the root record's field `Name`. Strings and `i64` also
//! accept `now()`; strings accept `now(layout)` with a strftime layout.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Deserialize;

use super::setter::target_mut;
use crate::error::BoxError;
use crate::handler::{Arg, Cursor, Handler, RunResult};
use crate::reflect::{Value, indirect, zero_time};

/// Recoverable failures of the `default` handler.
#[derive(Debug, thiserror::Error)]
pub enum DefaultError {
	#[error("invalid default value: empty field reference")]
	EmptyFieldRef,
	#[error("unsupported type {type_name}")]
	Unsupported { type_name: &'static str },
	#[error("cannot parse '{value}' as {type_name}: {reason}")]
	Parse {
		value: String,
		type_name: &'static str,
		reason: String,
	},
	#[error("invalid duration '{0}'")]
	Duration(String),
	#[error("unable to parse time '{0}'")]
	Time(String),
	#[error("invalid time layout '{0}'")]
	Layout(String),
	#[error("unexpected argument for the default handler")]
	Argument,
}

/// Typed configuration of [`SetDefault`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SetDefaultConfig {
	/// strftime formats tried in order after RFC 3339 when parsing times.
	/// Formats without an offset are read as UTC.
	pub time_formats: Vec<String>,
}

impl Default for SetDefaultConfig {
	fn default() -> Self {
		Self {
			time_formats: vec![
				"%Y-%m-%d %H:%M:%S%.f".into(),
				"%Y-%m-%dT%H:%M:%S%.f".into(),
				"%Y-%m-%d".into(),
			],
		}
	}
}

/// Source of the current time for `now()`.
pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
	fn now(&self) -> DateTime<Utc> {
		self.0
	}
}

/// Pre-parsed `default` tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DefaultArg {
	/// `.Name`; may be empty.
	Field(String),
	Literal(String),
}

impl DefaultArg {
	fn parse(raw: &str) -> Self {
		match raw.strip_prefix('.') {
			Some(name) => DefaultArg::Field(name.to_owned()),
			None => DefaultArg::Literal(raw.to_owned()),
		}
	}
}

/// Sets a field to its default when it holds the zero value.
///
/// A nil pointer field is allocated first, then its pointee is checked.
/// Types exposing a [`Setter`](crate::Setter) receive the literal as a string
/// argument.
pub struct SetDefault {
	config: SetDefaultConfig,
	clock: Arc<dyn Clock>,
}

impl SetDefault {
	pub fn new() -> Self {
		Self::with_config(SetDefaultConfig::default())
	}

	pub fn with_config(config: SetDefaultConfig) -> Self {
		Self {
			config,
			clock: Arc::new(SystemClock),
		}
	}

	pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
		self.clock = Arc::new(clock);
		self
	}

	pub fn config(&self) -> &SetDefaultConfig {
		&self.config
	}

	fn set_literal(&self, target: &mut dyn Value, s: &str) -> RunResult {
		if let Some(setter) = target.as_setter() {
			return setter.set(&Arg::from(s));
		}

		if let Some(slot) = target.downcast_mut::<String>() {
			*slot = self.string_default(s)?;
			return Ok(());
		}
		if let Some(slot) = target.downcast_mut::<Duration>() {
			*slot = parse_duration(s)?;
			return Ok(());
		}
		if let Some(slot) = target.downcast_mut::<DateTime<Utc>>() {
			*slot = parse_time(s, &self.config.time_formats)?;
			return Ok(());
		}
		if let Some(slot) = target.downcast_mut::<bool>() {
			*slot = parse_bool(s).ok_or_else(|| DefaultError::Parse {
				value: s.to_owned(),
				type_name: "bool",
				reason: "expected one of 1, t, true, 0, f, false".into(),
			})?;
			return Ok(());
		}
		if let Some(slot) = target.downcast_mut::<i64>() {
			*slot = match now_layout(s) {
				Some(_) => self.clock.now().timestamp(),
				None => parse_number(s)?,
			};
			return Ok(());
		}

		macro_rules! set_number {
			($($ty:ty),*) => {$(
				if let Some(slot) = target.downcast_mut::<$ty>() {
					*slot = parse_number(s)?;
					return Ok(());
				}
			)*};
		}
		set_number!(i8, i16, i32, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

		Err(DefaultError::Unsupported {
			type_name: target.type_name(),
		}
		.into())
	}

	fn string_default(&self, s: &str) -> Result<String, DefaultError> {
		let Some(layout) = now_layout(s) else {
			return Ok(s.to_owned());
		};
		let now = self.clock.now();
		if layout.is_empty() {
			return Ok(now.to_rfc3339_opts(SecondsFormat::Secs, true));
		}
		if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
			return Err(DefaultError::Layout(layout.to_owned()));
		}
		Ok(now.format_with_items(StrftimeItems::new(layout)).to_string())
	}
}

impl Default for SetDefault {
	fn default() -> Self {
		Self::new()
	}
}

impl Handler for SetDefault {
	fn parse(&self, raw: &str) -> Result<Arg, BoxError> {
		Ok(Arg::new(DefaultArg::parse(raw)))
	}

	fn run(&self, _ctx: &dyn Any, cursor: &mut Cursor<'_>, arg: &Arg) -> RunResult {
		let default = arg.downcast_ref::<DefaultArg>().ok_or(DefaultError::Argument)?;
		if !target_mut(cursor).is_zero() {
			return Ok(());
		}

		match default {
			DefaultArg::Field(name) => copy_field(cursor, name),
			DefaultArg::Literal(s) => self.set_literal(target_mut(cursor), s),
		}
	}
}

/// Copies the root's field `name` into the cursor's field.
///
/// Panics if the field does not exist, is a nil pointer, or has a different
/// type.
fn copy_field(cursor: &mut Cursor<'_>, name: &str) -> RunResult {
	if name.is_empty() {
		return Err(DefaultError::EmptyFieldRef.into());
	}

	let source = cursor
		.root()
		.field_by_name(name)
		.unwrap_or_else(|| panic!("not found the struct field '{name}'"));
	let source = indirect(source).unwrap_or_else(|| panic!("the struct field '{name}' is nil"));
	let copy = source
		.clone_value()
		.unwrap_or_else(|| panic!("the struct field '{name}' ({}) cannot be copied", source.type_name()));

	let target = target_mut(cursor);
	if !target.set_from(&*copy) {
		panic!(
			"cannot set {} from the struct field '{name}' ({})",
			target.type_name(),
			copy.type_name()
		);
	}
	Ok(())
}

fn now_layout(s: &str) -> Option<&str> {
	s.strip_prefix("now(")?.strip_suffix(')')
}

fn parse_bool(s: &str) -> Option<bool> {
	match s {
		"1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
		"0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
		_ => None,
	}
}

fn parse_number<T>(s: &str) -> Result<T, DefaultError>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	s.parse().map_err(|e: T::Err| DefaultError::Parse {
		value: s.to_owned(),
		type_name: std::any::type_name::<T>(),
		reason: e.to_string(),
	})
}

/// Parses a duration.
///
/// A value ending in a digit is a whole number of milliseconds. Anything
/// else is a sequence of decimal numbers with units (`ns`, `us`, `µs`, `ms`,
/// `s`, `m`, `h`), such as `1h30m` or `1.5s`. The empty string is zero.
pub fn parse_duration(src: &str) -> Result<Duration, DefaultError> {
	let invalid = || DefaultError::Duration(src.to_owned());
	if src.is_empty() {
		return Ok(Duration::ZERO);
	}
	if src.ends_with(|c: char| c.is_ascii_digit()) {
		let millis: u64 = src.parse().map_err(|_| invalid())?;
		return Ok(Duration::from_millis(millis));
	}

	const SECOND: u128 = 1_000_000_000;
	let mut rest = src.strip_prefix('+').unwrap_or(src);
	if rest.is_empty() {
		return Err(invalid());
	}

	let mut nanos: u128 = 0;
	while !rest.is_empty() {
		let (int, tail) = split_digits(rest);
		let (frac, tail) = match tail.strip_prefix('.') {
			Some(tail) => split_digits(tail),
			None => ("", tail),
		};
		if int.is_empty() && frac.is_empty() {
			return Err(invalid());
		}
		let unit_len = tail
			.find(|c: char| c == '.' || c.is_ascii_digit())
			.unwrap_or(tail.len());
		let (unit, tail) = tail.split_at(unit_len);
		let scale: u128 = match unit {
			"ns" => 1,
			"us" | "µs" | "μs" => 1_000,
			"ms" => 1_000_000,
			"s" => SECOND,
			"m" => 60 * SECOND,
			"h" => 3600 * SECOND,
			_ => return Err(invalid()),
		};

		let whole: u128 = if int.is_empty() {
			0
		} else {
			int.parse().map_err(|_| invalid())?
		};
		nanos = whole
			.checked_mul(scale)
			.and_then(|n| nanos.checked_add(n))
			.ok_or_else(invalid)?;
		if !frac.is_empty() {
			let digits = &frac[..frac.len().min(18)];
			let part: u128 = digits.parse().map_err(|_| invalid())?;
			nanos = nanos
				.checked_add(part * scale / 10u128.pow(digits.len() as u32))
				.ok_or_else(invalid)?;
		}
		rest = tail;
	}

	let secs = u64::try_from(nanos / SECOND).map_err(|_| invalid())?;
	Ok(Duration::new(secs, (nanos % SECOND) as u32))
}

fn split_digits(s: &str) -> (&str, &str) {
	s.split_at(s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len()))
}

/// Parses a UTC time.
///
/// Accepts the zero forms (`""`, `0000-00-00 00:00:00` with optional
/// fraction), which yield [`zero_time`], an integer number of unix seconds, RFC 3339, then each of
/// `formats` in order.
pub fn parse_time(value: &str, formats: &[String]) -> Result<DateTime<Utc>, DefaultError> {
	let invalid = || DefaultError::Time(value.to_owned());
	match value {
		"" | "0000-00-00 00:00:00" | "0000-00-00 00:00:00.000" | "0000-00-00 00:00:00.000000" => {
			return Ok(zero_time());
		}
		_ => {}
	}

	if is_integer(value) {
		let secs: i64 = value.parse().map_err(|_| invalid())?;
		return DateTime::from_timestamp(secs, 0).ok_or_else(invalid);
	}
	if let Ok(time) = DateTime::parse_from_rfc3339(value) {
		return Ok(time.with_timezone(&Utc));
	}

	for format in formats {
		if let Ok(time) = DateTime::parse_from_str(value, format) {
			return Ok(time.with_timezone(&Utc));
		}
		if let Ok(time) = NaiveDateTime::parse_from_str(value, format) {
			return Ok(time.and_utc());
		}
		if let Some(time) = NaiveDate::parse_from_str(value, format)
			.ok()
			.and_then(|date| date.and_hms_opt(0, 0, 0))
		{
			return Ok(time.and_utc());
		}
	}
	Err(invalid())
}

fn is_integer(s: &str) -> bool {
	let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
	!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
