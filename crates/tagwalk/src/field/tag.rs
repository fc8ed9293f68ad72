//! Annotation string grammar.
//!
//! A field annotation is a sequence of `name:"value"` pairs separated by
//! whitespace. `name` is a run of bytes above `' '` excluding `:`, `"` and
//! DEL; `value` is a double-quoted string that may contain backslash escapes.
//! Scanning stops silently at the first malformed pair, so trailing garbage
//! is ignored rather than rejected.

use std::borrow::Cow;

/// One `name:"value"` pair, borrowed from the annotation string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPair<'a> {
	name: &'a str,
	quoted: &'a str,
}

impl<'a> TagPair<'a> {
	#[inline]
	pub fn name(&self) -> &'a str {
		self.name
	}

	/// The value including its surrounding quotes, exactly as written.
	#[inline]
	pub fn quoted(&self) -> &'a str {
		self.quoted
	}

	/// The value with quotes and escapes removed.
	pub fn value(&self) -> Result<Cow<'a, str>, UnquoteError> {
		unquote(self.quoted)
	}
}

/// Iterator over the pairs of an annotation string.
#[derive(Debug, Clone)]
pub struct TagPairs<'a> {
	rest: &'a str,
}

impl<'a> TagPairs<'a> {
	pub fn new(tag: &'a str) -> Self {
		Self { rest: tag }
	}
}

impl<'a> Iterator for TagPairs<'a> {
	type Item = TagPair<'a>;

	fn next(&mut self) -> Option<TagPair<'a>> {
		let tag = self.rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
		// Malformed input ends the iteration for good.
		self.rest = "";

		let bytes = tag.as_bytes();
		let mut i = 0;
		while i < bytes.len()
			&& bytes[i] > b' '
			&& bytes[i] != b':'
			&& bytes[i] != b'"'
			&& bytes[i] != 0x7f
		{
			i += 1;
		}
		if i == 0 || i + 1 >= bytes.len() || bytes[i] != b':' || bytes[i + 1] != b'"' {
			return None;
		}
		let name = &tag[..i];
		let tag = &tag[i + 1..];
		let bytes = tag.as_bytes();

		let mut i = 1;
		while i < bytes.len() && bytes[i] != b'"' {
			if bytes[i] == b'\\' {
				i += 1;
			}
			i += 1;
		}
		if i >= bytes.len() {
			return None;
		}

		self.rest = &tag[i + 1..];
		Some(TagPair {
			name,
			quoted: &tag[..=i],
		})
	}
}

/// Unquoted value of the pair called `name`, if present and well-formed.
///
/// Panics if `name` is empty.
pub fn lookup<'a>(tag: &'a str, name: &str) -> Option<Cow<'a, str>> {
	assert!(!name.is_empty(), "tag lookup: the tag name must not be empty");
	TagPairs::new(tag)
		.find(|pair| pair.name() == name)
		.and_then(|pair| pair.value().ok())
}

/// Splits `value,arg` at the first comma, trimming both halves.
pub fn split_arg(value: &str) -> (&str, &str) {
	match value.split_once(',') {
		Some((value, arg)) => (value.trim(), arg.trim()),
		None => (value, ""),
	}
}

/// Error from [`unquote`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnquoteError {
	#[error("value is not a double-quoted string")]
	NotQuoted,
	#[error("invalid escape sequence at byte {0}")]
	InvalidEscape(usize),
	#[error("unescaped quote or newline at byte {0}")]
	Unescaped(usize),
	#[error("unquoted value is not valid UTF-8")]
	InvalidUtf8,
}

/// Removes the quotes of a double-quoted string and resolves its escapes.
///
/// Accepts `\a \b \f \n \r \t \v \\ \"`, octal `\NNN`, `\xHH`, `\uHHHH` and
/// `\UHHHHHHHH`.
pub fn unquote(quoted: &str) -> Result<Cow<'_, str>, UnquoteError> {
	let inner = quoted
		.strip_prefix('"')
		.and_then(|s| s.strip_suffix('"'))
		.ok_or(UnquoteError::NotQuoted)?;

	if !inner.contains(['\\', '"', '\n']) {
		return Ok(Cow::Borrowed(inner));
	}

	// Error offsets are byte positions within `quoted`.
	let bad = |at: usize| UnquoteError::InvalidEscape(at + 1);
	let bytes = inner.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		match bytes[i] {
			b'"' | b'\n' => return Err(UnquoteError::Unescaped(i + 1)),
			b'\\' => {
				let at = i + 1;
				let esc = *bytes.get(at).ok_or(bad(at))?;
				i += 2;
				match esc {
					b'a' => out.push(0x07),
					b'b' => out.push(0x08),
					b'f' => out.push(0x0c),
					b'n' => out.push(b'\n'),
					b'r' => out.push(b'\r'),
					b't' => out.push(b'\t'),
					b'v' => out.push(0x0b),
					b'\\' => out.push(b'\\'),
					b'"' => out.push(b'"'),
					b'0'..=b'7' => {
						let code = bytes
							.get(at..at + 3)
							.and_then(|digits| parse_radix(digits, 8))
							.and_then(|code| u8::try_from(code).ok())
							.ok_or(bad(at))?;
						out.push(code);
						i = at + 3;
					}
					b'x' => {
						let code = bytes
							.get(at + 1..at + 3)
							.and_then(|digits| parse_radix(digits, 16))
							.ok_or(bad(at))?;
						out.push(code as u8);
						i = at + 3;
					}
					b'u' | b'U' => {
						let width = if esc == b'u' { 4 } else { 8 };
						let ch = bytes
							.get(at + 1..at + 1 + width)
							.and_then(|digits| parse_radix(digits, 16))
							.and_then(char::from_u32)
							.ok_or(bad(at))?;
						let mut buf = [0; 4];
						out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
						i = at + 1 + width;
					}
					_ => return Err(bad(at)),
				}
			}
			b => {
				out.push(b);
				i += 1;
			}
		}
	}

	String::from_utf8(out)
		.map(Cow::Owned)
		.map_err(|_| UnquoteError::InvalidUtf8)
}

/// Like [`unquote`] but trims the result and falls back to the input
/// unchanged when it is not a valid quoted string.
pub(crate) fn unquote_lenient(quoted: &str) -> Cow<'_, str> {
	match unquote(quoted) {
		Ok(Cow::Borrowed(s)) => Cow::Borrowed(s.trim()),
		Ok(Cow::Owned(s)) => Cow::Owned(s.trim().to_owned()),
		Err(_) => Cow::Borrowed(quoted),
	}
}

fn parse_radix(digits: &[u8], radix: u32) -> Option<u32> {
	digits.iter().try_fold(0u32, |acc, &b| {
		let d = (b as char).to_digit(radix)?;
		acc.checked_mul(radix)?.checked_add(d)
	})
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;
	use rstest::rstest;

	use super::*;

	fn pairs(tag: &str) -> Vec<(&str, &str)> {
		TagPairs::new(tag).map(|p| (p.name(), p.quoted())).collect()
	}

	#[test]
	fn test_pairs_in_declaration_order() {
		assert_eq!(
			pairs(r#"default:"10" min:"10" max:"100""#),
			vec![("default", r#""10""#), ("min", r#""10""#), ("max", r#""100""#)]
		);
	}

	#[test]
	fn test_escaped_quote_stays_inside_value() {
		let tag = r#"msg:"say \"hi\"" next:"1""#;
		let got: Vec<_> = TagPairs::new(tag).collect();
		assert_eq!(got.len(), 2);
		assert_eq!(got[0].quoted(), r#""say \"hi\"""#);
		assert_eq!(got[0].value().unwrap(), r#"say "hi""#);
		assert_eq!(got[1].name(), "next");
	}

	#[test]
	fn test_whitespace_between_pairs_is_insignificant() {
		assert_eq!(pairs("  a:\"1\"\n\t b:\"2\"  "), vec![("a", "\"1\""), ("b", "\"2\"")]);
	}

	#[rstest]
	#[case::empty("", &[])]
	#[case::missing_quote(r#"a:1 b:"2""#, &[])]
	#[case::space_before_colon(r#"a :"1""#, &[])]
	#[case::unterminated(r#"a:"1" b:"2"#, &[("a", "\"1\"")])]
	#[case::trailing_garbage(r#"a:"1" !!! b:"2""#, &[("a", "\"1\"")])]
	#[case::quote_in_name(r#"a"b:"1""#, &[])]
	#[case::unicode_name(r#"名前:"x""#, &[("名前", "\"x\"")])]
	fn test_malformed_input_stops_scanning(#[case] tag: &str, #[case] want: &[(&str, &str)]) {
		assert_eq!(pairs(tag), want.to_vec());
	}

	#[test]
	fn test_lookup() {
		let tag = r#"json:"name,omitempty" reflect:"-""#;
		assert_eq!(lookup(tag, "json").as_deref(), Some("name,omitempty"));
		assert_eq!(lookup(tag, "reflect").as_deref(), Some("-"));
		assert_eq!(lookup(tag, "yaml"), None);
	}

	#[test]
	#[should_panic(expected = "must not be empty")]
	fn test_lookup_empty_name_panics() {
		lookup(r#"a:"1""#, "");
	}

	#[rstest]
	#[case("", ("", ""))]
	#[case("int16", ("int16", ""))]
	#[case(",arg", ("", "arg"))]
	#[case("int64, arg ", ("int64", "arg"))]
	#[case(" v ,a,b", ("v", "a,b"))]
	fn test_split_arg(#[case] input: &str, #[case] want: (&str, &str)) {
		assert_eq!(split_arg(input), want);
	}

	#[rstest]
	#[case(r#""plain""#, "plain")]
	#[case(r#""""#, "")]
	#[case(r#""a\tb\nc""#, "a\tb\nc")]
	#[case(r#""\x41\101\u00e9\U0001F600""#, "AAé😀")]
	#[case(r#""back\\slash""#, "back\\slash")]
	fn test_unquote(#[case] input: &str, #[case] want: &str) {
		assert_eq!(unquote(input).unwrap(), want);
	}

	#[rstest]
	#[case("plain", UnquoteError::NotQuoted)]
	#[case("\"", UnquoteError::NotQuoted)]
	#[case(r#""a"b""#, UnquoteError::Unescaped(2))]
	#[case(r#""\q""#, UnquoteError::InvalidEscape(2))]
	#[case(r#""\'""#, UnquoteError::InvalidEscape(2))]
	#[case(r#""\xZZ""#, UnquoteError::InvalidEscape(2))]
	#[case(r#""\777""#, UnquoteError::InvalidEscape(2))]
	#[case(r#""\xff""#, UnquoteError::InvalidUtf8)]
	fn test_unquote_rejects(#[case] input: &str, #[case] want: UnquoteError) {
		assert_eq!(unquote(input).unwrap_err(), want);
	}

	#[test]
	fn test_unquote_lenient() {
		assert_eq!(unquote_lenient(r#"" - ""#), "-");
		assert_eq!(unquote_lenient("-"), "-");
	}

	proptest! {
		#[test]
		fn prop_scanner_never_panics_and_slices_input(tag in "\\PC{0,64}") {
			for pair in TagPairs::new(&tag) {
				prop_assert!(!pair.name().is_empty());
				prop_assert!(pair.quoted().starts_with('"') && pair.quoted().ends_with('"'));
				prop_assert!(tag.contains(pair.quoted()));
				let _ = pair.value();
			}
		}
	}
}
