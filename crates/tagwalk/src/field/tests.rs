use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::Reflect;
use crate::reflect::Typed;

#[derive(Reflect, Default)]
struct Account {
	#[tag = r#"json:"id" db:"account_id""#]
	pub id: i64,
	#[tag = r#"json:"-""#]
	pub password: String,
	#[tag = r#"db:"name,unique""#]
	pub name: String,
	#[tag = r#"json:",omitempty""#]
	note: String,
	#[tag = r#"json:"created""#]
	#[tag = r#"db:"created_at""#]
	pub created: i64,
	#[tag(skip)]
	pub scratch: std::cell::Cell<u8>,
}

#[test]
fn test_descriptors_in_declaration_order() {
	let desc = fields_of(Account::type_info());
	let names: Vec<_> = desc.fields().iter().map(|f| f.name()).collect();
	assert_eq!(names, vec!["id", "password", "name", "note", "created"]);
	assert_eq!(desc.len(), 5);
	assert_eq!(desc.index_of("note"), Some(3));
	assert_eq!(desc.index_of("scratch"), None);
	assert!(desc.type_name().ends_with("Account"));

	let note = desc.field("note").unwrap();
	assert!(!note.is_exported());
	assert_eq!(note.visibility(), Visibility::Private);
	assert_eq!(note.tag(), r#"json:",omitempty""#);
	assert!(desc.field("id").unwrap().is_exported());
}

#[test]
fn test_repeated_tag_attributes_join() {
	let desc = fields_of(Account::type_info());
	assert_eq!(
		desc.field("created").unwrap().tag(),
		r#"json:"created" db:"created_at""#
	);
}

/// The descriptor is built once per type.
#[test]
fn test_descriptor_is_cached() {
	let first = fields_of(Account::type_info());
	let second = fields_of_value(&Account::default());
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(*first, *second);
}

#[test]
#[should_panic(expected = "is not a struct type")]
fn test_fields_of_non_struct_panics() {
	fields_of_value(&5u8);
}

#[test]
fn test_get_tag() {
	let desc = fields_of(Account::type_info());
	let name = desc.field("name").unwrap();
	assert_eq!(
		get_tag(name, "db"),
		Some(TagValue {
			value: "name".into(),
			arg: "unique".into(),
		})
	);
	assert_eq!(get_tag(name, "json"), None);
	assert_eq!(get_tag(desc.field("id").unwrap(), "json").unwrap().value, "id");
}

#[test]
#[should_panic(expected = "must not be empty")]
fn test_get_tag_empty_name_panics() {
	let desc = fields_of(Account::type_info());
	get_tag(&desc.fields()[0], "");
}

/// `-` drops a field, an empty value falls back to the declared name.
#[test]
fn test_fields_with_tag() {
	let fields = fields_with_tag(Account::type_info(), "json");
	let keys: Vec<_> = fields.keys().map(String::as_str).collect();
	assert_eq!(keys, vec!["id", "name", "note", "created"]);

	let note = &fields["note"];
	assert_eq!(note.value, "");
	assert_eq!(note.arg, "omitempty");
	assert_eq!(note.index(), 3);

	let db = fields_with_tag(Account::type_info(), "db");
	assert_eq!(db["account_id"].descriptor.name(), "id");
	assert_eq!(db["name"].arg, "unique");
	assert_eq!(db["created_at"].index(), 4);
	assert!(db.contains_key("password"));

	assert!(Arc::ptr_eq(&fields, &fields_with_tag(Account::type_info(), "json")));
}

#[test]
#[should_panic(expected = "must not be empty")]
fn test_fields_with_empty_tag_panics() {
	fields_with_tag(Account::type_info(), "");
}
