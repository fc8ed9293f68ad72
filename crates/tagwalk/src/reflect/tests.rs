use std::time::Duration;

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;

use super::*;
use crate::Reflect;

#[derive(Reflect, Default, Debug, PartialEq)]
struct Point {
	pub x: i64,
	pub y: i64,
	label: String,
}

#[derive(Reflect, Default)]
struct Pair(pub u8, Option<String>);

#[derive(Reflect, Default)]
struct Unit;

#[derive(Reflect, Default)]
struct Wrapper<T> {
	pub inner: T,
	pub items: Vec<T>,
}

#[derive(Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(opaque)]
enum Mode {
	#[default]
	Off,
	On,
}

#[test]
fn test_derived_struct_fields() {
	let mut point = Point {
		x: 1,
		y: 2,
		label: "p".into(),
	};

	assert_eq!(point.kind(), Kind::Struct);
	assert_eq!(point.field(0).and_then(|v| v.downcast_ref::<i64>()), Some(&1));
	assert_eq!(point.field(2).and_then(|v| v.downcast_ref::<String>()).map(String::as_str), Some("p"));
	assert!(point.field(3).is_none());
	assert_eq!(point.field_by_name("y").and_then(|v| v.downcast_ref::<i64>()), Some(&2));
	assert!(point.field_by_name("z").is_none());

	*point.field_mut(1).and_then(|v| v.downcast_mut::<i64>()).unwrap() = 5;
	assert_eq!(point.y, 5);
}

#[test]
fn test_type_info_is_static() {
	let info = Point::type_info();
	assert_eq!(info.type_id(), TypeId::of::<Point>());
	assert!(info.type_name().ends_with("Point"));
	assert_eq!(info.fields().len(), 3);
	assert!(std::ptr::eq(info.fields(), Point::default().info().fields()));

	let names: Vec<_> = Pair::type_info().fields().iter().map(|f| f.name()).collect();
	assert_eq!(names, vec!["0", "1"]);
	assert!(Unit::type_info().fields().is_empty());
	assert!(Unit.is_zero());
}

/// A struct is zero when every reflected field is.
#[test]
fn test_struct_is_zero() {
	assert!(Point::default().is_zero());
	assert!(
		!Point {
			label: "x".into(),
			..Point::default()
		}
		.is_zero()
	);
	assert!(Pair::default().is_zero());
	assert!(!Pair(0, Some(String::new())).is_zero());
}

#[test]
fn test_generic_struct() {
	let mut wrapper = Wrapper {
		inner: 3u32,
		items: vec![1, 2],
	};
	assert_eq!(wrapper.field(1).map(|v| v.kind()), Some(Kind::Sequence));
	match wrapper.field_mut(1).map(|v| v.reflect_mut()) {
		Some(ValueMut::Sequence(seq)) => {
			assert_eq!(seq.len(), 2);
			*seq.get_mut(0).and_then(|v| v.downcast_mut::<u32>()).unwrap() = 9;
		}
		_ => panic!("expected a sequence"),
	}
	assert_eq!(wrapper.items, vec![9, 2]);
	assert!(Wrapper::<Point>::default().is_zero());
}

#[test]
fn test_opaque_is_scalar() {
	let mut mode = Mode::On;
	assert_eq!(mode.kind(), Kind::Scalar);
	assert!(!mode.is_zero());
	assert!(Mode::Off.is_zero());
	assert!(mode.set_from(&Mode::Off));
	assert_eq!(mode, Mode::Off);
	assert!(!mode.set_from(&1i64));
}

#[test]
fn test_scalar_capabilities() {
	let mut n = 0i32;
	assert!(n.is_zero());
	assert!(n.set_from(&7i32));
	assert!(!n.set_from(&7i64));
	assert_eq!(n, 7);

	let copy = "text".to_owned().clone_value().unwrap();
	assert_eq!(copy.downcast_ref::<String>().map(String::as_str), Some("text"));
	assert!(Duration::ZERO.is_zero());
	assert!(zero_time().is_zero());
	assert!(!DateTime::<Utc>::from_timestamp(0, 0).unwrap().is_zero());
	assert!(0.0f64.is_zero());
	assert!(!(-0.0f64).is_zero());
	assert!(!(-0.0f32).is_zero());
	assert!(n.as_setter().is_none());
}

#[test]
fn test_option_is_nullable_pointer() {
	let mut slot: Option<Point> = None;
	assert!(slot.is_zero());
	match slot.reflect_mut() {
		ValueMut::Pointer(pointer) => {
			assert!(pointer.is_nil());
			pointer.alloc().downcast_mut::<Point>().unwrap().x = 4;
		}
		_ => panic!("expected a pointer"),
	}
	assert_eq!(slot.as_ref().map(|p| p.x), Some(4));
	assert!(!slot.is_zero());
}

#[test]
fn test_box_is_never_nil() {
	let mut boxed = Box::new(Point::default());
	assert_eq!(boxed.kind(), Kind::Pointer);
	assert!(!boxed.is_zero());
	match boxed.reflect_ref() {
		ValueRef::Pointer(pointer) => assert!(!pointer.is_nil()),
		_ => panic!("expected a pointer"),
	}
	indirect_mut(&mut boxed).unwrap().downcast_mut::<Point>().unwrap().y = 3;
	assert_eq!(boxed.y, 3);
}

#[test]
fn test_sequences() {
	let list = vec![Point::default()];
	assert!(!list.is_zero());
	assert!(Vec::<Point>::new().is_zero());

	let array = [1u8, 0];
	assert!(!array.is_zero());
	assert!([0u8; 4].is_zero());
	match array.reflect_ref() {
		ValueRef::Sequence(seq) => {
			assert_eq!(seq.len(), 2);
			assert!(seq.get(2).is_none());
		}
		_ => panic!("expected a sequence"),
	}
}

#[test]
fn test_indirect() {
	let some = Some(5i64);
	let none: Option<i64> = None;
	let plain = 6i64;
	assert_eq!(indirect(&some).and_then(|v| v.downcast_ref::<i64>()), Some(&5));
	assert!(indirect(&none).is_none());
	assert_eq!(indirect(&plain).and_then(|v| v.downcast_ref::<i64>()), Some(&6));
}

#[test]
fn test_dyn_value_debug() {
	let value: &dyn Value = &Point::default();
	assert!(value.is::<Point>());
	assert!(format!("{value:?}").ends_with("Point>(struct)"));
}
