use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{Pointer, Sequence, Value, ValueMut, ValueRef, zero_time};

macro_rules! impl_scalar {
	(@zero $ty:ty, |$v:ident| $zero:expr) => {
		impl Value for $ty {
			#[inline]
			fn reflect_ref(&self) -> ValueRef<'_> {
				ValueRef::Scalar(self)
			}

			#[inline]
			fn reflect_mut(&mut self) -> ValueMut<'_> {
				ValueMut::Scalar(self)
			}

			fn is_zero(&self) -> bool {
				let $v = self;
				$zero
			}

			fn clone_value(&self) -> Option<Box<dyn Value>> {
				Some(Box::new(self.clone()))
			}

			fn set_from(&mut self, other: &dyn Value) -> bool {
				match other.downcast_ref::<$ty>() {
					Some(value) => {
						*self = value.clone();
						true
					}
					None => false,
				}
			}
		}
	};
	($($ty:ty),* $(,)?) => {$(
		impl_scalar!(@zero $ty, |v| *v == <$ty>::default());
	)*};
}

impl_scalar!(
	bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String, Duration,
);

// Bitwise, so `-0.0` is not zero.
impl_scalar!(@zero f32, |v| v.to_bits() == 0);
impl_scalar!(@zero f64, |v| v.to_bits() == 0);
impl_scalar!(@zero DateTime<Utc>, |v| *v == zero_time());

impl<T: Value + Default> Value for Option<T> {
	#[inline]
	fn reflect_ref(&self) -> ValueRef<'_> {
		ValueRef::Pointer(self)
	}

	#[inline]
	fn reflect_mut(&mut self) -> ValueMut<'_> {
		ValueMut::Pointer(self)
	}

	fn is_zero(&self) -> bool {
		self.is_none()
	}
}

impl<T: Value + Default> Pointer for Option<T> {
	fn pointee(&self) -> Option<&dyn Value> {
		self.as_ref().map(|v| v as &dyn Value)
	}

	fn pointee_mut(&mut self) -> Option<&mut dyn Value> {
		self.as_mut().map(|v| v as &mut dyn Value)
	}

	fn alloc(&mut self) -> &mut dyn Value {
		self.get_or_insert_with(T::default)
	}
}

/// A box is a pointer that is never nil.
impl<T: Value> Value for Box<T> {
	#[inline]
	fn reflect_ref(&self) -> ValueRef<'_> {
		ValueRef::Pointer(self)
	}

	#[inline]
	fn reflect_mut(&mut self) -> ValueMut<'_> {
		ValueMut::Pointer(self)
	}

	fn is_zero(&self) -> bool {
		false
	}
}

impl<T: Value> Pointer for Box<T> {
	fn pointee(&self) -> Option<&dyn Value> {
		Some(&**self)
	}

	fn pointee_mut(&mut self) -> Option<&mut dyn Value> {
		Some(&mut **self)
	}

	fn alloc(&mut self) -> &mut dyn Value {
		&mut **self
	}
}

impl<T: Value> Value for Vec<T> {
	#[inline]
	fn reflect_ref(&self) -> ValueRef<'_> {
		ValueRef::Sequence(self)
	}

	#[inline]
	fn reflect_mut(&mut self) -> ValueMut<'_> {
		ValueMut::Sequence(self)
	}

	fn is_zero(&self) -> bool {
		self.is_empty()
	}
}

impl<T: Value> Sequence for Vec<T> {
	fn len(&self) -> usize {
		self.as_slice().len()
	}

	fn get(&self, index: usize) -> Option<&dyn Value> {
		self.as_slice().get(index).map(|v| v as &dyn Value)
	}

	fn get_mut(&mut self, index: usize) -> Option<&mut dyn Value> {
		self.as_mut_slice().get_mut(index).map(|v| v as &mut dyn Value)
	}
}

impl<T: Value, const N: usize> Value for [T; N] {
	#[inline]
	fn reflect_ref(&self) -> ValueRef<'_> {
		ValueRef::Sequence(self)
	}

	#[inline]
	fn reflect_mut(&mut self) -> ValueMut<'_> {
		ValueMut::Sequence(self)
	}

	fn is_zero(&self) -> bool {
		self.iter().all(|v| v.is_zero())
	}
}

impl<T: Value, const N: usize> Sequence for [T; N] {
	fn len(&self) -> usize {
		N
	}

	fn get(&self, index: usize) -> Option<&dyn Value> {
		self.as_slice().get(index).map(|v| v as &dyn Value)
	}

	fn get_mut(&mut self, index: usize) -> Option<&mut dyn Value> {
		self.as_mut_slice().get_mut(index).map(|v| v as &mut dyn Value)
	}
}
