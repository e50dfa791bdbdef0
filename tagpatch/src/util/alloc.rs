use crate::config::global_options;
use crate::error::Result;
use crate::macros::err;

/// Provides the `fallible_repeat` method on `Vec`
///
/// It is intended to be used in [`try_vec!`](crate::macros::try_vec).
trait VecFallibleRepeat<T>: Sized {
	fn fallible_repeat(self, element: T, expected_size: usize) -> Result<Self>
	where
		T: Clone;
}

impl<T> VecFallibleRepeat<T> for Vec<T> {
	fn fallible_repeat(mut self, element: T, expected_size: usize) -> Result<Self>
	where
		T: Clone,
	{
		if expected_size == 0 {
			return Ok(self);
		}

		check_limit(expected_size)?;
		self.try_reserve(expected_size)?;
		self.resize(expected_size, element);

		Ok(self)
	}
}

fn check_limit(size: usize) -> Result<()> {
	if size > unsafe { global_options().allocation_limit } {
		err!(TooMuchData);
	}

	Ok(())
}

/// **DO NOT USE DIRECTLY**
///
/// Creates a `Vec` of the specified length, containing copies of `element`.
///
/// This should be used through [`try_vec!`](crate::macros::try_vec)
pub(crate) fn fallible_vec_from_element<T>(element: T, expected_size: usize) -> Result<Vec<T>>
where
	T: Clone,
{
	Vec::new().fallible_repeat(element, expected_size)
}

/// Provides the `try_with_capacity` method on `Vec`
///
/// This can be used directly.
pub(crate) trait VecFallibleCapacity<T>: Sized {
	/// Same as `Vec::with_capacity`, but takes `GlobalOptions::allocation_limit` into account.
	///
	/// Named `try_with_capacity_stable` to avoid conflicts with the nightly `Vec::try_with_capacity`.
	fn try_with_capacity_stable(capacity: usize) -> Result<Self>;
}

impl<T> VecFallibleCapacity<T> for Vec<T> {
	fn try_with_capacity_stable(capacity: usize) -> Result<Self> {
		check_limit(capacity)?;

		let mut v = Vec::new();
		v.try_reserve(capacity)?;

		Ok(v)
	}
}

/// Converts a size declared in a file to a `usize`, refusing anything over the allocation limit
pub(crate) fn declared_size(size: u64) -> Result<usize> {
	let Ok(size) = usize::try_from(size) else {
		err!(TooMuchData);
	};

	check_limit(size)?;
	Ok(size)
}
