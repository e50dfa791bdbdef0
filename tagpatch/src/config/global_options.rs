use std::cell::UnsafeCell;

thread_local! {
	static GLOBAL_OPTIONS: UnsafeCell<GlobalOptions> = UnsafeCell::new(GlobalOptions::default());
}

pub(crate) unsafe fn global_options() -> &'static GlobalOptions {
	GLOBAL_OPTIONS.with(|global_options| unsafe { &*global_options.get() })
}

/// Limits shared by every rewrite session on the current thread
///
/// # Examples
///
/// ```rust
/// use tagpatch::config::{GlobalOptions, apply_global_options};
///
/// // Staging a 2GB file in memory is fine on this machine
/// let global_options = GlobalOptions::new().allocation_limit(2 * 1024 * 1024 * 1024);
/// apply_global_options(global_options);
/// ```
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
#[non_exhaustive]
pub struct GlobalOptions {
	pub(crate) allocation_limit: usize,
	pub(crate) shift_buffer_size: usize,
}

impl GlobalOptions {
	/// Default limit for any single allocation
	///
	/// [`CommitStrategy::Buffered`](crate::config::CommitStrategy::Buffered) stages the entire file,
	/// so anything larger than this needs [`CommitStrategy::InPlace`](crate::config::CommitStrategy::InPlace)
	/// or a raised limit.
	pub const DEFAULT_ALLOCATION_LIMIT: usize = 512 * 1024 * 1024;

	/// Default size of the buffer used to move the tail of a file
	pub const DEFAULT_SHIFT_BUFFER_SIZE: usize = 64 * 1024;

	/// Creates a new `GlobalOptions`, alias for `Default` implementation
	///
	/// See also: [`GlobalOptions::default`]
	#[must_use]
	pub const fn new() -> Self {
		Self {
			allocation_limit: Self::DEFAULT_ALLOCATION_LIMIT,
			shift_buffer_size: Self::DEFAULT_SHIFT_BUFFER_SIZE,
		}
	}

	/// The maximum number of bytes to allocate for any single buffer
	///
	/// Sizes declared inside of a file (chunk sizes, atom sizes, metadata pointers) are checked
	/// against this before anything is allocated for them. Exceeding it results in
	/// [`ErrorKind::TooMuchData`](crate::error::ErrorKind::TooMuchData).
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::config::{GlobalOptions, apply_global_options};
	///
	/// // Only small files are expected, fail early on anything suspicious
	/// let global_options = GlobalOptions::new().allocation_limit(16 * 1024 * 1024);
	/// apply_global_options(global_options);
	/// ```
	pub fn allocation_limit(&mut self, allocation_limit: usize) -> Self {
		self.allocation_limit = allocation_limit;
		*self
	}

	/// The number of bytes moved at a time when a zone grows or shrinks
	///
	/// Only relevant to [`CommitStrategy::InPlace`](crate::config::CommitStrategy::InPlace)
	/// on real files, where larger buffers mean fewer reads and writes. A size of 0 is treated as 1.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::config::{GlobalOptions, apply_global_options};
	///
	/// let global_options = GlobalOptions::new().shift_buffer_size(1024 * 1024);
	/// apply_global_options(global_options);
	/// ```
	pub fn shift_buffer_size(&mut self, shift_buffer_size: usize) -> Self {
		self.shift_buffer_size = shift_buffer_size.max(1);
		*self
	}
}

impl Default for GlobalOptions {
	/// The default implementation for `GlobalOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// GlobalOptions {
	/// 	allocation_limit: Self::DEFAULT_ALLOCATION_LIMIT,
	/// 	shift_buffer_size: Self::DEFAULT_SHIFT_BUFFER_SIZE,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}

/// Applies the given `GlobalOptions` to the current thread
///
/// Sessions on other threads are unaffected.
pub fn apply_global_options(options: GlobalOptions) {
	GLOBAL_OPTIONS.with(|global_options| unsafe {
		*global_options.get() = options;
	});
}
