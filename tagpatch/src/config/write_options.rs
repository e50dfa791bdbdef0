/// Options to control how tagpatch commits a rewrite
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct WriteOptions {
	pub(crate) commit_strategy: CommitStrategy,
	pub(crate) preferred_padding: Option<u32>,
}

/// How a rewrite session applies its changes to the underlying file
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum CommitStrategy {
	/// Stage the entire rewrite in memory, and only touch the file once it is complete
	///
	/// Any error raised before the final write leaves the file exactly as it was.
	#[default]
	Buffered,
	/// Shift bytes directly on the file
	///
	/// This avoids holding the file in memory, but an I/O error in the middle of a commit
	/// will leave the file partially patched.
	InPlace,
}

impl WriteOptions {
	/// Default preferred padding size in bytes
	pub const DEFAULT_PREFERRED_PADDING: u32 = 1024;

	/// Creates a new `WriteOptions`, alias for `Default` implementation
	///
	/// See also: [`WriteOptions::default`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::config::WriteOptions;
	///
	/// let write_options = WriteOptions::new();
	/// ```
	pub const fn new() -> Self {
		Self {
			commit_strategy: CommitStrategy::Buffered,
			preferred_padding: Some(Self::DEFAULT_PREFERRED_PADDING),
		}
	}

	/// Set the commit strategy, see [`CommitStrategy`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::config::{CommitStrategy, WriteOptions};
	///
	/// // My files are huge, and I have backups
	/// let options = WriteOptions::new().commit_strategy(CommitStrategy::InPlace);
	/// ```
	pub fn commit_strategy(mut self, commit_strategy: CommitStrategy) -> Self {
		self.commit_strategy = commit_strategy;
		self
	}

	/// Set the preferred padding size in bytes
	///
	/// If the format being written supports padding, and a new padding region has to be created,
	/// this will be its size in bytes. Existing padding is never resized.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::config::WriteOptions;
	///
	/// // I really don't want my files rewritten, so I'll double the padding size!
	/// let options = WriteOptions::new().preferred_padding(2048);
	///
	/// // ...Or I don't want padding under any circumstances!
	/// let options = WriteOptions::new().preferred_padding(0);
	/// ```
	pub fn preferred_padding(mut self, preferred_padding: u32) -> Self {
		match preferred_padding {
			0 => self.preferred_padding = None,
			_ => self.preferred_padding = Some(preferred_padding),
		}
		self
	}
}

impl Default for WriteOptions {
	/// The default implementation for `WriteOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// WriteOptions {
	///     commit_strategy: CommitStrategy::Buffered,
	///     preferred_padding: 1024,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}
