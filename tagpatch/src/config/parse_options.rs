/// Options to control how format adapters walk a file while preparing a rewrite
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ParseOptions {
	pub(crate) parsing_mode: ParsingMode,
	pub(crate) max_junk_bytes: usize,
}

impl Default for ParseOptions {
	/// The default implementation for `ParseOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// ParseOptions {
	/// 	parsing_mode: ParsingMode::BestAttempt,
	///     max_junk_bytes: 1024,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}

impl ParseOptions {
	/// Default parsing mode
	pub const DEFAULT_PARSING_MODE: ParsingMode = ParsingMode::BestAttempt;

	/// Default number of junk bytes to read
	pub const DEFAULT_MAX_JUNK_BYTES: usize = 1024;

	/// Creates a new `ParseOptions`, alias for `Default` implementation
	///
	/// See also: [`ParseOptions::default`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::config::ParseOptions;
	///
	/// let parsing_options = ParseOptions::new();
	/// ```
	#[must_use]
	pub const fn new() -> Self {
		Self {
			parsing_mode: Self::DEFAULT_PARSING_MODE,
			max_junk_bytes: Self::DEFAULT_MAX_JUNK_BYTES,
		}
	}

	/// The parsing mode to use, see [`ParsingMode`] for details
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::config::{ParseOptions, ParsingMode};
	///
	/// // By default, `parsing_mode` is ParsingMode::BestAttempt. Here, we need absolute correctness.
	/// let parsing_options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
	/// ```
	pub fn parsing_mode(&mut self, parsing_mode: ParsingMode) -> Self {
		self.parsing_mode = parsing_mode;
		*self
	}

	/// The maximum number of allowed junk bytes to search
	///
	/// Some structures may be preceded by junk bytes, such as padding remnants in front of a FLAC
	/// stream. This sets the maximum number of junk/unrecognized bytes that will be skipped
	/// while looking for a signature before giving up.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagpatch::config::ParseOptions;
	///
	/// // Some of these files were left with a lot of garbage in front of the stream
	/// let parsing_options = ParseOptions::new().max_junk_bytes(2048);
	/// ```
	pub fn max_junk_bytes(&mut self, max_junk_bytes: usize) -> Self {
		self.max_junk_bytes = max_junk_bytes;
		*self
	}
}

/// The parsing strictness mode
///
/// # Examples
///
/// ```rust
/// use tagpatch::config::{ParseOptions, ParsingMode};
///
/// // Only accept spec-compliant layouts
/// let parsing_options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
/// ```
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum ParsingMode {
	/// Will eagerly error on invalid input
	///
	/// ## Examples of behavior
	///
	/// * A chunk's size overruns its container - The adapter errors and no rewrite is prepared
	Strict,
	/// Default mode, less eager to error on recoverably malformed input
	///
	/// NOTE: A readable layout does *not* necessarily make it writeable.
	///
	/// ## Examples of behavior
	///
	/// * A chunk's size overruns its container - The chunk is treated as running to the end of
	///   its container
	#[default]
	BestAttempt,
	/// Least eager to error
	///
	/// ## Examples of behavior
	///
	/// * A chunk's size overruns its container - The chunk list is cut off at that chunk
	Relaxed,
}
