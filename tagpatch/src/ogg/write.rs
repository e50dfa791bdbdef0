use super::constants::VORBIS_SETUP_HEAD;
use super::comments::existing_vendor;
use super::{OggFormat, VorbisComments, verify_signature};
use crate::config::{CommitStrategy, ParseOptions, WriteOptions};
use crate::error::{Result, TagPatchError};
use crate::macros::{decode_err, encode_err, err};
use crate::rewrite::{CommitSummary, Zone, ZoneFlag, ZoneGenerators, begin_rewrite};
use crate::util::alloc::{VecFallibleCapacity, declared_size};
use crate::util::io::{FileLike, Length, Truncate};

use std::borrow::Cow;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use ogg_pager::{CONTAINS_LAST_PAGE_OF_BITSTREAM, Packets, Page};

/// The pages holding every header packet after the identification header
struct HeaderPages {
	stream_serial: u32,
	first_sequence_number: u32,
	start: u64,
	end: u64,
	page_count: usize,
	last_of_stream: bool,
}

/// Replace the comment packet of an OGG stream with `comment_packet`
///
/// `comment_packet` must be complete, including the format's signature (and framing bit, for Vorbis).
/// See [`write_comments`] to build it from a [`VorbisComments`].
///
/// The identification page is never touched. Every page from the one after it, through the
/// last header page, is re-paginated, and the following pages of the stream are renumbered.
///
/// # Errors
///
/// * The packet is missing the comment signature of `format`
/// * [`ErrorKind::UnsupportedLayout`](crate::error::ErrorKind::UnsupportedLayout) - The identification
///   header shares its page, the header pages are interleaved with another stream, or the last header page
///   holds stream data
/// * See [`Session::commit`](crate::rewrite::Session::commit)
pub fn write_comment_packet<F>(
	file: &mut F,
	format: OggFormat,
	comment_packet: Vec<u8>,
	write_options: WriteOptions,
) -> Result<CommitSummary>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
{
	if let Some(signature) = format.comment_signature() {
		if !comment_packet.starts_with(signature) {
			encode_err!(@BAIL "OGG: Comment packet missing magic signature");
		}
	}

	write(file, format, |_| Ok(comment_packet.clone()), write_options)
}

/// Replace the comments of an OGG stream
///
/// If `comments` has no vendor string, the stream's current vendor is kept.
///
/// # Errors
///
/// See [`write_comment_packet`]
///
/// # Examples
///
/// ```rust,no_run
/// use tagpatch::config::WriteOptions;
/// use tagpatch::ogg::{OggFormat, VorbisComments, write_comments};
///
/// # fn main() -> tagpatch::error::Result<()> {
/// let mut file = std::fs::OpenOptions::new()
/// 	.read(true)
/// 	.write(true)
/// 	.open("foo.opus")?;
///
/// let mut comments = VorbisComments::new();
/// comments.push(String::from("TITLE"), String::from("Foo title"));
///
/// write_comments(&mut file, OggFormat::Opus, &comments, WriteOptions::default())?;
/// # Ok(()) }
/// ```
pub fn write_comments<F>(
	file: &mut F,
	format: OggFormat,
	comments: &VorbisComments,
	write_options: WriteOptions,
) -> Result<CommitSummary>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
{
	let signature = format.comment_signature().unwrap_or_default();
	let add_framing_bit = format == OggFormat::Vorbis;

	write(
		file,
		format,
		|old_packet| {
			let vendor = match comments.vendor() {
				Some(vendor) => Cow::Borrowed(vendor),
				// Retain the file's vendor string
				None => existing_vendor(old_packet.get(signature.len()..).unwrap_or_default())?,
			};

			comments.to_packet(&vendor, signature, add_framing_bit)
		},
		write_options,
	)
}

/// Read the comments of an OGG stream
///
/// # Errors
///
/// * The stream does not start with the header packets of `format`
/// * See [`VorbisComments::parse`]
pub fn read_comments<R>(
	data: &mut R,
	format: OggFormat,
	parse_options: ParseOptions,
) -> Result<VorbisComments>
where
	R: Read + Seek,
{
	let packets = Packets::read_count(data, 2)?;

	let Some(ident_packet) = packets.get(0) else {
		decode_err!(@BAIL "OGG: Expected identification packet");
	};
	verify_signature(ident_packet, format.ident_signature())?;

	let Some(comment_packet) = packets.get(1) else {
		decode_err!(@BAIL "OGG: Expected metadata packet");
	};

	let signature = format.comment_signature().unwrap_or_default();
	verify_signature(comment_packet, signature)?;

	VorbisComments::parse(&comment_packet[signature.len()..], parse_options)
}

fn write<F, P>(
	file: &mut F,
	format: OggFormat,
	mut create_packet: P,
	write_options: WriteOptions,
) -> Result<CommitSummary>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
	P: FnMut(&[u8]) -> Result<Vec<u8>>,
{
	let start = file.stream_position()?;
	let layout = read_header_pages(file, format)?;

	log::debug!(
		"OGG: {} header pages (bytes {}..{}) for stream {}",
		layout.page_count,
		layout.start,
		layout.end,
		layout.stream_serial
	);

	match write_options.commit_strategy {
		CommitStrategy::Buffered => {
			let mut staged = Cursor::new(Vec::try_with_capacity_stable(declared_size(
				file.len()?,
			)?)?);

			file.rewind()?;
			file.read_to_end(staged.get_mut())?;
			staged.seek(SeekFrom::Start(start))?;

			let summary = patch_headers(&mut staged, &layout, format, &mut create_packet)?;

			file.rewind()?;
			file.truncate(0)?;
			file.write_all(staged.get_ref())?;

			Ok(summary)
		},
		CommitStrategy::InPlace => patch_headers(file, &layout, format, &mut create_packet),
	}
}

fn read_header_pages<R>(data: &mut R, format: OggFormat) -> Result<HeaderPages>
where
	R: Read + Seek,
{
	let ident_page = Page::read(data)?;
	verify_signature(ident_page.content(), format.ident_signature())?;

	let segments = ident_page.header().segments();
	let packets_on_page = segments.iter().filter(|segment| **segment < 255).count();
	if packets_on_page != 1 || segments.last().is_none_or(|segment| *segment == 255) {
		err!(UnsupportedLayout(
			"OGG: Identification header does not occupy its own page"
		));
	}

	let stream_serial = ident_page.header().stream_serial;
	let remaining_packets = format.header_packet_count() - 1;

	let mut pages = Vec::new();
	let mut completed = 0;
	while completed < remaining_packets {
		let page = Page::read(data)?;
		if page.header().stream_serial != stream_serial {
			err!(UnsupportedLayout(
				"OGG: Header pages are interleaved with another stream"
			));
		}

		for segment in page.header().segments() {
			if completed == remaining_packets {
				err!(UnsupportedLayout(
					"OGG: Last header page carries stream data"
				));
			}

			if *segment < 255 {
				completed += 1;
			}
		}

		pages.push(page);
	}

	let packets = Packets::from_pages(&pages);
	if let Some(signature) = format.comment_signature() {
		verify_signature(packets.get(0).unwrap_or_default(), signature)?;
	}

	if format == OggFormat::Vorbis {
		verify_signature(packets.get(1).unwrap_or_default(), VORBIS_SETUP_HEAD)?;
	}

	// Header packets always complete, so at least one page was read
	let (Some(first), Some(last)) = (pages.first(), pages.last()) else {
		decode_err!(@BAIL "OGG: Expected metadata packet");
	};

	Ok(HeaderPages {
		stream_serial,
		first_sequence_number: first.header().sequence_number,
		start: ident_page.end,
		end: last.end,
		page_count: pages.len(),
		last_of_stream: last.header().header_type_flag() & CONTAINS_LAST_PAGE_OF_BITSTREAM != 0,
	})
}

fn patch_headers<F, P>(
	file: &mut F,
	layout: &HeaderPages,
	format: OggFormat,
	create_packet: &mut P,
) -> Result<CommitSummary>
where
	F: FileLike,
	TagPatchError: From<<F as Truncate>::Error>,
	TagPatchError: From<<F as Length>::Error>,
	P: FnMut(&[u8]) -> Result<Vec<u8>>,
{
	let flag = if layout.last_of_stream {
		ZoneFlag::LastPhysicalPage
	} else {
		ZoneFlag::None
	};

	let mut pages_written = 0;
	let summary = {
		let mut session = begin_rewrite(file);
		session.add_zone(
			format.zone_name(),
			layout.start,
			layout.end - layout.start,
			Vec::new(),
			flag,
		);

		let mut generators = ZoneGenerators::new();
		generators.insert(format.zone_name(), |zone, original| {
			let (content, page_count) = repaginate(zone, original, layout, create_packet)?;
			pages_written = page_count;
			Ok(content)
		});

		// The session is already working on a staged copy, if one was requested
		session.commit(
			&mut generators,
			WriteOptions::new().commit_strategy(CommitStrategy::InPlace),
		)?
	};

	let page_difference = pages_written as i64 - layout.page_count as i64;
	if page_difference != 0 {
		let Some(zone) = summary.deltas().first() else {
			decode_err!(@BAIL "OGG: Expected metadata packet");
		};

		renumber_pages(
			file,
			zone.new_offset() + zone.new_size(),
			layout.stream_serial,
			page_difference,
		)?;
	}

	Ok(summary)
}

fn repaginate<P>(
	zone: &Zone,
	original: &[u8],
	layout: &HeaderPages,
	create_packet: &mut P,
) -> Result<(Vec<u8>, usize)>
where
	P: FnMut(&[u8]) -> Result<Vec<u8>>,
{
	let mut reader = Cursor::new(original);
	let mut pages = Vec::with_capacity(layout.page_count);
	while reader.position() < original.len() as u64 {
		pages.push(Page::read(&mut reader)?);
	}

	let mut packets = Packets::from_pages(&pages);

	let Some(old_comment_packet) = packets.get(0) else {
		decode_err!(@BAIL "OGG: Expected metadata packet");
	};
	let new_comment_packet = create_packet(old_comment_packet)?;
	packets.set(0, new_comment_packet);

	let flags = match zone.flag() {
		ZoneFlag::LastPhysicalPage => CONTAINS_LAST_PAGE_OF_BITSTREAM,
		_ => 0,
	};

	let new_pages = packets.paginate(layout.stream_serial, 0, flags)?;
	let page_count = new_pages.len();

	let mut content = Vec::new();
	for (idx, mut page) in new_pages.into_iter().enumerate() {
		let Some(sequence_number) = u32::try_from(idx)
			.ok()
			.and_then(|idx| layout.first_sequence_number.checked_add(idx))
		else {
			err!(TooMuchData);
		};

		page.header_mut().sequence_number = sequence_number;
		page.gen_crc();
		content.extend(page.as_bytes());
	}

	log::trace!(
		"OGG: Re-paginated header packets into {page_count} pages (previously {})",
		layout.page_count
	);

	Ok((content, page_count))
}

/// Shift the sequence number of every page of `stream_serial` after `start` by `difference`
fn renumber_pages<F>(file: &mut F, start: u64, stream_serial: u32, difference: i64) -> Result<()>
where
	F: Read + Write + Seek,
{
	let stream_end = file.seek(SeekFrom::End(0))?;
	file.seek(SeekFrom::Start(start))?;

	let mut renumbered = 0;
	while file.stream_position()? < stream_end {
		let mut page = Page::read(file)?;
		if page.header().stream_serial != stream_serial {
			continue;
		}

		let header = page.header_mut();
		let Ok(sequence_number) = u32::try_from(i64::from(header.sequence_number) + difference)
		else {
			encode_err!(@BAIL "OGG: Page sequence number out of range");
		};
		header.sequence_number = sequence_number;

		page.gen_crc();

		file.seek(SeekFrom::Start(page.header().start))?;
		file.write_all(&page.as_bytes())?;

		renumbered += 1;
	}

	log::debug!("OGG: Renumbered {renumbered} pages by {difference}");
	Ok(())
}
