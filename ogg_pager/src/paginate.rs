use crate::error::Result;
use crate::header::PageHeader;
use crate::{
	CONTAINS_FIRST_PAGE_OF_BITSTREAM, CONTAINS_LAST_PAGE_OF_BITSTREAM, CONTINUED_PACKET,
	MAX_SEGMENT_COUNT, Page,
};

struct PaginateContext {
	pages: Vec<Page>,
	abgp: u64,
	stream_serial: u32,
	header_flags: u8,
	flags: PaginateContextFlags,
	pos: u64,
	segments: Vec<u8>,
	content: Vec<u8>,
}

struct PaginateContextFlags {
	first_page: bool,
	// The first segment of the page being built belongs to a packet started on a previous page
	continues_packet: bool,
	packet_finished_on_page: bool,
}

impl PaginateContext {
	fn new(abgp: u64, stream_serial: u32, header_flags: u8) -> Self {
		Self {
			pages: Vec::new(),
			abgp,
			stream_serial,
			header_flags,
			flags: PaginateContextFlags {
				first_page: true,
				continues_packet: false,
				packet_finished_on_page: false,
			},
			pos: 0,
			segments: Vec::with_capacity(MAX_SEGMENT_COUNT),
			content: Vec::new(),
		}
	}

	fn push_segment(&mut self, segment: &[u8], mid_packet: bool) {
		if self.segments.len() == MAX_SEGMENT_COUNT {
			self.flush_page();
			self.flags.continues_packet = mid_packet;
		}

		self.segments.push(segment.len() as u8);
		self.content.extend_from_slice(segment);
	}

	fn flush_page(&mut self) {
		let mut header_type_flag = 0;
		if self.flags.continues_packet {
			header_type_flag |= CONTINUED_PACKET;
		}

		if self.flags.first_page && self.header_flags & CONTAINS_FIRST_PAGE_OF_BITSTREAM != 0 {
			header_type_flag |= CONTAINS_FIRST_PAGE_OF_BITSTREAM;
		}

		let abgp = if self.flags.packet_finished_on_page {
			self.abgp
		} else {
			// A special value of '-1' (in two's complement) indicates that no packets
			// finish on this page.
			1_u64.wrapping_neg()
		};

		let mut header = PageHeader::new(
			header_type_flag,
			abgp,
			self.stream_serial,
			self.pages.len() as u32,
		);
		header.start = self.pos;
		header.segments = core::mem::take(&mut self.segments);

		let content = core::mem::take(&mut self.content);
		self.pos += (header.len() + content.len()) as u64;

		self.pages.push(Page {
			content,
			header,
			end: self.pos,
		});

		self.flags.first_page = false;
		self.flags.packet_finished_on_page = false;
	}
}

/// Create pages from a list of packets
///
/// Packets are laid out back to back, a new page is started only once the current one
/// holds [`MAX_SEGMENT_COUNT`](crate::MAX_SEGMENT_COUNT) segments. Sequence numbers start at 0,
/// and `start`/`end` are relative to the first page. Checksums are *not* generated.
///
/// # Errors
///
/// Currently infallible, the `Result` is kept for API stability
///
/// # Example
///
/// ```rust
/// use ogg_pager::paginate;
///
/// # fn main() -> ogg_pager::Result<()> {
/// // Creating the comment header
/// let comment_header_packet = vec![0; 100_000];
/// let stream_serial_number = 2784419176;
///
/// let pages = paginate([comment_header_packet.as_slice()], stream_serial_number, 0, 0)?;
/// assert_eq!(pages.len(), 2);
/// # Ok(()) }
/// ```
pub fn paginate<'a, I>(packets: I, stream_serial: u32, abgp: u64, flags: u8) -> Result<Vec<Page>>
where
	I: IntoIterator<Item = &'a [u8]>,
{
	let mut ctx = PaginateContext::new(abgp, stream_serial, flags);

	for packet in packets {
		let mut segments = packet.chunks(255).peekable();
		let mut mid_packet = false;

		while let Some(segment) = segments.next() {
			ctx.push_segment(segment, mid_packet);
			mid_packet = true;

			// A packet with a length divisible by 255 is terminated by a 0 lacing value
			if segments.peek().is_none() && segment.len() == 255 {
				ctx.push_segment(&[], true);
			}
		}

		// `chunks` yields nothing for an empty packet, which still needs its terminator
		if packet.is_empty() {
			ctx.push_segment(&[], false);
		}

		ctx.flags.packet_finished_on_page = true;
	}

	if !ctx.segments.is_empty() {
		ctx.flush_page();
	}

	if flags & CONTAINS_LAST_PAGE_OF_BITSTREAM != 0 {
		if let Some(last) = ctx.pages.last_mut() {
			last.header.header_type_flag |= CONTAINS_LAST_PAGE_OF_BITSTREAM;
		}
	}

	Ok(ctx.pages)
}
