//! ASF (WMA) specific items
//!
//! All metadata lives in the Header Object, which holds a size and a count of its child
//! objects. The File Properties Object, a child of the header, also stores the size of the
//! entire file.

mod description;
mod object;
mod write;

pub use description::{ContentDescription, ExtendedContentDescription};
pub use write::{AsfAdapter, AsfUpdate};

/// The GUID of the Header Object, the first 16 bytes of every ASF file
///
/// `75B22630-668E-11CF-A6D9-00AA0062CE6C`
pub const HEADER_OBJECT_GUID: [u8; 16] = [
	0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
