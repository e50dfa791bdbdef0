// The OGG checksum is a plain CRC-32 with the generator polynomial 0x04c11db7, an initial
// value of 0, and no final XOR. Bits are *not* reflected, so the usual IEEE tables don't apply.
const CRC_POLYNOMIAL: u32 = 0x04C1_1DB7;

const CRC_LOOKUP_ARRAY: [u32; 256] = generate_table();

const fn generate_table() -> [u32; 256] {
	let mut table = [0; 256];

	let mut i = 0;
	while i < 256 {
		let mut r = (i as u32) << 24;

		let mut bit = 0;
		while bit < 8 {
			r = if r & 0x8000_0000 == 0 {
				r << 1
			} else {
				(r << 1) ^ CRC_POLYNOMIAL
			};
			bit += 1;
		}

		table[i] = r;
		i += 1;
	}

	table
}

/// Generates a CRC checksum based on the content
///
/// The checksum field of a page must be zeroed before its bytes are passed in.
pub fn crc32(data: &[u8]) -> u32 {
	let mut crc: u32 = 0;

	for &b in data {
		let index = ((crc >> 24) as u8 ^ b) as usize;
		crc = (crc << 8) ^ CRC_LOOKUP_ARRAY[index];
	}

	crc
}
