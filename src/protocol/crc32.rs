//! Table-driven CRC-32 (reflected IEEE 802.3 polynomial, slice-by-8).

use std::sync::OnceLock;

const POLYNOMIAL: u32 = 0xEDB8_8320;
const INITIAL: u32 = 0xFFFF_FFFF;
const TABLES: usize = 8;

type Table = [[u32; 256]; TABLES];

static TABLE: OnceLock<Table> = OnceLock::new();

fn table() -> &'static Table {
    TABLE.get_or_init(build_table)
}

fn build_table() -> Table {
    let mut table = [[0u32; 256]; TABLES];
    for i in 0..256u32 {
        let mut r = i;
        for _ in 0..8 {
            r = (r >> 1) ^ (POLYNOMIAL & (r & 1).wrapping_neg());
        }
        table[0][i as usize] = r;
    }
    for k in 1..TABLES {
        for i in 0..256 {
            let r = table[k - 1][i];
            table[k][i] = table[0][(r & 0xFF) as usize] ^ (r >> 8);
        }
    }
    table
}

/// CRC-32 of `data`. An empty slice yields 0.
pub fn compute(data: &[u8]) -> u32 {
    if data.is_empty() {
        return 0;
    }
    let t = table();
    let mut crc = INITIAL;
    let mut chunks = data.chunks_exact(8);
    for c in &mut chunks {
        let lo = crc ^ u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
        let hi = u32::from_le_bytes([c[4], c[5], c[6], c[7]]);
        crc = t[7][(lo & 0xFF) as usize]
            ^ t[6][((lo >> 8) & 0xFF) as usize]
            ^ t[5][((lo >> 16) & 0xFF) as usize]
            ^ t[4][(lo >> 24) as usize]
            ^ t[3][(hi & 0xFF) as usize]
            ^ t[2][((hi >> 8) & 0xFF) as usize]
            ^ t[1][((hi >> 16) & 0xFF) as usize]
            ^ t[0][(hi >> 24) as usize];
    }
    for &b in chunks.remainder() {
        crc = (crc >> 8) ^ t[0][((crc ^ b as u32) & 0xFF) as usize];
    }
    !crc
}

/// Big-endian checksum bytes as stored in a message record.
/// Returns `None` when there is nothing to hash.
pub fn compute_hash(data: &[u8]) -> Option<[u8; 4]> {
    if data.is_empty() {
        return None;
    }
    Some(compute(data).to_be_bytes())
}
