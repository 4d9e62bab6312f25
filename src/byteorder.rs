//! Big-endian register byte packing, 1 to 8 bytes (`BE2LE`/`LE2BE` upstream).

/// Folds up to 8 big-endian bytes into a host-order `u64`.
pub fn be_bytes_to_u64(reg: &[u8]) -> u64 {
    debug_assert!(reg.len() <= 8);
    reg.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Spreads `val` into `sz` big-endian bytes, most significant first.
pub fn u64_to_be_bytes(val: u64, sz: usize) -> Vec<u8> {
    debug_assert!(sz <= 8);
    (0..sz)
        .map(|i| (val >> (8 * (sz - i - 1))) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_two_bytes() {
        let bytes = [0x01, 0x2C];
        let val = be_bytes_to_u64(&bytes);
        assert_eq!(val, 0x012C);
        assert_eq!(u64_to_be_bytes(val, 2), bytes);
    }

    #[test]
    fn single_byte() {
        assert_eq!(be_bytes_to_u64(&[0xFE]), 0xFE);
        assert_eq!(u64_to_be_bytes(0xFE, 1), vec![0xFE]);
    }
}
