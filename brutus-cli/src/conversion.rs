use crate::error::Error;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Convert hex ASCII character to nibble value (0-15)
#[inline]
pub fn hex_to_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Decode a hex string (either case) into bytes
pub fn decode_hex(s: &str) -> Result<Vec<u8>, Error> {
    let bytes = s.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(Error::OddHexLength { len: bytes.len() });
    }

    let nibble = |c: u8| hex_to_nibble(c).ok_or(Error::InvalidHex { digit: c as char });
    bytes
        .chunks_exact(2)
        .map(|pair| -> Result<u8, Error> { Ok((nibble(pair[0])? << 4) | nibble(pair[1])?) })
        .collect()
}

/// Encode bytes as lowercase hex
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}
