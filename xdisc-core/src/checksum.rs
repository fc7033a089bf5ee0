/// MD5 of `data` as 32 lower-case hex digits.
pub fn content_hash(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Format raw bytes as upper-case hex, two digits per byte.
pub fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
