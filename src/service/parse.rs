/// Reads the leading integer of `raw`: leading whitespace is skipped, one
/// sign is accepted and anything after the digits is ignored, so `"2.5"`
/// is 2 and `"12px"` is 12. No leading digits or an overflow gives `None`.
pub fn int_prefix(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(['+', '-']));
    let digits_len = raw[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    raw[..sign_len + digits_len].parse().ok()
}
