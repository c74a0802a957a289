use std::borrow::Cow;

/// Rewrites every bare `\n` as `\r\n`.
///
/// Existing `\r\n` pairs and lone `\r` bytes pass through untouched. Input
/// without a bare `\n` is returned borrowed.
pub fn normalize_crlf(input: &[u8]) -> Cow<'_, [u8]> {
    let bare = count_bare_lf(input);
    if bare == 0 {
        return Cow::Borrowed(input);
    }

    let mut out = Vec::with_capacity(input.len() + bare);
    let mut prev = None;
    for &byte in input {
        if byte == b'\n' && prev != Some(b'\r') {
            out.push(b'\r');
        }
        out.push(byte);
        prev = Some(byte);
    }
    Cow::Owned(out)
}

/// Number of `\n` bytes not immediately preceded by `\r`.
pub fn count_bare_lf(input: &[u8]) -> usize {
    input
        .iter()
        .enumerate()
        .filter(|&(i, &byte)| byte == b'\n' && (i == 0 || input[i - 1] != b'\r'))
        .count()
}
