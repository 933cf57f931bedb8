//! Small helpers shared by the Windows API bindings

/// NUL-terminated UTF-16 copy of `s` for `PCWSTR` arguments
pub(crate) fn wide_str(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
