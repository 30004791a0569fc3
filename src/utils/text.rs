// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
/// Longest prefix of `text` holding at most `limit` characters.
///
/// Counts Unicode scalar values, so multi-byte characters are never split.
pub fn take_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}
