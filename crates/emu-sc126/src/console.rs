//! Console byte-stream helpers.
//!
//! The console itself (rendering, key capture) lives host-side; the
//! board only exchanges raw 8-bit bytes with it. These helpers cover
//! the conventions both sides must agree on: CP/M line endings and the
//! control characters a renderer honors.

/// Backspace.
pub const BS: u8 = 0x08;

/// Horizontal tab: advance to the next multiple of 8.
pub const HT: u8 = 0x09;

/// Line feed.
pub const LF: u8 = 0x0A;

/// Carriage return — the guest's Enter key.
pub const CR: u8 = 0x0D;

/// Normalize pasted host text for the guest keyboard queue.
///
/// CP/M expects a bare carriage return for Enter: CR LF pairs collapse
/// to CR and lone LFs become CR. Everything else passes through.
#[must_use]
pub fn normalize_paste(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            CR => {
                out.push(CR);
                if bytes.get(i + 1) == Some(&LF) {
                    i += 1;
                }
            }
            LF => out.push(CR),
            b => out.push(b),
        }
        i += 1;
    }
    out
}

/// Column after a tab at `column`.
#[must_use]
pub fn next_tab_stop(column: usize) -> usize {
    (column / 8 + 1) * 8
}
