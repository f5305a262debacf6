/// Accumulates decoded pieces as raw bytes; a piece may end mid code point,
/// so text is only produced once generation stops.
#[derive(Debug, Default, Clone)]
pub struct Response {
    bytes: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(1024),
        }
    }

    #[inline]
    pub fn push_piece(&mut self, piece: &[u8]) {
        self.bytes.extend_from_slice(piece);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Final text. A code point cut off at the very end (generation stopped
    /// between the pieces of one character) is dropped; invalid bytes
    /// elsewhere become U+FFFD.
    pub fn finish(mut self) -> String {
        let keep = self.bytes.len() - incomplete_tail_len(&self.bytes);
        self.bytes.truncate(keep);
        match String::from_utf8(self.bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// Bytes at the end of `bytes` that start a multi-byte sequence but stop
/// short of its length. 0 if the buffer ends on a boundary.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    for i in (start..bytes.len()).rev() {
        let b = bytes[i];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let need = match b {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return 0,
        };
        let have = bytes.len() - i;
        return if have < need { have } else { 0 };
    }
    0
}
