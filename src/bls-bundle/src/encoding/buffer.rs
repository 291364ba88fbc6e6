/// Ordered list of byte chunks, joined once at the end.
///
/// A [`Slot`] reserves a position whose contents are only known after the rest of the
/// payload has been written (the flag bit stream sits in front of the fields it describes).
#[derive(Debug, Default)]
pub struct ByteBuffer {
    chunks: Vec<Vec<u8>>,
}

/// Position reserved in a [`ByteBuffer`]; consumed when filled.
#[derive(Debug)]
#[must_use = "a reserved slot must be filled before joining"]
pub struct Slot(usize);

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: impl AsRef<[u8]>) {
        self.chunks.push(bytes.as_ref().to_vec());
    }

    pub fn push_byte(&mut self, byte: u8) {
        self.chunks.push(vec![byte]);
    }

    pub fn reserve(&mut self) -> Slot {
        self.chunks.push(Vec::new());
        Slot(self.chunks.len() - 1)
    }

    pub fn fill(&mut self, slot: Slot, bytes: Vec<u8>) {
        self.chunks[slot.0] = bytes;
    }

    /// Total length of the joined output.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn join(self) -> Vec<u8> {
        hex_join(self.chunks)
    }
}

/// Concatenate byte strings with no separators or padding.
pub fn hex_join<I, B>(parts: I) -> Vec<u8>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(part.as_ref());
    }
    out
}
