use heapless::Vec;

/// Fixed-capacity storage for one inbound payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketBuffer<const N: usize> {
    data: Vec<u8, N>,
}

impl<const N: usize> PacketBuffer<N> {
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Append one byte; `false` once the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        self.data.push(byte).is_ok()
    }

    /// Replace the contents with `other`'s bytes.
    pub fn copy_from(&mut self, other: &PacketBuffer<N>) {
        self.data.clone_from(&other.data);
    }

    /// Copy the payload into `out` and return its length.
    pub fn copy_into(&self, out: &mut [u8; N]) -> usize {
        let len = self.data.len();
        out[..len].copy_from_slice(&self.data);
        len
    }
}
