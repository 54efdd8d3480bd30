//! Depleting reader over the fuzzing engine's input buffer.
//!
//! Every draw consumes bytes from the front. Once the buffer is exhausted
//! draws return zero instead of failing, so the same input always produces
//! the same sequence of values.

/// Byte stream cursor. Never errors.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// View of the unconsumed bytes. Use [`drain`](Self::drain) to mark any
    /// of them as consumed.
    pub fn data(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Bytes already consumed, in order.
    pub fn consumed(&self) -> &'a [u8] {
        &self.data[..self.pos]
    }

    /// Consume the next `n` bytes, or everything left if fewer remain.
    /// Returns the number actually consumed.
    pub fn drain(&mut self, n: usize) -> usize {
        let n = n.min(self.remaining());
        self.pos += n;
        n
    }

    /// Take up to `n` bytes as a slice.
    pub fn take(&mut self, n: usize) -> &'a [u8] {
        let start = self.pos;
        let n = self.drain(n);
        &self.data[start..start + n]
    }

    /// One byte, or 0 once exhausted.
    pub fn byte(&mut self) -> u8 {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                b
            }
            None => 0,
        }
    }

    /// Little-endian 64-bit value assembled from up to eight byte draws.
    /// Bytes past the end of the buffer count as zero.
    pub fn u64_le(&mut self) -> u64 {
        let mut val = 0u64;
        for shift in 0..8 {
            if self.remaining() == 0 {
                break;
            }
            val |= (self.byte() as u64) << (shift * 8);
        }
        val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_draws_then_zero() {
        let mut c = ByteCursor::new(&[7, 9]);
        assert_eq!(c.byte(), 7);
        assert_eq!(c.byte(), 9);
        assert_eq!(c.byte(), 0);
        assert_eq!(c.remaining(), 0);
        assert_eq!(c.position(), 2);
    }

    #[test]
    fn test_u64_little_endian() {
        let mut c = ByteCursor::new(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(c.u64_le(), 0x0807_0605_0403_0201);
        assert_eq!(c.remaining(), 1);
    }

    #[test]
    fn test_u64_zero_padded() {
        let mut c = ByteCursor::new(&[0xAA, 0xBB]);
        assert_eq!(c.u64_le(), 0xBBAA);
        assert_eq!(c.remaining(), 0);
        assert_eq!(c.u64_le(), 0);
    }

    #[test]
    fn test_drain_clamps() {
        let mut c = ByteCursor::new(&[1, 2, 3]);
        assert_eq!(c.drain(2), 2);
        assert_eq!(c.data(), &[3]);
        assert_eq!(c.consumed(), &[1, 2]);
        assert_eq!(c.drain(10), 1);
        assert!(c.data().is_empty());
        assert_eq!(c.drain(1), 0);
    }

    #[test]
    fn test_take_clamps() {
        let mut c = ByteCursor::new(&[1, 2, 3]);
        assert_eq!(c.take(2), &[1, 2]);
        assert_eq!(c.take(5), &[3]);
        assert!(c.take(1).is_empty());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let input = [3u8, 200, 17, 0, 0, 1, 2, 3, 4, 5, 6, 7];
        let draw = |data: &[u8]| {
            let mut c = ByteCursor::new(data);
            (c.byte(), c.u64_le(), c.byte(), c.u64_le())
        };
        assert_eq!(draw(&input), draw(&input));
    }
}
