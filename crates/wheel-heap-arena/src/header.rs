//! In-buffer block header encoding.
//!
//! Every block starts with a 16-byte header stored little-endian inside the
//! arena buffer itself:
//!
//! ```text
//! +0  tag     u32   MAGIC_FREE for free blocks, the allocation stamp for used ones
//! +4  size    u32   payload capacity in bytes
//! +8  next    u32   offset of the next header, NO_NEXT for the last block
//! +12 seal    u32   check word over the three fields above
//! ```
//!
//! Free and used headers are sealed with different keys, so the seal alone
//! tells them apart and a used block's stamp may take any `u32` value. The
//! stamp identifies one particular allocation of the block; a handle kept
//! across a release and a later reallocation of the same offset no longer
//! matches it.

/// Size of a block header in bytes.
pub const HEADER_SIZE: usize = 16;

const MAGIC_FREE: u32 = 0xF4EE_B10C;
const FREE_SEAL_KEY: u32 = 0x5EA1_D00D;
const USED_SEAL_KEY: u32 = 0x0B57_A11C;
const NO_NEXT: u32 = u32::MAX;

/// Decoded view of a block header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    pub(crate) size: u32,
    pub(crate) is_free: bool,
    pub(crate) next: Option<u32>,
    /// Allocation stamp; always 0 for free blocks.
    pub(crate) stamp: u32,
}

impl BlockHeader {
    pub(crate) fn free(size: u32, next: Option<u32>) -> Self {
        Self {
            size,
            is_free: true,
            next,
            stamp: 0,
        }
    }

    /// Mark the block allocated under `stamp`.
    pub(crate) fn claim(&mut self, stamp: u32) {
        self.is_free = false;
        self.stamp = stamp;
    }

    /// Mark the block free, dropping its stamp.
    pub(crate) fn vacate(&mut self) {
        self.is_free = true;
        self.stamp = 0;
    }

    /// Offset one past the end of this block's payload.
    pub(crate) fn end(&self, offset: u32) -> u64 {
        offset as u64 + HEADER_SIZE as u64 + self.size as u64
    }

    /// Decode the header stored at `offset`.
    ///
    /// Returns `None` if the header would cross the buffer end or the seal
    /// matches neither a free nor a used header.
    pub(crate) fn read(buf: &[u8], offset: u32) -> Option<Self> {
        let start = offset as usize;
        let bytes = buf.get(start..start.checked_add(HEADER_SIZE)?)?;
        let word = |i: usize| {
            u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
        };

        let tag = word(0);
        let size = word(4);
        let raw_next = word(8);
        let check = word(12);
        let next = (raw_next != NO_NEXT).then_some(raw_next);
        if tag == MAGIC_FREE && check == seal(MAGIC_FREE, size, raw_next, FREE_SEAL_KEY) {
            return Some(Self::free(size, next));
        }
        if check == seal(tag, size, raw_next, USED_SEAL_KEY) {
            return Some(Self {
                size,
                is_free: false,
                next,
                stamp: tag,
            });
        }
        None
    }

    /// Encode this header at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the header does not fit in `buf` at `offset`.
    pub(crate) fn write(&self, buf: &mut [u8], offset: u32) {
        let (tag, key) = if self.is_free {
            (MAGIC_FREE, FREE_SEAL_KEY)
        } else {
            (self.stamp, USED_SEAL_KEY)
        };
        let next = self.next.unwrap_or(NO_NEXT);
        let start = offset as usize;
        let out = &mut buf[start..start + HEADER_SIZE];
        out[0..4].copy_from_slice(&tag.to_le_bytes());
        out[4..8].copy_from_slice(&self.size.to_le_bytes());
        out[8..12].copy_from_slice(&next.to_le_bytes());
        out[12..16].copy_from_slice(&seal(tag, self.size, next, key).to_le_bytes());
    }

    /// Overwrite the header at `offset` with zeros so it can no longer be
    /// mistaken for a live block.
    pub(crate) fn scrub(buf: &mut [u8], offset: u32) {
        let start = offset as usize;
        buf[start..start + HEADER_SIZE].fill(0);
    }
}

fn seal(tag: u32, size: u32, next: u32, key: u32) -> u32 {
    tag ^ size.rotate_left(11) ^ next.rotate_left(22) ^ key
}
