// Copyright 2026 gclock Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::error::{Error, Result};

const BITS_PER_BYTE: usize = 8;

/// A fixed-size bit set.
///
/// Bit `i` lives in byte `i / 8` under mask `1 << (i % 8)`. The size is fixed at creation and every operation on an
/// index `>= size` fails with [`crate::error::ErrorKind::OutOfRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet {
    bytes: Box<[u8]>,
    size: usize,
}

impl BitSet {
    /// Create a bit set holding `size` bits, all cleared.
    pub fn new(size: usize) -> Self {
        let bytes = vec![0u8; size.div_ceil(BITS_PER_BYTE)].into_boxed_slice();
        Self { bytes, size }
    }

    /// Set the bit at `index`.
    pub fn set(&mut self, index: usize) -> Result<()> {
        let (byte, mask) = self.locate(index)?;
        self.bytes[byte] |= mask;
        Ok(())
    }

    /// Clear the bit at `index`.
    pub fn clear(&mut self, index: usize) -> Result<()> {
        let (byte, mask) = self.locate(index)?;
        self.bytes[byte] &= !mask;
        Ok(())
    }

    /// Get the bit at `index`.
    pub fn get(&self, index: usize) -> Result<bool> {
        let (byte, mask) = self.locate(index)?;
        Ok(self.bytes[byte] & mask != 0)
    }

    /// Number of bits in the set.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the set holds no bits at all.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline(always)]
    fn locate(&self, index: usize) -> Result<(usize, u8)> {
        if index >= self.size {
            return Err(Error::out_of_range(index, self.size));
        }
        Ok((index / BITS_PER_BYTE, 1 << (index % BITS_PER_BYTE)))
    }
}
