//! Channel layout bit set

use bitflags::bitflags;

bitflags! {
    /// Set of channel positions present in a stream
    ///
    /// Interleaved frames carry one sample per set bit, in bit order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelMask: u32 {
        /// Front left (or mono)
        const LEFT = 1 << 0;
        /// Front right
        const RIGHT = 1 << 1;
        /// Left + right
        const STEREO = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

impl ChannelMask {
    /// Mask with the lowest `count` positions set (`count` is capped at 32)
    pub fn with_channels(count: usize) -> Self {
        let bits = match count {
            0 => 0,
            n if n >= 32 => u32::MAX,
            n => (1u32 << n) - 1,
        };
        ChannelMask::from_bits_retain(bits)
    }

    /// Number of channels in the mask
    pub fn num_channels(self) -> usize {
        self.bits().count_ones() as usize
    }
}
