/// Packed 16-bit texel: red in bits 0–4, green 5–9, blue 10–14, alpha bit 15.
///
/// The alpha bit is a chroma key, not coverage: it is set whenever the source
/// red sample is non-zero. Black-on-red glyph images rely on this rule, so it
/// must not be "fixed" into a luminance or full-channel test.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Rgba5551(pub u16);

impl Rgba5551 {
    const CHANNEL_MASK: u16 = 0x1f;
    const ALPHA_BIT: u16 = 1 << 15;

    /// Packs an 8-bit-per-channel sample, keeping the top 5 bits of each channel.
    #[inline]
    pub const fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        let r5 = (r >> 3) as u16;
        let g5 = (g >> 3) as u16;
        let b5 = (b >> 3) as u16;
        let a1 = if r != 0 { Self::ALPHA_BIT } else { 0 };
        Self(r5 | (g5 << 5) | (b5 << 10) | a1)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 & Self::CHANNEL_MASK) as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        ((self.0 >> 5) & Self::CHANNEL_MASK) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        ((self.0 >> 10) & Self::CHANNEL_MASK) as u8
    }

    #[inline]
    pub const fn alpha(self) -> bool {
        self.0 & Self::ALPHA_BIT != 0
    }

    /// Expands to 8-bit RGBA (alpha is 0 or 255).
    #[inline]
    pub const fn to_rgba8(self) -> [u8; 4] {
        [
            expand5(self.red()),
            expand5(self.green()),
            expand5(self.blue()),
            if self.alpha() { 255 } else { 0 },
        ]
    }
}

impl From<u16> for Rgba5551 {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// Replicates the high bits into the low bits so 31 maps to 255.
#[inline]
const fn expand5(c: u8) -> u8 {
    (c << 3) | (c >> 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_is_zero_and_transparent() {
        let c = Rgba5551::from_rgb888(0, 0, 0);
        assert_eq!(c.raw(), 0);
        assert!(!c.alpha());
    }

    #[test]
    fn channel_layout() {
        assert_eq!(Rgba5551::from_rgb888(255, 0, 0).raw(), 0x801f);
        assert_eq!(Rgba5551::from_rgb888(0, 255, 0).raw(), 0x03e0);
        assert_eq!(Rgba5551::from_rgb888(0, 0, 255).raw(), 0x7c00);
    }

    #[test]
    fn alpha_follows_red_only() {
        assert!(Rgba5551::from_rgb888(1, 0, 0).alpha());
        assert!(!Rgba5551::from_rgb888(0, 255, 255).alpha());
    }

    #[test]
    fn low_bits_are_truncated() {
        let c = Rgba5551::from_rgb888(0b0000_0111, 0b1111_1000, 0b0000_1000);
        assert_eq!(c.red(), 0);
        assert_eq!(c.green(), 31);
        assert_eq!(c.blue(), 1);
        // Red was non-zero, so the key bit is set even though the red channel rounds to 0.
        assert!(c.alpha());
    }

    #[test]
    fn expansion_hits_full_range() {
        assert_eq!(Rgba5551::from_rgb888(255, 255, 255).to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Rgba5551::from_rgb888(0, 0, 0).to_rgba8(), [0, 0, 0, 0]);
    }
}
