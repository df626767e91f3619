use std::hash::{Hash, Hasher};

/// A bit-exact wrapper around `f32` that implements `Eq` and `Hash`.
///
/// Floating point values that end up inside state keys (sampler definitions,
/// rasterizer state, clear values) must hash and compare deterministically.
/// Comparing the raw bit pattern does that, at the price of treating `-0.0`
/// and `0.0` as different values and all NaN payloads as distinct, which is
/// acceptable for cache keys.
#[derive(Copy, Clone, Debug, Default)]
pub struct DecimalF32(pub f32);

impl DecimalF32 {
    pub fn to_bits(self) -> u32 {
        self.0.to_bits()
    }
}

impl PartialEq for DecimalF32 {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for DecimalF32 {}

impl Hash for DecimalF32 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_exact_equality() {
        assert_eq!(DecimalF32(1.5), DecimalF32(1.5));
        assert_ne!(DecimalF32(0.0), DecimalF32(-0.0));
        assert_eq!(DecimalF32(f32::NAN), DecimalF32(f32::NAN));
    }
}
