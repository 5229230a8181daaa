//! sRGB <-> linear conversion tables
//!
//! Built once by whoever owns the renderer and passed around by reference;
//! there is no lazily initialised global.

/// Exponent approximating the sRGB transfer curve
pub const GAMMA: f32 = 2.2;

pub struct GammaTables {
    /// linear 8-bit level -> sRGB 8-bit level
    encode: [u8; 256],
    /// sRGB 8-bit level -> linear intensity in [0, 1]
    decode: [f32; 256],
}

impl GammaTables {
    pub fn new(gamma: f32) -> Self {
        let inv_gamma = 1.0 / gamma;
        let mut encode = [0u8; 256];
        let mut decode = [0f32; 256];

        for (i, (enc, dec)) in encode.iter_mut().zip(decode.iter_mut()).enumerate() {
            let c = i as f32 / 255.0;
            *enc = (c.powf(inv_gamma) * 255.0 + 0.5) as u8;
            *dec = c.powf(gamma);
        }

        Self { encode, decode }
    }

    /// Linear level to stored sRGB level
    #[inline]
    pub fn encode(&self, linear: u8) -> u8 {
        self.encode[linear as usize]
    }

    /// Stored sRGB level to linear intensity in [0, 1]
    #[inline]
    pub fn decode(&self, srgb: u8) -> f32 {
        self.decode[srgb as usize]
    }

    /// Linear intensity in [0, 1] to the sRGB level whose decoded value is
    /// nearest. Exact inverse of `decode` on its 256 outputs.
    pub fn encode_linear(&self, linear: f32) -> u8 {
        let linear = linear.clamp(0.0, 1.0);
        let above = self.decode.partition_point(|&v| v < linear);
        if above == 0 {
            return 0;
        }
        if above == self.decode.len() {
            return 255;
        }
        let below = above - 1;
        if linear - self.decode[below] <= self.decode[above] - linear {
            below as u8
        } else {
            above as u8
        }
    }
}

impl Default for GammaTables {
    fn default() -> Self {
        Self::new(GAMMA)
    }
}
