//! Texture-space to mesh-UV conversion.

use bbm_math::DVec2;

use crate::error::{ImportError, ImportResult};

/// Converts texture pixel coordinates into normalized mesh UVs.
///
/// Texture V grows downwards, mesh V grows upwards, so V is flipped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinatesConverter {
    texture_width: f64,
    texture_height: f64,
}

impl CoordinatesConverter {
    /// Fails if either texture dimension is zero.
    pub fn new(texture_width: u32, texture_height: u32) -> ImportResult<Self> {
        if texture_width == 0 || texture_height == 0 {
            return Err(ImportError::InvalidGeometry(format!(
                "texture size {}x{} has a zero dimension",
                texture_width, texture_height
            )));
        }

        Ok(Self {
            texture_width: f64::from(texture_width),
            texture_height: f64::from(texture_height),
        })
    }

    /// `(u / width, 1 - v / height)`
    pub fn convert(&self, uv: DVec2) -> DVec2 {
        DVec2::new(uv.x / self.texture_width, 1.0 - uv.y / self.texture_height)
    }
}
