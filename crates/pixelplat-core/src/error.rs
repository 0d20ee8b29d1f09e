//! Error types for pixelplat-core operations.
//!
//! Construction of collision masks can fail on caller bugs (oversized or
//! empty source regions). Everything else in the core degrades gracefully:
//! collision queries against missing data resolve to "no hit".

use std::fmt;

/// Core error type for pixelplat physics operations
#[derive(Debug, Clone)]
pub enum PhysicsError {
    /// Collision mask dimension exceeded
    MaskTooLarge {
        width: usize,
        height: usize,
        max_dimension: usize,
    },

    /// Collision mask with no area
    EmptyMaskRegion,
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaskTooLarge { width, height, max_dimension } => {
                write!(
                    f,
                    "Collision mask too large: {}x{} (max {}x{})",
                    width, height, max_dimension, max_dimension
                )
            }
            Self::EmptyMaskRegion => {
                write!(f, "Collision mask region has no area")
            }
        }
    }
}

impl std::error::Error for PhysicsError {}

/// Convenience type alias
pub type Result<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_too_large_display() {
        let err = PhysicsError::MaskTooLarge {
            width: 5000,
            height: 128,
            max_dimension: 4096,
        };
        assert!(err.to_string().contains("5000x128"));
        assert!(err.to_string().contains("4096"));
    }

    #[test]
    fn test_empty_region_display() {
        let err = PhysicsError::EmptyMaskRegion;
        assert!(err.to_string().contains("no area"));
    }
}
