//! Renderer configuration.

use crate::{RenderError, RenderResult};

/// Default row alignment in bytes (canonical bitmap rows).
pub const DEFAULT_ROW_ALIGNMENT: usize = 4;

/// Default bytes of converted source rows kept per strip.
pub const DEFAULT_STRIP_BUDGET: usize = 65536;

/// Bitmap renderer configuration.
///
/// # Example
///
/// ```rust
/// use dcm_render::RenderConfig;
///
/// let config = RenderConfig {
///     row_alignment: 1,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.strip_rows(512), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Each output row is padded to a multiple of this many bytes.
    pub row_alignment: usize,
    /// Budget for one strip of source rows when a transform chain runs,
    /// counted as 3 bytes per pixel.
    pub strip_budget_bytes: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            row_alignment: DEFAULT_ROW_ALIGNMENT,
            strip_budget_bytes: DEFAULT_STRIP_BUDGET,
        }
    }
}

impl RenderConfig {
    /// Checks the configuration.
    pub fn validate(&self) -> RenderResult<()> {
        if self.row_alignment == 0 {
            return Err(RenderError::InvalidAlignment);
        }
        if self.strip_budget_bytes == 0 {
            return Err(RenderError::InvalidConfig(
                "strip_budget_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Number of source rows converted per strip for strips `strip_width`
    /// pixels wide. Never zero.
    pub fn strip_rows(&self, strip_width: u32) -> u32 {
        let row_bytes = (strip_width as usize).max(1) * 3;
        let rows = (self.strip_budget_bytes / row_bytes).max(1);
        u32::try_from(rows).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_rows() {
        let config = RenderConfig::default();
        assert_eq!(config.strip_rows(1), 21845);
        assert_eq!(config.strip_rows(100_000), 1);
        assert_eq!(config.strip_rows(0), 21845);
    }

    #[test]
    fn test_validate() {
        assert!(RenderConfig::default().validate().is_ok());
        let zero = RenderConfig {
            row_alignment: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(RenderError::InvalidAlignment)));
    }
}
