//! Construction parameters for [`AdaptiveHashTable`](crate::AdaptiveHashTable).

use crate::error::ConfigError;

/// Largest supported size exponent. Bucket indices come from a 32-bit mix,
/// so more than 2^32 buckets would never be addressed.
pub const MAX_LOGSIZE: u32 = if usize::BITS > 32 { 32 } else { usize::BITS - 1 };

/// Size exponent, growth threshold and growth ceiling of a table.
///
/// `growfactor` is the average chain length that triggers growth: the table
/// doubles once live entries exceed `2^logsize * growfactor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    pub logsize: u32,
    pub growfactor: u32,
    pub max_logsize: u32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            logsize: 4,
            growfactor: 1,
            max_logsize: MAX_LOGSIZE,
        }
    }
}

impl TableConfig {
    pub fn new(logsize: u32, growfactor: u32) -> Self {
        Self {
            logsize,
            growfactor,
            ..Self::default()
        }
    }

    /// Caps growth; once the table reaches `max_logsize` further growth fails.
    pub fn with_max_logsize(mut self, max_logsize: u32) -> Self {
        self.max_logsize = max_logsize;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.growfactor == 0 {
            return Err(ConfigError::ZeroGrowFactor);
        }
        if self.max_logsize > MAX_LOGSIZE {
            return Err(ConfigError::MaxLogSizeTooLarge {
                max_logsize: self.max_logsize,
                limit: MAX_LOGSIZE,
            });
        }
        if self.logsize > self.max_logsize {
            return Err(ConfigError::LogSizeTooLarge {
                logsize: self.logsize,
                max: self.max_logsize,
            });
        }
        Ok(())
    }
}
