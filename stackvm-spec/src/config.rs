//! # Machine Configuration
//!
//! Sizing and policy knobs for the stack machine. Front-ends build one of
//! these (or take [`MachineConfig::DEFAULT`]) and hand it to the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What WRITE does with an address past the end of memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MemoryPolicy {
    /// Memory keeps its load-time size; out-of-range access faults
    #[default]
    Fixed,
    /// WRITE grows memory up to `max_memory_cells`; reads past the end yield 0
    Grow,
}

/// Stack machine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Number of memory cells allocated at load time
    pub memory_size: usize,
    /// Maximum number of values on the data stack
    pub max_stack_depth: usize,
    /// Out-of-range WRITE behaviour
    pub memory_policy: MemoryPolicy,
    /// Hard ceiling for [`MemoryPolicy::Grow`]
    pub max_memory_cells: usize,
}

impl MachineConfig {
    /// Default configuration
    /// - 4096 memory cells
    /// - 256-deep stack
    /// - fixed-size memory
    /// - growth ceiling of 1M cells
    pub const DEFAULT: Self = Self {
        memory_size: 4096,
        max_stack_depth: 256,
        memory_policy: MemoryPolicy::Fixed,
        max_memory_cells: 1 << 20,
    };

    /// Create a new configuration with validation
    pub const fn new(
        memory_size: usize,
        max_stack_depth: usize,
        memory_policy: MemoryPolicy,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            memory_size,
            max_stack_depth,
            memory_policy,
            max_memory_cells: Self::DEFAULT.max_memory_cells,
        };

        if memory_size == 0 {
            return Err(ConfigError::ZeroMemory);
        }
        if max_stack_depth == 0 {
            return Err(ConfigError::ZeroStackDepth);
        }
        if memory_size > config.max_memory_cells {
            return Err(ConfigError::MemoryExceedsLimit);
        }

        Ok(config)
    }

    /// Same configuration with a different memory policy
    pub const fn with_memory_policy(mut self, policy: MemoryPolicy) -> Self {
        self.memory_policy = policy;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_size == 0 {
            return Err(ConfigError::ZeroMemory);
        }
        if self.max_stack_depth == 0 {
            return Err(ConfigError::ZeroStackDepth);
        }
        if self.memory_size > self.max_memory_cells {
            return Err(ConfigError::MemoryExceedsLimit);
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MachineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MachineConfig {{ memory: {} cells ({:?}, max {}), stack depth: {} }}",
            self.memory_size, self.memory_policy, self.max_memory_cells, self.max_stack_depth,
        )
    }
}

/// Configuration error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Memory must have at least one cell
    ZeroMemory,
    /// Stack must hold at least one value
    ZeroStackDepth,
    /// Initial memory is larger than the growth ceiling
    MemoryExceedsLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroMemory => write!(f, "memory_size must be at least 1"),
            ConfigError::ZeroStackDepth => write!(f, "max_stack_depth must be at least 1"),
            ConfigError::MemoryExceedsLimit => {
                write!(f, "memory_size must not exceed max_memory_cells")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
