//! Pool configuration, validation, and error types.
//!
//! [`PoolConfig`] describes the address range, the number of stacks, the
//! overflow policy, and the initial layout. [`validate()`](PoolConfig::validate)
//! checks structural invariants before the allocator is built; all values
//! are immutable afterwards.

use std::error::Error;
use std::fmt;

use stackpool_core::Addr;

// ── PolicyKind ─────────────────────────────────────────────────────

/// Which built-in overflow policy the allocator uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicyKind {
    /// Shift the nearest stacks by one cell toward the closest slack.
    #[default]
    Local,
    /// Recompute every boundary in proportion to recent growth
    /// (Algorithm G) and migrate all stacks.
    Growth,
}

// ── InitialLayout ──────────────────────────────────────────────────

/// Where the stacks start out inside the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitialLayout {
    /// Every stack starts at `L0`; all free space belongs to stack `n`.
    #[default]
    Packed,
    /// Stack `j` starts at `L0 + floor((j-1) * (Lend-L0) / n)`, giving each
    /// stack an equal share of free space up front.
    Even,
}

impl InitialLayout {
    /// Initial base address of every stack, in table order.
    pub fn bases(self, l0: Addr, l_end: Addr, stacks: usize) -> Vec<Addr> {
        match self {
            Self::Packed => vec![l0; stacks],
            Self::Even => {
                let span = (l_end - l0) as u128;
                let n = stacks as u128;
                (0..stacks)
                    .map(|j| l0 + (j as u128 * span / n) as Addr)
                    .collect()
            }
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`PoolConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Zero stacks requested.
    NoStacks,
    /// `l_end` lies below `l0`.
    InvertedRange {
        /// Configured lowest address.
        l0: Addr,
        /// Configured highest address.
        l_end: Addr,
    },
    /// The flat share is NaN, infinite, or outside `[0, 1]`.
    InvalidFlatShare {
        /// The invalid value.
        value: f64,
    },
    /// The pool would need more cells than can be addressed.
    AddressOverflow {
        /// The offending `l_end`.
        value: Addr,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStacks => write!(f, "at least one stack is required"),
            Self::InvertedRange { l0, l_end } => {
                write!(f, "l_end {l_end} is below l0 {l0}")
            }
            Self::InvalidFlatShare { value } => {
                write!(f, "flat_share must be finite and within [0, 1], got {value}")
            }
            Self::AddressOverflow { value } => {
                write!(f, "l_end {value} leaves no room for the cell array")
            }
        }
    }
}

impl Error for ConfigError {}

// ── PoolConfig ─────────────────────────────────────────────────────

/// Complete configuration for a [`MultiStack`](crate::MultiStack).
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Lowest address `L0`, the exclusive base of stack 1.
    pub l0: Addr,
    /// Highest address `Lend`. Usable capacity is `l_end - l0`.
    pub l_end: Addr,
    /// Number of stacks `n`. Must be at least 1.
    pub stacks: usize,
    /// Overflow policy. Default: [`PolicyKind::Local`].
    pub policy: PolicyKind,
    /// Initial placement of stack bases. Default: [`InitialLayout::Packed`].
    pub layout: InitialLayout,
    /// Fraction of free space shared equally among stacks during a growth
    /// reallocation; the remainder is split by recent growth.
    ///
    /// Default: 0.1. Must lie within `[0, 1]`.
    pub flat_share: f64,
}

impl PoolConfig {
    /// Default flat share: 10% equal, 90% growth-weighted.
    pub const DEFAULT_FLAT_SHARE: f64 = 0.1;

    /// Configuration for `stacks` stacks over addresses `l0..=l_end`,
    /// with default policy, layout, and flat share.
    pub fn new(l0: Addr, l_end: Addr, stacks: usize) -> Self {
        Self {
            l0,
            l_end,
            stacks,
            policy: PolicyKind::default(),
            layout: InitialLayout::default(),
            flat_share: Self::DEFAULT_FLAT_SHARE,
        }
    }

    /// Set the overflow policy.
    pub fn policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Set the initial layout.
    pub fn layout(mut self, layout: InitialLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the growth reallocation flat share.
    pub fn flat_share(mut self, flat_share: f64) -> Self {
        self.flat_share = flat_share;
        self
    }

    /// Usable cells, `l_end - l0`. Only meaningful after validation.
    pub fn capacity(&self) -> usize {
        self.l_end.saturating_sub(self.l0)
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stacks == 0 {
            return Err(ConfigError::NoStacks);
        }
        if self.l_end < self.l0 {
            return Err(ConfigError::InvertedRange {
                l0: self.l0,
                l_end: self.l_end,
            });
        }
        // A pending push may reserve the slot at l_end + 1.
        if self.l_end == usize::MAX {
            return Err(ConfigError::AddressOverflow { value: self.l_end });
        }
        if !self.flat_share.is_finite() || !(0.0..=1.0).contains(&self.flat_share) {
            return Err(ConfigError::InvalidFlatShare {
                value: self.flat_share,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// Four stacks over `0..=10`, the layout used in Knuth's worked examples.
    fn default() -> Self {
        Self::new(0, 10, 4)
    }
}
