use crate::{
    ConfigError, DEFAULT_GROWTH_STEP, DEFAULT_LOAD_FACTOR, DEFAULT_SIZE_EXPONENT,
    DEFAULT_STRIDE,
    probe::{self, Linear, Quadratic, Step, Triangular},
};

/// Largest accepted size exponent. Growth stops here.
pub const MAX_SIZE_EXPONENT: u32 = usize::BITS - 2;

/// Probe sequence used to resolve collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStrategy {
    /// `start + stride * s`
    Linear,
    /// `start + stride * s^2`
    Quadratic,
    /// `start + stride * s(s+1)/2`
    #[default]
    Triangular,
}

impl ProbeStrategy {
    /// Whether this strategy visits every slot of any power-of-two table
    /// before repeating, for the given stride.
    pub fn is_full_period(self, stride: usize) -> bool {
        match self {
            Self::Linear => Linear::is_full_period(stride),
            Self::Quadratic => Quadratic::is_full_period(stride),
            Self::Triangular => Triangular::is_full_period(stride),
        }
    }

    #[inline]
    pub(crate) fn probe<P>(self, start: usize, size_exponent: u32, stride: usize, stop: P) -> Option<usize>
    where
        P: FnMut(usize) -> bool,
    {
        match self {
            Self::Linear => probe::linear_probe(start, size_exponent, stride, stop),
            Self::Quadratic => probe::quad_probe(start, size_exponent, stride, stop),
            Self::Triangular => probe::triangular_probe(start, size_exponent, stride, stop),
        }
    }
}

/// Table shape and growth policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Initial capacity is `2^size_exponent`.
    pub size_exponent: u32,
    /// Grow once `len >= load_factor * capacity` before claiming a slot.
    pub load_factor: f64,
    /// Added to the size exponent on each growth.
    pub growth_step: u32,
    pub stride: usize,
    pub strategy: ProbeStrategy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            size_exponent: DEFAULT_SIZE_EXPONENT,
            load_factor: DEFAULT_LOAD_FACTOR,
            growth_step: DEFAULT_GROWTH_STEP,
            stride: DEFAULT_STRIDE,
            strategy: ProbeStrategy::default(),
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size_exponent(mut self, size_exponent: u32) -> Self {
        self.size_exponent = size_exponent;
        self
    }

    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn with_growth_step(mut self, growth_step: u32) -> Self {
        self.growth_step = growth_step;
        self
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_strategy(mut self, strategy: ProbeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reject shapes that could let a probe report "full" while a slot is
    /// free, or let the table saturate before growing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_exponent > MAX_SIZE_EXPONENT {
            return Err(ConfigError::SizeExponentTooLarge {
                exponent: self.size_exponent,
                max: MAX_SIZE_EXPONENT,
            });
        }
        // Also rejects NaN.
        if !(self.load_factor > 0.0 && self.load_factor < 1.0) {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        if self.growth_step == 0 {
            return Err(ConfigError::ZeroGrowthStep);
        }
        if self.growth_step > MAX_SIZE_EXPONENT - self.size_exponent {
            return Err(ConfigError::GrowthStepTooLarge {
                step: self.growth_step,
                size_exponent: self.size_exponent,
                max: MAX_SIZE_EXPONENT,
            });
        }
        if self.stride & 1 == 0 {
            return Err(ConfigError::EvenStride(self.stride));
        }
        if !self.strategy.is_full_period(self.stride) {
            return Err(ConfigError::PartialCoverage(self.strategy));
        }
        Ok(())
    }

    /// Number of entries a table of `capacity` slots holds before the next
    /// claim triggers growth.
    ///
    /// Smallest `n` with `n >= load_factor * capacity`, capped so at least
    /// one slot always stays vacant.
    pub(crate) fn growth_threshold(&self, capacity: usize) -> usize {
        let n = (self.load_factor * capacity as f64).ceil() as usize;
        n.min(capacity - 1)
    }

    /// Size exponent after one growth from `current`, clamped to
    /// [`MAX_SIZE_EXPONENT`]. `None` once the table sits at the maximum.
    pub(crate) fn grown_exponent(&self, current: u32) -> Option<u32> {
        if current >= MAX_SIZE_EXPONENT {
            return None;
        }
        Some(
            current
                .saturating_add(self.growth_step.max(1))
                .min(MAX_SIZE_EXPONENT),
        )
    }
}
