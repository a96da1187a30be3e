//! Bisection configuration and gain strategies.

use crate::error::{Error, Result};

/// Gain model used to score candidate exchanges between the two halves of
/// a window.
///
/// All strategies share the same recursive skeleton; they differ in how a
/// move is priced, how candidates are accepted per iteration, and the
/// window size below which recursion stops.
///
/// | Strategy          | Candidates       | Accepted per iteration | Stops at len ≤ |
/// |-------------------|------------------|------------------------|----------------|
/// | `Basic`           | left × right     | all non-conflicting    | 1              |
/// | `BasicBestPair`   | left × right     | single best            | 1              |
/// | `MLogA`           | left × right     | single best            | 2              |
/// | `LogGap`          | best per side    | paired by rank         | 1              |
/// | `OneHop`          | best per side    | paired by rank         | 3              |
/// | `MLogGap`         | best per side    | paired by rank         | 3              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GainStrategy {
    /// Kernighan–Lin exchange gain from symmetric demand toward each half.
    #[default]
    Basic,

    /// Same gain as [`Basic`](Self::Basic), one swap per iteration.
    BasicBestPair,

    /// Log-distance address cost: moving a vertex changes
    /// `log2(|position difference|)` to every other vertex of the window.
    MLogA,

    /// Marginal change in expected encoding length of every neighbour of
    /// the moved vertex.
    LogGap,

    /// Marginal change in expected encoding length of the moved vertex
    /// itself, from its own same-side and other-side neighbour counts.
    OneHop,

    /// One-hop gain over directed demand, priced through a per-iteration
    /// table of every vertex's neighbour counts in both halves.
    MLogGap,
}

impl GainStrategy {
    /// All strategies, in declaration order.
    pub const ALL: [GainStrategy; 6] = [
        GainStrategy::Basic,
        GainStrategy::BasicBestPair,
        GainStrategy::MLogA,
        GainStrategy::LogGap,
        GainStrategy::OneHop,
        GainStrategy::MLogGap,
    ];

    /// Windows of this length or shorter are left untouched.
    pub fn min_window(self) -> usize {
        match self {
            GainStrategy::Basic | GainStrategy::BasicBestPair | GainStrategy::LogGap => 1,
            GainStrategy::MLogA => 2,
            GainStrategy::OneHop | GainStrategy::MLogGap => 3,
        }
    }

    /// Short lowercase name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            GainStrategy::Basic => "basic",
            GainStrategy::BasicBestPair => "basic-best-pair",
            GainStrategy::MLogA => "mloga",
            GainStrategy::LogGap => "loggap",
            GainStrategy::OneHop => "onehop",
            GainStrategy::MLogGap => "mloggap",
        }
    }

    /// True for strategies that score each side independently.
    pub(crate) fn is_per_side(self) -> bool {
        matches!(
            self,
            GainStrategy::LogGap | GainStrategy::OneHop | GainStrategy::MLogGap
        )
    }

    /// True for pairwise strategies that accept only the best pair.
    pub(crate) fn single_swap(self) -> bool {
        matches!(self, GainStrategy::BasicBestPair | GainStrategy::MLogA)
    }
}

impl std::fmt::Display for GainStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for GainStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        GainStrategy::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| Error::Precondition(format!("unknown gain strategy '{s}'")))
    }
}

/// Parameters of one [`reorder`](super::reorder) call.
///
/// # Examples
///
/// ```
/// use treelayout::bisection::{GainStrategy, ReorderConfig};
///
/// let config = ReorderConfig::default()
///     .with_strategy(GainStrategy::OneHop)
///     .with_max_iterations(10)
///     .with_parallel(false);
/// assert_eq!(config.max_depth, usize::MAX);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReorderConfig {
    /// Recursion levels below the top window. `usize::MAX` for unbounded.
    pub max_depth: usize,

    /// Exchange iterations per window.
    pub max_iterations: usize,

    /// Gain model.
    pub strategy: GainStrategy,

    /// Compute the gain grid and recurse into both halves on rayon.
    ///
    /// Requires the `parallel` feature.
    pub parallel: bool,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            max_depth: usize::MAX,
            max_iterations: 20,
            strategy: GainStrategy::Basic,
            parallel: false,
        }
    }
}

impl ReorderConfig {
    /// Sets the maximum recursion depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Bounds the depth to `⌈log2 n⌉ + 1` levels for `n` vertices.
    pub fn bounded(self, n: usize) -> Self {
        self.with_max_depth(default_max_depth(n))
    }

    /// Sets the number of exchange iterations per window.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the gain strategy.
    pub fn with_strategy(mut self, strategy: GainStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Rejects configurations this build cannot execute.
    pub fn validate(&self) -> Result<()> {
        if self.parallel && !cfg!(feature = "parallel") {
            return Err(Error::UnsupportedConfiguration(
                "parallel bisection requested but the `parallel` feature is disabled".into(),
            ));
        }
        Ok(())
    }
}

/// `⌈log2 n⌉ + 1`, the depth used by bounded reordering.
pub fn default_max_depth(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize + 1
    }
}
