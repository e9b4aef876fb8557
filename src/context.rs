//! Explicit context threaded through the engine.
//!
//! The context owns the options that steer the heavier algorithms and the
//! interning table for tuple names. Nothing in the engine reads global state.

use crate::polyhedral::space::Space;
use crate::utils::intern::{Symbol, SymbolInterner};
use serde::{Deserialize, Serialize};

/// Default bound on branch-and-bound nodes explored by the integer sampler.
pub const DEFAULT_MAX_SAMPLE_NODES: usize = 20_000;

/// Default bound on simplex pivots per LP solve.
pub const DEFAULT_MAX_PIVOTS: usize = 200_000;

/// Strategy used by the convex hull engine once the input has been reduced
/// to a full-dimensional collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HullStrategy {
    /// Facet wrapping for bounded inputs; unbounded inputs are homogenized
    /// along a valid direction where possible.
    #[default]
    Wrap,
    /// Pairwise Fourier-Motzkin elimination for every input.
    FourierMotzkin,
}

/// Tunable options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Convex hull strategy.
    pub hull_strategy: HullStrategy,
    /// Branch-and-bound node limit of the integer sampler.
    pub max_sample_nodes: usize,
    /// Pivot limit per LP solve.
    pub max_pivots: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            hull_strategy: HullStrategy::Wrap,
            max_sample_nodes: DEFAULT_MAX_SAMPLE_NODES,
            max_pivots: DEFAULT_MAX_PIVOTS,
        }
    }
}

/// Engine context: options plus the interning table.
#[derive(Debug, Default)]
pub struct Context {
    /// Options steering the algorithms.
    pub options: Options,
    names: SymbolInterner,
}

impl Context {
    /// A context with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with the given options.
    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            names: SymbolInterner::new(),
        }
    }

    /// Select the hull strategy.
    pub fn with_hull_strategy(mut self, strategy: HullStrategy) -> Self {
        self.options.hull_strategy = strategy;
        self
    }

    /// Intern a tuple name.
    pub fn intern(&mut self, name: &str) -> Symbol {
        self.names.intern(name)
    }

    /// Resolve a tuple name.
    pub fn name(&self, sym: Symbol) -> Option<&str> {
        self.names.resolve(sym)
    }

    /// A set space tagged with an interned tuple name.
    pub fn named_set_space(&mut self, name: &str, n_dim: usize) -> Space {
        let sym = self.intern(name);
        Space::set(n_dim).with_tuple(sym)
    }
}
