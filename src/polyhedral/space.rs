//! Polyhedral spaces define the dimensions of a piece or collection.
//!
//! A space describes:
//! - Parameter dimensions (symbolic constants)
//! - Input dimensions (for maps)
//! - Output dimensions (the set dimensions for sets)
//!
//! Existential divs are not part of the space; they belong to a piece.

use crate::utils::errors::{PolyError, PolyResult};
use crate::utils::intern::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a column in a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimType {
    /// Parameter dimension.
    Param,
    /// Input dimension.
    In,
    /// Output (set) dimension.
    Out,
    /// Existentially quantified integer division.
    Div,
}

/// A polyhedral space describes the dimensionality and structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Space {
    /// Number of parameter dimensions
    pub n_param: usize,
    /// Number of input dimensions (for maps only)
    pub n_in: usize,
    /// Number of set/output dimensions
    pub n_out: usize,
    /// Optional interned tuple name
    pub tuple: Option<Symbol>,
}

impl Space {
    /// Create a new set space with the given dimensions.
    pub fn set(n_dim: usize) -> Self {
        Self::map_with_params(0, n_dim, 0)
    }

    /// Create a new set space with parameters.
    pub fn set_with_params(n_dim: usize, n_param: usize) -> Self {
        Self::map_with_params(0, n_dim, n_param)
    }

    /// Create a new map space.
    pub fn map(n_in: usize, n_out: usize) -> Self {
        Self::map_with_params(n_in, n_out, 0)
    }

    /// Create a new map space with parameters.
    pub fn map_with_params(n_in: usize, n_out: usize, n_param: usize) -> Self {
        Self {
            n_param,
            n_in,
            n_out,
            tuple: None,
        }
    }

    /// Tag the space with a tuple name.
    pub fn with_tuple(mut self, tuple: Symbol) -> Self {
        self.tuple = Some(tuple);
        self
    }

    /// Check if this is a set space (no input dimensions).
    pub fn is_set(&self) -> bool {
        self.n_in == 0
    }

    /// Check if this is a map space (has input dimensions).
    pub fn is_map(&self) -> bool {
        self.n_in > 0
    }

    /// Number of dimensions of the given kind. Divs are not part of a space.
    pub fn dim(&self, ty: DimType) -> usize {
        match ty {
            DimType::Param => self.n_param,
            DimType::In => self.n_in,
            DimType::Out => self.n_out,
            DimType::Div => 0,
        }
    }

    /// Get the total number of dimensions.
    pub fn total_dim(&self) -> usize {
        self.n_param + self.n_in + self.n_out
    }

    /// Offset of the first variable of the given kind among the variables
    /// (not counting the constant column).
    pub fn offset(&self, ty: DimType) -> usize {
        match ty {
            DimType::Param => 0,
            DimType::In => self.n_param,
            DimType::Out => self.n_param + self.n_in,
            DimType::Div => self.total_dim(),
        }
    }

    /// Check that another space has the same signature.
    pub fn check_compatible(&self, other: &Space) -> PolyResult<()> {
        if self == other {
            Ok(())
        } else {
            Err(PolyError::invalid(format!(
                "incompatible spaces {} and {}",
                self, other
            )))
        }
    }

    /// The same space with `n` dimensions of the given kind removed.
    pub fn drop_dims(&self, ty: DimType, n: usize) -> PolyResult<Space> {
        let mut out = self.clone();
        let slot = match ty {
            DimType::Param => &mut out.n_param,
            DimType::In => &mut out.n_in,
            DimType::Out => &mut out.n_out,
            DimType::Div => return Err(PolyError::invalid("divs are not space dimensions")),
        };
        if *slot < n {
            return Err(PolyError::invalid(format!(
                "cannot drop {} dimensions of kind {:?} from {}",
                n, ty, self
            )));
        }
        *slot -= n;
        Ok(out)
    }

    /// A set space with the same total number of dimensions and no
    /// parameters or inputs.
    pub fn underlying(&self, n_div: usize) -> Space {
        Space::set(self.total_dim() + n_div)
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_map() {
            write!(f, "[{}] -> [{}]", self.n_in, self.n_out)?;
        } else {
            write!(f, "[{}]", self.n_out)?;
        }
        if self.n_param > 0 {
            write!(f, " : {} params", self.n_param)?;
        }
        Ok(())
    }
}
