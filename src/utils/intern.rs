//! Symbol interning for tuple names.
//!
//! The interner is owned by a [`crate::Context`]; there is no global table.

use string_interner::{backend::StringBackend, DefaultSymbol, StringInterner, Symbol as SymbolTrait};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type alias for our interner backend
type Backend = StringBackend<DefaultSymbol>;

/// A symbol representing an interned string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(u32);

impl Symbol {
    /// Raw index of the symbol in its interner.
    pub fn as_raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// A symbol interner for efficient string storage.
#[derive(Debug)]
pub struct SymbolInterner {
    interner: StringInterner<Backend>,
}

impl Default for SymbolInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self { interner: StringInterner::new() }
    }

    /// Intern `s`, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let sym = self.interner.get_or_intern(s);
        Symbol(sym.to_usize() as u32)
    }

    /// Look up the string behind a symbol.
    pub fn resolve(&self, sym: Symbol) -> Option<&str> {
        let internal_sym = DefaultSymbol::try_from_usize(sym.0 as usize)?;
        self.interner.resolve(internal_sym)
    }

    /// Symbol of an already interned string.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.interner.get(s).map(|sym| Symbol(sym.to_usize() as u32))
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.interner.len()
    }

    /// Whether nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.interner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner() {
        let mut interner = SymbolInterner::new();
        let sym1 = interner.intern("S");
        let sym2 = interner.intern("T");
        let sym3 = interner.intern("S");
        assert_eq!(sym1, sym3);
        assert_ne!(sym1, sym2);
        assert_eq!(interner.resolve(sym1), Some("S"));
        assert_eq!(interner.get("T"), Some(sym2));
        assert_eq!(interner.len(), 2);
    }
}
