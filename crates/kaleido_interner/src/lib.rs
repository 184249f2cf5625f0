mod arena;

use std::fmt;
use std::num::NonZeroU32;

use ahash::RandomState;
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;

use arena::StrArena;

/// A handle to an interned string.
///
/// Symbols are only meaningful for the [`Interner`] that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(NonZeroU32);

#[derive(Default)]
pub struct Interner {
    random_state: RandomState,
    lookup: HashTable<Index>,
    arena: StrArena,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the existing symbol if it was seen before.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX - 1` distinct strings are interned.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let hash = self.random_state.hash_one(s);

        let entry = self.lookup.entry(
            hash,
            |&index| self.arena.get(index.index) == Some(s),
            |&index| index.hash,
        );

        let index = match entry {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let index = Index {
                    index: self.arena.push_str(s),
                    hash,
                };

                entry.insert(index);
                index
            }
        };

        Self::symbol(index).expect("too many interned strings")
    }

    /// The symbol for `s`, if it has been interned.
    pub fn find(&self, s: &str) -> Option<Symbol> {
        let hash = self.random_state.hash_one(s);

        self.lookup
            .find(hash, |&index| self.arena.get(index.index) == Some(s))
            .and_then(|&index| Self::symbol(index))
    }

    fn symbol(index: Index) -> Option<Symbol> {
        u32::try_from(index.index + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Symbol)
    }

    #[inline]
    pub fn get(&self, symbol: Symbol) -> Option<&str> {
        self.arena.get(symbol.0.get() as usize - 1)
    }

    /// # Panics
    /// Panics if the symbol came from a different interner.
    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.get(symbol).expect("symbol not in interner")
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..self.arena.len()).filter_map(|i| self.arena.get(i)))
            .finish()
    }
}

#[derive(Clone, Copy)]
struct Index {
    index: usize,
    hash: u64,
}
