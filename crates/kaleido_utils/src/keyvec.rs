use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// An append-only vector addressed by a typed key.
///
/// A key stays valid for the lifetime of the vector it came from.
pub struct KeyVec<K, V> {
    values: Vec<V>,
    _key: PhantomData<fn() -> K>,
}

pub trait Key: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

impl<K: Key, V> KeyVec<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn insert(&mut self, value: V) -> K {
        self.values.push(value);
        K::from_index(self.values.len() - 1)
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.values.get(key.index())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> Default for KeyVec<K, V> {
    fn default() -> Self {
        Self {
            values: vec![],
            _key: PhantomData,
        }
    }
}

impl<K, V: Clone> Clone for KeyVec<K, V> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            _key: PhantomData,
        }
    }
}

impl<K: Key, V> Index<K> for KeyVec<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &V {
        &self.values[key.index()]
    }
}

impl<K: Key, V> IndexMut<K> for KeyVec<K, V> {
    fn index_mut(&mut self, key: K) -> &mut V {
        &mut self.values[key.index()]
    }
}

impl<K: Key + fmt::Debug, V: fmt::Debug> fmt::Debug for KeyVec<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let keys = (0..).map(K::from_index);
        f.debug_map().entries(keys.zip(&self.values)).finish()
    }
}

/// Declare a newtype over `usize` usable as a [`KeyVec`] key.
#[macro_export]
macro_rules! declare_key_type {
    (
        $(#[$attr:meta])*
        $v:vis struct $name:ident;
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $v struct $name(usize);

        impl $crate::keyvec::Key for $name {
            fn from_index(index: usize) -> Self {
                Self(index)
            }

            fn index(self) -> usize {
                self.0
            }
        }
    };
}
pub use crate::declare_key_type;
