use bumpalo::Bump;

/// Append-only string storage. Strings are copied into a bump allocator and
/// addressed by insertion index.
#[derive(Default)]
pub struct StrArena {
    strs: Vec<*const str>,
    alloc: Bump,
}

impl StrArena {
    #[inline]
    pub fn push_str(&mut self, s: &str) -> usize {
        let index = self.strs.len();

        let s = &*self.alloc.alloc_str(s);
        self.strs.push(s as *const str);

        index
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strs
            .get(index)
            // Safety:
            // - The bump allocator never moves or frees its allocations while
            //   `self` is alive.
            // - No mutable references to the strings are ever handed out.
            .map(|&ptr| unsafe { &*ptr })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strs.len()
    }
}
