//! Versioned state cells.

/// A piece of state that remembers how many times it has been written.
///
/// Anything derived from an atom (evaluated bindings, rendered output) can
/// record the version it was computed from and later tell whether it is
/// stale by comparing against [`Atom::version`].
#[derive(Debug, Clone, Default)]
pub struct Atom<T> {
    value: T,
    version: u64,
}

impl<T> Atom<T> {
    /// Constructor.
    pub fn new(value: T) -> Self {
        Self { value, version: 0 }
    }

    /// Get a reference to the current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// The number of writes this atom has seen.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the value, returning the previous one.
    pub fn set(&mut self, value: T) -> T {
        self.version += 1;
        std::mem::replace(&mut self.value, value)
    }

    /// Modify the value in place. Always counts as a write, whether or not
    /// `f` actually changes anything.
    pub fn update<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.version += 1;
        f(&mut self.value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_bump_version() {
        let mut atom = Atom::new(vec![1, 2]);
        assert_eq!(atom.version(), 0);
        let prev = atom.set(vec![3]);
        assert_eq!(prev, vec![1, 2]);
        assert_eq!(atom.version(), 1);
        let len = atom.update(|v| {
            v.push(4);
            v.len()
        });
        assert_eq!(len, 2);
        assert_eq!(atom.get(), &vec![3, 4]);
        assert_eq!(atom.version(), 2);
    }
}
