//! Restartable lazy datasets
//!
//! A [`Dataset`] is a description of a stream: every call to
//! [`Dataset::iter`] starts a fresh pass. Combinators wrap a dataset and
//! transform each pass lazily, so nothing is read until a consumer pulls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;

/// A lazily evaluated, restartable stream of items
pub trait Dataset {
    type Item;

    /// Start a new pass over the dataset
    fn iter(&self) -> Box<dyn Iterator<Item = Self::Item> + '_>;

    /// Keep only items for which `predicate` returns true
    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        Self: Sized,
        P: Fn(&Self::Item) -> bool,
    {
        Filter { inner: self, predicate }
    }

    /// Shuffle through a reservoir of `buffer` items
    ///
    /// Each pass draws from a differently seeded generator, derived from
    /// `seed` and the pass number, so runs are reproducible.
    fn shuffle(self, buffer: usize, seed: u64) -> Shuffle<Self>
    where
        Self: Sized,
    {
        Shuffle { inner: self, buffer: buffer.max(1), seed, passes: Cell::new(0) }
    }

    /// Group consecutive items; the last group may be smaller
    fn batch(self, size: usize) -> Batched<Self>
    where
        Self: Sized,
    {
        assert!(size > 0, "batch size must be positive");
        Batched { inner: self, size }
    }

    /// Chain `count` passes, or passes forever with `None`
    ///
    /// A pass that yields nothing ends the repetition.
    fn repeat(self, count: Option<usize>) -> Repeat<Self>
    where
        Self: Sized,
    {
        Repeat { inner: self, count }
    }
}

/// In-memory dataset over cloned items
#[derive(Debug, Clone)]
pub struct VecDataset<T> {
    items: Vec<T>,
}

impl<T> VecDataset<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> Dataset for VecDataset<T> {
    type Item = T;

    fn iter(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new(self.items.iter().cloned())
    }
}

/// See [`Dataset::filter`]
pub struct Filter<D, P> {
    inner: D,
    predicate: P,
}

impl<D, P> Dataset for Filter<D, P>
where
    D: Dataset,
    P: Fn(&D::Item) -> bool,
{
    type Item = D::Item;

    fn iter(&self) -> Box<dyn Iterator<Item = D::Item> + '_> {
        Box::new(self.inner.iter().filter(|item| (self.predicate)(item)))
    }
}

/// See [`Dataset::shuffle`]
pub struct Shuffle<D> {
    inner: D,
    buffer: usize,
    seed: u64,
    passes: Cell<u64>,
}

impl<D: Dataset> Dataset for Shuffle<D> {
    type Item = D::Item;

    fn iter(&self) -> Box<dyn Iterator<Item = D::Item> + '_> {
        let pass = self.passes.get();
        self.passes.set(pass + 1);
        Box::new(ShuffleIter {
            source: self.inner.iter(),
            reservoir: Vec::with_capacity(self.buffer),
            capacity: self.buffer,
            rng: StdRng::seed_from_u64(self.seed.wrapping_add(pass)),
        })
    }
}

struct ShuffleIter<'a, T> {
    source: Box<dyn Iterator<Item = T> + 'a>,
    reservoir: Vec<T>,
    capacity: usize,
    rng: StdRng,
}

impl<T> Iterator for ShuffleIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.reservoir.len() < self.capacity {
            match self.source.next() {
                Some(item) => self.reservoir.push(item),
                None => break,
            }
        }
        if self.reservoir.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..self.reservoir.len());
        Some(self.reservoir.swap_remove(idx))
    }
}

/// See [`Dataset::batch`]
pub struct Batched<D> {
    inner: D,
    size: usize,
}

impl<D: Dataset> Dataset for Batched<D> {
    type Item = Vec<D::Item>;

    fn iter(&self) -> Box<dyn Iterator<Item = Vec<D::Item>> + '_> {
        let mut source = self.inner.iter();
        let size = self.size;
        Box::new(std::iter::from_fn(move || {
            let group: Vec<_> = source.by_ref().take(size).collect();
            (!group.is_empty()).then_some(group)
        }))
    }
}

/// See [`Dataset::repeat`]
pub struct Repeat<D> {
    inner: D,
    count: Option<usize>,
}

impl<D: Dataset> Dataset for Repeat<D> {
    type Item = D::Item;

    fn iter(&self) -> Box<dyn Iterator<Item = D::Item> + '_> {
        let mut remaining = self.count;
        let mut current: Option<Box<dyn Iterator<Item = D::Item> + '_>> = None;
        let mut pass_yielded = false;
        Box::new(std::iter::from_fn(move || loop {
            if let Some(pass) = current.as_mut() {
                if let Some(item) = pass.next() {
                    pass_yielded = true;
                    return Some(item);
                }
                current = None;
                if !pass_yielded {
                    return None;
                }
            }
            match remaining.as_mut() {
                Some(0) => return None,
                Some(n) => *n -= 1,
                None => {}
            }
            current = Some(self.inner.iter());
            pass_yielded = false;
        }))
    }
}
