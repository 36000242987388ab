use std::collections::VecDeque;
use std::fmt::Debug;
use std::marker::PhantomData;

use strata_error::{DbError, Result};

/// Pull-based lazy iterator.
///
/// Each advancement either yields an element, reports exhaustion with
/// `Ok(None)`, or fails. Advancement is where I/O happens; abandoning an
/// iterator mid-stream releases everything it held. Iterators are single
/// pass; restarting means re-running whatever discovery produced them.
///
/// Advancing past the end keeps returning `Ok(None)`, it's never an error.
pub trait LazyIterator: Debug + Send {
    type Item;

    fn next(&mut self) -> Result<Option<Self::Item>>;
}

impl<I: LazyIterator + ?Sized> LazyIterator for Box<I> {
    type Item = I::Item;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        (**self).next()
    }
}

/// Iterator that's always exhausted.
pub struct EmptyIterator<T>(PhantomData<T>);

impl<T> EmptyIterator<T> {
    pub const fn new() -> Self {
        EmptyIterator(PhantomData)
    }
}

impl<T> Default for EmptyIterator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> LazyIterator for EmptyIterator<T> {
    type Item = T;

    fn next(&mut self) -> Result<Option<T>> {
        Ok(None)
    }
}

impl<T> Debug for EmptyIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmptyIterator").finish()
    }
}

/// Iterator over an already materialized set of elements.
#[derive(Debug)]
pub struct VecIterator<T> {
    items: VecDeque<T>,
}

impl<T> VecIterator<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        VecIterator {
            items: items.into_iter().collect(),
        }
    }
}

impl<T: Debug + Send> LazyIterator for VecIterator<T> {
    type Item = T;

    fn next(&mut self) -> Result<Option<T>> {
        Ok(self.items.pop_front())
    }
}

/// Iterator that fails on the first advancement, then reports exhaustion.
///
/// Used to defer errors hit while setting up an iterator to the point where
/// the consumer actually pulls from it.
#[derive(Debug)]
pub struct OnceErrorIterator<T> {
    error: Option<DbError>,
    _item: PhantomData<T>,
}

impl<T> OnceErrorIterator<T> {
    pub fn new(error: DbError) -> Self {
        OnceErrorIterator {
            error: Some(error),
            _item: PhantomData,
        }
    }
}

impl<T: Debug + Send> LazyIterator for OnceErrorIterator<T> {
    type Item = T;

    fn next(&mut self) -> Result<Option<T>> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }
}

/// Collect all remaining elements, failing on the first error.
pub fn collect_all<I: LazyIterator>(mut iter: I) -> Result<Vec<I::Item>> {
    let mut out = Vec::new();
    while let Some(item) = iter.next()? {
        out.push(item);
    }
    Ok(out)
}
