//! Lazy sequences of representations.
//!
//! Every step returns an [`Entries`]: a boxed, single-pass iterator whose
//! items are `Result`s, so a failure sits at exactly the position where the
//! offending representation would have been.

use crate::Upcaster;

/// A lazy, single-pass sequence of representations.
pub type Entries<T, E> = Box<dyn Iterator<Item = Result<T, E>> + Send>;

/// An empty sequence: the entry is dropped.
pub fn empty<T, E>() -> Entries<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    Box::new(std::iter::empty())
}

/// A sequence of exactly one representation.
pub fn single<T, E>(entry: T) -> Entries<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    Box::new(std::iter::once(Ok(entry)))
}

/// A sequence yielding every representation of `entries`, in order.
pub fn many<T, E, I>(entries: I) -> Entries<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    Box::new(entries.into_iter().map(Ok))
}

/// A sequence that fails immediately with `error`.
pub fn failed<T, E>(error: E) -> Entries<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    Box::new(std::iter::once(Err(error)))
}

/// Flattens one source sequence through `steps[first..]`, pulling only as
/// far as needed to produce the next output.
///
/// Level 0 is the source. Level `j > 0` is the output currently being
/// drained from `steps[first + j - 1]`. Whenever a level yields a value it is
/// fed to the next step, whose output becomes the next level; whenever a
/// level runs dry the cascade falls back to the level below. When a level is
/// being pulled, every level above it is empty.
pub(crate) struct Cascade<T, E> {
    source: Entries<T, E>,
    first: usize,
    levels: Vec<Option<Entries<T, E>>>,
}

impl<T, E> Cascade<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// A cascade feeding `source` through `steps[first..len]`.
    pub(crate) fn new(source: Entries<T, E>, first: usize, len: usize) -> Self {
        Self {
            source,
            first,
            levels: (first..len).map(|_| None).collect(),
        }
    }

    /// A cascade that yields nothing.
    pub(crate) fn drained() -> Self {
        Self::new(empty(), 0, 0)
    }

    /// Pull the next fully transformed representation.
    pub(crate) fn next(
        &mut self,
        steps: &mut [Box<dyn Upcaster<T, E>>],
    ) -> Option<Result<T, E>> {
        let top = self.levels.len();
        let mut level = top;
        loop {
            let pulled = if level == 0 {
                self.source.next()
            } else {
                self.levels[level - 1].as_mut().and_then(|out| out.next())
            };

            match pulled {
                None if level == 0 => return None,
                None => {
                    self.levels[level - 1] = None;
                    level -= 1;
                }
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(entry)) if level == top => return Some(Ok(entry)),
                Some(Ok(entry)) => {
                    let out = steps[self.first + level].upcast(entry);
                    self.levels[level] = Some(out);
                    level += 1;
                }
            }
        }
    }
}
