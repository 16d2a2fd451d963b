use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::entries::Cascade;
use crate::{StatelessUpcaster, UpcastError, Upcaster, UpcasterFactory};

/// An ordered chain of upcasters applied to a stream of stored representations.
///
/// The chain holds factories rather than steps: every call to
/// [`UpcasterChain::upcast`] instantiates its own steps, so state gathered in
/// one replay never reaches another and the chain can be shared freely
/// between threads.
///
/// The output of a pass is every input entry flattened through all steps, in
/// input order, followed by the remainder of each step in chain order. A
/// step's remainder only flows through the steps after it.
///
/// # Example
///
/// ```
/// use upcast_chain::prelude::*;
/// use upcast_chain::entries;
///
/// let chain = UpcasterChain::<u32>::builder()
///     .name("numbers")
///     .then_shared(from_fn(|n: u32| {
///         if n % 2 == 1 { entries::empty() } else { entries::single(n) }
///     }))
///     .then_shared(from_fn(|n: u32| entries::many(vec![n, n])))
///     .build();
///
/// let out: Vec<u32> = chain.upcast_ok(vec![1, 2, 3, 4]).collect::<Result<_, _>>().unwrap();
/// assert_eq!(out, vec![2, 2, 4, 4]);
/// ```
pub struct UpcasterChain<T, E = UpcastError> {
    name: Option<Arc<str>>,
    factories: Arc<[UpcasterFactory<T, E>]>,
}

impl<T, E> UpcasterChain<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create a chain from factories, in application order.
    pub fn new(factories: impl IntoIterator<Item = UpcasterFactory<T, E>>) -> Self {
        Self {
            name: None,
            factories: factories.into_iter().collect(),
        }
    }

    /// Create a chain of stateless steps, each reused on every pass.
    pub fn from_shared<S>(steps: impl IntoIterator<Item = S>) -> Self
    where
        S: StatelessUpcaster<T, E> + 'static,
    {
        Self::new(steps.into_iter().map(UpcasterFactory::shared))
    }

    /// Start building a chain.
    pub fn builder() -> UpcasterChainBuilder<T, E> {
        UpcasterChainBuilder::new()
    }

    /// The label used in log events, if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of steps in the chain.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the chain has no steps (and so is the identity).
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Upcast a stream of stored representations.
    ///
    /// Nothing happens until the returned iterator is pulled. Errors yielded
    /// by `input` come out unchanged; after the first error, from the input
    /// or from a step, the output ends.
    ///
    /// The returned iterator owns `input`, so it must be `Send + 'static`:
    /// pass an owned cursor (or collect a borrowing one first) rather than an
    /// iterator that borrows its store connection.
    pub fn upcast<I>(&self, input: I) -> Upcasting<T, E>
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
    {
        let steps: Vec<Box<dyn Upcaster<T, E>>> =
            self.factories.iter().map(UpcasterFactory::instantiate).collect();
        debug!(
            chain = self.name().unwrap_or("unnamed"),
            steps = steps.len(),
            "instantiated upcasters for pass"
        );

        let cascade = Cascade::new(Box::new(input.into_iter()), 0, steps.len());
        Upcasting {
            name: self.name.clone(),
            steps,
            cascade,
            phase: Phase::Main,
        }
    }

    /// Upcast a stream that cannot fail on its own.
    pub fn upcast_ok<I>(&self, input: I) -> Upcasting<T, E>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        self.upcast(input.into_iter().map(Ok))
    }
}

impl<T, E> Clone for UpcasterChain<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            factories: Arc::clone(&self.factories),
        }
    }
}

impl<T, E> fmt::Debug for UpcasterChain<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpcasterChain")
            .field("name", &self.name)
            .field("steps", &self.factories.len())
            .finish()
    }
}

/// Declarative wiring for an [`UpcasterChain`].
pub struct UpcasterChainBuilder<T, E = UpcastError> {
    name: Option<Arc<str>>,
    factories: Vec<UpcasterFactory<T, E>>,
}

impl<T, E> UpcasterChainBuilder<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// An empty builder.
    pub fn new() -> Self {
        Self {
            name: None,
            factories: Vec::new(),
        }
    }

    /// Label the chain in log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Arc::from(name.into()));
        self
    }

    /// Append a step produced by `factory`.
    pub fn then(mut self, factory: UpcasterFactory<T, E>) -> Self {
        self.factories.push(factory);
        self
    }

    /// Append a stateless step reused on every pass.
    pub fn then_shared<S>(self, step: S) -> Self
    where
        S: StatelessUpcaster<T, E> + 'static,
    {
        self.then(UpcasterFactory::shared(step))
    }

    /// Finish the chain. It cannot be changed afterwards.
    pub fn build(self) -> UpcasterChain<T, E> {
        UpcasterChain {
            name: self.name,
            factories: self.factories.into(),
        }
    }
}

impl<T, E> Default for UpcasterChainBuilder<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Draining the input through every step.
    Main,
    /// Draining the remainder of the step at this index.
    Remainder(usize),
    Finished,
}

/// The lazy output of one [`UpcasterChain::upcast`] pass.
///
/// Owns the pass's step instances; dropping it (or exhausting it) drops them.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Upcasting<T, E = UpcastError> {
    name: Option<Arc<str>>,
    steps: Vec<Box<dyn Upcaster<T, E>>>,
    cascade: Cascade<T, E>,
    phase: Phase,
}

impl<T, E> Upcasting<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn chain_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.cascade = Cascade::drained();
        self.steps.clear();
    }

    /// Move on to the remainder of the next step, if any.
    fn advance(&mut self) -> bool {
        let next = match self.phase {
            Phase::Main => {
                trace!(chain = self.chain_name(), "main pass drained");
                0
            }
            Phase::Remainder(step) => step + 1,
            Phase::Finished => return false,
        };
        if next >= self.steps.len() {
            trace!(chain = self.chain_name(), "pass complete");
            self.finish();
            return false;
        }

        trace!(chain = self.chain_name(), step = next, "flushing remainder");
        let leftover = self.steps[next].remainder();
        self.cascade = Cascade::new(leftover, next + 1, self.steps.len());
        self.phase = Phase::Remainder(next);
        true
    }
}

impl<T, E> Iterator for Upcasting<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.phase == Phase::Finished {
                return None;
            }
            match self.cascade.next(&mut self.steps) {
                Some(Ok(entry)) => return Some(Ok(entry)),
                Some(Err(e)) => {
                    self.finish();
                    return Some(Err(e));
                }
                None => {
                    if !self.advance() {
                        return None;
                    }
                }
            }
        }
    }
}

impl<T, E> FusedIterator for Upcasting<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
}

impl<T, E> fmt::Debug for Upcasting<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upcasting")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
