//! Templates for the common shapes of upcasters.
//!
//! Most steps only care about some representations and let everything else
//! through untouched. These traits capture that: implement `can_upcast` to
//! pick entries and `do_upcast` to rewrite them, then register the step with
//! the matching [`UpcasterFactory`](crate::UpcasterFactory) constructor.

use std::sync::Arc;

use crate::entries::{self, Entries};
use crate::{StatelessUpcaster, UpcastError, Upcaster};

/// A one-to-one step for selected representations.
pub trait SingleEntryUpcaster<T, E = UpcastError>: Send + Sync {
    /// Whether `entry` should be rewritten by this step.
    fn can_upcast(&self, entry: &T) -> bool;

    /// Rewrite a selected entry.
    fn do_upcast(&self, entry: T) -> Result<T, E>;
}

/// A one-to-many step for selected representations.
///
/// Returning an empty sequence drops the entry; returning several splits it.
pub trait MultiEntryUpcaster<T, E = UpcastError>: Send + Sync {
    /// Whether `entry` should be rewritten by this step.
    fn can_upcast(&self, entry: &T) -> bool;

    /// Rewrite a selected entry into any number of entries.
    fn do_upcast(&self, entry: T) -> Entries<T, E>;
}

/// A one-to-one step that needs state gathered from earlier entries.
///
/// A new [`Self::Context`] is built for every chain invocation and dropped
/// with it, so nothing seen in one replay leaks into the next.
pub trait ContextAwareUpcaster<T, E = UpcastError>: Send + Sync {
    /// Per-pass state.
    type Context: Send;

    /// Build the context for a new pass.
    fn build_context(&self) -> Self::Context;

    /// Whether `entry` should be rewritten by this step.
    fn can_upcast(&self, entry: &T, context: &mut Self::Context) -> bool;

    /// Rewrite a selected entry.
    fn do_upcast(&self, entry: T, context: &mut Self::Context) -> Result<T, E>;

    /// Emit whatever the context still holds once the main pass is over.
    fn flush(&self, context: Self::Context) -> Entries<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        drop(context);
        entries::empty()
    }
}

/// Adapter running a [`SingleEntryUpcaster`] as a stateless step.
#[derive(Debug, Clone)]
pub struct SingleEntry<S>(pub S);

impl<T, E, S> StatelessUpcaster<T, E> for SingleEntry<S>
where
    T: Send + 'static,
    E: Send + 'static,
    S: SingleEntryUpcaster<T, E>,
{
    fn upcast(&self, entry: T) -> Entries<T, E> {
        if !self.0.can_upcast(&entry) {
            return entries::single(entry);
        }
        Box::new(std::iter::once(self.0.do_upcast(entry)))
    }
}

/// Adapter running a [`MultiEntryUpcaster`] as a stateless step.
#[derive(Debug, Clone)]
pub struct MultiEntry<S>(pub S);

impl<T, E, S> StatelessUpcaster<T, E> for MultiEntry<S>
where
    T: Send + 'static,
    E: Send + 'static,
    S: MultiEntryUpcaster<T, E>,
{
    fn upcast(&self, entry: T) -> Entries<T, E> {
        if self.0.can_upcast(&entry) {
            self.0.do_upcast(entry)
        } else {
            entries::single(entry)
        }
    }
}

/// Adapter pairing a shared [`ContextAwareUpcaster`] with one pass's context.
pub struct ContextAware<S, C> {
    step: Arc<S>,
    context: Option<C>,
}

impl<S, C> ContextAware<S, C> {
    /// Start a pass with a freshly built context.
    pub fn new<T, E>(step: Arc<S>) -> Self
    where
        S: ContextAwareUpcaster<T, E, Context = C>,
    {
        let context = step.build_context();
        Self {
            step,
            context: Some(context),
        }
    }
}

impl<T, E, S, C> Upcaster<T, E> for ContextAware<S, C>
where
    T: Send + 'static,
    E: Send + 'static,
    S: ContextAwareUpcaster<T, E, Context = C>,
    C: Send,
{
    /// Once the context has been flushed, entries pass through untouched.
    fn upcast(&mut self, entry: T) -> Entries<T, E> {
        let Some(context) = self.context.as_mut() else {
            return entries::single(entry);
        };
        if !self.step.can_upcast(&entry, context) {
            return entries::single(entry);
        }
        Box::new(std::iter::once(self.step.do_upcast(entry, context)))
    }

    fn remainder(&mut self) -> Entries<T, E> {
        match self.context.take() {
            Some(context) => self.step.flush(context),
            None => entries::empty(),
        }
    }
}
