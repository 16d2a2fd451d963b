use std::fmt;
use std::sync::Arc;

use crate::single::{
    ContextAware, ContextAwareUpcaster, MultiEntry, MultiEntryUpcaster, SingleEntry,
    SingleEntryUpcaster,
};
use crate::{StatelessUpcaster, UpcastError, Upcaster};

type MakeUpcaster<T, E> = dyn Fn() -> Box<dyn Upcaster<T, E>> + Send + Sync;

/// Produces a fresh step instance for every chain invocation.
///
/// Factories are cheap to clone and shareable between threads; the steps they
/// produce are owned by a single pass and never shared.
pub struct UpcasterFactory<T, E = UpcastError> {
    make: Arc<MakeUpcaster<T, E>>,
}

impl<T, E> UpcasterFactory<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// A factory calling `make` for every pass.
    ///
    /// Each call must return an independent instance.
    pub fn new<F, U>(make: F) -> Self
    where
        F: Fn() -> U + Send + Sync + 'static,
        U: Upcaster<T, E> + 'static,
    {
        Self {
            make: Arc::new(move || Box::new(make()) as Box<dyn Upcaster<T, E>>),
        }
    }

    /// A factory handing out the same stateless step on every pass.
    pub fn shared<S>(step: S) -> Self
    where
        S: StatelessUpcaster<T, E> + 'static,
    {
        Self::shared_arc(Arc::new(step))
    }

    /// Like [`UpcasterFactory::shared`], for a step that is already shared.
    pub fn shared_arc<S>(step: Arc<S>) -> Self
    where
        S: StatelessUpcaster<T, E> + ?Sized + 'static,
    {
        Self::new(move || Arc::clone(&step))
    }

    /// Wrap a [`SingleEntryUpcaster`] template.
    pub fn single_entry<S>(step: S) -> Self
    where
        S: SingleEntryUpcaster<T, E> + 'static,
    {
        Self::shared(SingleEntry(step))
    }

    /// Wrap a [`MultiEntryUpcaster`] template.
    pub fn multi_entry<S>(step: S) -> Self
    where
        S: MultiEntryUpcaster<T, E> + 'static,
    {
        Self::shared(MultiEntry(step))
    }

    /// Wrap a [`ContextAwareUpcaster`] template; every pass gets a new context.
    pub fn context_aware<S>(step: S) -> Self
    where
        S: ContextAwareUpcaster<T, E> + 'static,
    {
        let step = Arc::new(step);
        Self::new(move || ContextAware::new::<T, E>(Arc::clone(&step)))
    }

    /// Create a fresh step instance.
    pub fn instantiate(&self) -> Box<dyn Upcaster<T, E>> {
        (self.make)()
    }
}

impl<T, E> Clone for UpcasterFactory<T, E> {
    fn clone(&self) -> Self {
        Self {
            make: Arc::clone(&self.make),
        }
    }
}

impl<T, E> fmt::Debug for UpcasterFactory<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpcasterFactory").finish_non_exhaustive()
    }
}
