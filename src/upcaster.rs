use std::fmt;
use std::sync::Arc;

use crate::entries::{self, Entries};
use crate::UpcastError;

/// One ordered step of an [`UpcasterChain`](crate::UpcasterChain).
///
/// A step instance lives for exactly one chain invocation. It receives every
/// representation that reaches its position, in order, and may keep state
/// between calls (for example an entry buffered while waiting for the entry
/// that completes it). Anything it could not resolve during the pass is
/// handed back through [`Upcaster::remainder`].
///
/// # Example
///
/// ```
/// use upcast_chain::prelude::*;
/// use upcast_chain::entries;
///
/// /// Joins consecutive "first"/"last" name fragments into one entry.
/// #[derive(Default)]
/// struct JoinNames {
///     pending: Option<String>,
/// }
///
/// impl Upcaster<String> for JoinNames {
///     fn upcast(&mut self, entry: String) -> Entries<String, UpcastError> {
///         if let Some(first) = entry.strip_prefix("first:") {
///             let stale = self.pending.replace(first.to_string());
///             return entries::many(stale);
///         }
///         if let Some(last) = entry.strip_prefix("last:") {
///             if let Some(first) = self.pending.take() {
///                 return entries::single(format!("{first} {last}"));
///             }
///         }
///         entries::single(entry)
///     }
///
///     fn remainder(&mut self) -> Entries<String, UpcastError> {
///         entries::many(self.pending.take())
///     }
/// }
///
/// let chain = UpcasterChain::new(vec![UpcasterFactory::new(JoinNames::default)]);
/// let stored = vec!["first:Ada", "last:Lovelace", "first:Alan"];
/// let out: Vec<String> = chain
///     .upcast_ok(stored.into_iter().map(String::from))
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(out, vec!["Ada Lovelace", "Alan"]);
/// ```
pub trait Upcaster<T, E = UpcastError>: Send {
    /// Transform one representation into zero, one or many representations.
    fn upcast(&mut self, entry: T) -> Entries<T, E>;

    /// Representations this step could not finish during the main pass.
    ///
    /// Called at most once per pass, after every earlier output of the chain
    /// has been consumed.
    fn remainder(&mut self) -> Entries<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        entries::empty()
    }
}

/// A step with no per-pass state.
///
/// Stateless steps can be shared between passes and threads: `Arc<S>` is an
/// [`Upcaster`], so a factory may hand out the same instance every time.
pub trait StatelessUpcaster<T, E = UpcastError>: Send + Sync {
    /// Transform one representation into zero, one or many representations.
    fn upcast(&self, entry: T) -> Entries<T, E>;
}

impl<T, E, S> Upcaster<T, E> for Arc<S>
where
    S: StatelessUpcaster<T, E> + ?Sized,
{
    fn upcast(&mut self, entry: T) -> Entries<T, E> {
        StatelessUpcaster::upcast(&**self, entry)
    }
}

/// A stateless step backed by a closure. Created with [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

/// Lift a closure into a stateless step.
///
/// ```
/// use upcast_chain::{entries, from_fn, UpcasterChain, UpcastError};
///
/// let chain = UpcasterChain::<u32>::from_shared(vec![from_fn(|n: u32| {
///     if n % 2 == 0 { entries::single(n / 2) } else { entries::empty() }
/// })]);
/// let out: Result<Vec<u32>, UpcastError> = chain.upcast_ok(1..=6).collect();
/// assert_eq!(out.unwrap(), vec![1, 2, 3]);
/// ```
pub fn from_fn<T, E, F>(f: F) -> FromFn<F>
where
    F: Fn(T) -> Entries<T, E> + Send + Sync,
{
    FromFn { f }
}

impl<T, E, F> StatelessUpcaster<T, E> for FromFn<F>
where
    F: Fn(T) -> Entries<T, E> + Send + Sync,
{
    fn upcast(&self, entry: T) -> Entries<T, E> {
        (self.f)(entry)
    }
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}
