//! # upcast-chain
//!
//! Read-time schema evolution for event-sourced systems.
//!
//! Stored events and snapshots keep the shape they were written with. When
//! they are replayed, an [`UpcasterChain`] rewrites each one into the shape
//! the current code expects, without touching the store.
//!
//! ## Quick Start
//!
//! ```
//! use upcast_chain::prelude::*;
//! use upcast_chain::entries;
//!
//! // Drop obsolete entries, then split the rest in two.
//! let chain = UpcasterChain::<u32>::builder()
//!     .then_shared(from_fn(|n: u32| {
//!         if n % 2 == 1 { entries::empty() } else { entries::single(n) }
//!     }))
//!     .then_shared(from_fn(|n: u32| entries::many(vec![n, n])))
//!     .build();
//!
//! let out: Result<Vec<u32>, UpcastError> = chain.upcast_ok(vec![1, 2, 3, 4]).collect();
//! assert_eq!(out.unwrap(), vec![2, 2, 4, 4]);
//! ```
//!
//! ## How It Works
//!
//! - **Factories, not steps**: a chain stores [`UpcasterFactory`]s and
//!   instantiates fresh steps for every pass, so steps may keep state.
//! - **Lazy**: each stored entry is pulled and pushed through the steps only
//!   when the next output is requested; arbitrarily long streams replay in
//!   constant memory (plus whatever the steps themselves hold).
//! - **Remainders**: once the input is exhausted, each step may hand back
//!   entries it buffered ([`Upcaster::remainder`]). Step `i`'s remainder flows
//!   only through steps after `i`, and remainders come out in chain order.
//! - **Fail fast**: an error from the input or from a step is yielded in
//!   place and ends the pass.
//!
//! ## Step Templates
//!
//! - [`Upcaster`] - Stateful step, one instance per pass
//! - [`StatelessUpcaster`] - Shared step, see also [`from_fn`]
//! - [`SingleEntryUpcaster`] - One-to-one rewrite of selected entries
//! - [`MultiEntryUpcaster`] - One-to-many rewrite of selected entries
//! - [`ContextAwareUpcaster`] - One-to-one rewrite with per-pass context
//! - [`RevisionStep`] - Linear revision bump of [`VersionedEntry`] payloads

mod chain;
pub mod entries;
mod error;
mod factory;
mod single;
mod upcaster;
mod versioned;

pub mod prelude;

pub use chain::{UpcasterChain, UpcasterChainBuilder, Upcasting};
pub use entries::Entries;
pub use error::UpcastError;
pub use factory::UpcasterFactory;
pub use single::{
    ContextAware, ContextAwareUpcaster, MultiEntry, MultiEntryUpcaster, SingleEntry,
    SingleEntryUpcaster,
};
pub use upcaster::{from_fn, FromFn, StatelessUpcaster, Upcaster};
pub use versioned::{Revision, RevisionStep, VersionedEntry};
