//! Convenient re-exports for common usage.
//!
//! ```
//! use upcast_chain::prelude::*;
//! ```

pub use crate::from_fn;
pub use crate::ContextAwareUpcaster;
pub use crate::Entries;
pub use crate::MultiEntryUpcaster;
pub use crate::Revision;
pub use crate::RevisionStep;
pub use crate::SingleEntryUpcaster;
pub use crate::StatelessUpcaster;
pub use crate::UpcastError;
pub use crate::Upcaster;
pub use crate::UpcasterChain;
pub use crate::UpcasterFactory;
pub use crate::VersionedEntry;
