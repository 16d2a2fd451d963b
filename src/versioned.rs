use crate::{SingleEntryUpcaster, UpcastError};

/// A stored representation tagged with its type name and schema revision.
///
/// The payload `D` is whatever the store hands out: raw bytes, a JSON value,
/// a row. Steps read the tag to decide whether an entry concerns them.
///
/// # Example
///
/// ```
/// use upcast_chain::VersionedEntry;
///
/// let entry = VersionedEntry::new("SensorReading", 1, b"temp=22.5".to_vec());
/// assert!(entry.is("SensorReading", 1));
/// assert!(!entry.is("SensorReading", 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionedEntry<D> {
    /// Name of the stored event or snapshot type.
    pub type_name: String,
    /// Schema revision of `data`.
    pub revision: u32,
    /// Serialized payload.
    pub data: D,
}

impl<D> VersionedEntry<D> {
    /// Create a new entry.
    pub fn new(type_name: impl Into<String>, revision: u32, data: D) -> Self {
        Self {
            type_name: type_name.into(),
            revision,
            data,
        }
    }

    /// Whether this entry is `type_name` at `revision`.
    #[must_use]
    pub fn is(&self, type_name: &str, revision: u32) -> bool {
        self.revision == revision && self.type_name == type_name
    }

    /// Replace the payload and stamp a new revision, keeping the type name.
    #[must_use]
    pub fn with_data(self, revision: u32, data: D) -> Self {
        Self {
            type_name: self.type_name,
            revision,
            data,
        }
    }
}

/// Rewrites one type from one revision to the next.
///
/// Revision steps form a linear chain per type: v1→v2, v2→v3, and so on.
/// Each step must be deterministic: replaying the same stored entry must
/// always yield the same result.
pub trait RevisionStep<D, E = UpcastError>: Send + Sync {
    /// The type this step applies to.
    fn type_name(&self) -> &str;

    /// Revision this step reads.
    fn source_revision(&self) -> u32;

    /// Revision this step produces. Saturates at `u32::MAX`.
    fn target_revision(&self) -> u32 {
        self.source_revision().saturating_add(1)
    }

    /// Rewrite a payload from the source to the target revision.
    fn migrate(&self, data: D) -> Result<D, E>;
}

/// Runs a [`RevisionStep`] as a [`SingleEntryUpcaster`] over
/// [`VersionedEntry`]s: entries of other types or revisions pass untouched.
///
/// ```
/// use upcast_chain::prelude::*;
///
/// struct AddHumidity;
///
/// impl RevisionStep<Vec<u8>> for AddHumidity {
///     fn type_name(&self) -> &str { "SensorReading" }
///     fn source_revision(&self) -> u32 { 1 }
///     fn migrate(&self, mut data: Vec<u8>) -> Result<Vec<u8>, UpcastError> {
///         data.extend_from_slice(b"|humidity=none");
///         Ok(data)
///     }
/// }
///
/// let chain = UpcasterChain::<VersionedEntry<Vec<u8>>>::new(vec![
///     UpcasterFactory::single_entry(Revision(AddHumidity)),
/// ]);
/// let stored = vec![VersionedEntry::new("SensorReading", 1, b"temp=22.5".to_vec())];
/// let out: Vec<_> = chain.upcast_ok(stored).collect::<Result<_, _>>().unwrap();
/// assert_eq!(out[0].revision, 2);
/// assert_eq!(out[0].data, b"temp=22.5|humidity=none");
/// ```
#[derive(Debug, Clone)]
pub struct Revision<S>(pub S);

impl<D, E, S> SingleEntryUpcaster<VersionedEntry<D>, E> for Revision<S>
where
    S: RevisionStep<D, E>,
{
    fn can_upcast(&self, entry: &VersionedEntry<D>) -> bool {
        entry.is(self.0.type_name(), self.0.source_revision())
    }

    fn do_upcast(&self, entry: VersionedEntry<D>) -> Result<VersionedEntry<D>, E> {
        let VersionedEntry {
            type_name,
            revision: _,
            data,
        } = entry;
        let data = self.0.migrate(data)?;
        Ok(VersionedEntry {
            type_name,
            revision: self.0.target_revision(),
            data,
        })
    }
}
