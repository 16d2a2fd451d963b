//! Integration tests replaying a versioned event stream.
//!
//! Tests the complete flow: stored JSON entries at mixed revisions go through
//! revision steps, a split, a context-aware rename and a step that merges
//! entry pairs and flushes unmatched halves at the end of the pass.

use serde_json::{json, Value};
use upcast_chain::entries;
use upcast_chain::prelude::*;

type Entry = VersionedEntry<Value>;

fn entry(type_name: &str, revision: u32, data: Value) -> Entry {
    VersionedEntry::new(type_name, revision, data)
}

// ── Revision steps ──────────────────────────────────────────────────

/// OrderPlaced v1 stored the amount in cents as an integer.
struct AmountToDecimal;

impl RevisionStep<Value> for AmountToDecimal {
    fn type_name(&self) -> &str {
        "OrderPlaced"
    }

    fn source_revision(&self) -> u32 {
        1
    }

    fn migrate(&self, mut data: Value) -> Result<Value, UpcastError> {
        let cents = data["amount"].as_u64().ok_or_else(|| UpcastError::StepFailed {
            type_name: "OrderPlaced".into(),
            from: 1,
            to: 2,
            reason: "amount is not an integer".into(),
        })?;
        data["amount"] = json!(cents as f64 / 100.0);
        Ok(data)
    }
}

/// OrderPlaced v2 gained a currency.
struct DefaultCurrency;

impl RevisionStep<Value> for DefaultCurrency {
    fn type_name(&self) -> &str {
        "OrderPlaced"
    }

    fn source_revision(&self) -> u32 {
        2
    }

    fn migrate(&self, mut data: Value) -> Result<Value, UpcastError> {
        data["currency"] = json!("EUR");
        Ok(data)
    }
}

/// Revisions newer than the code knows about cannot be read safely.
struct RejectFutureOrders;

impl SingleEntryUpcaster<Entry> for RejectFutureOrders {
    fn can_upcast(&self, entry: &Entry) -> bool {
        entry.type_name == "OrderPlaced" && entry.revision > 3
    }

    fn do_upcast(&self, entry: Entry) -> Result<Entry, UpcastError> {
        Err(UpcastError::UnexpectedRevision {
            type_name: entry.type_name,
            found: entry.revision,
            expected: 3,
        })
    }
}

// ── Structural steps ────────────────────────────────────────────────

/// ItemsAdded v1 carried a list; current code expects one ItemAdded each.
struct SplitItems;

impl MultiEntryUpcaster<Entry> for SplitItems {
    fn can_upcast(&self, entry: &Entry) -> bool {
        entry.is("ItemsAdded", 1)
    }

    fn do_upcast(&self, entry: Entry) -> Entries<Entry, UpcastError> {
        let Some(items) = entry.data["items"].as_array() else {
            return entries::failed(UpcastError::malformed("ItemsAdded", "missing `items`"));
        };
        let split: Vec<Entry> = items
            .iter()
            .map(|item| VersionedEntry::new("ItemAdded", 1, json!({ "sku": item })))
            .collect();
        entries::many(split)
    }
}

/// Numbers ItemAdded entries per pass.
struct NumberItems;

impl ContextAwareUpcaster<Entry> for NumberItems {
    type Context = u64;

    fn build_context(&self) -> u64 {
        0
    }

    fn can_upcast(&self, entry: &Entry, _: &mut u64) -> bool {
        entry.is("ItemAdded", 1)
    }

    fn do_upcast(&self, mut entry: Entry, line: &mut u64) -> Result<Entry, UpcastError> {
        *line += 1;
        entry.data["line"] = json!(*line);
        entry.revision = 2;
        Ok(entry)
    }
}

/// Legacy stores wrote street and city as two separate events; they are
/// merged into one AddressChanged. A street without a city yet is held back
/// and flushed as-is when the pass ends.
#[derive(Default)]
struct MergeAddress {
    street: Option<Entry>,
}

impl Upcaster<Entry> for MergeAddress {
    fn upcast(&mut self, entry: Entry) -> Entries<Entry, UpcastError> {
        if entry.is("StreetChanged", 1) {
            let stale = self.street.replace(entry);
            return entries::many(stale);
        }
        if entry.is("CityChanged", 1) {
            if let Some(street) = self.street.take() {
                let merged = json!({
                    "street": street.data["street"],
                    "city": entry.data["city"],
                });
                return entries::single(VersionedEntry::new("AddressChanged", 1, merged));
            }
        }
        entries::single(entry)
    }

    fn remainder(&mut self) -> Entries<Entry, UpcastError> {
        entries::many(self.street.take())
    }
}

fn chain() -> UpcasterChain<Entry> {
    UpcasterChain::builder()
        .name("orders")
        .then(UpcasterFactory::single_entry(Revision(AmountToDecimal)))
        .then(UpcasterFactory::single_entry(Revision(DefaultCurrency)))
        .then(UpcasterFactory::single_entry(RejectFutureOrders))
        .then(UpcasterFactory::new(MergeAddress::default))
        .then(UpcasterFactory::multi_entry(SplitItems))
        .then(UpcasterFactory::context_aware(NumberItems))
        .build()
}

fn replay(input: Vec<Entry>) -> Vec<Entry> {
    chain()
        .upcast_ok(input)
        .collect::<Result<_, _>>()
        .expect("replay should succeed")
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn old_orders_reach_current_revision() {
    let out = replay(vec![
        entry("OrderPlaced", 1, json!({ "amount": 1250 })),
        entry("OrderPlaced", 2, json!({ "amount": 3.5 })),
        entry("OrderPlaced", 3, json!({ "amount": 1.0, "currency": "USD" })),
    ]);

    assert_eq!(
        out,
        vec![
            entry("OrderPlaced", 3, json!({ "amount": 12.5, "currency": "EUR" })),
            entry("OrderPlaced", 3, json!({ "amount": 3.5, "currency": "EUR" })),
            entry("OrderPlaced", 3, json!({ "amount": 1.0, "currency": "USD" })),
        ]
    );
}

#[test]
fn split_items_are_numbered_in_order() {
    let out = replay(vec![
        entry("ItemsAdded", 1, json!({ "items": ["a", "b"] })),
        entry("ItemsAdded", 1, json!({ "items": [] })),
        entry("ItemsAdded", 1, json!({ "items": ["c"] })),
    ]);

    let lines: Vec<(String, u64)> = out
        .iter()
        .map(|e| {
            (
                e.data["sku"].as_str().unwrap().to_string(),
                e.data["line"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        lines,
        vec![("a".into(), 1), ("b".into(), 2), ("c".into(), 3)]
    );
    assert!(out.iter().all(|e| e.is("ItemAdded", 2)));
}

#[test]
fn item_numbering_restarts_every_replay() {
    let input = vec![entry("ItemsAdded", 1, json!({ "items": ["x"] }))];
    let first = replay(input.clone());
    let second = replay(input);
    assert_eq!(first, second);
    assert_eq!(first[0].data["line"], json!(1));
}

#[test]
fn address_halves_are_merged() {
    let out = replay(vec![
        entry("StreetChanged", 1, json!({ "street": "Main St" })),
        entry("CityChanged", 1, json!({ "city": "Springfield" })),
    ]);
    assert_eq!(
        out,
        vec![entry(
            "AddressChanged",
            1,
            json!({ "street": "Main St", "city": "Springfield" })
        )]
    );
}

#[test]
fn unmatched_street_is_flushed_after_main_output() {
    let out = replay(vec![
        entry("StreetChanged", 1, json!({ "street": "Elm St" })),
        entry("OrderPlaced", 3, json!({ "amount": 2.0, "currency": "EUR" })),
    ]);
    assert_eq!(out.len(), 2);
    assert!(out[0].is("OrderPlaced", 3));
    assert!(out[1].is("StreetChanged", 1));
}

#[test]
fn bad_payload_fails_in_place() {
    let mut out = chain().upcast_ok(vec![
        entry("OrderPlaced", 2, json!({ "amount": 1.0 })),
        entry("OrderPlaced", 1, json!({ "amount": "lots" })),
        entry("OrderPlaced", 2, json!({ "amount": 2.0 })),
    ]);

    assert!(out.next().unwrap().is_ok());
    let err = out.next().unwrap().unwrap_err();
    assert!(matches!(err, UpcastError::StepFailed { from: 1, to: 2, .. }));
    assert!(out.next().is_none());
}

#[test]
fn future_revision_is_rejected() {
    let mut out = chain().upcast_ok(vec![
        entry("OrderPlaced", 3, json!({ "amount": 1.0, "currency": "EUR" })),
        entry("OrderPlaced", 4, json!({ "total": { "amount": 1.0 } })),
    ]);

    assert!(out.next().unwrap().is_ok());
    let err = out.next().unwrap().unwrap_err();
    assert!(matches!(
        err,
        UpcastError::UnexpectedRevision { found: 4, expected: 3, .. }
    ));
    assert_eq!(
        err.to_string(),
        "unexpected revision 4 for `OrderPlaced`, expected 3"
    );
    assert!(out.next().is_none());
}

#[test]
fn store_failure_surfaces_unchanged() {
    let input: Vec<Result<Entry, UpcastError>> = vec![
        Ok(entry("OrderPlaced", 2, json!({ "amount": 1.0 }))),
        Err(UpcastError::from_source(std::io::Error::new(
            std::io::ErrorKind::Other,
            "segment 7 unreadable",
        ))),
    ];
    let out: Vec<Result<Entry, UpcastError>> = chain().upcast(input).collect();

    assert_eq!(out.len(), 2);
    assert!(out[0].is_ok());
    match &out[1] {
        Err(UpcastError::Source(cause)) => assert_eq!(cause.to_string(), "segment 7 unreadable"),
        other => panic!("expected source error, got {other:?}"),
    }
}
