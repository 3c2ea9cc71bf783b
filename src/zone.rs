//! Zone dispatch: a small polymorphic boundary through which a query
//! `(name, type, class)` is answered by a backend, plus the reference
//! dictionary-of-`NameTree` backend.
//!
//! Grounded on `src/zones/mod.rs`'s `Zone`/`Zones::get` (the suffix-walking
//! lookup and the per-`(class, type)` storage), generalized into a trait
//! object per the specification's vtable instruction (§9: "prefer a single
//! abstraction... Do not model this with inheritance").

use crate::name::Name;
use crate::nametree::NameTree;
use crate::record::{Record, RecordClass, RecordType};
use std::collections::HashMap;
use std::fmt;

pub type RecordList = Vec<Record>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Unsupported { class: RecordClass, rtype: RecordType },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unsupported { class, rtype } => {
                write!(f, "no tree for class {class} type {rtype}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// The capability set a zone backend exposes. `deinit` is a no-op hook kept
/// for symmetry with the specification's vtable (`query`, `deinit`); under
/// Rust's ownership model, `Drop` already does this job, so the default
/// implementation does nothing and no backend in this crate overrides it.
pub trait ZoneBackend {
    fn query(
        &self,
        name: &Name,
        qtype: RecordType,
        qclass: RecordClass,
    ) -> Result<Option<&RecordList>, Error>;

    fn deinit(&mut self) {}
}

/// A zone: an origin plus an opaque backend. `Zone::query` is the only
/// entry point a transport needs; it is authoritative only below
/// `context`.
pub struct Zone {
    context: Name,
    backend: Box<dyn ZoneBackend + Send + Sync>,
}

impl Zone {
    pub fn new(context: Name, backend: Box<dyn ZoneBackend + Send + Sync>) -> Zone {
        Zone { context, backend }
    }

    pub fn context(&self) -> &Name {
        &self.context
    }

    /// Returns `Ok(None)` both when the name has no records of this type
    /// and when the name isn't under this zone's context at all -- the
    /// caller (the dictionary of zones, or ultimately the transport) is
    /// responsible for turning "no zone answered" into NXDOMAIN.
    pub fn query(
        &self,
        name: &Name,
        qtype: RecordType,
        qclass: RecordClass,
    ) -> Result<Option<&RecordList>, Error> {
        if !name.is_subdomain_of(&self.context) {
            return Ok(None);
        }
        self.backend.query(name, qtype, qclass)
    }
}

/// The reference backend: one [`NameTree`] per `(class, type)`, all rooted
/// at the same zone origin.
pub struct DictionaryBackend {
    context: Name,
    trees: HashMap<(RecordClass, RecordType), NameTree<RecordList>>,
}

impl DictionaryBackend {
    pub fn new(context: Name) -> DictionaryBackend {
        DictionaryBackend {
            context,
            trees: HashMap::new(),
        }
    }

    /// Inserts `record` under `name` in the `(rclass, rtype)` tree,
    /// creating the tree and the path to `name` if necessary. `name` must
    /// equal or be a subdomain of this backend's context.
    pub fn insert(
        &mut self,
        name: &Name,
        rclass: RecordClass,
        rtype: RecordType,
        record: Record,
    ) -> Result<(), crate::name::Error> {
        let labels = name.iter_context(&self.context)?;
        let tree = self
            .trees
            .entry((rclass, rtype))
            .or_insert_with(|| NameTree::new_namespace(self.context.clone()));

        let node = match labels {
            None => tree.root_mut(),
            Some(labels) => {
                let mut node = tree.root_mut();
                for label in labels {
                    node = node
                        .add_child(label, None)
                        .expect("add_child with no value never fails with DuplicateValue");
                }
                node
            }
        };
        node.value_or_default().push(record);
        Ok(())
    }
}

impl ZoneBackend for DictionaryBackend {
    fn query(
        &self,
        name: &Name,
        qtype: RecordType,
        qclass: RecordClass,
    ) -> Result<Option<&RecordList>, Error> {
        if qtype.is_unknown() || qclass.is_unknown() {
            return Err(Error::Unsupported { class: qclass, rtype: qtype });
        }
        // A recognized type/class with no tree at all just means this zone
        // holds no records of it -- NODATA, not a lookup failure.
        let Some(tree) = self.trees.get(&(qclass, qtype)) else {
            return Ok(None);
        };
        match tree.find_with_context(name, &self.context) {
            Ok(node) => Ok(node.value()),
            Err(_) => Ok(None),
        }
    }
}

/// A set of zones a server is authoritative for. `get` selects the zone
/// whose context is the longest matching suffix of `name` (so a query for
/// `www.internal.example.com` prefers a configured `internal.example.com`
/// zone over a broader `example.com` one), mirroring the teacher's
/// `Zones::get` suffix walk.
#[derive(Default)]
pub struct Zones {
    zones: Vec<Zone>,
}

impl Zones {
    pub fn new() -> Zones {
        Zones { zones: Vec::new() }
    }

    pub fn insert(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    pub fn get(&self, name: &Name) -> Option<&Zone> {
        self.zones
            .iter()
            .filter(|zone| name.is_subdomain_of(zone.context()))
            .max_by_key(|zone| zone.context().label_count())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordData;
    use std::net::Ipv4Addr;

    fn a_record(name: &str, addr: [u8; 4]) -> Record {
        Record::new(
            Name::from_text(name).unwrap(),
            RecordClass::IN,
            300,
            RecordData::A {
                address: Ipv4Addr::from(addr),
            },
        )
    }

    #[test]
    fn s5_zone_apex_miss() {
        let context = Name::from_text("example.com").unwrap();
        let mut backend = DictionaryBackend::new(context.clone());
        let www = Name::from_text("www.example.com").unwrap();
        // A child exists at "www" but carries no A record (a zone cut with
        // no RR at the exact name).
        backend
            .trees
            .entry((RecordClass::IN, RecordType::A))
            .or_insert_with(|| NameTree::new_namespace(context.clone()))
            .root_mut()
            .add_child(b"www", None)
            .unwrap();
        let zone = Zone::new(context, Box::new(backend));

        assert_eq!(
            zone.query(&www, RecordType::A, RecordClass::IN).unwrap(),
            None
        );
        let other = Name::from_text("www.other.com").unwrap();
        assert_eq!(
            zone.query(&other, RecordType::A, RecordClass::IN).unwrap(),
            None
        );
        // No MX tree exists at all for this zone -- NODATA, not an error.
        assert_eq!(
            zone.query(&www, RecordType::MX, RecordClass::IN).unwrap(),
            None
        );
        // A genuinely unrepresentable type is still rejected.
        assert_eq!(
            zone.query(&www, RecordType::from(65280), RecordClass::IN).unwrap_err(),
            Error::Unsupported { class: RecordClass::IN, rtype: RecordType::from(65280) }
        );
    }

    #[test]
    fn s6_basic_response_through_a_zone() {
        let context = Name::from_text("google.com").unwrap();
        let mut backend = DictionaryBackend::new(context.clone());
        let name = Name::from_text("google.com").unwrap();
        backend
            .insert(&name, RecordClass::IN, RecordType::A, a_record("google.com", [1, 2, 3, 4]))
            .unwrap();
        let zone = Zone::new(context, Box::new(backend));

        let answers = zone
            .query(&name, RecordType::A, RecordClass::IN)
            .unwrap()
            .unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].data, a_record("google.com", [1, 2, 3, 4]).data);
    }
}
