//! Waterway name disambiguation across organizations.
//!
//! Two utilities reporting into "Cypress Creek" are usually talking about
//! two different creeks. Names shared by more than one organization get a
//! short organization tag appended: "Cypress Creek - Foley".

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::extract::rules::patterns::{collapse_whitespace, PAREN_ACRONYM, TAG_STOPWORDS};
use crate::models::SsoRecord;

/// Explicit short names. Keys are lowercase; both legal spellings and
/// canonical display names appear.
const TAG_OVERRIDES: &[(&str, &str)] = &[
    ("baldwin county sewer service", "BCSS"),
    ("baldwin county sewer service, llc", "BCSS"),
    ("city of daphne", "Daphne"),
    ("city of fairhope", "Fairhope"),
    ("city of spanish fort", "Spanish Fort"),
    ("city of foley", "Foley"),
    ("city of robertsdale", "Robertsdale"),
    ("utilities of daphne", "Daphne"),
    ("utilities of fairhope", "Fairhope"),
    ("utilities of spanish fort", "Spanish Fort"),
    ("utilities of foley", "Foley"),
    ("utilities of robertsdale", "Robertsdale"),
];

/// Short organization tag, without caching.
///
/// Override table, then a parenthesized acronym, then the name with
/// boilerplate words removed, cut to its last two words.
pub fn derive_tag(org: &str) -> Option<String> {
    let name = collapse_whitespace(org);
    if name.is_empty() {
        return None;
    }

    let key = name.to_lowercase();
    if let Some(&(_, tag)) = TAG_OVERRIDES.iter().find(|(k, _)| *k == key) {
        return Some(tag.to_string());
    }

    if let Some(caps) = PAREN_ACRONYM.captures(&name) {
        return Some(caps[1].to_string());
    }

    let core = collapse_whitespace(&TAG_STOPWORDS.replace_all(&name, ""));
    let words: Vec<&str> = core.split(' ').filter(|w| !w.is_empty()).collect();
    let tag = match words.as_slice() {
        [] => name,
        [.., a, b] => format!("{} {}", a, b),
        _ => core,
    };
    Some(tag)
}

/// Memoizing tag source used by [`disambiguate_waterways`].
pub struct TagDeriver {
    cache: TtlCache<String, Option<String>>,
}

impl TagDeriver {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
        }
    }

    pub fn tag(&self, org: &str) -> Option<String> {
        self.cache
            .get_or_insert_with(org.to_string(), || derive_tag(org))
    }
}

impl Default for TagDeriver {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

/// Comparison key for a waterway name: collapsed and lowercased.
pub fn waterway_key(name: &str) -> Option<String> {
    let key = collapse_whitespace(name).to_lowercase();
    (!key.is_empty()).then_some(key)
}

/// The waterway name a record was indexed under, ignoring any tag.
fn base_water(record: &SsoRecord) -> Option<&str> {
    record
        .receiving_water_raw
        .as_deref()
        .or(record.receiving_water.as_deref())
}

/// Waterway keys used by more than one distinct non-empty organization.
pub fn find_collisions(records: &[SsoRecord]) -> BTreeSet<String> {
    let mut owners: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for record in records {
        let Some(key) = base_water(record).and_then(waterway_key) else {
            continue;
        };
        let entry = owners.entry(key).or_default();
        if let Some(org) = record.org_name.as_deref().map(collapse_whitespace) {
            if !org.is_empty() {
                entry.insert(org);
            }
        }
    }

    owners
        .into_iter()
        .filter(|(_, orgs)| orgs.len() > 1)
        .map(|(key, _)| key)
        .collect()
}

/// Append organization tags to colliding waterway names.
///
/// Records that are already tagged, have unique names, or have no tag
/// available pass through unchanged.
pub fn disambiguate_waterways(mut records: Vec<SsoRecord>, tags: &TagDeriver) -> Vec<SsoRecord> {
    let collisions = find_collisions(&records);
    if collisions.is_empty() {
        return records;
    }

    let mut tagged = 0usize;
    for record in records.iter_mut().filter(|r| !r.is_tagged()) {
        let Some(name) = record.receiving_water.as_deref().map(collapse_whitespace) else {
            continue;
        };
        if !waterway_key(&name).is_some_and(|key| collisions.contains(&key)) {
            continue;
        }
        let Some(tag) = record.org_name.as_deref().and_then(|org| tags.tag(org)) else {
            debug!("No tag for {} on shared waterway {:?}", record.report_id, name);
            continue;
        };

        record.receiving_water = Some(format!("{} - {}", name, tag));
        record.receiving_water_raw = Some(name);
        tagged += 1;
    }

    info!(
        "Disambiguated {} shared waterway names across {} records",
        collisions.len(),
        tagged
    );
    records
}
