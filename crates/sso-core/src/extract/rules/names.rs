//! Organization name canonicalization.

use std::time::Duration;

use tracing::trace;

use super::patterns::{
    collapse_whitespace, LEADING_THE, MAWSS_LONG, ORG_PREFIXES, PAREN_ACRONYM, STATE_SUFFIX,
};
use crate::cache::TtlCache;

/// Legal-entity spellings and permit numbers that collapse to one display
/// name. Keys are lowercase.
const ALIASES: &[(&str, &str)] = &[
    ("alsi9902013", "Baldwin County Sewer Service"),
    ("al0049859", "Baldwin County Sewer Service"),
    ("south alabama utilities services, inc.", "Baldwin County Sewer Service"),
    ("south alabama utility service, inc wwtp", "Baldwin County Sewer Service"),
    ("south alabama utilities", "Baldwin County Sewer Service"),
    ("baldwin county sewer services", "Baldwin County Sewer Service"),
    ("baldwin county sewer service, llc", "Baldwin County Sewer Service"),
    ("baldwin county sewer service", "Baldwin County Sewer Service"),
    ("board of water and sewer commissioners of the city of mobile", "MAWSS"),
    ("board of water and sewer commissioners of the city of mobile alabama", "MAWSS"),
    ("board of water and sewer commissioners of the city of mobile - prichard", "MAWSS"),
    ("the board of water and sewer commissioners of the city of mobile", "MAWSS"),
    ("mobile area water and sewer system", "MAWSS"),
    ("mobile area water & sewer", "MAWSS"),
    ("mobile area water and sewer", "MAWSS"),
    ("mobile water and sewer", "MAWSS"),
    ("the water works & sewer board of the city of anniston", "Utilities of Anniston"),
    ("the water works and sewer board of the city of anniston", "Utilities of Anniston"),
    ("the water works & sewer board of the city of gadsden", "Utilities of Gadsden"),
];

/// Display name for a known legal-entity spelling or permit number.
pub fn lookup_alias(name: &str) -> Option<&'static str> {
    let key = collapse_whitespace(name).to_lowercase();
    ALIASES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|&(_, v)| v)
}

/// Canonical display name for a raw organization name.
///
/// Returns `None` for blank input.
pub fn canonicalize_org(raw: &str) -> Option<String> {
    let original = collapse_whitespace(raw);
    if original.is_empty() {
        return None;
    }

    if let Some(hit) = lookup_alias(&original) {
        return Some(hit.to_string());
    }

    let name = STATE_SUFFIX.replace(&original, "").trim().to_string();
    if let Some(hit) = lookup_alias(&name) {
        return Some(hit.to_string());
    }
    if MAWSS_LONG.is_match(&name) {
        return Some("MAWSS".to_string());
    }

    if let Some(caps) = PAREN_ACRONYM.captures(&name) {
        return Some(caps[1].to_string());
    }

    for prefix in ORG_PREFIXES.iter() {
        if let Some(m) = prefix.find(&name) {
            let rest = LEADING_THE.replace(name[m.end()..].trim(), "").trim().to_string();
            if rest.is_empty() {
                break;
            }
            trace!("Stripped organization prefix: {:?} -> {:?}", name, rest);
            if rest.to_lowercase().ends_with("utilities") {
                return Some(rest);
            }
            return Some(format!("Utilities of {}", rest));
        }
    }

    Some(name)
}

/// Memoizing front end for [`canonicalize_org`].
pub struct NameCanonicalizer {
    cache: TtlCache<String, Option<String>>,
}

impl NameCanonicalizer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
        }
    }

    pub fn canonicalize(&self, raw: &str) -> Option<String> {
        self.cache
            .get_or_insert_with(raw.to_string(), || canonicalize_org(raw))
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl Default for NameCanonicalizer {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canon(raw: &str) -> String {
        canonicalize_org(raw).unwrap()
    }

    #[test]
    fn test_aliases() {
        assert_eq!(canon("AL0049859"), "Baldwin County Sewer Service");
        assert_eq!(canon("Baldwin County Sewer Service, LLC"), "Baldwin County Sewer Service");
        assert_eq!(
            canon("Board of Water and Sewer Commissioners of the City of Mobile"),
            "MAWSS"
        );
        assert_eq!(canon("Mobile Area Water and Sewer System"), "MAWSS");
        assert_eq!(canon("Mobile Area Water & Sewer System, AL"), "MAWSS");
        assert_eq!(canon("Mobile Area Water and Sewer System Inc"), "MAWSS");
        assert_eq!(canon("The Mobile Area Water and Sewer System (Prichard)"), "MAWSS");
    }

    #[test]
    fn test_prefix_stripping() {
        assert_eq!(
            canon("The Water Works and Sewer Board of the City of Anniston"),
            "Utilities of Anniston"
        );
        assert_eq!(
            canon("The Water Works & Sewer Board of the City of Gadsden"),
            "Utilities of Gadsden"
        );
        assert_eq!(canon("City of Foley"), "Utilities of Foley");
        assert_eq!(canon("Town of Loxley, AL"), "Utilities of Loxley");
        assert_eq!(canon("Utilities Board of the City of Daphne"), "Utilities of Daphne");
        assert_eq!(
            canon("The Utilities Board of the City of Bayou La Batre"),
            "Utilities of Bayou La Batre"
        );
    }

    #[test]
    fn test_already_utilities() {
        assert_eq!(canon("Utilities Board of Riverside Utilities"), "Riverside Utilities");
    }

    #[test]
    fn test_parenthesized_acronym() {
        assert_eq!(canon("Jefferson County Environmental Services (JCES)"), "JCES");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(canon("  Fairhope   Public Utilities "), "Fairhope Public Utilities");
        assert_eq!(canonicalize_org("   "), None);
    }

    #[test]
    fn test_canonicalizer_memoizes() {
        let names = NameCanonicalizer::default();
        assert_eq!(names.canonicalize("City of Foley").as_deref(), Some("Utilities of Foley"));
        assert_eq!(names.canonicalize("City of Foley").as_deref(), Some("Utilities of Foley"));
        assert_eq!(names.cached(), 1);
    }
}
