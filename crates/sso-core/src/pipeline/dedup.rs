//! Duplicate submission collapse.

use std::collections::HashMap;

use tracing::debug;

use super::assemble::Assembly;

/// Grouping key: the report id, or the source file for reports without one.
pub fn dedup_key(assembly: &Assembly) -> String {
    let record = &assembly.record;
    if record.report_id_synthetic {
        format!("__noid__{}", record.source_file)
    } else {
        record.report_id.clone()
    }
}

/// Keep one assembly per key.
///
/// A later footer stamp wins; a stamped submission beats an unstamped one;
/// otherwise the first seen is kept. Output follows first-seen key order.
pub fn dedupe_keep_newest(assemblies: Vec<Assembly>) -> Vec<Assembly> {
    let mut order: Vec<String> = Vec::new();
    let mut kept: HashMap<String, Assembly> = HashMap::new();

    for assembly in assemblies {
        let key = dedup_key(&assembly);
        match kept.get(&key) {
            None => {
                order.push(key.clone());
                kept.insert(key, assembly);
            }
            Some(existing) => {
                let replace = match (existing.submitted_at, assembly.submitted_at) {
                    (None, Some(_)) => true,
                    (Some(old), Some(new)) => new > old,
                    _ => false,
                };
                debug!(
                    "Duplicate {}: {} {} over {}",
                    key,
                    if replace { "keeping" } else { "dropping" },
                    assembly.record.source_file,
                    existing.record.source_file
                );
                if replace {
                    kept.insert(key, assembly);
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| kept.remove(&key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SsoRecord;
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;

    fn stamp(hour: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
    }

    fn assembly(id: &str, file: &str, submitted_at: Option<NaiveDateTime>) -> Assembly {
        Assembly {
            record: SsoRecord::new(id, file),
            submitted_at,
            diagnostics: Vec::new(),
        }
    }

    fn files(kept: &[Assembly]) -> Vec<&str> {
        kept.iter().map(|a| a.record.source_file.as_str()).collect()
    }

    #[test]
    fn test_later_stamp_wins() {
        let kept = dedupe_keep_newest(vec![
            assembly("SSO-1", "first.pdf", stamp(9)),
            assembly("SSO-1", "second.pdf", stamp(11)),
            assembly("SSO-1", "third.pdf", stamp(10)),
        ]);
        assert_eq!(files(&kept), vec!["second.pdf"]);
    }

    #[test]
    fn test_stamped_beats_unstamped() {
        let kept = dedupe_keep_newest(vec![
            assembly("SSO-1", "bare.pdf", None),
            assembly("SSO-1", "stamped.pdf", stamp(9)),
            assembly("SSO-1", "bare-again.pdf", None),
        ]);
        assert_eq!(files(&kept), vec!["stamped.pdf"]);
    }

    #[test]
    fn test_first_seen_without_stamps() {
        let kept = dedupe_keep_newest(vec![
            assembly("SSO-1", "a.pdf", None),
            assembly("SSO-1", "b.pdf", None),
        ]);
        assert_eq!(files(&kept), vec!["a.pdf"]);
    }

    #[test]
    fn test_order_and_synthetic_keys() {
        let mut noid_a = assembly("NOID-aaaaaaaaaaaa", "x.pdf", None);
        noid_a.record.report_id_synthetic = true;
        let mut noid_b = assembly("NOID-bbbbbbbbbbbb", "y.pdf", None);
        noid_b.record.report_id_synthetic = true;

        let kept = dedupe_keep_newest(vec![
            assembly("SSO-2", "two.pdf", None),
            noid_a,
            assembly("SSO-1", "one.pdf", None),
            noid_b,
            assembly("SSO-2", "two-later.pdf", stamp(8)),
        ]);
        assert_eq!(files(&kept), vec!["two-later.pdf", "x.pdf", "one.pdf", "y.pdf"]);
        assert_eq!(dedup_key(&kept[1]), "__noid__x.pdf");
    }
}
