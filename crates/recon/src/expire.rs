//! Mark bundle entries as expired for sales.

use std::collections::{BTreeMap, HashSet};

use crate::config::EngineConfig;
use crate::document::BundleKind;
use crate::engine::{
    check_purpose, finish_rewrite, load_valid_rows, not_found_entry_kind, open_archive,
    report_missing_documents, scan_documents,
};
use crate::error::ReconError;
use crate::issue::{Issue, IssueKind};
use crate::model::OperationResult;

/// Rows name a bundle (`json_id`) and one of its entries (`service_id` for
/// service bundles, `offer_id` for transition bundles).
pub(crate) fn entries(
    config: &EngineConfig,
    kind: BundleKind,
    archive: &[u8],
    table: &[u8],
    result: &mut OperationResult,
) -> Result<(), ReconError> {
    let entry_key = kind.entry_key();
    let loaded = load_valid_rows(table, "table", &["json_id", entry_key], &[0, 1], result)?;
    result.set_count("total_rows", loaded.total);
    result.set_count("valid_rows", loaded.rows.len());

    let mut targets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in loaded.rows {
        let mut values = row.values.into_iter();
        if let (Some(json_id), Some(entry_id)) = (values.next(), values.next()) {
            targets.entry(json_id).or_default().push(entry_id);
        }
    }

    let archive = open_archive(archive)?;
    result.set_count("json_files_in_zip", archive.json_under(&config.group_dir).len());

    let mut updated = BTreeMap::new();
    let mut seen = HashSet::new();
    let mut expired = 0;
    let mut already_expired = 0;
    let mut not_found = 0;

    for mut doc in scan_documents(&archive, &config.group_dir, result) {
        let Some(wanted) = targets.get(&doc.id) else {
            continue;
        };
        seen.insert(doc.id.clone());
        if !check_purpose(&doc, kind, result) {
            continue;
        }

        for entry_id in wanted {
            let mut matched = doc
                .document
                .entries_mut()
                .iter_mut()
                .filter(|e| e.id_text() == *entry_id)
                .peekable();

            if matched.peek().is_none() {
                not_found += 1;
                result.push(
                    Issue::error(not_found_entry_kind(kind), "entry not found in bundle")
                        .in_file(&doc.path)
                        .with("json_id", doc.id.as_str())
                        .with(entry_key, entry_id.as_str()),
                );
                continue;
            }

            let mut flipped = false;
            for entry in matched {
                if !entry.is_expired() {
                    entry.expire();
                    flipped = true;
                }
            }

            if flipped {
                expired += 1;
            } else {
                already_expired += 1;
                result.push(
                    Issue::info(IssueKind::AlreadyExpired, "entry already expired")
                        .in_file(&doc.path)
                        .with("json_id", doc.id.as_str())
                        .with(entry_key, entry_id.as_str()),
                );
            }
        }

        doc.persist(&mut updated, result);
    }

    report_missing_documents(targets.keys(), &seen, result);

    result.set_count("expired", expired);
    result.set_count("already_expired", already_expired);
    result.set_count("not_found_entries", not_found);
    finish_rewrite(&archive, &updated, result)
}
