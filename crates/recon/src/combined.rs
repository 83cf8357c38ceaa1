//! Expire and add services across every service bundle in one pass.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::builders::make_offering_entry;
use crate::config::EngineConfig;
use crate::document::BundleKind;
use crate::engine::{check_purpose, dedup_by_key, finish_rewrite, load_valid_rows, open_archive, scan_documents};
use crate::error::ReconError;
use crate::issue::{Issue, IssueKind};
use crate::model::{Details, OperationResult, SkipDetail, SkipReason};

const COLUMNS: [&str; 2] = ["ID услуги", "Имя услуги"];
const OVERLAP_PREVIEW: usize = 5;

pub(crate) fn expire_and_add(
    config: &EngineConfig,
    archive: &[u8],
    expire_table: &[u8],
    add_table: &[u8],
    result: &mut OperationResult,
) -> Result<(), ReconError> {
    let expire_rows = load_valid_rows(expire_table, "expire table", &COLUMNS, &[0], result)?;
    result.set_count("expire_total_rows", expire_rows.total);
    result.set_count("expire_valid_rows", expire_rows.rows.len());
    let to_expire: BTreeSet<String> = expire_rows.rows.into_iter().map(|r| r.values[0].clone()).collect();

    let add_rows = load_valid_rows(add_table, "add table", &COLUMNS, &[0], result)?;
    result.set_count("add_total_rows", add_rows.total);
    result.set_count("add_valid_rows", add_rows.rows.len());
    let mut to_add: Vec<(String, String)> = add_rows
        .rows
        .into_iter()
        .map(|r| (r.values[0].clone(), r.values[1].clone()))
        .collect();
    let removed = dedup_by_key(&mut to_add, |(sid, _)| sid.clone());
    if removed > 0 {
        result.push(
            Issue::info(IssueKind::DuplicateInSource, format!("{removed} duplicate add row(s) removed"))
                .with("table", "add table")
                .with("duplicates_removed", removed),
        );
    }

    let add_ids: BTreeSet<&String> = to_add.iter().map(|(sid, _)| sid).collect();
    let overlap: Vec<&String> = add_ids.into_iter().filter(|sid| to_expire.contains(*sid)).collect();
    if !overlap.is_empty() {
        let preview: Vec<&str> = overlap.iter().take(OVERLAP_PREVIEW).map(|s| s.as_str()).collect();
        result.push(
            Issue::warning(
                IssueKind::DuplicateInSource,
                format!("services present in both tables: {}", preview.join(", ")),
            )
            .with("overlap_count", overlap.len()),
        );
    }

    let archive = open_archive(archive)?;
    result.set_count("json_files_in_zip", archive.json_under(&config.group_dir).len());

    let mut updated = BTreeMap::new();
    let mut found = HashSet::new();
    let mut skipped_existing = Vec::new();
    let mut expired = 0;
    let mut added = 0;

    for mut doc in scan_documents(&archive, &config.group_dir, result) {
        if !check_purpose(&doc, BundleKind::Service, result) {
            found.extend(doc.entry_ids());
            continue;
        }

        for entry in doc.document.entries_mut() {
            let sid = entry.id_text();
            if !to_expire.contains(&sid) {
                continue;
            }
            if entry.is_expired() {
                result.push(
                    Issue::info(IssueKind::AlreadyExpired, "service already expired")
                        .in_file(&doc.path)
                        .with("json_id", doc.id.as_str())
                        .with("service_id", sid),
                );
            } else {
                entry.expire();
                expired += 1;
            }
        }

        let mut existing = doc.entry_ids();
        for (sid, sname) in &to_add {
            if existing.contains(sid) {
                result.push(
                    Issue::info(IssueKind::AlreadyExists, "service already in bundle")
                        .in_file(&doc.path)
                        .with("json_id", doc.id.as_str())
                        .with("service_id", sid.as_str())
                        .with("service_name", sname.as_str()),
                );
                skipped_existing.push(SkipDetail {
                    document_id: Some(doc.id.clone()),
                    entry_id: sid.clone(),
                    entry_name: Some(sname.clone()).filter(|n| !n.is_empty()),
                    reason: SkipReason::AlreadyExists,
                });
                continue;
            }
            doc.document.push_entry(make_offering_entry(sid, Some(sname), &config.locale, false));
            existing.insert(sid.clone());
            added += 1;
        }

        found.extend(existing);
        doc.persist(&mut updated, result);
    }

    let mut skipped_not_found = Vec::new();
    for sid in to_expire.iter().filter(|sid| !found.contains(*sid)) {
        result.push(
            Issue::info(IssueKind::NotFoundServiceId, "service to expire not found in any bundle")
                .with("service_id", sid.as_str()),
        );
        skipped_not_found.push(SkipDetail {
            document_id: None,
            entry_id: sid.clone(),
            entry_name: None,
            reason: SkipReason::NotFoundInAnyJson,
        });
    }

    result.set_count("services_expired", expired);
    result.set_count("services_added", added);
    result.set_count("skipped_expire_not_found", skipped_not_found.len());
    result.set_count("skipped_add_existing", skipped_existing.len());
    result.details = Some(Details {
        skipped_existing,
        skipped_expire_not_found: skipped_not_found,
    });
    finish_rewrite(&archive, &updated, result)
}
