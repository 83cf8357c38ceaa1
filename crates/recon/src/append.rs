//! Append entries to existing bundles.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::builders::make_offering_entry;
use crate::config::EngineConfig;
use crate::document::BundleKind;
use crate::engine::{
    check_purpose, finish_rewrite, load_valid_rows, open_archive, report_missing_documents, scan_documents,
};
use crate::error::ReconError;
use crate::issue::{Issue, IssueKind};
use crate::model::{Details, OperationResult, SkipDetail, SkipReason};
use crate::normalize::normalize_str;

const SERVICE_COLUMNS: [&str; 3] = ["Addons ID", "Имя услуги", "ID услуги"];
const TRANSITION_COLUMNS: [&str; 1] = ["json_id"];

/// Rows name a service bundle and a service to append to it.
pub(crate) fn services(
    config: &EngineConfig,
    archive: &[u8],
    table: &[u8],
    result: &mut OperationResult,
) -> Result<(), ReconError> {
    let loaded = load_valid_rows(table, "table", &SERVICE_COLUMNS, &[0, 2], result)?;
    result.set_count("total_rows", loaded.total);
    result.set_count("valid_rows", loaded.rows.len());

    // bundle id -> [(service id, service name)]
    let mut targets: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    for row in loaded.rows {
        let [bundle_id, service_name, service_id]: [String; 3] = match row.values.try_into() {
            Ok(values) => values,
            Err(_) => continue,
        };
        targets.entry(bundle_id).or_default().push((service_id, service_name));
    }

    let archive = open_archive(archive)?;
    result.set_count("json_files_in_zip", archive.json_under(&config.group_dir).len());

    let mut updated = BTreeMap::new();
    let mut seen = HashSet::new();
    let mut skipped = Vec::new();
    let mut added = 0;

    for mut doc in scan_documents(&archive, &config.group_dir, result) {
        let Some(rows) = targets.get(&doc.id) else {
            continue;
        };
        seen.insert(doc.id.clone());
        if !check_purpose(&doc, BundleKind::Service, result) {
            continue;
        }

        let mut existing = doc.entry_ids();
        for (sid, sname) in rows {
            if existing.contains(sid) {
                result.push(
                    Issue::info(IssueKind::AlreadyExists, "service already in bundle")
                        .in_file(&doc.path)
                        .with("json_id", doc.id.as_str())
                        .with("service_id", sid.as_str())
                        .with("service_name", sname.as_str()),
                );
                skipped.push(SkipDetail {
                    document_id: Some(doc.id.clone()),
                    entry_id: sid.clone(),
                    entry_name: Some(sname.clone()).filter(|n| !n.is_empty()),
                    reason: SkipReason::AlreadyExistsInGroup,
                });
                continue;
            }
            doc.document.push_entry(make_offering_entry(sid, Some(sname), &config.locale, false));
            existing.insert(sid.clone());
            added += 1;
        }

        doc.persist(&mut updated, result);
    }

    report_missing_documents(targets.keys(), &seen, result);

    result.set_count("added", added);
    result.set_count("skipped_existing", skipped.len());
    result.details = Some(Details {
        skipped_existing: skipped,
        ..Details::default()
    });
    finish_rewrite(&archive, &updated, result)
}

/// Rows name transition bundles; `offer_id` is appended to each of them.
pub(crate) fn transitions(
    config: &EngineConfig,
    archive: &[u8],
    table: &[u8],
    offer_id: &str,
    result: &mut OperationResult,
) -> Result<(), ReconError> {
    let want = normalize_str(offer_id);
    if want.is_empty() {
        return Err(ReconError::InvalidParameter {
            name: "offer_id",
            reason: "offer id must not be blank".into(),
        });
    }

    let loaded = load_valid_rows(table, "table", &TRANSITION_COLUMNS, &[0], result)?;
    result.set_count("total_rows", loaded.total);
    result.set_count("valid_rows", loaded.rows.len());

    let mut targets = BTreeSet::new();
    for row in &loaded.rows {
        if !targets.insert(row.values[0].clone()) {
            result.push(
                Issue::info(IssueKind::DuplicateInSource, "json_id listed more than once")
                    .at_row(row.number)
                    .with("json_id", row.values[0].as_str()),
            );
        }
    }

    let archive = open_archive(archive)?;
    result.set_count("json_files_in_zip", archive.json_under(&config.group_dir).len());

    let mut updated = BTreeMap::new();
    let mut seen = HashSet::new();
    let mut skipped = Vec::new();
    let mut added = 0;

    for mut doc in scan_documents(&archive, &config.group_dir, result) {
        if !targets.contains(&doc.id) {
            continue;
        }
        seen.insert(doc.id.clone());
        if !check_purpose(&doc, BundleKind::Transition, result) {
            continue;
        }

        if doc.entry_ids().contains(&want) {
            result.push(
                Issue::info(IssueKind::AlreadyExists, "offer already in transition bundle")
                    .in_file(&doc.path)
                    .with("json_id", doc.id.as_str())
                    .with("offer_id", want.as_str()),
            );
            skipped.push(SkipDetail {
                document_id: Some(doc.id.clone()),
                entry_id: want.clone(),
                entry_name: None,
                reason: SkipReason::AlreadyExistsInGroup,
            });
            continue;
        }

        doc.document.push_entry(make_offering_entry(&want, None, &config.locale, false));
        added += 1;
        doc.persist(&mut updated, result);
    }

    report_missing_documents(&targets, &seen, result);

    result.set_count("added", added);
    result.set_count("skipped_existing", skipped.len());
    result.details = Some(Details {
        skipped_existing: skipped,
        ..Details::default()
    });
    finish_rewrite(&archive, &updated, result)
}
