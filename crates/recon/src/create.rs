//! Build new bundle documents from a table alone.

use std::collections::{BTreeMap, HashSet};

use pogkit_io::build_archive;

use crate::builders::{build_service_bundle, build_transition_bundle, make_offering_entry};
use crate::config::EngineConfig;
use crate::document::serialize_document;
use crate::engine::{claim_path, dedup_by_key, load_valid_rows, MSG_DONE};
use crate::error::ReconError;
use crate::issue::{Issue, IssueKind};
use crate::model::OperationResult;
use crate::normalize::{normalize_str, safe_name};

const SERVICE_COLUMNS: [&str; 4] = ["Addons name", "Addons ID", "Имя услуги", "ID услуги"];
const TRANSITION_COLUMNS: [&str; 1] = ["offer_id"];

/// One service bundle per (display name, bundle id) group.
pub(crate) fn service_bundles(
    config: &EngineConfig,
    table: &[u8],
    result: &mut OperationResult,
) -> Result<(), ReconError> {
    let loaded = load_valid_rows(table, "table", &SERVICE_COLUMNS, &[1, 3], result)?;
    result.set_count("total_rows", loaded.total);
    result.set_count("valid_rows", loaded.rows.len());
    result.set_count("skipped_rows", loaded.total - loaded.rows.len());

    if loaded.rows.is_empty() {
        result.msg = "no valid rows in table".into();
        return Ok(());
    }

    // (name, id) -> [(service id, service name)]
    let mut groups: BTreeMap<(String, String), Vec<(String, String)>> = BTreeMap::new();
    for row in loaded.rows {
        let [name, id, service_name, service_id]: [String; 4] = match row.values.try_into() {
            Ok(values) => values,
            Err(_) => continue,
        };
        groups.entry((name, id)).or_default().push((service_id, service_name));
    }

    let mut files = Vec::new();
    let mut taken = HashSet::new();
    let mut duplicates_total = 0;
    let mut services_total = 0;

    for ((name, id), mut services) in groups {
        let removed = dedup_by_key(&mut services, |(sid, _)| sid.clone());
        if removed > 0 {
            duplicates_total += removed;
            result.push(
                Issue::info(IssueKind::DuplicateInSource, format!("{removed} duplicate service row(s) removed"))
                    .with("addons_id", id.as_str())
                    .with("addons_name", name.as_str())
                    .with("duplicates_removed", removed),
            );
        }

        let Some(path) = claim_path(&config.group_dir, &id, &mut taken, result) else {
            continue;
        };
        let entries = services
            .iter()
            .map(|(sid, sname)| make_offering_entry(sid, Some(sname), &config.locale, false))
            .collect::<Vec<_>>();
        let count = entries.len();
        let doc = build_service_bundle(&name, &id, &config.locale, entries);
        match serialize_document(&doc) {
            Ok(bytes) => {
                log::debug!("{path}: {count} services");
                files.push((path, bytes));
                services_total += count;
            }
            Err(e) => result.push(
                Issue::error(IssueKind::InvalidJson, "document could not be serialized")
                    .in_file(path)
                    .with("error", e.message),
            ),
        }
    }

    result.set_count("duplicates_removed", duplicates_total);
    result.set_count("created_jsons", files.len());
    result.set_count("services_total", services_total);

    if files.is_empty() {
        result.msg = "no documents could be built".into();
        return Ok(());
    }

    result.archive = Some(build_archive(&files).map_err(ReconError::Archive)?);
    result.ok = true;
    result.msg = MSG_DONE.into();
    Ok(())
}

/// A single transition bundle holding every `offer_id` of the table.
pub(crate) fn transition_bundle(
    config: &EngineConfig,
    table: &[u8],
    name: &str,
    id: &str,
    result: &mut OperationResult,
) -> Result<(), ReconError> {
    let name = normalize_str(name);
    let id = normalize_str(id);
    if id.is_empty() {
        return Err(ReconError::InvalidParameter {
            name: "id",
            reason: "bundle id must not be blank".into(),
        });
    }

    let loaded = load_valid_rows(table, "table", &TRANSITION_COLUMNS, &[0], result)?;
    result.set_count("total_rows", loaded.total);
    result.set_count("valid_rows", loaded.rows.len());

    if loaded.rows.is_empty() {
        result.msg = "no valid rows in table".into();
        return Ok(());
    }

    let mut offers: Vec<String> = loaded.rows.into_iter().filter_map(|r| r.values.into_iter().next()).collect();
    let removed = dedup_by_key(&mut offers, |o| o.clone());
    if removed > 0 {
        result.push(
            Issue::info(IssueKind::DuplicateInSource, format!("{removed} duplicate offer row(s) removed"))
                .with("json_id", id.as_str())
                .with("duplicates_removed", removed),
        );
    }
    result.set_count("duplicates_removed", removed);

    let entries = offers
        .iter()
        .map(|offer| make_offering_entry(offer, None, &config.locale, false))
        .collect::<Vec<_>>();
    let doc = build_transition_bundle(&name, &id, &config.locale, entries);
    let path = format!("{}/{}.json", config.group_dir, safe_name(&id));
    let bytes = match serialize_document(&doc) {
        Ok(bytes) => bytes,
        Err(e) => {
            result.push(
                Issue::error(IssueKind::InvalidJson, "document could not be serialized")
                    .in_file(path)
                    .with("error", e.message),
            );
            result.msg = "no documents could be built".into();
            return Ok(());
        }
    };

    result.archive = Some(build_archive(&[(path, bytes)]).map_err(ReconError::Archive)?);
    result.set_count("created_jsons", 1);
    result.set_count("offers_total", offers.len());
    result.ok = true;
    result.msg = MSG_DONE.into();
    Ok(())
}
