//! Regenerate category documents from an offer/category table.

use std::collections::{BTreeMap, HashSet};

use pogkit_io::build_archive;

use crate::builders::build_category_document;
use crate::config::EngineConfig;
use crate::document::serialize_document;
use crate::engine::{claim_path, load_valid_rows, MSG_DONE};
use crate::error::ReconError;
use crate::issue::{Issue, IssueKind};
use crate::model::OperationResult;

const COLUMNS: [&str; 2] = ["offer_id", "category_id"];

/// One document per offer. Categories are replaced wholesale, never merged.
pub(crate) fn generate(config: &EngineConfig, table: &[u8], result: &mut OperationResult) -> Result<(), ReconError> {
    let loaded = load_valid_rows(table, "table", &COLUMNS, &[0, 1], result)?;
    result.set_count("total_rows", loaded.total);
    result.set_count("valid_rows", loaded.rows.len());

    if loaded.rows.is_empty() {
        result.msg = "no valid rows in table".into();
        return Ok(());
    }

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in loaded.rows {
        let mut values = row.values.into_iter();
        if let (Some(offer), Some(category)) = (values.next(), values.next()) {
            groups.entry(offer).or_default().push(category);
        }
    }

    let mut files = Vec::new();
    let mut taken = HashSet::new();
    let mut categories_total = 0;

    for (offer, categories) in groups {
        let doc = build_category_document(&offer, &categories);
        let collapsed = categories.len() - doc.category.len();
        if collapsed > 0 {
            result.push(
                Issue::info(IssueKind::DuplicateInSource, format!("{collapsed} duplicate category row(s) collapsed"))
                    .with("offer_id", offer.as_str())
                    .with("duplicates_removed", collapsed),
            );
        }

        let Some(path) = claim_path(&config.category_dir, &offer, &mut taken, result) else {
            continue;
        };
        match serialize_document(&doc) {
            Ok(bytes) => {
                categories_total += doc.category.len();
                files.push((path, bytes));
            }
            Err(e) => result.push(
                Issue::error(IssueKind::InvalidJson, "document could not be serialized")
                    .in_file(path)
                    .with("error", e.message),
            ),
        }
    }

    result.set_count("created_jsons", files.len());
    result.set_count("categories_total", categories_total);

    if files.is_empty() {
        result.msg = "no documents could be built".into();
        return Ok(());
    }

    result.archive = Some(build_archive(&files).map_err(ReconError::Archive)?);
    result.ok = true;
    result.msg = MSG_DONE.into();
    Ok(())
}
