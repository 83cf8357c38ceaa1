use std::collections::{BTreeMap, HashSet};

use pogkit_io::{load_table, Archive};

use crate::append;
use crate::category;
use crate::combined;
use crate::config::EngineConfig;
use crate::create;
use crate::document::{parse_document, serialize_document, BundleKind, GroupDocument};
use crate::error::ReconError;
use crate::expire;
use crate::issue::{Issue, IssueKind};
use crate::model::{AddTarget, CreateTarget, OperationRequest, OperationResult};
use crate::normalize::normalize_text;

pub(crate) const MSG_DONE: &str = "done";
pub(crate) const MSG_NO_CHANGES: &str = "no changes";

/// Run one operation. Never fails: fatal errors come back as `ok=false`
/// with a top-level message and a tagged issue.
pub fn run(config: &EngineConfig, request: &OperationRequest) -> OperationResult {
    let mut result = OperationResult::default();

    let outcome = config.validate().and_then(|()| match request {
        OperationRequest::CreateBundle { target: CreateTarget::Services, table } => {
            create::service_bundles(config, table, &mut result)
        }
        OperationRequest::CreateBundle { target: CreateTarget::Transition { name, id }, table } => {
            create::transition_bundle(config, table, name, id, &mut result)
        }
        OperationRequest::AddEntries { target: AddTarget::Services, archive, table } => {
            append::services(config, archive, table, &mut result)
        }
        OperationRequest::AddEntries { target: AddTarget::Transitions { offer_id }, archive, table } => {
            append::transitions(config, archive, table, offer_id, &mut result)
        }
        OperationRequest::ExpireEntries { kind, archive, table } => {
            expire::entries(config, *kind, archive, table, &mut result)
        }
        OperationRequest::CombinedExpireAdd { archive, expire_table, add_table } => {
            combined::expire_and_add(config, archive, expire_table, add_table, &mut result)
        }
        OperationRequest::GenerateCategories { table } => category::generate(config, table, &mut result),
    });

    match outcome {
        Ok(()) => {
            let (errors, warnings, infos) = result.severity_counts();
            log::info!(
                "{}: {} ({} errors, {} warnings, {} infos)",
                request.name(),
                result.msg,
                errors,
                warnings,
                infos
            );
        }
        Err(err) => {
            log::warn!("{} aborted: {err}", request.name());
            result.fail(&err);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// A row whose identifier columns are all non-blank.
#[derive(Debug, Clone)]
pub(crate) struct ValidRow {
    pub number: usize,
    /// Normalized values in requested column order.
    pub values: Vec<String>,
}

pub(crate) struct LoadedRows {
    pub total: usize,
    pub rows: Vec<ValidRow>,
}

/// Load `columns` from a table and drop rows with a blank identifier.
/// Each blank identifier records one `EmptyId` warning.
pub(crate) fn load_valid_rows(
    bytes: &[u8],
    table: &'static str,
    columns: &[&str],
    id_columns: &[usize],
    result: &mut OperationResult,
) -> Result<LoadedRows, ReconError> {
    let loaded = load_table(bytes, columns).map_err(|source| ReconError::Table { table, source })?;
    log::debug!("{table}: {} rows read as {}", loaded.len(), loaded.format);

    let mut rows = Vec::with_capacity(loaded.len());
    for row in &loaded.rows {
        let values: Vec<String> = (0..columns.len()).map(|i| normalize_text(row.cell(i))).collect();

        let mut valid = true;
        for &idx in id_columns {
            if values[idx].is_empty() {
                valid = false;
                result.push(
                    Issue::warning(IssueKind::EmptyId, format!("empty {}", columns[idx]))
                        .at_row(row.number)
                        .with("table", table)
                        .with("column", columns[idx]),
                );
            }
        }
        if valid {
            rows.push(ValidRow { number: row.number, values });
        }
    }

    Ok(LoadedRows { total: loaded.len(), rows })
}

/// Keep the first occurrence of each key. Returns the number removed.
pub(crate) fn dedup_by_key<T, K, F>(items: &mut Vec<T>, mut key: F) -> usize
where
    K: Eq + std::hash::Hash,
    F: FnMut(&T) -> K,
{
    let before = items.len();
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(key(item)));
    before - items.len()
}

// ---------------------------------------------------------------------------
// Archive documents
// ---------------------------------------------------------------------------

pub(crate) fn open_archive(bytes: &[u8]) -> Result<Archive, ReconError> {
    Archive::read(bytes).map_err(ReconError::Archive)
}

/// A parsed bundle document with its archive path and normalized id.
pub(crate) struct ScannedDocument {
    pub path: String,
    pub id: String,
    pub document: GroupDocument,
    pristine: GroupDocument,
}

impl ScannedDocument {
    /// Normalized ids of the current entry list.
    pub fn entry_ids(&self) -> HashSet<String> {
        self.document.entries().iter().map(|e| e.id_text()).collect()
    }

    /// Sort and serialize into `updated` if the document differs from what
    /// was read. Returns whether it was written.
    pub fn persist(mut self, updated: &mut BTreeMap<String, Vec<u8>>, result: &mut OperationResult) -> bool {
        if self.document == self.pristine {
            return false;
        }
        crate::builders::sort_entries(self.document.entries_mut());
        match serialize_document(&self.document) {
            Ok(bytes) => {
                log::debug!("{}: rewritten", self.path);
                updated.insert(self.path, bytes);
                true
            }
            Err(e) => {
                result.push(
                    Issue::error(IssueKind::InvalidJson, "document could not be serialized")
                        .in_file(self.path)
                        .with("error", e.message),
                );
                false
            }
        }
    }
}

/// Parse every `.json` entry under `dir`. Unreadable files and documents
/// without an id are recorded and skipped.
pub(crate) fn scan_documents(archive: &Archive, dir: &str, result: &mut OperationResult) -> Vec<ScannedDocument> {
    let mut scanned = Vec::new();
    for path in archive.json_under(dir) {
        let bytes = archive.get(path).unwrap_or_default();
        let document: GroupDocument = match parse_document(bytes) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("{path}: {e}");
                result.push(
                    Issue::error(IssueKind::InvalidJson, "invalid JSON document")
                        .in_file(path)
                        .with("error", truncate(&e.message, 100)),
                );
                continue;
            }
        };

        let id = document.id_text();
        if id.is_empty() {
            result.push(Issue::error(IssueKind::EmptyId, "document has no id").in_file(path));
            continue;
        }

        scanned.push(ScannedDocument {
            path: path.to_string(),
            id,
            pristine: document.clone(),
            document,
        });
    }
    scanned
}

/// Records `InvalidTargetType` and returns false when the purpose differs.
pub(crate) fn check_purpose(doc: &ScannedDocument, kind: BundleKind, result: &mut OperationResult) -> bool {
    if doc.document.has_purpose(kind) {
        return true;
    }
    log::debug!("{}: not a {kind}, left untouched", doc.path);
    result.push(
        Issue::error(
            IssueKind::InvalidTargetType,
            format!("unexpected purpose (expected [\"{}\"])", kind.purpose()),
        )
        .in_file(&doc.path)
        .with("json_id", doc.id.as_str())
        .with("purpose", doc.document.purpose.clone().unwrap_or_default()),
    );
    false
}

pub(crate) fn not_found_entry_kind(kind: BundleKind) -> IssueKind {
    match kind {
        BundleKind::Service => IssueKind::NotFoundServiceId,
        BundleKind::Transition => IssueKind::NotFoundOfferId,
    }
}

/// One `NotFoundJsonId` error per target id never seen in the archive.
pub(crate) fn report_missing_documents<'a>(
    targets: impl IntoIterator<Item = &'a String>,
    seen: &HashSet<String>,
    result: &mut OperationResult,
) {
    for id in targets {
        if !seen.contains(id) {
            result.push(Issue::error(IssueKind::NotFoundJsonId, "document not found").with("json_id", id.as_str()));
        }
    }
}

/// Attach the rewritten archive, or report "no changes" when nothing changed.
pub(crate) fn finish_rewrite(
    archive: &Archive,
    updated: &BTreeMap<String, Vec<u8>>,
    result: &mut OperationResult,
) -> Result<(), ReconError> {
    result.set_count("files_processed", updated.len());
    result.ok = true;
    if updated.is_empty() {
        result.msg = MSG_NO_CHANGES.into();
        return Ok(());
    }
    result.archive = Some(archive.rewrite(updated).map_err(ReconError::Archive)?);
    result.msg = MSG_DONE.into();
    Ok(())
}

/// Relative path of a generated document; `taken` tracks collisions.
pub(crate) fn claim_path(
    dir: &str,
    id: &str,
    taken: &mut HashSet<String>,
    result: &mut OperationResult,
) -> Option<String> {
    let path = format!("{dir}/{}.json", crate::normalize::safe_name(id));
    if taken.insert(path.clone()) {
        return Some(path);
    }
    result.push(
        Issue::warning(IssueKind::DuplicateInSource, "output file name already used; document skipped")
            .in_file(&path)
            .with("json_id", id),
    );
    None
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
