use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::document::BundleKind;
use crate::error::ReconError;
use crate::issue::{Issue, IssueKind, Severity};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// What to build in a create operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateTarget {
    /// One service bundle per (`Addons name`, `Addons ID`) group.
    Services,
    /// A single transition bundle holding every `offer_id` row.
    Transition { name: String, id: String },
}

/// Which bundles an add operation appends to.
#[derive(Debug, Clone, PartialEq)]
pub enum AddTarget {
    /// Rows name the bundle (`Addons ID`) and the service to append.
    Services,
    /// Rows name transition bundles (`json_id`); `offer_id` is appended to each.
    Transitions { offer_id: String },
}

/// One engine invocation with its raw inputs.
#[derive(Debug, Clone)]
pub enum OperationRequest {
    CreateBundle {
        target: CreateTarget,
        table: Vec<u8>,
    },
    AddEntries {
        target: AddTarget,
        archive: Vec<u8>,
        table: Vec<u8>,
    },
    ExpireEntries {
        kind: BundleKind,
        archive: Vec<u8>,
        table: Vec<u8>,
    },
    CombinedExpireAdd {
        archive: Vec<u8>,
        expire_table: Vec<u8>,
        add_table: Vec<u8>,
    },
    GenerateCategories {
        table: Vec<u8>,
    },
}

impl OperationRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateBundle { target: CreateTarget::Services, .. } => "create service bundles",
            Self::CreateBundle { .. } => "create transition bundle",
            Self::AddEntries { target: AddTarget::Services, .. } => "add services to bundles",
            Self::AddEntries { .. } => "add offer to transitions",
            Self::ExpireEntries { kind: BundleKind::Service, .. } => "expire services",
            Self::ExpireEntries { .. } => "expire transition offers",
            Self::CombinedExpireAdd { .. } => "expire and add services",
            Self::GenerateCategories { .. } => "generate categories",
        }
    }
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyExistsInGroup,
    AlreadyExists,
    NotFoundInAnyJson,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExistsInGroup => write!(f, "already_exists_in_group"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::NotFoundInAnyJson => write!(f, "not_found_in_any_json"),
        }
    }
}

/// A row the operation deliberately did not apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub entry_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_name: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Details {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_existing: Vec<SkipDetail>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_expire_not_found: Vec<SkipDetail>,
}

impl Details {
    /// Every skip record, existing first.
    pub fn all(&self) -> Vec<SkipDetail> {
        self.skipped_existing
            .iter()
            .chain(&self.skipped_expire_not_found)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationResult {
    pub ok: bool,
    pub msg: String,
    /// Output archive; present only when at least one document was written.
    #[serde(skip)]
    pub archive: Option<Vec<u8>>,
    pub counts: BTreeMap<String, usize>,
    pub issues: Vec<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

impl OperationResult {
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn set_count(&mut self, key: &str, value: usize) {
        self.counts.insert(key.to_string(), value);
    }

    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Abort: `ok=false`, no archive, one issue tagged by the error kind.
    pub fn fail(&mut self, err: &ReconError) {
        self.ok = false;
        self.archive = None;
        self.msg = format!("error: {err}");
        let mut issue = Issue::error(err.issue_kind(), format!("fatal: {err}"));
        if let ReconError::Table { table, source: pogkit_io::LoadError::MissingColumns { missing, available } } = err {
            issue = issue
                .with("table", *table)
                .with("missing", missing.clone())
                .with("available", available.clone());
        }
        self.push(issue);
    }

    /// (errors, warnings, infos)
    pub fn severity_counts(&self) -> (usize, usize, usize) {
        self.issues.iter().fold((0, 0, 0), |(e, w, i), issue| match issue.severity {
            Severity::Error => (e + 1, w, i),
            Severity::Warning => (e, w + 1, i),
            Severity::Info => (e, w, i + 1),
        })
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}
