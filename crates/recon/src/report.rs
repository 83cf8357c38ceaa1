//! CSV exports of an operation's issues and skip lists.
//!
//! Both files start with a UTF-8 byte order mark so spreadsheet tools pick
//! the right encoding.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::document::raw_text;
use crate::issue::Issue;
use crate::model::SkipDetail;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// `severity,type,message,file_path,row_number` then one `context_<key>`
/// column per context key seen, sorted.
pub fn issues_csv(issues: &[Issue]) -> csv::Result<Vec<u8>> {
    let keys: BTreeSet<&str> = issues
        .iter()
        .flat_map(|i| i.context.keys().map(|k| k.as_str()))
        .collect();

    let mut header: Vec<String> = ["severity", "type", "message", "file_path", "row_number"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(keys.iter().map(|k| format!("context_{k}")));

    let mut rows = vec![header];
    for issue in issues {
        let mut row = vec![
            issue.severity.to_string(),
            issue.kind.to_string(),
            issue.message.clone(),
            issue.file_path.clone().unwrap_or_default(),
            issue.row_number.map(|n| n.to_string()).unwrap_or_default(),
        ];
        row.extend(keys.iter().map(|k| issue.context.get(*k).map(context_text).unwrap_or_default()));
        rows.push(row);
    }
    write_csv(&rows)
}

/// `document_id,entry_id,entry_name,reason`
pub fn skipped_csv(details: &[SkipDetail]) -> csv::Result<Vec<u8>> {
    let mut rows = vec![vec![
        "document_id".to_string(),
        "entry_id".to_string(),
        "entry_name".to_string(),
        "reason".to_string(),
    ]];
    for d in details {
        rows.push(vec![
            d.document_id.clone().unwrap_or_default(),
            d.entry_id.clone(),
            d.entry_name.clone().unwrap_or_default(),
            d.reason.to_string(),
        ]);
    }
    write_csv(&rows)
}

fn context_text(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => value.to_string(),
        other => raw_text(other),
    }
}

fn write_csv(rows: &[Vec<String>]) -> csv::Result<Vec<u8>> {
    let mut out = BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    Ok(out)
}
