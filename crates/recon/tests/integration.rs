use std::path::PathBuf;

use pogkit_io::{build_archive, read_archive, Archive};
use pogkit_recon::document::{parse_document, CategoryDocument, GroupDocument};
use serde_json::{json, Value};
use pogkit_recon::{
    run, AddTarget, BundleKind, CreateTarget, EngineConfig, IssueKind, OperationRequest, OperationResult,
    Severity, SkipReason,
};

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn exec(request: OperationRequest) -> OperationResult {
    run(&EngineConfig::default(), &request)
}

/// A bundle document; `entries` are (id, expired) pairs written in the given order.
fn bundle_json(id: &str, purpose: &str, entries: &[(&str, bool)]) -> String {
    let entries: Vec<String> = entries
        .iter()
        .map(|(eid, expired)| format!(r#"{{"id": "{eid}", "isBundle": false, "expiredForSales": {expired}}}"#))
        .collect();
    format!(
        r#"{{"id": "{id}", "purpose": ["{purpose}"], "effective": true, "productOfferingsInGroup": [{}]}}"#,
        entries.join(", ")
    )
}

fn zip_of(entries: &[(&str, String)]) -> Vec<u8> {
    let owned: Vec<(String, Vec<u8>)> = entries
        .iter()
        .map(|(name, body)| (name.to_string(), body.clone().into_bytes()))
        .collect();
    build_archive(&owned).unwrap()
}

fn output(result: &OperationResult) -> Archive {
    read_archive(result.archive.as_ref().expect("output archive")).unwrap()
}

fn group(archive: &Archive, name: &str) -> GroupDocument {
    parse_document(archive.get(name).unwrap_or_else(|| panic!("{name} missing"))).unwrap()
}

fn entry_ids(doc: &GroupDocument) -> Vec<String> {
    doc.entries().iter().map(|e| e.raw_id()).collect()
}

fn kinds(result: &OperationResult) -> Vec<IssueKind> {
    result.issues.iter().map(|i| i.kind).collect()
}

fn sample_archive() -> Vec<u8> {
    zip_of(&[
        ("README.txt", "exported bundles".to_string()),
        ("productOfferingGroup/G1.json", bundle_json("G1", "addOn", &[("S1", false), ("S2", false)])),
        ("productOfferingGroup/G2.json", bundle_json("G2", "addOn", &[("S3", true)])),
        ("productOfferingGroup/T1.json", bundle_json("T1", "replaceOffer", &[("O1", false)])),
        ("productOfferingCategory/O1.json", r#"{"id": "O1", "category": ["C1"]}"#.to_string()),
    ])
}

// -------------------------------------------------------------------------
// Create
// -------------------------------------------------------------------------

#[test]
fn create_service_bundle_collapses_duplicate_rows() {
    let table = "Addons name,Addons ID,Имя услуги,ID услуги\nBonus 5GB,G1,4G Bonus,S1\nBonus 5GB,G1,4G Bonus,S1\n";
    let result = exec(OperationRequest::CreateBundle {
        target: CreateTarget::Services,
        table: table.as_bytes().to_vec(),
    });

    assert!(result.ok, "{}", result.msg);
    assert_eq!(result.count("created_jsons"), 1);
    assert_eq!(result.count("duplicates_removed"), 1);

    let archive = output(&result);
    assert_eq!(archive.names(), ["productOfferingGroup/G1.json"]);
    let doc = group(&archive, "productOfferingGroup/G1.json");
    assert_eq!(entry_ids(&doc), ["S1"]);
    assert!(doc.has_purpose(BundleKind::Service));
    assert_eq!(doc.field("name"), Some(&json!("Bonus_5GB")));
    assert_eq!(doc.entries()[0].display_name(), Some("4G Bonus"));

    let dup: Vec<_> = result.issues_of(IssueKind::DuplicateInSource).collect();
    assert_eq!(dup.len(), 1);
    assert_eq!(dup[0].severity, Severity::Info);
    assert_eq!(dup[0].context["duplicates_removed"], 1);
}

#[test]
fn create_service_bundles_groups_rows_and_drops_blank_ids() {
    let result = exec(OperationRequest::CreateBundle {
        target: CreateTarget::Services,
        table: fixture("create_services.csv"),
    });

    assert!(result.ok, "{}", result.msg);
    assert_eq!(result.count("total_rows"), 6);
    assert_eq!(result.count("valid_rows"), 5);
    assert_eq!(result.count("skipped_rows"), 1);
    assert_eq!(result.count("created_jsons"), 3);
    assert_eq!(result.count("services_total"), 4);

    let empty: Vec<_> = result.issues_of(IssueKind::EmptyId).collect();
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0].row_number, Some(7));
    assert_eq!(empty[0].severity, Severity::Warning);

    let archive = output(&result);
    assert_eq!(
        archive.names(),
        [
            "productOfferingGroup/G3.json",
            "productOfferingGroup/G1.json",
            "productOfferingGroup/G2.json"
        ]
    );
    assert_eq!(entry_ids(&group(&archive, "productOfferingGroup/G1.json")), ["S1", "S10"]);
    assert_eq!(group(&archive, "productOfferingGroup/G3.json").field("name"), Some(&json!("file")));
}

#[test]
fn create_without_valid_rows_fails_cleanly() {
    let table = "Addons name,Addons ID,Имя услуги,ID услуги\nBonus,,x,S1\nBonus,G1,x,nan\n";
    let result = exec(OperationRequest::CreateBundle {
        target: CreateTarget::Services,
        table: table.as_bytes().to_vec(),
    });
    assert!(!result.ok);
    assert!(result.archive.is_none());
    assert_eq!(result.msg, "no valid rows in table");
    assert_eq!(kinds(&result), [IssueKind::EmptyId, IssueKind::EmptyId]);
}

#[test]
fn create_transition_bundle() {
    let result = exec(OperationRequest::CreateBundle {
        target: CreateTarget::Transition {
            name: " Tariff moves ".into(),
            id: "T 1".into(),
        },
        table: b"offer_id\nO2\nO1\nO2\n".to_vec(),
    });

    assert!(result.ok, "{}", result.msg);
    assert_eq!(result.count("offers_total"), 2);
    assert_eq!(result.count("duplicates_removed"), 1);

    let archive = output(&result);
    let doc = group(&archive, "productOfferingGroup/T_1.json");
    assert!(doc.has_purpose(BundleKind::Transition));
    assert_eq!(doc.id_text(), "T 1");
    assert_eq!(doc.field("description").unwrap()[0]["value"], "Tariff moves");
    assert_eq!(entry_ids(&doc), ["O1", "O2"]);
    assert!(doc.entries().iter().all(|e| e.display_name().is_none()));
}

#[test]
fn blank_transition_id_is_fatal() {
    let result = exec(OperationRequest::CreateBundle {
        target: CreateTarget::Transition {
            name: "x".into(),
            id: "  ".into(),
        },
        table: b"offer_id\nO1\n".to_vec(),
    });
    assert!(!result.ok);
    assert_eq!(kinds(&result), [IssueKind::EmptyId]);
    assert_eq!(result.issues[0].severity, Severity::Error);
}

// -------------------------------------------------------------------------
// Add
// -------------------------------------------------------------------------

#[test]
fn add_services_appends_sorted_and_skips_existing() {
    let input = sample_archive();
    let table = "Addons ID,Имя услуги,ID услуги\nG1,Zero,S0\nG1,Dup,S2\nG9,Lost,S5\n";
    let result = exec(OperationRequest::AddEntries {
        target: AddTarget::Services,
        archive: input.clone(),
        table: table.as_bytes().to_vec(),
    });

    assert!(result.ok, "{}", result.msg);
    assert_eq!(result.msg, "done");
    assert_eq!(result.count("json_files_in_zip"), 3);
    assert_eq!(result.count("files_processed"), 1);
    assert_eq!(result.count("added"), 1);
    assert_eq!(result.count("skipped_existing"), 1);

    let out = output(&result);
    let doc = group(&out, "productOfferingGroup/G1.json");
    assert_eq!(entry_ids(&doc), ["S0", "S1", "S2"]);
    assert_eq!(doc.entries()[0].display_name(), Some("Zero"));

    let original = read_archive(&input).unwrap();
    assert_eq!(out.names(), original.names());
    for name in original.names().iter().filter(|n| !n.ends_with("G1.json")) {
        assert_eq!(out.get(name), original.get(name), "{name} should be untouched");
    }

    assert_eq!(
        kinds(&result),
        [IssueKind::AlreadyExists, IssueKind::NotFoundJsonId]
    );
    let details = result.details.as_ref().unwrap();
    assert_eq!(details.skipped_existing.len(), 1);
    assert_eq!(details.skipped_existing[0].entry_id, "S2");
    assert_eq!(details.skipped_existing[0].reason, SkipReason::AlreadyExistsInGroup);
}

#[test]
fn adding_twice_changes_nothing_the_second_time() {
    let table = "Addons ID,Имя услуги,ID услуги\nG1,New,S7\nG2,Other,S8\n".as_bytes().to_vec();
    let first = exec(OperationRequest::AddEntries {
        target: AddTarget::Services,
        archive: sample_archive(),
        table: table.clone(),
    });
    assert_eq!(first.count("files_processed"), 2);

    let second = exec(OperationRequest::AddEntries {
        target: AddTarget::Services,
        archive: first.archive.clone().unwrap(),
        table,
    });
    assert!(second.ok);
    assert_eq!(second.msg, "no changes");
    assert!(second.archive.is_none());
    assert_eq!(second.count("files_processed"), 0);
    assert_eq!(second.issues_of(IssueKind::AlreadyExists).count(), 2);
}

#[test]
fn purpose_mismatch_leaves_document_untouched() {
    let input = sample_archive();
    let result = exec(OperationRequest::AddEntries {
        target: AddTarget::Services,
        archive: input,
        table: "Addons ID,Имя услуги,ID услуги\nT1,x,S1\n".as_bytes().to_vec(),
    });

    assert!(result.ok);
    assert!(result.archive.is_none());
    let mismatches: Vec<_> = result.issues_of(IssueKind::InvalidTargetType).collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].file_path.as_deref(), Some("productOfferingGroup/T1.json"));
    assert_eq!(mismatches[0].context["purpose"], serde_json::json!(["replaceOffer"]));
    assert_eq!(result.issues_of(IssueKind::NotFoundJsonId).count(), 0);
}

#[test]
fn add_offer_to_transitions() {
    let input = zip_of(&[
        ("productOfferingGroup/T1.json", bundle_json("T1", "replaceOffer", &[("O1", false)])),
        ("productOfferingGroup/T2.json", bundle_json("T2", "replaceOffer", &[("O9", false)])),
        ("productOfferingGroup/G1.json", bundle_json("G1", "addOn", &[])),
    ]);
    let result = exec(OperationRequest::AddEntries {
        target: AddTarget::Transitions { offer_id: " O9 ".into() },
        archive: input,
        table: b"json_id\nT1\nT2\nT1\nG1\nT5\n".to_vec(),
    });

    assert!(result.ok);
    assert_eq!(result.count("added"), 1);
    assert_eq!(result.count("skipped_existing"), 1);
    let out = output(&result);
    assert_eq!(entry_ids(&group(&out, "productOfferingGroup/T1.json")), ["O1", "O9"]);
    assert!(group(&out, "productOfferingGroup/T1.json").entries()[1].display_name().is_none());

    assert_eq!(
        kinds(&result),
        [
            IssueKind::DuplicateInSource,
            IssueKind::AlreadyExists,
            IssueKind::InvalidTargetType,
            IssueKind::NotFoundJsonId
        ]
    );
}

#[test]
fn blank_offer_id_parameter_is_fatal() {
    let result = exec(OperationRequest::AddEntries {
        target: AddTarget::Transitions { offer_id: "nan".into() },
        archive: sample_archive(),
        table: b"json_id\nT1\n".to_vec(),
    });
    assert!(!result.ok);
    assert_eq!(kinds(&result), [IssueKind::EmptyId]);
}

// -------------------------------------------------------------------------
// Expire
// -------------------------------------------------------------------------

#[test]
fn expire_unknown_document_reports_not_found() {
    let result = exec(OperationRequest::ExpireEntries {
        kind: BundleKind::Service,
        archive: sample_archive(),
        table: b"json_id,service_id\nG9,S1\n".to_vec(),
    });

    assert!(result.ok);
    assert_eq!(result.msg, "no changes");
    assert!(result.archive.is_none());
    assert_eq!(result.count("files_processed"), 0);
    assert_eq!(kinds(&result), [IssueKind::NotFoundJsonId]);
    assert_eq!(result.issues[0].severity, Severity::Error);
    assert_eq!(result.issues[0].context["json_id"], "G9");
}

#[test]
fn expire_flips_flags_and_reports_each_outcome() {
    let table = "json_id;service_id\nG1;S2\nG2;S3\nG2;S4\n;S1\n";
    let result = exec(OperationRequest::ExpireEntries {
        kind: BundleKind::Service,
        archive: sample_archive(),
        table: table.as_bytes().to_vec(),
    });

    assert!(result.ok);
    assert_eq!(result.count("valid_rows"), 3);
    assert_eq!(result.count("expired"), 1);
    assert_eq!(result.count("already_expired"), 1);
    assert_eq!(result.count("not_found_entries"), 1);
    assert_eq!(result.count("files_processed"), 1);

    let out = output(&result);
    let doc = group(&out, "productOfferingGroup/G1.json");
    let flags: Vec<bool> = doc.entries().iter().map(|e| e.is_expired()).collect();
    assert_eq!(flags, [false, true]);

    let mut found = kinds(&result);
    found.sort();
    let mut expected = vec![IssueKind::EmptyId, IssueKind::AlreadyExpired, IssueKind::NotFoundServiceId];
    expected.sort();
    assert_eq!(found, expected);
}

#[test]
fn expire_transition_offers_use_offer_column() {
    let result = exec(OperationRequest::ExpireEntries {
        kind: BundleKind::Transition,
        archive: sample_archive(),
        table: b"json_id,offer_id\nT1,O1\nT1,O7\nG1,S1\n".to_vec(),
    });

    assert!(result.ok);
    let out = output(&result);
    assert!(group(&out, "productOfferingGroup/T1.json").entries()[0].is_expired());
    assert_eq!(result.issues_of(IssueKind::NotFoundOfferId).count(), 1);
    assert_eq!(result.issues_of(IssueKind::InvalidTargetType).count(), 1);
    // G1 is a service bundle and must stay byte-identical
    let original = read_archive(&sample_archive()).unwrap();
    assert_eq!(
        out.get("productOfferingGroup/G1.json"),
        original.get("productOfferingGroup/G1.json")
    );
}

#[test]
fn expire_requires_exact_columns() {
    let result = exec(OperationRequest::ExpireEntries {
        kind: BundleKind::Service,
        archive: sample_archive(),
        table: b"json_id,Service_ID\nG1,S1\n".to_vec(),
    });
    assert!(!result.ok);
    assert!(result.archive.is_none());
    assert_eq!(kinds(&result), [IssueKind::MissingField]);
    assert!(result.msg.contains("service_id"));
    assert!(result.msg.contains("Service_ID"));
}

// -------------------------------------------------------------------------
// Combined
// -------------------------------------------------------------------------

#[test]
fn combined_expire_and_add_across_all_bundles() {
    let expire = "ID услуги,Имя услуги\nS1,One\nS3,Three\nS99,Ghost\nS5,Five\n";
    let add = "ID услуги,Имя услуги\nS5,Five\nS2,Two\n,Blank\n";
    let result = exec(OperationRequest::CombinedExpireAdd {
        archive: sample_archive(),
        expire_table: expire.as_bytes().to_vec(),
        add_table: add.as_bytes().to_vec(),
    });

    assert!(result.ok, "{}", result.msg);
    assert_eq!(result.count("expire_valid_rows"), 4);
    assert_eq!(result.count("add_total_rows"), 3);
    assert_eq!(result.count("add_valid_rows"), 2);
    assert_eq!(result.count("services_expired"), 1);
    assert_eq!(result.count("services_added"), 3);
    assert_eq!(result.count("skipped_add_existing"), 1);
    assert_eq!(result.count("skipped_expire_not_found"), 1);
    assert_eq!(result.count("files_processed"), 2);

    let overlap: Vec<_> = result
        .issues_of(IssueKind::DuplicateInSource)
        .filter(|i| i.severity == Severity::Warning)
        .collect();
    assert_eq!(overlap.len(), 1);
    assert!(overlap[0].message.contains("S5"));

    let out = output(&result);
    let g1 = group(&out, "productOfferingGroup/G1.json");
    assert_eq!(entry_ids(&g1), ["S1", "S2", "S5"]);
    assert!(g1.entries()[0].is_expired());
    let g2 = group(&out, "productOfferingGroup/G2.json");
    assert_eq!(entry_ids(&g2), ["S2", "S3", "S5"]);

    // T1 is a transition bundle in the same directory
    assert_eq!(result.issues_of(IssueKind::InvalidTargetType).count(), 1);
    assert_eq!(result.issues_of(IssueKind::AlreadyExpired).count(), 1);

    let not_found: Vec<_> = result.issues_of(IssueKind::NotFoundServiceId).collect();
    assert_eq!(not_found.len(), 1);
    assert_eq!(not_found[0].severity, Severity::Info);
    assert_eq!(not_found[0].context["service_id"], "S99");

    let details = result.details.as_ref().unwrap();
    assert_eq!(details.skipped_expire_not_found[0].reason, SkipReason::NotFoundInAnyJson);
    assert_eq!(details.skipped_existing[0].reason, SkipReason::AlreadyExists);
    assert_eq!(details.skipped_existing[0].document_id.as_deref(), Some("G1"));
}

// -------------------------------------------------------------------------
// Categories
// -------------------------------------------------------------------------

#[test]
fn categories_are_replaced_deduplicated_and_sorted() {
    let result = exec(OperationRequest::GenerateCategories {
        table: fixture("categories.csv"),
    });

    assert!(result.ok, "{}", result.msg);
    assert_eq!(result.count("total_rows"), 5);
    assert_eq!(result.count("valid_rows"), 4);
    assert_eq!(result.count("created_jsons"), 2);
    assert_eq!(result.count("categories_total"), 3);

    let out = output(&result);
    assert_eq!(
        out.names(),
        ["productOfferingCategory/O1.json", "productOfferingCategory/O2.json"]
    );
    let doc: CategoryDocument = parse_document(out.get("productOfferingCategory/O1.json").unwrap()).unwrap();
    assert_eq!(doc.category, ["C1", "C2"]);
    let refs: Vec<&str> = doc.category_ref.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(refs, ["C1", "C2"]);

    assert_eq!(result.issues_of(IssueKind::DuplicateInSource).count(), 1);
    assert_eq!(result.issues_of(IssueKind::EmptyId).count(), 1);
}

// -------------------------------------------------------------------------
// Document fidelity
// -------------------------------------------------------------------------

#[test]
fn expire_never_creates_a_missing_entry_list() {
    let input = zip_of(&[
        ("productOfferingGroup/G1.json", r#"{"id": "G1", "purpose": ["addOn"]}"#.to_string()),
        (
            "productOfferingGroup/G2.json",
            r#"{"id": "G2", "purpose": ["addOn"], "productOfferingsInGroup": null}"#.to_string(),
        ),
    ]);
    let result = exec(OperationRequest::ExpireEntries {
        kind: BundleKind::Service,
        archive: input,
        table: b"json_id,service_id\nG1,S1\nG2,S1\n".to_vec(),
    });

    assert!(result.ok, "{}", result.msg);
    assert_eq!(result.msg, "no changes");
    assert!(result.archive.is_none());
    assert_eq!(result.count("files_processed"), 0);
    assert_eq!(kinds(&result), [IssueKind::NotFoundServiceId, IssueKind::NotFoundServiceId]);
}

#[test]
fn combined_leaves_unmatched_bundles_byte_identical() {
    let no_list = r#"{"id": "G1", "purpose": ["addOn"], "productOfferingsInGroup": null}"#.to_string();
    let untouched = bundle_json("G2", "addOn", &[("S1", false)]);
    let input = zip_of(&[
        ("productOfferingGroup/G1.json", no_list.clone()),
        ("productOfferingGroup/G2.json", untouched.clone()),
        ("productOfferingGroup/G3.json", bundle_json("G3", "addOn", &[("S5", false)])),
    ]);
    let result = exec(OperationRequest::CombinedExpireAdd {
        archive: input,
        expire_table: "ID услуги,Имя услуги\nS5,Five\n".as_bytes().to_vec(),
        add_table: "ID услуги,Имя услуги\n".as_bytes().to_vec(),
    });

    assert!(result.ok, "{}", result.msg);
    assert_eq!(result.count("files_processed"), 1);
    assert_eq!(result.count("services_expired"), 1);

    let out = output(&result);
    assert_eq!(out.get("productOfferingGroup/G1.json"), Some(no_list.as_bytes()));
    assert_eq!(out.get("productOfferingGroup/G2.json"), Some(untouched.as_bytes()));
    assert!(group(&out, "productOfferingGroup/G3.json").entries()[0].is_expired());
}

#[test]
fn rewrite_keeps_nulls_and_fields_it_does_not_model() {
    let original = r#"{"id": "G1", "purpose": ["addOn"], "effective": null, "description": null,
        "localizedName": [{"locale": "en-US", "value": null}], "policy": "legacy",
        "productOfferingsInGroup": [{"id": "S1", "name": null, "isBundle": false}]}"#;
    let result = exec(OperationRequest::AddEntries {
        target: AddTarget::Services,
        archive: zip_of(&[("productOfferingGroup/G1.json", original.to_string())]),
        table: "Addons ID,Имя услуги,ID услуги\nG1,Two,S2\n".as_bytes().to_vec(),
    });

    assert!(result.ok, "{}", result.msg);
    assert!(result.issues.is_empty(), "{:?}", kinds(&result));
    assert_eq!(result.count("added"), 1);

    let out = output(&result);
    let doc: Value = serde_json::from_slice(out.get("productOfferingGroup/G1.json").unwrap()).unwrap();
    let top = doc.as_object().unwrap();
    assert_eq!(top.get("effective"), Some(&Value::Null));
    assert_eq!(top.get("description"), Some(&Value::Null));
    assert_eq!(doc["localizedName"][0]["value"], Value::Null);
    assert_eq!(doc["policy"], "legacy");

    let entries = doc["productOfferingsInGroup"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], "S1");
    assert_eq!(entries[0].as_object().unwrap().get("name"), Some(&Value::Null));
    assert_eq!(entries[1]["id"], "S2");
    assert_eq!(entries[1]["name"][0]["value"], "Two");
}

// -------------------------------------------------------------------------
// Robustness
// -------------------------------------------------------------------------

#[test]
fn bad_documents_are_skipped_not_fatal() {
    let input = zip_of(&[
        ("productOfferingGroup/broken.json", "{\"id\": \"G1\",".to_string()),
        ("productOfferingGroup/anon.json", r#"{"purpose": ["addOn"]}"#.to_string()),
        ("productOfferingGroup/G2.json", bundle_json("G2", "addOn", &[])),
    ]);
    let result = exec(OperationRequest::AddEntries {
        target: AddTarget::Services,
        archive: input,
        table: "Addons ID,Имя услуги,ID услуги\nG2,x,S1\n".as_bytes().to_vec(),
    });

    assert!(result.ok);
    assert_eq!(result.count("files_processed"), 1);
    assert_eq!(kinds(&result), [IssueKind::InvalidJson, IssueKind::EmptyId]);
    assert_eq!(result.issues[0].file_path.as_deref(), Some("productOfferingGroup/broken.json"));
    assert!(result.issues[0].context.contains_key("error"));
    assert_eq!(result.issues[1].file_path.as_deref(), Some("productOfferingGroup/anon.json"));
}

#[test]
fn unreadable_archive_is_fatal() {
    let result = exec(OperationRequest::ExpireEntries {
        kind: BundleKind::Service,
        archive: b"PK not really".to_vec(),
        table: b"json_id,service_id\nG1,S1\n".to_vec(),
    });
    assert!(!result.ok);
    assert_eq!(kinds(&result), [IssueKind::InvalidArchive]);
}

#[test]
fn unreadable_table_is_fatal() {
    let result = exec(OperationRequest::GenerateCategories { table: Vec::new() });
    assert!(!result.ok);
    assert_eq!(kinds(&result), [IssueKind::InvalidJson]);
}

#[test]
fn identical_inputs_give_identical_archives() {
    let request = OperationRequest::AddEntries {
        target: AddTarget::Services,
        archive: sample_archive(),
        table: "Addons ID,Имя услуги,ID услуги\nG1,x,S0\nG2,y,S9\n".as_bytes().to_vec(),
    };
    let a = exec(request.clone());
    let b = exec(request);
    assert_eq!(a.archive, b.archive);
    assert_eq!(a.issues, b.issues);
}

#[test]
fn configured_directories_and_locale_are_used() {
    let config = EngineConfig::from_toml("locale = \"ru-RU\"\ngroup_dir = \"pog\"\n").unwrap();
    let result = run(
        &config,
        &OperationRequest::CreateBundle {
            target: CreateTarget::Services,
            table: "Addons name,Addons ID,Имя услуги,ID услуги\nПакет,G1,Услуга,S1\n".as_bytes().to_vec(),
        },
    );
    let out = output(&result);
    let doc = group(&out, "pog/G1.json");
    assert_eq!(doc.field("localizedName").unwrap()[0]["locale"], "ru-RU");
    assert_eq!(doc.entries()[0].extra["name"][0]["locale"], "ru-RU");
}
