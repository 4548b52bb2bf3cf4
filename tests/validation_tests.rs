//! Document validation tests

use docbase_sdk::{json_to_base, Base};
use serde_json::json;

fn people_base() -> Base {
    json_to_base(
        r#"{
        "metadata": {"name": "people", "description": "registry of people"},
        "content": [
            {"field": {"name": "name", "datatype": "Text", "indices": ["Textual", "Unique"],
                       "multivalued": false, "required": true}},
            {"field": {"name": "age", "datatype": "Integer", "indices": ["Ordered"],
                       "multivalued": false, "required": true}},
            {"field": {"name": "email", "datatype": "Email", "indices": ["None"],
                       "multivalued": false, "required": false}},
            {"field": {"name": "photo", "datatype": "Image", "indices": ["None"],
                       "multivalued": false, "required": false}},
            {"group": {"metadata": {"name": "dependents", "multivalued": true},
                       "content": [
                {"field": {"name": "dep_name", "datatype": "Text", "indices": ["Textual"],
                           "multivalued": false, "required": true}},
                {"field": {"name": "dep_birth", "datatype": "Date", "indices": ["None"],
                           "multivalued": false, "required": false}}
            ]}}
        ]
    }"#,
    )
    .unwrap()
}

mod scalar_validation_tests {
    use super::*;

    #[test]
    fn test_integer_field_rejects_string() {
        let base = json_to_base(
            r#"{
            "metadata": {"name": "minimal", "description": ""},
            "content": [
                {"field": {"name": "age", "datatype": "Integer", "indices": ["None"],
                           "multivalued": false, "required": true}}
            ]
        }"#,
        )
        .unwrap();

        let err = base.validate(json!({"age": "thirty"})).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "age");

        let validated = base.validate(json!({"age": 30})).unwrap();
        assert_eq!(validated.document, json!({"age": 30}));
    }

    #[test]
    fn test_issues_are_aggregated_not_fail_fast() {
        let base = people_base();
        let err = base
            .validate(json!({
                "name": "Ana Silva",
                "age": "thirty",
                "email": "not-an-email"
            }))
            .unwrap_err();
        let mut paths: Vec<&str> = err.issues.iter().map(|i| i.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec!["age", "email"]);
    }

    #[test]
    fn test_missing_required_structure() {
        let base = people_base();
        let err = base.validate(json!({"age": 34})).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "name");
        assert!(err.issues[0].reason.contains("required"));
    }

    #[test]
    fn test_unknown_structure_reported_with_path() {
        let base = people_base();
        let err = base
            .validate(json!({"name": "Ana", "age": 34, "surname": "Silva"}))
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "surname");
        assert!(err.issues[0].reason.contains("unknown structure"));
    }

    #[test]
    fn test_nested_failure_paths_carry_sequence_indices() {
        let base = people_base();
        let err = base
            .validate(json!({
                "name": "Ana",
                "age": 34,
                "dependents": [
                    {"dep_name": "Bruno"},
                    {"dep_name": "Clara", "dep_birth": "15/01/2020"}
                ]
            }))
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "dependents/1/dep_birth");
    }

    #[test]
    fn test_multivalued_group_rejects_plain_mapping() {
        let base = people_base();
        let err = base
            .validate(json!({
                "name": "Ana",
                "age": 34,
                "dependents": {"dep_name": "Bruno"}
            }))
            .unwrap_err();
        assert_eq!(err.issues[0].path, "dependents");
        assert!(err.issues[0].reason.contains("expected a sequence"));
    }
}

mod side_data_tests {
    use super::*;

    #[test]
    fn test_relational_values_extracted() {
        let base = people_base();
        let validated = base
            .validate(json!({"name": "Ana Silva", "age": 34}))
            .unwrap();
        assert_eq!(validated.relational.len(), 2);
        assert_eq!(validated.relational["name"], json!("Ana Silva"));
        assert_eq!(validated.relational["age"], json!(34));
        assert!(validated.extensions.is_empty());
    }

    #[test]
    fn test_file_references_collected() {
        let base = people_base();
        let validated = base
            .validate(json!({
                "name": "Ana",
                "age": 34,
                "photo": {"filename": "ana.png", "url": "https://files/ana.png"}
            }))
            .unwrap();
        assert_eq!(validated.files.len(), 1);
        assert_eq!(validated.files[0].field, "photo");
        assert_eq!(validated.files[0].path, "photo");
        assert_eq!(
            validated.files[0].value,
            json!({"filename": "ana.png", "url": "https://files/ana.png"})
        );
    }

    #[test]
    fn test_failed_validation_yields_only_the_error() {
        let base = people_base();
        let err = base
            .validate(json!({
                "name": "Ana",
                "age": "thirty",
                "photo": "photo-123"
            }))
            .unwrap_err();
        assert!(!err.issues.is_empty());

        // a later run on the same base starts from a clean slate
        let validated = base
            .validate(json!({"name": "Ana", "age": 34}))
            .unwrap();
        assert!(validated.files.is_empty());
        assert_eq!(validated.relational.len(), 2);
    }

    #[test]
    fn test_metadata_is_stripped_and_reattached() {
        let base = people_base();
        let meta = json!({"id": "550e8400-e29b-41d4-a716-446655440000", "revision": 3});
        let validated = base
            .validate(json!({
                "name": "Ana",
                "age": 34,
                "_metadata": meta.clone()
            }))
            .unwrap();
        assert_eq!(validated.document["_metadata"], meta);
        // metadata is opaque: it never shows up as an unknown structure
        assert_eq!(validated.relational["name"], json!("Ana"));
    }
}

mod codec_registry_tests {
    use super::*;
    use docbase_sdk::{CodecRegistry, DataType, Field, ScalarRule};
    use uuid::Uuid;

    fn any_text(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
        ScalarRule::new(|_| Ok(()))
    }

    #[test]
    fn test_swapped_codec_changes_validation() {
        let base = people_base();
        let document = json!({"name": "Ana", "age": 34, "email": "not-an-email"});

        assert!(base.validate(document.clone()).is_err());

        let mut registry = CodecRegistry::standard();
        registry.register(DataType::Email, any_text);
        assert!(base.validate_with(&registry, document).is_ok());
    }
}

mod storage_tests {
    use super::*;
    use docbase_sdk::{DocumentStore, DocumentSubmission, MemoryStore};

    #[test]
    fn test_validated_document_reaches_the_store() {
        let base = people_base();
        let validated = base
            .validate(json!({"name": "Ana", "age": 34}))
            .unwrap();

        let store = MemoryStore::new();
        let submission = DocumentSubmission::new(None, validated);
        let id = store.store(base.name(), submission).unwrap();
        assert_eq!(store.len(), 1);

        let fetched = store.fetch(base.name(), id).unwrap().unwrap();
        assert_eq!(fetched["name"], json!("Ana"));
        store.delete(base.name(), id).unwrap();
        assert!(store.is_empty());
        assert!(store.fetch(base.name(), id).unwrap().is_none());
    }

    #[test]
    fn test_submission_id_is_deterministic_for_same_content() {
        let base = people_base();
        let doc = json!({"name": "Ana", "age": 34});
        let a = DocumentSubmission::new(None, base.validate(doc.clone()).unwrap());
        let b = DocumentSubmission::new(None, base.validate(doc).unwrap());
        assert_eq!(a.id, b.id);
    }
}
