//! Tests for partition module

use super::*;
use crate::error::Error;
use crate::schema::{FieldValue, OutputRecord};
use crate::template;
use serde_json::json;

fn industry(id: FieldValue) -> OutputRecord {
    OutputRecord {
        stream: "industries".to_string(),
        parent_id: None,
        fields: vec![("id", id), ("name", FieldValue::String("Tech".into()))],
    }
}

#[test]
fn test_partition_builder() {
    let partition = Partition::new("7").with_value("industry_id", "7");
    assert_eq!(partition.id, "7");
    assert_eq!(partition.get("industry_id"), Some(&json!("7")));
    assert_eq!(partition.get("missing"), None);
}

#[test]
fn test_parent_router_binds_id() {
    let router = ParentRouter::new("emerging_skills", "id", "industry_id");
    let partition = router
        .partition_for(&industry(FieldValue::String("1".into())))
        .unwrap();

    assert_eq!(partition.id, "1");
    assert_eq!(partition.get("industry_id"), Some(&json!("1")));
    assert_eq!(router.partition_field(), "industry_id");

    let path = template::render(
        "/industries/{industry_id}/skills/emerging",
        &partition.template_context(),
    )
    .unwrap();
    assert_eq!(path, "/industries/1/skills/emerging");
}

#[test]
fn test_parent_router_integer_id() {
    let router = ParentRouter::new("emerging_skills", "id", "industry_id");
    let partition = router.partition_for(&industry(FieldValue::Integer(42))).unwrap();
    assert_eq!(partition.id, "42");
}

#[test]
fn test_parent_router_missing_key() {
    let router = ParentRouter::new("emerging_skills", "id", "industry_id");
    let err = router.partition_for(&industry(FieldValue::Null)).unwrap_err();
    assert!(matches!(err, Error::Partition { ref stream, .. } if stream == "emerging_skills"));

    let router = ParentRouter::new("emerging_skills", "code", "industry_id");
    assert!(router
        .partition_for(&industry(FieldValue::String("1".into())))
        .is_err());
}
