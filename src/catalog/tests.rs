//! Tests for catalog discovery and selection

use super::*;
use crate::error::Error;
use crate::streams::{
    faethm_streams, StreamGraph, DECLINING_SKILLS, EMERGING_SKILLS, INDUSTRIES, SKILLS_LIST,
    TRENDING_SKILLS,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn graph() -> StreamGraph {
    StreamGraph::new(faethm_streams()).unwrap()
}

fn set_selected(catalog: &mut Catalog, stream: &str, field: Option<&str>, selected: bool) {
    let entry = catalog
        .streams
        .iter_mut()
        .find(|e| e.tap_stream_id == stream)
        .unwrap();
    let meta = entry
        .metadata
        .iter_mut()
        .find(|m| match field {
            None => m.is_stream_level(),
            Some(f) => m.field() == Some(f),
        })
        .unwrap();
    meta.metadata.insert("selected".to_string(), json!(selected));
}

fn deselect_all(catalog: &mut Catalog) {
    let names: Vec<String> = catalog.streams.iter().map(|e| e.tap_stream_id.clone()).collect();
    for name in names {
        set_selected(catalog, &name, None, false);
    }
}

// ============================================================================
// Discovery Tests
// ============================================================================

#[test]
fn test_discover_lists_every_stream() {
    let catalog = discover(&graph());
    let ids: Vec<_> = catalog.streams.iter().map(|e| e.tap_stream_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![INDUSTRIES, EMERGING_SKILLS, TRENDING_SKILLS, DECLINING_SKILLS, SKILLS_LIST]
    );
}

#[test]
fn test_discover_industries_entry() {
    let catalog = discover(&graph());
    let entry = catalog.get(INDUSTRIES).unwrap();

    assert_eq!(entry.stream, INDUSTRIES);
    assert_eq!(entry.key_properties, vec!["id"]);
    assert_eq!(entry.schema["type"], "object");
    assert_eq!(
        entry.schema["properties"]["name"]["type"],
        json!(["string", "null"])
    );

    let stream_meta = entry.stream_metadata().unwrap();
    assert_eq!(stream_meta.text("forced-replication-method"), Some("FULL_TABLE"));
    assert_eq!(
        stream_meta.metadata["table-key-properties"],
        json!(["id"])
    );
    assert!(stream_meta.metadata.get("parent-tap-stream-id").is_none());
}

#[test]
fn test_discover_child_entry_names_parent() {
    let catalog = discover(&graph());
    let entry = catalog.get(EMERGING_SKILLS).unwrap();

    assert_eq!(entry.key_properties, vec!["id", "industry_id", "category"]);
    assert_eq!(
        entry.stream_metadata().unwrap().text("parent-tap-stream-id"),
        Some(INDUSTRIES)
    );
}

#[test_case(INDUSTRIES, "id", "automatic")]
#[test_case(INDUSTRIES, "name", "available")]
#[test_case(EMERGING_SKILLS, "industry_id", "automatic")]
#[test_case(EMERGING_SKILLS, "category", "automatic")]
#[test_case(EMERGING_SKILLS, "rank", "available")]
#[test_case(SKILLS_LIST, "description", "available")]
fn test_field_inclusion(stream: &str, field: &str, inclusion: &str) {
    let catalog = discover(&graph());
    let meta = catalog.get(stream).unwrap().field_metadata(field).unwrap();
    assert_eq!(meta.text("inclusion"), Some(inclusion));
}

#[test]
fn test_catalog_json_round_trip() {
    let catalog = discover(&graph());
    let text = serde_json::to_string(&catalog.to_json()).unwrap();
    assert_eq!(Catalog::from_json_str(&text).unwrap(), catalog);
}

#[test]
fn test_invalid_catalog_is_config_error() {
    let err = Catalog::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_discovered_catalog_selects_everything() {
    let graph = graph();
    let selection = Selection::from_catalog(&discover(&graph), &graph);
    assert_eq!(selection, Selection::all(&graph));
    assert_eq!(selection.fields(INDUSTRIES), None);
}

#[test]
fn test_stream_selection_from_metadata() {
    let graph = graph();
    let mut catalog = discover(&graph);
    deselect_all(&mut catalog);
    set_selected(&mut catalog, TRENDING_SKILLS, None, true);

    let selection = Selection::from_catalog(&catalog, &graph);
    assert_eq!(selection.selected().into_iter().collect::<Vec<_>>(), vec![TRENDING_SKILLS]);
    assert!(!selection.is_selected(INDUSTRIES));

    let active = selection.active(&graph);
    assert!(active.contains(INDUSTRIES));
    assert!(active.contains(TRENDING_SKILLS));
    assert!(!active.contains(SKILLS_LIST));
}

#[test]
fn test_deselected_field_is_dropped() {
    let graph = graph();
    let mut catalog = discover(&graph);
    set_selected(&mut catalog, SKILLS_LIST, Some("description"), false);

    let selection = Selection::from_catalog(&catalog, &graph);
    let fields = selection.fields(SKILLS_LIST).unwrap();
    assert!(fields.contains("id"));
    assert!(fields.contains("name"));
    assert!(!fields.contains("description"));
}

#[test]
fn test_automatic_field_cannot_be_deselected() {
    let graph = graph();
    let mut catalog = discover(&graph);
    set_selected(&mut catalog, INDUSTRIES, Some("id"), false);

    let selection = Selection::from_catalog(&catalog, &graph);
    assert_eq!(selection.fields(INDUSTRIES), None);
}

#[test]
fn test_missing_selected_flag_falls_back_to_default() {
    let graph = graph();
    let catalog: Catalog = serde_json::from_value(json!({
        "streams": [
            {"tap_stream_id": "industries", "metadata": [
                {"breadcrumb": [], "metadata": {"selected-by-default": true}}
            ]},
            {"tap_stream_id": "skills_list", "metadata": []},
            {"tap_stream_id": "unknown_stream", "metadata": [
                {"breadcrumb": [], "metadata": {"selected": true}}
            ]}
        ]
    }))
    .unwrap();

    let selection = Selection::from_catalog(&catalog, &graph);
    assert!(selection.is_selected(INDUSTRIES));
    assert!(!selection.is_selected(SKILLS_LIST));
    assert!(!selection.is_selected("unknown_stream"));
}

#[test]
fn test_restrict_to_named_streams() {
    let graph = graph();
    let selection = Selection::all(&graph)
        .restrict(&[SKILLS_LIST.to_string()], &graph)
        .unwrap();
    assert!(selection.is_selected(SKILLS_LIST));
    assert!(!selection.is_selected(INDUSTRIES));
}

#[test]
fn test_restrict_unknown_stream_fails() {
    let graph = graph();
    let err = Selection::all(&graph)
        .restrict(&["jobs".to_string()], &graph)
        .unwrap_err();
    assert!(matches!(err, Error::StreamNotFound { ref stream } if stream == "jobs"));
}
