//! Tests for stream definitions, graph and instance sync

use super::*;
use crate::config::TapConfig;
use crate::context::RunContext;
use crate::error::Error;
use crate::pagination::PaginationConfig;
use crate::partition::Partition;
use crate::schema::{Field, FieldValue};
use crate::state::StateManager;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENT_FIELDS: &[Field] = &[Field::string("id"), Field::string("updated_at")];

fn context(server: &MockServer, state: StateManager) -> RunContext {
    let config = TapConfig::from_value(json!({
        "api_key": "test-key",
        "country_code": "AU",
        "api_base_url": server.uri(),
        "rate_limit_delay_ms": 0,
        "max_retries": 0
    }))
    .unwrap();
    RunContext::new(config, state).unwrap()
}

fn faethm_graph() -> StreamGraph {
    StreamGraph::new(faethm_streams()).unwrap()
}

fn events_stream() -> StreamDefinition {
    StreamDefinition::new("events", "/events", EVENT_FIELDS, &["id"])
        .incremental("updated_at", Some("since"))
}

async fn drain(sync: &mut StreamSync) -> Vec<crate::schema::OutputRecord> {
    let mut records = Vec::new();
    while let Some(batch) = sync.next_batch().await.unwrap() {
        records.extend(batch);
    }
    records
}

// ============================================================================
// Graph Tests
// ============================================================================

#[test]
fn test_faethm_graph_shape() {
    let graph = faethm_graph();

    assert_eq!(
        graph.names(),
        vec![
            INDUSTRIES,
            EMERGING_SKILLS,
            TRENDING_SKILLS,
            DECLINING_SKILLS,
            SKILLS_LIST
        ]
    );

    let roots: Vec<_> = graph.roots().map(|s| s.name.as_str()).collect();
    assert_eq!(roots, vec![INDUSTRIES, SKILLS_LIST]);

    let children: Vec<_> = graph
        .children(INDUSTRIES)
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(children, vec![EMERGING_SKILLS, TRENDING_SKILLS, DECLINING_SKILLS]);
    assert!(graph.children(SKILLS_LIST).is_empty());

    let ancestors: Vec<_> = graph
        .ancestors(TRENDING_SKILLS)
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(ancestors, vec![INDUSTRIES]);
    assert!(graph.ancestors(INDUSTRIES).is_empty());
}

#[test]
fn test_faethm_definitions() {
    let graph = faethm_graph();

    let emerging = graph.get(EMERGING_SKILLS).unwrap();
    assert_eq!(emerging.endpoint, "/industries/{industry_id}/skills/emerging");
    assert_eq!(emerging.primary_key, &["id", "industry_id", "category"]);
    assert_eq!(emerging.pagination, PaginationConfig::cursor());
    assert_eq!(
        emerging.parent.as_ref().map(|p| p.stream.as_str()),
        Some(INDUSTRIES)
    );

    let skills = graph.get(SKILLS_LIST).unwrap();
    assert_eq!(skills.records_path, "$.skills[*]");
    assert_eq!(skills.pagination, PaginationConfig::last_record());

    assert!(graph
        .iter()
        .all(|s| s.replication == Replication::FullTable));
}

#[test]
fn test_graph_rejects_duplicate_names() {
    let err = StreamGraph::new(vec![events_stream(), events_stream()]).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_graph_rejects_unknown_parent() {
    let child = StreamDefinition::new("child", "/p/{pid}/c", EVENT_FIELDS, &["id"])
        .child_of("missing", "id", "pid");
    assert!(StreamGraph::new(vec![child]).is_err());
}

#[test]
fn test_graph_rejects_cycles() {
    let a = StreamDefinition::new("a", "/b/{b_id}/a", EVENT_FIELDS, &["id"]).child_of("b", "id", "b_id");
    let b = StreamDefinition::new("b", "/a/{a_id}/b", EVENT_FIELDS, &["id"]).child_of("a", "id", "a_id");
    let err = StreamGraph::new(vec![a, b]).unwrap_err();
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn test_graph_rejects_key_outside_schema() {
    let def = StreamDefinition::new("events", "/events", EVENT_FIELDS, &["uuid"]);
    assert!(StreamGraph::new(vec![def]).is_err());

    let def = StreamDefinition::new("events", "/events", EVENT_FIELDS, &["id"])
        .incremental("modified", None);
    assert!(StreamGraph::new(vec![def]).is_err());
}

#[test]
fn test_graph_rejects_placeholder_mismatch() {
    let root_with_placeholder =
        StreamDefinition::new("events", "/events/{event_id}", EVENT_FIELDS, &["id"]);
    assert!(StreamGraph::new(vec![root_with_placeholder]).is_err());

    let parent = StreamDefinition::new("parents", "/parents", EVENT_FIELDS, &["id"]);
    let wrong = StreamDefinition::new("kids", "/parents/{other}/kids", EVENT_FIELDS, &["id"])
        .child_of("parents", "id", "parent_id");
    assert!(StreamGraph::new(vec![parent.clone(), wrong]).is_err());

    let two = StreamDefinition::new("kids", "/p/{parent_id}/k/{parent_id}", EVENT_FIELDS, &["id"])
        .child_of("parents", "id", "parent_id");
    assert!(StreamGraph::new(vec![parent, two]).is_err());
}

// ============================================================================
// Definition Tests
// ============================================================================

#[test]
fn test_skill_enrichments() {
    let graph = faethm_graph();
    let trending = graph.get(TRENDING_SKILLS).unwrap();

    let mut raw = json!({"id": "s1", "name": "Rust"});
    trending.apply_enrichments(&mut raw, "AU", Some("7"), 3);

    assert_eq!(
        raw,
        json!({
            "id": "s1",
            "name": "Rust",
            "industry_id": "7",
            "category": "trending",
            "rank": 3,
            "country_code": "AU"
        })
    );
}

#[test]
fn test_mapper_pins_parent_field() {
    let graph = faethm_graph();
    let emerging = graph.get(EMERGING_SKILLS).unwrap();
    let selected: HashSet<String> = ["rank".to_string()].into_iter().collect();

    let record = emerging
        .mapper()
        .with_selection(Some(selected))
        .map(
            &json!({"id": "s1", "industry_id": "1", "category": "emerging", "rank": 1, "name": "x"}),
            Some("1"),
        )
        .unwrap();

    let names: Vec<_> = record.field_names().collect();
    assert_eq!(names, vec!["id", "rank", "category", "industry_id"]);
}

// ============================================================================
// StreamSync Tests
// ============================================================================

#[tokio::test]
async fn test_industries_sync_enriches_country_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/industries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "name": "Tech"},
            {"id": "2", "name": "Health"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, StateManager::in_memory());
    let graph = faethm_graph();
    let mut sync = StreamSync::start(&ctx, Arc::clone(graph.get(INDUSTRIES).unwrap()), None, None)
        .await
        .unwrap();

    let records = drain(&mut sync).await;
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].to_json(),
        json!({"id": "1", "name": "Tech", "country_code": "AU"})
    );
    assert_eq!(records[1].get("name"), Some(&FieldValue::String("Health".into())));
    assert_eq!(sync.stats().pages, 1);
    assert_eq!(sync.stats().records, 2);
}

#[tokio::test]
async fn test_child_sync_follows_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/industries/1/skills/emerging"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "s1", "name": "Prompting", "description": "d"}],
            "next_cursor": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/industries/1/skills/emerging"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server, StateManager::in_memory());
    let graph = faethm_graph();
    let partition = Partition::new("1").with_value("industry_id", "1");
    let mut sync = StreamSync::start(
        &ctx,
        Arc::clone(graph.get(EMERGING_SKILLS).unwrap()),
        Some(partition),
        None,
    )
    .await
    .unwrap();

    let records = drain(&mut sync).await;
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].to_json(),
        json!({
            "id": "s1",
            "name": "Prompting",
            "description": "d",
            "rank": 1,
            "category": "emerging",
            "industry_id": "1",
            "country_code": "AU"
        })
    );
    assert_eq!(records[0].parent_id.as_deref(), Some("1"));
    assert_eq!(sync.stats().pages, 2);
}

#[tokio::test]
async fn test_sync_drops_mismatched_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/industries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "name": "Tech"},
            {"id": null, "name": "No key"},
            {"id": "3", "name": {"nested": true}},
            {"id": "4", "name": "Retail"}
        ])))
        .mount(&server)
        .await;

    let ctx = context(&server, StateManager::in_memory());
    let graph = faethm_graph();
    let mut sync = StreamSync::start(&ctx, Arc::clone(graph.get(INDUSTRIES).unwrap()), None, None)
        .await
        .unwrap();

    let ids: Vec<_> = drain(&mut sync)
        .await
        .iter()
        .map(|r| r.get("id").and_then(FieldValue::as_key))
        .collect();
    assert_eq!(ids, vec![Some("1".to_string()), Some("4".to_string())]);
    assert_eq!(sync.stats().dropped, 2);
}

#[tokio::test]
async fn test_sync_propagates_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/industries/2/skills/emerging"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let ctx = context(&server, StateManager::in_memory());
    let graph = faethm_graph();
    let mut sync = StreamSync::start(
        &ctx,
        Arc::clone(graph.get(EMERGING_SKILLS).unwrap()),
        Some(Partition::new("2").with_value("industry_id", "2")),
        None,
    )
    .await
    .unwrap();

    let err = sync.next_batch().await.unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_incremental_filters_and_advances_bookmark() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .and(query_param("since", "2024-01-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "updated_at": "2024-01-01"},
            {"id": "b", "updated_at": "2024-01-03"},
            {"id": "c", "updated_at": "2024-01-02"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let state = StateManager::from_json(r#"{"streams": {"events": {"cursor": "2024-01-02"}}}"#)
        .unwrap();
    let ctx = context(&server, state.clone());
    let mut sync = StreamSync::start(&ctx, Arc::new(events_stream()), None, None)
        .await
        .unwrap();

    let batch = sync.next_batch().await.unwrap().unwrap();
    let ids: Vec<_> = batch
        .iter()
        .map(|r| r.get("id").and_then(FieldValue::as_key))
        .collect();
    assert_eq!(ids, vec![Some("b".to_string()), Some("c".to_string())]);
    assert_eq!(sync.stats().filtered, 1);

    // Not committed until the batch has been consumed
    assert_eq!(state.get_cursor("events").await, Some("2024-01-02".to_string()));

    assert!(sync.next_batch().await.unwrap().is_none());
    assert_eq!(state.get_cursor("events").await, Some("2024-01-03".to_string()));
}

#[tokio::test]
async fn test_incremental_bookmark_never_decreases() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "updated_at": "2024-03-01"}
        ])))
        .mount(&server)
        .await;

    let def = StreamDefinition::new("events", "/events", EVENT_FIELDS, &["id"])
        .incremental("updated_at", None);
    let state = StateManager::from_json(r#"{"streams": {"events": {"cursor": "2024-01-01"}}}"#)
        .unwrap();
    let ctx = context(&server, state.clone());
    let mut sync = StreamSync::start(&ctx, Arc::new(def), None, None).await.unwrap();
    drain(&mut sync).await;
    assert_eq!(state.get_cursor("events").await, Some("2024-03-01".to_string()));

    // Externally moved ahead; a rerun yielding older data must not rewind it
    state.set_cursor("events", "2024-06-01".to_string()).await;
    let def = StreamDefinition::new("events", "/events", EVENT_FIELDS, &["id"])
        .incremental("updated_at", None);
    let mut sync = StreamSync::start(&ctx, Arc::new(def), None, None).await.unwrap();
    let records = drain(&mut sync).await;
    assert!(records.is_empty());
    assert_eq!(state.get_cursor("events").await, Some("2024-06-01".to_string()));
}

#[tokio::test]
async fn test_incremental_child_bookmarks_are_scoped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/parents/p1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "updated_at": "5"},
            {"id": "b", "updated_at": "12"}
        ])))
        .mount(&server)
        .await;

    let def = StreamDefinition::new("events", "/parents/{parent_id}/events", EVENT_FIELDS, &["id"])
        .child_of("parents", "id", "parent_id")
        .incremental("updated_at", None);
    let state = StateManager::in_memory();
    let ctx = context(&server, state.clone());
    let mut sync = StreamSync::start(
        &ctx,
        Arc::new(def),
        Some(Partition::new("p1").with_value("parent_id", "p1")),
        None,
    )
    .await
    .unwrap();

    let mut batch = sync.next_batch().await.unwrap().unwrap();
    assert_eq!(batch.len(), 2);
    batch.clear();
    sync.commit().await;

    assert_eq!(
        state.get_scoped_cursor("events", Some("p1")).await,
        Some("12".to_string())
    );
    assert_eq!(state.get_cursor("events").await, None);
}
