mod common;

use std::sync::Arc;

use luogu_common::diagnostics::{NoopDiagnostics, RecordingDiagnostics};
use luogu_config::ExtractorConfig;
use luogu_extract::{
    AuthorInfo, ExtractedValue, RawResponse, ResponseClassifier, ResponseKind, normalize_author,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::Level;

const PARTITIONED: &str = include_str!("fixtures/judgement_partitioned.html");
const EMPTY: &str = include_str!("fixtures/judgement_empty.html");
const ARTICLE: &str = include_str!("fixtures/article.html");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JudgementEntry {
    reason: String,
    revoked_permission: u32,
    time: i64,
}

fn classifier() -> ResponseClassifier {
    common::init_test_tracing();
    ResponseClassifier::new(ExtractorConfig::default())
}

#[test]
fn partitioned_page_yields_state_logs() {
    let logs = classifier()
        .normalize(&RawResponse::sniff(PARTITIONED), ResponseKind::JudgementLog)
        .expect("partitioned page normalizes")
        .into_logs()
        .expect("judgement log variant");

    assert_eq!(logs.len(), 2);
    let entries: Vec<JudgementEntry> = logs.entries().expect("typed entries");
    assert_eq!(entries[0].reason, "spam");
    assert_eq!(entries[1].revoked_permission, 4);
    assert!(entries[0].time < entries[1].time);

    let authors: Vec<AuthorInfo> = logs
        .logs()
        .iter()
        .map(|entry| normalize_author(Some(entry)))
        .collect();
    assert_eq!(authors[0].uid, Some(114514));
    assert_eq!(authors[1].uid, Some(1919));
    assert_eq!(authors[1].color, Some(json!("Blue")));
}

#[test]
fn page_without_logs_degrades_to_empty_collection() {
    let sink = Arc::new(RecordingDiagnostics::new());
    let classifier = ResponseClassifier::with_diagnostics(ExtractorConfig::default(), sink.clone());

    let value = classifier
        .normalize(&RawResponse::from_text(EMPTY), ResponseKind::JudgementLog)
        .expect("soft degrade, not an error");

    assert_eq!(value.into_value(), Some(json!({ "logs": [] })));
    assert!(sink.contains(Level::DEBUG, "failed to decode"));
    assert!(sink.contains(Level::DEBUG, "hydration root"));
}

#[test]
fn outcomes_do_not_depend_on_the_sink() {
    let quiet = ResponseClassifier::with_diagnostics(
        ExtractorConfig::default(),
        Arc::new(NoopDiagnostics),
    );
    let loud = classifier();

    for body in [PARTITIONED, EMPTY, ARTICLE, "not json", r#"{"result":{"logs":[1]}}"#] {
        let response = RawResponse::sniff(body);
        let a = quiet.normalize(&response, ResponseKind::JudgementLog);
        let b = loud.normalize(&response, ResponseKind::JudgementLog);
        match (a, b) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            (a, b) => panic!("sinks disagreed: {a:?} vs {b:?}"),
        }
    }
}

#[test]
fn article_page_and_its_author() {
    let article = classifier()
        .normalize(&RawResponse::sniff(ARTICLE), ResponseKind::Article)
        .expect("article page normalizes");

    let ExtractedValue::Article(Some(article)) = article else {
        panic!("expected an article record");
    };
    assert_eq!(article["lid"], json!("a1b2c3"));
    assert_eq!(article["content"], json!("# A+B\n"));

    assert_eq!(
        normalize_author(Some(&article)),
        AuthorInfo {
            uid: Some(42),
            name: Some("A".to_string()),
            color: Some(json!("red")),
        }
    );
}

#[test]
fn json_string_body_is_redispatched() {
    let inner = json!({ "currentData": { "logs": [{ "id": 1 }], "perPage": 20 } });
    let body = Value::String(inner.to_string()).to_string();

    // the body is a JSON string literal, so sniffing yields a string payload
    let response = RawResponse::sniff(&body);
    assert!(response.data.is_string());

    let value = classifier()
        .normalize(&response, ResponseKind::JudgementLog)
        .unwrap()
        .into_value();
    assert_eq!(value, Some(json!({ "logs": [{ "id": 1 }], "perPage": 20 })));
}

#[test]
fn legacy_codes_select_the_same_strategy() {
    let kind: ResponseKind = "3".parse().unwrap();
    let response = RawResponse::from_json(json!({ "logs": [] }));
    assert!(classifier().normalize(&response, kind).is_ok());
}
