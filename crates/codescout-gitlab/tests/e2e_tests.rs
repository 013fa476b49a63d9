//! End-to-end inventory resolution and search against a mock GitLab

use codescout_core::service::{DefaultSearchService, ResultPage, ResultQuery, SearchRequest, SearchService};
use codescout_core::storage::SqliteStorage;
use codescout_core::{Credential, Error, RunStatus, Settings, Throttle};
use codescout_gitlab::{GitlabClient, TOKEN_HEADER};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "glpat-e2e";

fn project_json(id: u64, group_id: u64, group_path: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("project-{}", id),
        "path_with_namespace": format!("{}/project-{}", group_path, id),
        "web_url": format!("https://gitlab.example.com/{}/project-{}", group_path, id),
        "namespace": { "id": group_id, "full_path": group_path }
    })
}

fn hit_json(path: &str, startline: u64) -> serde_json::Value {
    json!({
        "path": path,
        "ref": "main",
        "data": "let needle = 1;\nlet other = 2;\n",
        "startline": startline
    })
}

async fn mount_gitlab(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v4/groups"))
        .and(header(TOKEN_HEADER, TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "full_path": "platform" },
            { "id": 2, "full_path": "web" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            project_json(10, 1, "platform"),
            project_json(11, 1, "platform")
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/2/projects"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([project_json(20, 2, "web")])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/10/search"))
        .and(query_param("search", "needle"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([hit_json("src/a.rs", 4), hit_json("docs/a.md", 1)])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/11/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/20/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([hit_json("src/b.rs", 9)])))
        .mount(server)
        .await;
}

async fn service(
    server: &MockServer,
    token: &str,
) -> (Arc<SqliteStorage>, DefaultSearchService<GitlabClient, SqliteStorage>) {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let client = Arc::new(GitlabClient::with_http(&server.uri(), http));
    let store = Arc::new(SqliteStorage::in_memory().unwrap());
    Settings {
        search: Throttle::new(2, 0).unwrap(),
        inventory: Throttle::new(2, 0).unwrap(),
    }
    .save(&*store)
    .await
    .unwrap();
    let service = DefaultSearchService::new(client, Arc::clone(&store), Credential::new(token));
    (store, service)
}

#[tokio::test]
async fn test_search_across_groups() {
    let server = MockServer::start().await;
    mount_gitlab(&server).await;
    let (_, service) = service(&server, TOKEN).await;

    let run = service.search(SearchRequest::new("needle")).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.projects_total, 3);
    assert_eq!(run.projects_searched, 3);
    assert_eq!(run.results.len(), 3);
    assert!(run.results.iter().all(|m| m.project_id != 11));

    let first = run.results.iter().find(|m| m.path == "src/a.rs").unwrap();
    assert_eq!(first.display_path, "platform/project-10/blob/main/src/a.rs");
    assert_eq!(first.line_count, 2);
    assert_eq!(
        first.file_link(),
        "https://gitlab.example.com/platform/project-10/-/blob/main/src/a.rs#L4"
    );

    let page = ResultPage::from_run(
        &run,
        &ResultQuery {
            include: Some("**/*.rs".into()),
            ..Default::default()
        },
    );
    assert_eq!(page.filtered_results, 2);
}

#[tokio::test]
async fn test_group_filter_and_cached_inventory() {
    let server = MockServer::start().await;
    mount_gitlab(&server).await;
    let (_, service) = service(&server, TOKEN).await;

    let run = service.search(SearchRequest::new("needle group:web")).await.unwrap();
    assert_eq!(run.projects_total, 1);
    assert_eq!(run.results[0].project_id, 20);

    let inventory_requests = |requests: &[wiremock::Request]| {
        requests
            .iter()
            .filter(|r| r.url.path().starts_with("/api/v4/groups"))
            .count()
    };
    let before = inventory_requests(&server.received_requests().await.unwrap());
    assert_eq!(before, 3);

    let mut request = SearchRequest::new("needle");
    request.group_ids = vec![1];
    let run = service.search(request).await.unwrap();
    assert_eq!(run.projects_total, 2);

    // The second run reads groups and projects from the cache
    let after = inventory_requests(&server.received_requests().await.unwrap());
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_literal_query_is_sent_verbatim() {
    let server = MockServer::start().await;
    mount_gitlab(&server).await;
    let (_, service) = service(&server, TOKEN).await;

    let run = service
        .search(SearchRequest::literal("group:web  ref:main"))
        .await
        .unwrap();
    assert_eq!(run.projects_total, 3);

    let keywords: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().ends_with("/search"))
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "search")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(keywords.len(), 3);
    assert!(keywords.iter().all(|k| k == "group:web  ref:main"));
}

#[tokio::test]
async fn test_rejected_token_fails_inventory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "401 Unauthorized" })))
        .mount(&server)
        .await;
    let (_, service) = service(&server, "revoked").await;

    let err = service.search(SearchRequest::new("needle")).await.unwrap_err();
    assert!(matches!(err, Error::Remote { status: 401, .. }));
    assert_eq!(service.current_run().status, RunStatus::Idle);
}

#[tokio::test]
async fn test_groups_paginate_until_short_page() {
    let server = MockServer::start().await;
    let full: Vec<serde_json::Value> = (1..=100)
        .map(|i| json!({ "id": i, "full_path": format!("g{}", i) }))
        .collect();
    let short: Vec<serde_json::Value> = (101..=103)
        .map(|i| json!({ "id": i, "full_path": format!("g{}", i) }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/v4/groups"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(short))
        .expect(1)
        .mount(&server)
        .await;
    let (_, service) = service(&server, TOKEN).await;

    let groups = service.groups(true).await.unwrap();
    assert_eq!(groups.len(), 103);
    assert_eq!(groups[102].full_path, "g103");
}

#[tokio::test]
async fn test_switching_token_evicts_cache() {
    let server = MockServer::start().await;
    mount_gitlab(&server).await;
    let (store, service) = service(&server, TOKEN).await;

    service.projects(false).await.unwrap();
    let evicted = service.set_credential(Credential::new("glpat-other")).await.unwrap();
    assert_eq!(evicted, 2);
    assert!(codescout_core::storage::CacheStore::keys(&*store)
        .await
        .unwrap()
        .is_empty());
}
