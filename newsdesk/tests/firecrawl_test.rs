use mockito::Matcher;
use newsdesk::search::firecrawl::FirecrawlClient;
use newsdesk::search::SearchTool;
use newsdesk::search_params::map_search_params;
use serde_json::json;

#[tokio::test]
async fn search_sends_per_call_limit_and_time_filter() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/search")
        .match_header("authorization", "Bearer fc-key")
        .match_body(Matcher::PartialJson(json!({
            "query": "Latest developments in AI",
            "limit": 7,
            "tbs": "qdr:d",
            "scrapeOptions": {"formats": ["markdown"]}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "success": true,
                "data": [
                    {
                        "url": "https://news.example.com/ai-1",
                        "title": "AI one",
                        "description": "first",
                        "markdown": "Body one"
                    },
                    {"url": "https://news.example.com/ai-2", "title": "AI two"}
                ]
            }"#,
        )
        .create_async()
        .await;

    let client = FirecrawlClient::new(server.url(), "fc-key", 10).expect("client");
    let (params, _) = map_search_params(7, "past_day");

    let docs = client
        .search("Latest developments in AI", &params)
        .await
        .expect("search");

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].url, "https://news.example.com/ai-1");
    assert_eq!(docs[0].markdown.as_deref(), Some("Body one"));
    assert_eq!(docs[1].title.as_deref(), Some("AI two"));
    assert!(docs[1].description.is_none());

    mock.assert_async().await;
}

#[tokio::test]
async fn search_without_time_filter_omits_tbs() {
    let mut server = mockito::Server::new_async().await;

    // Exact body match: no "tbs" key at all, not an empty string
    let mock = server
        .mock("POST", "/search")
        .match_body(Matcher::Json(json!({
            "query": "Rust",
            "limit": 4,
            "scrapeOptions": {"formats": ["markdown"]}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": []}"#)
        .expect(2)
        .create_async()
        .await;

    let client = FirecrawlClient::new(server.url(), "fc-key", 10).expect("client");
    for code in ["", "fortnight"] {
        let (params, phrase) = map_search_params(4, code);
        assert_eq!(phrase, "recent");

        let docs = client.search("Rust", &params).await.expect("search");
        assert!(docs.is_empty());
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn search_forwards_custom_date_range_filter() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/search")
        .match_body(Matcher::PartialJson(json!({
            "tbs": "cdr:1,cd_min:1/1/2024,cd_max:1/31/2024"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": []}"#)
        .create_async()
        .await;

    let client = FirecrawlClient::new(server.url(), "fc-key", 10).expect("client");
    let (params, _) = map_search_params(3, "cdr:1,cd_min:1/1/2024,cd_max:1/31/2024");

    client.search("Rust", &params).await.expect("search");
    mock.assert_async().await;
}

#[tokio::test]
async fn search_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/search")
        .with_status(401)
        .with_body(r#"{"success": false, "error": "Unauthorized: Invalid token"}"#)
        .create_async()
        .await;

    let client = FirecrawlClient::new(server.url(), "bad-key", 10).expect("client");
    let (params, _) = map_search_params(5, "qdr:w");

    let err = client.search("anything", &params).await.unwrap_err();
    assert!(err.to_string().contains("401"));
    assert!(err.to_string().contains("Invalid token"));
}

#[tokio::test]
async fn search_unsuccessful_payload_is_an_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/search")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "error": "Insufficient credits"}"#)
        .create_async()
        .await;

    let client = FirecrawlClient::new(server.url(), "fc-key", 10).expect("client");
    let (params, _) = map_search_params(5, "qdr:w");

    let err = client.search("anything", &params).await.unwrap_err();
    assert!(err.to_string().contains("Insufficient credits"));
}

#[tokio::test]
async fn scrape_returns_markdown_and_metadata() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/scrape")
        .match_body(Matcher::PartialJson(json!({
            "url": "https://news.example.com/ai-1",
            "onlyMainContent": true
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "success": true,
                "data": {
                    "markdown": "Full article text",
                    "metadata": {"title": "AI one", "sourceURL": "https://news.example.com/ai-1"}
                }
            }"#,
        )
        .create_async()
        .await;

    let client = FirecrawlClient::new(format!("{}/", server.url()), "fc-key", 10).expect("client");
    let page = client.scrape("https://news.example.com/ai-1").await.expect("scrape");

    assert_eq!(page.markdown, "Full article text");
    assert_eq!(page.title.as_deref(), Some("AI one"));
    assert_eq!(page.url, "https://news.example.com/ai-1");

    mock.assert_async().await;
}

#[test]
fn empty_key_is_rejected_at_construction() {
    let err = FirecrawlClient::new("https://api.firecrawl.dev/v1", "", 10)
        .err()
        .expect("must fail");
    assert!(err.to_string().contains("API key is empty"));
}
