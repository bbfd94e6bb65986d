use reqwest::Url;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yt_outliers::analysis::{
    analyze_thumbnail, CompletionClient, TextGenerator, VisionClient, VisionService,
    VISION_FAILED,
};
use yt_outliers::config::{OpenAi, Vision};
use yt_outliers::search::{discover, DiscoverOptions, DiscoverRequest};
use yt_outliers::youtube::{SearchRequest, VideoProvider, YouTubeClient};

fn youtube(server: &MockServer) -> YouTubeClient {
    let base = Url::parse(&format!("{}/youtube/v3/", server.uri())).unwrap();
    YouTubeClient::with_base_url("test-key".into(), base).unwrap()
}

#[tokio::test]
async fn search_reads_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("q", "etf"))
        .and(query_param("channelId", "UC1"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "videoId": "v1" }, "snippet": { "channelId": "UC1", "title": "ETF 101" } },
                { "id": { "playlistId": "p1" }, "snippet": { "channelId": "UC1" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = youtube(&server)
        .search(&SearchRequest {
            query: "etf".into(),
            channel_id: Some("UC1".into()),
            published_after: None,
            max_results: 10,
        })
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id.video_id.as_deref(), Some("v1"));
    assert!(items[1].id.video_id.is_none());
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "The request cannot be completed because you have exceeded your quota." }
        })))
        .mount(&server)
        .await;

    let err = youtube(&server)
        .search(&SearchRequest {
            query: "q".into(),
            max_results: 20,
            ..Default::default()
        })
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("403"), "{msg}");
    assert!(msg.contains("exceeded your quota"), "{msg}");
}

#[tokio::test]
async fn empty_detail_lookup_makes_no_request() {
    let server = MockServer::start().await;
    let client = youtube(&server);
    assert!(client.video_details(&[]).await.unwrap().is_empty());
    assert!(client.channel_details(&[]).await.unwrap().is_empty());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn discover_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "videoId": "a" }, "snippet": { "channelId": "UC1" } },
                { "id": { "videoId": "b" }, "snippet": { "channelId": "UC1" } }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/videos"))
        .and(query_param("id", "a,b"))
        .and(query_param("part", "snippet,statistics,contentDetails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "a",
                    "snippet": {
                        "channelId": "UC1",
                        "title": "Long one",
                        "thumbnails": { "medium": { "url": "https://i.ytimg.com/vi/a/mqdefault.jpg" } }
                    },
                    "statistics": { "viewCount": "3000" },
                    "contentDetails": { "duration": "PT10M" }
                },
                {
                    "id": "b",
                    "snippet": { "channelId": "UC1", "title": "Quick one" },
                    "statistics": { "viewCount": "100" },
                    "contentDetails": { "duration": "PT30S" }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .and(query_param("id", "UC1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [ { "id": "UC1", "statistics": { "viewCount": "20000", "videoCount": "20" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = youtube(&server);
    let request = DiscoverRequest {
        query: "q",
        ..Default::default()
    };
    let bundle = discover(&client, &request, &DiscoverOptions::default())
        .await
        .unwrap();

    assert_eq!(bundle.regular.len(), 1);
    assert_eq!(bundle.regular[0].id, "a");
    assert_eq!(bundle.regular[0].outlier_score, 3.0);
    assert_eq!(
        bundle.regular[0].thumbnail_url.as_deref(),
        Some("https://i.ytimg.com/vi/a/mqdefault.jpg")
    );
    assert_eq!(bundle.shorts.len(), 1);
    assert_eq!(bundle.shorts[0].outlier_score, 0.1);
}

#[tokio::test]
async fn vision_client_posts_image_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(header("authorization", "Bearer vision-id"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "description": "a man with a chart" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = VisionClient::from_config(&Vision {
        endpoint: format!("{}/analyze", server.uri()),
        client_id: "vision-id".into(),
    })
    .unwrap();
    let description = client.analyze("https://img/x.jpg").await.unwrap();
    assert_eq!(description.as_deref(), Some("a man with a chart"));
}

#[tokio::test]
async fn completion_client_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(header("authorization", "Bearer openai-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "text": "\n\nSomeone explains a stock chart." } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::from_config(&OpenAi {
        api_key: "openai-key".into(),
        base_url: format!("{}/", server.uri()),
        model: "gpt-3.5-turbo-instruct".into(),
        max_tokens: 50,
        temperature: 0.7,
    })
    .unwrap();
    let text = client.complete("Describe").await.unwrap();
    assert_eq!(text, "Someone explains a stock chart.");
}

#[tokio::test]
async fn analysis_survives_vision_outage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "text": "Nothing to see." } ]
        })))
        .mount(&server)
        .await;

    let vision = VisionClient::from_config(&Vision {
        endpoint: format!("{}/analyze", server.uri()),
        client_id: "id".into(),
    })
    .unwrap();
    let text = CompletionClient::from_config(&OpenAi {
        api_key: "k".into(),
        base_url: format!("{}/", server.uri()),
        model: "m".into(),
        max_tokens: 10,
        temperature: 0.0,
    })
    .unwrap();

    let analysis = analyze_thumbnail(&vision, &text, "https://img/x.jpg").await;
    assert_eq!(analysis.description, VISION_FAILED);
    assert_eq!(analysis.narration, "Nothing to see.");
}
