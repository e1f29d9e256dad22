//! Mock API tests for embedding providers
//!
//! These tests validate client configuration and wire behavior against
//! wiremock servers without hitting real endpoints.

use chapterize::embed::{Embedder, GeminiEmbedder, OpenAiEmbedder};
use chapterize::ChapterizeError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn texts(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("window text {}", i)).collect()
}

// ============================================================================
// OpenAI Embeddings Tests
// ============================================================================

mod openai_tests {
    use super::*;

    fn vector(dims: usize, fill: f32) -> Vec<f32> {
        vec![fill; dims]
    }

    #[tokio::test]
    async fn test_client_properties() {
        let client = OpenAiEmbedder::new("test-api-key".to_string());
        assert_eq!(client.name(), "OpenAI Embeddings");
        assert_eq!(client.max_batch_size(), 128);
        assert_eq!(client.dimension(), 1536);
    }

    #[tokio::test]
    async fn test_successful_batch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"model": "text-embedding-3-small"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 0, "embedding": vector(1536, 0.1)},
                    {"index": 1, "embedding": vector(1536, 0.2)},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            OpenAiEmbedder::new("test-key".to_string()).with_base_url(server.uri());

        let embeddings = client.embed_batch(&texts(2)).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 1536);
        assert!((embeddings[0][0] - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_out_of_order_response_is_reordered() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": vector(1536, 0.2)},
                    {"index": 0, "embedding": vector(1536, 0.1)},
                ]
            })))
            .mount(&server)
            .await;

        let client =
            OpenAiEmbedder::new("test-key".to_string()).with_base_url(server.uri());

        let embeddings = client.embed_batch(&texts(2)).await.unwrap();

        assert!((embeddings[0][0] - 0.1).abs() < 1e-6);
        assert!((embeddings[1][0] - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_count_mismatch_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": vector(1536, 0.1)}]
            })))
            .mount(&server)
            .await;

        let client =
            OpenAiEmbedder::new("test-key".to_string()).with_base_url(server.uri());

        let err = client.embed_batch(&texts(3)).await.unwrap_err();
        assert!(matches!(err, ChapterizeError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&server)
            .await;

        let client =
            OpenAiEmbedder::new("test-key".to_string()).with_base_url(server.uri());

        let err = client.embed_batch(&texts(1)).await.unwrap_err();
        assert!(matches!(err, ChapterizeError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Invalid API key", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            OpenAiEmbedder::new("bad-key".to_string()).with_base_url(server.uri());

        let err = client.embed_batch(&texts(1)).await.unwrap_err();
        assert!(matches!(err, ChapterizeError::Api(_)));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .expect(3)
            .mount(&server)
            .await;

        let client =
            OpenAiEmbedder::new("test-key".to_string()).with_base_url(server.uri());

        let err = client.embed_batch(&texts(1)).await.unwrap_err();
        assert!(matches!(err, ChapterizeError::Api(_)));
    }
}

// ============================================================================
// Gemini Embeddings Tests
// ============================================================================

mod gemini_tests {
    use super::*;

    fn vector(fill: f32) -> Vec<f32> {
        vec![fill; 768]
    }

    #[tokio::test]
    async fn test_client_properties() {
        let client = GeminiEmbedder::new("test-api-key".to_string());
        assert_eq!(client.name(), "Gemini Embeddings");
        assert_eq!(client.max_batch_size(), 100);
        assert_eq!(client.dimension(), 768);
    }

    #[tokio::test]
    async fn test_successful_batch_with_key_in_query() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(query_param("key", "g-test-key"))
            .and(body_partial_json(json!({
                "requests": [
                    {"model": "models/text-embedding-004"},
                    {"model": "models/text-embedding-004"},
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [
                    {"values": vector(0.3)},
                    {"values": vector(0.4)},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GeminiEmbedder::new("g-test-key".to_string()).with_base_url(server.uri());

        let embeddings = client.embed_batch(&texts(2)).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 768);
        assert!((embeddings[1][0] - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_count_mismatch_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [{"values": vector(0.3)}]
            })))
            .mount(&server)
            .await;

        let client =
            GeminiEmbedder::new("g-test-key".to_string()).with_base_url(server.uri());

        let err = client.embed_batch(&texts(2)).await.unwrap_err();
        assert!(matches!(err, ChapterizeError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_api_error_surface() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GeminiEmbedder::new("bad-key".to_string()).with_base_url(server.uri());

        let err = client.embed_batch(&texts(1)).await.unwrap_err();
        assert!(matches!(err, ChapterizeError::Api(_)));
        assert!(err.to_string().contains("API key not valid"));
    }
}
