//! Integration tests for `POST /analyze`.

mod common;

use assistant_service::config::AnalysisLayout;
use assistant_service::services::providers::mock::MockChatProvider;
use assistant_service::services::providers::ProviderError;
use common::{image_part, spawn_app, test_config};
use reqwest::{multipart, StatusCode};
use std::sync::Arc;
use std::time::Duration;

const MALM_REPLY: &str = "- Produkt/serie: IKEA MALM\n\
    - Serienummer/modell: 802.145.49\n\
    - Längd: 80 cm\n\
    - Bredd: 48 cm\n\
    - Höjd: 100 cm\n\
    - Vikt: 40 kg\n\
    - Osäkerhet/antaganden: —";

#[tokio::test]
async fn analyze_without_files_returns_400() {
    let provider = Arc::new(MockChatProvider::new("OpenAI"));
    let app = spawn_app(test_config(), provider.clone(), None).await;

    let form = multipart::Form::new().text("note", "no images here");
    let response = app
        .client
        .post(app.url("/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No images uploaded");
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn analyze_non_multipart_body_returns_400() {
    let app = spawn_app(test_config(), Arc::new(MockChatProvider::new("OpenAI")), None).await;

    let response = app
        .client
        .post(app.url("/analyze"))
        .json(&serde_json::json!({"images": []}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_returns_one_entry_per_image_in_order() {
    let provider = Arc::new(
        MockChatProvider::new("OpenAI")
            .push_reply(MALM_REPLY)
            .push_reply("Ingen produkt syns på bilden.")
            .push_reply(MALM_REPLY),
    );
    let app = spawn_app(test_config(), provider.clone(), None).await;

    let form = multipart::Form::new()
        .part("images", image_part(vec![1, 2, 3], "a.jpg"))
        .part("images", image_part(vec![4, 5, 6], "b.jpg"))
        .text("comment", "ignored")
        .part("images", image_part(vec![7, 8, 9], "c.jpg"));

    let response = app
        .client
        .post(app.url("/api/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    let entries = body.as_array().expect("array body");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["imageIndex"], 1);
    assert_eq!(entries[0]["analysis"], MALM_REPLY);
    assert_eq!(entries[1]["imageIndex"], 2);
    assert_eq!(entries[1]["analysis"], "Ingen produkt syns på bilden.");
    assert_eq!(entries[2]["imageIndex"], 3);

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].image_urls[0].starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn analyze_enriches_missing_dimensions() {
    let provider = Arc::new(
        MockChatProvider::new("OpenAI")
            .push_reply(
                "- Produkt/serie: IKEA BILLY\n\
                 - Serienummer/modell: okänd\n\
                 - Längd: osäker\n\
                 - Bredd: \n\
                 - Höjd: 202 cm\n\
                 - Vikt: 30 kg\n\
                 - Osäkerhet/antaganden: Vit.",
            )
            .push_reply(
                "```json\n{\"langd_cm\": 80, \"bredd_cm\": \"28\", \"hojd_cm\": \"\", \
                 \"vikt_kg\": \"99\", \"notis\": \"Standardbredd.\"}\n```",
            ),
    );
    let app = spawn_app(test_config(), provider, None).await;

    let form = multipart::Form::new().part("images", image_part(vec![1], "billy.jpg"));
    let response = app
        .client
        .post(app.url("/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body[0]["analysis"],
        "- Produkt/serie: IKEA BILLY\n\
         - Serienummer/modell: okänd\n\
         - Längd: 80 cm\n\
         - Bredd: 28 cm\n\
         - Höjd: 202 cm\n\
         - Vikt: 30 kg\n\
         - Osäkerhet/antaganden: Vit. Standardbredd."
    );
}

#[tokio::test]
async fn analyze_compact_layout_enrichment_returns_five_lines() {
    let provider = Arc::new(
        MockChatProvider::new("OpenAI")
            .push_reply(
                "- Produkt/serie: IKEA POÄNG\n\
                 - Serienummer/modell: okänd\n\
                 - Längd: 82 cm\n\
                 - Bredd: 68 cm\n\
                 - Höjd: 100 cm\n\
                 - Vikt: n/a\n\
                 - Osäkerhet/antaganden: Fåtölj.",
            )
            .push_reply(r#"{"vikt_kg": 13.0, "notis": "Björkfaner."}"#),
    );
    let mut config = test_config();
    config.analysis.layout = AnalysisLayout::Compact;
    let app = spawn_app(config, provider, None).await;

    let form = multipart::Form::new().part("images", image_part(vec![1], "poang.jpg"));
    let response = app
        .client
        .post(app.url("/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body[0]["analysis"],
        "- Produkt/serie: IKEA POÄNG\n\
         - Längd: 82 cm\n\
         - Bredd: 68 cm\n\
         - Höjd: 100 cm\n\
         - Vikt: 13 kg"
    );
}

#[tokio::test]
async fn analyze_timeout_returns_placeholder_not_error() {
    let provider = Arc::new(
        MockChatProvider::new("OpenAI")
            .with_delay(Duration::from_secs(5))
            .push_reply(MALM_REPLY),
    );
    let app = spawn_app(test_config(), provider, None).await;

    let form = multipart::Form::new().part("images", image_part(vec![1], "slow.jpg"));
    let response = app
        .client
        .post(app.url("/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    let analysis = body[0]["analysis"].as_str().unwrap();
    assert!(analysis.contains("Timeout mot OpenAI."));
    assert!(analysis.contains("- Längd: Osäker"));
}

#[tokio::test]
async fn analyze_rate_limit_uses_compact_placeholder() {
    let provider =
        Arc::new(MockChatProvider::new("OpenAI").push_error(ProviderError::RateLimited));
    let mut config = test_config();
    config.analysis.layout = AnalysisLayout::Compact;
    let app = spawn_app(config, provider, None).await;

    let form = multipart::Form::new().part("images", image_part(vec![1], "a.jpg"));
    let response = app
        .client
        .post(app.url("/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    let body: serde_json::Value = response.json().await.unwrap();
    let analysis = body[0]["analysis"].as_str().unwrap();
    assert_eq!(analysis.lines().count(), 5);
    assert!(analysis.contains("Rate limit hos OpenAI."));
}

#[tokio::test]
async fn analyze_rejects_oversized_upload() {
    let mut config = test_config();
    config.analysis.max_upload_bytes = 1024;
    let app = spawn_app(config, Arc::new(MockChatProvider::new("OpenAI")), None).await;

    let form = multipart::Form::new().part("images", image_part(vec![0; 8 * 1024], "big.jpg"));
    let response = app
        .client
        .post(app.url("/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
