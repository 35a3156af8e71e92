#[cfg(test)]
mod story_api_tests {
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    use crate::api::{app_state::AppState, create_router};
    use crate::config::config::AppConfig;
    use crate::error::GenerationError;
    use crate::observability::AppMetrics;
    use crate::services::{
        LenientJsonParser, NarrativeGenerator, SessionRules, create_character_service,
        create_game_session_service,
    };
    use crate::storage::{InMemoryGameStateRepository, StorageInstance};

    /// 按顺序返回预设响应的生成器
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    }

    #[async_trait]
    impl NarrativeGenerator for ScriptedGenerator {
        async fn send(&self, _conversation_id: &str, _prompt: &str) -> Result<String, GenerationError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Unavailable("script exhausted".into())))
        }
    }

    fn reply(text: &str, location: &str) -> Result<String, GenerationError> {
        Ok(format!(
            "Here is the next scene:\n```json\n{}\n```",
            json!({
                "story_text": text,
                "choices": ["Descend", "Pray", "Run"],
                "location": location,
                "combat_encounter": "false"
            })
        ))
    }

    fn app(replies: Vec<Result<String, GenerationError>>) -> Router {
        let repo = Arc::new(InMemoryGameStateRepository::new());
        let storage = Arc::new(StorageInstance::Memory(repo.clone()));
        let metrics = Arc::new(AppMetrics::default());
        let generator = Arc::new(ScriptedGenerator {
            replies: Mutex::new(replies.into()),
        });

        let state = AppState::new(
            create_character_service(repo.clone(), metrics.clone()),
            create_game_session_service(
                repo,
                generator,
                Arc::new(LenientJsonParser::new()),
                SessionRules::default(),
                metrics.clone(),
            ),
            storage,
            metrics,
            AppConfig::in_memory(),
        );
        create_router(state)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn create_kael(app: &Router) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/characters",
            Some(json!({"name": "Kael", "race": "Elf", "character_class": "Wizard", "background": "Sage"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_api_root() {
        let app = app(vec![]);
        for uri in ["/api", "/api/"] {
            let (status, body) = call(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "D&D Unlimited Choices Game API");
        }
    }

    #[tokio::test]
    async fn test_character_options() {
        let (status, body) = call(&app(vec![]), "GET", "/api/characters/options", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["races"].as_array().unwrap().len(), 9);
        assert_eq!(body["classes"][0], "Fighter");
    }

    #[tokio::test]
    async fn test_create_and_fetch_character() {
        let app = app(vec![]);
        let id = create_kael(&app).await;

        let (status, body) = call(&app, "GET", &format!("/api/characters/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Kael");
        assert_eq!(body["character_class"], "Wizard");
        assert_eq!(body["dexterity"], 12);
        assert_eq!(body["intelligence"], 11);
        assert_eq!(body["hit_points"], 6);
        assert_eq!(body["armor_class"], 11);
        assert_eq!(body["gold"], 100);
    }

    #[tokio::test]
    async fn test_invalid_character_is_400() {
        let (status, body) = call(
            &app(vec![]),
            "POST",
            "/api/characters",
            Some(json!({"name": "Kael", "race": "Orc", "character_class": "Wizard", "background": "Sage"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_unknown_character_is_404() {
        let app = app(vec![]);
        let (status, body) = call(&app, "GET", "/api/characters/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "CHARACTER_NOT_FOUND");

        let (status, _) = call(&app, "POST", "/api/story/start/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_story_flow() {
        let app = app(vec![
            reply("A bell tolls beneath the abbey.", "Ruined Abbey"),
            reply("The stairs spiral into cold dark.", "Abbey Undercroft"),
            reply("Bones shift in their niches.", "Ossuary"),
        ]);
        let character_id = create_kael(&app).await;

        let (status, body) =
            call(&app, "POST", &format!("/api/story/start/{}", character_id), None).await;
        assert_eq!(status, StatusCode::OK);
        let session_id = body["session_id"].as_str().unwrap().to_string();
        assert_eq!(body["story"]["location"], "Ruined Abbey");
        assert_eq!(body["story"]["combat_encounter"], false);

        for choice in ["Descend", "Pray"] {
            let (status, _) = call(
                &app,
                "POST",
                &format!("/api/story/choice/{}", session_id),
                Some(json!({"choice_text": choice})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, history) =
            call(&app, "GET", &format!("/api/story/history/{}", session_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["story_history"].as_array().unwrap().len(), 3);
        assert_eq!(history["choices_made"], json!(["Descend", "Pray"]));
        assert_eq!(history["current_location"], "Ossuary");
    }

    #[tokio::test]
    async fn test_generation_failures_map_to_gateway_errors() {
        let app = app(vec![
            Ok("I cannot narrate that.".to_string()),
            Err(GenerationError::Timeout(60)),
        ]);
        let character_id = create_kael(&app).await;
        let uri = format!("/api/story/start/{}", character_id);

        let (status, body) = call(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "GENERATION_FAILED");
        // 原始输出只写日志，不返回客户端
        assert!(!body.to_string().contains("cannot narrate"));

        let (status, body) = call(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["code"], "GENERATION_TIMEOUT");
    }

    #[tokio::test]
    async fn test_choice_on_missing_session_is_404() {
        let (status, body) = call(
            &app(vec![]),
            "POST",
            "/api/story/choice/missing",
            Some(json!({"choice_text": "Wait"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_security_headers_and_metrics() {
        let app = app(vec![]);
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()["x-frame-options"], "DENY");

        let (status, _) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("http_requests_total 2"));
    }
}
