// HTTP-level tests for the router without opening sockets, backed by the
// in-memory store and a canned diet planner.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt as _;
use uuid::Uuid;

use healthtrack_api::auth::jwt::{Claims, TokenType};
use healthtrack_api::auth::rate_limit::RateLimitState;
use healthtrack_api::config::Config;
use healthtrack_api::db::{DailyLogStore, MemoryStore, UserStore};
use healthtrack_api::models::daily_log::{local_today, DailyLogUpdate, DietPlan};
use healthtrack_api::models::user::{ProfileChanges, UserProfile};
use healthtrack_api::services::diet_plan::DietPlanGenerator;
use healthtrack_api::{router, AppState};

const PLAN: &str = "## Breakfast\n- [ ] Oats\n- [ ] Coffee\n\n## Dinner\n- [ ] Salmon\n- [ ] Rice\n";

struct CannedPlanner;

#[async_trait]
impl DietPlanGenerator for CannedPlanner {
    async fn generate(&self, _profile: &UserProfile) -> anyhow::Result<DietPlan> {
        Ok(DietPlan::Text(PLAN.into()))
    }
}

struct TestApp {
    app: Router,
    store: MemoryStore,
    config: Arc<Config>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_diet_limit(5)
    }

    fn with_diet_limit(max: u32) -> Self {
        let config = Arc::new(Config {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            jwt_secret: "integration-secret".into(),
            llm_api_url: String::new(),
            llm_api_key: String::new(),
            llm_model: String::new(),
            diet_rate_limit_max: max,
            diet_rate_limit_window_secs: 3600,
        });
        let store = MemoryStore::new();
        let state = AppState {
            logs: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            planner: Arc::new(CannedPlanner),
            config: config.clone(),
            rate_limiter: RateLimitState::new(),
        };
        Self {
            app: router(state),
            store,
            config,
        }
    }

    /// Signs a token the way the identity provider would.
    fn token(&self, user: Uuid) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: user,
            email: "user@example.com".into(),
            exp: (now + Duration::minutes(15)).timestamp(),
            iat: now.timestamp(),
            token_type: TokenType::Access,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .expect("token")
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.call_raw(method, uri, user, body.map(|b| b.to_string())).await
    }

    async fn call_raw(
        &self,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("authorization", format!("Bearer {}", self.token(user)));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body)),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let resp = self.app.clone().oneshot(req).await.expect("oneshot");
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    async fn onboard(&self, user: Uuid) {
        let (status, _) = self
            .call(
                "POST",
                "/api/user/onboarding",
                Some(user),
                Some(json!({
                    "name": "Jordan",
                    "age": 34,
                    "gender": "non-binary",
                    "height": 170,
                    "weight": 68,
                    "goal": "lose weight"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn health_is_public() {
    let t = TestApp::new();
    let (status, body) = t.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = t.call("GET", "/readyz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"], "ok");
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let t = TestApp::new();
    let (status, body) = t
        .call("POST", "/api/daily-log", None, Some(json!({ "steps": 10 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 401);

    let req = Request::builder()
        .uri("/api/daily-log/today")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let resp = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn today_without_writes_is_unsaved_zero_record() {
    let t = TestApp::new();
    let user = Uuid::new_v4();
    let (status, body) = t.call("GET", "/api/daily-log/today", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["persisted"], false);
    assert_eq!(body["score"], 0);
    assert_eq!(body["steps"], 0);
    assert!(body["dietPlan"].is_null());

    // Reading must not create the row
    assert!(t.store.find_today(user, local_today()).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_merges_partial_updates_and_rescores() {
    let t = TestApp::new();
    let user = Uuid::new_v4();

    let (status, body) = t
        .call("POST", "/api/daily-log", Some(user), Some(json!({ "steps": 500 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["steps"], 500);
    assert_eq!(body["waterIntake"], 0.0);
    assert_eq!(body["completed"], false);
    assert_eq!(body["score"], 2);
    assert_eq!(body["persisted"], true);
    assert_eq!(body["date"], local_today().to_string());

    let (_, body) = t
        .call(
            "POST",
            "/api/daily-log",
            Some(user),
            Some(json!({ "completed": true, "score": 100 })),
        )
        .await;
    assert_eq!(body["steps"], 500);
    assert_eq!(body["completed"], true);
    assert_eq!(body["score"], 22);
    assert_eq!(body["breakdown"]["completionPoints"], 20.0);

    let (_, today) = t.call("GET", "/api/daily-log/today", Some(user), None).await;
    assert_eq!(today["score"], 22);
    assert_eq!(today["persisted"], true);
}

#[tokio::test]
async fn upsert_rejects_malformed_values() {
    let t = TestApp::new();
    let user = Uuid::new_v4();

    for payload in [
        json!({ "steps": -10 }),
        json!({ "waterIntake": -1.0 }),
        json!({ "dietScore": 45 }),
    ] {
        let (status, body) = t
            .call("POST", "/api/daily-log", Some(user), Some(payload.clone()))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "payload {}", payload);
        assert_eq!(body["error"]["code"], 422);
    }

    assert!(t.store.find_today(user, local_today()).await.unwrap().is_none());
}

#[tokio::test]
async fn wrongly_typed_fields_use_error_envelope() {
    let t = TestApp::new();
    let user = Uuid::new_v4();

    for payload in [json!({ "steps": "abc" }), json!({ "steps": 1500.5 })] {
        let (status, body) = t
            .call("POST", "/api/daily-log", Some(user), Some(payload.clone()))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "payload {}", payload);
        assert_eq!(body["error"]["code"], 422);
        assert!(body["error"]["message"].as_str().unwrap().contains("steps"));
    }

    let (status, body) = t
        .call_raw("POST", "/api/daily-log", Some(user), Some("{\"steps\": ".into()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);

    let (status, body) = t
        .call(
            "POST",
            "/api/diet/checklist",
            Some(user),
            Some(json!({ "checkedItems": "item-0" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 422);

    assert!(t.store.find_today(user, local_today()).await.unwrap().is_none());
}

#[tokio::test]
async fn users_only_see_their_own_logs() {
    let t = TestApp::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    t.call("POST", "/api/daily-log", Some(alice), Some(json!({ "steps": 8000 })))
        .await;
    let (_, body) = t.call("GET", "/api/daily-log/today", Some(bob), None).await;
    assert_eq!(body["steps"], 0);
    assert_eq!(body["persisted"], false);
}

#[tokio::test]
async fn progress_returns_points_in_range_oldest_first() {
    let t = TestApp::new();
    let user = Uuid::new_v4();
    let today = local_today();
    let now = Utc::now();

    for (days_ago, steps) in [(0, 10_000), (3, 5_000), (6, 2_000), (20, 9_000)] {
        t.store
            .upsert_today(
                user,
                today - Duration::days(days_ago),
                &DailyLogUpdate {
                    steps: Some(steps),
                    ..Default::default()
                },
                now,
            )
            .await
            .unwrap();
    }

    let (status, body) = t.call("GET", "/api/progress?range=7d", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().expect("array");
    let steps: Vec<i64> = points.iter().map(|p| p["steps"].as_i64().unwrap()).collect();
    assert_eq!(steps, vec![2_000, 5_000, 10_000]);
    assert_eq!(points[2]["score"], 30);
    assert!(points[0].get("waterIntake").is_some());

    let (_, body) = t.call("GET", "/api/progress?range=30d", Some(user), None).await;
    assert_eq!(body.as_array().unwrap().len(), 4);

    // Unknown range falls back to a week
    let (_, body) = t.call("GET", "/api/progress?range=5y", Some(user), None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn list_daily_logs_validates_range() {
    let t = TestApp::new();
    let user = Uuid::new_v4();
    let (status, _) = t
        .call(
            "GET",
            "/api/daily-logs?startDate=2026-05-10&endDate=2026-05-01",
            Some(user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Default start would fall before the earliest representable date
    let (status, body) = t
        .call("GET", "/api/daily-logs?endDate=-262143-01-01", Some(user), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 422);

    t.call("POST", "/api/daily-log", Some(user), Some(json!({ "waterIntake": 1.25 })))
        .await;
    let (status, body) = t.call("GET", "/api/daily-logs", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["score"], 10);
}

#[tokio::test]
async fn onboarding_and_profile_update() {
    let t = TestApp::new();
    let user = Uuid::new_v4();

    let (status, _) = t.call("GET", "/api/user", Some(user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .call("PUT", "/api/user/profile", Some(user), Some(json!({ "weight": 70 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    t.onboard(user).await;

    let (status, body) = t
        .call("PUT", "/api/user/profile", Some(user), Some(json!({ "weightKg": 66.5 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weightKg"], 66.5);
    assert_eq!(body["heightCm"], 170.0);
    assert_eq!(body["goal"], "lose weight");
    assert_eq!(body["email"], "user@example.com");

    let (status, _) = t
        .call("PUT", "/api/user/profile", Some(user), Some(json!({ "age": 500 })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = t.call("GET", "/api/user", Some(user), None).await;
    assert_eq!(body["name"], "Jordan");
    assert_eq!(body["age"], 34);
}

#[tokio::test]
async fn onboarding_accepts_web_form_payload() {
    let t = TestApp::new();
    let user = Uuid::new_v4();

    let (status, body) = t
        .call(
            "POST",
            "/api/user/onboarding",
            Some(user),
            Some(json!({
                "name": "Sam",
                "age": "31",
                "gender": "",
                "height": "168",
                "weight": "64.5",
                "goal": "lose weight",
                "clerkId": "user_123",
                "email": "sam@example.com"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["age"], 31);
    assert_eq!(body["heightCm"], 168.0);
    assert_eq!(body["weightKg"], 64.5);
    assert!(body["gender"].is_null());
    assert_eq!(body["email"], "sam@example.com");

    let (status, body) = t
        .call(
            "POST",
            "/api/user/onboarding",
            Some(user),
            Some(json!({
                "name": "Sam",
                "age": "old",
                "height": "168",
                "weight": "64",
                "goal": "x"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 422);
}

#[tokio::test]
async fn profile_is_readable_at_profile_path() {
    let t = TestApp::new();
    let user = Uuid::new_v4();

    let (status, _) = t.call("GET", "/api/user/profile", Some(user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    t.onboard(user).await;
    let (status, body) = t.call("GET", "/api/user/profile", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Jordan");
    assert_eq!(body["goal"], "lose weight");
}

#[tokio::test]
async fn diet_generation_requires_complete_profile() {
    let t = TestApp::new();
    let user = Uuid::new_v4();

    let (status, _) = t.call("POST", "/api/diet/generate", Some(user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    t.store
        .save_profile(
            user,
            ProfileChanges {
                name: Some("Casey".into()),
                height_cm: Some(160.0),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
    let (status, body) = t.call("POST", "/api/diet/generate", Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Incomplete user profile");
}

#[tokio::test]
async fn diet_plan_is_stored_and_checklist_drives_diet_score() {
    let t = TestApp::new();
    let user = Uuid::new_v4();
    t.onboard(user).await;

    t.call("POST", "/api/daily-log", Some(user), Some(json!({ "steps": 10_000 })))
        .await;

    let (status, body) = t.call("POST", "/api/diet/generate", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "llm");
    assert_eq!(body["dietPlan"], PLAN);
    assert_eq!(body["dailyLog"]["dietPlan"], PLAN);
    assert_eq!(body["dailyLog"]["steps"], 10_000);

    let (status, body) = t.call("GET", "/api/diet/checklist", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checklist"]["totalItems"], 4);
    assert_eq!(body["checklist"]["sections"][0]["slot"], "morning");
    assert_eq!(body["checklist"]["sections"][2]["items"][0]["text"], "Salmon");

    let (status, body) = t
        .call(
            "POST",
            "/api/diet/checklist",
            Some(user),
            Some(json!({ "checkedItems": ["item-0", "item-2", "item-42"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checked"], 2);
    assert_eq!(body["total"], 4);
    assert_eq!(body["dailyLog"]["dietScore"], 15.0);
    // 30 steps + 15 diet
    assert_eq!(body["dailyLog"]["score"], 45);

    // Later water updates keep the plan and the diet score
    let (_, body) = t
        .call("POST", "/api/daily-log", Some(user), Some(json!({ "waterIntake": 1.5 })))
        .await;
    assert_eq!(body["dietPlan"], PLAN);
    assert_eq!(body["dietScore"], 15.0);
    assert_eq!(body["score"], 57);
}

#[tokio::test]
async fn checklist_without_plan_is_not_found() {
    let t = TestApp::new();
    let user = Uuid::new_v4();
    let (status, body) = t.call("GET", "/api/diet/checklist", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["checklist"].is_null());

    let (status, _) = t
        .call("POST", "/api/diet/checklist", Some(user), Some(json!({ "checkedItems": [] })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn structured_plan_round_trips_through_daily_log() {
    let t = TestApp::new();
    let user = Uuid::new_v4();
    let plan = json!({
        "meals": [{ "name": "Lunch", "description": "Quinoa bowl", "calories": 520 }],
        "waterIntake": 2.4,
        "tips": ["Eat slowly"]
    });
    let (status, body) = t
        .call("POST", "/api/daily-log", Some(user), Some(json!({ "dietPlan": plan })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dietPlan"]["meals"][0]["name"], "Lunch");
    assert_eq!(body["dietPlan"]["tips"][0], "Eat slowly");

    let (_, body) = t.call("GET", "/api/diet/checklist", Some(user), None).await;
    assert_eq!(body["checklist"]["sections"][1]["items"][0]["text"], "Lunch: Quinoa bowl");
}

#[tokio::test]
async fn diet_generation_is_rate_limited_per_user() {
    let t = TestApp::with_diet_limit(1);
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    t.onboard(user).await;
    t.onboard(other).await;

    let (status, _) = t.call("POST", "/api/diet/generate", Some(user), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = t.call("POST", "/api/diet/generate", Some(user), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], 429);

    let (status, _) = t.call("POST", "/api/diet/generate", Some(other), None).await;
    assert_eq!(status, StatusCode::OK);
}
