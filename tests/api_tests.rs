// tests/api_tests.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use lesson_exercises::{
    config::{Config, NO_EXERCISES_MESSAGE},
    routes,
    state::AppState,
    storage::MemoryStore,
    utils::jwt::sign_jwt,
};

const SECRET: &str = "test_secret_for_integration_tests";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // In-memory store: no database needed for these tests.
    let store = Arc::new(MemoryStore::new());

    let config = Config {
        database_url: None,
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    };

    let state = AppState::in_memory(store, config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn token(user_id: &str, role: &str) -> String {
    sign_jwt(user_id, role, SECRET, 600).expect("Failed to sign token")
}

fn unique_resource() -> String {
    format!("video-{}", &uuid::Uuid::new_v4().to_string()[..8])
}

/// Uploads a mixed set and returns prompt -> id.
async fn upload_set(
    client: &reqwest::Client,
    address: &str,
    resource_id: &str,
) -> HashMap<String, String> {
    let response = client
        .post(format!("{}/api/admin/exercises", address))
        .bearer_auth(token("admin-1", "admin"))
        .json(&serde_json::json!({
            "resourceId": resource_id,
            "difficulty": "beginner",
            "exercises": [
                { "type": "multiple_choice", "prompt": "q1", "options": ["A", "B", "C", "D"], "correctAnswer": "B", "points": 2 },
                { "type": "multiple_choice", "prompt": "q2", "options": ["A", "B", "C", "D"], "correctAnswer": "A", "points": 3 },
                { "type": "multiple_choice", "prompt": "q3", "options": ["A", "B", "C", "D"], "correctAnswer": "D", "points": 5 },
                { "type": "sequencing", "prompt": "seq", "options": ["x", "y", "z"], "correctAnswer": "[0,1,2]", "points": 4 },
                { "type": "cloze", "prompt": "cloze", "correctAnswer": "café", "explanation": "Le café.", "points": 6 }
            ]
        }))
        .send()
        .await
        .expect("Upload failed");
    assert_eq!(response.status().as_u16(), 201);

    let exercises: Vec<serde_json::Value> = client
        .get(format!("{}/api/exercises/{}?difficulty=beginner", address, resource_id))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .expect("Failed to parse exercises");

    exercises
        .iter()
        .map(|e| {
            (
                e["prompt"].as_str().unwrap().to_string(),
                e["id"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn missing_set_returns_retry_hint() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/exercises/{}", address, unique_resource()))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], NO_EXERCISES_MESSAGE);
}

#[tokio::test]
async fn admin_upload_requires_admin_role() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let body = serde_json::json!({
        "resource_id": "video-1",
        "difficulty": "beginner",
        "exercises": [{ "type": "cloze", "prompt": "p", "correct_answer": "x", "points": 1 }]
    });

    let anonymous = client
        .post(format!("{}/api/admin/exercises", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let learner = client
        .post(format!("{}/api/admin/exercises", address))
        .bearer_auth(token("learner-1", "user"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(learner.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_upload_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: unknown exercise type
    let response = client
        .post(format!("{}/api/admin/exercises", address))
        .bearer_auth(token("admin-1", "admin"))
        .json(&serde_json::json!({
            "resource_id": "video-1",
            "difficulty": "beginner",
            "exercises": [{ "type": "crossword", "prompt": "p", "correct_answer": "x", "points": 1 }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_grading_flow() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let resource_id = unique_resource();
    let ids = upload_set(&client, &address, &resource_id).await;

    // Act: B/A/C against B/A/D, wrong order, right cloze with extra spaces
    let answers: HashMap<&str, &str> = HashMap::from([
        (ids["q1"].as_str(), "B"),
        (ids["q2"].as_str(), "A"),
        (ids["q3"].as_str(), "C"),
        (ids["seq"].as_str(), "1,0,2"),
        (ids["cloze"].as_str(), " Café "),
    ]);
    let response = client
        .post(format!("{}/api/exercises/{}/grade?difficulty=beginner", address, resource_id))
        .bearer_auth(token("learner-1", "user"))
        .json(&serde_json::json!({ "answers": answers }))
        .send()
        .await
        .expect("Grade failed");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["totalScore"], 11);
    assert_eq!(summary["maxScore"], 20);
    assert_eq!(summary["percentage"], 55);
    assert_eq!(summary["correctCount"], 3);
    assert_eq!(summary["review"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn grading_requires_token_and_answers() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let resource_id = unique_resource();
    upload_set(&client, &address, &resource_id).await;
    let url = format!("{}/api/exercises/{}/grade", address, resource_id);

    let anonymous = client
        .post(&url)
        .json(&serde_json::json!({ "answers": { "1": "B" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let empty = client
        .post(&url)
        .bearer_auth(token("learner-1", "user"))
        .json(&serde_json::json!({ "answers": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 400);
}

#[tokio::test]
async fn progress_round_trip_is_per_user() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/progress/{}?difficulty=advanced", address, unique_resource());
    let snapshot = serde_json::json!({
        "currentIndex": 1,
        "answers": { "1": "B" },
        "totalQuestions": 3
    });

    let saved = client
        .put(&url)
        .bearer_auth(token("learner-1", "user"))
        .json(&snapshot)
        .send()
        .await
        .unwrap();
    assert_eq!(saved.status().as_u16(), 204);

    let loaded: serde_json::Value = client
        .get(&url)
        .bearer_auth(token("learner-1", "user"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded, snapshot);

    let other = client
        .get(&url)
        .bearer_auth(token("learner-2", "user"))
        .send()
        .await
        .unwrap();
    assert_eq!(other.status().as_u16(), 404);

    let deleted = client
        .delete(&url)
        .bearer_auth(token("learner-1", "user"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let gone = client
        .get(&url)
        .bearer_auth(token("learner-1", "user"))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn save_progress_rejects_index_past_end() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/api/progress/{}", address, unique_resource()))
        .bearer_auth(token("learner-1", "user"))
        .json(&serde_json::json!({ "currentIndex": 4, "answers": {}, "totalQuestions": 3 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn grading_clears_saved_progress() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let resource_id = unique_resource();
    let ids = upload_set(&client, &address, &resource_id).await;
    let progress_url = format!("{}/api/progress/{}", address, resource_id);
    let learner = token("learner-1", "user");

    client
        .put(&progress_url)
        .bearer_auth(&learner)
        .json(&serde_json::json!({ "currentIndex": 1, "answers": {}, "totalQuestions": 5 }))
        .send()
        .await
        .unwrap();

    let answers = HashMap::from([(ids["q1"].clone(), "B")]);
    let graded = client
        .post(format!("{}/api/exercises/{}/grade", address, resource_id))
        .bearer_auth(&learner)
        .json(&serde_json::json!({ "answers": answers }))
        .send()
        .await
        .unwrap();
    assert_eq!(graded.status().as_u16(), 200);

    // The delete is fire-and-forget; give it a moment to land.
    let mut status = 200;
    for _ in 0..50 {
        status = client
            .get(&progress_url)
            .bearer_auth(&learner)
            .send()
            .await
            .unwrap()
            .status()
            .as_u16();
        if status == 404 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, 404);
}
