mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn test_students_cannot_author_tests() {
    let app = spawn_app().await;
    let student = app.user("sam", "student").await;

    let (status, _) = app
        .post(
            "/api/tests",
            &student,
            json!({ "name": "Mine", "duration_minutes": 10 }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_empty_test_cannot_be_published() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let (_, test) = app
        .post(
            "/api/tests",
            &educator,
            json!({ "name": "Empty", "duration_minutes": 10 }),
        )
        .await;
    let id = test["id"].as_str().expect("test id");

    let (status, _) = app
        .put(
            &format!("/api/tests/{id}/status"),
            &educator,
            json!({ "status": "published" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_published_test_totals_and_locked_questions() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, mcq, _) = app.published_test(&educator, 20, false).await;

    let (_, author_view) = app.get(&format!("/api/tests/{test_id}"), &educator).await;
    assert_eq!(author_view["test"]["total_marks"], 6.0);
    assert_eq!(author_view["test"]["num_questions"], 2);
    assert_eq!(author_view["questions"][0]["correct_answers"], json!(["4"]));

    let (_, student_view) = app.get(&format!("/api/tests/{test_id}"), &student).await;
    assert!(student_view["questions"][0].get("correct_answers").is_none());

    let (status, _) = app
        .put(
            &format!("/api/tests/{test_id}/questions/{mcq}"),
            &educator,
            json!({
                "question_text": "2 + 3?",
                "question_type": "mcq",
                "options": ["4", "5"],
                "correct_answers": ["5"],
                "marks": 4.0,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            axum::http::Method::PATCH,
            &format!("/api/tests/{test_id}"),
            Some(&educator),
            Some(json!({ "duration_minutes": 90 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_question_is_rejected() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let (_, test) = app
        .post(
            "/api/tests",
            &educator,
            json!({ "name": "Quiz", "duration_minutes": 10 }),
        )
        .await;
    let id = test["id"].as_str().expect("test id");

    let (status, body) = app
        .post(
            &format!("/api/tests/{id}/questions"),
            &educator,
            json!({
                "question_text": "Pick one",
                "question_type": "mcq",
                "options": ["a", "b"],
                "correct_answers": ["c"],
                "marks": 1.0,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_draft_leaderboard_is_not_found() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let (_, test) = app
        .post(
            "/api/tests",
            &educator,
            json!({ "name": "Quiz", "duration_minutes": 10 }),
        )
        .await;
    let id = test["id"].as_str().expect("test id");

    let (status, _) = app.get(&format!("/api/tests/{id}/leaderboard"), &educator).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
