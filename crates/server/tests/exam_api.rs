mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::spawn_app;
use coursehub_core::domain::ExamSessionId;
use coursehub_server::clock::Clock;
use coursehub_server::entity::exam_session;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, SqlErr};
use serde_json::json;

#[tokio::test]
async fn test_start_hides_answers_and_resumes_running_session() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, _, _) = app.published_test(&educator, 30, false).await;

    let (status, session) = app
        .post("/api/exam/start", &student, json!({ "test_id": test_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{session}");
    assert_eq!(session["status"], "in_progress");
    assert_eq!(session["is_first_attempt"], true);
    assert_eq!(session["remaining_seconds"], 1800);
    assert_eq!(session["questions"].as_array().map(Vec::len), Some(2));
    assert!(session["questions"][0].get("correct_answers").is_none());

    app.advance(Duration::minutes(10));
    let (_, resumed) = app
        .post("/api/exam/start", &student, json!({ "test_id": test_id }))
        .await;
    assert_eq!(resumed["id"], session["id"]);
    assert_eq!(resumed["remaining_seconds"], 1200);
}

#[tokio::test]
async fn test_submit_scores_with_negative_marks() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, mcq, numerical) = app.published_test(&educator, 30, false).await;

    let (_, session) = app
        .post("/api/exam/start", &student, json!({ "test_id": test_id }))
        .await;
    let session_id = session["id"].as_str().expect("session id");

    let (status, saved) = app
        .put(
            &format!("/api/exam/sessions/{session_id}/answers"),
            &student,
            json!({
                "answers": { mcq.clone(): "3", numerical.clone(): "2.5" },
                "marked_for_review": [mcq.clone(), mcq.clone()],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{saved}");
    assert_eq!(saved["marked_for_review"], json!([mcq.clone()]));

    app.advance(Duration::minutes(12));
    let (status, result) = app
        .post(
            &format!("/api/exam/sessions/{session_id}/submit"),
            &student,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["status"], "submitted");
    assert_eq!(result["score"], 1.0);
    assert_eq!(result["total_marks"], 6.0);
    assert_eq!(result["correct"], 1);
    assert_eq!(result["incorrect"], 1);
    assert_eq!(result["unanswered"], 0);
    assert_eq!(result["time_taken_minutes"], 12.0);

    let breakdown = result["breakdown"].as_array().expect("breakdown");
    let mcq_row = breakdown
        .iter()
        .find(|row| row["question_id"] == mcq.as_str())
        .expect("mcq in breakdown");
    assert_eq!(mcq_row["verdict"], "incorrect");
    assert_eq!(mcq_row["awarded"], -1.0);
    assert_eq!(mcq_row["correct_answers"], json!(["4"]));

    let (status, _) = app
        .post(
            &format!("/api/exam/sessions/{session_id}/submit"),
            &student,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_expired_session_is_completed_at_deadline() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, mcq, _) = app.published_test(&educator, 30, false).await;

    let (_, session) = app
        .post("/api/exam/start", &student, json!({ "test_id": test_id }))
        .await;
    let session_id = session["id"].as_str().expect("session id");
    app.put(
        &format!("/api/exam/sessions/{session_id}/answers"),
        &student,
        json!({ "answers": { mcq.clone(): "4" } }),
    )
    .await;

    app.advance(Duration::minutes(45));

    let (status, _) = app
        .put(
            &format!("/api/exam/sessions/{session_id}/answers"),
            &student,
            json!({ "answers": { mcq.clone(): "5" } }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, result) = app
        .get(&format!("/api/exam/sessions/{session_id}/result"), &student)
        .await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["status"], "completed");
    assert_eq!(result["score"], 4.0);
    assert_eq!(result["time_taken_minutes"], 30.0);
}

#[tokio::test]
async fn test_result_of_running_session_conflicts() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, _, _) = app.published_test(&educator, 30, false).await;

    let (_, session) = app
        .post("/api/exam/start", &student, json!({ "test_id": test_id }))
        .await;
    let session_id = session["id"].as_str().expect("session id");

    let (status, _) = app
        .get(&format!("/api/exam/sessions/{session_id}/result"), &student)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_retake_rules() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (once, _, _) = app.published_test(&educator, 30, false).await;
    let (again, _, _) = app.published_test(&educator, 30, true).await;

    for test_id in [&once, &again] {
        let (_, session) = app
            .post("/api/exam/start", &student, json!({ "test_id": test_id }))
            .await;
        let session_id = session["id"].as_str().expect("session id");
        app.post(
            &format!("/api/exam/sessions/{session_id}/submit"),
            &student,
            json!({}),
        )
        .await;
    }

    let (status, body) = app
        .post("/api/exam/start", &student, json!({ "test_id": once }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, retake) = app
        .post("/api/exam/start", &student, json!({ "test_id": again }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{retake}");
    assert_eq!(retake["is_first_attempt"], false);

    let (_, sessions) = app.get("/api/exam/sessions", &student).await;
    assert_eq!(sessions.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_draft_test_cannot_be_started() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (_, test) = app
        .post(
            "/api/tests",
            &educator,
            json!({ "name": "Draft", "duration_minutes": 10 }),
        )
        .await;

    let (status, _) = app
        .post("/api/exam/start", &student, json!({ "test_id": test["id"] }))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_students_cannot_see_a_session() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let sam = app.user("sam", "student").await;
    let eve = app.user("eve", "student").await;
    let (test_id, _, _) = app.published_test(&educator, 30, false).await;

    let (_, session) = app
        .post("/api/exam/start", &sam, json!({ "test_id": test_id }))
        .await;
    let session_id = session["id"].as_str().expect("session id");

    let (status, _) = app
        .get(&format!("/api/exam/sessions/{session_id}"), &eve)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get(&format!("/api/exam/sessions/{session_id}"), &educator)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_leaderboard_ranks_first_attempts() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let (test_id, mcq, numerical) = app.published_test(&educator, 30, true).await;

    let mut tokens = Vec::new();
    for (name, mcq_answer, minutes) in [("ann", "4", 20), ("bob", "4", 10), ("cat", "3", 5)] {
        let token = app.user(name, "student").await;
        let (_, session) = app
            .post("/api/exam/start", &token, json!({ "test_id": test_id }))
            .await;
        let session_id = session["id"].as_str().expect("session id").to_string();
        app.put(
            &format!("/api/exam/sessions/{session_id}/answers"),
            &token,
            json!({ "answers": { mcq.clone(): mcq_answer, numerical.clone(): "2.5" } }),
        )
        .await;
        tokens.push((token, session_id, minutes));
    }

    let start = app.clock.now();
    for (token, session_id, minutes) in &tokens {
        app.clock.set(start + Duration::minutes(*minutes));
        app.post(
            &format!("/api/exam/sessions/{session_id}/submit"),
            token,
            json!({}),
        )
        .await;
    }

    // a retake never reaches the board
    let (ann, _, _) = &tokens[0];
    let (_, retake) = app
        .post("/api/exam/start", ann, json!({ "test_id": test_id }))
        .await;
    assert_eq!(retake["is_first_attempt"], false);

    let (status, board) = app
        .get(&format!("/api/tests/{test_id}/leaderboard"), &educator)
        .await;
    assert_eq!(status, StatusCode::OK, "{board}");
    let entries = board["entries"].as_array().expect("entries");
    let names: Vec<&str> = entries
        .iter()
        .filter_map(|e| e["username"].as_str())
        .collect();
    assert_eq!(names, vec!["bob", "ann", "cat"]);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["score"], 6.0);
    assert_eq!(entries[2]["score"], 1.0);

    let (_, limited) = app
        .get(&format!("/api/tests/{test_id}/leaderboard?limit=1"), &educator)
        .await;
    assert_eq!(limited["entries"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_leaderboard_ties_share_a_rank() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let (test_id, mcq, numerical) = app.published_test(&educator, 30, false).await;

    let mut sessions = Vec::new();
    for (name, mcq_answer) in [("ann", "4"), ("bob", "4"), ("cat", "3")] {
        let token = app.user(name, "student").await;
        let (_, session) = app
            .post("/api/exam/start", &token, json!({ "test_id": test_id }))
            .await;
        let session_id = session["id"].as_str().expect("session id").to_string();
        app.put(
            &format!("/api/exam/sessions/{session_id}/answers"),
            &token,
            json!({ "answers": { mcq.clone(): mcq_answer, numerical.clone(): "2.5" } }),
        )
        .await;
        sessions.push((token, session_id));
    }

    // everyone started at the same instant and submits at the same instant
    app.advance(Duration::minutes(15));
    for (token, session_id) in &sessions {
        let (status, body) = app
            .post(
                &format!("/api/exam/sessions/{session_id}/submit"),
                token,
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, board) = app
        .get(&format!("/api/tests/{test_id}/leaderboard"), &educator)
        .await;
    assert_eq!(status, StatusCode::OK, "{board}");
    let ranks: Vec<(i64, f64)> = board["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .map(|e| {
            (
                e["rank"].as_i64().expect("rank"),
                e["score"].as_f64().expect("score"),
            )
        })
        .collect();
    assert_eq!(ranks, vec![(1, 6.0), (1, 6.0), (3, 1.0)]);
}

#[tokio::test]
async fn test_answer_for_unknown_question_is_rejected() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, mcq, _) = app.published_test(&educator, 30, false).await;

    let (_, session) = app
        .post("/api/exam/start", &student, json!({ "test_id": test_id }))
        .await;
    let session_id = session["id"].as_str().expect("session id");
    let stranger = "00000000-0000-4000-8000-000000000000";

    let (status, body) = app
        .put(
            &format!("/api/exam/sessions/{session_id}/answers"),
            &student,
            json!({ "answers": { mcq.clone(): "4", stranger: "1" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .put(
            &format!("/api/exam/sessions/{session_id}/answers"),
            &student,
            json!({ "answers": {}, "marked_for_review": [stranger] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // nothing from the rejected saves was stored
    let (_, current) = app
        .get(&format!("/api/exam/sessions/{session_id}"), &student)
        .await;
    assert_eq!(current["answers"], json!({}));
}

#[tokio::test]
async fn test_concurrent_starts_share_one_session() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, _, _) = app.published_test(&educator, 30, false).await;

    let body = json!({ "test_id": test_id });
    let ((first_status, first), (second_status, second)) = tokio::join!(
        app.post("/api/exam/start", &student, body.clone()),
        app.post("/api/exam/start", &student, body.clone()),
    );
    assert_eq!(first_status, StatusCode::CREATED, "{first}");
    assert_eq!(second_status, StatusCode::CREATED, "{second}");
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["is_first_attempt"], true);
    assert_eq!(second["is_first_attempt"], true);

    let (_, mine) = app.get("/api/exam/sessions", &student).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1), "{mine}");
}

#[tokio::test]
async fn test_database_allows_one_running_session_per_test() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, _, _) = app.published_test(&educator, 30, true).await;

    let (_, session) = app
        .post("/api/exam/start", &student, json!({ "test_id": test_id }))
        .await;
    let student_id = session["student_id"].as_str().expect("student id");

    let now = app.clock.now();
    let duplicate = exam_session::ActiveModel {
        id: Set(ExamSessionId::new().to_string()),
        test_id: Set(test_id.clone()),
        student_id: Set(student_id.to_string()),
        status: Set(0),
        answers: Set("{}".to_string()),
        marked_for_review: Set("[]".to_string()),
        start_time: Set(now),
        end_time: Set(None),
        score: Set(None),
        is_first_attempt: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&app.db)
    .await
    .expect_err("a second running session must be refused");
    assert!(matches!(
        duplicate.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));

    // a finished session frees the slot for a retake
    let session_id = session["id"].as_str().expect("session id");
    app.advance(Duration::minutes(5));
    app.post(
        &format!("/api/exam/sessions/{session_id}/submit"),
        &student,
        json!({}),
    )
    .await;

    let stored = exam_session::Entity::find_by_id(session_id.to_string())
        .one(&app.db)
        .await
        .expect("query should run")
        .expect("session row");
    assert_eq!(stored.created_at, now);
    assert_eq!(stored.updated_at, now + Duration::minutes(5));
    let (status, retake) = app
        .post("/api/exam/start", &student, json!({ "test_id": test_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{retake}");
    assert_ne!(retake["id"], session["id"]);
    assert_eq!(retake["is_first_attempt"], false);
}
