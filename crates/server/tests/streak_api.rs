mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::spawn_app;
use coursehub_core::domain::{BadgeId, UserId};
use coursehub_server::clock::Clock;
use coursehub_server::repository::streak_repository::{SeaOrmStreakRepository, StreakRepository};
use serde_json::{Value, json};
use std::str::FromStr;

async fn badge(app: &common::TestApp, admin: &str, name: &str, metric: &str, days: i32) -> Value {
    let (status, body) = app
        .post(
            "/api/streaks/badges",
            admin,
            json!({ "name": name, "metric": metric, "milestone_days": days }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn test_streak_grows_on_consecutive_days() {
    let app = spawn_app().await;
    let student = app.user("sam", "student").await;

    let (status, first) = app.post("/api/streaks/activity", &student, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["outcome"], "started");

    let (_, again) = app.post("/api/streaks/activity", &student, json!({})).await;
    assert_eq!(again["outcome"], "already_recorded");
    assert_eq!(again["streak"]["total_active_days"], 1);

    app.advance(Duration::days(1));
    let (_, next) = app.post("/api/streaks/activity", &student, json!({})).await;
    assert_eq!(next["outcome"], "extended");
    assert_eq!(next["streak"]["current_streak"], 2);
    assert_eq!(next["streak"]["longest_streak"], 2);
}

#[tokio::test]
async fn test_missed_day_is_bridged_once() {
    let app = spawn_app().await;
    let student = app.user("sam", "student").await;

    app.post("/api/streaks/activity", &student, json!({})).await;
    app.advance(Duration::days(2));
    let (_, frozen) = app.post("/api/streaks/activity", &student, json!({})).await;
    assert_eq!(frozen["outcome"], "frozen");
    assert_eq!(frozen["streak"]["current_streak"], 2);
    assert_eq!(frozen["streak"]["freeze_used"], true);

    app.advance(Duration::days(2));
    let (_, reset) = app.post("/api/streaks/activity", &student, json!({})).await;
    assert_eq!(reset["outcome"], "reset");
    assert_eq!(reset["streak"]["current_streak"], 1);
    assert_eq!(reset["streak"]["longest_streak"], 2);
}

#[tokio::test]
async fn test_shown_streak_drops_after_a_long_gap() {
    let app = spawn_app().await;
    let student = app.user("sam", "student").await;
    app.post("/api/streaks/activity", &student, json!({})).await;

    app.advance(Duration::days(5));
    let (status, streak) = app.get("/api/streaks", &student).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(streak["current_streak"], 0);
    assert_eq!(streak["longest_streak"], 1);
    assert_eq!(streak["total_active_days"], 1);
}

#[tokio::test]
async fn test_default_badges_are_seeded() {
    let app = spawn_app().await;
    let student = app.user("sam", "student").await;

    let (status, badges) = app.get("/api/streaks/badges", &student).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = badges
        .as_array()
        .expect("badges")
        .iter()
        .filter_map(|b| b["name"].as_str())
        .collect();
    assert!(names.contains(&"Warming Up"));
    assert!(names.contains(&"Centurion"));
}

#[tokio::test]
async fn test_badges_are_awarded_once_and_marked_seen() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.user("sam", "student").await;
    badge(&app, &admin, "Getting started", "active_days", 1).await;
    badge(&app, &admin, "Two in a row", "streak", 2).await;

    let (_, first) = app.post("/api/streaks/activity", &student, json!({})).await;
    let new_badges = first["new_badges"].as_array().expect("new badges");
    assert_eq!(new_badges.len(), 1);
    assert_eq!(new_badges[0]["badge"]["name"], "Getting started");

    let (_, repeat) = app.post("/api/streaks/activity", &student, json!({})).await;
    assert_eq!(repeat["new_badges"], json!([]));

    app.advance(Duration::days(1));
    let (_, second) = app.post("/api/streaks/activity", &student, json!({})).await;
    assert_eq!(second["new_badges"][0]["badge"]["name"], "Two in a row");

    let (_, mine) = app.get("/api/streaks/badges/mine", &student).await;
    let mine = mine.as_array().expect("earned badges");
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|b| b["is_new"] == true));

    let (status, _) = app.post("/api/streaks/badges/seen", &student, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, mine) = app.get("/api/streaks/badges/mine", &student).await;
    assert!(
        mine.as_array()
            .expect("earned badges")
            .iter()
            .all(|b| b["is_new"] == false)
    );
}

#[tokio::test]
async fn test_only_admins_manage_badges() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.user("sam", "student").await;

    let (status, _) = app
        .post(
            "/api/streaks/badges",
            &student,
            json!({ "name": "Cheat", "metric": "streak", "milestone_days": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/api/streaks/badges",
            &admin,
            json!({ "name": "Zero", "metric": "streak", "milestone_days": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let created = badge(&app, &admin, "Week", "streak", 7).await;
    let (status, _) = app
        .post(
            "/api/streaks/badges",
            &admin,
            json!({ "name": "Week", "metric": "streak", "milestone_days": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let id = created["id"].as_str().expect("badge id");
    let (status, _) = app.delete(&format!("/api/streaks/badges/{id}"), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, badges) = app.get("/api/streaks/badges", &student).await;
    let badges = badges.as_array().expect("badges");
    assert!(!badges.is_empty());
    assert!(badges.iter().all(|b| b["name"] != "Week"));
}

#[tokio::test]
async fn test_submitting_an_exam_counts_as_activity() {
    let app = spawn_app().await;
    let educator = app.user("prof", "educator").await;
    let student = app.user("sam", "student").await;
    let (test_id, _, _) = app.published_test(&educator, 30, false).await;

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

    let (_, streak) = app.get("/api/streaks", &student).await;
    assert_eq!(streak["current_streak"], 1);
    assert_eq!(streak["last_activity_date"], "2026-03-02");
}

#[tokio::test]
async fn test_badge_awarded_twice_is_inserted_once() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.user("sam", "student").await;
    let created = badge(&app, &admin, "Getting started", "active_days", 1).await;
    let badge_id =
        BadgeId::from_str(created["id"].as_str().expect("badge id")).expect("valid badge id");
    let (_, me) = app.get("/api/users/me", &student).await;
    let user_id = UserId::from_str(me["id"].as_str().expect("user id")).expect("valid user id");

    let store = SeaOrmStreakRepository::new(app.db.clone());
    let now = app.clock.now();
    let first = store
        .award(user_id, &[badge_id], now)
        .await
        .expect("first award should succeed");
    let second = store
        .award(user_id, &[badge_id], now)
        .await
        .expect("repeated award should succeed");

    assert_eq!(first, vec![badge_id]);
    assert!(second.is_empty());

    // the activity call sees the badge as held and reports nothing new
    let (_, activity) = app.post("/api/streaks/activity", &student, json!({})).await;
    assert_eq!(activity["new_badges"], json!([]));
}

#[tokio::test]
async fn test_concurrent_activity_reports_each_badge_once() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let student = app.user("sam", "student").await;
    badge(&app, &admin, "Getting started", "active_days", 1).await;

    let ((_, first), (_, second)) = tokio::join!(
        app.post("/api/streaks/activity", &student, json!({})),
        app.post("/api/streaks/activity", &student, json!({})),
    );
    let reported = [&first, &second]
        .iter()
        .flat_map(|r| r["new_badges"].as_array().cloned().unwrap_or_default())
        .filter(|b| b["badge"]["name"] == "Getting started")
        .count();
    assert_eq!(reported, 1, "{first} {second}");

    let (_, mine) = app.get("/api/streaks/badges/mine", &student).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
}
