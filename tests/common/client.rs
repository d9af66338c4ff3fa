//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with methods for all tracklit-server endpoints. When API
//! routes or request formats change, update only this file.
#![allow(dead_code)] // Not every test binary uses every helper

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Sleeps long enough for any pending debounced write to commit.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(DEBOUNCE_SETTLE_MS)).await;
    }

    // ========================================================================
    // Collection Endpoints
    // ========================================================================

    /// POST /v1/collection/{user}/items with an arbitrary item body
    pub async fn add_item(&self, user: &str, body: Value) -> Response {
        self.client
            .post(format!("{}/v1/collection/{}/items", self.base_url, user))
            .json(&body)
            .send()
            .await
            .expect("Add item request failed")
    }

    /// Adds a bare movie with no rating or dates
    pub async fn add_movie(&self, user: &str, media_id: i64) -> Response {
        self.add_item(user, json!({"mediaId": media_id, "mediaType": "movie"}))
            .await
    }

    /// GET /v1/collection/{user}/items
    pub async fn get_items(&self, user: &str) -> Response {
        self.client
            .get(format!("{}/v1/collection/{}/items", self.base_url, user))
            .send()
            .await
            .expect("List items request failed")
    }

    /// GET /v1/collection/{user}/items/{media_id}
    pub async fn get_item(&self, user: &str, media_id: i64) -> Response {
        self.client
            .get(format!(
                "{}/v1/collection/{}/items/{}",
                self.base_url, user, media_id
            ))
            .send()
            .await
            .expect("Get item request failed")
    }

    /// PATCH /v1/collection/{user}/items/{media_id}/rating
    pub async fn patch_rating(&self, user: &str, media_id: i64, rating: u8) -> Response {
        self.patch_rating_raw(user, media_id, json!({"rating": rating}))
            .await
    }

    /// PATCH rating with an arbitrary body (for validation tests)
    pub async fn patch_rating_raw(&self, user: &str, media_id: i64, body: Value) -> Response {
        self.client
            .patch(format!(
                "{}/v1/collection/{}/items/{}/rating",
                self.base_url, user, media_id
            ))
            .json(&body)
            .send()
            .await
            .expect("Patch rating request failed")
    }

    /// PATCH /v1/collection/{user}/items/{media_id}/dates
    pub async fn patch_dates(
        &self,
        user: &str,
        media_id: i64,
        start_date: Option<&str>,
        completion_date: Option<&str>,
    ) -> Response {
        let mut body = serde_json::Map::new();
        if let Some(date) = start_date {
            body.insert("startDate".to_string(), json!(date));
        }
        if let Some(date) = completion_date {
            body.insert("completionDate".to_string(), json!(date));
        }
        self.client
            .patch(format!(
                "{}/v1/collection/{}/items/{}/dates",
                self.base_url, user, media_id
            ))
            .json(&Value::Object(body))
            .send()
            .await
            .expect("Patch dates request failed")
    }

    /// PATCH /v1/collection/{user}/items/{media_id}/note
    pub async fn patch_note(&self, user: &str, media_id: i64, note: &str) -> Response {
        self.client
            .patch(format!(
                "{}/v1/collection/{}/items/{}/note",
                self.base_url, user, media_id
            ))
            .json(&json!({"note": note}))
            .send()
            .await
            .expect("Patch note request failed")
    }

    /// DELETE /v1/collection/{user}/items/{media_id}
    pub async fn delete_item(&self, user: &str, media_id: i64) -> Response {
        self.client
            .delete(format!(
                "{}/v1/collection/{}/items/{}",
                self.base_url, user, media_id
            ))
            .send()
            .await
            .expect("Delete item request failed")
    }

    // ========================================================================
    // Stats & Achievements Endpoints
    // ========================================================================

    /// GET /v1/user/{user}/stats
    pub async fn get_stats(&self, user: &str) -> Response {
        self.client
            .get(format!("{}/v1/user/{}/stats", self.base_url, user))
            .send()
            .await
            .expect("Get stats request failed")
    }

    /// GET /v1/user/{user}/stats, parsed
    pub async fn get_stats_json(&self, user: &str) -> Value {
        let response = self.get_stats(user).await;
        assert!(response.status().is_success());
        response.json().await.expect("Stats response was not JSON")
    }

    /// GET /v1/user/{user}/achievements
    pub async fn get_achievements(&self, user: &str) -> Response {
        self.client
            .get(format!("{}/v1/user/{}/achievements", self.base_url, user))
            .send()
            .await
            .expect("Get achievements request failed")
    }

    /// GET /v1/user/{user}/achievements, parsed
    pub async fn get_achievements_json(&self, user: &str) -> Vec<Value> {
        let response = self.get_achievements(user).await;
        assert!(response.status().is_success());
        response
            .json()
            .await
            .expect("Achievements response was not JSON")
    }

    /// Finds one achievement by id in a parsed achievements response
    pub fn achievement<'a>(achievements: &'a [Value], id: &str) -> &'a Value {
        achievements
            .iter()
            .find(|a| a["id"] == id)
            .unwrap_or_else(|| panic!("Achievement {} missing from response", id))
    }
}
