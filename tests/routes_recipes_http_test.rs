// ABOUTME: HTTP integration tests for recipe generation, bookmarks, feedback, search and detail
// ABOUTME: Runs the real pipeline over scripted model and nutrition doubles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use common::TestServices;
use helpers::axum_test::AxumTestRequest;
use helpers::mocks::{serving, MockIdentity, MockLlm, MockNutrition, MockOcr};
use mealwise_server::database::RecipeSearchFilters;
use mealwise_server::resources::ServerResources;
use serde_json::{json, Value};

const TOKEN: &str = "alice-token";

const SKELETON: &str = r#"{
  "title": "Kimchi Fried Rice",
  "description": "Spicy fried rice with aged kimchi.",
  "ingredients": ["rice: 300 grams", "kimchi: 150 grams"],
  "instructions": ["Fry the kimchi.", "Add rice and toss."],
  "cookingTime": "20 minutes",
  "skillLevel": "easy"
}"#;

const NUTRITION: &str =
    r#"{"nutritionFacts": {"calories": 410, "protein": 9, "carbs": 78, "fat": 7}}"#;

async fn resources(llm: MockLlm) -> Arc<ServerResources> {
    common::create_test_resources(TestServices {
        identity: Arc::new(
            MockIdentity::new()
                .with_user(TOKEN, "alice", "alice@example.com")
                .with_user("bob-token", "bob", "bob@example.com"),
        ),
        llm: Arc::new(llm),
        nutrition: Arc::new(MockNutrition::new().with_food(
            "rice",
            "10",
            "Rice, white, cooked",
            vec![serving("100 g", "130", "2.7", "28", "0.3")],
        )),
        ocr: Arc::new(MockOcr::returning("")),
    })
    .await
}

fn requirements() -> Value {
    json!({
        "meal_type": "lunch",
        "cuisine_type": "Korean",
        "dietary_restrictions": [],
        "allergies": ["shellfish"],
        "servings": 2,
        "ingredients": ["kimchi"]
    })
}

async fn generate(resources: &Arc<ServerResources>) -> Value {
    let body: Value = AxumTestRequest::post("/api/recipe/generate")
        .bearer(TOKEN)
        .json(&requirements())
        .send(common::test_router(resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    body["data"].clone()
}

#[tokio::test]
async fn test_generate_returns_persisted_recipe() {
    let resources = resources(MockLlm::replying(&[SKELETON, NUTRITION])).await;

    let recipe = generate(&resources).await;

    assert_eq!(recipe["title"], "Kimchi Fried Rice");
    assert_eq!(recipe["userId"], "alice");
    assert_eq!(recipe["mealType"], "lunch");
    assert_eq!(recipe["cookingTime"], "20 minutes");
    assert_eq!(recipe["nutritionFacts"]["calories"], 410.0);
    assert_eq!(recipe["requiredIngredients"], json!(["kimchi"]));

    let id = recipe["id"].as_str().unwrap();
    let stored = resources.database.recipes().get_recipe(id).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_generate_requires_authentication() {
    let resources = resources(MockLlm::replying(&[SKELETON, NUTRITION])).await;

    let body: Value = AxumTestRequest::post("/api/recipe/generate")
        .json(&requirements())
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();

    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_generate_checks_authentication_before_body() {
    let resources = resources(MockLlm::replying(&[SKELETON, NUTRITION])).await;

    let body: Value = AxumTestRequest::post("/api/recipe/generate")
        .json(&json!({"servings": "two"}))
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();

    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_generate_malformed_body_uses_error_envelope() {
    let resources = resources(MockLlm::replying(&[SKELETON, NUTRITION])).await;

    let body: Value = AxumTestRequest::post("/api/recipe/generate")
        .bearer(TOKEN)
        .json(&json!({"servings": "two"}))
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();

    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_generate_rejects_zero_servings() {
    let resources = resources(MockLlm::replying(&[SKELETON, NUTRITION])).await;
    let mut invalid = requirements();
    invalid["servings"] = json!(0);

    let body: Value = AxumTestRequest::post("/api/recipe/generate")
        .bearer(TOKEN)
        .json(&invalid)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();

    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_generate_parse_failure_is_generation_error() {
    let resources = resources(MockLlm::replying(&["Sorry, I can't help with that"])).await;

    let body: Value = AxumTestRequest::post("/api/recipe/generate")
        .bearer(TOKEN)
        .json(&requirements())
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .json();

    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "RECIPE_GENERATION_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Failed to parse generated recipe"));

    let all = resources
        .database
        .recipes()
        .search(&RecipeSearchFilters::default())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_save_and_list_saved_recipes() {
    let resources = resources(MockLlm::replying(&[SKELETON, NUTRITION])).await;
    let recipe = generate(&resources).await;
    let id = recipe["id"].as_str().unwrap();

    let body: Value = AxumTestRequest::post("/api/recipe/save")
        .bearer(TOKEN)
        .json(&json!({"recipe_id": id}))
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["data"]["recipe_id"], id);

    let body: Value = AxumTestRequest::get("/api/recipe/saved")
        .bearer(TOKEN)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["data"]["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["recipes"][0]["id"], id);

    let body: Value = AxumTestRequest::get("/api/recipe/saved")
        .bearer("bob-token")
        .send(common::test_router(&resources))
        .await
        .json();
    assert!(body["data"]["recipes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_save_unknown_recipe_is_404() {
    let resources = resources(MockLlm::replying(&[])).await;

    let body: Value = AxumTestRequest::post("/api/recipe/save")
        .bearer(TOKEN)
        .json(&json!({"recipe_id": "missing"}))
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .json();

    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn test_feedback_and_search_average_rating() {
    let resources = resources(MockLlm::replying(&[SKELETON, NUTRITION])).await;
    let recipe = generate(&resources).await;
    let id = recipe["id"].as_str().unwrap();

    let body: Value = AxumTestRequest::post("/api/recipe/feedback")
        .bearer(TOKEN)
        .json(&json!({"recipe_id": id, "rating": 4, "comments": "great", "issues": []}))
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(body["data"]["feedback_id"].is_string());

    AxumTestRequest::post("/api/recipe/feedback")
        .bearer(TOKEN)
        .json(&json!({"recipe_id": id, "rating": 9}))
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    for rating in [300, -1] {
        let body: Value = AxumTestRequest::post("/api/recipe/feedback")
            .bearer(TOKEN)
            .json(&json!({"recipe_id": id, "rating": rating}))
            .send(common::test_router(&resources))
            .await
            .assert_status(StatusCode::BAD_REQUEST)
            .json();
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(body["error"]["message"], "rating must be between 1 and 5");
    }

    let body: Value = AxumTestRequest::get("/api/recipe/search?query=kimchi&cuisineType=korean")
        .bearer(TOKEN)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    let hits = body["data"]["recipes"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], id);
    assert_eq!(hits[0]["averageRating"], 4.0);

    let body: Value = AxumTestRequest::get("/api/recipe/search?mealType=dinner")
        .bearer(TOKEN)
        .send(common::test_router(&resources))
        .await
        .json();
    assert!(body["data"]["recipes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recipe_detail() {
    let resources = resources(MockLlm::replying(&[SKELETON, NUTRITION])).await;
    let recipe = generate(&resources).await;
    let id = recipe["id"].as_str().unwrap();

    let body: Value = AxumTestRequest::get(&format!("/api/recipe/{id}"))
        .bearer("bob-token")
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["data"], recipe);

    AxumTestRequest::get("/api/recipe/does-not-exist")
        .bearer(TOKEN)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
