use axum::http::{Method, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use super::test_utils::{mock_authenticated_request, mock_request, setup_test_app};

const OWNER: &str = "owner_user_id";

async fn create_poll(app: &Router, multiple: bool, options: &[&str]) -> Value {
    let body = json!({
        "title": "Favourite language",
        "description": "Pick one",
        "allowMultipleVotes": multiple,
        "expiresAt": (Utc::now() + Duration::days(1)).to_rfc3339(),
        "options": options,
    });
    let (status, response) =
        mock_authenticated_request(app, "/api/polls", Method::POST, Some(body), OWNER).await;
    assert_eq!(status, StatusCode::CREATED);
    response["data"].clone()
}

fn option_id(poll: &Value, index: usize) -> String {
    poll["options"][index]["id"].as_str().unwrap().to_string()
}

fn poll_id(poll: &Value) -> String {
    poll["id"].as_str().unwrap().to_string()
}

async fn vote(app: &Router, poll: &str, option: &str, user: &str) -> (StatusCode, Value) {
    mock_authenticated_request(
        app,
        &format!("/api/polls/{poll}/vote"),
        Method::POST,
        Some(json!({ "optionId": option })),
        user,
    )
    .await
}

#[tokio::test]
async fn test_poll_crud_operations() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["Rust", "Go", "Zig"]).await;
    let id = poll_id(&poll);
    assert_eq!(poll["createdBy"], OWNER);
    assert_eq!(poll["isActive"], true);
    assert_eq!(poll["options"].as_array().unwrap().len(), 3);
    assert_eq!(poll["results"]["totalVotes"], 0);

    // Get Poll by ID is public
    let (status, response) =
        mock_request(&app, &format!("/api/polls/{id}"), Method::GET, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["title"], "Favourite language");

    // Update Poll
    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}"),
        Method::PATCH,
        Some(json!({ "title": "Favourite systems language", "allowMultipleVotes": true })),
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["title"], "Favourite systems language");
    assert_eq!(response["data"]["allowMultipleVotes"], true);

    // Listing and managing
    let (status, response) = mock_request(&app, "/api/polls", Method::GET, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"].as_array().unwrap().len(), 1);
    assert_eq!(response["data"][0]["optionCount"], 3);

    let (status, response) =
        mock_authenticated_request(&app, "/api/polls/manage", Method::GET, None, "someone_else")
            .await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["data"].as_array().unwrap().is_empty());

    // Delete Poll
    let (status, _) =
        mock_authenticated_request(&app, &format!("/api/polls/{id}"), Method::DELETE, None, OWNER)
            .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) =
        mock_request(&app, &format!("/api/polls/{id}"), Method::GET, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "PollNotFound");
    assert_eq!(response["success"], false);
}

#[tokio::test]
async fn test_poll_validation() {
    let app = setup_test_app();

    let one_option = json!({ "title": "Lonely", "options": ["Only", "   "] });
    let (status, response) =
        mock_authenticated_request(&app, "/api/polls", Method::POST, Some(one_option), OWNER).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "ValidationFailed");

    let expired = json!({
        "title": "Too late",
        "expiresAt": (Utc::now() - Duration::days(1)).to_rfc3339(),
        "options": ["A", "B"],
    });
    let (status, _) =
        mock_authenticated_request(&app, "/api/polls", Method::POST, Some(expired), OWNER).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let anonymous = json!({ "title": "Nobody", "options": ["A", "B"] });
    let (status, response) =
        mock_request(&app, "/api/polls", Method::POST, Some(anonymous), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error"], "Unauthenticated");
}

#[tokio::test]
async fn test_only_owner_manages_poll() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["A", "B"]).await;
    let id = poll_id(&poll);

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}"),
        Method::PATCH,
        Some(json!({ "isActive": false })),
        "intruder",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["error"], "Forbidden");

    let (status, _) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/options"),
        Method::POST,
        Some(json!({ "text": "C" })),
        "intruder",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_option_management() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["A", "B"]).await;
    let id = poll_id(&poll);

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/options"),
        Method::POST,
        Some(json!({ "text": "C" })),
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let added = response["data"]["id"].as_str().unwrap().to_string();

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/options/{added}"),
        Method::PATCH,
        Some(json!({ "text": "Sea" })),
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["text"], "Sea");

    let (status, _) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/options/{added}"),
        Method::DELETE,
        None,
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // down to the minimum again
    let first = option_id(&poll, 0);
    let (status, _) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/options/{first}"),
        Method::DELETE,
        None,
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/options/missing"),
        Method::PATCH,
        Some(json!({ "text": "X" })),
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "OptionNotFound");
}

#[tokio::test]
async fn test_single_vote_poll() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["A", "B"]).await;
    let id = poll_id(&poll);
    let (a, b) = (option_id(&poll, 0), option_id(&poll, 1));

    let (status, response) = vote(&app, &id, &a, "voter_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["totalVotes"], 1);
    assert_eq!(response["data"]["leadingOptionId"], a.as_str());
    assert_eq!(response["data"]["options"][0]["percentage"], 100);

    let (status, response) = vote(&app, &id, &b, "voter_1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "SingleVoteExceeded");

    let (status, response) = vote(&app, &id, &a, "voter_1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "DuplicateOption");

    let (status, response) = vote(&app, &id, "not-an-option", "voter_1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "InvalidOption");

    let (status, response) = vote(&app, &id, &b, "voter_2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["totalVotes"], 2);
    assert_eq!(response["data"]["uniqueVoters"], 2);
    // ties go to the first option
    assert_eq!(response["data"]["leadingOptionId"], a.as_str());
    assert_eq!(response["data"]["options"][0]["percentage"], 50);
    assert_eq!(response["data"]["options"][1]["percentage"], 50);
}

#[tokio::test]
async fn test_multiple_vote_poll_and_retraction() {
    let app = setup_test_app();
    let poll = create_poll(&app, true, &["A", "B", "C"]).await;
    let id = poll_id(&poll);
    let (a, b) = (option_id(&poll, 0), option_id(&poll, 1));

    assert_eq!(vote(&app, &id, &a, "voter_1").await.0, StatusCode::OK);
    let (status, response) = vote(&app, &id, &b, "voter_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["totalVotes"], 2);
    assert_eq!(response["data"]["uniqueVoters"], 1);

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/votes/me"),
        Method::GET,
        None,
        "voter_1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["votes"].as_array().unwrap().len(), 2);
    assert_eq!(response["data"]["eligibility"]["allowed"], true);

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/vote?optionId={a}"),
        Method::DELETE,
        None,
        "voter_1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["totalVotes"], 1);

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/vote?optionId={a}"),
        Method::DELETE,
        None,
        "voter_1",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "VoteNotFound");
}

#[tokio::test]
async fn test_vote_requires_identity() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["A", "B"]).await;
    let id = poll_id(&poll);
    let a = option_id(&poll, 0);

    let (status, response) = mock_request(
        &app,
        &format!("/api/polls/{id}/vote"),
        Method::POST,
        Some(json!({ "optionId": a })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error"], "Unauthenticated");

    let (status, response) = mock_request(
        &app,
        &format!("/api/polls/{id}/vote"),
        Method::POST,
        Some(json!({ "optionId": a })),
        Some("not.a.jwt"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error"], "InvalidToken");

    // unknown polls are reported before identity
    let (status, response) = mock_request(
        &app,
        "/api/polls/does-not-exist/vote",
        Method::POST,
        Some(json!({ "optionId": a })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "PollNotFound");

    let (status, response) = vote(&app, &id, "  ", "voter_1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "ValidationFailed");
}

#[tokio::test]
async fn test_closed_poll_rejects_votes() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["A", "B"]).await;
    let id = poll_id(&poll);
    let a = option_id(&poll, 0);

    let (status, _) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}"),
        Method::PATCH,
        Some(json!({ "isActive": false })),
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = vote(&app, &id, &a, "voter_1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "PollClosed");

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}/votes/me"),
        Method::GET,
        None,
        "voter_1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["eligibility"]["reason"], "PollClosed");
}

#[tokio::test]
async fn test_poll_results_are_public() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["A", "B", "C"]).await;
    let id = poll_id(&poll);
    let (a, b) = (option_id(&poll, 0), option_id(&poll, 1));

    for (user, option) in [("u1", &b), ("u2", &b), ("u3", &a)] {
        assert_eq!(vote(&app, &id, option, user).await.0, StatusCode::OK);
    }

    let (status, response) =
        mock_request(&app, &format!("/api/polls/{id}/results"), Method::GET, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let results = &response["data"];
    assert_eq!(results["totalVotes"], 3);
    assert_eq!(results["leadingOptionId"], b.as_str());
    assert_eq!(results["options"][0]["option"]["id"], b.as_str());
    assert_eq!(results["options"][0]["percentage"], 67);
    assert_eq!(results["options"][1]["percentage"], 33);
    assert_eq!(results["options"][2]["votes"], 0);

    let (status, _) =
        mock_request(&app, "/api/polls/missing/results", Method::GET, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app();
    let (status, response) = mock_request(&app, "/health", Method::GET, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["status"], "ok");
}

#[tokio::test]
async fn test_null_expiry_reopens_poll() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["A", "B"]).await;
    let id = poll_id(&poll);
    let a = option_id(&poll, 0);

    let (status, _) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}"),
        Method::PATCH,
        Some(json!({ "expiresAt": (Utc::now() - Duration::minutes(1)).to_rfc3339() })),
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vote(&app, &id, &a, "voter_1").await.1["error"], "PollClosed");

    let (status, response) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}"),
        Method::PATCH,
        Some(json!({ "expiresAt": null })),
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["expiresAt"], Value::Null);

    assert_eq!(vote(&app, &id, &a, "voter_1").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_public_listing_hides_deactivated_polls() {
    let app = setup_test_app();
    let poll = create_poll(&app, false, &["A", "B"]).await;
    let id = poll_id(&poll);

    let (_, response) = mock_request(&app, "/api/polls?public=true", Method::GET, None, None).await;
    assert_eq!(response["data"].as_array().unwrap().len(), 1);

    let (status, _) = mock_authenticated_request(
        &app,
        &format!("/api/polls/{id}"),
        Method::PATCH,
        Some(json!({ "isActive": false })),
        OWNER,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) =
        mock_request(&app, "/api/polls?public=true", Method::GET, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["data"].as_array().unwrap().is_empty());

    // the owner still manages it
    let (_, response) =
        mock_authenticated_request(&app, "/api/polls/manage", Method::GET, None, OWNER).await;
    assert_eq!(response["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_live_results_for_unknown_poll_is_not_found() {
    let app = setup_test_app();
    let (status, response) = mock_request(
        &app,
        "/api/polls/missing/results?live=true",
        Method::GET,
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "PollNotFound");
}
