mod common;

use common::{spawn_app, sync_user, TestApp};
use serde_json::{json, Value};

async fn create_conversation(app: &TestApp, token: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/conversations", app.address))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    let status = response.status().as_u16();
    let body = response.json::<Value>().await.expect("invalid json body");
    (status, body)
}

async fn send_message(app: &TestApp, token: &str, conversation_id: &str, content: &str) -> u16 {
    reqwest::Client::new()
        .post(format!(
            "{}/conversations/{}/messages",
            app.address, conversation_id
        ))
        .bearer_auth(token)
        .json(&json!({ "content": content }))
        .send()
        .await
        .expect("Failed to execute request.")
        .status()
        .as_u16()
}

async fn get_history(app: &TestApp, token: &str, conversation_id: &str, query: &str) -> Value {
    let response = reqwest::Client::new()
        .get(format!(
            "{}/conversations/{}/messages{}",
            app.address, conversation_id, query
        ))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 200);
    response.json::<Value>().await.expect("invalid json body")
}

async fn get_detail(app: &TestApp, token: &str, conversation_id: &str) -> (u16, Value) {
    let response = reqwest::Client::new()
        .get(format!("{}/conversations/{}", app.address, conversation_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request.");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

fn agent_participant(detail: &Value) -> Option<Value> {
    detail["participants"]
        .as_array()
        .expect("participants missing")
        .iter()
        .find(|p| p["role"] == "agent")
        .cloned()
}

#[actix_web::test]
async fn create_assigns_agent_and_reuses_active_conversation() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let agent_token = TestApp::token("agent-a", "amira", "agent");
    let user_token = TestApp::token("user-1", "kim", "user");
    sync_user(&app, &agent_token).await;

    // Scenario A: first contact creates, assigns the idle agent, announces it
    let (status, body) = create_conversation(&app, &user_token, json!({})).await;
    assert_eq!(status, 201);
    assert_eq!(body["item"]["created"], true);

    let conversation = &body["item"]["conversation"];
    let conversation_id = conversation["id"].as_str().expect("missing id").to_string();

    let agent = agent_participant(conversation).expect("no agent assigned");
    assert_eq!(agent["user"]["id"], "agent-a");

    let announcements: Vec<&str> = conversation["recent_messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["message_type"] == "system")
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(announcements, vec!["Agent amira has joined the conversation."]);

    // Scenario B: a second create before closing reuses the conversation
    let (status, body) = create_conversation(&app, &user_token, json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["item"]["created"], false);
    assert_eq!(body["item"]["conversation"]["id"], conversation_id.as_str());
}

#[actix_web::test]
async fn conversation_proceeds_unassigned_when_no_agents_exist() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let user_token = TestApp::token("user-1", "kim", "user");

    let (status, body) = create_conversation(&app, &user_token, json!({})).await;
    assert_eq!(status, 201);
    assert_eq!(body["item"]["created"], true);
    assert!(agent_participant(&body["item"]["conversation"]).is_none());
}

#[actix_web::test]
async fn least_loaded_agent_wins_with_lowest_id_tie_break() {
    let Some(app) = spawn_app().await else {
        return;
    };
    sync_user(&app, &TestApp::token("agent-a", "amira", "agent")).await;
    sync_user(&app, &TestApp::token("agent-b", "bodhi", "agent")).await;

    let (_, first) =
        create_conversation(&app, &TestApp::token("user-1", "kim", "user"), json!({})).await;
    let first_agent = agent_participant(&first["item"]["conversation"]).expect("no agent");
    assert_eq!(first_agent["user"]["id"], "agent-a");

    let (_, second) =
        create_conversation(&app, &TestApp::token("user-2", "lena", "user"), json!({})).await;
    let second_agent = agent_participant(&second["item"]["conversation"]).expect("no agent");
    assert_eq!(second_agent["user"]["id"], "agent-b");
}

#[actix_web::test]
async fn requested_agent_is_honored() {
    let Some(app) = spawn_app().await else {
        return;
    };
    sync_user(&app, &TestApp::token("agent-a", "amira", "agent")).await;
    sync_user(&app, &TestApp::token("agent-b", "bodhi", "agent")).await;

    let (_, body) = create_conversation(
        &app,
        &TestApp::token("user-1", "kim", "user"),
        json!({ "agent_id": "agent-b" }),
    )
    .await;
    let agent = agent_participant(&body["item"]["conversation"]).expect("no agent");
    assert_eq!(agent["user"]["id"], "agent-b");
}

#[actix_web::test]
async fn sent_messages_round_trip_through_history_in_order() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let user_token = TestApp::token("user-1", "kim", "user");
    let (_, body) = create_conversation(&app, &user_token, json!({})).await;
    let conversation_id = body["item"]["conversation"]["id"].as_str().unwrap().to_string();

    for content in ["first", "second", "third"] {
        assert_eq!(send_message(&app, &user_token, &conversation_id, content).await, 201);
    }

    let history = get_history(&app, &user_token, &conversation_id, "").await;
    let list = history["list"].as_array().expect("list missing");

    let contents: Vec<&str> = list.iter().map(|m| m["content"].as_str().unwrap()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);

    let timestamps: Vec<&str> = list
        .iter()
        .map(|m| m["created_at"].as_str().unwrap())
        .collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted, "history must be non-decreasing by creation time");

    for message in list {
        assert_eq!(message["sender"]["id"], "user-1");
    }
}

#[actix_web::test]
async fn history_pagination_is_strictly_before_the_anchor() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let user_token = TestApp::token("user-1", "kim", "user");
    let (_, body) = create_conversation(&app, &user_token, json!({})).await;
    let conversation_id = body["item"]["conversation"]["id"].as_str().unwrap().to_string();

    for content in ["one", "two", "three", "four"] {
        send_message(&app, &user_token, &conversation_id, content).await;
    }

    let full = get_history(&app, &user_token, &conversation_id, "").await;
    let all = full["list"].as_array().unwrap().clone();
    let anchor = all.last().unwrap();
    let anchor_id = anchor["id"].as_str().unwrap();
    let anchor_created_at = anchor["created_at"].as_str().unwrap();

    let page = get_history(
        &app,
        &user_token,
        &conversation_id,
        &format!("?before={}&page_size=100", anchor_id),
    )
    .await;
    let older = page["list"].as_array().unwrap();

    assert_eq!(older.len(), all.len() - 1);
    for message in older {
        assert!(message["created_at"].as_str().unwrap() < anchor_created_at);
    }

    let limited = get_history(
        &app,
        &user_token,
        &conversation_id,
        "?page_size=2",
    )
    .await;
    assert_eq!(limited["list"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn unread_counts_and_read_marker_are_idempotent() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let agent_token = TestApp::token("agent-a", "amira", "agent");
    let user_token = TestApp::token("user-1", "kim", "user");
    sync_user(&app, &agent_token).await;

    let (_, body) = create_conversation(&app, &user_token, json!({})).await;
    let conversation_id = body["item"]["conversation"]["id"].as_str().unwrap().to_string();

    send_message(&app, &agent_token, &conversation_id, "hello").await;
    send_message(&app, &agent_token, &conversation_id, "anyone there?").await;

    // no read marker: everything not sent by the user counts (2 + system)
    let (_, detail) = get_detail(&app, &user_token, &conversation_id).await;
    assert_eq!(detail["item"]["unread_count"], 3);

    // own messages never count against the sender
    send_message(&app, &user_token, &conversation_id, "yes").await;
    let (_, detail) = get_detail(&app, &user_token, &conversation_id).await;
    assert_eq!(detail["item"]["unread_count"], 3);

    let client = reqwest::Client::new();
    for _ in 0..2 {
        let response = client
            .post(format!("{}/conversations/{}/read", app.address, conversation_id))
            .bearer_auth(&user_token)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status().as_u16(), 200);
    }

    let (_, detail) = get_detail(&app, &user_token, &conversation_id).await;
    assert_eq!(detail["item"]["unread_count"], 0);
}

#[actix_web::test]
async fn closed_conversations_are_terminal() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let agent_token = TestApp::token("agent-a", "amira", "agent");
    let user_token = TestApp::token("user-1", "kim", "user");
    sync_user(&app, &agent_token).await;

    let (_, body) = create_conversation(&app, &user_token, json!({})).await;
    let conversation_id = body["item"]["conversation"]["id"].as_str().unwrap().to_string();

    let response = reqwest::Client::new()
        .post(format!("{}/conversations/{}/close", app.address, conversation_id))
        .bearer_auth(&user_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 200);

    // Scenario F: the assigned agent can no longer send
    assert_eq!(send_message(&app, &agent_token, &conversation_id, "late").await, 403);
    // closing again fails the membership check too
    let response = reqwest::Client::new()
        .post(format!("{}/conversations/{}/close", app.address, conversation_id))
        .bearer_auth(&user_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 403);
}

#[actix_web::test]
async fn non_participants_are_rejected_without_state_change() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let user_token = TestApp::token("user-1", "kim", "user");
    let outsider_token = TestApp::token("user-2", "vera", "user");

    let (_, body) = create_conversation(&app, &user_token, json!({})).await;
    let conversation_id = body["item"]["conversation"]["id"].as_str().unwrap().to_string();
    sync_user(&app, &outsider_token).await;

    let (status, _) = get_detail(&app, &outsider_token, &conversation_id).await;
    assert_eq!(status, 403);
    assert_eq!(send_message(&app, &outsider_token, &conversation_id, "hi").await, 403);

    let response = reqwest::Client::new()
        .get(format!("{}/conversations/{}/messages", app.address, conversation_id))
        .bearer_auth(&outsider_token)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 403);

    // nothing leaked into the outsider's own history
    let history = get_history(&app, &user_token, &conversation_id, "").await;
    for message in history["list"].as_array().unwrap() {
        assert_ne!(message["sender"]["id"], "user-2");
    }
}

#[actix_web::test]
async fn empty_message_content_is_rejected() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let user_token = TestApp::token("user-1", "kim", "user");
    let (_, body) = create_conversation(&app, &user_token, json!({})).await;
    let conversation_id = body["item"]["conversation"]["id"].as_str().unwrap().to_string();

    assert_eq!(send_message(&app, &user_token, &conversation_id, "").await, 400);
    assert_eq!(send_message(&app, &user_token, &conversation_id, "   ").await, 400);

    let history = get_history(&app, &user_token, &conversation_id, "").await;
    assert!(history["list"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn initial_message_is_stored_on_create() {
    let Some(app) = spawn_app().await else {
        return;
    };
    let user_token = TestApp::token("user-1", "kim", "user");

    let (status, body) = create_conversation(
        &app,
        &user_token,
        json!({ "message": "Hello, I need help" }),
    )
    .await;
    assert_eq!(status, 201);

    let contents: Vec<&str> = body["item"]["conversation"]["recent_messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert!(contents.contains(&"Hello, I need help"));
}
