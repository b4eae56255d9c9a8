//! Handler flows against a wiremock Telegram Bot API and an in-memory store

use std::ops::ControlFlow;
use std::sync::Arc;

use linkbot::telegram::handlers::handle_action;
use linkbot::telegram::keyboards::{GET_INFO, MY_CODE};
use linkbot::telegram::{replies, schema, Action, HandlerDeps, HandlerError};
use linkcore::{derive_code, MemoryStore, ProfileService};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{json, Value};
use teloxide::prelude::*;
use teloxide::types::Me;
use url::Url;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_ID: i64 = 123456789;

struct TestEnvironment {
    server: MockServer,
    bot: Bot,
    store: Arc<MemoryStore>,
    deps: HandlerDeps,
    me: Me,
}

impl TestEnvironment {
    async fn new() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"(?i)^/bot[^/]+/sendmessage$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": message_json("ok")
            })))
            .mount(&server)
            .await;

        let bot = Bot::new("test_token_12345:ABCDEF").set_api_url(server.uri().parse().unwrap());
        let store = Arc::new(MemoryStore::new());
        let profiles = Arc::new(ProfileService::new(store.clone(), salt()));
        let deps = HandlerDeps::new(profiles, Url::parse("https://example.com/account/profile").unwrap());

        let me: Me = serde_json::from_value(json!({
            "id": 987654321,
            "is_bot": true,
            "first_name": "LinkBot",
            "username": "linkbot",
            "can_join_groups": true,
            "can_read_all_group_messages": false,
            "supports_inline_queries": false,
            "can_connect_to_business": false,
            "has_main_web_app": false
        }))
        .unwrap();

        Self {
            server,
            bot,
            store,
            deps,
            me,
        }
    }

    /// Feed one message update through the production handler tree.
    async fn route(&self, message: Value) -> ControlFlow<Result<(), HandlerError>, ()> {
        // `UpdateKind` deserializes keys as borrowed `&str`, which `from_value` cannot provide.
        let update: Update =
            serde_json::from_str(&json!({ "update_id": 1, "message": message }).to_string()).unwrap();
        let result = schema(self.deps.clone())
            .dispatch(dptree::deps![self.bot.clone(), self.me.clone(), update])
            .await;
        match result {
            ControlFlow::Break(outcome) => ControlFlow::Break(outcome),
            ControlFlow::Continue(_) => ControlFlow::Continue(()),
        }
    }

    async fn run(&self, text: &str, action: Action) {
        let msg: Message = serde_json::from_value(message_json(text)).unwrap();
        handle_action(&self.bot, &msg, action, &self.deps).await.unwrap();
    }

    /// JSON bodies of every sendMessage call, in order.
    async fn sent(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().to_lowercase().ends_with("/sendmessage"))
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}

fn salt() -> SecretString {
    SecretString::from("pepper".to_string())
}

fn group_message_json(text: &str) -> Value {
    json!({
        "message_id": 2,
        "date": 1234567890,
        "chat": {
            "id": -100987654321i64,
            "type": "supergroup",
            "title": "Friends"
        },
        "from": {
            "id": CHAT_ID,
            "is_bot": false,
            "first_name": "Ann"
        },
        "text": text
    })
}

fn message_json(text: &str) -> Value {
    json!({
        "message_id": 1,
        "date": 1234567890,
        "chat": {
            "id": CHAT_ID,
            "type": "private",
            "first_name": "Ann"
        },
        "from": {
            "id": CHAT_ID,
            "is_bot": false,
            "first_name": "Ann",
            "last_name": "Lee",
            "username": "annlee"
        },
        "text": text
    })
}

#[tokio::test]
async fn test_start_registers_and_sends_code() {
    let env = TestEnvironment::new().await;
    env.run("/start", Action::Register).await;

    let records = env.store.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].chat_id, CHAT_ID);
    assert_eq!(records[0].username.as_deref(), Some("annlee"));

    let code = derive_code(CHAT_ID, &salt());
    let sent = env.sent().await;
    assert_eq!(sent.len(), 2);

    assert_eq!(sent[0]["text"], "Welcome, Ann! Your unique code has been generated.");
    assert_eq!(sent[0]["reply_markup"]["keyboard"][1][1]["text"], MY_CODE);

    assert_eq!(sent[1]["parse_mode"], "HTML");
    assert!(sent[1]["text"]
        .as_str()
        .unwrap()
        .contains(&format!("<code>{}</code>", code)));
}

#[tokio::test]
async fn test_second_start_updates_instead_of_creating() {
    let env = TestEnvironment::new().await;
    env.run("/start", Action::Register).await;
    env.run("/start", Action::Register).await;

    assert_eq!(env.store.count_for_chat(CHAT_ID).await, 1);
    let sent = env.sent().await;
    assert!(sent[2]["text"].as_str().unwrap().starts_with("Welcome back, Ann!"));
}

#[tokio::test]
async fn test_my_code_repeats_same_code() {
    let env = TestEnvironment::new().await;
    env.run("/start", Action::Register).await;
    env.run(MY_CODE, Action::ShowCode).await;

    let code = derive_code(CHAT_ID, &salt());
    let sent = env.sent().await;
    let last = sent.last().unwrap();
    assert!(last["text"].as_str().unwrap().contains(&format!("<code>{}</code>", code)));
    assert_eq!(env.store.count_for_chat(CHAT_ID).await, 1);
}

#[tokio::test]
async fn test_info_before_registration_says_not_registered() {
    let env = TestEnvironment::new().await;
    env.run(GET_INFO, Action::ShowInfo).await;

    let sent = env.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["text"], replies::NOT_REGISTERED);
}

#[tokio::test]
async fn test_info_after_registration_shows_profile() {
    let env = TestEnvironment::new().await;
    env.run("/start", Action::Register).await;
    env.run(GET_INFO, Action::ShowInfo).await;

    let sent = env.sent().await;
    let text = sent.last().unwrap()["text"].as_str().unwrap().to_string();
    assert!(text.contains("Name: Ann Lee"));
    assert!(text.contains("Username: @annlee"));
}

#[tokio::test]
async fn test_store_outage_gives_generic_message() {
    let env = TestEnvironment::new().await;
    env.store.set_offline(true);

    env.run("/start", Action::Register).await;
    env.run(GET_INFO, Action::ShowInfo).await;
    env.run(MY_CODE, Action::ShowCode).await;

    let sent = env.sent().await;
    assert_eq!(sent.len(), 3);
    for body in &sent {
        assert_eq!(body["text"], replies::TRY_AGAIN_LATER);
    }
}

#[tokio::test]
async fn test_website_sends_url_button() {
    let env = TestEnvironment::new().await;
    env.run("/website", Action::Website).await;

    let sent = env.sent().await;
    assert_eq!(sent[0]["text"], replies::WEBSITE_PROMPT);
    assert_eq!(
        sent[0]["reply_markup"]["inline_keyboard"][0][0]["url"],
        "https://example.com/account/profile"
    );
    assert!(env.store.records().await.is_empty());
}

fn handled(flow: &ControlFlow<Result<(), HandlerError>, ()>) -> bool {
    matches!(flow, ControlFlow::Break(Ok(())))
}

#[tokio::test]
async fn test_schema_routes_start_command() {
    let env = TestEnvironment::new().await;
    assert!(handled(&env.route(message_json("/start")).await));

    assert_eq!(env.store.count_for_chat(CHAT_ID).await, 1);
    assert_eq!(env.sent().await.len(), 2);
}

#[tokio::test]
async fn test_schema_routes_my_code_button() {
    let env = TestEnvironment::new().await;
    assert!(handled(&env.route(message_json(MY_CODE)).await));

    assert_eq!(env.store.count_for_chat(CHAT_ID).await, 1);
    let sent = env.sent().await;
    assert_eq!(sent.len(), 1);
    let code = derive_code(CHAT_ID, &salt());
    assert!(sent[0]["text"].as_str().unwrap().contains(&format!("<code>{}</code>", code)));
}

#[tokio::test]
async fn test_schema_routes_info_button_without_writing() {
    let env = TestEnvironment::new().await;
    assert!(handled(&env.route(message_json(GET_INFO)).await));

    assert!(env.store.records().await.is_empty());
    assert_eq!(env.sent().await[0]["text"], replies::NOT_REGISTERED);
}

#[tokio::test]
async fn test_schema_private_free_text_gets_nudge() {
    let env = TestEnvironment::new().await;
    assert!(handled(&env.route(message_json("hello")).await));

    let sent = env.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["text"], replies::unknown_text());
    assert!(env.store.records().await.is_empty());
}

#[tokio::test]
async fn test_schema_unknown_command_falls_through_to_nudge() {
    let env = TestEnvironment::new().await;
    assert!(handled(&env.route(message_json("/foo")).await));

    let sent = env.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["text"], replies::unknown_text());
}

#[tokio::test]
async fn test_schema_ignores_free_text_in_groups() {
    let env = TestEnvironment::new().await;
    let flow = env.route(group_message_json("hello")).await;

    assert!(matches!(flow, ControlFlow::Continue(())));
    assert!(env.sent().await.is_empty());
}

#[tokio::test]
async fn test_schema_answers_commands_in_groups() {
    let env = TestEnvironment::new().await;
    assert!(handled(&env.route(group_message_json("/website@linkbot")).await));

    let sent = env.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["text"], replies::WEBSITE_PROMPT);
}
