//! End-to-end tests for the userdata routes: real redb store, fake guild.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use c2s_core::{Module, SharedSecret};
use c2s_kv::{KVStore, RedbStore};
use userdata::UserDataModule;
use userdata::membership::{Member, MembershipClient, MembershipError};
use userdata::model::{Role, RoleCatalog, RoleId};
use userdata::service::UserDataConfig;
use userdata::service::token::derive_token;

const SECRET: &str = "e2e-secret";

#[derive(Default)]
struct FakeGuild {
    roles: Mutex<BTreeMap<String, BTreeSet<RoleId>>>,
    messages: Mutex<Vec<(String, String)>>,
    reject_role_changes: bool,
}

#[async_trait::async_trait]
impl MembershipClient for FakeGuild {
    async fn fetch_member(&self, user_id: &str) -> Result<Member, MembershipError> {
        let roles = self
            .roles
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| MembershipError::MemberNotFound(user_id.to_string()))?;
        Ok(Member {
            user_id: user_id.to_string(),
            tag: format!("member{}", user_id),
            roles,
        })
    }

    async fn set_roles(
        &self,
        user_id: &str,
        roles: &BTreeSet<RoleId>,
    ) -> Result<(), MembershipError> {
        if self.reject_role_changes {
            return Err(MembershipError::Api {
                status: 403,
                message: "Missing Permissions".into(),
            });
        }
        self.roles
            .lock()
            .unwrap()
            .insert(user_id.to_string(), roles.clone());
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user_id: &str,
        content: &str,
    ) -> Result<(), MembershipError> {
        self.messages
            .lock()
            .unwrap()
            .push((user_id.to_string(), content.to_string()));
        Ok(())
    }
}

fn catalog() -> RoleCatalog {
    let managed = Role::ALL
        .iter()
        .enumerate()
        .map(|(i, role)| (*role, RoleId::new(format!("{}", 1000 + i))))
        .collect();
    RoleCatalog::new(managed, [RoleId::new("777")]).unwrap()
}

struct Harness {
    router: Router,
    kv: Arc<dyn KVStore>,
    guild: Arc<FakeGuild>,
    _dir: tempfile::TempDir,
}

fn harness(guild: FakeGuild) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let kv: Arc<dyn KVStore> =
        Arc::new(RedbStore::open(&dir.path().join("userdata.redb")).unwrap());
    let guild = Arc::new(guild);
    guild
        .roles
        .lock()
        .unwrap()
        .entry("4242".into())
        .or_insert_with(|| [RoleId::new("777")].into());

    let module = UserDataModule::new(
        kv.clone(),
        guild.clone(),
        Arc::new(SharedSecret::new(SECRET)),
        UserDataConfig {
            shared_secret: SECRET.into(),
            roles: catalog(),
            audit_webhook_url: None,
        },
    );
    Harness {
        router: module.routes(),
        kv,
        guild,
        _dir: dir,
    }
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(a) = auth {
        builder = builder.header("Authorization", a);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Provision "4242" for player "p1" / "pw" through the admin route.
async fn provision(h: &Harness) {
    let (status, body) = call(
        &h.router,
        "POST",
        "/admin/userdata",
        Some(SECRET),
        r#"{"discordId": "4242", "playerId": "p1", "playerToken": "pw"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

fn stored(h: &Harness) -> Vec<(String, Vec<u8>)> {
    h.kv.scan("userdata:record:").unwrap()
}

async fn wait_for_messages(guild: &FakeGuild, count: usize) {
    for _ in 0..100 {
        if guild.messages.lock().unwrap().len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {} direct messages", count);
}

#[tokio::test]
async fn valid_update_grants_role_and_notifies() {
    let h = harness(FakeGuild::default());
    provision(&h).await;

    let (status, body) = call(
        &h.router,
        "POST",
        "/userdata?playerId=p1",
        Some(SECRET),
        r#"{"playerToken": "pw", "metabits": 1000000000}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["discordId"], "4242");
    assert_eq!(data["metabits"].as_u64(), Some(1_000_000_000));
    assert_eq!(data["token"], derive_token(SECRET, "p1", "pw").unwrap());
    assert!(data["edited_timestamp"].as_i64().unwrap() > 0);

    let roles = h.guild.roles.lock().unwrap()["4242"].clone();
    let expected: BTreeSet<RoleId> = [RoleId::new("777"), RoleId::new("1000")].into();
    assert_eq!(roles, expected);

    wait_for_messages(&h.guild, 1).await;
    let messages = h.guild.messages.lock().unwrap().clone();
    assert_eq!(messages[0].0, "4242");
    assert!(messages[0].1.contains("Reality Explorer"));
}

#[tokio::test]
async fn header_name_is_case_insensitive() {
    let h = harness(FakeGuild::default());
    provision(&h).await;

    let req = Request::builder()
        .method("POST")
        .uri("/userdata?playerId=p1")
        .header("authorization", SECRET)
        .body(Body::from(r#"{"playerToken": "pw", "betaTester": true}"#))
        .unwrap();
    let resp = h.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_authorization_is_rejected_without_mutation() {
    let h = harness(FakeGuild::default());
    provision(&h).await;
    let before = stored(&h);

    let (status, body) = call(
        &h.router,
        "POST",
        "/userdata?playerId=p1",
        Some("not-the-secret"),
        r#"{"playerToken": "pw", "metabits": 1000000000}"#,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid Authorization header");
    assert_eq!(stored(&h), before);
}

#[tokio::test]
async fn repeated_player_id_still_gets_json_answers() {
    let h = harness(FakeGuild::default());
    provision(&h).await;
    let before = stored(&h);

    for (method, uri) in [
        ("POST", "/userdata?playerId=a&playerId=b"),
        ("POST", "/admin/userdata/lookup?playerId=a&playerId=b"),
        ("DELETE", "/admin/userdata?playerId=a&playerId=b"),
    ] {
        let (status, body) = call(
            &h.router,
            method,
            uri,
            Some("not-the-secret"),
            r#"{"playerToken": "pw", "metabits": 1000000000}"#,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(body["error"], "Invalid Authorization header");
        assert_eq!(body["code"], "PERMISSION_DENIED");
    }
    assert_eq!(stored(&h), before);

    let (status, body) = call(
        &h.router,
        "POST",
        "/userdata?playerId=p1&playerId=other",
        Some(SECRET),
        r#"{"playerToken": "pw", "betaTester": true}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["betaTester"], true);
}

#[tokio::test]
async fn empty_body_is_rejected_without_mutation() {
    let h = harness(FakeGuild::default());
    provision(&h).await;
    let before = stored(&h);

    let (status, body) = call(&h.router, "POST", "/userdata?playerId=p1", Some(SECRET), "{}").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Missing playerToken");

    let (status, body) = call(
        &h.router,
        "POST",
        "/userdata?playerId=p1",
        Some(SECRET),
        r#"{"playerToken": "pw"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("The following are required"));
    assert_eq!(stored(&h), before);
}

#[tokio::test]
async fn malformed_and_missing_identity() {
    let h = harness(FakeGuild::default());

    let (status, body) = call(&h.router, "POST", "/userdata?playerId=p1", Some(SECRET), "[1]").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Malformed request");

    let (status, body) = call(
        &h.router,
        "POST",
        "/userdata",
        Some(SECRET),
        r#"{"playerToken": "pw", "betaTester": true}"#,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Missing playerId");
}

#[tokio::test]
async fn unknown_player_returns_null_data() {
    let h = harness(FakeGuild::default());
    provision(&h).await;

    let (status, body) = call(
        &h.router,
        "POST",
        "/userdata?playerId=p1",
        Some(SECRET),
        r#"{"playerToken": "stale", "betaTester": true}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": null }));
}

#[tokio::test]
async fn role_failure_is_400_and_keeps_write() {
    let h = harness(FakeGuild {
        reject_role_changes: true,
        ..FakeGuild::default()
    });
    provision(&h).await;

    let (status, body) = call(
        &h.router,
        "POST",
        "/userdata?playerId=p1",
        Some(SECRET),
        r#"{"playerToken": "pw", "dino_rank": 550}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Missing Permissions"));

    let (status, body) = call(
        &h.router,
        "POST",
        "/admin/userdata/lookup?playerId=p1",
        Some(SECRET),
        r#"{"playerToken": "pw"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dino_rank"], 550);
    assert!(h.guild.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn admin_lifecycle() {
    let h = harness(FakeGuild::default());

    let (status, _) = call(&h.router, "GET", "/admin/userdata", None, "").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    provision(&h).await;
    let (status, body) = call(
        &h.router,
        "POST",
        "/admin/userdata",
        Some(SECRET),
        r#"{"discordId": "4242", "playerId": "p9", "playerToken": "other"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");

    let (status, body) = call(&h.router, "GET", "/admin/userdata", Some(SECRET), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &h.router,
        "DELETE",
        "/admin/userdata?playerId=p1",
        Some(SECRET),
        r#"{"playerToken": "pw"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "User Data successfully deleted", "discordId": "4242"})
    );

    let (status, _) = call(
        &h.router,
        "DELETE",
        "/admin/userdata?playerId=p1",
        Some(SECRET),
        r#"{"playerToken": "pw"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &h.router,
        "POST",
        "/admin/userdata/lookup?playerId=p1",
        Some(SECRET),
        r#"{"playerToken": "pw"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
