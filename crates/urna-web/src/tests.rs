//! Router tests against an in-memory store.

use std::{path::PathBuf, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use serde_json::Value;
use tower::ServiceExt as _;
use urna_core::{candidate::NewCandidate, store::BallotStore};
use urna_store_sqlite::SqliteStore;

use crate::{AppState, ServerConfig, router};

const FORM: &str = "application/x-www-form-urlencoded";

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState {
    store:  Arc::new(store),
    config: Arc::new(ServerConfig {
      host:                "127.0.0.1".to_string(),
      port:                5000,
      base_url:            "http://vote.test".to_string(),
      store_path:          PathBuf::from(":memory:"),
      secure_cookies:      false,
      trust_forwarded_for: true,
    }),
  }
}

async fn oneshot_raw(
  state:   AppState<SqliteStore>,
  method:  &str,
  uri:     &str,
  headers: Vec<(header::HeaderName, &str)>,
  body:    &str,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let req = builder.body(Body::from(body.to_string())).unwrap();
  router(state).oneshot(req).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

/// `name=value` of the first `Set-Cookie` header for `name`.
fn set_cookie(resp: &Response, name: &str) -> Option<String> {
  resp
    .headers()
    .get_all(header::SET_COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .find(|v| v.starts_with(&format!("{name}=")))
    .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

async fn candidate(state: &AppState<SqliteStore>, first: &str, publish: bool) -> i64 {
  let c = state
    .store
    .add_candidate(NewCandidate::named(first, "Doe"))
    .await
    .unwrap();
  if publish {
    state.store.publish(vec![c.candidate_id]).await.unwrap();
  }
  c.candidate_id
}

async fn vote(
  state: &AppState<SqliteStore>,
  id:    i64,
  ip:    &str,
  token: Option<&str>,
  body:  &str,
) -> Response {
  let cookie = token.map(|t| format!("voter_token={t}"));
  let mut headers = vec![
    (header::CONTENT_TYPE, FORM),
    (header::USER_AGENT, "test-agent/1.0"),
    (header::HeaderName::from_static("x-forwarded-for"), ip),
  ];
  if let Some(c) = cookie.as_deref() {
    headers.push((header::COOKIE, c));
  }
  oneshot_raw(state.clone(), "POST", &format!("/vote/{id}"), headers, body).await
}

/// Register the first admin, log in and return the session cookie pair.
async fn admin_cookie(state: &AppState<SqliteStore>) -> String {
  let resp = oneshot_raw(
    state.clone(),
    "POST",
    "/admin/register",
    vec![(header::CONTENT_TYPE, FORM)],
    "username=root&password=hunter2",
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let resp = oneshot_raw(
    state.clone(),
    "POST",
    "/login",
    vec![(header::CONTENT_TYPE, FORM)],
    "username=root&password=hunter2",
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  set_cookie(&resp, "urna_session").expect("session cookie")
}

async fn admin_get(state: &AppState<SqliteStore>, cookie: &str, uri: &str) -> Response {
  oneshot_raw(state.clone(), "GET", uri, vec![(header::COOKIE, cookie)], "").await
}

// ── Voters ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_ok() {
  let state = make_state().await;
  let resp = oneshot_raw(state, "GET", "/health", vec![], "").await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn vote_list_shows_only_published_candidates() {
  let state = make_state().await;
  let a = candidate(&state, "A", true).await;
  candidate(&state, "Draft", false).await;

  let resp = oneshot_raw(state, "GET", "/vote", vec![], "").await;
  assert_eq!(resp.status(), StatusCode::OK);
  let list = json_body(resp).await;
  let list = list.as_array().unwrap();
  assert_eq!(list.len(), 1);
  assert_eq!(list[0]["candidate_id"], a);
}

#[tokio::test]
async fn unpublished_candidate_is_not_found_for_voters() {
  let state = make_state().await;
  let draft = candidate(&state, "Draft", false).await;

  let resp = oneshot_raw(state.clone(), "GET", &format!("/vote/{draft}"), vec![], "").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = vote(&state, draft, "10.0.0.1", None, "voter_name=Grace").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_candidate_is_not_found() {
  let state = make_state().await;
  let resp = vote(&state, 404, "10.0.0.1", None, "voter_name=Grace").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn successful_vote_issues_a_token_cookie() {
  let state = make_state().await;
  let a = candidate(&state, "A", true).await;

  let resp = vote(&state, a, "10.0.0.1", None, "voter_name=Grace&voter_meta=L3").await;
  assert_eq!(resp.status(), StatusCode::OK);

  let raw = resp
    .headers()
    .get_all(header::SET_COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .find(|v| v.starts_with("voter_token="))
    .expect("voter_token cookie")
    .to_string();
  assert!(raw.contains("Max-Age=31536000"), "cookie: {raw}");

  let receipt = json_body(resp).await;
  assert_eq!(receipt["candidate"]["candidate_id"], a);

  let votes = state.store.list_votes().await.unwrap();
  assert_eq!(votes.len(), 1);
  assert_eq!(votes[0].voter_name, "Grace");
  assert_eq!(votes[0].voter_meta, "L3");
  assert_eq!(votes[0].voter_ip, "10.0.0.1");
}

#[tokio::test]
async fn missing_voter_name_is_a_bad_request() {
  let state = make_state().await;
  let a = candidate(&state, "A", true).await;

  let resp = vote(&state, a, "10.0.0.1", None, "voter_name=+++&voter_meta=x").await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(state.store.list_votes().await.unwrap().is_empty());
}

#[tokio::test]
async fn same_token_cannot_vote_twice_even_for_another_candidate() {
  let state = make_state().await;
  let a = candidate(&state, "A", true).await;
  let b = candidate(&state, "B", true).await;

  let first = vote(&state, a, "10.0.0.1", None, "voter_name=Grace").await;
  assert_eq!(first.status(), StatusCode::OK);
  let token = set_cookie(&first, "voter_token").unwrap();
  let token = token.trim_start_matches("voter_token=");

  let second = vote(&state, b, "10.0.0.2", Some(token), "voter_name=Grace").await;
  assert_eq!(second.status(), StatusCode::CONFLICT);
  assert_eq!(state.store.list_votes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn same_ip_cannot_vote_twice() {
  let state = make_state().await;
  let a = candidate(&state, "A", true).await;

  let first = vote(&state, a, "10.0.0.1", Some("browser-one"), "voter_name=Grace").await;
  assert_eq!(first.status(), StatusCode::OK);

  let second = vote(&state, a, "10.0.0.1", Some("browser-two"), "voter_name=Alan").await;
  assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn different_voters_can_each_vote() {
  let state = make_state().await;
  let a = candidate(&state, "A", true).await;

  for i in 1..=3 {
    let resp = vote(&state, a, &format!("10.0.0.{i}"), None, "voter_name=V").await;
    assert_eq!(resp.status(), StatusCode::OK);
  }
  assert_eq!(state.store.list_votes().await.unwrap().len(), 3);
}

#[tokio::test]
async fn ballot_view_reports_prior_vote() {
  let state = make_state().await;
  let a = candidate(&state, "A", true).await;

  let view = |token: &'static str| {
    let state = state.clone();
    async move {
      let cookie = format!("voter_token={token}");
      let resp = oneshot_raw(
        state,
        "GET",
        &format!("/vote/{a}"),
        vec![
          (header::COOKIE, cookie.as_str()),
          (header::HeaderName::from_static("x-forwarded-for"), "10.9.9.9"),
        ],
        "",
      )
      .await;
      assert_eq!(resp.status(), StatusCode::OK);
      json_body(resp).await
    }
  };

  assert_eq!(view("tok").await["already_voted"], false);
  let resp = vote(&state, a, "10.9.9.9", Some("tok"), "voter_name=Grace").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(view("tok").await["already_voted"], true);
}

#[tokio::test]
async fn responses_carry_security_headers() {
  let state = make_state().await;
  let resp = oneshot_raw(state, "GET", "/vote", vec![], "").await;
  assert_eq!(resp.status(), StatusCode::OK);

  let headers = resp.headers();
  assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
  assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "SAMEORIGIN");
  assert_eq!(
    headers.get(header::REFERRER_POLICY).unwrap(),
    "strict-origin-when-cross-origin"
  );
  assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
}

#[tokio::test]
async fn hsts_is_sent_with_secure_cookies() {
  let state = make_state().await;
  let state = AppState {
    config: Arc::new(ServerConfig {
      secure_cookies: true,
      ..(*state.config).clone()
    }),
    ..state
  };
  let resp = oneshot_raw(state, "GET", "/vote", vec![], "").await;
  let hsts = resp.headers().get(header::STRICT_TRANSPORT_SECURITY).unwrap();
  assert!(hsts.to_str().unwrap().starts_with("max-age="));
  assert_eq!(resp.headers().get(header::X_FRAME_OPTIONS).unwrap(), "SAMEORIGIN");
}

#[tokio::test]
async fn malformed_candidate_id_is_a_json_not_found() {
  let state = make_state().await;
  let resp = oneshot_raw(state.clone(), "GET", "/vote/abc", vec![], "").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert!(json_body(resp).await["error"].is_string());

  let resp = vote(&state, 1, "10.0.0.1", None, "voter_name=Grace").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let resp = oneshot_raw(
    state,
    "POST",
    "/vote/abc",
    vec![(header::CONTENT_TYPE, FORM)],
    "voter_name=Grace",
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
async fn vote_without_form_content_type_is_a_json_error() {
  let state = make_state().await;
  let a = candidate(&state, "A", true).await;

  let resp = oneshot_raw(state, "POST", &format!("/vote/{a}"), vec![], "voter_name=Grace").await;
  assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
  assert!(json_body(resp).await["error"].is_string());
}

// ── Registration and login ───────────────────────────────────────────────────

#[tokio::test]
async fn registration_closes_after_first_admin() {
  let state = make_state().await;
  admin_cookie(&state).await;

  let resp = oneshot_raw(
    state,
    "POST",
    "/admin/register",
    vec![(header::CONTENT_TYPE, FORM)],
    "username=intruder&password=x",
  )
  .await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn registration_requires_both_fields() {
  let state = make_state().await;
  let resp = oneshot_raw(
    state,
    "POST",
    "/admin/register",
    vec![(header::CONTENT_TYPE, FORM)],
    "username=root&password=",
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
  let state = make_state().await;
  admin_cookie(&state).await;

  let wrong_pass = oneshot_raw(
    state.clone(),
    "POST",
    "/login",
    vec![(header::CONTENT_TYPE, FORM)],
    "username=root&password=nope",
  )
  .await;
  let unknown_user = oneshot_raw(
    state,
    "POST",
    "/login",
    vec![(header::CONTENT_TYPE, FORM)],
    "username=ghost&password=hunter2",
  )
  .await;

  assert_eq!(wrong_pass.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(json_body(wrong_pass).await, json_body(unknown_user).await);
}

#[tokio::test]
async fn admin_routes_require_a_session() {
  let state = make_state().await;
  for uri in [
    "/admin/candidates",
    "/admin/publish",
    "/admin/results",
    "/admin/export",
    "/admin/qr/1",
    "/admin/qr-site",
  ] {
    let resp = oneshot_raw(state.clone(), "GET", uri, vec![], "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
  }

  let resp = admin_get(&state, "urna_session=forged", "/admin/results").await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
  let state = make_state().await;
  let cookie = admin_cookie(&state).await;
  assert_eq!(
    admin_get(&state, &cookie, "/admin/candidates").await.status(),
    StatusCode::OK
  );

  let resp = oneshot_raw(
    state.clone(),
    "POST",
    "/logout",
    vec![(header::COOKIE, cookie.as_str())],
    "",
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  assert_eq!(
    admin_get(&state, &cookie, "/admin/candidates").await.status(),
    StatusCode::UNAUTHORIZED
  );
}

// ── Administration ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_publish_is_idempotent() {
  let state = make_state().await;
  let cookie = admin_cookie(&state).await;

  let resp = oneshot_raw(
    state.clone(),
    "POST",
    "/admin/candidates",
    vec![(header::CONTENT_TYPE, FORM), (header::COOKIE, cookie.as_str())],
    "first_name=Ada&last_name=Lovelace&category=Maths&number=7&age=36&bio=",
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created = json_body(resp).await;
  assert_eq!(created["published"], false);
  assert_eq!(created["age"], 36);
  let id = created["candidate_id"].as_i64().unwrap();

  let drafts = json_body(admin_get(&state, &cookie, "/admin/publish").await).await;
  assert_eq!(drafts.as_array().unwrap().len(), 1);

  let publish = |body: String| {
    let state = state.clone();
    let cookie = cookie.clone();
    async move {
      let resp = oneshot_raw(
        state,
        "POST",
        "/admin/publish",
        vec![(header::CONTENT_TYPE, FORM), (header::COOKIE, cookie.as_str())],
        &body,
      )
      .await;
      assert_eq!(resp.status(), StatusCode::OK);
      json_body(resp).await["published"].as_u64().unwrap()
    }
  };

  assert_eq!(publish(format!("candidate_ids={id}&candidate_ids=999")).await, 1);
  assert_eq!(publish(format!("candidate_ids={id}")).await, 0);

  let c = state.store.get_candidate(id).await.unwrap().unwrap();
  assert!(c.published);
  let drafts = json_body(admin_get(&state, &cookie, "/admin/publish").await).await;
  assert!(drafts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_age_is_rejected() {
  let state = make_state().await;
  let cookie = admin_cookie(&state).await;
  let resp = oneshot_raw(
    state,
    "POST",
    "/admin/candidates",
    vec![(header::CONTENT_TYPE, FORM), (header::COOKIE, cookie.as_str())],
    "first_name=Ada&age=old",
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn results_three_to_one() {
  let state = make_state().await;
  let cookie = admin_cookie(&state).await;
  let a = candidate(&state, "A", true).await;
  let b = candidate(&state, "B", true).await;

  for i in 1..=3 {
    let resp = vote(&state, a, &format!("10.0.1.{i}"), None, "voter_name=V").await;
    assert_eq!(resp.status(), StatusCode::OK);
  }
  let resp = vote(&state, b, "10.0.2.1", None, "voter_name=W").await;
  assert_eq!(resp.status(), StatusCode::OK);

  let tally = json_body(admin_get(&state, &cookie, "/admin/results").await).await;
  assert_eq!(tally["total_votes"], 4);
  assert_eq!(tally["results"][0]["percentage"], 75.0);
  assert_eq!(tally["results"][1]["percentage"], 25.0);
  assert_eq!(tally["winner"]["candidate_id"], a);
}

#[tokio::test]
async fn results_with_no_votes_pick_lowest_id() {
  let state = make_state().await;
  let cookie = admin_cookie(&state).await;
  let first = candidate(&state, "A", true).await;
  candidate(&state, "B", true).await;

  let tally = json_body(admin_get(&state, &cookie, "/admin/results").await).await;
  assert_eq!(tally["total_votes"], 0);
  for r in tally["results"].as_array().unwrap() {
    assert_eq!(r["percentage"], 0.0);
  }
  assert_eq!(tally["winner"]["candidate_id"], first);
}

#[tokio::test]
async fn export_returns_one_row_per_vote() {
  let state = make_state().await;
  let cookie = admin_cookie(&state).await;
  let a = candidate(&state, "Ada", true).await;
  vote(&state, a, "10.0.0.1", None, "voter_name=Grace&voter_meta=L3").await;
  vote(&state, a, "10.0.0.2", None, "voter_name=Alan").await;

  let resp = admin_get(&state, &cookie, "/admin/export").await;
  assert_eq!(resp.status(), StatusCode::OK);
  let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap();
  assert!(disposition.to_str().unwrap().contains("votes_export.csv"));

  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let text = std::str::from_utf8(&bytes).unwrap();
  let lines: Vec<&str> = text.lines().collect();
  assert_eq!(lines.len(), 3);
  assert_eq!(lines[0], "Candidate,Voter,Voter Info,Vote Date");
  assert!(lines[1].starts_with("Ada Doe,Grace,L3,"));
}

#[tokio::test]
async fn qr_codes_are_png() {
  let state = make_state().await;
  let cookie = admin_cookie(&state).await;
  let a = candidate(&state, "A", false).await;

  let resp = admin_get(&state, &cookie, &format!("/admin/qr/{a}")).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
  let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap();
  assert!(disposition.to_str().unwrap().contains(&format!("candidate_{a}_qr.png")));
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert!(bytes.starts_with(b"\x89PNG"));

  let resp = admin_get(&state, &cookie, "/admin/qr/999").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = admin_get(&state, &cookie, "/admin/qr-site").await;
  assert_eq!(resp.status(), StatusCode::OK);
}
