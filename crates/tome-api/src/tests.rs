//! Router tests: real handlers over an in-memory `SqliteStore`, with a fixed
//! table of tokens standing in for the identity provider.

use std::{collections::HashMap, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tome_core::{
  book::NewBook,
  identity::{Identity, TokenVerifier},
  store::CatalogStore,
};
use tome_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use crate::api_router;

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("unknown token")]
struct UnknownToken;

#[derive(Default)]
struct StaticVerifier {
  tokens: HashMap<String, Identity>,
}

impl StaticVerifier {
  fn with(mut self, token: &str, identity: Identity) -> Self {
    self.tokens.insert(token.to_owned(), identity);
    self
  }
}

impl TokenVerifier for StaticVerifier {
  type Error = UnknownToken;

  async fn verify<'a>(
    &'a self,
    token: &'a str,
  ) -> Result<Identity, UnknownToken> {
    self.tokens.get(token).cloned().ok_or(UnknownToken)
  }
}

const READER: &str = "reader-token";
const CURATOR: &str = "curator-token";

struct Harness {
  store: Arc<SqliteStore>,
  app:   Router,
}

async fn harness() -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let verifier = StaticVerifier::default()
    .with(READER, Identity {
      email: Some("reader@example.com".into()),
      display_name: Some("Rita Reader".into()),
      picture_url: Some("https://example.com/rita.png".into()),
      ..Identity::new("reader-uid")
    })
    .with(CURATOR, Identity {
      email: Some("curator@example.com".into()),
      display_name: Some("Cam Curator".into()),
      ..Identity::new("curator-uid")
    });

  let app = Router::new().nest("/api", api_router(store.clone(), Arc::new(verifier)));
  Harness { store, app }
}

impl Harness {
  /// Register the curator and grant them admin directly in the store.
  async fn promote_curator(&self) {
    let profile = Identity::new("curator-uid").profile();
    self.store.upsert_user(profile).await.unwrap();
    self.store.set_admin("curator-uid", true).await.unwrap();
  }

  async fn send(
    &self,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(body) => req
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => req.body(Body::empty()).unwrap(),
    };

    let resp = self.app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }
}

fn dracula() -> Value {
  json!({
    "title": "Dracula",
    "author": "Bram Stoker",
    "price": 12.99,
    "category": "Horror",
    "publishedYear": 1897,
    "pages": 418,
  })
}

// ─── Public reads ────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_books_is_public() {
  let h = harness().await;
  h.store
    .create_book(NewBook::new("Emma", "Jane Austen"))
    .await
    .unwrap();

  let (status, body) = h.send(Method::GET, "/api/books", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["title"], "Emma");
  assert_eq!(body[0]["category"], "Fiction");
  assert_eq!(body[0]["inStock"], true);
}

#[tokio::test]
async fn get_unknown_or_malformed_id_is_not_found() {
  let h = harness().await;

  let (status, body) = h
    .send(
      Method::GET,
      "/api/books/0b3f2d6e-8a7c-4c55-9a52-2f1a0d3e9b11",
      None,
      None,
    )
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Book not found");

  let (status, _) = h.send(Method::GET, "/api/books/42", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_filters_by_price_bracket_inclusively() {
  let h = harness().await;
  for (title, price) in [("Cheap", 9.99), ("Edge", 25.0), ("Dear", 50.0)] {
    h.store
      .create_book(NewBook { price, ..NewBook::new(title, "Anon") })
      .await
      .unwrap();
  }

  let (status, body) = h
    .send(Method::GET, "/api/catalog?price=10to25&sort=price-low", None, None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["results"].as_array().unwrap().len(), 1);
  assert_eq!(body["results"][0]["title"], "Edge");
  assert_eq!(body["total"], 3);
  assert_eq!(body["activeFilters"], 1);

  let (_, body) = h
    .send(Method::GET, "/api/catalog?price=25to50&sort=price-high", None, None)
    .await;
  let titles: Vec<&str> = body["results"]
    .as_array()
    .unwrap()
    .iter()
    .map(|b| b["title"].as_str().unwrap())
    .collect();
  assert_eq!(titles, ["Dear", "Edge"]);
}

#[tokio::test]
async fn catalog_ignores_unknown_sort_and_price() {
  let h = harness().await;
  h.store
    .create_book(NewBook::new("Emma", "Jane Austen"))
    .await
    .unwrap();

  let (status, body) = h
    .send(Method::GET, "/api/catalog?price=free&sort=sideways", None, None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["results"].as_array().unwrap().len(), 1);
  assert_eq!(body["activeFilters"], 0);
  assert_eq!(body["facetCategories"], json!(["Fiction"]));
}

// ─── Auth gate ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn current_user_requires_a_valid_token() {
  let h = harness().await;

  let (status, body) = h.send(Method::GET, "/api/auth/user", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["message"], "Unauthorized");

  let (status, _) = h
    .send(Method::GET, "/api/auth/user", Some("forged"), None)
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_authenticated_request_creates_a_non_admin_user() {
  let h = harness().await;

  let (status, body) = h
    .send(Method::GET, "/api/auth/user", Some(READER), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["id"], "reader-uid");
  assert_eq!(body["firstName"], "Rita");
  assert_eq!(body["lastName"], "Reader");
  assert_eq!(body["profileImageUrl"], "https://example.com/rita.png");
  assert_eq!(body["isAdmin"], false);

  let stored = h.store.get_user("reader-uid").await.unwrap().unwrap();
  assert!(!stored.is_admin);
}

#[tokio::test]
async fn admin_routes_distinguish_anonymous_from_non_admin() {
  let h = harness().await;

  let (status, _) = h
    .send(Method::POST, "/api/books", None, Some(dracula()))
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = h
    .send(Method::POST, "/api/books", Some(READER), Some(dracula()))
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["message"], "Forbidden - Admin access required");

  let (status, _) = h
    .send(Method::GET, "/api/admin/stats", Some(READER), None)
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  assert!(h.store.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_admin_with_invalid_body_is_still_forbidden() {
  let h = harness().await;
  let (status, _) = h
    .send(Method::POST, "/api/books", Some(READER), Some(json!({ "price": -1 })))
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn make_admin_persists_across_requests() {
  let h = harness().await;

  let (status, body) = h
    .send(Method::POST, "/api/admin/make-admin", Some(READER), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["isAdmin"], true);

  // The next request upserts the profile again; the flag must survive.
  let (status, body) = h
    .send(Method::GET, "/api/auth/user", Some(READER), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["isAdmin"], true);

  let (status, _) = h
    .send(Method::POST, "/api/books", Some(READER), Some(dracula()))
    .await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn revoked_admin_is_refused_on_the_next_request() {
  let h = harness().await;
  h.promote_curator().await;

  let (status, _) = h
    .send(Method::GET, "/api/admin/stats", Some(CURATOR), None)
    .await;
  assert_eq!(status, StatusCode::OK);

  h.store.set_admin("curator-uid", false).await.unwrap();
  let (status, _) = h
    .send(Method::GET, "/api/admin/stats", Some(CURATOR), None)
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Admin writes ────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_book_lifecycle() {
  let h = harness().await;
  h.promote_curator().await;

  let (status, created) = h
    .send(Method::POST, "/api/books", Some(CURATOR), Some(dracula()))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["title"], "Dracula");
  assert_eq!(created["inStock"], true);
  assert_eq!(created["createdAt"], created["updatedAt"]);
  let id = created["id"].as_str().unwrap().to_owned();
  let uri = format!("/api/books/{id}");

  let (status, fetched) = h.send(Method::GET, &uri, None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, created);

  let (status, updated) = h
    .send(
      Method::PUT,
      &uri,
      Some(CURATOR),
      Some(json!({ "price": 8.5, "inStock": false, "pages": null })),
    )
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["id"], created["id"]);
  assert_eq!(updated["title"], "Dracula");
  assert_eq!(updated["price"], 8.5);
  assert_eq!(updated["inStock"], false);
  assert_eq!(updated["pages"], Value::Null);
  assert_eq!(updated["createdAt"], created["createdAt"]);

  let (status, body) = h.send(Method::DELETE, &uri, Some(CURATOR), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert_eq!(body, Value::Null);

  let (status, _) = h.send(Method::GET, &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = h.send(Method::DELETE, &uri, Some(CURATOR), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_create_is_rejected_without_persisting() {
  let h = harness().await;
  h.promote_curator().await;

  let (status, body) = h
    .send(
      Method::POST,
      "/api/books",
      Some(CURATOR),
      Some(json!({ "title": "", "author": "Anon", "price": -3 })),
    )
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Validation error");
  assert!(body["errors"]["fieldErrors"]["title"].is_array());
  assert!(body["errors"]["fieldErrors"]["price"].is_array());
  assert!(h.store.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
  let h = harness().await;
  h.promote_curator().await;

  let req = Request::builder()
    .method(Method::POST)
    .uri("/api/books")
    .header(header::AUTHORIZATION, format!("Bearer {CURATOR}"))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{ not json"))
    .unwrap();
  let resp = h.app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_of_missing_book_is_not_found_before_validation() {
  let h = harness().await;
  h.promote_curator().await;

  let (status, _) = h
    .send(
      Method::PUT,
      "/api/books/0b3f2d6e-8a7c-4c55-9a52-2f1a0d3e9b11",
      Some(CURATOR),
      Some(json!({ "price": -1 })),
    )
    .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_on_empty_catalog_are_zero() {
  let h = harness().await;
  h.promote_curator().await;

  let (status, body) = h
    .send(Method::GET, "/api/admin/stats", Some(CURATOR), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!({ "totalBooks": 0, "inStock": 0, "categories": 0, "averagePrice": 0.0 })
  );
}
