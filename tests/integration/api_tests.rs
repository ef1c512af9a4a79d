//! API integration tests against an in-memory store

mod common;

use axum::{body::Body, http::StatusCode};
use serde_json::{json, Value};

use common::{multipart_body, multipart_request, request, TestApp};

fn rels(page: &Value) -> Vec<String> {
    page["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["rel"].as_str().unwrap().to_string())
        .collect()
}

fn link<'a>(page: &'a Value, rel: &str) -> &'a str {
    page["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["rel"] == rel)
        .and_then(|l| l["href"].as_str())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/api/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books/search"].is_object());
}

// =========================================================================
// AUTH
// =========================================================================

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/books", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");

    let (status, _) = app.get("/api/books", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_plain_users() {
    let app = TestApp::new();
    let token = app.user_token();

    let (status, _) = app
        .post_json(
            "/api/genres",
            &token,
            json!({"name": "Sci-Fi", "description": "Science fiction and space opera"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/users", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =========================================================================
// PAGINATION
// =========================================================================

#[tokio::test]
async fn test_single_book_page() {
    let app = TestApp::new();
    app.seed_book("Dune", "Herbert", "1234567890", 1965).await;

    let (status, page) = app
        .get(
            "/api/books/paginated-list?pageNumber=1&pageSize=10",
            Some(&app.user_token()),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["title"], "Dune");
    assert_eq!(page["pageIndex"], 1);
    assert_eq!(page["pageSize"], 10);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["hasPrevious"], false);
    assert_eq!(page["hasNext"], false);
    assert_eq!(rels(&page), vec!["firstPage", "lastPage"]);
    assert_eq!(
        link(&page, "firstPage"),
        "http://localhost:8080/api/books/paginated-list?pageSize=10&sortDescending=false&pageNumber=1"
    );
    assert_eq!(page["links"][0]["method"], "GET");
}

#[tokio::test]
async fn test_page_size_is_capped() {
    let app = TestApp::new();
    for i in 0..60 {
        app.seed_book(&format!("Book {:02}", i), "Author", "1234567890", 1900 + i)
            .await;
    }
    let token = app.user_token();

    let (status, page) = app
        .get("/api/books/paginated-list?pageSize=200", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pageSize"], 50);
    assert_eq!(page["items"].as_array().unwrap().len(), 50);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(rels(&page), vec!["nextPage", "firstPage", "lastPage"]);
    assert!(link(&page, "nextPage").contains("pageSize=50"));
    assert!(link(&page, "nextPage").ends_with("pageNumber=2"));

    let (_, page) = app
        .get("/api/books/paginated-list?pageSize=50&pageNumber=2", Some(&token))
        .await;
    assert_eq!(page["items"].as_array().unwrap().len(), 10);
    assert_eq!(rels(&page), vec!["previousPage", "firstPage", "lastPage"]);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let app = TestApp::new();
    for i in 0..3 {
        app.seed_book(&format!("Book {}", i), "Author", "1234567890", 2000).await;
    }

    let (status, page) = app
        .get(
            "/api/books/paginated-list?pageSize=2&pageNumber=3",
            Some(&app.user_token()),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(page["items"].as_array().unwrap().is_empty());
    assert_eq!(page["totalCount"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["hasPrevious"], true);
    assert_eq!(page["hasNext"], false);
}

#[tokio::test]
async fn test_huge_page_number_is_empty() {
    let app = TestApp::new();
    for i in 0..3 {
        app.seed_book(&format!("Book {}", i), "Author", "1234567890", 2000).await;
    }

    let (status, page) = app
        .get("/api/books/search?pageNumber=9223372036854775807&pageSize=10", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["items"].as_array().unwrap().is_empty());
    assert_eq!(page["pageIndex"], i64::MAX);
    assert_eq!(page["totalCount"], 3);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["hasNext"], false);

    let (status, page) = app
        .get(
            "/api/books/paginated-list?pageNumber=9223372036854775807",
            Some(&app.user_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["items"].as_array().unwrap().is_empty());
    assert_eq!(page["totalCount"], 3);
}

#[tokio::test]
async fn test_empty_catalog_links_to_page_zero() {
    let app = TestApp::new();

    let (status, page) = app
        .get("/api/books/paginated-list", Some(&app.user_token()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalPages"], 0);
    assert_eq!(rels(&page), vec!["firstPage", "lastPage"]);
    assert!(link(&page, "firstPage").ends_with("pageNumber=1"));
    assert!(link(&page, "lastPage").ends_with("pageNumber=0"));
}

#[tokio::test]
async fn test_sorting_by_each_key() {
    let app = TestApp::new();
    app.seed_book("Dune", "Herbert", "1234567890", 1965).await;
    app.seed_book("Foundation", "Asimov", "1234567891", 1951).await;
    app.seed_book("Hyperion", "Simmons", "1234567892", 1989).await;
    let token = app.user_token();

    let column = |page: &Value, key: &str| -> Vec<Value> {
        page["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b[key].clone())
            .collect()
    };

    let (_, page) = app
        .get("/api/books/paginated-list?sortBy=publicationYear&sortDescending=true", Some(&token))
        .await;
    assert_eq!(column(&page, "publicationYear"), vec![json!(1989), json!(1965), json!(1951)]);
    assert!(link(&page, "firstPage").contains("sortBy=publicationYear"));
    assert!(link(&page, "firstPage").contains("sortDescending=true"));

    let (_, page) = app
        .get("/api/books/paginated-list?sortBy=author", Some(&token))
        .await;
    assert_eq!(column(&page, "author"), vec![json!("Asimov"), json!("Herbert"), json!("Simmons")]);

    // Unknown keys sort by title
    let (_, page) = app
        .get("/api/books/paginated-list?sortBy=shelf&sortDescending=true", Some(&token))
        .await;
    assert_eq!(column(&page, "title"), vec![json!("Hyperion"), json!("Foundation"), json!("Dune")]);
}

// =========================================================================
// SEARCH
// =========================================================================

#[tokio::test]
async fn test_search_combines_criteria() {
    let app = TestApp::new();
    let scifi = app.seed_genre("Sci-Fi").await;
    let dune = app.seed_book("Dune", "Herbert", "1234567890", 1965).await;
    app.seed_book("Dune Messiah", "Herbert", "1234567891", 1969).await;
    let foundation = app.seed_book("Foundation", "Asimov", "1234567892", 1951).await;
    app.tag(dune.id, scifi.id).await;
    app.tag(foundation.id, scifi.id).await;

    // Search is public
    let (status, page) = app.get("/api/books/search?genreName=sci-fi&title=dune", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["items"][0]["id"], dune.id);
    assert_eq!(page["items"][0]["genres"], json!(["Sci-Fi"]));

    let (_, page) = app.get("/api/books/search?author=herb", None).await;
    assert_eq!(page["totalCount"], 2);

    let (_, page) = app
        .get(&format!("/api/books/search?genreId={}", scifi.id), None)
        .await;
    assert_eq!(page["totalCount"], 2);

    let (_, page) = app.get("/api/books/search?isbn=1234567892&publicationYear=1951", None).await;
    assert_eq!(page["items"][0]["title"], "Foundation");

    // Blank criteria are ignored
    let (_, page) = app.get("/api/books/search?title=&author=", None).await;
    assert_eq!(page["totalCount"], 3);
}

// =========================================================================
// LENDING
// =========================================================================

#[tokio::test]
async fn test_borrow_return_borrow() {
    let app = TestApp::new();
    let book = app.seed_book("Dune", "Herbert", "1234567890", 1965).await;
    let paul = app.seed_user("paul").await;
    let jessica = app.seed_user("jessica").await;
    let token = app.user_token();
    let borrow = format!("/api/books/{}/borrow", book.id);
    let give_back = format!("/api/books/{}/return", book.id);

    let (status, body) = app.post_json(&borrow, &token, json!({"userId": paul.id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bookId"], book.id);
    assert_eq!(body["borrowerId"], paul.id);
    assert_eq!(body["borrowerUsername"], "paul");

    let (status, body) = app.post_json(&borrow, &token, json!({"userId": jessica.id})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidState");

    let (status, body) = app.post(&give_back, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isReturned"], true);

    let (status, body) = app.post_json(&borrow, &token, json!({"userId": jessica.id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["borrowerUsername"], "jessica");

    let (_, book) = app.get(&format!("/api/books/{}", book.id), Some(&token)).await;
    assert_eq!(book["borrowerId"], jessica.id);
}

#[tokio::test]
async fn test_return_available_book() {
    let app = TestApp::new();
    let book = app.seed_book("Dune", "Herbert", "1234567890", 1965).await;

    let (status, body) = app
        .post(&format!("/api/books/{}/return", book.id), &app.user_token())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidState");
}

#[tokio::test]
async fn test_borrow_unknown_book_or_user() {
    let app = TestApp::new();
    let book = app.seed_book("Dune", "Herbert", "1234567890", 1965).await;
    let paul = app.seed_user("paul").await;
    let token = app.user_token();

    let (status, body) = app
        .post_json("/api/books/999/borrow", &token, json!({"userId": paul.id}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book with ID 999 not found");

    let (status, body) = app
        .post_json(&format!("/api/books/{}/borrow", book.id), &token, json!({"userId": 999}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User with ID 999 not found");
}

// =========================================================================
// BOOKS AND GENRES
// =========================================================================

#[tokio::test]
async fn test_create_book_with_cover() {
    let app = TestApp::new();
    let body = multipart_body(
        &[
            ("title", "Dune"),
            ("author", "Herbert"),
            ("isbn", "1234567890"),
            ("publicationYear", "1965"),
        ],
        Some(("cover.png", &[137u8, 80, 78, 71][..])),
    );

    let (status, book) = app
        .send(multipart_request("POST", "/api/books", &app.admin_token(), body))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["borrowerId"], Value::Null);

    let image_url = book["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/images/books/"));
    assert_eq!(std::fs::read_dir(app.image_dir()).unwrap().count(), 1);

    let response = app.send(request("GET", &image_url, None, Body::empty())).await;
    assert_eq!(response.0, StatusCode::OK);

    // Deleting the book removes the file
    let (status, _) = app
        .delete(&format!("/api/books/{}", book["id"]), &app.admin_token())
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(std::fs::read_dir(app.image_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_create_book_rejects_invalid_input() {
    let app = TestApp::new();
    let token = app.admin_token();

    let body = multipart_body(
        &[
            ("title", "Herbert"),
            ("author", "herbert"),
            ("isbn", "12345"),
            ("publicationYear", "965"),
        ],
        None,
    );
    let (status, error) = app.send(multipart_request("POST", "/api/books", &token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = error["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"isbn"));
    assert!(fields.contains(&"publication_year"));
    assert!(fields.contains(&"title"));

    let body = multipart_body(
        &[
            ("title", "Dune"),
            ("author", "Herbert"),
            ("isbn", "1234567890"),
            ("publicationYear", "1965"),
        ],
        Some(("cover.exe", &[1u8, 2, 3][..])),
    );
    let (status, error) = app.send(multipart_request("POST", "/api/books", &token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["errors"][0]["field"], "image");
    assert_eq!(std::fs::read_dir(app.image_dir()).map(|d| d.count()).unwrap_or(0), 0);
}

#[tokio::test]
async fn test_update_book() {
    let app = TestApp::new();
    let book = app.seed_book("Dune", "Herbert", "1234567890", 1965).await;
    let token = app.admin_token();
    let uri = format!("/api/books/{}", book.id);

    let mismatched = multipart_body(
        &[
            ("id", "999"),
            ("title", "Dune"),
            ("author", "Herbert"),
            ("isbn", "1234567890"),
            ("publicationYear", "1965"),
        ],
        None,
    );
    let (status, _) = app.send(multipart_request("PUT", &uri, &token, mismatched)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = book.id.to_string();
    let body = multipart_body(
        &[
            ("id", id.as_str()),
            ("title", "Dune Messiah"),
            ("author", "Frank Herbert"),
            ("isbn", "9780441172696"),
            ("publicationYear", "1969"),
        ],
        None,
    );
    let (status, _) = app.send(multipart_request("PUT", &uri, &token, body)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, updated) = app.get(&uri, Some(&token)).await;
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["isbn"], "9780441172696");
    assert_eq!(updated["version"], 1);
}

#[tokio::test]
async fn test_delete_unknown_book() {
    let app = TestApp::new();
    let (status, body) = app.delete("/api/books/42", &app.admin_token()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchEntity");
}

#[tokio::test]
async fn test_book_genre_association() {
    let app = TestApp::new();
    let book = app.seed_book("Dune", "Herbert", "1234567890", 1965).await;
    let scifi = app.seed_genre("Sci-Fi").await;
    let token = app.admin_token();
    let uri = format!("/api/books/{}/genres/{}", book.id, scifi.id);

    let (status, _) = app.post(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    // Adding twice is harmless
    let (status, _) = app.post(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, detail) = app.get(&format!("/api/books/{}", book.id), Some(&token)).await;
    assert_eq!(detail["genres"][0]["name"], "Sci-Fi");

    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    // Removing an association that does not exist still succeeds
    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post(&format!("/api/books/{}/genres/999", book.id), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_genre_crud() {
    let app = TestApp::new();
    let token = app.admin_token();

    let (status, error) = app
        .post_json("/api/genres", &token, json!({"name": "X", "description": "short"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["errors"].as_array().unwrap().len(), 2);

    let (status, genre) = app
        .post_json(
            "/api/genres",
            &token,
            json!({"name": "Sci-Fi", "description": "Science fiction and space opera"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/genres/{}", genre["id"]);

    let (status, _) = app
        .put_json(
            &uri,
            &token,
            json!({"id": genre["id"], "name": "Science Fiction", "description": "Science fiction and space opera"}),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fetched) = app.get(&uri, Some(&app.user_token())).await;
    assert_eq!(fetched["name"], "Science Fiction");

    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =========================================================================
// USERS
// =========================================================================

#[tokio::test]
async fn test_user_lifecycle() {
    let app = TestApp::new();
    let token = app.admin_token();

    let (status, user) = app
        .post_json("/api/users", &token, json!({"username": "paul", "email": "paul@arrakis.org"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "user");

    let (status, body) = app
        .post_json("/api/users", &token, json!({"username": "paul", "email": "other@arrakis.org"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");

    let book = app.seed_book("Dune", "Herbert", "1234567890", 1965).await;
    let (status, _) = app
        .post_json(
            &format!("/api/books/{}/borrow", book.id),
            &token,
            json!({"userId": user["id"]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/users/{}", user["id"]);
    let (_, detail) = app.get(&uri, Some(&token)).await;
    assert_eq!(detail["borrowedBooks"][0]["title"], "Dune");

    // Deleting the user makes the book available again
    let (status, _) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, book) = app.get(&format!("/api/books/{}", book.id), Some(&token)).await;
    assert_eq!(book["borrowerId"], Value::Null);
}

#[tokio::test]
async fn test_paginate_users() {
    let app = TestApp::new();
    for name in ["chani", "paul", "jessica"] {
        app.seed_user(name).await;
    }

    let (status, page) = app
        .get("/api/users/paginated-list?pageSize=2", Some(&app.admin_token()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"][0]["username"], "chani");
    assert_eq!(page["items"][1]["username"], "jessica");
    assert_eq!(page["totalPages"], 2);
    assert_eq!(rels(&page), vec!["nextPage", "firstPage", "lastPage"]);
    assert!(link(&page, "lastPage")
        .starts_with("http://localhost:8080/api/users/paginated-list?"));
    assert!(link(&page, "lastPage").ends_with("pageNumber=2"));
}
