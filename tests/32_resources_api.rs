mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use awards_market_api::permission::Role;

#[tokio::test]
async fn root_lists_resources() -> Result<()> {
    let (status, body) = common::send("GET", "/", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let resources = body["data"]["resources"].as_array().cloned().unwrap_or_default();
    assert!(resources.contains(&json!("marketplace_ads")), "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn health_reports_unreachable_database() -> Result<()> {
    let (status, body) = common::send("GET", "/health", None, None).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn unknown_resource_is_not_found() -> Result<()> {
    let token = common::token(Role::Admin, 1, None);
    let (status, body) = common::send("GET", "/api/users", Some(&token), None).await?;

    assert_eq!(status, StatusCode::NOT_FOUND, "body: {}", body);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn public_user_cannot_create_awards() -> Result<()> {
    let token = common::token(Role::Public, 5, None);
    let award = json!({ "name": "Chef of the Year", "country": "IT", "summary": "x", "cover_image": "c.png" });
    let (status, body) = common::send("POST", "/api/awards", Some(&token), Some(award)).await?;

    assert_eq!(status, StatusCode::FORBIDDEN, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn supplier_cannot_create_ads_for_another_supplier() -> Result<()> {
    let token = common::token(Role::Supplier, 2, Some(10));
    let ad = json!({ "supplier_id": 11, "title": "Oven", "short_desc": "Barely used" });
    let (status, body) = common::send("POST", "/api/marketplace_ads", Some(&token), Some(ad)).await?;

    assert_eq!(status, StatusCode::FORBIDDEN, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn missing_required_fields_are_listed() -> Result<()> {
    let token = common::token(Role::Admin, 1, None);
    let (status, body) = common::send("POST", "/api/awards", Some(&token), Some(json!({ "name": "Best Bakery" }))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["country"].is_string(), "body: {}", body);
    assert!(body["field_errors"].get("name").is_none(), "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn unknown_sort_column_is_rejected() -> Result<()> {
    let token = common::token(Role::Admin, 1, None);
    let (status, body) = common::send("GET", "/api/awards?sortBy=password", Some(&token), None).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    assert!(body["field_errors"]["sortBy"].is_string(), "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn non_numeric_category_is_rejected() -> Result<()> {
    let token = common::token(Role::Public, 3, None);
    let (status, body) = common::send("GET", "/api/marketplace_ads?category_id=abc", Some(&token), None).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn non_numeric_id_is_rejected() -> Result<()> {
    let token = common::token(Role::Admin, 1, None);
    let (status, body) = common::send("GET", "/api/awards/abc", Some(&token), None).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn array_body_is_rejected() -> Result<()> {
    let token = common::token(Role::Admin, 1, None);
    let (status, body) = common::send("POST", "/api/categories", Some(&token), Some(json!([1, 2, 3]))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn duplicate_query_parameters_get_a_json_error() -> Result<()> {
    let token = common::token(Role::Admin, 1, None);

    for uri in ["/api/awards?page=1&page=2", "/api/awards?sortBy=name&sort_by=country"] {
        let (status, body) = common::send("GET", uri, Some(&token), None).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}: {}", uri, body);
        assert_eq!(body["error"], true, "{}: {}", uri, body);
        assert_eq!(body["code"], "BAD_REQUEST", "{}: {}", uri, body);
        assert!(body["message"].is_string(), "{}: {}", uri, body);
    }
    Ok(())
}
