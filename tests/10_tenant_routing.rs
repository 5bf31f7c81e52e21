mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;

use common::{get, is_redirect, json_body, location, session_token, StubLookup, TestApp};

#[tokio::test]
async fn apex_root_passes_through_without_session() -> Result<()> {
    let app = TestApp::new().await;

    let res = app.send(get("example.com", "/", None)).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await?;
    assert_eq!(body["data"]["name"], "Classio");
    assert_eq!(app.lookup.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn www_host_is_the_main_domain() -> Result<()> {
    let app = TestApp::new().await;

    let res = app.send(get("www.example.com", "/", None)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.lookup.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn apex_private_path_redirects_to_sign_in() -> Result<()> {
    let app = TestApp::new().await;

    let res = app.send(get("example.com", "/dashboard", None)).await?;
    assert!(is_redirect(res.status()), "unexpected status: {}", res.status());
    assert_eq!(
        location(&res).as_deref(),
        Some("https://example.com/sign-in?callbackUrl=%2Fdashboard")
    );
    Ok(())
}

#[tokio::test]
async fn tenant_without_session_redirects_to_tenant_sign_in() -> Result<()> {
    let app = TestApp::new().await;

    let res = app.send(get("acme.example.com", "/dashboard", None)).await?;
    assert!(is_redirect(res.status()));
    assert_eq!(
        location(&res).as_deref(),
        Some("https://acme.example.com/sign-in?callbackUrl=%2Fdashboard")
    );
    Ok(())
}

#[tokio::test]
async fn sign_in_redirect_honours_forwarded_proto() -> Result<()> {
    let app = TestApp::new().await;

    let mut req = get("acme.example.com", "/dashboard", None);
    req.headers_mut().insert("x-forwarded-proto", "http".parse()?);

    let res = app.send(req).await?;
    let location = location(&res).unwrap_or_default();
    assert!(location.starts_with("http://acme.example.com/sign-in?"), "got {}", location);
    Ok(())
}

#[tokio::test]
async fn unknown_tenant_redirects_to_main_site() -> Result<()> {
    let app = TestApp::new().await;
    let token = session_token();

    let res = app.send(get("notreal.example.com", "/dashboard", Some(&token))).await?;
    assert!(is_redirect(res.status()));
    assert_eq!(location(&res).as_deref(), Some("https://www.example.com/"));
    Ok(())
}

#[tokio::test]
async fn lookup_failure_fails_open() -> Result<()> {
    let app = TestApp::new().await;

    let res = app.send(get("broken.example.com", "/", None)).await?;
    assert!(!is_redirect(res.status()));
    assert!(location(&res).is_none());
    // Not rewritten: the apex root handler answers
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await?;
    assert_eq!(body["data"]["name"], "Classio");
    Ok(())
}

#[tokio::test]
async fn lookup_failure_still_requires_sign_in() -> Result<()> {
    let app = TestApp::new().await;

    let res = app.send(get("broken.example.com", "/dashboard", None)).await?;
    assert!(is_redirect(res.status()), "unexpected status: {}", res.status());
    assert_eq!(
        location(&res).as_deref(),
        Some("https://broken.example.com/sign-in?callbackUrl=%2Fdashboard")
    );
    Ok(())
}

#[tokio::test]
async fn lookup_failure_with_session_passes_through_unrewritten() -> Result<()> {
    let app = TestApp::new().await;
    let token = session_token();

    let res = app.send(get("broken.example.com", "/dashboard", Some(&token))).await?;
    assert!(!is_redirect(res.status()));
    // No tenant route matches the original path
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn lookup_failure_is_not_cached() -> Result<()> {
    let app = TestApp::new().await;

    app.send(get("broken.example.com", "/", None)).await?;
    app.send(get("broken.example.com", "/", None)).await?;
    assert_eq!(app.lookup.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn valid_tenant_with_session_is_rewritten() -> Result<()> {
    let app = TestApp::new().await;
    let token = session_token();

    let res = app.send(get("acme.example.com", "/dashboard?x=1", Some(&token))).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await?;
    let data = &body["data"];
    assert_eq!(data["subdomain"], "acme");
    assert_eq!(data["page"], "/dashboard");
    assert_eq!(data["etablissementId"], "etab-1");
    assert_eq!(data["etablissementNom"], "Lycée Acme");
    assert_eq!(data["user"]["role"], "enseignant");
    Ok(())
}

#[tokio::test]
async fn tenant_root_rewrites_to_tenant_home() -> Result<()> {
    let app = TestApp::new().await;
    let token = session_token();

    let res = app.send(get("acme.example.com", "/", Some(&token))).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await?;
    assert_eq!(body["data"]["page"], "/");
    assert_eq!(body["data"]["etablissementId"], "etab-1");
    Ok(())
}

#[tokio::test]
async fn tenant_sign_in_is_public() -> Result<()> {
    let app = TestApp::new().await;

    // Rewritten without a session; the page itself is not served by this app
    let res = app.send(get("acme.example.com", "/sign-in", None)).await?;
    assert!(!is_redirect(res.status()));

    let body = json_body(res).await?;
    assert_eq!(body["data"]["page"], "/sign-in");
    assert!(body["data"]["user"].is_null());
    Ok(())
}

#[tokio::test]
async fn verdicts_are_cached_across_requests() -> Result<()> {
    let lookup = Arc::new(StubLookup::new().with_tenant("acme", "etab-1", "Lycée Acme"));
    let app = TestApp::with_lookup(lookup.clone()).await;
    let token = session_token();

    app.send(get("acme.example.com", "/dashboard", Some(&token))).await?;
    app.send(get("acme.example.com", "/eleves", Some(&token))).await?;
    app.send(get("notreal.example.com", "/", None)).await?;
    app.send(get("notreal.example.com", "/", None)).await?;

    assert_eq!(lookup.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn excluded_paths_skip_the_router() -> Result<()> {
    let app = TestApp::new().await;

    let res = app
        .send(get("notreal.example.com", "/api/etablissements/validate?subdomain=acme", None))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.lookup.calls(), 0);

    let res = app.send(get("example.com", "/_next/static/chunk.js", None)).await?;
    assert!(!is_redirect(res.status()));
    Ok(())
}

#[tokio::test]
async fn spoofed_tenant_params_are_overwritten() -> Result<()> {
    let app = TestApp::new().await;
    let token = session_token();

    let mut req = get(
        "acme.example.com",
        "/dashboard?etablissementId=etab-999&etablissementNom=Evil",
        Some(&token),
    );
    req.headers_mut().insert("x-etablissement-id", "etab-999".parse()?);

    let res = app.send(req).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await?;
    assert_eq!(body["data"]["etablissementId"], "etab-1");
    assert_eq!(body["data"]["etablissementNom"], "Lycée Acme");
    Ok(())
}

#[tokio::test]
async fn direct_tenant_route_without_context_is_not_found() -> Result<()> {
    let app = TestApp::new().await;
    let token = session_token();

    let mut req = get("example.com", "/etablissements/acme/dashboard", Some(&token));
    req.headers_mut().insert("x-etablissement-id", "etab-999".parse()?);

    let res = app.send(req).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn invalid_session_token_counts_as_no_session() -> Result<()> {
    let app = TestApp::new().await;

    let res = app.send(get("acme.example.com", "/dashboard", Some("not-a-jwt"))).await?;
    assert!(is_redirect(res.status()));
    Ok(())
}
