use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Content security policy for HTML pages: same-origin scripts and styles only,
/// no inline script, no framing.
const PAGE_CSP: &str = "default-src 'self'; \
                        script-src 'self'; \
                        style-src 'self' 'unsafe-inline'; \
                        connect-src 'self'; \
                        frame-ancestors 'none'";

/// Content security policy for JSON routes.
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let path = req.uri().path();
    let is_page_route = path == "/" || path.starts_with("/static/");

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("no-referrer"),
    );

    let csp = if is_page_route { PAGE_CSP } else { API_CSP };
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(csp),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "page" }))
            .route("/api", get(|| async { "{}" }))
            .layer(from_fn(security_headers_middleware))
    }

    async fn csp_for(path: &str) -> String {
        let res = app()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        res.headers()[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn page_allows_same_origin_scripts() {
        let csp = csp_for("/").await;
        assert!(csp.contains("script-src 'self'"));
        assert!(!csp.contains("unsafe-eval"));
    }

    #[tokio::test]
    async fn api_routes_get_strict_policy() {
        assert_eq!(csp_for("/api").await, API_CSP);
    }
}
