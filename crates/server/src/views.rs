//! Server-rendered pages.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

/// Credential form. Field messages are shown next to their inputs, `errors`
/// above the form.
#[derive(Template, Debug, Default)]
#[template(path = "login.html")]
pub struct LoginView {
    pub challenge: String,
    pub store: String,
    pub username: String,
    pub remember_me: bool,
    pub errors: Vec<String>,
    pub challenge_error: Option<String>,
    pub store_error: Option<String>,
    pub username_error: Option<String>,
    pub password_error: Option<String>,
}

#[derive(Template, Debug)]
#[template(path = "logout.html")]
pub struct LogoutView {
    pub challenge: String,
    pub redirect_url: Option<String>,
}

#[derive(Template, Debug)]
#[template(path = "logout_rejected.html")]
pub struct LogoutRejectedView;

#[derive(Template, Debug)]
#[template(path = "logged_out.html")]
pub struct LoggedOutView;

#[derive(Template, Debug)]
#[template(path = "error.html")]
pub struct ErrorView {
    pub trace_identifier: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub error_hint: Option<String>,
    pub error_debug: Option<String>,
}

pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_view_escapes_and_keeps_input() {
        let html = LoginView {
            challenge: "abc".into(),
            store: "ldap".into(),
            username: "<alice>".into(),
            remember_me: true,
            errors: vec!["Wrong password".into()],
            ..LoginView::default()
        }
        .render()
        .unwrap();
        assert!(!html.contains("<alice>"));
        assert!(html.contains("alice"));
        assert!(html.contains("Wrong password"));
        assert!(html.contains("checked"));
        assert!(html.contains(r#"name="challenge" value="abc""#));
    }

    #[test]
    fn error_view_hides_absent_debug() {
        let html = ErrorView {
            trace_identifier: "trace-1".into(),
            error: Some("invalid_request".into()),
            error_description: None,
            error_hint: None,
            error_debug: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("invalid_request"));
        assert!(html.contains("trace-1"));
        assert!(!html.contains("<pre>"));
    }
}
