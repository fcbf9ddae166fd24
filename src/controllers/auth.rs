use axum::response::Response;
use serde_json::json;

use crate::controllers::base;
use crate::entities::{EntityError, NewUser, Users};
use crate::error::AppError;
use crate::routing::RequestContext;
use crate::session::FlashKind;

pub async fn login_form(ctx: &mut RequestContext) -> Result<Response, AppError> {
    if ctx.session.logged_in {
        return Ok(base::redirect(ctx, "/account"));
    }
    base::render(ctx, "auth/login.html", json!({ "title": "Log in" }))
}

pub async fn login(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let identifier = ctx.form_value("username").unwrap_or("").trim().to_string();
    let password = ctx.form_value("password").unwrap_or("").to_string();
    if identifier.is_empty() || password.is_empty() {
        ctx.flash(FlashKind::Error, "Username and password are required");
        return Ok(base::redirect(ctx, "/login"));
    }

    let users = Users::new(ctx.state.gateway.clone());
    match users.verify_credentials(&identifier, &password).await? {
        Some(user) => {
            // Rotate the session id on privilege change.
            ctx.reset_session();
            ctx.session.sign_in(&user);
            ctx.flash(
                FlashKind::Success,
                format!("Welcome back, {}", user.username),
            );
            Ok(base::redirect(ctx, "/"))
        }
        None => {
            ctx.flash(FlashKind::Error, "Invalid username or password");
            Ok(base::redirect(ctx, "/login"))
        }
    }
}

pub async fn register_form(ctx: &mut RequestContext) -> Result<Response, AppError> {
    if ctx.session.logged_in {
        return Ok(base::redirect(ctx, "/account"));
    }
    base::render(ctx, "auth/register.html", json!({ "title": "Register" }))
}

pub async fn register(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let new_user = NewUser {
        username: ctx.form_value("username").unwrap_or("").trim().to_string(),
        email: ctx.form_value("email").unwrap_or("").trim().to_string(),
        password: ctx.form_value("password").unwrap_or("").to_string(),
    };

    let users = Users::new(ctx.state.gateway.clone());
    match users.create(new_user).await {
        Ok(_) => {
            ctx.flash(FlashKind::Success, "Account created, you can now log in");
            Ok(base::redirect(ctx, "/login"))
        }
        Err(EntityError::Validation(errors)) => {
            for error in errors {
                ctx.flash(FlashKind::Error, error);
            }
            Ok(base::redirect(ctx, "/register"))
        }
        Err(EntityError::Gateway(err)) => Err(err.into()),
    }
}

pub async fn logout(ctx: &mut RequestContext) -> Result<Response, AppError> {
    ctx.reset_session();
    ctx.flash(FlashKind::Info, "You have been logged out");
    Ok(base::redirect(ctx, "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn blank_login_redirects_back_with_flash() {
        let mut ctx = RequestContext::new(
            testing::state(),
            Method::POST,
            "/login",
            Session::anonymous(),
        );
        let response = login(&mut ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
        assert_eq!(ctx.session.flash_messages.len(), 1);
    }

    #[tokio::test]
    async fn logout_rotates_the_session() {
        let mut session = Session::anonymous();
        session.logged_in = true;
        let old_id = session.id.clone();
        let mut ctx =
            RequestContext::new(testing::state(), Method::POST, "/logout", session);

        let response = logout(&mut ctx).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(!ctx.session.logged_in);
        assert_ne!(ctx.session.id, old_id);
        assert_eq!(ctx.dropped_session.as_deref(), Some(old_id.as_str()));
    }
}
