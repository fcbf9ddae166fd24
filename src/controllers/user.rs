use axum::response::Response;
use serde_json::json;

use crate::controllers::base::{self, AuthCheck};
use crate::entities::{EntityError, Users};
use crate::error::AppError;
use crate::routing::RequestContext;
use crate::session::FlashKind;

pub async fn account(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let current = match base::require_auth(ctx) {
        AuthCheck::Authorized(user) => user,
        AuthCheck::Denied(response) => return Ok(response),
    };
    let users = Users::new(ctx.state.gateway.clone());
    match users.get_by_id(current.id).await? {
        Some(user) => base::render(
            ctx,
            "account/index.html",
            json!({ "title": "Your account", "user": user }),
        ),
        None => {
            // Session points at a deleted user; drop it.
            ctx.reset_session();
            Ok(base::redirect(ctx, "/login"))
        }
    }
}

pub async fn update_account(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let current = match base::require_auth(ctx) {
        AuthCheck::Authorized(user) => user,
        AuthCheck::Denied(response) => return Ok(response),
    };
    let email = ctx.form_value("email").unwrap_or("").trim().to_string();

    let users = Users::new(ctx.state.gateway.clone());
    match users.update_email(current.id, &email).await {
        Ok(()) => {
            ctx.session.email = Some(email);
            ctx.flash(FlashKind::Success, "Account updated");
        }
        Err(EntityError::Validation(errors)) => {
            for error in errors {
                ctx.flash(FlashKind::Error, error);
            }
        }
        Err(EntityError::Gateway(err)) => return Err(err.into()),
    }
    Ok(base::redirect(ctx, "/account"))
}
