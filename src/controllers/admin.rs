use axum::response::Response;
use rust_decimal::Decimal;
use serde_json::json;

use crate::controllers::{base, error};
use crate::entities::{EntityError, NewProduct, Products};
use crate::error::AppError;
use crate::routing::RequestContext;
use crate::session::FlashKind;

const PER_PAGE: i64 = 20;

pub async fn dashboard(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let products = Products::new(ctx.state.gateway.clone());
    let product_count = products.count_all().await?;
    base::render(
        ctx,
        "admin/dashboard.html",
        json!({ "title": "Admin", "product_count": product_count }),
    )
}

pub async fn products(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let page = ctx
        .query_value("page")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    let products = Products::new(ctx.state.gateway.clone());
    let (items, total) = products.get_page(page, PER_PAGE, None).await?;
    base::render(
        ctx,
        "admin/products.html",
        json!({
            "title": "Manage products",
            "products": items,
            "page": page,
            "total_pages": ((total + PER_PAGE - 1) / PER_PAGE).max(1),
        }),
    )
}

pub async fn new_product_form(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let form_action = format!(
        "{}/admin/products/new",
        ctx.state.config.server.base_path
    );
    base::render(
        ctx,
        "admin/product_form.html",
        json!({
            "title": "New product",
            "heading": "New product",
            "form_action": form_action,
            "product": {},
        }),
    )
}

pub async fn create_product(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let input = match parse_product_form(ctx) {
        Ok(input) => input,
        Err(errors) => {
            flash_all(ctx, errors);
            return Ok(base::redirect(ctx, "/admin/products/new"));
        }
    };
    let products = Products::new(ctx.state.gateway.clone());
    match products.create(input).await {
        Ok(id) => {
            ctx.flash(FlashKind::Success, "Product created");
            Ok(base::redirect(ctx, &format!("/admin/products/{}/edit", id)))
        }
        Err(EntityError::Validation(errors)) => {
            flash_all(ctx, errors);
            Ok(base::redirect(ctx, "/admin/products/new"))
        }
        Err(EntityError::Gateway(err)) => Err(err.into()),
    }
}

pub async fn edit_product_form(
    ctx: &mut RequestContext,
    args: &[String],
) -> Result<Response, AppError> {
    let id: i64 = match args.first().and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => return error::not_found(ctx).await,
    };
    let products = Products::new(ctx.state.gateway.clone());
    match products.get_by_id(id).await? {
        Some(product) => {
            let form_action = format!(
                "{}/admin/products/{}/edit",
                ctx.state.config.server.base_path, id
            );
            base::render(
                ctx,
                "admin/product_form.html",
                json!({
                    "title": "Edit product",
                    "heading": format!("Edit: {}", product.name),
                    "form_action": form_action,
                    "product": product,
                }),
            )
        }
        None => error::not_found(ctx).await,
    }
}

pub async fn update_product(
    ctx: &mut RequestContext,
    args: &[String],
) -> Result<Response, AppError> {
    let id: i64 = match args.first().and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => return error::not_found(ctx).await,
    };
    let back = format!("/admin/products/{}/edit", id);
    let input = match parse_product_form(ctx) {
        Ok(input) => input,
        Err(errors) => {
            flash_all(ctx, errors);
            return Ok(base::redirect(ctx, &back));
        }
    };
    let products = Products::new(ctx.state.gateway.clone());
    match products.update(id, input).await {
        Ok(()) => {
            ctx.flash(FlashKind::Success, "Product updated");
            Ok(base::redirect(ctx, &back))
        }
        Err(EntityError::Validation(errors)) => {
            flash_all(ctx, errors);
            Ok(base::redirect(ctx, &back))
        }
        Err(EntityError::Gateway(crate::database::GatewayError::NotFound(_))) => {
            error::not_found(ctx).await
        }
        Err(EntityError::Gateway(err)) => Err(err.into()),
    }
}

pub async fn delete_product(
    ctx: &mut RequestContext,
    args: &[String],
) -> Result<Response, AppError> {
    let id: i64 = match args.first().and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => return error::not_found(ctx).await,
    };
    let products = Products::new(ctx.state.gateway.clone());
    if products.delete(id).await? == 0 {
        return error::not_found(ctx).await;
    }
    ctx.flash(FlashKind::Success, "Product deleted");
    Ok(base::redirect(ctx, "/admin/products"))
}

fn flash_all(ctx: &mut RequestContext, errors: Vec<String>) {
    for error in errors {
        ctx.flash(FlashKind::Error, error);
    }
}

fn parse_product_form(ctx: &RequestContext) -> Result<NewProduct, Vec<String>> {
    let mut errors = Vec::new();
    let name = ctx.form_value("name").unwrap_or("").trim().to_string();
    let description = ctx
        .form_value("description")
        .unwrap_or("")
        .trim()
        .to_string();
    let price = match ctx.form_value("price").unwrap_or("").trim().parse::<Decimal>() {
        Ok(price) => price,
        Err(_) => {
            errors.push("Price must be a decimal number".to_string());
            Decimal::ZERO
        }
    };
    let stock = match ctx.form_value("stock").unwrap_or("0").trim().parse::<i32>() {
        Ok(stock) => stock,
        Err(_) => {
            errors.push("Stock must be a whole number".to_string());
            0
        }
    };
    let category_id = match ctx.form_value("category_id").map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push("Category must be a numeric id".to_string());
                None
            }
        },
    };
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(NewProduct {
        name,
        description,
        price,
        category_id,
        image: None,
        stock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing;
    use axum::http::Method;

    fn ctx_with_form(pairs: &[(&str, &str)]) -> RequestContext {
        let mut ctx = RequestContext::new(
            testing::state(),
            Method::POST,
            "/admin/products/new",
            Session::anonymous(),
        );
        for (k, v) in pairs {
            ctx.form.insert(k.to_string(), v.to_string());
        }
        ctx
    }

    #[tokio::test]
    async fn parses_a_complete_form() {
        let ctx = ctx_with_form(&[
            ("name", "Mug"),
            ("description", "Ceramic"),
            ("price", "9.99"),
            ("stock", "4"),
            ("category_id", "2"),
        ]);
        let input = parse_product_form(&ctx).unwrap();
        assert_eq!(input.name, "Mug");
        assert_eq!(input.price.to_string(), "9.99");
        assert_eq!(input.stock, 4);
        assert_eq!(input.category_id, Some(2));
    }

    #[tokio::test]
    async fn collects_all_parse_failures() {
        let ctx = ctx_with_form(&[
            ("name", "Mug"),
            ("price", "nine"),
            ("stock", "many"),
            ("category_id", "x"),
        ]);
        let errors = parse_product_form(&ctx).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[tokio::test]
    async fn empty_category_is_none() {
        let ctx = ctx_with_form(&[("name", "Mug"), ("price", "1.00")]);
        let input = parse_product_form(&ctx).unwrap();
        assert_eq!(input.category_id, None);
        assert_eq!(input.stock, 0);
    }
}
