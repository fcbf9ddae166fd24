use axum::response::Response;
use serde_json::json;

use crate::controllers::{base, error};
use crate::entities::Products;
use crate::error::AppError;
use crate::routing::RequestContext;

const PER_PAGE: i64 = 12;

pub async fn index(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let page = parse_page(ctx.query_value("page"));
    let category_id = ctx.query_value("category").and_then(|v| v.parse().ok());
    let products = Products::new(ctx.state.gateway.clone());
    let (items, total) = products.get_page(page, PER_PAGE, category_id).await?;
    base::render(
        ctx,
        "products/index.html",
        json!({
            "title": "Products",
            "products": items,
            "page": page,
            "total": total,
            "total_pages": total_pages(total),
        }),
    )
}

/// Path parameters arrive as strings; the id is parsed here, and anything
/// non-numeric is a plain not-found, not an error.
pub async fn show(ctx: &mut RequestContext, args: &[String]) -> Result<Response, AppError> {
    let id: i64 = match args.first().and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => return error::not_found(ctx).await,
    };
    let products = Products::new(ctx.state.gateway.clone());
    match products.get_by_id(id).await? {
        Some(product) => base::render(
            ctx,
            "products/show.html",
            json!({ "title": product.name.clone(), "product": product }),
        ),
        None => error::not_found(ctx).await,
    }
}

pub async fn search(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let term = ctx.query_value("q").unwrap_or("").trim().to_string();
    if term.is_empty() {
        return Ok(base::redirect(ctx, "/products"));
    }
    let page = parse_page(ctx.query_value("page"));
    let products = Products::new(ctx.state.gateway.clone());
    let (items, total) = products.search(&term, page, PER_PAGE).await?;
    base::render(
        ctx,
        "products/index.html",
        json!({
            "title": format!("Search: {}", term),
            "term": term,
            "products": items,
            "page": page,
            "total": total,
            "total_pages": total_pages(total),
        }),
    )
}

fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

fn total_pages(total: i64) -> i64 {
    ((total + PER_PAGE - 1) / PER_PAGE).max(1)
}
