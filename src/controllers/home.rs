use axum::response::Response;
use serde_json::json;

use crate::controllers::base;
use crate::entities::Products;
use crate::error::AppError;
use crate::routing::RequestContext;

pub async fn index(ctx: &mut RequestContext) -> Result<Response, AppError> {
    let products = Products::new(ctx.state.gateway.clone());
    let (featured, total) = products.get_page(1, 6, None).await?;
    base::render(
        ctx,
        "home/index.html",
        json!({
            "title": "Storefront",
            "featured": featured,
            "product_count": total,
        }),
    )
}
