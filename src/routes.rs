use async_trait::async_trait;
use axum::http::Method;
use axum::response::Response;

use crate::config::AppConfig;
use crate::controllers::{admin, auth, error, home, product, user};
use crate::error::AppError;
use crate::middleware::GuardRegistry;
use crate::routing::{DispatchTarget, RequestContext, RouteTable, RouterError};

/// Every dispatchable action in the application. Routes reference these
/// variants directly, so the full action set is a closed enum checked at
/// compile time rather than a string looked up per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    HomeIndex,
    LoginForm,
    Login,
    RegisterForm,
    Register,
    Logout,
    ProductsIndex,
    ProductShow,
    ProductSearch,
    Account,
    AccountUpdate,
    AdminDashboard,
    AdminProducts,
    AdminProductNew,
    AdminProductCreate,
    AdminProductEdit,
    AdminProductUpdate,
    AdminProductDelete,
    NotFound,
}

#[async_trait]
impl DispatchTarget for AppAction {
    async fn invoke(
        &self,
        ctx: &mut RequestContext,
        args: &[String],
    ) -> Result<Response, AppError> {
        match self {
            AppAction::HomeIndex => home::index(ctx).await,
            AppAction::LoginForm => auth::login_form(ctx).await,
            AppAction::Login => auth::login(ctx).await,
            AppAction::RegisterForm => auth::register_form(ctx).await,
            AppAction::Register => auth::register(ctx).await,
            AppAction::Logout => auth::logout(ctx).await,
            AppAction::ProductsIndex => product::index(ctx).await,
            AppAction::ProductShow => product::show(ctx, args).await,
            AppAction::ProductSearch => product::search(ctx).await,
            AppAction::Account => user::account(ctx).await,
            AppAction::AccountUpdate => user::update_account(ctx).await,
            AppAction::AdminDashboard => admin::dashboard(ctx).await,
            AppAction::AdminProducts => admin::products(ctx).await,
            AppAction::AdminProductNew => admin::new_product_form(ctx).await,
            AppAction::AdminProductCreate => admin::create_product(ctx).await,
            AppAction::AdminProductEdit => admin::edit_product_form(ctx, args).await,
            AppAction::AdminProductUpdate => admin::update_product(ctx, args).await,
            AppAction::AdminProductDelete => admin::delete_product(ctx, args).await,
            AppAction::NotFound => error::not_found(ctx).await,
        }
    }
}

/// Build the full route table. Registration order matters: literal paths are
/// registered before overlapping parameterized ones so the literal wins.
pub fn build(config: &AppConfig) -> Result<RouteTable<AppAction>, RouterError> {
    let registry = GuardRegistry::with_builtin(&config.security);
    let mut table = RouteTable::new(
        config.server.base_path.clone(),
        registry,
        AppAction::NotFound,
    );

    table.register(Method::GET, "/", AppAction::HomeIndex, &[])?;

    table.register(Method::GET, "/login", AppAction::LoginForm, &[])?;
    table.register(Method::POST, "/login", AppAction::Login, &["throttle", "csrf"])?;
    table.register(Method::GET, "/register", AppAction::RegisterForm, &[])?;
    table.register(
        Method::POST,
        "/register",
        AppAction::Register,
        &["throttle", "csrf"],
    )?;
    table.register(Method::POST, "/logout", AppAction::Logout, &["auth", "csrf"])?;

    table.register(Method::GET, "/products", AppAction::ProductsIndex, &[])?;
    table.register(Method::GET, "/product/{id}", AppAction::ProductShow, &[])?;
    table.register(Method::GET, "/search", AppAction::ProductSearch, &[])?;

    table.register(Method::GET, "/account", AppAction::Account, &["auth"])?;
    table.register(
        Method::POST,
        "/account",
        AppAction::AccountUpdate,
        &["auth", "csrf"],
    )?;

    table.register(
        Method::GET,
        "/admin",
        AppAction::AdminDashboard,
        &["auth", "admin"],
    )?;
    table.register(
        Method::GET,
        "/admin/products",
        AppAction::AdminProducts,
        &["auth", "admin"],
    )?;
    table.register(
        Method::GET,
        "/admin/products/new",
        AppAction::AdminProductNew,
        &["auth", "admin"],
    )?;
    table.register(
        Method::POST,
        "/admin/products/new",
        AppAction::AdminProductCreate,
        &["auth", "admin", "csrf"],
    )?;
    table.register(
        Method::GET,
        "/admin/products/{id}/edit",
        AppAction::AdminProductEdit,
        &["auth", "admin"],
    )?;
    table.register(
        Method::POST,
        "/admin/products/{id}/edit",
        AppAction::AdminProductUpdate,
        &["auth", "admin", "csrf"],
    )?;
    table.register(
        Method::POST,
        "/admin/products/{id}/delete",
        AppAction::AdminProductDelete,
        &["auth", "admin", "csrf"],
    )?;

    Ok(table)
}
