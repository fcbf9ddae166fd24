use crate::database::{Gateway, GatewayError};

/// Schema statements, applied in order inside one transaction. Statements are
/// idempotent so reapplying on startup is safe.
const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "users" (
        "id" BIGSERIAL PRIMARY KEY,
        "username" TEXT NOT NULL UNIQUE,
        "email" TEXT NOT NULL UNIQUE,
        "password_hash" TEXT NOT NULL,
        "role" TEXT NOT NULL DEFAULT 'customer',
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "categories" (
        "id" BIGSERIAL PRIMARY KEY,
        "name" TEXT NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "products" (
        "id" BIGSERIAL PRIMARY KEY,
        "name" TEXT NOT NULL,
        "description" TEXT NOT NULL DEFAULT '',
        "price" NUMERIC(12, 2) NOT NULL,
        "category_id" BIGINT REFERENCES "categories" ("id") ON DELETE SET NULL,
        "image" TEXT,
        "stock" INTEGER NOT NULL DEFAULT 0,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS "products_category_id_idx" ON "products" ("category_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "products_name_idx" ON "products" ("name")"#,
];

pub async fn run(gateway: &Gateway) -> Result<(), GatewayError> {
    gateway.apply_migrations(STATEMENTS).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_idempotent() {
        for statement in STATEMENTS {
            assert!(statement.contains("IF NOT EXISTS"));
        }
    }
}
