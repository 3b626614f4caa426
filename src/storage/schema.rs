// ============================================================================
// Postgres Schema
// ============================================================================
//
// Applied statement by statement at start-up; every statement is
// idempotent. Money columns hold minor units.
//
// ============================================================================

pub const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    price_minor BIGINT NOT NULL CHECK (price_minor >= 0),
    stock INTEGER NOT NULL CHECK (stock >= 0),
    critical_stock_level INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE
)"#,
    r#"
CREATE TABLE IF NOT EXISTS cart_items (
    user_id UUID NOT NULL,
    product_id UUID NOT NULL REFERENCES products (id),
    count INTEGER NOT NULL CHECK (count BETWEEN 1 AND 100),
    added_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (user_id, product_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    order_date TIMESTAMPTZ NOT NULL,
    total_amount_minor BIGINT NOT NULL,
    status TEXT NOT NULL,
    shipping_address TEXT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS order_items (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products (id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price_minor BIGINT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS order_items_order_id ON order_items (order_id)",
    r#"
CREATE TABLE IF NOT EXISTS transactions (
    id UUID PRIMARY KEY,
    transaction_type TEXT NOT NULL,
    amount_minor BIGINT NOT NULL,
    transaction_date TIMESTAMPTZ NOT NULL,
    status TEXT NOT NULL,
    order_id UUID NOT NULL REFERENCES orders (id),
    user_id UUID NOT NULL
)"#,
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS transactions_one_purchase_per_order
    ON transactions (order_id) WHERE transaction_type = 'Purchase'"#,
    r#"
CREATE TABLE IF NOT EXISTS order_returns (
    id UUID PRIMARY KEY,
    order_id UUID NOT NULL REFERENCES orders (id),
    user_id UUID NOT NULL,
    return_reason TEXT NOT NULL,
    return_description TEXT NOT NULL,
    status TEXT NOT NULL,
    refund_amount_minor BIGINT,
    admin_note TEXT,
    refund_transaction_id UUID UNIQUE REFERENCES transactions (id),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CHECK (status NOT IN ('Approved', 'Completed') OR refund_amount_minor IS NOT NULL)
)"#,
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS order_returns_one_open_per_order
    ON order_returns (order_id) WHERE status IN ('Pending', 'Approved')"#,
    r#"
CREATE TABLE IF NOT EXISTS ledger_audit (
    event_id UUID PRIMARY KEY,
    aggregate_type TEXT NOT NULL,
    aggregate_id UUID NOT NULL,
    event_type TEXT NOT NULL,
    event_data TEXT NOT NULL,
    correlation_id UUID NOT NULL,
    user_id UUID,
    recorded_at TIMESTAMPTZ NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS ledger_audit_aggregate ON ledger_audit (aggregate_id, recorded_at)",
];
