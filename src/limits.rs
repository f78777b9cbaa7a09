//! Hard limits. Anything larger is rejected with `EngineError::LimitExceeded`.

pub const MAX_TENANTS: usize = 1024;
pub const MAX_TENANT_NAME_LEN: usize = 128;

/// Student, instructor, equipment names and free-text fields.
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TEMPLATE_LEN: usize = 2_000;

pub const MAX_BOOKINGS_PER_TENANT: usize = 50_000;
pub const MAX_ALLOCATIONS_PER_TENANT: usize = 50_000;
pub const MAX_STUDENTS_PER_TENANT: usize = 10_000;
pub const MAX_PAYMENTS_PER_TENANT: usize = 200_000;

/// Upper bound on `original_id` hops followed while resolving a chain root.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Sent messages kept in the dispatcher outbox; oldest are dropped first.
pub const MAX_OUTBOX_LEN: usize = 500;
