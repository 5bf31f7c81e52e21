// handlers/mod.rs - HTTP handlers
//
// public:         service description and health, no tenant context
// etablissements: validation endpoint (tenant lookup protocol) and the
//                 tenant-scoped namespace that rewritten requests land in

pub mod etablissements;
pub mod public;

pub use etablissements::{tenant_home, tenant_page, validate_get, TenantParams};
pub use public::{health, root};
