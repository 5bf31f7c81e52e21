// handlers/etablissements/mod.rs - Tenant lookup endpoint and tenant-scoped routes

pub mod tenant;
pub mod validate;

pub use tenant::{tenant_home, tenant_page, TenantParams};
pub use validate::{validate_get, ValidateQuery};
