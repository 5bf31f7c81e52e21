pub mod response;
pub mod tenant_router;

pub use response::{ApiResponse, ApiResult};
pub use tenant_router::{rewrite_target, tenant_router_middleware, RouteDecision, TenantRouter};
