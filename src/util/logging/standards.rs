//! Centralised logging metadata (event names, shared keys, etc.).

/// Canonical event names used across the service.
pub mod events {
    /// HTTP request lifecycle.
    pub const REQUEST_START: &str = "request.start";
    pub const REQUEST_COMPLETE: &str = "request.complete";
    pub const REQUEST_ERROR: &str = "request.error";
    pub const REQUEST_SLOW: &str = "request.slow";

    /// Authentication flow.
    pub const AUTH_REGISTER: &str = "auth.register";
    pub const AUTH_REGISTER_REJECTED: &str = "auth.register_rejected";
    pub const AUTH_SUCCESS: &str = "auth.success";
    pub const AUTH_FAILURE: &str = "auth.failure";
    pub const AUTH_LOGOUT: &str = "auth.logout";
    pub const AUTH_DENIED: &str = "auth.denied";

    /// 河流照片检测。
    pub const DETECT_RECEIVED: &str = "detect.received";
    pub const DETECT_REJECTED: &str = "detect.rejected";
    pub const DETECT_CLASSIFIED: &str = "detect.classified";
    pub const DETECT_STORED: &str = "detect.stored";
    pub const DETECT_ERROR: &str = "detect.error";

    /// 管理员操作。
    pub const ADMIN_RESOLVE: &str = "admin.resolve";
    pub const ADMIN_GRANT: &str = "admin.grant";

    /// Storage backend.
    pub const STORAGE_PUT: &str = "storage.put";
    pub const STORAGE_DELETE: &str = "storage.delete";
    pub const STORAGE_ERROR: &str = "storage.error";
}
