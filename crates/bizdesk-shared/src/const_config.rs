//! Stores settings that are not expected to need to change but grouped together
//! for discoverability and reuse. Each constant should be prefixed by the module
//! name to allow importing the constant only and still be readable

pub mod storage {
    /// Present only while a branch is logged in
    pub const STORAGE_KEY_BRANCH_TOKEN: &str = "bizdesk.branch_token";
    /// Device level preference, kept across logins and logouts
    pub const STORAGE_KEY_THEME: &str = "bizdesk.theme";
    /// Owned by the backend client, holds the remote auth session
    pub const STORAGE_KEY_REMOTE_SESSION: &str = "bizdesk.remote_session";
}

pub mod client {
    /// Sent with every request while a branch is logged in
    pub const HEADER_BRANCH_TOKEN: &str = "x-branch-token";
    pub const HEADER_API_KEY: &str = "apikey";
    /// Asks the backend to return the written rows
    pub const HEADER_PREFER: &str = "Prefer";
    pub const PREFER_RETURN_REPRESENTATION: &str = "return=representation";
    /// Query parameter read once when the dashboard mounts
    pub const QUERY_PARAM_PAGE: &str = "page";
    pub const DEFAULT_THEME: &str = "light";
    pub const DEFAULT_CURRENCY: &str = "USD";
}

pub mod rpc {
    pub const RPC_LOGIN_BRANCH: &str = "login_branch";
    pub const RPC_CREATE_BRANCH_ACCOUNT: &str = "create_branch_account";
    pub const RPC_GET_NEXT_BRANCH_NUMBER: &str = "get_next_branch_number";
    pub const RPC_UPDATE_BRANCH_SETTINGS: &str = "update_branch_settings";
    pub const RPC_RESET_BRANCH_PASSWORD: &str = "reset_branch_password";
    pub const RPC_DELETE_BRANCH: &str = "delete_branch";
    pub const RPC_SET_SECURITY_PIN: &str = "set_security_pin";
    pub const RPC_VERIFY_SECURITY_PIN: &str = "verify_security_pin";
}

pub mod path {
    mod path_spec;
    pub use path_spec::PathSpec;
    pub const PATH_AUTH_LOGOUT: PathSpec = PathSpec::post("/auth/v1/logout");
    pub const PATH_AUTH_RECOVER: PathSpec = PathSpec::post("/auth/v1/recover");
    pub const PATH_AUTH_SIGNUP: PathSpec = PathSpec::post("/auth/v1/signup");
    pub const PATH_AUTH_TOKEN_PASSWORD: PathSpec =
        PathSpec::post("/auth/v1/token?grant_type=password");
    pub const PATH_AUTH_TOKEN_REFRESH: PathSpec =
        PathSpec::post("/auth/v1/token?grant_type=refresh_token");
    pub const PATH_AUTH_USER: PathSpec = PathSpec::get("/auth/v1/user");
    pub const PATH_AUTH_USER_UPDATE: PathSpec = PathSpec::put("/auth/v1/user");
    /// Tables and procedures all live under this prefix
    pub const PATH_REST_PREFIX: &str = "/rest/v1";
    pub const PATH_RPC_PREFIX: &str = "/rest/v1/rpc";
    pub const TABLE_BRANCHES: &str = "branches";
    pub const TABLE_ENTERPRISES: &str = "enterprises";
    pub const TABLE_PROFILES: &str = "profiles";
}
