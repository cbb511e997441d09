// Error codes attached to logged catalog errors

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const INVALID_FORMAT: &str = "VALIDATION_1003";
}

pub mod backend {
    pub const SERVER_ERROR: &str = "BACKEND_2001";
    pub const UNREACHABLE: &str = "BACKEND_2002";
    pub const NOT_FOUND: &str = "BACKEND_2004";
    pub const UNSUPPORTED: &str = "BACKEND_2005";
}

pub mod config {
    pub const INVALID: &str = "CONFIG_3001";
    pub const IO: &str = "CONFIG_3002";
}
