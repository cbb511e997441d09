// Error reporting through tracing

use crate::types::CatalogError;

/// Log an error raised by a user action
pub fn log_error(context: &str, error: &CatalogError) {
    tracing::error!(
        context = context,
        error_code = error.code(),
        status = error.status(),
        error = %error,
        "Catalog operation failed"
    );
}
