//! API utilities for frontend-backend communication
//!
//! Provides helper functions for constructing API URLs.

/// Get the base URL for API requests
///
/// Constructs the API base URL from the current window location,
/// using port 3000 for the backend server.
///
/// # Returns
/// - API base URL like "http://localhost:3000" or "https://example.com:3000"
/// - Empty string if window is not available
pub fn api_base() -> String {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return String::new(),
    };
    let location = window.location();
    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let hostname = location
        .hostname()
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    format!("{}//{}:3000", protocol, hostname)
}

/// Resolve a configured endpoint against the API base.
///
/// Absolute URLs are used as is; relative paths are joined to `api_base()`.
pub fn api_url(endpoint: &str) -> String {
    join_endpoint(&api_base(), endpoint)
}

fn join_endpoint(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if endpoint.starts_with('/') {
        format!("{}{}", base, endpoint)
    } else {
        format!("{}/{}", base, endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_endpoint() {
        let base = "http://localhost:3000";
        assert_eq!(
            join_endpoint(base, "/api/u508/reservations/batch"),
            "http://localhost:3000/api/u508/reservations/batch"
        );
        assert_eq!(
            join_endpoint(base, "api/x"),
            "http://localhost:3000/api/x"
        );
        assert_eq!(
            join_endpoint(base, "https://other.host/api/x"),
            "https://other.host/api/x"
        );
    }
}
