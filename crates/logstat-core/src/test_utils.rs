//! Shared test utilities for unit tests
//!
//! Integration tests cannot see this module (it is `#[cfg(test)]`); they
//! have their own copy of the line builder in `tests/common/mod.rs`.

/// Build a well-formed access log line for `url` with the given trailing
/// request time field
pub fn log_line(url: &str, request_time: &str) -> String {
    format!(
        r#"1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] "GET {url} HTTP/1.1" 200 927 "-" "Lynx/2.8.8dev.9 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/2.10.5" "-" "1498697422-2190034393-4708-9752759" "dc7161be3" {request_time}"#
    )
}

/// Build a line that never matches the log format
pub fn garbage_line(n: usize) -> String {
    format!("this is not an access log line #{n}")
}
