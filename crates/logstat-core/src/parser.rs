//! Line parser for nginx access logs
//!
//! The log format is fixed (the `ui_short` format of the frontend nginx):
//!
//! ```text
//! $remote_addr  $remote_user $http_x_real_ip [$time_local] "$request"
//! $status $body_bytes_sent "$http_referer" "$http_user_agent"
//! "$http_x_forwarded_for" "$http_X_REQUEST_ID" "$http_X_RB_USER"
//! $request_time
//! ```
//!
//! Only the URL from the request line and the trailing request time are
//! extracted, but every other field must be present for the line to count
//! as parsed. A line that does not match is an expected input condition and
//! comes back as [`ParseResult::Unparsed`], never as an error.
//!
//! # Examples
//!
//! ```
//! use logstat_core::parser::parse_line;
//! use logstat_core::types::ParseResult;
//!
//! let line = r#"1.169.137.128 -  - [29/Jun/2017:03:50:23 +0300] "GET /api/v2/group/1769230/banners HTTP/1.1" 200 1020 "-" "Configovod" "-" "1498697423-2118016444-4708-9752777" "712e90144abee9" 0.628"#;
//! match parse_line(line) {
//!     ParseResult::Parsed { url, request_time } => {
//!         assert_eq!(url.as_str(), "/api/v2/group/1769230/banners");
//!         assert_eq!(request_time, 0.628);
//!     }
//!     ParseResult::Unparsed { .. } => unreachable!(),
//! }
//! ```

use crate::types::{ParseResult, RequestUrl};
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\S+\s+\S+\s+\S+\s+",                  // remote_addr, remote_user, real_ip
        r"\[[^\]]*\]\s+",                        // [time_local]
        r#""\w+\s+(?P<url>[^\s"]+)\s+[^\s"]+"\s+"#, // "method url protocol"
        r"\d{3}\s+(?:\d+|-)\s+",                 // status, body_bytes_sent
        r#""[^"]*"\s+"[^"]*"\s+"[^"]*"\s+"#,     // referer, user_agent, forwarded_for
        r#""[^"]*"\s+"[^"]*"\s+"#,               // request_id, rb_user
        r"(?P<request_time>\d+(?:\.\d+)?)$",     // request_time
    ))
    .expect("access log pattern is valid")
});

/// Parse one access log line
///
/// Surrounding whitespace (including a trailing `\r`) is ignored. The URL is
/// returned exactly as logged.
pub fn parse_line(line: &str) -> ParseResult {
    match extract(line.trim()) {
        Some((url, request_time)) => ParseResult::Parsed {
            url: RequestUrl::new(url),
            request_time,
        },
        None => ParseResult::Unparsed {
            raw: line.to_string(),
        },
    }
}

fn extract(line: &str) -> Option<(&str, f64)> {
    let captures = LINE_PATTERN.captures(line)?;
    let url = captures.name("url")?.as_str();
    let request_time: f64 = captures.name("request_time")?.as_str().parse().ok()?;
    // A digit run long enough to overflow parses to infinity
    request_time.is_finite().then_some((url, request_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::log_line;

    fn parsed(line: &str) -> (String, f64) {
        match parse_line(line) {
            ParseResult::Parsed { url, request_time } => (url.as_str().to_string(), request_time),
            ParseResult::Unparsed { raw } => panic!("expected a parsed line, got {raw:?}"),
        }
    }

    fn assert_unparsed(line: &str) {
        match parse_line(line) {
            ParseResult::Unparsed { raw } => assert_eq!(raw, line),
            other => panic!("expected unparsed, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_real_line() {
        let line = r#"1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] "GET /api/v2/banner/25019354 HTTP/1.1" 200 927 "-" "Lynx/2.8.8dev.9 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/2.10.5" "-" "1498697422-2190034393-4708-9752759" "dc7161be3" 0.390"#;
        let (url, time) = parsed(line);
        assert_eq!(url, "/api/v2/banner/25019354");
        assert_eq!(time, 0.390);
    }

    #[test]
    fn test_parse_line_with_real_ip_and_user() {
        let line = r#"1.138.198.128 -  1.1.1.1 [29/Jun/2017:03:50:25 +0300] "POST /api/v2/target/12988/list?status=1 HTTP/1.1" 200 2 "-" "python-requests/2.13.0" "-" "1498697425-2760328665-4708-9752815" "-" 0.072"#;
        let (url, time) = parsed(line);
        assert_eq!(url, "/api/v2/target/12988/list?status=1");
        assert_eq!(time, 0.072);
    }

    #[test]
    fn test_url_kept_verbatim() {
        let (url, _) = parsed(&log_line("/export/appinstall_raw/2017-06-29/?q=%D0%B0", "0.001"));
        assert_eq!(url, "/export/appinstall_raw/2017-06-29/?q=%D0%B0");
    }

    #[test]
    fn test_integer_request_time() {
        let (_, time) = parsed(&log_line("/slow", "12"));
        assert_eq!(time, 12.0);
    }

    #[test]
    fn test_trailing_newline_ignored() {
        let line = format!("{}\r\n", log_line("/a", "0.5"));
        let (url, time) = parsed(&line);
        assert_eq!(url, "/a");
        assert_eq!(time, 0.5);
    }

    #[test]
    fn test_dash_bytes_accepted() {
        let line = r#"1.2.3.4 - - [29/Jun/2017:03:50:22 +0300] "HEAD / HTTP/1.0" 304 - "-" "-" "-" "-" "-" 0.000"#;
        let (url, time) = parsed(line);
        assert_eq!(url, "/");
        assert_eq!(time, 0.0);
    }

    #[test]
    fn test_non_numeric_request_time_unparsed() {
        assert_unparsed(&log_line("/a", "-"));
        assert_unparsed(&log_line("/a", "abc"));
        assert_unparsed(&log_line("/a", "-0.5"));
        assert_unparsed(&log_line("/a", "1."));
    }

    #[test]
    fn test_missing_request_time_unparsed() {
        let line = log_line("/a", "0.5");
        let truncated = line.trim_end_matches("0.5").trim_end();
        assert_unparsed(truncated);
    }

    #[test]
    fn test_truncated_line_unparsed() {
        assert_unparsed(r#"1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] "GET /api/v2/banner/25019354"#);
    }

    #[test]
    fn test_missing_quotes_unparsed() {
        let line = r#"1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] GET /a HTTP/1.1 200 927 "-" "-" "-" "-" "-" 0.390"#;
        assert_unparsed(line);
    }

    #[test]
    fn test_missing_quoted_field_unparsed() {
        let line = r#"1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] "GET /a HTTP/1.1" 200 927 "-" "-" "-" "-" 0.390"#;
        assert_unparsed(line);
    }

    #[test]
    fn test_bad_request_line_unparsed() {
        let line = r#"1.196.116.32 -  - [29/Jun/2017:03:50:22 +0300] "0" 400 166 "-" "-" "-" "-" "-" 0.000"#;
        assert_unparsed(line);
    }

    #[test]
    fn test_overflowing_request_time_unparsed() {
        let huge = "9".repeat(400);
        assert_unparsed(&log_line("/a", &huge));
    }

    #[test]
    fn test_empty_line_unparsed() {
        assert_unparsed("");
        assert_unparsed("   ");
    }
}
