//! Common test utilities and helpers for logstat tests
//!
//! This module provides an access log line builder and helpers to lay out
//! log and report directories in a temporary location.

use flate2::Compression;
use flate2::write::GzEncoder;
use logstat::config::Config;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for well-formed access log lines
pub struct LogLineBuilder {
    remote_addr: String,
    real_ip: String,
    method: String,
    url: String,
    protocol: String,
    status: u16,
    user_agent: String,
    request_time: String,
}

impl LogLineBuilder {
    /// Create a new builder with default values
    pub fn new(url: &str) -> Self {
        Self {
            remote_addr: "1.196.116.32".to_string(),
            real_ip: "-".to_string(),
            method: "GET".to_string(),
            url: url.to_string(),
            protocol: "HTTP/1.1".to_string(),
            status: 200,
            user_agent: "Lynx/2.8.8dev.9 libwww-FM/2.14 SSL-MM/1.4.1 GNUTLS/2.10.5".to_string(),
            request_time: "0.390".to_string(),
        }
    }

    #[allow(dead_code)]
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    #[allow(dead_code)]
    pub fn with_real_ip(mut self, real_ip: &str) -> Self {
        self.real_ip = real_ip.to_string();
        self
    }

    #[allow(dead_code)]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.request_time = format!("{seconds:.3}");
        self
    }

    #[allow(dead_code)]
    pub fn with_raw_time(mut self, request_time: &str) -> Self {
        self.request_time = request_time.to_string();
        self
    }

    /// Build the log line
    pub fn build(self) -> String {
        format!(
            r#"{} -  {} [29/Jun/2017:03:50:22 +0300] "{} {} {}" {} 927 "-" "{}" "-" "1498697422-2190034393-4708-9752759" "dc7161be3" {}"#,
            self.remote_addr,
            self.real_ip,
            self.method,
            self.url,
            self.protocol,
            self.status,
            self.user_agent,
            self.request_time
        )
    }
}

/// Shorthand for a line with the given URL and request time
#[allow(dead_code)]
pub fn line(url: &str, seconds: f64) -> String {
    LogLineBuilder::new(url).with_time(seconds).build()
}

/// A temporary `log/` + `reports/` layout with a config pointing at it
#[allow(dead_code)]
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config: Config,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("log");
        std::fs::create_dir(&log_dir).unwrap();

        let config = Config {
            log_dir,
            report_dir: temp_dir.path().join("reports"),
            ..Config::default()
        };
        Self { temp_dir, config }
    }

    pub fn log_dir(&self) -> &Path {
        &self.config.log_dir
    }

    pub fn report_dir(&self) -> &Path {
        &self.config.report_dir
    }

    /// Write a plain log file into the log directory
    pub fn write_log(&self, name: &str, lines: &[String]) -> PathBuf {
        let path = self.log_dir().join(name);
        std::fs::write(&path, join_lines(lines)).unwrap();
        path
    }

    /// Write a gzipped log file into the log directory
    pub fn write_gz_log(&self, name: &str, lines: &[String]) -> PathBuf {
        let path = self.log_dir().join(name);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(join_lines(lines).as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();
        path
    }
}

#[allow(dead_code)]
fn join_lines(lines: &[String]) -> String {
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Pull the JSON rows back out of a rendered report
#[allow(dead_code)]
pub fn rows_from_html(html: &str) -> serde_json::Value {
    let start = html.find("var table = ").unwrap() + "var table = ".len();
    let end = start + html[start..].find(";\n").unwrap();
    serde_json::from_str(&html[start..end]).unwrap()
}
