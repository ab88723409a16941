use chrono::{SecondsFormat, Utc};
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::schema::EnvironmentInfo;

const UNKNOWN: &str = "unknown";

fn or_unknown(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => UNKNOWN.to_string(),
    }
}

pub fn runtime_version() -> String {
    format!(
        "{} {} ({}-{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH,
        std::env::consts::OS
    )
}

pub fn now_utc_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Read OS and CPU identification from the host. Fields the platform cannot
/// report are filled with `unknown`, never left empty.
pub fn capture() -> EnvironmentInfo {
    let sys = System::new_with_specifics(
        RefreshKind::new().with_cpu(CpuRefreshKind::everything()),
    );

    let cpu_model = sys
        .cpus()
        .iter()
        .map(|cpu| cpu.brand().trim())
        .find(|brand| !brand.is_empty())
        .map(str::to_string);

    let cpu_count = match sys.cpus().len() {
        0 => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        n => n,
    };

    EnvironmentInfo {
        os_name: or_unknown(System::name().or_else(|| Some(std::env::consts::OS.to_string()))),
        os_version: or_unknown(System::os_version().or_else(System::kernel_version)),
        cpu_model: or_unknown(cpu_model),
        cpu_count,
        runtime_version: runtime_version(),
        timestamp: now_utc_rfc3339(),
    }
}

/// Best-effort commit id from CI/build environment variables.
pub fn git_sha_short() -> Option<String> {
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_fields_are_non_empty() {
        let env = capture();
        for (name, value) in env.fields() {
            assert!(!value.is_empty(), "{name} is empty");
        }
        assert!(env.cpu_count >= 1);
    }

    #[test]
    fn blank_values_become_unknown() {
        assert_eq!(or_unknown(None), "unknown");
        assert_eq!(or_unknown(Some("  ".into())), "unknown");
        assert_eq!(or_unknown(Some(" Linux ".into())), "Linux");
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let ts = now_utc_rfc3339();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn runtime_version_names_crate() {
        assert!(runtime_version().starts_with("curve-sig-bench "));
    }
}
