use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

static HTTP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http").expect("valid regex"));
static SMB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"smb|microsoft-ds").expect("valid regex"));
static SMTP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"smtp").expect("valid regex"));

/// Intensity level requested by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScanType {
    Light,
    Normal,
    Aggressive,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Light => "light",
            ScanType::Normal => "normal",
            ScanType::Aggressive => "aggressive",
        }
    }
}

impl FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" | "less_aggressive" => Ok(ScanType::Light),
            "normal" => Ok(ScanType::Normal),
            "aggressive" => Ok(ScanType::Aggressive),
            other => Err(format!("unknown scan type: {}", other)),
        }
    }
}

impl TryFrom<String> for ScanType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScanType> for String {
    fn from(value: ScanType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network service whose presence gates an escalation probe.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Service {
    Http,
    Smb,
    Smtp,
    Other(String),
}

impl Service {
    /// Match a version-probe transcript against this service's signature.
    pub fn matches(&self, probe_output: &str) -> bool {
        match self {
            Service::Http => HTTP_RE.is_match(probe_output),
            Service::Smb => SMB_RE.is_match(probe_output),
            Service::Smtp => SMTP_RE.is_match(probe_output),
            Service::Other(name) => probe_output.contains(name.as_str()),
        }
    }
}

impl FromStr for Service {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "http" => Service::Http,
            "smb" => Service::Smb,
            "smtp" => Service::Smtp,
            other => Service::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Http => f.write_str("http"),
            Service::Smb => f.write_str("smb"),
            Service::Smtp => f.write_str("smtp"),
            Service::Other(name) => f.write_str(name),
        }
    }
}

/// External scanning utilities the strategies know how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Nmap,
    WhatWeb,
    Sublist3r,
    TheHarvester,
    Nikto,
    Enum4linux,
    SmtpEnum,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::Nmap,
        Tool::WhatWeb,
        Tool::Sublist3r,
        Tool::TheHarvester,
        Tool::Nikto,
        Tool::Enum4linux,
        Tool::SmtpEnum,
    ];

    /// Identifier used in `tools_pile` and in output file names.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Nmap => "nmap",
            Tool::WhatWeb => "whatweb",
            Tool::Sublist3r => "sublist3r",
            Tool::TheHarvester => "theharvester",
            Tool::Nikto => "nikto",
            Tool::Enum4linux => "enum4linux",
            Tool::SmtpEnum => "smtp_enum",
        }
    }

    /// Executable looked up on PATH unless the config overrides it.
    pub fn default_binary(&self) -> &'static str {
        match self {
            Tool::Nmap => "nmap",
            Tool::WhatWeb => "whatweb",
            Tool::Sublist3r => "sublist3r",
            Tool::TheHarvester => "theHarvester",
            Tool::Nikto => "nikto",
            Tool::Enum4linux => "enum4linux",
            Tool::SmtpEnum => "smtp-user-enum",
        }
    }

    /// Resolve a tools-pile entry. Accepts the identifier or the binary name.
    pub fn from_name(name: &str) -> Option<Tool> {
        let wanted = name.trim().to_ascii_lowercase();
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == wanted || tool.default_binary().to_ascii_lowercase() == wanted)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a scan batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanJob {
    pub scan_type: ScanType,
    pub target: String,
    pub output_dir: Option<PathBuf>,
    pub delay: Duration,
}

impl ScanJob {
    pub fn new(scan_type: ScanType, target: impl Into<String>) -> Self {
        Self {
            scan_type,
            target: target.into(),
            output_dir: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// Outcome of a single tool invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub tool_name: String,
    pub raw_output: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl ScanResult {
    pub fn success(tool: Tool, raw_output: String) -> Self {
        Self {
            tool_name: tool.name().to_string(),
            raw_output,
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(tool: Tool, error: String) -> Self {
        Self {
            tool_name: tool.name().to_string(),
            raw_output: String::new(),
            succeeded: false,
            error: Some(error),
        }
    }

    pub fn with_output(mut self, raw_output: String) -> Self {
        self.raw_output = raw_output;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("light", ScanType::Light)]
    #[case("less_aggressive", ScanType::Light)]
    #[case("Normal", ScanType::Normal)]
    #[case(" aggressive ", ScanType::Aggressive)]
    fn parses_scan_types(#[case] input: &str, #[case] expected: ScanType) {
        assert_eq!(input.parse::<ScanType>().unwrap(), expected);
    }

    #[test]
    fn unknown_scan_type_is_rejected() {
        let err = "stealthy".parse::<ScanType>().unwrap_err();
        assert_eq!(err, "unknown scan type: stealthy");
    }

    #[rstest]
    #[case(Service::Http, "80/tcp open  http    Apache httpd 2.4.41", true)]
    #[case(Service::Http, "443/tcp open ssl/https", true)]
    #[case(Service::Smb, "445/tcp open  microsoft-ds", true)]
    #[case(Service::Smb, "Host script results: smb2-security-mode", true)]
    #[case(Service::Smtp, "25/tcp  open  smtp    Postfix smtpd", true)]
    #[case(Service::Smtp, "22/tcp open  ssh", false)]
    #[case(Service::Http, "22/tcp open  ssh     OpenSSH 8.2", false)]
    #[case(Service::Other("ssh".to_string()), "22/tcp open  ssh", true)]
    #[case(Service::Other("mysql".to_string()), "22/tcp open  ssh", false)]
    fn service_signatures(#[case] service: Service, #[case] output: &str, #[case] expected: bool) {
        assert_eq!(service.matches(output), expected);
    }

    #[test]
    fn other_service_is_matched_literally() {
        let service = Service::Other("a.b".to_string());
        assert!(!service.matches("axb"));
        assert!(service.matches("found a.b here"));
    }

    #[rstest]
    #[case("nmap", Some(Tool::Nmap))]
    #[case("theHarvester", Some(Tool::TheHarvester))]
    #[case("theharvester", Some(Tool::TheHarvester))]
    #[case("smtp_enum", Some(Tool::SmtpEnum))]
    #[case("smtp-user-enum", Some(Tool::SmtpEnum))]
    #[case("masscan", None)]
    fn resolves_tool_names(#[case] name: &str, #[case] expected: Option<Tool>) {
        assert_eq!(Tool::from_name(name), expected);
    }

    #[test]
    fn scan_type_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ScanType::Aggressive).unwrap();
        assert_eq!(json, "\"aggressive\"");
        let back: ScanType = serde_json::from_str("\"less_aggressive\"").unwrap();
        assert_eq!(back, ScanType::Light);
        assert!(serde_json::from_str::<ScanType>("\"bogus\"").is_err());
    }
}
