use super::models::{ScanType, Service, Tool};
use crate::config::SmtpEnumConfig;

/// Named, fixed sequences of probes. Passive always runs before the others.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Passive,
    Light,
    Normal,
    Aggressive,
}

impl From<ScanType> for Strategy {
    fn from(scan_type: ScanType) -> Self {
        match scan_type {
            ScanType::Light => Strategy::Light,
            ScanType::Normal => Strategy::Normal,
            ScanType::Aggressive => Strategy::Aggressive,
        }
    }
}

/// A single tool invocation: which tool and its full argument vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Probe {
    pub tool: Tool,
    pub args: Vec<String>,
}

impl Probe {
    fn new(tool: Tool, args: &[&str]) -> Self {
        Self {
            tool,
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A probe gated on a detected service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Escalation {
    pub service: Service,
    pub probe: Probe,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Passive => "passive",
            Strategy::Light => "light",
            Strategy::Normal => "normal",
            Strategy::Aggressive => "aggressive",
        }
    }

    /// Probes that always run, in order.
    pub fn probes(&self, target: &str) -> Vec<Probe> {
        match self {
            Strategy::Passive => vec![
                Probe::new(Tool::WhatWeb, &[target]),
                Probe::new(Tool::Sublist3r, &["-d", target]),
                Probe::new(Tool::TheHarvester, &["-d", target, "-b", "all"]),
            ],
            Strategy::Light => vec![Probe::new(Tool::Nmap, &[target])],
            Strategy::Normal => vec![Probe::new(Tool::Nmap, &["-sV", "-sC", "-O", target])],
            Strategy::Aggressive => vec![Probe::new(
                Tool::Nmap,
                &["-sV", "-sC", "-p-", "-O", "-T4", target],
            )],
        }
    }

    /// Service-gated probes, checked in order once every unconditional probe
    /// has finished. Checks are independent of each other.
    pub fn escalations(&self, target: &str, smtp: &SmtpEnumConfig) -> Vec<Escalation> {
        let http = || Escalation {
            service: Service::Http,
            probe: Probe::new(Tool::Nikto, &["-h", target]),
        };
        match self {
            Strategy::Passive | Strategy::Light => vec![],
            Strategy::Normal => vec![http()],
            Strategy::Aggressive => vec![
                http(),
                Escalation {
                    service: Service::Smb,
                    probe: Probe::new(Tool::Enum4linux, &["-a", target]),
                },
                Escalation {
                    service: Service::Smtp,
                    probe: Probe::new(
                        Tool::SmtpEnum,
                        &["-M", smtp.method.as_str(), "-U", smtp.wordlist.as_str(), "-t", target],
                    ),
                },
            ],
        }
    }
}
