use anyhow::Result;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MirrorLogEntry {
    /// A rated mirror, e.g. `https://mirror.example/ 1234.56 KiB/s 0.12 s`
    Server {
        url: String,
        rate: String,
        time: String,
    },
    Info { message: String },
    Warning { message: String },
}

/// Parser for `reflector --verbose` output lines
#[derive(Debug, Clone)]
pub struct LogParser {
    line: Regex,
    server: Regex,
}

impl LogParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            line: Regex::new(r"^\[.*?\]\s+(INFO|WARNING):\s+(.+)$")?,
            server: Regex::new(r"^(https?://\S+)\s+(\S+\s+\S+/s)\s+(\S+\s+s)$")?,
        })
    }

    /// Lines that are neither INFO nor WARNING yield `None`
    pub fn parse(&self, line: &str) -> Option<MirrorLogEntry> {
        let caps = self.line.captures(line.trim())?;
        let message = caps[2].trim().to_string();

        if &caps[1] == "WARNING" {
            return Some(MirrorLogEntry::Warning { message });
        }

        match self.server.captures(&message) {
            Some(server) => Some(MirrorLogEntry::Server {
                url: server[1].to_string(),
                rate: server[2].to_string(),
                time: server[3].to_string(),
            }),
            None => Some(MirrorLogEntry::Info { message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_row() {
        let parser = LogParser::new().unwrap();
        let entry = parser.parse(
            "[2024-05-01 10:00:00] INFO: https://mirror.example.org/archlinux/   1834.27 KiB/s    0.51 s",
        );
        assert_eq!(
            entry,
            Some(MirrorLogEntry::Server {
                url: "https://mirror.example.org/archlinux/".to_string(),
                rate: "1834.27 KiB/s".to_string(),
                time: "0.51 s".to_string(),
            })
        );
    }

    #[test]
    fn test_info_and_warning() {
        let parser = LogParser::new().unwrap();
        assert_eq!(
            parser.parse("[2024-05-01 10:00:00] INFO: rating 5 mirror(s) by rate"),
            Some(MirrorLogEntry::Info {
                message: "rating 5 mirror(s) by rate".to_string()
            })
        );
        assert_eq!(
            parser.parse("[2024-05-01 10:00:01] WARNING: failed to rate http://x/ : timed out"),
            Some(MirrorLogEntry::Warning {
                message: "failed to rate http://x/ : timed out".to_string()
            })
        );
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let parser = LogParser::new().unwrap();
        assert_eq!(parser.parse(""), None);
        assert_eq!(parser.parse("Server = https://x/$repo/os/$arch"), None);
        assert_eq!(parser.parse("[2024-05-01] DEBUG: noise"), None);
    }
}
