// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Vendor CLI dialects.
//!
//! Network device shells differ in two ways that matter for scraping output:
//! what their prompt looks like, and which command turns off the pager so a
//! long `show` output arrives in one piece.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static CISCO_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.\-@/:()~]{1,80}[>#]$").expect("valid prompt pattern"));
static JUNIPER_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.\-@/:()~]{1,80}[>#%]$").expect("valid prompt pattern"));
static GENERIC_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\n]{0,160}[$#>%]$").expect("valid prompt pattern"));
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]|\x1b[()][A-B0-2]").expect("valid escape pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceDialect {
    CiscoIos,
    CiscoAsa,
    Juniper,
    HpProcurve,
    Generic,
}

impl DeviceDialect {
    /// Map a configured `device_type` tag onto a dialect.
    ///
    /// Unknown tags fall back to [`DeviceDialect::Generic`], which only relies
    /// on the prompt terminator.
    pub fn from_device_type(device_type: &str) -> Self {
        match device_type.trim().to_ascii_lowercase().as_str() {
            "cisco_ios" | "cisco_xe" | "cisco_xr" | "cisco_nxos" | "cisco_wlc" | "arista_eos" => {
                Self::CiscoIos
            }
            "cisco_asa" => Self::CiscoAsa,
            "juniper" | "juniper_junos" => Self::Juniper,
            "hp_procurve" | "aruba_os" | "aruba_osswitch" => Self::HpProcurve,
            _ => Self::Generic,
        }
    }

    /// Command that disables output paging, if the dialect has one.
    pub fn paging_command(self) -> Option<&'static str> {
        match self {
            Self::CiscoIos => Some("terminal length 0"),
            Self::CiscoAsa => Some("terminal pager 0"),
            Self::Juniper => Some("set cli screen-length 0"),
            Self::HpProcurve => Some("no page"),
            Self::Generic => None,
        }
    }

    fn prompt_pattern(self) -> &'static Regex {
        match self {
            Self::CiscoIos | Self::CiscoAsa | Self::HpProcurve => &CISCO_PROMPT,
            Self::Juniper => &JUNIPER_PROMPT,
            Self::Generic => &GENERIC_PROMPT,
        }
    }

    /// Return the prompt if `buffer` currently ends with one.
    ///
    /// Only the final, unterminated line is considered: a prompt never ends
    /// with a newline, while every line of command output does.
    pub fn find_prompt(self, buffer: &str) -> Option<String> {
        let text = normalize(buffer);
        let last_line = text.rsplit('\n').next()?.trim();
        if last_line.is_empty() {
            return None;
        }
        self.prompt_pattern()
            .is_match(last_line)
            .then(|| last_line.to_string())
    }

    /// Return the trailing prompt if it belongs to the device behind `learned`.
    ///
    /// A trailing line only counts when it equals the learned prompt or shares
    /// its hostname stem (so `router1(config)#` still matches `router1#`).
    /// Output that merely ends in a terminator character, such as `45%`, does
    /// not. With no learned prompt yet this is [`Self::find_prompt`].
    pub fn match_prompt(self, buffer: &str, learned: &str) -> Option<String> {
        let found = self.find_prompt(buffer)?;
        if learned.is_empty() || found == learned {
            return Some(found);
        }
        let stem = prompt_stem(learned);
        (!stem.is_empty() && found.starts_with(stem)).then_some(found)
    }

    /// Strip the echoed command and the trailing prompt from raw shell output.
    pub fn clean_output(self, raw: &str, command: &str, prompt: &str) -> String {
        let text = normalize(raw);
        let mut body = text.as_str();

        if let Some(stripped) = body.trim_end().strip_suffix(prompt) {
            body = stripped;
        } else if let Some(found) = self.find_prompt(body) {
            body = body.trim_end().strip_suffix(found.as_str()).unwrap_or(body);
        }

        let command = command.trim();
        if !command.is_empty() {
            if let Some((first, rest)) = body.split_once('\n') {
                if first.trim_end().ends_with(command) {
                    body = rest;
                }
            } else if body.trim_end().ends_with(command) {
                body = "";
            }
        }

        body.trim_end_matches(['\n', ' ']).to_string()
    }
}

impl fmt::Display for DeviceDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CiscoIos => "cisco_ios",
            Self::CiscoAsa => "cisco_asa",
            Self::Juniper => "juniper_junos",
            Self::HpProcurve => "hp_procurve",
            Self::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Hostname part of a prompt: `router1#` -> `router1`, `ops@box:~$` -> `ops@box`.
fn prompt_stem(prompt: &str) -> &str {
    let body = prompt.trim_end().trim_end_matches(['>', '#', '$', '%']);
    body.split(['(', ':']).next().unwrap_or(body)
}

/// Drop terminal escapes and carriage returns so matching works on plain lines.
fn normalize(raw: &str) -> String {
    ANSI_ESCAPE
        .replace_all(raw, "")
        .replace("\r\n", "\n")
        .replace('\r', "")
}
