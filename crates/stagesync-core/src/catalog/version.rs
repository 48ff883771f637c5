//! Minimum-version gate for published content.
//!
//! Versions look like `v6.0.0` or `v6.0.0-beta.1`. A release sorts above any
//! pre-release of the same number; pre-release tags compare lexically.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreVersion {
    major: u32,
    minor: u32,
    patch: u32,
    pre_release: Option<String>,
}

impl CoreVersion {
    /// `None` when the numeric part carries no digits at all
    pub fn parse(version: &str) -> Option<Self> {
        let clean = version
            .trim()
            .trim_start_matches(['v', 'V']);
        let (main, pre_release) = match clean.split_once('-') {
            Some((main, pre)) => (main, Some(pre.to_string())),
            None => (clean, None),
        };
        if !main.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }

        let mut numbers = main.split('.').map(|n| n.trim().parse::<u32>().unwrap_or(0));
        Some(Self {
            major: numbers.next().unwrap_or(0),
            minor: numbers.next().unwrap_or(0),
            patch: numbers.next().unwrap_or(0),
            pre_release,
        })
    }
}

impl Ord for CoreVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for CoreVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Checks content requirements against the running engine version.
#[derive(Debug, Clone, Default)]
pub struct VersionGate {
    current: Option<CoreVersion>,
}

impl VersionGate {
    /// An unknown or unparseable current version lets everything through.
    pub fn new(current: Option<&str>) -> Self {
        Self {
            current: current.and_then(CoreVersion::parse),
        }
    }

    pub fn meets(&self, required: Option<&str>) -> bool {
        let Some(current) = &self.current else {
            return true;
        };
        match required.map(str::trim).filter(|r| !r.is_empty()) {
            None => true,
            Some(required) => CoreVersion::parse(required).map_or(true, |r| *current >= r),
        }
    }
}
