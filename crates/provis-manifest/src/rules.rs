//! Platform rule evaluation.
//!
//! A library without rules is always included. A library with rules is
//! included only when the last matching rule allows it; when none of its
//! rules match, it is excluded.

use serde::{Deserialize, Serialize};

use crate::Platform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlatformRule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
}

impl PlatformRule {
    pub fn allow(os_name: Option<&str>) -> Self {
        Self::new(RuleAction::Allow, os_name)
    }

    pub fn disallow(os_name: Option<&str>) -> Self {
        Self::new(RuleAction::Disallow, os_name)
    }

    fn new(action: RuleAction, os_name: Option<&str>) -> Self {
        Self {
            action,
            os: os_name.map(|name| OsRule {
                name: Some(name.to_string()),
                arch: None,
            }),
        }
    }

    /// A rule without an OS constraint matches every platform.
    pub fn matches(&self, platform: &Platform) -> bool {
        let Some(os) = &self.os else {
            return true;
        };
        os.name.as_ref().is_none_or(|name| *name == platform.name)
            && os.arch.as_ref().is_none_or(|arch| *arch == platform.arch)
    }
}

/// Accumulated decision while folding over a rule list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Unset,
    Allow,
    Deny,
}

impl Verdict {
    fn apply(self, rule: &PlatformRule, platform: &Platform) -> Self {
        if !rule.matches(platform) {
            return self;
        }
        match rule.action {
            RuleAction::Allow => Verdict::Allow,
            RuleAction::Disallow => Verdict::Deny,
        }
    }

    /// Fold `rules` in declaration order.
    pub fn of(rules: &[PlatformRule], platform: &Platform) -> Self {
        rules.iter().fold(Verdict::Unset, |verdict, rule| verdict.apply(rule, platform))
    }
}

/// Decide whether a library guarded by `rules` is installed on `platform`.
pub fn include(rules: &[PlatformRule], platform: &Platform) -> bool {
    if rules.is_empty() {
        return true;
    }
    Verdict::of(rules, platform) == Verdict::Allow
}
