//! Which package a header's constants belong to.
//!
//! An ordered list of path rules, first match wins, with a fixed fallback
//! package when nothing matches.

use regex::Regex;

use crate::config::CatalogConfig;
use crate::error::CatalogError;

#[derive(Clone, Debug)]
struct GoverningRule {
    pattern: Regex,
    package: String,
}

#[derive(Clone, Debug)]
pub struct GoverningRules {
    rules: Vec<GoverningRule>,
    default_package: String,
}

impl GoverningRules {
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut rules = Vec::with_capacity(config.governing.len());
        for rule in &config.governing {
            let pattern =
                Regex::new(&rule.pattern).map_err(|source| CatalogError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    source,
                })?;
            rules.push(GoverningRule {
                pattern,
                package: rule.package.clone(),
            });
        }
        Ok(Self {
            rules,
            default_package: config.default_package.clone(),
        })
    }

    pub fn default_package(&self) -> &str {
        &self.default_package
    }

    pub fn governing_package(&self, header_path: &str) -> String {
        let path = header_path.replace('\\', "/");
        for rule in &self.rules {
            if let Some(captures) = rule.pattern.captures(&path) {
                let mut package = String::new();
                captures.expand(&rule.package, &mut package);
                return package;
            }
        }
        self.default_package.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoverningRuleConfig;

    fn default_rules() -> GoverningRules {
        GoverningRules::from_config(&CatalogConfig::default()).unwrap()
    }

    #[test]
    fn dialogue_headers_use_parent_directory() {
        let rules = default_rules();
        assert_eq!(
            rules.governing_package("uqm/comm/arilou/resinst.h"),
            "comm/arilou.ls2"
        );
    }

    #[test]
    fn ship_headers_use_ship_name() {
        let rules = default_rules();
        assert_eq!(
            rules.governing_package("ships/arilou/resource.h"),
            "ship/arilou.ls2"
        );
        assert_eq!(
            rules.governing_package("sc2code\\ships\\vux\\resvux.h"),
            "ship/vux.ls2"
        );
    }

    #[test]
    fn everything_else_uses_default() {
        let rules = default_rules();
        assert_eq!(rules.governing_package("uqm/resinst.h"), "starcon.ls2");
        assert_eq!(rules.governing_package("comm/loose.h"), "starcon.ls2");
    }

    #[test]
    fn tree_names_must_be_whole_path_segments() {
        let rules = default_rules();
        assert_eq!(
            rules.governing_package("uqm/supercomm/arilou/res.h"),
            "starcon.ls2"
        );
        assert_eq!(rules.governing_package("uqm/warships/vux/res.h"), "starcon.ls2");
        assert_eq!(
            rules.governing_package("uqm/comm/arilou/res.h"),
            "comm/arilou.ls2"
        );
    }

    #[test]
    fn rules_apply_in_order() {
        let mut config = CatalogConfig::default();
        config.governing.insert(
            0,
            GoverningRuleConfig {
                pattern: r"ships/(arilou)/".to_string(),
                package: "special/${1}.ls2".to_string(),
            },
        );
        let rules = GoverningRules::from_config(&config).unwrap();
        assert_eq!(
            rules.governing_package("ships/arilou/resource.h"),
            "special/arilou.ls2"
        );
        assert_eq!(rules.governing_package("ships/vux/resource.h"), "ship/vux.ls2");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let mut config = CatalogConfig::default();
        config.governing.push(GoverningRuleConfig {
            pattern: "(".to_string(),
            package: "x".to_string(),
        });
        let err = GoverningRules::from_config(&config).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPattern { .. }));
    }
}
