//! Derives canonical dotted names from raw asset paths.
//!
//! Rules are tried strictly in table order and the first match wins, so a
//! more specific rule must sit above any broader rule that would also match.
//! Patterns are anchored at the start of the path only.

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};

pub type Template = fn(&RuleMatch<'_>) -> String;

/// Placeholder used when a path has no classification.
pub const NO_MATCH_PLACEHOLDER: &str = "ERROR";

pub struct RuleMatch<'a> {
    captures: Captures<'a>,
}

impl RuleMatch<'_> {
    /// Captured group `index`, with stray delimiters trimmed from both ends.
    pub fn group(&self, index: usize) -> &str {
        let raw = self.captures.get(index).map_or("", |m| m.as_str());
        strip_delimiters(raw)
    }
}

pub fn strip_delimiters(value: &str) -> &str {
    value.trim_matches('.')
}

#[derive(Clone)]
pub struct ClassificationRule {
    source: String,
    pattern: Regex,
    template: Template,
}

impl ClassificationRule {
    pub fn new(pattern: &str, template: Template) -> Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{})", pattern))?;
        Ok(Self {
            source: pattern.to_string(),
            pattern: anchored,
            template,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.source
    }

    fn apply(&self, path: &str) -> Option<String> {
        let captures = self.pattern.captures(path)?;
        Some((self.template)(&RuleMatch { captures }))
    }
}

impl fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("pattern", &self.source)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Named(String),
    NoMatch,
}

impl Classification {
    pub fn name(&self) -> Option<&str> {
        match self {
            Classification::Named(name) => Some(name),
            Classification::NoMatch => None,
        }
    }

    pub fn name_or_placeholder(&self) -> &str {
        self.name().unwrap_or(NO_MATCH_PLACEHOLDER)
    }
}

#[derive(Clone, Debug)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Classifier {
    pub fn from_rules(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// The stock rule table for the catalog's content tree.
    pub fn builtin() -> &'static Classifier {
        static BUILTIN: OnceLock<Classifier> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let rules = BUILTIN_RULES
                .iter()
                .map(|(pattern, template)| {
                    ClassificationRule::new(pattern, *template)
                        .expect("builtin classification pattern compiles")
                })
                .collect();
            Classifier::from_rules(rules)
        })
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn classify(&self, path: &str) -> Classification {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(path))
            .map_or(Classification::NoMatch, Classification::Named)
    }
}

static BUILTIN_RULES: [(&str, Template); 44] = [
    (r"comm/(.*)/(.*)\.mod", |m| format!("comm.{}.music", m.group(1))),
    (r"comm/(.*)/(.*)\.ogg", |m| format!("comm.{}.music", m.group(2))),
    (r"comm/(.*)/(.*)\.ani", |m| format!("comm.{}.graphics", m.group(1))),
    (r"comm/(.*)/(.*)\.ct", |m| format!("comm.{}.colortable", m.group(1))),
    (r"comm/(.*)/(.*)\.fon", |m| format!("comm.{}.font", m.group(1))),
    (r"comm/(.*)/(.*)\.txt", |m| format!("comm.{}.dialogue", m.group(1))),
    (r"comm/(.*)\.lst", |m| format!("comm.{}.resources", m.group(1))),
    (r"credits/(.*)\.fon", |m| format!("credits.font.{}", m.group(1))),
    (r"credits/credback\.ani", |_| "credits.background".to_string()),
    (r"credits/(.*)\.txt", |m| format!("credits.{}", m.group(1))),
    (r"credits/(.*)\.ogg", |m| format!("credits.{}music", m.group(1))),
    (r"ipanims/(.*)\.txt", |m| format!("text.{}", m.group(1))),
    (r"ipanims/(.*)\.ani", |m| format!("graphics.{}", m.group(1))),
    (r"ipanims/(.*)\.ct", |m| format!("colortable.{}", m.group(1))),
    (r"ipanims/(.*)\.xlt", |m| format!("translate.{}", m.group(1))),
    (r"ipanims/(.*)\.fon", |m| format!("font.{}", m.group(1))),
    (r"ipanims/(.*)\.snd", |m| format!("sounds.{}", m.group(1))),
    (r"ipanims/(.*)\.mod", |m| format!("music.{}", m.group(1))),
    (r"ipanims/(.*)\.ogg", |m| format!("music.{}", m.group(1))),
    (r"lbm/(.*)\.ani", |m| format!("graphics.{}", m.group(1))),
    (r"lbm/(.*)\.mod", |m| format!("music.{}", m.group(1))),
    (r"lbm/(.*)\.ogg", |m| format!("music.{}", m.group(1))),
    (r"lbm/(.*)\.ct", |m| format!("colortable.{}", m.group(1))),
    (r"lbm/(.*)\.fon", |m| format!("font.{}", m.group(1))),
    (r"lbm/(.*)snd\.snd", |m| format!("sounds.{}", m.group(1))),
    (r"lbm/(.*)\.txt", |m| format!("text.{}", m.group(1))),
    (r"lbm/mainmenu\.ogg", |_| "music.mainmenu".to_string()),
    (r"melee/melemenu\.ogg", |_| "music.meleemenu".to_string()),
    (r"melee/(.*)\.ani", |m| format!("graphics.{}", m.group(1))),
    (r"slides/ending/sis_skel.ani", |_| "graphics.sisskeleton".to_string()),
    (r"shofixti/oldcap.ani", |_| "ship.shofixti.graphics.oldcaptain".to_string()),
    (r"(.*)/(.*)micon\.ani", |m| format!("ship.{}.meleeicons", m.group(1))),
    (r"(.*)/(.*)icons\.ani", |m| format!("ship.{}.icons", m.group(1))),
    (r"(.*)/(.*)\.cod", |m| format!("ship.{}.code", m.group(1))),
    (r"(.*)/(.*)\.snd", |m| format!("ship.{}.sounds", m.group(1))),
    (r"(.*)/(.*)\.mod", |m| format!("ship.{}.ditty", m.group(1))),
    (r"(.*)/(.*)\.ogg", |m| format!("ship.{}.ditty", m.group(1))),
    (r"(.*)/(.*)\.txt", |m| format!("ship.{}.text", m.group(1))),
    (r"(.*)/(.*)cap\.ani", |m| {
        format!("ship.{}.graphics.captain", m.group(1))
    }),
    (r"(.*)/(.*)big.*", |m| {
        format!("ship.{}.graphics.{}.large", m.group(1), m.group(2))
    }),
    (r"(.*)/(.*)med.*", |m| {
        format!("ship.{}.graphics.{}.medium", m.group(1), m.group(2))
    }),
    (r"(.*)/(.*)sml.*", |m| {
        format!("ship.{}.graphics.{}.small", m.group(1), m.group(2))
    }),
    (r"(.*)/(.*)\.ani", |m| format!("ship.{}.graphics.{}", m.group(1), m.group(2))),
    (r"(.*).lst", |m| format!("ship.{}.resources", m.group(1))),
];
