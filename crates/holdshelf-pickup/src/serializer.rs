//! Canonical rule lines.
//!
//! `PickupRule` renders back to the line syntax the parser reads, keys in a
//! fixed order, so `parse_rule(i, &rule.to_string())` gives back an equal rule.

use crate::rule::{ItemCriteria, PatternSet, PickupRule, RuleSet};
use std::fmt;

struct Line {
    clauses: Vec<String>,
}

impl Line {
    fn new() -> Self {
        Self { clauses: Vec::new() }
    }

    fn values<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rendered: Vec<String> = values
            .into_iter()
            .map(|v| render_value(v.as_ref()))
            .collect();
        if !rendered.is_empty() {
            self.clauses.push(format!("{key}={}", rendered.join(",")));
        }
    }

    fn patterns(&mut self, key: &str, patterns: &PatternSet) {
        self.values(key, patterns.iter().map(|p| p.to_string()));
    }

    fn criteria(&mut self, keys: [&str; 3], criteria: &ItemCriteria) {
        self.values(keys[0], &criteria.lib);
        self.patterns(keys[1], &criteria.loc);
        self.patterns(keys[2], &criteria.policy);
    }

    fn flag(&mut self, key: &str, value: Option<bool>) {
        if let Some(value) = value {
            self.clauses.push(format!("{key}={}", u8::from(value)));
        }
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.trim() != value
        || value.contains([',', ':', '"'])
}

fn render_value(value: &str) -> String {
    if !needs_quotes(value) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

impl fmt::Display for PickupRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = Line::new();
        line.patterns("level", &self.level);
        line.criteria(["lib", "loc", "policy"], &self.items);
        line.criteria(["avail_lib", "avail", "avail_policy"], &self.available);
        line.criteria(["unavail_lib", "unavail", "unavail_policy"], &self.unavailable);
        line.patterns("group", &self.group);
        line.values("pickup", &self.pickup);
        line.flag("home", self.home);
        line.flag("work", self.work);
        if self.stop {
            line.flag("stop", Some(true));
        }
        for (key, values) in &self.extra {
            if values.is_empty() {
                line.clauses.push(format!("{key}="));
            } else {
                line.values(key, values);
            }
        }
        // A blank line would be skipped by `parse_rules`.
        if line.clauses.is_empty() {
            line.clauses.push("pickup=".to_string());
        }
        f.write_str(&line.clauses.join(":"))
    }
}

/// One rule per line.
impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{rule}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_rule, parse_rules};

    fn round_trip(line: &str) -> String {
        let rule = parse_rule(0, line).unwrap();
        let rendered = rule.to_string();
        assert_eq!(parse_rule(0, &rendered).unwrap(), rule, "re-parse of {rendered}");
        rendered
    }

    #[test]
    fn test_canonical_key_order() {
        assert_eq!(
            round_trip("stop=yes:pickup=P1: loc = A ,!B :level=title:home=true"),
            "level=title:loc=A,!B:pickup=P1:home=1:stop=1"
        );
    }

    #[test]
    fn test_aliases_render_snake_case() {
        assert_eq!(round_trip("availLib=L1:unavailPolicy=X"), "avail_lib=L1:unavail_policy=X");
    }

    #[test]
    fn test_values_quoted_when_needed() {
        assert_eq!(
            round_trip(r#"pickup="A,B"," padded ","q\"uote", "a:b""#),
            r#"pickup="A,B"," padded ","q\"uote","a:b""#
        );
        assert_eq!(round_trip(r"loc=\d+"), r"loc=\d+");
        assert_eq!(render_value(r"a\b,"), r#""a\\b,""#);
    }

    #[test]
    fn test_extra_keys_kept() {
        assert_eq!(round_trip("pickup=A:zone=1:note="), "pickup=A:zone=1:note=");
    }

    #[test]
    fn test_stop_false_omitted() {
        assert_eq!(round_trip("stop=0:pickup=A"), "pickup=A");
        assert_eq!(round_trip("work=no"), "work=0");
    }

    #[test]
    fn test_empty_rule_renders_non_blank() {
        assert_eq!(round_trip("stop=0"), "pickup=");
        assert_eq!(round_trip("pickup="), "pickup=");

        let rules = parse_rules(&["pickup=A", "stop=0", "pickup=B"]).unwrap();
        let rendered = rules.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, vec!["pickup=A", "pickup=", "pickup=B"]);
        assert_eq!(parse_rules(&lines).unwrap(), rules);
    }
}
