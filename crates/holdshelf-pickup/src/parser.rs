//! Rule line parser.
//!
//! A rule line is a list of `key=value,value` clauses separated by `:`.
//! Values may be double-quoted to carry `,` `:` or `"`; inside quotes a
//! backslash escapes the next character. Outside quotes a backslash is an
//! ordinary character, so regex escapes such as `\d` need no quoting.

use crate::rule::{Pattern, PickupRule, RuleSet};
use holdshelf_core::{RuleParseError, RuleParseErrorKind};
use std::iter::Peekable;
use std::str::CharIndices;

type Clause = (String, Vec<String>);

/// Parse a full rule list. Blank lines are skipped but still count toward
/// the index reported in errors. The first error fails the whole list.
pub fn parse_rules<S: AsRef<str>>(lines: &[S]) -> Result<RuleSet, RuleParseError> {
    let mut rules = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let line: &str = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }
        rules.push(parse_rule(index, line)?);
    }
    Ok(RuleSet::new(rules))
}

/// Parse one rule line; `index` is its position in the configured list.
pub fn parse_rule(index: usize, line: &str) -> Result<PickupRule, RuleParseError> {
    build_rule(line).map_err(|kind| RuleParseError::new(index, line, kind))
}

fn build_rule(line: &str) -> Result<PickupRule, RuleParseErrorKind> {
    let mut rule = PickupRule::new();

    for (key, values) in scan_clauses(line)? {
        match key.as_str() {
            "level" => rule.level.extend(compile(&values)?),
            "lib" => rule.items.lib.extend(values),
            "loc" => rule.items.loc.extend(compile(&values)?),
            "policy" => rule.items.policy.extend(compile(&values)?),
            "avail_lib" | "availLib" => rule.available.lib.extend(values),
            "avail" => rule.available.loc.extend(compile(&values)?),
            "avail_policy" | "availPolicy" => rule.available.policy.extend(compile(&values)?),
            "unavail_lib" | "unavailLib" => rule.unavailable.lib.extend(values),
            "unavail" => rule.unavailable.loc.extend(compile(&values)?),
            "unavail_policy" | "unavailPolicy" => {
                rule.unavailable.policy.extend(compile(&values)?)
            }
            "group" => rule.group.extend(compile(&values)?),
            "pickup" => rule.pickup.extend(values),
            "home" => rule.home = Some(parse_bool(&key, &values)?),
            "work" => rule.work = Some(parse_bool(&key, &values)?),
            "stop" => rule.stop = parse_bool(&key, &values)?,
            _ => match rule.extra.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => existing.extend(values),
                None => rule.extra.push((key, values)),
            },
        }
    }

    Ok(rule)
}

fn compile(values: &[String]) -> Result<Vec<Pattern>, RuleParseErrorKind> {
    values.iter().map(|v| Pattern::compile(v)).collect()
}

fn parse_bool(key: &str, values: &[String]) -> Result<bool, RuleParseErrorKind> {
    let invalid = || RuleParseErrorKind::InvalidBoolean {
        key: key.to_string(),
        value: values.join(","),
    };
    match values {
        [value] => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

/// Split a line into `(key, values)` clauses. Empty clauses are dropped, as
/// are unquoted empty values.
fn scan_clauses(line: &str) -> Result<Vec<Clause>, RuleParseErrorKind> {
    let mut chars = line.char_indices().peekable();
    let mut clauses = Vec::new();

    loop {
        let mut key = String::new();
        let mut terminator = None;
        for (at, c) in chars.by_ref() {
            match c {
                '=' | ':' => {
                    terminator = Some(c);
                    break;
                }
                '"' | ',' => {
                    return Err(RuleParseErrorKind::UnexpectedCharacter { found: c, at })
                }
                _ => key.push(c),
            }
        }
        let key = key.trim();

        match terminator {
            Some('=') => {}
            Some(_) | None if !key.is_empty() => {
                return Err(RuleParseErrorKind::MissingEquals(key.to_string()))
            }
            Some(_) => continue,
            None => break,
        }
        if key.is_empty() {
            return Err(RuleParseErrorKind::EmptyKey);
        }

        let (values, more) = scan_values(&mut chars)?;
        clauses.push((key.to_string(), values));
        if !more {
            break;
        }
    }

    Ok(clauses)
}

/// Read values up to the end of the clause. Returns whether another clause
/// follows.
fn scan_values(
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<(Vec<String>, bool), RuleParseErrorKind> {
    let mut values = Vec::new();

    loop {
        skip_whitespace(chars);
        match chars.peek() {
            Some(&(start, '"')) => {
                chars.next();
                values.push(scan_quoted(chars, start)?);
                skip_whitespace(chars);
            }
            _ => {
                let mut bare = String::new();
                while let Some(&(at, c)) = chars.peek() {
                    match c {
                        ',' | ':' => break,
                        '"' => {
                            return Err(RuleParseErrorKind::UnexpectedCharacter { found: c, at })
                        }
                        _ => {
                            bare.push(c);
                            chars.next();
                        }
                    }
                }
                let bare = bare.trim();
                if !bare.is_empty() {
                    values.push(bare.to_string());
                }
            }
        }

        match chars.next() {
            Some((_, ',')) => continue,
            Some((_, ':')) => return Ok((values, true)),
            None => return Ok((values, false)),
            Some((at, found)) => {
                return Err(RuleParseErrorKind::UnexpectedCharacter { found, at })
            }
        }
    }
}

// The opening quote at `start` has been consumed.
fn scan_quoted(
    chars: &mut Peekable<CharIndices<'_>>,
    start: usize,
) -> Result<String, RuleParseErrorKind> {
    let mut value = String::new();
    while let Some((at, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => return Err(RuleParseErrorKind::DanglingEscape(at)),
            },
            '"' => return Ok(value),
            _ => value.push(c),
        }
    }
    Err(RuleParseErrorKind::UnbalancedQuote(start))
}

fn skip_whitespace(chars: &mut Peekable<CharIndices<'_>>) {
    while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
}
