//! Documentation-comment parser.
//!
//! Understands the `/** ... */` layout, a summary/description split, and a
//! small tag vocabulary: `@var`, `@property`, `@property-read`, `@property-write`,
//! `@template`, `@deprecated` and `@readonly`. Other tags are skipped.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annotation::{self, TemplateParam};
use crate::error::ParseError;
use crate::types::TypeDescriptor;

static OPENING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*/\*\*+").unwrap());
static CLOSING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*+/\s*$").unwrap());
static LEADING_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\*(?: |$)?").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^@([A-Za-z][\w-]*)\s*(.*)$").unwrap());
static VARIABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)(?:\s+(?:of|as)\s+(.*))?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyAccess {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl PropertyAccess {
    fn from_tag(name: &str) -> Option<Self> {
        match name {
            "property" => Some(PropertyAccess::ReadWrite),
            "property-read" => Some(PropertyAccess::ReadOnly),
            "property-write" => Some(PropertyAccess::WriteOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// `@var T [$name] [text]`
    Var {
        ty: TypeDescriptor,
        variable: Option<String>,
        description: String,
    },
    /// `@property[-read|-write] T $name [text]`
    Property {
        access: PropertyAccess,
        ty: TypeDescriptor,
        name: String,
        description: String,
    },
    /// `@template T [of Bound]`
    Template(TemplateParam),
    Deprecated,
    ReadOnly,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocBlock {
    pub summary: String,
    pub description: String,
    pub tags: Vec<Tag>,
}

impl DocBlock {
    /// Parses a raw doc comment. `templates` are the template parameters already in
    /// scope (those of the declaring class, for a field comment).
    pub fn parse(comment: &str, templates: &[TemplateParam]) -> Result<Self, ParseError> {
        let lines = strip_comment(comment);

        let mut text = Vec::new();
        let mut raw_tags: Vec<String> = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if trimmed.starts_with('@') {
                raw_tags.push(trimmed.to_string());
            } else if let Some(current) = raw_tags.last_mut() {
                current.push('\n');
                current.push_str(trimmed);
            } else {
                text.push(trimmed.to_string());
            }
        }

        let (summary, description) = split_summary(&text);

        let mut scope = templates.to_vec();
        let mut tags = Vec::new();

        // templates first, so other tags may refer to them
        for raw in &raw_tags {
            let Some((name, body)) = split_tag(raw) else { continue };
            if name == "template" || name == "template-covariant" {
                let param = parse_template(body, &scope)?;
                scope.push(param.clone());
                tags.push(Tag::Template(param));
            }
        }

        for raw in &raw_tags {
            let Some((name, body)) = split_tag(raw) else { continue };
            match name {
                "var" => {
                    let (ty, rest) = parse_typed_body(body, &scope)?;
                    let (variable, description) = take_variable(rest);
                    tags.push(Tag::Var {
                        ty,
                        variable,
                        description,
                    });
                }
                "property" | "property-read" | "property-write" => {
                    let access = PropertyAccess::from_tag(name).unwrap_or(PropertyAccess::ReadWrite);
                    let (ty, rest) = parse_typed_body(body, &scope)?;
                    let (variable, description) = take_variable(rest);
                    let Some(property) = variable else {
                        return Err(ParseError::new(
                            body,
                            body.len() - rest.len(),
                            format!("`@{name}` must name a property with `$name`"),
                        ));
                    };
                    tags.push(Tag::Property {
                        access,
                        ty,
                        name: property,
                        description,
                    });
                }
                "deprecated" => tags.push(Tag::Deprecated),
                "readonly" => tags.push(Tag::ReadOnly),
                _ => {}
            }
        }

        Ok(DocBlock {
            summary,
            description,
            tags,
        })
    }

    pub fn templates(&self) -> Vec<TemplateParam> {
        self.tags
            .iter()
            .filter_map(|tag| match tag {
                Tag::Template(param) => Some(param.clone()),
                _ => None,
            })
            .collect()
    }

    /// The first `@var` tag.
    pub fn var_tag(&self) -> Option<&Tag> {
        self.tags.iter().find(|tag| matches!(tag, Tag::Var { .. }))
    }

    pub fn is_deprecated(&self) -> bool {
        self.tags.contains(&Tag::Deprecated)
    }

    pub fn is_readonly(&self) -> bool {
        self.tags.contains(&Tag::ReadOnly)
    }

    /// Summary and description as one text, so the first line can become a title.
    pub fn full_text(&self) -> String {
        format!("{}\n\n{}", self.summary, self.description)
            .trim_end()
            .to_string()
    }
}

fn strip_comment(comment: &str) -> Vec<String> {
    let inner = OPENING.replace(comment, "");
    let inner = CLOSING.replace(&inner, "");
    inner
        .lines()
        .map(|line| LEADING_STAR.replace(line, "").into_owned())
        .collect()
}

/// The summary is the first paragraph, ending early at a line that ends in `.`.
fn split_summary(lines: &[String]) -> (String, String) {
    let lines: Vec<&str> = lines.iter().map(String::as_str).skip_while(|l| l.is_empty()).collect();
    let mut summary = Vec::new();
    let mut rest = lines.as_slice();
    while let Some((first, tail)) = rest.split_first() {
        if first.is_empty() {
            break;
        }
        summary.push(*first);
        rest = tail;
        if first.ends_with('.') {
            break;
        }
    }
    (summary.join("\n"), rest.join("\n").trim().to_string())
}

fn split_tag(raw: &str) -> Option<(&str, &str)> {
    let caps = TAG.captures(raw)?;
    let name = caps.get(1)?.as_str();
    let body = caps.get(2).map_or("", |m| m.as_str());
    Some((name, body))
}

fn parse_template(body: &str, scope: &[TemplateParam]) -> Result<TemplateParam, ParseError> {
    let caps = TEMPLATE
        .captures(body.trim())
        .ok_or_else(|| ParseError::new(body, 0, "`@template` needs a parameter name"))?;
    let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let bound = match caps.get(2) {
        Some(m) => Some(annotation::parse_type_prefix(m.as_str(), scope)?.0),
        None => None,
    };
    Ok(TemplateParam { name, bound })
}

fn parse_typed_body<'a>(body: &'a str, scope: &[TemplateParam]) -> Result<(TypeDescriptor, &'a str), ParseError> {
    let (ty, end) = annotation::parse_type_prefix(body, scope)?;
    Ok((ty, &body[end..]))
}

fn take_variable(rest: &str) -> (Option<String>, String) {
    let rest = rest.trim_start();
    match VARIABLE.captures(rest) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let name = caps.get(1).map(|m| m.as_str().to_string());
            (name, rest[whole..].trim().to_string())
        }
        None => (None, rest.trim().to_string()),
    }
}
