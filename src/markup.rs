//! Label markup conversion.
//!
//! Rich labels arrive as lenient HTML and must be embedded as well-formed
//! XHTML. [`to_xhtml`] tokenizes the fragment with the `markup.pest` grammar
//! and rewrites it; [`plain_text`] recovers the visible text for measurement
//! and fallback content.

use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::errors::MarkupError;

#[derive(Parser)]
#[grammar = "markup.pest"]
pub struct MarkupParser;

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements that end a line of visible text.
const BLOCK_ELEMENTS: &[&str] = &[
    "div", "p", "li", "tr", "ul", "ol", "table", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5",
    "h6",
];

/// HTML named entities mapped to code points. XML's own five are kept as is.
const NAMED_ENTITIES: &[(&str, u32)] = &[
    ("nbsp", 160),
    ("iexcl", 161),
    ("cent", 162),
    ("pound", 163),
    ("yen", 165),
    ("sect", 167),
    ("copy", 169),
    ("laquo", 171),
    ("reg", 174),
    ("deg", 176),
    ("plusmn", 177),
    ("para", 182),
    ("middot", 183),
    ("raquo", 187),
    ("frac12", 189),
    ("times", 215),
    ("divide", 247),
    ("ndash", 8211),
    ("mdash", 8212),
    ("lsquo", 8216),
    ("rsquo", 8217),
    ("ldquo", 8220),
    ("rdquo", 8221),
    ("bull", 8226),
    ("hellip", 8230),
    ("euro", 8364),
    ("trade", 8482),
    ("larr", 8592),
    ("rarr", 8594),
];

const XML_ENTITIES: &[(&str, char)] = &[
    ("lt", '<'),
    ("gt", '>'),
    ("amp", '&'),
    ("quot", '"'),
    ("apos", '\''),
];

fn parse(source: &str) -> Result<Pair<'_, Rule>, MarkupError> {
    let mut pairs = MarkupParser::parse(Rule::fragment, source).map_err(|e| {
        let offset = match e.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        MarkupError::new(source, offset, e.variant.message().into_owned())
    })?;
    pairs
        .next()
        .ok_or_else(|| MarkupError::new(source, 0, "empty parse"))
}

/// Rewrite a lenient HTML fragment as well-formed XHTML.
///
/// Tag and attribute names are lowercased, void elements are self-closed,
/// unknown entities and stray `<`/`&` are escaped, unmatched close tags are
/// dropped and elements still open at the end are closed.
pub fn to_xhtml(source: &str) -> Result<String, MarkupError> {
    let fragment = parse(source)?;
    let mut out = String::with_capacity(source.len() + 16);
    let mut open: Vec<String> = Vec::new();

    for node in fragment.into_inner() {
        match node.as_rule() {
            Rule::open_tag => write_open_tag(node, &mut out, &mut open),
            Rule::close_tag => {
                let name = first_inner_str(&node).to_ascii_lowercase();
                if let Some(depth) = open.iter().rposition(|tag| *tag == name) {
                    while open.len() > depth {
                        if let Some(tag) = open.pop() {
                            out.push_str(&format!("</{tag}>"));
                        }
                    }
                } else {
                    crate::log::trace!(tag = %name, "dropping unmatched close tag");
                }
            }
            Rule::entity => write_entity(node.as_str(), &mut out),
            Rule::stray => out.push_str(if node.as_str() == "<" { "&lt;" } else { "&amp;" }),
            Rule::text => out.push_str(&node.as_str().replace('>', "&gt;")),
            // comments, declarations and processing instructions are dropped
            _ => {}
        }
    }

    while let Some(tag) = open.pop() {
        out.push_str(&format!("</{tag}>"));
    }
    Ok(out)
}

fn first_inner_str<'a>(pair: &Pair<'a, Rule>) -> &'a str {
    pair.clone()
        .into_inner()
        .next()
        .map(|p| p.as_str())
        .unwrap_or("")
}

fn write_open_tag(pair: Pair<'_, Rule>, out: &mut String, open: &mut Vec<String>) {
    let mut name = String::new();
    let mut self_close = false;
    let mut seen: Vec<String> = Vec::new();
    let mut attrs = String::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::tag_name => name = inner.as_str().to_ascii_lowercase(),
            Rule::self_close => self_close = true,
            Rule::attribute => {
                let mut parts = inner.into_inner();
                let Some(attr_name) = parts.next() else {
                    continue;
                };
                let attr_name = attr_name.as_str().to_ascii_lowercase();
                if !is_xml_name(&attr_name) || seen.contains(&attr_name) {
                    continue;
                }
                let value = match parts.next() {
                    Some(value) => match value.as_rule() {
                        Rule::quoted_double | Rule::quoted_single => {
                            first_inner_str(&value).to_string()
                        }
                        _ => value.as_str().to_string(),
                    },
                    // Boolean attributes repeat their name
                    None => attr_name.clone(),
                };
                attrs.push_str(&format!(" {}=\"{}\"", attr_name, escape_attr(&value)));
                seen.push(attr_name);
            }
            _ => {}
        }
    }

    out.push('<');
    out.push_str(&name);
    out.push_str(&attrs);
    if VOID_ELEMENTS.contains(&name.as_str()) || self_close {
        out.push_str(" />");
    } else {
        out.push('>');
        open.push(name);
    }
}

fn write_entity(entity: &str, out: &mut String) {
    let name = &entity[1..entity.len() - 1];
    if name.starts_with('#') || XML_ENTITIES.iter().any(|(n, _)| *n == name) {
        out.push_str(entity);
    } else if let Some((_, code)) = NAMED_ENTITIES.iter().find(|(n, _)| *n == name) {
        out.push_str(&format!("&#{code};"));
    } else {
        out.push_str("&amp;");
        out.push_str(&entity[1..]);
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.char_indices() {
        match c {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '&' if !starts_entity(&value[i..]) => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

fn starts_entity(s: &str) -> bool {
    let Some(end) = s.find(';') else {
        return false;
    };
    let body = &s[1..end];
    if let Some(num) = body.strip_prefix('#') {
        match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        }
    } else {
        XML_ENTITIES.iter().any(|(n, _)| *n == body)
    }
}

/// Visible text of a markup fragment.
///
/// Whitespace runs collapse to one space, `<br>` and the end of block
/// elements start a new line, and entities are decoded.
pub fn plain_text(source: &str) -> Result<String, MarkupError> {
    let fragment = parse(source)?;
    let mut lines: Vec<String> = vec![String::new()];

    let push_text = |lines: &mut Vec<String>, text: &str| {
        if let Some(line) = lines.last_mut() {
            for c in text.chars() {
                if c.is_whitespace() && c != '\u{a0}' {
                    if !line.is_empty() && !line.ends_with(' ') {
                        line.push(' ');
                    }
                } else {
                    line.push(c);
                }
            }
        }
    };

    for node in fragment.into_inner() {
        match node.as_rule() {
            Rule::text => push_text(&mut lines, node.as_str()),
            Rule::stray => push_text(&mut lines, node.as_str()),
            Rule::entity => {
                let decoded = decode_entity(node.as_str());
                push_text(&mut lines, &decoded);
            }
            Rule::open_tag if first_inner_str(&node).eq_ignore_ascii_case("br") => {
                lines.push(String::new());
            }
            Rule::close_tag => {
                let name = first_inner_str(&node).to_ascii_lowercase();
                let at_line_start = lines.last().is_none_or(|l| l.trim().is_empty());
                if BLOCK_ELEMENTS.contains(&name.as_str()) && !at_line_start {
                    lines.push(String::new());
                }
            }
            _ => {}
        }
    }

    while lines.len() > 1 && lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    Ok(lines
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn decode_entity(entity: &str) -> String {
    let name = &entity[1..entity.len() - 1];
    let code = if let Some(num) = name.strip_prefix('#') {
        match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        }
    } else if let Some((_, c)) = XML_ENTITIES.iter().find(|(n, _)| *n == name) {
        Some(*c as u32)
    } else {
        NAMED_ENTITIES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, code)| *code)
    };
    code.and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_else(|| entity.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_elements_are_self_closed() {
        assert_eq!(to_xhtml("a<br>b<HR>").unwrap(), "a<br />b<hr />");
        assert_eq!(
            to_xhtml(r#"<img src=pic.png alt="x">"#).unwrap(),
            r#"<img src="pic.png" alt="x" />"#
        );
    }

    #[test]
    fn open_elements_are_closed_in_order() {
        assert_eq!(to_xhtml("<B><i>x").unwrap(), "<b><i>x</i></b>");
        assert_eq!(to_xhtml("<b><i>x</b>y").unwrap(), "<b><i>x</i></b>y");
        assert_eq!(to_xhtml("x</span>").unwrap(), "x");
    }

    #[test]
    fn stray_characters_and_entities_are_escaped() {
        assert_eq!(to_xhtml("a < b & c").unwrap(), "a &lt; b &amp; c");
        assert_eq!(to_xhtml("&nbsp;&amp;&#65;&bogus;").unwrap(), "&#160;&amp;&#65;&amp;bogus;");
        assert_eq!(to_xhtml("1 > 0").unwrap(), "1 &gt; 0");
    }

    #[test]
    fn attributes_are_normalized() {
        assert_eq!(
            to_xhtml(r#"<input Disabled VALUE='a"b' value=c>"#).unwrap(),
            r#"<input disabled="disabled" value="a&quot;b" />"#
        );
        assert_eq!(
            to_xhtml(r#"<a href="?a=1&b=2&amp;c">x</a>"#).unwrap(),
            r#"<a href="?a=1&amp;b=2&amp;c">x</a>"#
        );
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(to_xhtml("a<!-- hidden -->b<!DOCTYPE x>").unwrap(), "ab");
    }

    #[test]
    fn control_characters_are_rejected() {
        let err = to_xhtml("ok\u{1}bad").unwrap_err();
        assert_eq!(err.span.offset(), 2);
    }

    #[test]
    fn plain_text_breaks_lines() {
        assert_eq!(
            plain_text("<div>Hello   <b>world</b></div><div>second&amp;line</div>").unwrap(),
            "Hello world\nsecond&line"
        );
        assert_eq!(plain_text("a<br />b").unwrap(), "a\nb");
    }
}
