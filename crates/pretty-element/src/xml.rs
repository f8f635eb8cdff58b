//! XML parsing and serialization for request and response bodies
//!
//! Parsing follows the text/tail model: character data before an element's
//! first child is its text, character data after a child's end tag is that
//! child's tail.

use std::path::Path;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;
use tracing::debug;

use crate::element::Element;

/// Deepest element nesting `from_xml` accepts
///
/// Rendering, serializing, cloning and dropping a tree recurse once per
/// level, so deeper documents are rejected instead of exhausting the stack.
pub const MAX_DEPTH: usize = 512;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Failed to parse XML: {0}")]
    ParseError(#[from] quick_xml::Error),
    #[error("Invalid XML attribute: {0}")]
    AttributeError(#[from] AttrError),
    #[error("XML is not valid UTF-8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
    #[error("Invalid XML structure: {0}")]
    StructureError(String),
    #[error("Failed to serialize XML: {0}")]
    SerializeError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Element {
    /// Parse a document into its root element
    pub fn from_xml(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    check_depth(stack.len() + 1)?;
                    stack.push(open_element(&start)?);
                }
                Event::Empty(start) => {
                    check_depth(stack.len() + 1)?;
                    let element = open_element(&start)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        XmlError::StructureError("unexpected closing tag".to_string())
                    })?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    match stack.last_mut() {
                        Some(open) => open.push_content(&text),
                        None => check_outside_root(&text)?,
                    }
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    let text = std::str::from_utf8(&bytes)?;
                    match stack.last_mut() {
                        Some(open) => open.push_content(text),
                        None => check_outside_root(text)?,
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctypes
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::StructureError(format!(
                "element <{}> is never closed",
                open.tag()
            )));
        }
        let root = root
            .ok_or_else(|| XmlError::StructureError("document has no root element".to_string()))?;
        debug!(root = root.tag(), children = root.len(), "Parsed XML document");
        Ok(root)
    }

    /// Parse a document from a file
    pub fn from_file(path: &Path) -> Result<Self, XmlError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_xml(&content)
    }

    /// Serialize to a compact XML string with no declaration
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner()).map_err(|e| XmlError::SerializeError(e.to_string()))
    }

    /// Write to a file, with an XML declaration
    pub fn to_file(&self, path: &Path) -> Result<(), XmlError> {
        let xml = self.to_xml()?;
        std::fs::write(path, format!("<?xml version='1.0' encoding='UTF-8'?>\n{}", xml))?;
        debug!(root = self.tag(), path = %path.display(), "Wrote XML document");
        Ok(())
    }
}

fn check_depth(depth: usize) -> Result<(), XmlError> {
    if depth > MAX_DEPTH {
        return Err(XmlError::StructureError(format!(
            "element nesting exceeds {} levels",
            MAX_DEPTH
        )));
    }
    Ok(())
}

/// Only whitespace may surround the root element
fn check_outside_root(text: &str) -> Result<(), XmlError> {
    if !text.trim().is_empty() {
        return Err(XmlError::StructureError(format!(
            "text outside the root element: {:?}",
            text.trim()
        )));
    }
    Ok(())
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let tag = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element::with_attributes(tag, attributes))
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.append(element),
        None if root.is_some() => {
            return Err(XmlError::StructureError(format!(
                "second root element <{}>",
                element.tag()
            )));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    let start = BytesStart::new(element.tag()).with_attributes(
        element
            .attributes()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    if element.is_empty() && element.text().is_none() {
        emit(writer, Event::Empty(start))?;
    } else {
        emit(writer, Event::Start(start))?;
        if let Some(text) = element.text() {
            emit(writer, Event::Text(BytesText::new(text)))?;
        }
        for child in element.children() {
            write_element(writer, child)?;
        }
        emit(writer, Event::End(BytesEnd::new(element.tag())))?;
    }

    if let Some(tail) = element.tail() {
        emit(writer, Event::Text(BytesText::new(tail)))?;
    }
    Ok(())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::SerializeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use tempfile::TempDir;

    const POLICY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<policy>
    <general>
        <id>12</id>
        <name>Install Firefox</name>
        <!-- set by the server -->
        <enabled>true</enabled>
    </general>
    <package_configuration>
        <packages>
            <size>1</size>
            <package name="Firefox" action="Install"/>
        </packages>
    </package_configuration>
    <self_service><![CDATA[<b>Browser</b>]]></self_service>
</policy>"#;

    #[test]
    fn test_parse_policy() {
        let policy = Element::from_xml(POLICY).unwrap();
        assert_eq!(policy.tag(), "policy");
        assert_eq!(policy.len(), 3);

        let general = policy.get_child("general").unwrap();
        assert_eq!(general.len(), 3);
        assert_eq!(general["name"].text(), Some("Install Firefox"));

        let package = crate::child!(policy, package_configuration.packages.package).unwrap();
        assert_eq!(package.get("name"), Some("Firefox"));
        assert_eq!(package.get("action"), Some("Install"));

        assert_eq!(policy["self_service"].text(), Some("<b>Browser</b>"));
    }

    #[test]
    fn test_parse_text_and_tail() {
        let root = Element::from_xml("<p>lead<b>bold</b>trail<i/>end</p>").unwrap();
        assert_eq!(root.text(), Some("lead"));
        assert_eq!(root["b"].text(), Some("bold"));
        assert_eq!(root["b"].tail(), Some("trail"));
        assert_eq!(root["i"].text(), None);
        assert_eq!(root["i"].tail(), Some("end"));
    }

    #[test]
    fn test_parse_unescapes() {
        let root = Element::from_xml(r#"<script notes="a &amp; b">echo &lt;hi&gt;</script>"#)
            .unwrap();
        assert_eq!(root.get("notes"), Some("a & b"));
        assert_eq!(root.text(), Some("echo <hi>"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Element::from_xml("   "),
            Err(XmlError::StructureError(_))
        ));
        assert!(matches!(
            Element::from_xml("<a/><b/>"),
            Err(XmlError::StructureError(_))
        ));
        assert!(Element::from_xml("<a><b></a>").is_err());
        assert!(Element::from_xml("<a>").is_err());
    }

    #[test]
    fn test_parse_rejects_excessive_nesting() {
        let at_limit = format!("{}{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        assert_eq!(Element::from_xml(&at_limit).unwrap().iter().count(), MAX_DEPTH);

        let empty_past_limit = format!(
            "{}<b/>{}",
            "<a>".repeat(MAX_DEPTH),
            "</a>".repeat(MAX_DEPTH)
        );
        assert!(matches!(
            Element::from_xml(&empty_past_limit),
            Err(XmlError::StructureError(_))
        ));

        let deep = format!("{}{}", "<a>".repeat(200_000), "</a>".repeat(200_000));
        let err = Element::from_xml(&deep).unwrap_err();
        assert!(err.to_string().contains("element nesting exceeds"));
    }

    #[test]
    fn test_parse_rejects_text_outside_root() {
        assert!(matches!(
            Element::from_xml("<a/>junk"),
            Err(XmlError::StructureError(_))
        ));
        assert!(matches!(
            Element::from_xml("lead<a/>"),
            Err(XmlError::StructureError(_))
        ));
        assert!(Element::from_xml("\n  <a/>\n").is_ok());
    }

    #[test]
    fn test_blanked_text_round_trips() {
        let mut root = Element::new("policy");
        let name = root.sub_element_tag("name");
        name.set_text("Install Firefox");
        name.set_text("");
        name.set_tail("");

        let xml = root.to_xml().unwrap();
        assert_eq!(xml, "<policy><name/></policy>");
        assert_eq!(Element::from_xml(&xml).unwrap(), root);
    }

    #[test]
    fn test_to_xml() {
        let mut root = Element::new("policy");
        let general = root.sub_element("general", [("id", "5")]);
        general.sub_element_tag("name").set_text("R&D <tools>");
        root.sub_element_tag("scope");

        let xml = root.to_xml().unwrap();
        assert_eq!(
            xml,
            "<policy><general id=\"5\"><name>R&amp;D &lt;tools&gt;</name></general><scope/></policy>"
        );
        assert_eq!(Element::from_xml(&xml).unwrap(), root);
    }

    #[test]
    fn test_pretty_xml_reparses_equal() {
        let policy = Element::from_xml(POLICY).unwrap();
        let reparsed = Element::from_xml(&policy.to_xml().unwrap()).unwrap();
        assert_eq!(reparsed, policy);
        assert_eq!(render(&reparsed, 0), render(&policy, 0));
    }

    #[test]
    fn test_render_parsed_ignores_layout_whitespace() {
        let root = Element::from_xml("<computer>\n  <general>\n    <id>4</id>\n  </general>\n</computer>")
            .unwrap();
        assert_eq!(
            render(&root, 0),
            "<computer>\n    <general>\n        <id>4</id>\n    </general>\n</computer>"
        );
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("policy.xml");

        let policy = Element::from_xml(POLICY).unwrap();
        policy.to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<?xml"));
        assert_eq!(Element::from_file(&path).unwrap(), policy);

        let missing = Element::from_file(&temp_dir.path().join("missing.xml"));
        assert!(matches!(missing, Err(XmlError::IoError(_))));
    }
}
