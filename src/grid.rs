//! In-memory element tree for grid documents.
//!
//! The tree keeps everything the consuming application might care about
//! (byte order mark, declaration, comments, attribute order, whitespace and
//! escaped text) so untouched content serializes back byte for byte. Start
//! tags are the exception: they are rebuilt from name and attributes, which
//! normalizes attribute quoting, escaping and spacing.

use crate::error::{io_at, GfResult, GridForgeError};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::Path;

pub const CELL: &str = "Cell";
pub const CAPTION_PATH: [&str; 3] = ["Content", "CaptionAndImage", "Caption"];
pub const COMMANDS_PATH: [&str; 2] = ["Content", "Commands"];
pub const COMMAND: &str = "Command";
pub const PARAMETER: &str = "Parameter";

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data written by the rewriter.
    Text(String),
    /// Character data as read: `raw` is the escaped source, `text` its
    /// decoded value. Written back from `raw`.
    SourceText { raw: String, text: String },
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Decl(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn from_start(e: &BytesStart) -> GfResult<Self> {
        let mut element = Self::new(String::from_utf8_lossy(e.name().as_ref()));
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter_map(move |node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.children.iter_mut().filter_map(move |node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Follows first-match children along `path`.
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |el, name| el.child(name))
    }

    pub fn find_path_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for name in path {
            current = current.child_mut(name)?;
        }
        Some(current)
    }

    /// Concatenated text and CDATA content of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                Node::SourceText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True when the element carries no character data at all, not even
    /// whitespace.
    pub fn has_no_text(&self) -> bool {
        self.text().is_empty()
    }

    /// Replaces all character data, keeping child elements in place.
    pub fn set_text(&mut self, text: &str) {
        self.children.retain(|node| {
            !matches!(
                node,
                Node::Text(_) | Node::SourceText { .. } | Node::CData(_)
            )
        });
        if !text.is_empty() {
            self.children.insert(0, Node::Text(text.to_string()));
        }
        self.self_closing = false;
    }

    /// Calls `f` on every descendant named `name`, in document order.
    /// Matching elements are not searched further.
    pub fn visit_mut<F: FnMut(&mut Element)>(&mut self, name: &str, f: &mut F) {
        for node in &mut self.children {
            if let Node::Element(el) = node {
                if el.name == name {
                    f(el);
                } else {
                    el.visit_mut(name, f);
                }
            }
        }
    }

    pub fn visit<'a, F: FnMut(&'a Element)>(&'a self, name: &str, f: &mut F) {
        for node in &self.children {
            if let Node::Element(el) = node {
                if el.name == name {
                    f(el);
                } else {
                    el.visit(name, f);
                }
            }
        }
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> GfResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.self_closing && self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

impl Node {
    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> GfResult<()> {
        match self {
            Node::Element(el) => return el.write_to(writer),
            Node::Text(t) => {
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(t))))?
            }
            Node::SourceText { raw, .. } => {
                writer.write_event(Event::Text(BytesText::from_escaped(raw.as_str())))?
            }
            Node::CData(t) => writer.write_event(Event::CData(BytesCData::new(t.as_str())))?,
            Node::Comment(t) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(t.as_str())))?
            }
            Node::ProcessingInstruction(t) => {
                writer.write_event(Event::PI(BytesText::from_escaped(t.as_str())))?
            }
            Node::Decl(t) => writer.write_event(Event::Decl(BytesDecl::from_start(
                BytesStart::from_content(t.as_str(), 3),
            )))?,
            Node::DocType(t) => {
                writer.write_event(Event::DocType(BytesText::from_escaped(t.as_str())))?
            }
        }
        Ok(())
    }
}

/// One grid page: the root element plus whatever surrounds it.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDocument {
    bom: bool,
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl GridDocument {
    pub fn parse(xml: &str) -> GfResult<Self> {
        let (bom, xml) = match xml.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, xml),
        };
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            let node = match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    stack.push(Element::from_start(e)?);
                    None
                }
                Event::Empty(ref e) => {
                    let mut el = Element::from_start(e)?;
                    el.self_closing = true;
                    Some(Node::Element(el))
                }
                Event::End(_) => stack.pop().map(Node::Element),
                Event::Text(ref e) => Some(Node::SourceText {
                    raw: String::from_utf8_lossy(e).into_owned(),
                    text: e.unescape()?.into_owned(),
                }),
                Event::CData(ref e) => Some(Node::CData(String::from_utf8_lossy(e).into_owned())),
                Event::Comment(ref e) => {
                    Some(Node::Comment(String::from_utf8_lossy(e).into_owned()))
                }
                Event::PI(ref e) => Some(Node::ProcessingInstruction(
                    String::from_utf8_lossy(e).into_owned(),
                )),
                Event::Decl(ref e) => Some(Node::Decl(String::from_utf8_lossy(e).into_owned())),
                Event::DocType(ref e) => {
                    Some(Node::DocType(String::from_utf8_lossy(e).into_owned()))
                }
                Event::Eof => break,
            };

            if let Some(node) = node {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => nodes.push(node),
                }
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(GridForgeError::Xml(quick_xml::Error::UnexpectedEof(
                format!("unclosed element <{}>", open.name),
            )));
        }

        let root_index = nodes
            .iter()
            .position(|node| matches!(node, Node::Element(_)))
            .ok_or_else(|| {
                GridForgeError::Xml(quick_xml::Error::UnexpectedEof(
                    "document has no root element".to_string(),
                ))
            })?;

        let epilog = nodes.split_off(root_index + 1);
        let root = match nodes.pop() {
            Some(Node::Element(el)) => el,
            _ => Element::default(),
        };

        Ok(Self {
            bom,
            prolog: nodes,
            root,
            epilog,
        })
    }

    pub fn load(path: &Path) -> GfResult<Self> {
        let xml = fs::read_to_string(path).map_err(io_at(path))?;
        Self::parse(&xml)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn cells(&self) -> Vec<&Element> {
        let mut cells = Vec::new();
        self.root().visit(CELL, &mut |cell| cells.push(cell));
        cells
    }

    pub fn for_each_cell_mut<F: FnMut(&mut Element)>(&mut self, mut f: F) {
        self.root_mut().visit_mut(CELL, &mut f);
    }

    /// Generic serialization. Application-specific repairs live in `fixup`.
    pub fn to_xml_string(&self) -> GfResult<String> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            node.write_to(&mut writer)?;
        }
        self.root.write_to(&mut writer)?;
        for node in &self.epilog {
            node.write_to(&mut writer)?;
        }
        let body = String::from_utf8_lossy(&writer.into_inner()).into_owned();
        if self.bom {
            return Ok(format!("{}{}", BOM, body));
        }
        Ok(body)
    }
}

/// Caption text of a cell, if the cell has a caption element.
pub fn caption_of(cell: &Element) -> Option<String> {
    cell.find_path(&CAPTION_PATH).map(Element::text)
}

/// `ID` attributes of a cell's commands, in order.
pub fn command_ids(cell: &Element) -> Vec<&str> {
    cell.find_path(&COMMANDS_PATH)
        .map(|commands| {
            commands
                .children_named(COMMAND)
                .filter_map(|command| command.attr("ID"))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Grid>
  <!-- keys -->
  <Cells>
    <Cell X="1">
      <Content>
        <Commands>
          <Command ID="Action.Letter"><Parameter Key="letter">a</Parameter></Command>
        </Commands>
        <CaptionAndImage><Caption>a</Caption></CaptionAndImage>
      </Content>
    </Cell>
    <Cell X="2"/>
  </Cells>
</Grid>"#;

    #[test]
    fn test_untouched_document_round_trips() {
        let doc = GridDocument::parse(CELL_XML).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), CELL_XML);
    }

    #[test]
    fn test_cell_accessors() {
        let doc = GridDocument::parse(CELL_XML).unwrap();
        let cells = doc.cells();
        assert_eq!(cells.len(), 2);
        assert_eq!(caption_of(cells[0]).as_deref(), Some("a"));
        assert_eq!(command_ids(cells[0]), vec!["Action.Letter"]);
        assert_eq!(caption_of(cells[1]), None);
    }

    #[test]
    fn test_set_text_escapes_on_write() {
        let mut doc = GridDocument::parse("<Grid><Caption/></Grid>").unwrap();
        doc.root_mut().child_mut("Caption").unwrap().set_text("<&>");
        assert_eq!(
            doc.to_xml_string().unwrap(),
            "<Grid><Caption>&lt;&amp;&gt;</Caption></Grid>"
        );
    }

    #[test]
    fn test_bom_line_endings_and_references_survive() {
        let xml = "\u{feff}<?xml version=\"1.0\"?>\r\n<Grid>\r\n  <Caption>&#x3B1;&amp;&#946;</Caption>\r\n</Grid>";
        let doc = GridDocument::parse(xml).unwrap();

        assert_eq!(doc.root().child("Caption").unwrap().text(), "α&β");
        assert_eq!(doc.to_xml_string().unwrap(), xml);
    }

    #[test]
    fn test_edited_text_is_escaped_fresh() {
        let mut doc = GridDocument::parse("<Grid><Caption>&#x3B1;</Caption></Grid>").unwrap();
        doc.root_mut().child_mut("Caption").unwrap().set_text("β&");
        assert_eq!(
            doc.to_xml_string().unwrap(),
            "<Grid><Caption>β&amp;</Caption></Grid>"
        );
    }

    #[test]
    fn test_unclosed_document_is_rejected() {
        assert!(GridDocument::parse("<Grid><Cells>").is_err());
        assert!(GridDocument::parse("   ").is_err());
    }
}
