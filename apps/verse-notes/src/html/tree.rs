//! Anchor subtree
//!
//! A small owned node tree standing in for a rendered verse element. All
//! offsets are UTF-16 code units over text nodes only; elements contribute
//! no characters of their own.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::location::TextRuns;

/// Elements that never have children, even when the markup leaves them open
const VOID_TAGS: &[&str] = &["br", "hr", "img", "wbr"];

/// A node in an anchor subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

/// An element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Errors while parsing verse markup
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("Markup parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },
}

/// Length of a string in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Byte index for a UTF-16 offset; `None` inside a surrogate pair or past the end
fn utf16_to_byte(text: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        if units == offset {
            return Some(idx);
        }
        units += ch.len_utf16();
        if units > offset {
            return None;
        }
    }
    (units == offset).then_some(text.len())
}

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// UTF-16 length of the text this node contributes
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(text) => utf16_len(text),
            Node::Element(el) => el.text_len(),
        }
    }

    /// Split at an offset strictly inside the node, keeping the left part in place
    ///
    /// Elements split into two shells with the same tag and attributes.
    fn split_off(&mut self, at: usize) -> Option<Node> {
        match self {
            Node::Text(text) => {
                let idx = utf16_to_byte(text, at)?;
                Some(Node::Text(text.split_off(idx)))
            }
            Node::Element(el) => {
                let idx = split_children(&mut el.children, at, false)?;
                Some(Node::Element(Element {
                    tag: el.tag.clone(),
                    attrs: el.attrs.clone(),
                    children: el.children.split_off(idx),
                }))
            }
        }
    }
}

/// Make `at` fall on a child boundary and return the index of the child that starts there
///
/// With `skip_empty`, zero-length children sitting exactly on `at` are left
/// before the returned index.
fn split_children(children: &mut Vec<Node>, at: usize, skip_empty: bool) -> Option<usize> {
    let mut offset = 0;
    for i in 0..children.len() {
        let len = children[i].text_len();
        if offset == at && !(skip_empty && len == 0) {
            return Some(i);
        }
        if offset < at && at < offset + len {
            let right = children[i].split_off(at - offset)?;
            children.insert(i + 1, right);
            return Some(i + 1);
        }
        offset += len;
    }
    (offset == at).then_some(children.len())
}

/// A slice of the range to wrap at one level of the tree
enum Segment {
    /// Sibling run `[start, end)` wrapped in place
    Run(usize, usize),
    /// Child element that receives its own piece over `[start, end)` of its text
    Into(usize, usize, usize),
}

fn surround_in<F>(
    children: &mut Vec<Node>,
    start: usize,
    end: usize,
    wrapper: &Element,
    marker: Option<Node>,
    inside: &F,
) -> bool
where
    F: Fn(&Element) -> bool,
{
    // Descend while a single child holds the whole range
    let mut offset = 0;
    for child in children.iter_mut() {
        let len = child.text_len();
        if offset + len > start {
            if end <= offset + len {
                if let Node::Element(el) = child {
                    return surround_in(
                        &mut el.children,
                        start - offset,
                        end - offset,
                        wrapper,
                        marker,
                        inside,
                    );
                }
            }
            break;
        }
        offset += len;
    }

    // Elements holding a barrier get their own piece; everything else is
    // grouped into runs and split into shells where partially covered
    let mut segments = Vec::new();
    let mut offset = 0;
    for (i, child) in children.iter().enumerate() {
        let len = child.text_len();
        let lo = start.max(offset);
        let hi = end.min(offset + len);
        if lo < hi {
            match child {
                Node::Element(el) if el.count(inside) > 0 => {
                    segments.push(Segment::Into(i, lo - offset, hi - offset))
                }
                _ => match segments.last_mut() {
                    Some(Segment::Run(_, run_end)) if *run_end == lo => *run_end = hi,
                    _ => segments.push(Segment::Run(lo, hi)),
                },
            }
        }
        offset += len;
    }
    if segments.is_empty() {
        return false;
    }

    // Right to left so earlier child indices stay valid
    let mut marker = marker;
    let last = segments.len() - 1;
    for (n, segment) in segments.into_iter().rev().enumerate() {
        let marker = if n == last { marker.take() } else { None };
        let ok = match segment {
            Segment::Into(i, lo, hi) => match &mut children[i] {
                Node::Element(el) => surround_in(&mut el.children, lo, hi, wrapper, marker, inside),
                Node::Text(_) => false,
            },
            Segment::Run(lo, hi) => wrap_run(children, lo, hi, wrapper.clone(), marker),
        };
        if !ok {
            return false;
        }
    }
    true
}

fn wrap_run(
    children: &mut Vec<Node>,
    start: usize,
    end: usize,
    mut wrapper: Element,
    marker: Option<Node>,
) -> bool {
    let Some(first) = split_children(children, start, true) else {
        return false;
    };
    let Some(last) = split_children(children, end, false) else {
        return false;
    };
    if first >= last {
        return false;
    }

    wrapper.children.extend(children.drain(first..last));
    children.insert(first, Node::Element(wrapper));
    if let Some(marker) = marker {
        children.insert(first, marker);
    }
    true
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn text_len(&self) -> usize {
        self.children.iter().map(Node::text_len).sum()
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        self.texts().concat()
    }

    /// Text nodes in document order
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push(text),
                Node::Element(el) => el.collect_texts(out),
            }
        }
    }

    /// Text runs for the location codec
    pub fn text_runs(&self) -> TextRuns {
        TextRuns::from_texts(self.texts())
    }

    /// Move the content of `[start, end)` into `wrapper` and put the wrapper in its place
    ///
    /// Inline elements only partially covered by the range are split so the
    /// wrapped content is one run of siblings. `marker`, if given, is
    /// inserted immediately before the wrapper. Returns `false` and leaves
    /// the tree untouched when the range is empty, out of bounds or ends
    /// inside a surrogate pair.
    pub fn surround(
        &mut self,
        start: usize,
        end: usize,
        wrapper: Element,
        marker: Option<Node>,
    ) -> bool {
        self.surround_nested(start, end, wrapper, marker, &|_: &Element| false)
    }

    /// Like [`Element::surround`], but never splits elements matching `inside`
    ///
    /// Where the range crosses such an element, the wrapper is split instead:
    /// one copy goes inside the element, the rest stays outside. The marker
    /// precedes the first copy.
    pub fn surround_nested<F>(
        &mut self,
        start: usize,
        end: usize,
        wrapper: Element,
        marker: Option<Node>,
        inside: &F,
    ) -> bool
    where
        F: Fn(&Element) -> bool,
    {
        if start >= end || end > self.text_len() {
            return false;
        }
        let mut children = self.children.clone();
        if !surround_in(&mut children, start, end, &wrapper, marker, inside) {
            return false;
        }
        self.children = children;
        true
    }

    /// Replace every matching descendant element with its children
    pub fn unwrap_where<F>(&mut self, pred: &F) -> usize
    where
        F: Fn(&Element) -> bool,
    {
        let mut count = 0;
        for child in std::mem::take(&mut self.children) {
            match child {
                Node::Element(mut el) => {
                    count += el.unwrap_where(pred);
                    if pred(&el) {
                        count += 1;
                        self.children.extend(el.children);
                    } else {
                        self.children.push(Node::Element(el));
                    }
                }
                text => self.children.push(text),
            }
        }
        count
    }

    /// Remove every matching descendant element together with its content
    pub fn remove_where<F>(&mut self, pred: &F) -> usize
    where
        F: Fn(&Element) -> bool,
    {
        let before = self.children.len();
        self.children
            .retain(|child| !matches!(child, Node::Element(el) if pred(el)));
        let mut count = before - self.children.len();
        for child in &mut self.children {
            if let Node::Element(el) = child {
                count += el.remove_where(pred);
            }
        }
        count
    }

    /// Merge adjacent text nodes and drop empty ones
    pub fn normalize(&mut self) {
        for child in std::mem::take(&mut self.children) {
            match child {
                Node::Text(text) if text.is_empty() => {}
                Node::Text(text) => match self.children.last_mut() {
                    Some(Node::Text(prev)) => prev.push_str(&text),
                    _ => self.children.push(Node::Text(text)),
                },
                Node::Element(mut el) => {
                    el.normalize();
                    self.children.push(Node::Element(el));
                }
            }
        }
    }

    /// Find the first descendant element (or self) matching `pred`
    pub fn find<F>(&self, pred: &F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            Node::Element(el) => el.find(pred),
            Node::Text(_) => None,
        })
    }

    /// Count descendant elements (and self) matching `pred`
    pub fn count<F>(&self, pred: &F) -> usize
    where
        F: Fn(&Element) -> bool,
    {
        let own = usize::from(pred(self));
        own + self
            .children
            .iter()
            .map(|child| match child {
                Node::Element(el) => el.count(pred),
                Node::Text(_) => 0,
            })
            .sum::<usize>()
    }

    /// Serialize to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub(crate) fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');
        if is_void(&self.tag) {
            return;
        }
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
                Node::Element(el) => el.write_html(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn element_from(start: &BytesStart<'_>) -> Element {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let attrs = start
        .attributes()
        .with_checks(false)
        .filter_map(Result::ok)
        .map(|attr| {
            let name = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let raw = String::from_utf8_lossy(&attr.value);
            (name, html_escape::decode_html_entities(&raw).into_owned())
        })
        .collect();
    Element {
        tag,
        attrs,
        children: Vec::new(),
    }
}

fn push_child(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Parse a markup fragment into a subtree rooted at a new `tag` element
///
/// Tolerates open void elements (`<br>`), stray end tags and unclosed
/// elements at the end of input. Entities are decoded as HTML.
pub fn parse_fragment(tag: &str, markup: &str) -> Result<Element, MarkupError> {
    let mut reader = Reader::from_str(markup);
    reader.check_end_names(false);

    let mut stack = vec![Element::new(tag)];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let el = element_from(&start);
                if is_void(&el.tag) {
                    push_child(&mut stack, Node::Element(el));
                } else {
                    stack.push(el);
                }
            }
            Ok(Event::Empty(start)) => push_child(&mut stack, Node::Element(element_from(&start))),
            Ok(Event::End(end)) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                if let Some(pos) = stack.iter().rposition(|el| el.tag == name) {
                    // Index 0 is the fragment root and is never closed by markup
                    if pos > 0 {
                        while stack.len() > pos {
                            if let Some(el) = stack.pop() {
                                push_child(&mut stack, Node::Element(el));
                            }
                        }
                    }
                }
            }
            Ok(Event::Text(text)) => {
                let raw = String::from_utf8_lossy(&text);
                let decoded = html_escape::decode_html_entities(&raw);
                if !decoded.is_empty() {
                    push_child(&mut stack, Node::Text(decoded.into_owned()));
                }
            }
            Ok(Event::CData(data)) => {
                push_child(&mut stack, Node::Text(String::from_utf8_lossy(&data).into_owned()));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(MarkupError::Parse {
                    position: reader.buffer_position(),
                    message: e.to_string(),
                })
            }
        }
    }

    while stack.len() > 1 {
        if let Some(el) = stack.pop() {
            push_child(&mut stack, Node::Element(el));
        }
    }

    let mut root = stack.pop().unwrap_or_else(|| Element::new(tag));
    root.normalize();
    Ok(root)
}
