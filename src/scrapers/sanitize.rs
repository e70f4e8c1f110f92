use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Formatting tags that survive sanitization
const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "em", "i", "li", "ol", "p", "strong", "u", "ul",
];

/// Subtrees removed outright, content included
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "noscript", "object", "embed", "form", "input", "button", "link",
    "meta",
];

/// Tags with no closing counterpart
const VOID_TAGS: &[&str] = &["br"];

/// Reduce uploaded listing markup to a safe formatting subset.
/// Allowed tags keep their safe attributes, unknown tags are unwrapped to
/// their children, script-like subtrees are removed, and text is re-escaped.
pub fn sanitize(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for child in fragment.root_element().children() {
        write_node(child, &mut out);
    }

    out.trim().to_string()
}

fn write_node(node: NodeRef<Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&escape(&text.text)),
        Node::Element(element) => {
            let name = element.name();

            if DROPPED_TAGS.contains(&name) {
                return;
            }

            if !ALLOWED_TAGS.contains(&name) {
                // Unwrap the tag but keep whatever it contains
                for child in node.children() {
                    write_node(child, out);
                }
                return;
            }

            out.push('<');
            out.push_str(name);
            for (attr, value) in element.attrs() {
                if attr_allowed(name, attr, value) {
                    out.push(' ');
                    out.push_str(attr);
                    out.push_str("=\"");
                    out.push_str(&escape(value));
                    out.push('"');
                }
            }

            if VOID_TAGS.contains(&name) {
                out.push_str(" />");
                return;
            }
            out.push('>');

            for child in node.children() {
                write_node(child, out);
            }

            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        _ => {}
    }
}

/// Links may keep their target as long as it is not a script URL;
/// everything else (style, event handlers, ids) is stripped.
fn attr_allowed(tag: &str, attr: &str, value: &str) -> bool {
    match (tag, attr) {
        ("a", "href") => {
            let scheme = value
                .split(':')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();
            !value.contains(':')
                || scheme == "http"
                || scheme == "https"
                || scheme == "mailto"
        }
        ("a", "title") => true,
        _ => false,
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
