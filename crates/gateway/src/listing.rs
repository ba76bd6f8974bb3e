// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{GatewayError, Result};
use crate::path::RequestPath;
use remotefs::{RemoteNode, RemoteTree, Session};
use std::fmt::Write;

/// Escapes the characters that are significant in HTML text and attributes
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the listing document for a folder's children.
///
/// Entries are sorted by name so the output does not depend on the order a
/// backend happens to return. Folder names carry a trailing `/` in both the
/// link and the label.
#[must_use]
pub fn render(path: &RequestPath, is_root: bool, children: &[RemoteNode]) -> String {
    let mut sorted: Vec<&RemoteNode> = children.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut doc = String::from("<html><body>");
    let _ = write!(doc, "<h1>{}</h1>", escape_html(path.as_str()));
    doc.push_str("<ul>");
    if !is_root {
        doc.push_str("<li><a href=\"..\">..</a>");
    }
    for child in sorted {
        let name = escape_html(&child.name);
        let suffix = if child.is_folder() { "/" } else { "" };
        let _ = write!(doc, "<li><a href=\"{name}{suffix}\">{name}{suffix}</a>");
    }
    doc.push_str("</ul></body></html>");
    doc
}

/// Lists a folder node through the session and renders it
pub async fn render_folder(session: &Session, node: &RemoteNode, path: &RequestPath) -> Result<String> {
    let children = {
        let tree = session.lock().await;
        tree.children(node).await.map_err(GatewayError::Remote)?
    };
    Ok(render(path, node.is_root(), &children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use remotefs::{MemoryTree, NodeId, RemoteTree};

    fn path(p: &str) -> RequestPath {
        RequestPath::parse(p).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&#34;x&#34;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_render_root() {
        let children = vec![
            RemoteNode::file(NodeId::new("2"), "b.txt", 1, None),
            RemoteNode::folder(NodeId::new("1"), "a"),
        ];
        let doc = render(&path("/"), true, &children);
        assert_eq!(
            doc,
            "<html><body><h1>/</h1><ul>\
             <li><a href=\"a/\">a/</a>\
             <li><a href=\"b.txt\">b.txt</a>\
             </ul></body></html>"
        );
    }

    #[test]
    fn test_render_nested_has_parent_entry() {
        let doc = render(&path("/a/b/"), false, &[]);
        assert_eq!(
            doc,
            "<html><body><h1>/a/b/</h1><ul><li><a href=\"..\">..</a></ul></body></html>"
        );
    }

    #[test]
    fn test_render_escapes_names_and_heading() {
        let children = vec![RemoteNode::file(
            NodeId::new("1"),
            "<script>alert('x')</script>",
            0,
            None,
        )];
        let doc = render(&path("/q&a/"), false, &children);
        assert!(doc.starts_with("<html><body><h1>/q&amp;a/</h1><ul>"));
        assert!(!doc.contains("<script>"));
        assert!(doc.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[tokio::test]
    async fn test_render_folder_through_session() {
        let mut tree = MemoryTree::new();
        let _ = tree.insert_file("/docs/one.txt", b"1").unwrap();
        let _ = tree.insert_file("/docs/sub/two.txt", b"2").unwrap();
        let root = tree.root();
        let docs = tree.child(&root, "docs").await.unwrap().unwrap();
        let session = Session::new(tree);

        let doc = render_folder(&session, &docs, &path("/docs/")).await.unwrap();
        assert!(doc.contains("<li><a href=\"..\">..</a>"));
        assert!(doc.contains("<li><a href=\"one.txt\">one.txt</a>"));
        assert!(doc.contains("<li><a href=\"sub/\">sub/</a>"));
    }

    #[tokio::test]
    async fn test_render_folder_on_file_fails() {
        let mut tree = MemoryTree::new();
        let file = tree.insert_file("/f", b"1").unwrap();
        let session = Session::new(tree);
        assert!(render_folder(&session, &file, &path("/f")).await.is_err());
    }
}
