//! Transforms that walk the element tree: serialization, tables,
//! links, metadata, and image enumeration.

use crate::dom::{Document, Element};

/// A transform that found nothing to work on reports why.
pub const NO_TABLE: &str = "No table here";
pub const NO_LINKS: &str = "No links found";
pub const NO_IMAGES: &str = "No suitable images found";

/// Element markup, verbatim.
pub fn outer_html(el: &Element) -> String {
    el.outer_html()
}

/// Markdown-ish rendition: the whitespace-normalized readable text.
pub fn markdown_text(el: &Element) -> String {
    el.inner_text()
}

/// Delimiters supported by the table export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma-separated, every cell wrapped in double quotes.
    Csv,
    /// Tab-separated, cells left bare.
    Tsv,
}

/// Finds the table an element refers to: the element itself, its
/// nearest `<table>` ancestor-equivalent (we only see downward, so the
/// element counts as its own enclosure), or the first descendant.
fn find_table(el: &Element) -> Option<&Element> {
    if el.tag == "table" {
        return Some(el);
    }
    el.find_descendant("table")
}

/// Table → delimited text. Double quotes inside cells are escaped by
/// doubling; CSV additionally wraps every cell in quotes.
pub fn table_export(el: &Element, format: TableFormat) -> Option<String> {
    let table = find_table(el)?;
    let mut rows = Vec::new();
    for tr in table.descendants().into_iter().filter(|e| e.tag == "tr") {
        let cells: Vec<String> = tr
            .child_elements()
            .map(|cell| {
                let content = cell.inner_text().replace('"', "\"\"");
                match format {
                    TableFormat::Csv => format!("\"{}\"", content),
                    TableFormat::Tsv => content,
                }
            })
            .collect();
        let sep = match format {
            TableFormat::Csv => ",",
            TableFormat::Tsv => "\t",
        };
        rows.push(cells.join(sep));
    }
    Some(rows.join("\n"))
}

/// All descendant anchor URLs, deduplicated in document order.
pub fn extract_links(el: &Element) -> Option<String> {
    let mut seen = std::collections::HashSet::new();
    let mut urls = Vec::new();
    for a in el.descendants() {
        if a.tag != "a" {
            continue;
        }
        if let Some(href) = a.attr("href") {
            if seen.insert(href.to_string()) {
                urls.push(href.to_string());
            }
        }
    }
    if urls.is_empty() {
        None
    } else {
        Some(urls.join("\n"))
    }
}

/// Links with their anchor text and title: `text - url (title)`.
pub fn extract_links_enhanced(el: &Element) -> Option<String> {
    let mut seen = std::collections::HashSet::new();
    let mut lines = Vec::new();
    for a in el.descendants() {
        if a.tag != "a" {
            continue;
        }
        let Some(href) = a.attr("href") else {
            continue;
        };
        let text = a.inner_text();
        let title = a.attr("title").unwrap_or("").to_string();
        let key = (href.to_string(), text.clone(), title.clone());
        if !seen.insert(key) {
            continue;
        }
        if title.is_empty() {
            lines.push(format!("{} - {}", text, href));
        } else {
            lines.push(format!("{} - {} ({})", text, href, title));
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Formatted report of page metadata: title, description, keywords,
/// author, canonical URL, Open Graph, and Twitter Card fields.
pub fn meta_report(doc: &Document) -> String {
    let mut out = String::from("# Page Metadata\n\n");
    out.push_str(&format!("**Title:** {}\n", doc.title));
    out.push_str(&format!(
        "**Description:** {}\n",
        doc.meta_content("description")
    ));
    out.push_str(&format!("**Keywords:** {}\n", doc.meta_content("keywords")));
    out.push_str(&format!("**Author:** {}\n", doc.meta_content("author")));
    out.push_str(&format!("**Canonical URL:** {}\n\n", doc.canonical));

    out.push_str("## Open Graph\n\n");
    out.push_str(&format!("**OG Title:** {}\n", doc.meta_content("og:title")));
    out.push_str(&format!(
        "**OG Description:** {}\n",
        doc.meta_content("og:description")
    ));
    out.push_str(&format!("**OG Image:** {}\n", doc.meta_content("og:image")));
    out.push_str(&format!("**OG URL:** {}\n", doc.meta_content("og:url")));
    out.push_str(&format!("**OG Type:** {}\n\n", doc.meta_content("og:type")));

    out.push_str("## Twitter Card\n\n");
    out.push_str(&format!(
        "**Card Type:** {}\n",
        doc.meta_content("twitter:card")
    ));
    out.push_str(&format!(
        "**Title:** {}\n",
        doc.meta_content("twitter:title")
    ));
    out.push_str(&format!(
        "**Description:** {}\n",
        doc.meta_content("twitter:description")
    ));
    out.push_str(&format!(
        "**Image:** {}\n",
        doc.meta_content("twitter:image")
    ));
    out
}

/// One qualifying page image.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub src: String,
    pub alt: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

pub(crate) fn image_extension(src: &str) -> Option<String> {
    let lowered = src.to_lowercase();
    let path = lowered.split(['?', '#']).next().unwrap_or("");
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(_, ext)| ext.to_string())
}

/// Enumerates `<img>` elements meeting the minimum dimensions whose
/// source extension is on the allow-list.
pub fn page_images(
    doc: &Document,
    min_width: u32,
    min_height: u32,
    extensions: &[String],
) -> Vec<PageImage> {
    let mut images = Vec::new();
    let mut all = vec![&doc.root];
    all.extend(doc.root.descendants());
    for el in all {
        if el.tag != "img" {
            continue;
        }
        let Some(src) = el.attr("src") else { continue };
        let Some(ext) = image_extension(src) else {
            continue;
        };
        if !extensions.iter().any(|allowed| *allowed == ext) {
            continue;
        }
        let width = el.rect.width.round() as u32;
        let height = el.rect.height.round() as u32;
        if width < min_width || height < min_height {
            continue;
        }
        images.push(PageImage {
            src: src.to_string(),
            alt: el.attr("alt").unwrap_or("").to_string(),
            title: el.attr("title").unwrap_or("").to_string(),
            width,
            height,
        });
    }
    images
}

/// Formats the image enumeration for the clipboard.
pub fn format_images(images: &[PageImage]) -> String {
    images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            let name = if !img.title.is_empty() {
                img.title.clone()
            } else if !img.alt.is_empty() {
                img.alt.clone()
            } else {
                format!("Image {}", i + 1)
            };
            format!("{} ({}x{})\n{}", name, img.width, img.height, img.src)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MetaTag, Node, Rect};
    use std::collections::BTreeMap;

    fn text(s: &str) -> Node {
        Node::Text {
            text: s.to_string(),
        }
    }

    fn el_with(tag: &str, attrs: &[(&str, &str)], children: Vec<Node>) -> Element {
        Element {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            rect: Rect::default(),
            children,
        }
    }

    fn el(tag: &str, children: Vec<Node>) -> Element {
        el_with(tag, &[], children)
    }

    fn cell(txt: &str) -> Node {
        Node::Element(el("td", vec![text(txt)]))
    }

    #[test]
    fn csv_quotes_every_cell_and_doubles_quotes() {
        let table = el(
            "table",
            vec![
                Node::Element(el("tr", vec![cell("plain"), cell("say \"hi\"")])),
                Node::Element(el("tr", vec![cell("2nd")])),
            ],
        );
        let wrapper = el("div", vec![Node::Element(table)]);
        let csv = table_export(&wrapper, TableFormat::Csv).unwrap();
        assert_eq!(csv, "\"plain\",\"say \"\"hi\"\"\"\n\"2nd\"");
    }

    #[test]
    fn tsv_uses_tabs_without_quoting() {
        let table = el(
            "table",
            vec![Node::Element(el("tr", vec![cell("a"), cell("b")]))],
        );
        let tsv = table_export(&table, TableFormat::Tsv).unwrap();
        assert_eq!(tsv, "a\tb");
    }

    #[test]
    fn no_table_yields_none() {
        let div = el("div", vec![text("just text")]);
        assert!(table_export(&div, TableFormat::Csv).is_none());
    }

    #[test]
    fn links_deduplicate_by_url() {
        let root = el(
            "div",
            vec![
                Node::Element(el_with("a", &[("href", "https://a.test")], vec![text("A")])),
                Node::Element(el_with("a", &[("href", "https://a.test")], vec![text("A2")])),
                Node::Element(el_with("a", &[("href", "https://b.test")], vec![text("B")])),
            ],
        );
        assert_eq!(
            extract_links(&root).unwrap(),
            "https://a.test\nhttps://b.test"
        );
    }

    #[test]
    fn no_links_yields_none() {
        assert!(extract_links(&el("div", vec![text("nothing")])).is_none());
    }

    #[test]
    fn enhanced_links_include_text_and_title() {
        let root = el(
            "div",
            vec![Node::Element(el_with(
                "a",
                &[("href", "https://a.test"), ("title", "The A")],
                vec![text("Go")],
            ))],
        );
        assert_eq!(
            extract_links_enhanced(&root).unwrap(),
            "Go - https://a.test (The A)"
        );
    }

    #[test]
    fn meta_report_includes_og_fields() {
        let doc = Document {
            url: "https://example.com".to_string(),
            title: "Page".to_string(),
            meta: vec![MetaTag {
                name: "og:title".to_string(),
                content: "OG Page".to_string(),
            }],
            canonical: "https://example.com/c".to_string(),
            root: el("body", vec![]),
        };
        let report = meta_report(&doc);
        assert!(report.contains("**Title:** Page"));
        assert!(report.contains("**OG Title:** OG Page"));
        assert!(report.contains("**Canonical URL:** https://example.com/c"));
    }

    #[test]
    fn image_filter_applies_dimensions_and_extensions() {
        let mut big = el_with("img", &[("src", "https://x.test/pic.png?v=2")], vec![]);
        big.rect = Rect::new(0.0, 0.0, 300.0, 300.0);
        let mut small = el_with("img", &[("src", "https://x.test/small.png")], vec![]);
        small.rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let mut gif = el_with("img", &[("src", "https://x.test/anim.gif")], vec![]);
        gif.rect = Rect::new(0.0, 0.0, 300.0, 300.0);
        let doc = Document {
            url: String::new(),
            title: String::new(),
            meta: vec![],
            canonical: String::new(),
            root: el(
                "body",
                vec![Node::Element(big), Node::Element(small), Node::Element(gif)],
            ),
        };
        let found = page_images(&doc, 256, 256, &["png".to_string(), "jpg".to_string()]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].src, "https://x.test/pic.png?v=2");
        assert_eq!(found[0].width, 300);
    }
}
