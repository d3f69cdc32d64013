use scraper::{Html, Node};

use super::FetchError;

/// Converts a raw response body into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, body: &[u8]) -> Result<String, FetchError>;
}

/// Extracts every text node of an HTML document, in document order.
///
/// Each fragment is trimmed and written on its own line; fragments that are
/// only whitespace are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlTextExtractor;

impl TextExtractor for HtmlTextExtractor {
    fn extract(&self, body: &[u8]) -> Result<String, FetchError> {
        let source = String::from_utf8_lossy(body);
        let doc = Html::parse_document(&source);

        let mut text = String::with_capacity(source.len() / 2);
        for node in doc.tree.root().descendants() {
            if let Node::Text(fragment) = node.value() {
                let trimmed = fragment.trim();
                if !trimmed.is_empty() {
                    text.push_str(trimmed);
                    text.push('\n');
                }
            }
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_fragments_in_document_order() {
        let html = br#"<html><head><title> Title </title></head>
            <body><h1>Heading</h1><p>First   para</p>
            <div>  <span>nested</span> tail </div></body></html>"#;
        let text = HtmlTextExtractor.extract(html).unwrap();
        assert_eq!(text, "Title\nHeading\nFirst   para\nnested\ntail\n");
    }

    #[test]
    fn test_skips_whitespace_only_fragments() {
        let html = b"<p>   </p><p>\n\t</p><p>word</p>";
        let text = HtmlTextExtractor.extract(html).unwrap();
        assert_eq!(text, "word\n");
    }

    #[test]
    fn test_empty_document_yields_empty_text() {
        assert_eq!(HtmlTextExtractor.extract(b"").unwrap(), "");
    }

    #[test]
    fn test_plain_text_body_is_one_fragment() {
        let text = HtmlTextExtractor.extract(b"  alpha beta  ").unwrap();
        assert_eq!(text, "alpha beta\n");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let text = HtmlTextExtractor.extract(b"<p>ok \xff done</p>").unwrap();
        assert!(text.starts_with("ok "));
        assert!(text.trim_end().ends_with("done"));
    }
}
