//! Thumbnail HTML fragment

use html_escape::encode_double_quoted_attribute as attr;

/// A linked thumbnail image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Where clicking the thumbnail leads
    pub link: String,
    pub target: String,
    /// `<img src>`: a cache URL or a data URI
    pub src: String,
    pub style: String,
}

impl Thumbnail {
    /// `<a href target><img src style></a>` with every attribute escaped
    pub fn to_html(&self) -> String {
        format!(
            r#"<a href="{}" target="{}"><img src="{}" style="{}"></a>"#,
            attr(&self.link),
            attr(&self.target),
            attr(&self.src),
            attr(&self.style)
        )
    }
}
