//! Shared test fixtures

#[cfg(feature = "mupdf")]
use std::path::{Path, PathBuf};

/// A single US-Letter page (612x792pt) with a blue 100pt square at (72, 72)
pub fn letter_pdf_bytes() -> Vec<u8> {
    let content = "0 0 1 rg 72 72 100 100 re f\n";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));

    pdf.into_bytes()
}

/// Write [`letter_pdf_bytes`] to `dir/name`
#[cfg(feature = "mupdf")]
pub fn write_letter_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, letter_pdf_bytes()).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_xref_points_at_objects() {
        let pdf = String::from_utf8(letter_pdf_bytes()).unwrap();
        let start: usize = pdf
            .lines()
            .rev()
            .nth(1)
            .and_then(|l| l.parse().ok())
            .unwrap();
        assert!(pdf[start..].starts_with("xref"));
        let first = pdf.find("1 0 obj").unwrap();
        assert!(pdf.contains(&format!("{:010} 00000 n", first)));
    }
}
