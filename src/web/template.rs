//! `<%=Name%>` placeholder substitution for the HTML templates.

use std::path::Path;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::error::SalesDashboardError;

static LEFTOVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<%=[^%\n]*%>").expect("placeholder pattern is valid"));

/// Read a template from the assets directory.
///
/// # Errors
/// Returns `SalesDashboardError::TemplateError` when the file cannot be read.
pub async fn load(assets_dir: &Path, name: &str) -> Result<String, SalesDashboardError> {
    let path = assets_dir.join(name);
    tokio::fs::read_to_string(&path).await.map_err(|e| {
        SalesDashboardError::TemplateError(format!("reading {}: {e}", path.display()))
    })
}

/// Substitute `values` into `template`.
///
/// `<%=rand%>` receives a random number for cache busting, and placeholders
/// left without a value are removed. Values are inserted verbatim; encode
/// user-supplied text with [`html_encode`] first.
#[must_use]
pub fn render(template: &str, values: &[(&str, String)]) -> String {
    let mut html = template.to_string();
    for (name, value) in values {
        html = html.replace(&format!("<%={name}%>"), value);
    }
    let rand: f64 = rand::thread_rng().r#gen();
    html = html.replace("<%=rand%>", &rand.to_string());
    LEFTOVER.replace_all(&html, "").into_owned()
}

/// Minimal HTML escaping for text placed in element content or attributes.
#[must_use]
pub fn html_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_occurrence() {
        let html = render(
            "<h1><%=Year%></h1><p><%=Year%> vs <%=PrevYear%></p>",
            &[("Year", "2024".into()), ("PrevYear", "2023".into())],
        );
        assert_eq!(html, "<h1>2024</h1><p>2024 vs 2023</p>");
    }

    #[test]
    fn rand_placeholder_becomes_a_number() {
        let html = render(r#"<link href="style.css?v=<%=rand%>">"#, &[]);
        let value = html
            .trim_start_matches(r#"<link href="style.css?v="#)
            .trim_end_matches(r#"">"#);
        assert!(value.parse::<f64>().is_ok(), "got {html}");
    }

    #[test]
    fn unknown_placeholders_are_removed() {
        let html = render("a<%=Missing%>b<%=Other%>c", &[]);
        assert_eq!(html, "abc");
    }

    #[test]
    fn unterminated_placeholder_is_left_alone() {
        assert_eq!(render("a <%= b", &[]), "a <%= b");
    }

    #[test]
    fn encode_escapes_every_special_character() {
        assert_eq!(
            html_encode(r#"<b>Tom & "Jerry's"</b> & <i>"#),
            "&lt;b&gt;Tom &amp; &quot;Jerry&#39;s&quot;&lt;/b&gt; &amp; &lt;i&gt;"
        );
    }

    #[tokio::test]
    async fn load_reports_missing_templates() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path(), "nope.html").await.unwrap_err();
        assert!(matches!(err, SalesDashboardError::TemplateError(_)));
    }
}
