//! HTML reduction to readable text.
//!
//! A deliberately small, regex-based reduction: strip chrome and noise,
//! prefer the main content container, flatten the rest to plain text.

use regex::Regex;
use std::sync::OnceLock;

fn noise_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?is)<script[^>]*>.*?</script>",
            r"(?is)<style[^>]*>.*?</style>",
            r"(?is)<nav[^>]*>.*?</nav>",
            r"(?is)<footer[^>]*>.*?</footer>",
            r"(?is)<iframe[^>]*>.*?</iframe>",
            r"(?is)<noscript[^>]*>.*?</noscript>",
            r"(?is)<svg[^>]*>.*?</svg>",
            r#"(?is)<[a-z]+[^>]*class="[^"]*(?:\bad\b|cookie-banner)[^"]*"[^>]*>.*?</[a-z]+>"#,
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

fn container_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?is)<main[^>]*>(.*)</main>",
            r"(?is)<article[^>]*>(.*)</article>",
            r#"(?is)<div[^>]*class="[^"]*post-content[^"]*"[^>]*>(.*)</div>"#,
            r"(?is)<body[^>]*>(.*)</body>",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Reduce an HTML document to readable plain text.
///
/// Strips script/style/nav/footer/iframe/noscript/svg blocks and common
/// ad/cookie-banner markup, then takes `<main>`, `<article>`, or a
/// `post-content` container when present, falling back to `<body>` and
/// finally the whole document. Whitespace is collapsed.
pub fn reduce(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let mut text = html.to_string();
    for pattern in noise_patterns() {
        text = pattern.replace_all(&text, "").to_string();
    }

    let container = select_container(&text);

    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").unwrap());
    let stripped = tag.replace_all(&container, " ");

    let decoded = decode_entities(&stripped);

    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap());
    whitespace.replace_all(&decoded, " ").trim().to_string()
}

/// Pick the most content-dense container available.
fn select_container(html: &str) -> String {
    for pattern in container_patterns() {
        if let Some(cap) = pattern.captures(html) {
            if let Some(inner) = cap.get(1) {
                return inner.as_str().to_string();
            }
        }
    }
    html.to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Truncate to a maximum number of bytes without splitting a character.
pub fn truncate_chars(mut text: String, max_len: usize) -> String {
    if text.len() > max_len {
        let mut end = max_len;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script_and_style() {
        let html = r#"
            <html><body>
            <script>alert("x");</script>
            <style>.a { color: red; }</style>
            <p>Visible text here.</p>
            </body></html>
        "#;

        let text = reduce(html);
        assert!(text.contains("Visible text here."));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_prefers_main_over_body() {
        let html = r#"
            <body>
            <div>Sidebar junk</div>
            <main><p>The actual article.</p></main>
            </body>
        "#;

        let text = reduce(html);
        assert!(text.contains("The actual article."));
        assert!(!text.contains("Sidebar junk"));
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<body><p>Only body content.</p></body>";
        assert_eq!(reduce(html), "Only body content.");
    }

    #[test]
    fn test_strips_nav_and_footer() {
        let html = r#"
            <body>
            <nav>Home | About</nav>
            <p>Article text.</p>
            <footer>Copyright.</footer>
            </body>
        "#;

        let text = reduce(html);
        assert!(text.contains("Article text."));
        assert!(!text.contains("Home | About"));
        assert!(!text.contains("Copyright."));
    }

    #[test]
    fn test_decodes_entities() {
        let html = "<body><p>Fish &amp; chips &gt; salad</p></body>";
        assert_eq!(reduce(html), "Fish & chips > salad");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "héllo wörld".to_string();
        let truncated = truncate_chars(text, 3);
        // 'é' spans bytes 1..3; cutting at 3 lands on a boundary
        assert_eq!(truncated, "hé");

        let short = truncate_chars("abc".to_string(), 10);
        assert_eq!(short, "abc");
    }
}
