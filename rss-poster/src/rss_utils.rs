/// Utility functions shared by the feed, composer and publisher stages

/// URL utilities for feed endpoints
pub mod url {
    use url::Url;

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
            Err(_) => false,
        }
    }
}

/// Feed text utilities
pub mod feed {
    /// Tags that end a paragraph.
    const BLOCK_TAGS: &[&str] = &[
        "p", "br", "div", "li", "ul", "ol", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "table",
    ];

    /// Extract clean text content from HTML.
    ///
    /// Whitespace inside a paragraph collapses to single spaces. Paragraphs,
    /// whether marked by block tags or by blank lines, come out separated by
    /// one empty line.
    pub fn extract_text_from_html(html: &str) -> String {
        // Simple tag removal; entities are left as they are
        let (text, _, _) = html.chars().fold(
            (String::new(), false, String::new()),
            |(mut text, in_tag, mut tag), c| match c {
                '<' => (text, true, String::new()),
                '>' if in_tag => {
                    // keep words on both sides of a tag apart
                    text.push_str(if is_block_tag(&tag) { "\n\n" } else { " " });
                    (text, false, tag)
                }
                _ if in_tag => {
                    tag.push(c);
                    (text, in_tag, tag)
                }
                _ => {
                    text.push(c);
                    (text, in_tag, tag)
                }
            },
        );

        paragraphs(&text).join("\n\n")
    }

    fn is_block_tag(tag: &str) -> bool {
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        BLOCK_TAGS.contains(&name.as_str())
    }

    /// Groups of non-blank lines, each collapsed to one line.
    fn paragraphs(text: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in text.lines().chain(std::iter::once("")) {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    result.push(current.iter().flat_map(|l| l.split_whitespace()).collect::<Vec<_>>().join(" "));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }

        result
    }
}

/// Length-limited text handling. Lengths are counted in characters, not bytes.
pub mod text {
    pub const TRUNCATION_MARKER: &str = "...";

    pub fn char_len(text: &str) -> usize {
        text.chars().count()
    }

    /// Cut `text` so that it fits in `max_chars`, ending with the truncation marker.
    pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
        if char_len(text) <= max_chars {
            return text.to_string();
        }

        let marker_len = char_len(TRUNCATION_MARKER);
        let keep = max_chars.saturating_sub(marker_len);
        let mut truncated: String = text.chars().take(keep).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    }

    /// Greedy word-boundary splitter.
    ///
    /// Each chunk holds at most `max_chars` characters. A chunk ends at the
    /// last space that still fits; a word longer than the limit is cut hard
    /// at the limit.
    pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
        let mut chunks = Vec::new();
        if max_chars == 0 {
            return chunks;
        }

        let mut rest: Vec<char> = text.trim().chars().collect();
        while !rest.is_empty() {
            if rest.len() <= max_chars {
                chunks.push(rest.iter().collect());
                break;
            }

            // A space right after the limit still counts as a boundary
            let split_at = rest[..=max_chars]
                .iter()
                .rposition(|c| *c == ' ')
                .filter(|&idx| idx > 0)
                .unwrap_or(max_chars);

            let chunk: String = rest[..split_at].iter().collect();
            let chunk = chunk.trim_end().to_string();
            if !chunk.is_empty() {
                chunks.push(chunk);
            }

            let remainder: String = rest[split_at..].iter().collect();
            rest = remainder.trim_start().chars().collect();
        }

        chunks
    }
}
