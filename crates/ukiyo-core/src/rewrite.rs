//! Content URL rewriting.
//!
//! Upstream bodies reference CDN hostnames the caller cannot reach directly.
//! [`ContentRewriter`] swaps each configured hostname for a proxy prefix,
//! covering both raw JSON bodies (where `/` is escaped as `\/`) and plain
//! HTML or text fragments.

use std::collections::HashMap;

use ukiyo_types::models::RewriteConfig;

/// A resolved set of hostname substitutions for one caller.
///
/// Built per request from operator defaults plus the caller's overrides,
/// then applied to any number of bodies. Idempotent: rewritten content no
/// longer contains the source hostnames, so a second pass is a no-op.
#[derive(Debug, Clone)]
pub struct ContentRewriter {
    /// Pattern and replacement pairs, escaped and literal form per hostname.
    replacements: Vec<(Vec<u8>, Vec<u8>)>,
}

impl ContentRewriter {
    /// Resolve substitutions from operator defaults and per-caller
    /// overrides. An override replaces the proxy prefix for its hostname;
    /// hostnames without an override keep the configured default.
    pub fn resolve(defaults: &RewriteConfig, overrides: &HashMap<String, String>) -> Self {
        let mut replacements = Vec::with_capacity(defaults.proxies.len() * 2);

        for (host, default_prefix) in &defaults.proxies {
            let prefix = overrides.get(host).unwrap_or(default_prefix);

            let escaped_pattern = format!("https:\\/\\/{host}");
            let escaped_prefix = prefix.replace('/', "\\/");
            replacements.push((escaped_pattern.into_bytes(), escaped_prefix.into_bytes()));

            let literal_pattern = format!("https://{host}");
            replacements.push((literal_pattern.into_bytes(), prefix.clone().into_bytes()));
        }

        Self { replacements }
    }

    /// Resolve with no caller overrides.
    pub fn from_defaults(defaults: &RewriteConfig) -> Self {
        Self::resolve(defaults, &HashMap::new())
    }

    /// Apply every substitution to `data`, returning the rewritten buffer.
    pub fn rewrite(&self, data: &[u8]) -> Vec<u8> {
        let mut result = data.to_vec();
        for (pattern, replacement) in &self.replacements {
            result = replace_all(&result, pattern, replacement);
        }
        result
    }
}

/// Replace every non-overlapping occurrence of `pattern` in `data`.
fn replace_all(data: &[u8], pattern: &[u8], replacement: &[u8]) -> Vec<u8> {
    if pattern.is_empty() || data.len() < pattern.len() {
        return data.to_vec();
    }

    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i..].starts_with(pattern) {
            out.extend_from_slice(replacement);
            i += pattern.len();
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RewriteConfig {
        RewriteConfig {
            proxies: HashMap::from([(
                "i.pximg.net".to_string(),
                "/proxy/i.pximg.net".to_string(),
            )]),
        }
    }

    #[test]
    fn test_rewrites_escaped_json_form() {
        let rewriter = ContentRewriter::from_defaults(&config());
        let body = br#"{"url":"https:\/\/i.pximg.net\/img\/1.jpg"}"#;

        let rewritten = rewriter.rewrite(body);

        assert_eq!(
            rewritten,
            br#"{"url":"\/proxy\/i.pximg.net\/img\/1.jpg"}"#.to_vec()
        );
    }

    #[test]
    fn test_rewrites_literal_form() {
        let rewriter = ContentRewriter::from_defaults(&config());
        let body = b"<img src=\"https://i.pximg.net/img/1.jpg\">";

        let rewritten = rewriter.rewrite(body);

        assert_eq!(rewritten, b"<img src=\"/proxy/i.pximg.net/img/1.jpg\">".to_vec());
    }

    #[test]
    fn test_idempotent() {
        let rewriter = ContentRewriter::from_defaults(&config());
        let body = br#"{"url":"https:\/\/i.pximg.net\/img\/1.jpg"} https://i.pximg.net/a"#;

        let once = rewriter.rewrite(body);
        let twice = rewriter.rewrite(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_caller_override_wins() {
        let overrides = HashMap::from([(
            "i.pximg.net".to_string(),
            "https://mirror.example".to_string(),
        )]);
        let rewriter = ContentRewriter::resolve(&config(), &overrides);

        let rewritten = rewriter.rewrite(b"https://i.pximg.net/img/1.jpg");
        assert_eq!(rewritten, b"https://mirror.example/img/1.jpg".to_vec());

        // The escaped form picks up the override with escaped separators.
        let escaped = rewriter.rewrite(br"https:\/\/i.pximg.net\/img\/1.jpg");
        assert_eq!(escaped, br"https:\/\/mirror.example\/img\/1.jpg".to_vec());
    }

    #[test]
    fn test_unrelated_content_untouched() {
        let rewriter = ContentRewriter::from_defaults(&config());
        let body = b"https://other.example/img/1.jpg \xff\xfe binary tail";

        assert_eq!(rewriter.rewrite(body), body.to_vec());
    }

    #[test]
    fn test_default_config_covers_both_cdn_hosts() {
        let rewriter = ContentRewriter::from_defaults(&RewriteConfig::default());
        let body = b"https://i.pximg.net/a https://s.pximg.net/b";

        let rewritten = rewriter.rewrite(body);

        assert_eq!(
            rewritten,
            b"/proxy/i.pximg.net/a /proxy/s.pximg.net/b".to_vec()
        );
    }
}
