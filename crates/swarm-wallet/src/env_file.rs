//! Structured `.env` editing.
//!
//! Lines that are not `KEY=VALUE` (comments, blank lines, junk) are kept
//! verbatim, and entries that are never touched are written back exactly as
//! read.

use std::path::Path;

use swarm_types::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry {
        key: String,
        value: String,
        /// Original text, dropped once the value changes.
        raw: Option<String>,
    },
    Other(String),
}

/// An in-memory `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<Line>,
}

impl EnvFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Self {
        let lines = content.lines().map(parse_line).collect();
        Self { lines }
    }

    /// Read `path`; a missing file yields an empty `EnvFile`.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }

    /// Value of the first entry named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Replace the value of `key` in place, or append it.
    pub fn set(&mut self, key: &str, value: &str) {
        for line in &mut self.lines {
            if let Line::Entry {
                key: k,
                value: v,
                raw,
            } = line
            {
                if k.as_str() == key {
                    if v.as_str() != value {
                        *v = value.to_string();
                        *raw = None;
                    }
                    return;
                }
            }
        }
        self.lines.push(Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
            raw: None,
        });
    }

    /// All entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, value, .. } => Some((key.as_str(), value.as_str())),
            Line::Other(_) => None,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { raw: Some(raw), .. } | Line::Other(raw) => out.push_str(raw),
                Line::Entry {
                    key,
                    value,
                    raw: None,
                } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(&quote_if_needed(value));
                }
            }
            out.push('\n');
        }
        out
    }
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Other(raw.to_string());
    }
    let body = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let Some((key, value)) = body.split_once('=') else {
        return Line::Other(raw.to_string());
    };
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Line::Other(raw.to_string());
    }
    Line::Entry {
        key: key.to_string(),
        value: parse_value(value.trim()),
        raw: Some(raw.to_string()),
    }
}

fn parse_value(value: &str) -> String {
    if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        return inner.replace("\\\"", "\"").replace("\\\\", "\\");
    }
    if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
        return inner.to_string();
    }
    // Unquoted: ` #` starts a trailing comment.
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| c.is_whitespace() || c == '#' || c == '"' || c == '\'');
    if !needs_quotes {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "# LLM settings\nOPENAI_API_KEY=sk-test\n\nexport SWARM_MODEL=\"gpt-4o\"\nSOLANA_RPC_URL=https://api.devnet.solana.com # devnet\n";

    #[test]
    fn parses_plain_quoted_and_exported_values() {
        let env = EnvFile::parse(SAMPLE);
        assert_eq!(env.get("OPENAI_API_KEY"), Some("sk-test"));
        assert_eq!(env.get("SWARM_MODEL"), Some("gpt-4o"));
        assert_eq!(env.get("SOLANA_RPC_URL"), Some("https://api.devnet.solana.com"));
        assert_eq!(env.get("MISSING"), None);
        assert_eq!(env.entries().count(), 3);
    }

    #[test]
    fn untouched_file_renders_identically() {
        assert_eq!(EnvFile::parse(SAMPLE).render(), SAMPLE);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut env = EnvFile::parse(SAMPLE);
        env.set("OPENAI_API_KEY", "sk-new");
        let rendered = env.render();
        assert!(rendered.starts_with("# LLM settings\nOPENAI_API_KEY=sk-new\n"));
        assert_eq!(rendered.matches("OPENAI_API_KEY").count(), 1);
    }

    #[test]
    fn repeated_set_never_duplicates() {
        let mut env = EnvFile::parse(SAMPLE);
        for value in ["a", "b", "c"] {
            env.set("WALLET_PUBLIC_KEY", value);
        }
        let rendered = env.render();
        assert_eq!(rendered.matches("WALLET_PUBLIC_KEY=").count(), 1);
        assert!(rendered.ends_with("WALLET_PUBLIC_KEY=c\n"));
    }

    #[test]
    fn values_with_spaces_or_hash_are_quoted() {
        let mut env = EnvFile::new();
        env.set("A", "two words");
        env.set("B", "x#y");
        env.set("C", "say \"hi\"");
        let rendered = env.render();
        assert_eq!(rendered, "A=\"two words\"\nB=\"x#y\"\nC=\"say \\\"hi\\\"\"\n");

        let reparsed = EnvFile::parse(&rendered);
        assert_eq!(reparsed.get("A"), Some("two words"));
        assert_eq!(reparsed.get("B"), Some("x#y"));
        assert_eq!(reparsed.get("C"), Some("say \"hi\""));
    }

    #[test]
    fn junk_lines_are_kept() {
        let env = EnvFile::parse("not an assignment\n=novalue\n");
        assert_eq!(env.entries().count(), 0);
        assert_eq!(env.render(), "not an assignment\n=novalue\n");
    }

    #[tokio::test]
    async fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let env = EnvFile::load(&dir.path().join(".env")).await.unwrap();
        assert_eq!(env, EnvFile::new());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        let mut env = EnvFile::parse(SAMPLE);
        env.set("WALLET_PUBLIC_KEY", "4zvwRjXUKGfvwnParsHAS3HuSVzV5cA4McphgmoCtajS");
        env.save(&path).await.unwrap();

        let loaded = EnvFile::load(&path).await.unwrap();
        assert_eq!(
            loaded.get("WALLET_PUBLIC_KEY"),
            Some("4zvwRjXUKGfvwnParsHAS3HuSVzV5cA4McphgmoCtajS")
        );
        assert_eq!(loaded.get("OPENAI_API_KEY"), Some("sk-test"));
    }
}
