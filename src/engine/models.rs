use serde::{Deserialize, Serialize};

/// One selectable model from `ollama list`.
///
/// A list record carries trailing metadata columns (digest, size,
/// modification date) separated by whitespace; only the first token is the
/// identifier the engine accepts on its command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub identifier: String,
    pub display: String,
}

impl ModelEntry {
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut tokens = trimmed.split_whitespace();
        let identifier = tokens.next()?.to_string();
        // Columns are NAME ID SIZE MODIFIED; the size is the third token.
        let display = match tokens.nth(1) {
            Some(size) => format!("{identifier} ({size})"),
            None => identifier.clone(),
        };

        Some(Self {
            identifier,
            display,
        })
    }
}

/// Parse raw `ollama list` output: the first line is a header row and is
/// dropped; every remaining non-blank line is one model record.
pub fn parse_model_list(raw: &str) -> Vec<ModelEntry> {
    raw.lines().skip(1).filter_map(ModelEntry::parse).collect()
}

/// The engine-recognized identifier of a model selector string: its first
/// whitespace-delimited token.
pub fn model_identifier(selector: &str) -> &str {
    selector.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_entry_extracts_identifier_and_size() {
        let entry = ModelEntry::parse("llama3:8b  a1b2c3  4.7GB  2 days ago").expect("entry");
        assert_eq!(entry.identifier, "llama3:8b");
        assert_eq!(entry.display, "llama3:8b (4.7GB)");
    }

    #[test]
    fn test_model_entry_without_size_column_falls_back_to_identifier() {
        let entry = ModelEntry::parse("  llama3:8b  ").expect("entry");
        assert_eq!(entry.identifier, "llama3:8b");
        assert_eq!(entry.display, "llama3:8b");
    }

    #[test]
    fn test_parse_model_list_drops_header_and_blank_lines() {
        let raw = "NAME SIZE MODIFIED\nllama3:8b a1b2c3 4.7GB 2 days ago\n\n";
        let entries = parse_model_list(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].identifier, "llama3:8b");
    }

    #[test]
    fn test_model_identifier_takes_first_token() {
        assert_eq!(model_identifier("llama3:8b (4.7GB)"), "llama3:8b");
        assert_eq!(model_identifier("  qwen:0.5b"), "qwen:0.5b");
        assert_eq!(model_identifier("   "), "");
    }
}
