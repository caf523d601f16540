//! Language name to source-file extension mapping.
//!
//! Used both to locate fixture files beside a rule and to name the sample
//! file handed to the engine, which infers nothing from content.

/// Extensions per language, most common first. The empty extension under
/// `generic` matches fixtures named exactly like the rule stem.
const LANGUAGE_EXTENSIONS: &[(&str, &[&str])] = &[
    ("bash", &[".sh", ".bash"]),
    ("c", &[".c", ".h"]),
    ("cpp", &[".cpp", ".cc", ".cxx", ".h", ".hpp"]),
    ("csharp", &[".cs"]),
    ("generic", &[".txt", ""]),
    ("go", &[".go"]),
    ("hcl", &[".tf"]),
    ("html", &[".html", ".htm"]),
    ("java", &[".java"]),
    ("javascript", &[".js", ".ts", ".jsx", ".tsx"]),
    ("json", &[".json"]),
    ("kotlin", &[".kt"]),
    ("php", &[".php"]),
    ("python", &[".py"]),
    ("ruby", &[".rb"]),
    ("rust", &[".rs"]),
    ("typescript", &[".ts", ".tsx"]),
    ("yaml", &[".yaml", ".yml"]),
];

const FALLBACK_SAMPLE_EXTENSION: &str = ".txt";

/// Known extensions for `language` (case-insensitive); empty if unknown.
pub fn extensions_for(language: &str) -> &'static [&'static str] {
    LANGUAGE_EXTENSIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(language))
        .map(|(_, exts)| *exts)
        .unwrap_or(&[])
}

/// Extension for a sample file of `language`, including the leading dot.
pub fn sample_extension(language: &str) -> &'static str {
    extensions_for(language)
        .iter()
        .copied()
        .find(|ext| !ext.is_empty())
        .unwrap_or(FALLBACK_SAMPLE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_extension_uses_first_entry() {
        assert_eq!(sample_extension("python"), ".py");
        assert_eq!(sample_extension("JavaScript"), ".js");
        assert_eq!(sample_extension("hcl"), ".tf");
    }

    #[test]
    fn unknown_language_falls_back_to_txt() {
        assert!(extensions_for("cobol").is_empty());
        assert_eq!(sample_extension("cobol"), ".txt");
    }

    #[test]
    fn generic_skips_the_empty_extension_for_samples() {
        assert_eq!(extensions_for("generic"), &[".txt", ""]);
        assert_eq!(sample_extension("generic"), ".txt");
    }
}
