//! Language name normalization and file extension lookup.

/// Tag returned when nothing better is known.
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// Extension used for languages missing from [`EXTENSIONS`].
pub const FALLBACK_EXTENSION: &str = "txt";

const MIN_PARTIAL_LEN: usize = 3;

/// Alias → canonical tag. Order matters for the partial-match pass.
const ALIASES: &[(&str, &str)] = &[
    ("javascript", "javascript"),
    ("js", "javascript"),
    ("typescript", "typescript"),
    ("ts", "typescript"),
    ("python", "python"),
    ("python3", "python"),
    ("py", "python"),
    ("java", "java"),
    ("cpp", "cpp"),
    ("c++", "cpp"),
    ("cplusplus", "cpp"),
    ("cpp17", "cpp"),
    ("cpp14", "cpp"),
    ("c", "c"),
    ("csharp", "csharp"),
    ("c#", "csharp"),
    ("php", "php"),
    ("ruby", "ruby"),
    ("rb", "ruby"),
    ("swift", "swift"),
    ("go", "go"),
    ("golang", "go"),
    ("scala", "scala"),
    ("kotlin", "kotlin"),
    ("kt", "kotlin"),
    ("rust", "rust"),
    ("rs", "rust"),
];

const EXTENSIONS: &[(&str, &str)] = &[
    ("javascript", "js"),
    ("java", "java"),
    ("python", "py"),
    ("python3", "py"),
    ("cpp", "cpp"),
    ("c", "c"),
    ("csharp", "cs"),
    ("php", "php"),
    ("ruby", "rb"),
    ("swift", "swift"),
    ("go", "go"),
    ("scala", "scala"),
    ("kotlin", "kt"),
    ("rust", "rs"),
    ("typescript", "ts"),
];

/// Map any spelling of a language name to its canonical tag.
///
/// Exact alias matches win, then a whitespace-separated token that is an
/// alias, then the first alias that contains, or is contained in, the input.
/// Unknown names pass through lower-cased so new judge languages still
/// produce a usable tag.
pub fn normalize(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }

    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == normalized) {
        return (*canonical).to_string();
    }

    let by_token = normalized
        .split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ',' | '/'))
        .find_map(|token| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == token)
                .map(|(_, canonical)| *canonical)
        });
    if let Some(canonical) = by_token {
        return canonical.to_string();
    }

    // One- and two-letter aliases occur inside unrelated words ("c" in
    // "brainfuck"), so containment only considers longer names.
    if normalized.len() < MIN_PARTIAL_LEN {
        return normalized;
    }
    ALIASES
        .iter()
        .filter(|(alias, _)| alias.len() >= MIN_PARTIAL_LEN)
        .find(|(alias, _)| normalized.contains(alias) || alias.contains(normalized.as_str()))
        .map_or(normalized.clone(), |(_, canonical)| (*canonical).to_string())
}

/// File extension for a canonical language tag.
pub fn extension_for(language: &str) -> &'static str {
    EXTENSIONS
        .iter()
        .find(|(tag, _)| *tag == language)
        .map_or(FALLBACK_EXTENSION, |(_, extension)| extension)
}
