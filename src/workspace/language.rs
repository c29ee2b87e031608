//! Extension-to-language mapping shared by every component that labels files.

use std::path::Path;

/// Detect a language tag from a file path's extension.
///
/// Unrecognized extensions (and paths without one) map to "Unknown".
pub fn language_for_path(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("ts") => "TypeScript",
        Some("tsx") => "TypeScript (React)",
        Some("js") => "JavaScript",
        Some("jsx") => "JavaScript (React)",
        Some("py") => "Python",
        Some("java") => "Java",
        Some("cpp") => "C++",
        Some("cs") => "C#",
        Some("go") => "Go",
        Some("rs") => "Rust",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_map_to_languages() {
        assert_eq!(language_for_path("src/main.rs"), "Rust");
        assert_eq!(language_for_path("service.ts"), "TypeScript");
        assert_eq!(language_for_path("app.tsx"), "TypeScript (React)");
        assert_eq!(language_for_path("script.py"), "Python");
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(language_for_path("Main.RS"), "Rust");
        assert_eq!(language_for_path("Widget.TSX"), "TypeScript (React)");
    }

    #[test]
    fn unrecognized_extensions_are_unknown() {
        assert_eq!(language_for_path("notes.txt"), "Unknown");
        assert_eq!(language_for_path("Makefile"), "Unknown");
        assert_eq!(language_for_path(""), "Unknown");
    }
}
