//! Filename sanitization.

use chrono::Utc;

/// Maximum characters kept from the sanitized stem.
const MAX_STEM_LEN: usize = 200;

/// Collapse a string to a lowercase slug: alphanumeric runs joined by single
/// dashes, no leading or trailing dash.
fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }

    out.chars().take(MAX_STEM_LEN).collect()
}

/// Sanitize an uploaded filename into a safe slug.
///
/// Path components are stripped, the stem is slugified, and the extension is
/// lowercased with non-alphanumerics removed. A stem that sanitizes to
/// nothing is replaced by `file-<unix-timestamp>`, preserving the original
/// extension. Sanitizing an already-sanitized name is a no-op.
pub fn sanitize_filename(filename: &str) -> String {
    // Basename only; no traversal.
    let name = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let (raw_stem, raw_extension) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };

    let stem = slugify(raw_stem);
    let extension: String = raw_extension
        .unwrap_or("")
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect();

    let stem = if stem.is_empty() {
        format!("file-{}", Utc::now().timestamp())
    } else {
        stem
    };

    if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(sanitize_filename("My File.JPG"), "my-file.jpg");
        assert_eq!(sanitize_filename("photo.png"), "photo.png");
        assert_eq!(sanitize_filename("Déjà Vu.PNG"), "déjà-vu.png");
    }

    #[test]
    fn test_idempotent() {
        for name in ["My File.JPG", "a__b--c..d.TXT", "photo.png", "###.txt"] {
            let once = sanitize_filename(name);
            let twice = sanitize_filename(&once);
            assert_eq!(once, twice, "sanitizing {name:?} twice changed it");
        }
    }

    #[test]
    fn test_empty_stem_gets_placeholder() {
        let result = sanitize_filename("###.txt");
        assert!(result.starts_with("file-"), "got {result:?}");
        assert!(result.ends_with(".txt"), "got {result:?}");
    }

    #[test]
    fn test_path_traversal_stripped() {
        assert_eq!(sanitize_filename("../../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir/sub/Name.PNG"), "name.png");
    }

    #[test]
    fn test_separator_runs_collapse() {
        assert_eq!(sanitize_filename("a  b -- c.txt"), "a-b-c.txt");
        assert_eq!(sanitize_filename("a.b.c.png"), "a-b-c.png");
    }

    #[test]
    fn test_extension_cleaned() {
        assert_eq!(sanitize_filename("shot.P N G"), "shot.png");
        let no_ext = sanitize_filename("file.###");
        assert_eq!(no_ext, "file");
    }

    #[test]
    fn test_long_stem_truncated() {
        let long = "a".repeat(400) + ".txt";
        let result = sanitize_filename(&long);
        assert!(result.len() <= MAX_STEM_LEN + 4);
        assert!(result.ends_with(".txt"));
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(sanitize_filename("README"), "readme");
    }
}
