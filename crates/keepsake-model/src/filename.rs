// SPDX-License-Identifier: Apache-2.0

use crate::item::ItemId;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
pub const CAPTION_PREFIX: &str = "New memory — ";

/// Replaces every byte outside `[A-Za-z0-9._-]` with `_` and strips leading dots.
///
/// An empty result falls back to a generated `file_<unique>` name.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-') {
                b as char
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = replaced.trim_start_matches('.');
    if trimmed.is_empty() {
        let unique = ItemId::generate().into_inner();
        let suffix = unique.trim_start_matches(crate::item::ID_PREFIX).replace('.', "");
        return format!("file_{suffix}");
    }
    trimmed.to_string()
}

/// Text after the last `.`, lowercased. Empty when there is none.
#[must_use]
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Name with its final non-empty `.ext` removed.
#[must_use]
pub fn stem_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => stem,
        _ => name,
    }
}

#[must_use]
pub fn allowed_extension(ext: &str) -> bool {
    let lower = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&lower.as_str())
}

#[must_use]
pub fn default_caption(stem: &str) -> String {
    format!("{CAPTION_PREFIX}{stem}")
}

#[must_use]
pub fn default_alt(stem: &str) -> String {
    stem.to_string()
}

#[must_use]
pub fn image_mime_type(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_unsafe_bytes_and_leading_dots() {
        assert_eq!(sanitize_filename("my photo (1).JPG"), "my_photo__1_.JPG");
        assert_eq!(sanitize_filename("..hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename("a/b\\c.gif"), "a_b_c.gif");
        assert_eq!(sanitize_filename("é.png"), "__.png");
    }

    #[test]
    fn sanitize_falls_back_to_generated_name() {
        let name = sanitize_filename("...");
        assert!(name.starts_with("file_"), "{name}");
        assert!(!name.contains('.'));
    }

    #[test]
    fn extension_and_stem_follow_last_dot() {
        assert_eq!(extension_of("photo.PNG"), "png");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(stem_of("photo.PNG"), "photo");
        assert_eq!(stem_of("archive.tar.gz"), "archive.tar");
        assert_eq!(stem_of("trailing."), "trailing.");
    }

    #[test]
    fn extension_whitelist_is_case_insensitive() {
        assert!(allowed_extension("WEBP"));
        assert!(allowed_extension("jpeg"));
        assert!(!allowed_extension("svg"));
        assert!(!allowed_extension(""));
    }

    #[test]
    fn default_caption_uses_memory_prefix() {
        assert_eq!(default_caption("photo"), "New memory — photo");
        assert_eq!(image_mime_type("JPG"), Some("image/jpeg"));
        assert_eq!(image_mime_type("bmp"), None);
    }
}
