/// Slug used when a title has no usable characters
const FALLBACK_SLUG: &str = "goal";

/// Lowercase URL-safe slug: ASCII alphanumerics kept, every other run of
/// characters collapsed into a single `-`
pub fn generate_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if !matches!(ch, '\'' | '"') {
            // Apostrophes vanish so "don't" becomes "dont"
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Slug for `text` that does not collide with any of `existing`
pub fn generate_unique_slug<S: AsRef<str>>(text: &str, existing: &[S]) -> String {
    let base = generate_slug(text);
    let taken = |candidate: &str| existing.iter().any(|s| s.as_ref() == candidate);

    if !taken(&base) {
        return base;
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
