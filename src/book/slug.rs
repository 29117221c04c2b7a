use deunicode::deunicode;

/// Derives the URL slug of a book from its title.
///
/// The title is transliterated to ASCII first, then lowercased, and every
/// run of non-alphanumeric characters collapses into a single `-`. The same
/// title always yields the same slug. Titles without any letters or digits
/// (for example `"!!!"`) produce an empty slug.
pub fn slugify(title: &str) -> String {
    let ascii = deunicode(title);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
