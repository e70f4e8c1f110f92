use url::Url;

/// Lowercase a city name into a filesystem-safe token: runs of anything
/// non-alphanumeric collapse into single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Directory slug for a city page ref like "MI/Ann-Arbor.aspx":
/// drop the region prefix and the extension, then slugify the rest.
pub fn city_slug(city_ref: &str) -> String {
    let name = city_ref.split('/').nth(1).unwrap_or(city_ref);
    let name = name.split('.').next().unwrap_or(name);
    slugify(name)
}

/// Resolve a possibly-relative href against the site origin
pub fn absolute_url(href: &str, origin: &str) -> Option<String> {
    let base = Url::parse(origin).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}
