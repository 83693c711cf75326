//! Name casing helpers for class names and relation aliases.

/// Number of trailing characters dropped from a foreign-key column (`_id`).
const FK_SUFFIX_LEN: usize = 3;

/// Camel-case a table name: `order_item` -> `OrderItem`.
///
/// The first character and every character following a run of `_` or `-`
/// is uppercased and the separators are removed. A `/` turns into `::` and
/// uppercases the character after it. Everything else is kept as written,
/// so `ORDER_item` becomes `ORDERItem`.
pub fn camelize(name: &str) -> String {
    let mut namespaced = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == '/' {
            namespaced.push_str("::");
            if let Some(next) = chars.next() {
                namespaced.push(next.to_ascii_uppercase());
            }
        } else {
            namespaced.push(c);
        }
    }

    let mut out = String::with_capacity(namespaced.len());
    let mut pending: Option<char> = None;
    let mut at_boundary = true;
    for c in namespaced.chars() {
        if matches!(c, '_' | '-') {
            pending = Some(c);
            at_boundary = true;
        } else if at_boundary {
            out.push(c.to_ascii_uppercase());
            pending = None;
            at_boundary = false;
        } else {
            out.push(c);
        }
    }
    // A trailing separator run has nothing to uppercase; its last character survives.
    if let Some(c) = pending {
        out.push(c);
    }
    out
}

/// Plural used for the inverse side of a relation.
pub fn pluralize(class: &str) -> String {
    format!("{class}s")
}

/// Relation alias for a foreign-key column: `author_id` -> `Author`.
///
/// Falls back to `foreign_class` when nothing remains after dropping the
/// suffix.
pub fn relation_alias(local: &str, foreign_class: &str) -> String {
    let keep = local.chars().count().saturating_sub(FK_SUFFIX_LEN);
    let stem: String = local.chars().take(keep).collect();
    let alias = camelize(&stem);
    if alias.is_empty() {
        foreign_class.to_string()
    } else {
        alias
    }
}
