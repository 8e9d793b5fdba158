//! Domain types mirrored from the backend.
//!
//! These are the internal representations: ids are always strings and the
//! priority flag is always a `bool`. Wire quirks (numeric ids, `"Sí"`/`"No"`
//! priority strings, Spanish field names) are handled in `api::wire`.

/// Anything that lives in a synchronized list and has a server-assigned id.
pub trait Keyed {
    fn id(&self) -> &str;
}

/// Items that participate in priority ordering.
pub trait Prioritized {
    fn is_prioritized(&self) -> bool;
}

/// A user-authored text item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    /// Starred articles sort first and show a filled star.
    pub prioritized: bool,
    /// Set at creation, never mutated by this client.
    pub category_id: Option<String>,
}

impl Keyed for Article {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Prioritized for Article {
    fn is_prioritized(&self) -> bool {
        self.prioritized
    }
}

/// A named, colored grouping of articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Color as sent by the server, typically `#rrggbb`.
    pub color: String,
}

impl Keyed for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Keyed + ?Sized> Keyed for std::sync::Arc<T> {
    fn id(&self) -> &str {
        (**self).id()
    }
}

impl<T: Prioritized + ?Sized> Prioritized for std::sync::Arc<T> {
    fn is_prioritized(&self) -> bool {
        (**self).is_prioritized()
    }
}

/// Display label for the priority flag.
pub fn priority_label(prioritized: bool) -> &'static str {
    if prioritized {
        "Sí"
    } else {
        "No"
    }
}
