//! # Search Filter
//!
//! Case-insensitive substring search over a fixed set of text fields.

/// A searchable text field of `T`
pub struct SearchField<T> {
    pub name: &'static str,
    pub get: fn(&T) -> &str,
}

/// Keeps records where the search text occurs in at least one candidate
/// field. A filter built from absent or blank text passes everything.
pub struct SearchFilter<T: 'static> {
    needle: Option<String>,
    fields: &'static [SearchField<T>],
}

impl<T: 'static> SearchFilter<T> {
    pub fn new(term: Option<&str>, fields: &'static [SearchField<T>]) -> Self {
        let needle = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        Self { needle, fields }
    }

    /// A filter that passes every record
    pub fn none(fields: &'static [SearchField<T>]) -> Self {
        Self::new(None, fields)
    }

    pub fn is_noop(&self) -> bool {
        self.needle.is_none()
    }

    /// Lowercased search text
    pub fn needle(&self) -> Option<&str> {
        self.needle.as_deref()
    }

    pub fn fields(&self) -> &'static [SearchField<T>] {
        self.fields
    }

    pub fn matches(&self, record: &T) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };

        self.fields
            .iter()
            .any(|field| (field.get)(record).to_lowercase().contains(needle.as_str()))
    }
}

impl<T: 'static> Clone for SearchFilter<T> {
    fn clone(&self) -> Self {
        Self {
            needle: self.needle.clone(),
            fields: self.fields,
        }
    }
}

impl<T: 'static> std::fmt::Debug for SearchFilter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchFilter")
            .field("needle", &self.needle)
            .field(
                "fields",
                &self.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
