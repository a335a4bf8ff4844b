//! Keyword categories and the lexicon they form.

use crate::{Error, Result};

/// A named set of keyword substrings scored as one unit.
///
/// Keywords are lowercased at construction; scoring compares them against
/// lowercased content, so matching is case-insensitive by construction.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    label: String,
    keywords: Vec<String>,
}

impl Category {
    /// Creates a category from a display label and its keyword substrings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the label is empty, the keyword
    /// set is empty, or any keyword is empty after trimming.
    pub fn new<I, S>(label: impl Into<String>, keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(Error::InvalidInput(
                "category label cannot be empty".to_string(),
            ));
        }

        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.into().trim().to_lowercase())
            .collect();
        if keywords.is_empty() {
            return Err(Error::InvalidInput(format!(
                "category '{label}' has no keywords"
            )));
        }
        if keywords.iter().any(String::is_empty) {
            return Err(Error::InvalidInput(format!(
                "category '{label}' contains an empty keyword"
            )));
        }

        Ok(Self { label, keywords })
    }

    /// The display label, used for chart legends and status output.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The lowercased keyword substrings.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// The fixed ordered set of categories used for all rounds.
///
/// Order is significant: it defines the index of every per-category count
/// vector produced by the scanner and stored in the time series. The
/// lexicon never changes for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    categories: Vec<Category>,
}

impl Lexicon {
    /// Creates a lexicon from an ordered list of categories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the category list is empty or
    /// two categories share a label.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        if categories.is_empty() {
            return Err(Error::InvalidInput(
                "lexicon must contain at least one category".to_string(),
            ));
        }
        for (i, a) in categories.iter().enumerate() {
            if categories[..i].iter().any(|b| b.label == a.label) {
                return Err(Error::InvalidInput(format!(
                    "duplicate category label '{}'",
                    a.label
                )));
            }
        }
        Ok(Self { categories })
    }

    /// Number of categories, which is also the width of every count vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the lexicon has no categories. Always `false` for a
    /// successfully constructed lexicon.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Iterates the categories in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    /// Category labels in index order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.categories.iter().map(Category::label).collect()
    }

    /// Returns the category at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }
}

impl<'a> IntoIterator for &'a Lexicon {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.iter()
    }
}
