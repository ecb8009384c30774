use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

/// A catalog record as stored in the `book` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub publish_date: Date,
    pub description: String,
}

/// Raw form fields as bound from a create/edit submission.
///
/// `id` is never bound from the form; it is path-derived or assigned by
/// the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default)]
    pub description: String,
}

/// A validated create/update payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BookInput {
    pub name: String,
    pub author: String,
    pub publish_date: Date,
    pub description: String,
}

impl BookForm {
    /// Check the form contract: non-empty text fields and a `yyyy-MM-dd`
    /// date. Violations come back as one `{field, error}` entry per
    /// offending field, and the store is never touched.
    pub fn validate(&self) -> Result<BookInput, Vec<serde_json::Value>> {
        let mut details = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            details.push(serde_json::json!({"field": "name", "error": "required"}));
        }

        let author = self.author.trim();
        if author.is_empty() {
            details.push(serde_json::json!({"field": "author", "error": "required"}));
        }

        let description = self.description.trim();
        if description.is_empty() {
            details.push(serde_json::json!({"field": "description", "error": "required"}));
        }

        let format = format_description!("[year]-[month]-[day]");
        let publish_date = match Date::parse(self.publish_date.trim(), &format) {
            Ok(date) => Some(date),
            Err(_) => {
                details.push(
                    serde_json::json!({"field": "publishDate", "error": "expected yyyy-MM-dd"}),
                );
                None
            }
        };

        match (publish_date, details.is_empty()) {
            (Some(publish_date), true) => Ok(BookInput {
                name: name.to_string(),
                author: author.to_string(),
                publish_date,
                description: description.to_string(),
            }),
            _ => Err(details),
        }
    }
}

/// Sortable columns for the list endpoint. This enum is the allow-list:
/// only `column()` values ever reach an ORDER BY clause, so caller input
/// is never interpolated into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookSort {
    #[default]
    Name,
    Author,
    PublishDate,
    Id,
}

impl BookSort {
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Author => "author",
            Self::PublishDate => "publish_date",
            Self::Id => "id",
        }
    }
}
