//! JSON shapes exchanged with the backend and their conversion to domain types.
//!
//! The backend is loose about types: ids show up as strings or numbers, and
//! `prioridad` as a boolean, `0`/`1`, or the strings `"Sí"`/`"No"`. All of
//! that is normalized here so the rest of the crate only sees `String` ids
//! and `bool` priorities.
use crate::model::{Article, Category};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Lenient field decoders
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

/// Optional id accepting strings or integers; blank strings count as missing.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<RawId>::deserialize(d)?;
    Ok(raw.and_then(|raw| match raw {
        RawId::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        RawId::Number(n) => Some(n.to_string()),
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let raw = Option::<RawFlag>::deserialize(d)?;
    Ok(match raw {
        Some(RawFlag::Bool(b)) => b,
        Some(RawFlag::Number(n)) => n != 0,
        Some(RawFlag::Text(s)) => parse_priority_label(&s),
        None => false,
    })
}

/// Interpret a textual priority flag. `"Sí"` is what the server stores.
fn parse_priority_label(label: &str) -> bool {
    matches!(
        label.trim().to_lowercase().as_str(),
        "sí" | "si" | "true" | "1" | "yes"
    )
}

// ============================================================================
// Responses
// ============================================================================

/// One article as listed by any of the article endpoints.
///
/// The date search names the title `articulo` instead of `titulo`.
#[derive(Debug, Deserialize)]
pub(crate) struct ArticleDto {
    #[serde(default, alias = "id_articulo", deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, alias = "articulo", alias = "title")]
    titulo: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    prioridad: bool,
    #[serde(default, deserialize_with = "lenient_id")]
    id_categoria: Option<String>,
}

impl ArticleDto {
    /// `None` when the server omitted the id: a positional stand-in would
    /// break every later edit or delete, so such entries are not listed.
    fn into_article(self) -> Option<Article> {
        let id = self.id?;
        Some(Article {
            id,
            title: self.titulo.unwrap_or_default(),
            prioritized: self.prioridad,
            category_id: self.id_categoria,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryDto {
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, alias = "name")]
    nombre: String,
    #[serde(default)]
    color: String,
}

impl CategoryDto {
    fn into_category(self) -> Option<Category> {
        Some(Category {
            id: self.id?,
            name: self.nombre,
            color: self.color,
        })
    }
}

/// `GET /user/{id}`: only the category list is used.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserDto {
    #[serde(default)]
    pub categories: Option<Vec<CategoryDto>>,
}

/// Error payloads use either key depending on the route.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
    }
}

pub(crate) fn into_articles(dtos: Option<Vec<ArticleDto>>) -> Vec<Article> {
    let dtos = dtos.unwrap_or_default();
    let total = dtos.len();
    let articles: Vec<Article> = dtos.into_iter().filter_map(ArticleDto::into_article).collect();
    if articles.len() < total {
        tracing::warn!(
            skipped = total - articles.len(),
            "Skipping articles without an id in server response"
        );
    }
    articles
}

pub(crate) fn into_categories(dtos: Option<Vec<CategoryDto>>) -> Vec<Category> {
    let dtos = dtos.unwrap_or_default();
    let total = dtos.len();
    let categories: Vec<Category> = dtos
        .into_iter()
        .filter_map(CategoryDto::into_category)
        .collect();
    if categories.len() < total {
        tracing::warn!(
            skipped = total - categories.len(),
            "Skipping categories without an id in server response"
        );
    }
    categories
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct TitleUpdate<'a> {
    pub titulo: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PriorityUpdate {
    pub prioridad: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordReset<'a> {
    pub correo_electronico: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn articles(json: &str) -> Vec<Article> {
        into_articles(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_category_listing_shape() {
        let list = articles(
            r#"[{"id": 12, "titulo": "Comprar pan", "id_categoria": 3, "prioridad": "Sí"},
                {"id": "13", "titulo": "Llamar", "id_categoria": "3", "prioridad": "No"}]"#,
        );
        assert_eq!(
            list,
            vec![
                Article {
                    id: "12".into(),
                    title: "Comprar pan".into(),
                    prioritized: true,
                    category_id: Some("3".into()),
                },
                Article {
                    id: "13".into(),
                    title: "Llamar".into(),
                    prioritized: false,
                    category_id: Some("3".into()),
                },
            ]
        );
    }

    #[test]
    fn test_date_search_shape_uses_articulo() {
        let list = articles(r#"[{"id": 5, "articulo": "Notas", "prioridad": true}]"#);
        assert_eq!(list[0].title, "Notas");
        assert!(list[0].prioritized);
        assert_eq!(list[0].category_id, None);
    }

    #[test]
    fn test_entries_without_id_are_skipped() {
        let list = articles(
            r#"[{"articulo": "Sin id", "prioridad": "Sí"},
                {"id": "", "articulo": "Id vacío"},
                {"id": 7, "articulo": "Con id"}]"#,
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "7");
    }

    #[test]
    fn test_null_list_is_empty() {
        assert!(articles("null").is_empty());
    }

    #[test]
    fn test_numeric_and_missing_priority() {
        let list = articles(r#"[{"id": 1, "prioridad": 1}, {"id": 2, "prioridad": 0}, {"id": 3}]"#);
        let flags: Vec<bool> = list.iter().map(|a| a.prioritized).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_priority_labels() {
        assert!(parse_priority_label("Sí"));
        assert!(parse_priority_label(" si "));
        assert!(parse_priority_label("SÍ"));
        assert!(parse_priority_label("true"));
        assert!(!parse_priority_label("No"));
        assert!(!parse_priority_label(""));
    }

    #[test]
    fn test_user_categories() {
        let user: UserDto = serde_json::from_str(
            r##"{"id": 1, "nombre": "Ana", "categories": [
                {"id": 3, "nombre": "Casa", "color": "#ffcc00"},
                {"nombre": "Sin id", "color": "#000000"}]}"##,
        )
        .unwrap();
        let categories = into_categories(user.categories);
        assert_eq!(
            categories,
            vec![Category {
                id: "3".into(),
                name: "Casa".into(),
                color: "#ffcc00".into(),
            }]
        );
    }

    #[test]
    fn test_user_without_categories() {
        let user: UserDto = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(into_categories(user.categories).is_empty());
    }

    #[test]
    fn test_error_body_prefers_error_key() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "No encontrado", "message": "x"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("No encontrado"));

        let body: ErrorBody = serde_json::from_str(r#"{"message": "  "}"#).unwrap();
        assert_eq!(body.into_message(), None);
    }

    #[test]
    fn test_request_bodies() {
        assert_eq!(
            serde_json::to_string(&TitleUpdate { titulo: "Nuevo" }).unwrap(),
            r#"{"titulo":"Nuevo"}"#
        );
        assert_eq!(
            serde_json::to_string(&PriorityUpdate { prioridad: false }).unwrap(),
            r#"{"prioridad":false}"#
        );
        assert_eq!(
            serde_json::to_string(&PasswordReset {
                correo_electronico: "ana@example.com"
            })
            .unwrap(),
            r#"{"correo_electronico":"ana@example.com"}"#
        );
    }
}
