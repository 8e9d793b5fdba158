//! [`Remote`] adapters that back a [`ListSync`](crate::sync::ListSync) with
//! the HTTP API.
use super::ApiClient;
use crate::error::OperationError;
use crate::model::{Article, Category};
use crate::sync::{ArticleRemote, Remote, Scope};
use async_trait::async_trait;

/// Articles for any [`Scope`]:
///
/// - `User`: that user's priority articles (the home screen list)
/// - `Category`: every article in the category
/// - `Date`: the user's articles for one day
#[derive(Debug, Clone)]
pub struct HttpArticles {
    api: ApiClient,
}

impl HttpArticles {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Remote for HttpArticles {
    type Item = Article;

    async fn fetch(&self, scope: &Scope) -> Result<Vec<Article>, OperationError> {
        match scope {
            Scope::User(user_id) => self.api.priority_articles(user_id).await,
            Scope::Category(category_id) => self.api.articles_by_category(category_id).await,
            Scope::Date { user_id, date } => self.api.articles_by_date(user_id, *date).await,
        }
    }
}

#[async_trait]
impl ArticleRemote for HttpArticles {
    async fn set_priority(&self, article_id: &str, prioritized: bool) -> Result<(), OperationError> {
        self.api.update_priority(article_id, prioritized).await
    }

    async fn rename(&self, article_id: &str, title: &str) -> Result<(), OperationError> {
        self.api.update_title(article_id, title).await
    }

    async fn delete(&self, article_id: &str) -> Result<(), OperationError> {
        self.api.delete_article(article_id).await
    }
}

/// A user's categories. Only the `User` scope is meaningful.
#[derive(Debug, Clone)]
pub struct HttpCategories {
    api: ApiClient,
}

impl HttpCategories {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Remote for HttpCategories {
    type Item = Category;

    async fn fetch(&self, scope: &Scope) -> Result<Vec<Category>, OperationError> {
        match scope {
            Scope::User(user_id) => self.api.user_categories(user_id).await,
            other => Err(OperationError::precondition(format!(
                "Categories can only be listed per user, not for {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::NaiveDate;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), None, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_scope_routes_to_endpoint() {
        let server = MockServer::start().await;
        let body = serde_json::json!([{"id": 1, "titulo": "A", "prioridad": true}]);
        Mock::given(method("GET"))
            .and(path("/articles/priority"))
            .and(query_param("id_usuario", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/articles/category/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search_articles_by_date/7"))
            .and(query_param("fecha", "2024-03-05"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let remote = HttpArticles::new(api(&server));
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        for scope in [
            Scope::user("7").unwrap(),
            Scope::category("3").unwrap(),
            Scope::date("7", date).unwrap(),
        ] {
            let articles = remote.fetch(&scope).await.unwrap();
            assert_eq!(articles.len(), 1, "scope {scope}");
        }
    }

    #[tokio::test]
    async fn test_categories_need_user_scope() {
        let server = MockServer::start().await;
        let remote = HttpCategories::new(api(&server));

        let err = remote
            .fetch(&Scope::category("3").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
