//! Screens: the owners of list synchronizers.
//!
//! A screen opens its lists, loads them, and closes them when it goes away.
//! Rendering is left to the caller, which reads the lists and subscribes to
//! their revision counters.
use crate::api::{ApiClient, HttpArticles, HttpCategories};
use crate::error::OperationError;
use crate::sync::{ListSync, Outcome, Scope};
use crate::util::format_long_date_es;
use chrono::NaiveDate;

/// Result of one list's load within a screen refresh.
pub type LoadResult = Result<Outcome, OperationError>;

// ============================================================================
// Home
// ============================================================================

/// Categories and starred articles of the signed-in user.
pub struct HomeScreen {
    scope: Scope,
    categories: ListSync<HttpCategories>,
    articles: ListSync<HttpArticles>,
}

/// Per-list results of [`HomeScreen::refresh`]. Either may fail alone.
#[derive(Debug)]
pub struct HomeLoad {
    pub categories: LoadResult,
    pub articles: LoadResult,
}

impl HomeScreen {
    /// Build the screen and load both lists concurrently.
    ///
    /// Only a missing user id fails the open; load failures are reported in
    /// the returned [`HomeLoad`] and in each list's `last_error`.
    pub async fn open(api: &ApiClient, user_id: &str) -> Result<(Self, HomeLoad), OperationError> {
        let scope = Scope::user(user_id)?;
        let screen = Self {
            scope,
            categories: ListSync::new("categories", HttpCategories::new(api.clone())),
            articles: ListSync::new("articles", HttpArticles::new(api.clone())),
        };
        let load = screen.refresh().await;
        Ok((screen, load))
    }

    pub async fn refresh(&self) -> HomeLoad {
        let (categories, articles) = futures::join!(
            self.categories.load(&self.scope),
            self.articles.load(&self.scope)
        );
        HomeLoad {
            categories,
            articles,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn categories(&self) -> &ListSync<HttpCategories> {
        &self.categories
    }

    pub fn articles(&self) -> &ListSync<HttpArticles> {
        &self.articles
    }

    pub fn close(&self) {
        self.categories.close();
        self.articles.close();
    }
}

impl Drop for HomeScreen {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Category
// ============================================================================

/// Every article in one category.
pub struct CategoryScreen {
    scope: Scope,
    articles: ListSync<HttpArticles>,
}

impl CategoryScreen {
    pub async fn open(
        api: &ApiClient,
        category_id: &str,
    ) -> Result<(Self, LoadResult), OperationError> {
        let scope = Scope::category(category_id)?;
        let screen = Self {
            scope,
            articles: ListSync::new("articles", HttpArticles::new(api.clone())),
        };
        let load = screen.refresh().await;
        Ok((screen, load))
    }

    pub async fn refresh(&self) -> LoadResult {
        self.articles.load(&self.scope).await
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn articles(&self) -> &ListSync<HttpArticles> {
        &self.articles
    }

    pub fn close(&self) {
        self.articles.close();
    }
}

impl Drop for CategoryScreen {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Date
// ============================================================================

/// A user's articles created on one day.
pub struct DateScreen {
    scope: Scope,
    date: NaiveDate,
    articles: ListSync<HttpArticles>,
}

impl DateScreen {
    pub async fn open(
        api: &ApiClient,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<(Self, LoadResult), OperationError> {
        let scope = Scope::date(user_id, date)?;
        let screen = Self {
            scope,
            date,
            articles: ListSync::new("articles", HttpArticles::new(api.clone())),
        };
        let load = screen.refresh().await;
        Ok((screen, load))
    }

    pub async fn refresh(&self) -> LoadResult {
        self.articles.load(&self.scope).await
    }

    /// Header text, e.g. `5 de marzo de 2024`.
    pub fn header(&self) -> String {
        format_long_date_es(self.date)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn articles(&self) -> &ListSync<HttpArticles> {
        &self.articles
    }

    pub fn close(&self) {
        self.articles.close();
    }
}

impl Drop for DateScreen {
    fn drop(&mut self) {
        self.close();
    }
}
