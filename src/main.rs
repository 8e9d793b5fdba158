use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use onta::api::{ApiClient, HttpArticles, HttpCategories};
use onta::config::Config;
use onta::model::priority_label;
use onta::screen::{CategoryScreen, DateScreen, HomeScreen};
use onta::sync::{ListSync, Outcome};
use onta::util::{parse_iso_date, single_line, strip_control_chars, truncate_to_width};

const TITLE_WIDTH: usize = 60;

/// Get the config directory path (~/.config/onta/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("onta"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_iso_date(s).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[derive(Parser, Debug)]
#[command(name = "onta", about = "Command-line client for the Onta notes backend")]
struct Args {
    /// Config file (default: ~/.config/onta/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Signed-in user id, overrides the config file
    #[arg(long, value_name = "ID")]
    user_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the user's categories and starred articles
    Home,
    /// Show every article in a category
    Category {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Show the user's articles for a day (default: today, UTC)
    Date {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Toggle the star on an article
    Star {
        article_id: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Rename an article
    Rename {
        article_id: String,
        title: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Delete an article
    Delete {
        article_id: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Ask the server to mail password reset instructions
    ForgotPassword { email: String },
}

/// Which list an article action is resolved against. Default: home.
#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Resolve the article in this category's list
    #[arg(long, value_name = "ID", conflicts_with = "date")]
    category: Option<String>,

    /// Resolve the article in this day's list
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    date: Option<NaiveDate>,
}

enum Action {
    Star,
    Rename(String),
    Delete,
}

/// The screen an action runs against, kept open until the action finishes.
enum Opened {
    Home(HomeScreen),
    Category(CategoryScreen),
    Date(DateScreen),
}

impl Opened {
    fn articles(&self) -> &ListSync<HttpArticles> {
        match self {
            Opened::Home(s) => s.articles(),
            Opened::Category(s) => s.articles(),
            Opened::Date(s) => s.articles(),
        }
    }

    fn heading(&self) -> String {
        match self {
            Opened::Home(_) => "Starred articles".to_string(),
            Opened::Category(s) => format!("Category {}", s.scope()),
            Opened::Date(s) => s.header(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(user_id) = args.user_id {
        config.user_id = Some(user_id);
    }

    let api = ApiClient::from_config(&config).context("Failed to create API client")?;

    match args.command {
        Command::Home => {
            let (home, load) = HomeScreen::open(&api, require_user(&config)?).await?;
            println!("Categories");
            match load.categories {
                Ok(_) => print_categories(home.categories()),
                Err(e) => eprintln!("  Could not load categories: {}", e.user_message()),
            }
            println!();
            println!("Starred articles");
            match load.articles {
                Ok(_) => print_articles(home.articles()),
                Err(e) => eprintln!("  Could not load articles: {}", e.user_message()),
            }
        }
        Command::Category { id } => {
            let (screen, load) = CategoryScreen::open(&api, &id).await?;
            load.context("Failed to load category")?;
            println!("Category {id}");
            print_articles(screen.articles());
        }
        Command::Date { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let (screen, load) = DateScreen::open(&api, require_user(&config)?, date).await?;
            load.context("Failed to load articles for date")?;
            println!("{}", screen.header());
            print_articles(screen.articles());
        }
        Command::Star { article_id, list } => {
            run_action(&api, &config, list, &article_id, Action::Star).await?;
        }
        Command::Rename {
            article_id,
            title,
            list,
        } => {
            run_action(&api, &config, list, &article_id, Action::Rename(title)).await?;
        }
        Command::Delete { article_id, list } => {
            run_action(&api, &config, list, &article_id, Action::Delete).await?;
        }
        Command::ForgotPassword { email } => {
            api.request_password_reset(&email)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Password reset failed")?;
            println!("If the address is registered, reset instructions are on their way.");
        }
    }

    Ok(())
}

fn require_user(config: &Config) -> Result<&str> {
    config.user_id().context(
        "No user id configured: pass --user-id or set user_id in the config file",
    )
}

async fn open_list(api: &ApiClient, config: &Config, list: ListArgs) -> Result<Opened> {
    let opened = if let Some(category_id) = list.category {
        let (screen, load) = CategoryScreen::open(api, &category_id).await?;
        load.context("Failed to load category")?;
        Opened::Category(screen)
    } else if let Some(date) = list.date {
        let (screen, load) = DateScreen::open(api, require_user(config)?, date).await?;
        load.context("Failed to load articles for date")?;
        Opened::Date(screen)
    } else {
        let (screen, load) = HomeScreen::open(api, require_user(config)?).await?;
        load.articles.context("Failed to load starred articles")?;
        Opened::Home(screen)
    };
    Ok(opened)
}

async fn run_action(
    api: &ApiClient,
    config: &Config,
    list: ListArgs,
    article_id: &str,
    action: Action,
) -> Result<()> {
    let opened = open_list(api, config, list).await?;
    let articles = opened.articles();

    let outcome = match &action {
        Action::Star => articles.toggle_priority(article_id).await,
        Action::Rename(title) => articles.update_title(article_id, title).await,
        Action::Delete => articles.remove(article_id).await,
    }
    .map_err(|e| anyhow::anyhow!(e.user_message()))
    .with_context(|| format!("Action on article {article_id} failed"))?;

    match outcome {
        Outcome::Applied => match action {
            Action::Star => {
                let prioritized = articles.get(article_id).is_some_and(|a| a.prioritized);
                println!(
                    "Article {article_id} priority: {}",
                    priority_label(prioritized)
                );
            }
            Action::Rename(_) => println!("Article {article_id} renamed"),
            Action::Delete => println!("Article {article_id} deleted"),
        },
        Outcome::NotFound => {
            eprintln!("No article {article_id} in this list; nothing was sent");
        }
        Outcome::Superseded | Outcome::Discarded => {
            eprintln!("Action on article {article_id} was abandoned");
        }
    }

    println!();
    println!("{}", opened.heading());
    print_articles(articles);
    Ok(())
}

fn clean_title(title: &str) -> String {
    let title = strip_control_chars(title);
    let title = single_line(&title);
    truncate_to_width(&title, TITLE_WIDTH).into_owned()
}

fn print_articles(list: &ListSync<HttpArticles>) {
    let articles = list.sorted_by_priority();
    if articles.is_empty() {
        println!("  (no articles)");
        return;
    }
    for article in articles {
        let star = if article.prioritized { '★' } else { '☆' };
        println!(
            "  {star} {:>6}  {}",
            clean_title(&article.id),
            clean_title(&article.title)
        );
    }
}

fn print_categories(list: &ListSync<HttpCategories>) {
    let categories = list.items();
    if categories.is_empty() {
        println!("  (no categories)");
        return;
    }
    for category in categories {
        println!(
            "  {:>6}  {}  {}",
            clean_title(&category.id),
            clean_title(&category.name),
            clean_title(&category.color)
        );
    }
}
