//! `lodestone news`.

use anyhow::{Context, Result};
use console::style;

use lodestone::config::Config;
use lodestone::news::{self, NewsWidget};
use lodestone::ui::icons::NEWS;

use super::open_settings;

pub async fn cmd_news(config: &Config, open: Option<usize>, dismiss: bool) -> Result<()> {
    let Some(feed_url) = config.news_feed_url() else {
        println!(
            "No news feed configured. Set [news] feed_url in {}",
            config.config_path.display()
        );
        return Ok(());
    };

    let mut settings = open_settings(config)?;
    let widget = NewsWidget::new(feed_url, config.news_host())
        .with_timeout(config.news_timeout())
        .with_default_author(config.news_default_author());
    let update = widget.refresh(&mut settings).await;

    if update.articles.is_empty() {
        println!("No news available.");
        return Ok(());
    }

    println!();
    for (i, article) in update.articles.iter().enumerate() {
        let badge = if i == 0 && update.unread {
            style(" NEW").green().bold().to_string()
        } else {
            String::new()
        };
        println!(
            "{}{}. {}{}",
            NEWS,
            i + 1,
            style(&article.title).bold(),
            badge
        );
        println!(
            "   {} · {} · {}",
            article.date,
            article.author,
            style(&article.comments).dim()
        );
        println!("   {}", style(&article.link).cyan());
        println!();
    }

    if let Some(n) = open {
        let article = n
            .checked_sub(1)
            .and_then(|i| update.articles.get(i))
            .with_context(|| format!("No article number {n}"))?;
        open::that(&article.link)
            .with_context(|| format!("Failed to open {}", article.link))?;
    }

    if dismiss && news::dismiss(&mut settings) {
        println!("{}", style("Marked as read.").dim());
    }
    Ok(())
}
