//! RSS 2.0 parsing for the news widget.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

use crate::errors::NewsError;

static SRC_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"src="([^"]+)""#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsArticle {
    pub link: String,
    pub title: String,
    /// Human readable publication date.
    pub date: String,
    pub published: Option<DateTime<Utc>>,
    pub author: String,
    /// Article HTML with absolute `src` URLs.
    pub content: String,
    /// e.g. `"3 Comments"`.
    pub comments: String,
    pub comments_link: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    Comments,
    Content,
    Creator,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" => Some(Field::PubDate),
            b"slash:comments" => Some(Field::Comments),
            b"content:encoded" => Some(Field::Content),
            b"dc:creator" => Some(Field::Creator),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct RawItem {
    title: String,
    link: String,
    pub_date: String,
    comments: String,
    content: String,
    creator: String,
    enclosure: Option<String>,
}

impl RawItem {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::Comments => &mut self.comments,
            Field::Content => &mut self.content,
            Field::Creator => &mut self.creator,
        };
        *slot = value.trim().to_string();
    }

    fn into_article(self, host: Option<&str>, default_author: &str) -> NewsArticle {
        let published = DateTime::parse_from_rfc2822(&self.pub_date)
            .ok()
            .map(|d| d.with_timezone(&Utc));
        let date = published
            .map(|d| d.format("%-d %B %Y").to_string())
            .unwrap_or_else(|| self.pub_date.clone());

        let count = if self.comments.is_empty() {
            "0"
        } else {
            self.comments.as_str()
        };
        let comments = format!("{count} Comment{}", if count == "1" { "" } else { "s" });

        let content = match host {
            Some(host) => absolutize_sources(&self.content, host),
            None => self.content,
        };
        let author = if self.creator.is_empty() {
            default_author.to_string()
        } else {
            self.creator
        };

        NewsArticle {
            comments_link: format!("{}#comments", self.link),
            link: self.link,
            title: self.title,
            date,
            published,
            author,
            content,
            comments,
            thumbnail: self.enclosure,
        }
    }
}

/// Rewrite relative `src="..."` attributes against `host`.
pub fn absolutize_sources(content: &str, host: &str) -> String {
    SRC_ATTRIBUTE
        .replace_all(content, |caps: &Captures| {
            let src = &caps[1];
            if src.starts_with("http://") || src.starts_with("https://") {
                caps[0].to_string()
            } else {
                format!(
                    r#"src="{}/{}""#,
                    host.trim_end_matches('/'),
                    src.trim_start_matches('/')
                )
            }
        })
        .into_owned()
}

/// Parse up to `limit` items from an RSS document, in feed order.
pub fn parse_feed(
    xml: &str,
    host: Option<&str>,
    default_author: &str,
    limit: usize,
) -> Result<Vec<NewsArticle>, NewsError> {
    let mut reader = Reader::from_str(xml);
    let mut items: Vec<RawItem> = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    while items.len() < limit {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                if name.as_ref() == b"item" {
                    current = Some(RawItem::default());
                } else if let Some(item) = current.as_mut() {
                    if name.as_ref() == b"enclosure" {
                        item.enclosure = enclosure_url(&e);
                    } else if field.is_none() {
                        field = Field::from_name(name.as_ref());
                        text.clear();
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"enclosure"
                    && let Some(item) = current.as_mut()
                {
                    item.enclosure = enclosure_url(&e);
                }
            }
            Ok(Event::Text(t)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::CData(c)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::GeneralRef(r)) if field.is_some() => {
                text.push_str(&resolve_entity(&String::from_utf8_lossy(&r)));
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                if name.as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                } else if let (Some(f), Some(item)) = (field, current.as_mut())
                    && Field::from_name(name.as_ref()) == Some(f)
                {
                    item.set(f, std::mem::take(&mut text));
                    field = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(NewsError::Xml(format!(
                    "at position {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
    }

    Ok(items
        .into_iter()
        .map(|item| item.into_article(host, default_author))
        .collect())
}

fn enclosure_url(e: &BytesStart<'_>) -> Option<String> {
    let attr = e.try_get_attribute("url").ok()??;
    let value = match attr.unescape_value() {
        Ok(value) => value.into_owned(),
        Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
    };
    Some(value)
}

/// Expand a predefined or numeric character reference. Unknown ones are kept.
fn resolve_entity(name: &str) -> String {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name
            .strip_prefix("#x")
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    };
    match resolved {
        Some(c) => c.to_string(),
        None => format!("&{name};"),
    }
}
