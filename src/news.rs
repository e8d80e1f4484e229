use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::fixtures::parse_fixture_date;
use crate::record::{lookup, value_to_text};
use crate::store::Document;

pub const NEWS_COLLECTION: &str = "news";
pub const DEFAULT_NEWS_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: String,
    pub author: String,
    pub state: String,
    pub division: String,
    pub image_url: String,
}

impl NewsItem {
    pub fn from_document(doc: &Document) -> Self {
        let text = |keys: &[&str]| lookup(&doc.fields, keys).map(value_to_text).unwrap_or_default();
        Self {
            id: doc.id.clone(),
            title: text(&["title"]),
            content: text(&["content"]),
            date: text(&["date"]),
            author: text(&["author"]),
            state: text(&["state"]),
            division: text(&["division"]),
            image_url: text(&["imageUrl"]),
        }
    }

    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("title".to_string(), Value::from(self.title.clone()));
        fields.insert("content".to_string(), Value::from(self.content.clone()));
        fields.insert("date".to_string(), Value::from(self.date.clone()));
        fields.insert("author".to_string(), Value::from(self.author.clone()));
        fields.insert("state".to_string(), Value::from(self.state.clone()));
        fields.insert("division".to_string(), Value::from(self.division.clone()));
        fields.insert("imageUrl".to_string(), Value::from(self.image_url.clone()));
        fields
    }
}

/// `None` on either axis means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsFilter {
    pub state: Option<String>,
    pub division: Option<String>,
}

impl NewsFilter {
    pub fn matches(&self, item: &NewsItem) -> bool {
        let state_ok = self.state.as_deref().is_none_or(|s| s == item.state);
        let division_ok = self.division.as_deref().is_none_or(|d| d == item.division);
        state_ok && division_ok
    }
}

/// Filtered, latest first, at most `limit` items.
pub fn filter_news(items: &[NewsItem], filter: &NewsFilter, limit: usize) -> Vec<NewsItem> {
    let mut out: Vec<NewsItem> = items.iter().filter(|i| filter.matches(i)).cloned().collect();
    out.sort_by(|a, b| {
        match (parse_fixture_date(&a.date), parse_fixture_date(&b.date)) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    out.truncate(limit);
    out
}
