//! Support for creating the RSS feed from a list of posts.

use crate::post::PostRecord;
use chrono::{DateTime, Utc};
use rss::{Channel, ChannelBuilder, Item, ItemBuilder};

/// Bundled configuration for creating a feed.
#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub title: String,
    pub description: String,
    pub site: String,
    pub language: String,
}

// RFC 2822 with a two-digit day, as browsers' `toUTCString` prints it.
const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// The link to a post's page.
pub fn post_link(slug: &str) -> String {
    format!("/posts/{}/", slug)
}

/// Creates an RSS 2.0 channel with one item per post, in the order given.
pub fn feed(config: &FeedConfig, posts: &[PostRecord]) -> Channel {
    ChannelBuilder::default()
        .title(config.title.clone())
        .link(config.site.clone())
        .description(config.description.clone())
        .language(Some(config.language.clone()))
        .items(posts.iter().map(feed_item).collect::<Vec<Item>>())
        .build()
}

fn feed_item(post: &PostRecord) -> Item {
    ItemBuilder::default()
        .title(Some(post.title.clone()))
        .pub_date(post.pub_date.as_ref().map(pub_date))
        .description(Some(post.description.clone()))
        .link(Some(post_link(&post.slug)))
        .build()
}

fn pub_date(date: &DateTime<Utc>) -> String {
    date.format(PUB_DATE_FORMAT).to_string()
}

/// Renders the feed as an XML string.
pub fn feed_xml(config: &FeedConfig, posts: &[PostRecord]) -> String {
    feed(config, posts).to_string()
}
