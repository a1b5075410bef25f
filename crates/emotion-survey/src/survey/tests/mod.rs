mod common;
mod tag_feed;
