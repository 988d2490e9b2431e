//! Twitter / X profile locator chains.

use super::document::{text_of, PageDocument, Scope};
use super::locators::{first_attr, first_list, first_text, text_or};
use crate::models::{TwitterProfile, UNKNOWN_NAME};

const MAX_TWEETS: usize = 5;

const NAME: &[&str] = &[
    r#"[data-testid="UserName"] span:first-child"#,
    ".css-1rynq56",
    r#"a[href$="/photo"] div[dir="auto"]"#,
    r#"[data-testid="UserNameDisplay"]"#,
];

const USERNAME: &[&str] = &[
    r#"[data-testid="UserName"] span:nth-child(2)"#,
    ".r-18u37iz.r-1wbh5a2 div",
    r#"[data-testid="UserProfileHeader_Items"] span"#,
];

const BIO: &[&str] = &[
    r#"[data-testid="UserDescription"]"#,
    ".css-1dbjc4n.r-1adg3ll",
    r#"[data-testid="UserProfileHeader_Items"] + div"#,
];

const LOCATION: &[&str] = &[
    r#"[data-testid="UserLocation"]"#,
    ".css-1dbjc4n.r-1adg3ll .r-18u37iz:nth-child(2)",
    r#"[data-testid="UserProfileHeader_Items"] div[dir="auto"]"#,
];

const PHOTO: &[&str] = &[
    r#"[data-testid="UserAvatar"] img"#,
    ".css-1dbjc4n.r-sdzlij.r-1udh08x img",
    r#"[data-testid="UserProfileHeader_Items"] img"#,
];

const FOLLOWING: &[&str] = &[
    r#"[data-testid="following"] span"#,
    ".css-1dbjc4n.r-18u37iz .r-1mf7evn:nth-child(1) .r-qvutc0",
    r#"[data-testid="UserProfileHeader_Items"] a[href$="/following"] span"#,
];

const FOLLOWERS: &[&str] = &[
    r#"[data-testid="followers"] span"#,
    ".css-1dbjc4n.r-18u37iz .r-1mf7evn:nth-child(2) .r-qvutc0",
    r#"[data-testid="UserProfileHeader_Items"] a[href$="/followers"] span"#,
];

const TWEET_ITEMS: &[&str] = &[
    r#"[data-testid="tweet"]"#,
    ".css-1dbjc4n.r-1loqt21.r-18u37iz .css-1dbjc4n.r-1iusvr4",
    r#"[data-testid="tweetText"]"#,
];

const TWEET_TEXT: &[&str] = &[r#"[data-testid="tweetText"]"#, ".css-901oao.r-18jsvk2"];

pub fn extract_twitter(doc: &PageDocument, profile_url: &str) -> TwitterProfile {
    let root = doc.root();

    // Chain ends with the item's own text when no inner locator matches.
    let tweets = first_list(root, "tweets", TWEET_ITEMS)
        .into_iter()
        .map(|item| {
            first_text(Scope::Element(item), "tweets.text", TWEET_TEXT)
                .unwrap_or_else(|| text_of(item))
        })
        .filter(|tweet| !tweet.is_empty())
        .take(MAX_TWEETS)
        .collect();

    TwitterProfile {
        name: text_or(root, "name", NAME, UNKNOWN_NAME),
        username: text_or(root, "username", USERNAME, ""),
        bio: text_or(root, "bio", BIO, ""),
        location: text_or(root, "location", LOCATION, ""),
        photo_url: first_attr(root, "photo", PHOTO, "src").unwrap_or_default(),
        following_count: text_or(root, "following", FOLLOWING, "0"),
        followers_count: text_or(root, "followers", FOLLOWERS, "0"),
        tweets,
        profile_url: profile_url.to_string(),
    }
}
