use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque shelf identity assigned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShelfId(pub String);

impl ShelfId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShelfId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ShelfCredential {
    pub shelf_id: ShelfId,
    pub site_url: String,
    pub account: String,
    pub password: String,
}

// Keeps the password out of logs and panics.
impl std::fmt::Debug for ShelfCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShelfCredential")
            .field("shelf_id", &self.shelf_id)
            .field("site_url", &self.site_url)
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub cover: String,
    pub last_chapter: String,
    pub last_chapter_id: String,
}

/// Shelf listing keyed by book title.
pub type Shelf = BTreeMap<String, BookSummary>;

/// One row of a rank or search listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingEntry {
    pub book_id: String,
    pub book_title: String,
    pub book_cover: String,
    pub book_author: String,
    pub book_favo: String,
    pub book_popularity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankPage {
    pub page: u32,
    pub total: usize,
    pub books: Vec<ListingEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchPage {
    pub page: u32,
    pub pages: u32,
    pub total: usize,
    pub books: Vec<ListingEntry>,
}

/// Counters are kept as the text the site rendered; units and number
/// formatting are site specific.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub re_ticket: String,
    pub mon_ticket: String,
    pub san: String,
    pub temp_san: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Free,
    Locked,
    Unlocked,
}

impl LockState {
    /// Integer code used by older clients of the shelf API. Records always
    /// serialize the named state; `novelshelf book --lock-codes` prints this
    /// code instead.
    pub fn code(self) -> i8 {
        match self {
            Self::Free => -1,
            Self::Unlocked => 0,
            Self::Locked => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterEntry {
    pub chapter_title: String,
    pub chapter_id: String,
    pub is_lock: LockState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Volume {
    pub volume_name: String,
    pub chapter_list: Vec<ChapterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardCounters {
    pub book_mon_ticket: String,
    pub book_re_ticket: String,
    pub book_money: String,
    pub book_extra: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookDetail {
    pub book_title: String,
    pub book_author: String,
    pub book_label: Vec<String>,
    pub book_fonts: String,
    pub book_click: String,
    pub book_favo: String,
    pub book_reward: RewardCounters,
    pub book_cover: String,
    pub book_disc: String,
    pub book_volume_list: Vec<Volume>,
    /// chapter id -> lock state, covering every chapter in `book_volume_list`.
    pub chapter_lock: BTreeMap<String, LockState>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Line {
    pub index: u32,
    pub content: String,
    pub tsukkomi: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterNav {
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterContent {
    pub chapter_id: String,
    pub book_id: String,
    pub title: String,
    pub font_count: String,
    pub content: Vec<Line>,
    pub nav: ChapterNav,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineComment {
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub add_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineComments {
    pub chapter_id: String,
    pub paragraph_index: u32,
    pub requested: u32,
    pub count: usize,
    pub comments: Vec<LineComment>,
}
