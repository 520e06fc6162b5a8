use std::str::FromStr;

use serde_json::Value;

use crate::error::{Result, SiteError};
use crate::formats::{
    BookDetail, ChapterContent, LineComments, RankPage, SearchPage, Shelf, ShelfCredential,
    WalletSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    NotLoggedIn,
    LoggedIn,
}

/// Capability set every supported site implements.
///
/// Every operation except [`SiteAdapter::login`] fails with
/// `SiteError::NotAuthenticated` until a login has succeeded. Operations are
/// blocking and issue their upstream requests on the caller's thread. Callers
/// serialize access to one instance; [`crate::session::Session`] does this
/// with a per-instance lock.
pub trait SiteAdapter: Send {
    fn credential(&self) -> &ShelfCredential;

    fn login_state(&self) -> LoginState;

    fn login(&mut self) -> Result<()>;

    fn get_shelf(&mut self) -> Result<Shelf>;

    fn get_wallet(&mut self) -> Result<WalletSnapshot>;

    fn get_rank(&mut self, query: &RankQuery) -> Result<RankPage>;

    fn search_book(&mut self, keyword: &str, page: u32) -> Result<SearchPage>;

    fn get_book(&mut self, book_id: &str) -> Result<BookDetail>;

    /// Favorites the book, or removes it when it already is a favorite.
    fn favorite_toggle(&mut self, book_id: &str) -> Result<Value>;

    fn buy_chapter(&mut self, book_id: &str, chapter_id: &str) -> Result<Value>;

    fn get_chapter(&mut self, chapter_id: &str) -> Result<ChapterContent>;

    fn get_line_comments(
        &mut self,
        chapter_id: &str,
        count: u32,
        paragraph_index: u32,
    ) -> Result<LineComments>;

    fn send_line_comment(
        &mut self,
        book_id: &str,
        chapter_id: &str,
        paragraph_index: u32,
        line_text: &str,
        comment_text: &str,
    ) -> Result<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankType {
    #[default]
    Favo,
    Subscribe,
    Recommendeds,
    Hit,
    PushTickets,
    MonthlyTickets,
}

impl RankType {
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Favo => "Favo",
            Self::Subscribe => "Subscribe",
            Self::Recommendeds => "Recommendeds",
            Self::Hit => "Hit",
            Self::PushTickets => "pushTickets",
            Self::MonthlyTickets => "MonthlyTickets",
        }
    }
}

impl FromStr for RankType {
    type Err = SiteError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "favo" => Ok(Self::Favo),
            "subscribe" => Ok(Self::Subscribe),
            "recommendeds" => Ok(Self::Recommendeds),
            "hit" => Ok(Self::Hit),
            "pushtickets" => Ok(Self::PushTickets),
            "monthlytickets" => Ok(Self::MonthlyTickets),
            other => Err(SiteError::validation(
                "rank type",
                format!("unknown rank type {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankPeriod {
    #[default]
    Week,
    Month,
    All,
}

impl RankPeriod {
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Week => "Week",
            Self::Month => "Month",
            Self::All => "All",
        }
    }
}

impl FromStr for RankPeriod {
    type Err = SiteError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(SiteError::validation(
                "rank period",
                format!("unknown rank period {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankQuery {
    pub rank_type: RankType,
    pub period: RankPeriod,
    pub page: u32,
}

impl Default for RankQuery {
    fn default() -> Self {
        Self {
            rank_type: RankType::default(),
            period: RankPeriod::default(),
            page: 1,
        }
    }
}

pub fn validate_page(page: u32) -> Result<()> {
    if page == 0 {
        return Err(SiteError::validation("page", "pages start at 1"));
    }
    Ok(())
}

/// Site ids end up as path segments, so they must be non-empty and slash free.
pub fn validate_id(field: &'static str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(SiteError::validation(field, "must not be empty"));
    }
    if id.contains('/') {
        return Err(SiteError::validation(field, "must not contain '/'"));
    }
    Ok(())
}

pub fn validate_text(field: &'static str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(SiteError::validation(field, "must not be empty"));
    }
    Ok(())
}
