//! Adapter for youdubook.com.
//!
//! The site has no API. Login is a replayed `saveMemberInfo` cookie checked by
//! loading the shelf page: an unauthenticated request is redirected to the
//! login form, so the landing URL is the only success signal. Chapter bodies
//! come from a JSON endpoint that needs a token mined out of the reader page
//! and a matching `Referer`.
//!
//! TLS certificate validation is off by default because the site serves a
//! chain that does not verify. This removes transport trust for every request
//! made by this adapter; `NOVELSHELF_ACCEPT_INVALID_CERTS=false` turns it back on.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER};
use scraper::{ElementRef, Html};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::adapter::{
    LoginState, RankQuery, SiteAdapter, validate_id, validate_page, validate_text,
};
use crate::config::{ClientConfig, HeaderTemplate};
use crate::error::{Result, SiteError};
use crate::extract::{
    decode_paragraph, first_attr, first_text, id_from_href, is_separator_row,
    lock_state_from_class, mine_chapter_token, nav_target, page_count, require_attr,
    require_first, select_all, select_first, text_of,
};
use crate::formats::{
    BookDetail, BookSummary, ChapterContent, ChapterEntry, ChapterNav, Line, LineComment,
    LineComments, ListingEntry, LockState, RankPage, RewardCounters, SearchPage, Shelf,
    ShelfCredential, Volume, WalletSnapshot,
};

pub const NAME: &str = "youdu";
pub const BASE_URL: &str = "https://www.youdubook.com/";

pub const HEADERS: HeaderTemplate = HeaderTemplate {
    user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/84.0.4147.125 Safari/537.36",
    origin: None,
    requested_with: Some("XMLHttpRequest"),
};

const ACCEPT_INVALID_CERTS: bool = true;

const MEMBER_COOKIE: &str = "saveMemberInfo";

const SHELF_PATH: &str = "user/favobook";
const WALLET_PATH: &str = "user/prepaidrecords";
const BOOK_PATH: &str = "book_detail/";
const READ_CHAPTER_PATH: &str = "readchapter/";
const CHAPTER_JSON_PATH: &str = "booklibrary/membersinglechapter/chapter_id/";
const LINE_COMMENTS_PATH: &str = "booklibrary/tsukkomilist";
const LINE_COMMENT_SEND_PATH: &str = "booklibrary/tsukkomiadd";
const BUY_CHAPTER_PATH: &str = "booklibrary/subscribebookaction";
const FAVORITE_PATH: &str = "booklibrary/actionfavo";
const SEARCH_SEGMENT_PREFIX: &str = "0_0_0_0_0_0_0_";

/// Fixed `sign` field the chapter endpoint expects next to the mined token.
const CHAPTER_SIGN: &str = "a3NvcnQoJHBhcmEpOw==";
/// Form field name the upstream uses for the mined chapter token.
const CHAPTER_TOKEN_FIELD: &str = "caonima";

pub fn build(
    base_url: Url,
    credential: ShelfCredential,
    config: &ClientConfig,
) -> Result<Box<dyn SiteAdapter>> {
    Ok(Box::new(YouduAdapter::new(base_url, credential, config)?))
}

pub struct YouduAdapter {
    base_url: Url,
    credential: ShelfCredential,
    client: Client,
    jar: Arc<Jar>,
    state: LoginState,
}

impl YouduAdapter {
    pub fn new(base_url: Url, credential: ShelfCredential, config: &ClientConfig) -> Result<Self> {
        if credential.account.trim().is_empty() {
            return Err(SiteError::validation("account", "must not be empty"));
        }
        if credential.password.is_empty() {
            return Err(SiteError::validation("password", "must not be empty"));
        }

        let origin = HEADERS
            .origin
            .map(str::to_owned)
            .unwrap_or_else(|| base_url.origin().ascii_serialization());
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, header_value("origin", &origin)?);
        if let Some(requested_with) = HEADERS.requested_with {
            headers.insert(
                HeaderName::from_static("x-requested-with"),
                header_value("x-requested-with", requested_with)?,
            );
        }

        let accept_invalid_certs = config
            .accept_invalid_certs
            .unwrap_or(ACCEPT_INVALID_CERTS);
        if accept_invalid_certs {
            tracing::warn!(
                site = NAME,
                shelf_id = %credential.shelf_id,
                "TLS certificate validation is disabled for this site"
            );
        }

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(HEADERS.user_agent)
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| SiteError::transport(base_url.as_str(), err))?;

        Ok(Self {
            base_url,
            credential,
            client,
            jar,
            state: LoginState::NotLoggedIn,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| SiteError::validation("request path", format!("{path:?}: {err}")))
    }

    fn ensure_logged_in(&self) -> Result<()> {
        match self.state {
            LoginState::LoggedIn => Ok(()),
            LoginState::NotLoggedIn => Err(SiteError::NotAuthenticated {
                shelf_id: self.credential.shelf_id.to_string(),
            }),
        }
    }

    /// Sends a request and rejects redirects away from `url` (the upstream's
    /// way of reporting an expired session) and non-success statuses.
    fn send(&mut self, request: RequestBuilder, url: &Url) -> Result<Response> {
        let response = request
            .send()
            .map_err(|err| SiteError::transport(url.as_str(), err))?;

        if response.url().path() != url.path() {
            self.state = LoginState::NotLoggedIn;
            tracing::warn!(
                site = NAME,
                shelf_id = %self.credential.shelf_id,
                requested = %url,
                landed = %response.url(),
                "redirected away from requested page; session expired"
            );
            return Err(SiteError::Auth {
                site: self.base_url.to_string(),
                expected: url.to_string(),
                landed: response.url().to_string(),
            });
        }

        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::upstream_status(url.as_str(), status));
        }
        Ok(response)
    }

    fn fetch_page(&mut self, url: &Url) -> Result<String> {
        tracing::debug!(site = NAME, url = %url, "GET page");
        let request = self.client.get(url.clone());
        let response = self.send(request, url)?;
        response
            .text()
            .map_err(|err| SiteError::transport(url.as_str(), err))
    }

    fn post_form(
        &mut self,
        url: &Url,
        form: &[(&str, String)],
        referer: Option<&Url>,
    ) -> Result<Value> {
        tracing::debug!(site = NAME, url = %url, fields = form.len(), "POST form");
        let mut request = self.client.post(url.clone()).form(form);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer.as_str());
        }
        let response = self.send(request, url)?;
        let body = response
            .text()
            .map_err(|err| SiteError::transport(url.as_str(), err))?;
        serde_json::from_str(&body)
            .map_err(|err| SiteError::extraction(url.as_str(), format!("response is not JSON: {err}")))
    }
}

impl SiteAdapter for YouduAdapter {
    fn credential(&self) -> &ShelfCredential {
        &self.credential
    }

    fn login_state(&self) -> LoginState {
        self.state
    }

    fn login(&mut self) -> Result<()> {
        self.state = LoginState::NotLoggedIn;
        let cookie = member_cookie(&self.credential.account, &self.credential.password)?;
        self.jar
            .add_cookie_str(&format!("{MEMBER_COOKIE}={cookie}; Path=/"), &self.base_url);

        let shelf_url = self.endpoint(SHELF_PATH)?;
        tracing::debug!(site = NAME, shelf_id = %self.credential.shelf_id, "login");
        let response = self
            .client
            .get(shelf_url.clone())
            .send()
            .map_err(|err| SiteError::transport(shelf_url.as_str(), err))?;

        if response.url() != &shelf_url {
            tracing::warn!(
                site = NAME,
                shelf_id = %self.credential.shelf_id,
                landed = %response.url(),
                "login rejected"
            );
            return Err(SiteError::Auth {
                site: self.base_url.to_string(),
                expected: shelf_url.to_string(),
                landed: response.url().to_string(),
            });
        }
        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::upstream_status(shelf_url.as_str(), status));
        }

        self.state = LoginState::LoggedIn;
        tracing::info!(site = NAME, shelf_id = %self.credential.shelf_id, "logged in");
        Ok(())
    }

    fn get_shelf(&mut self) -> Result<Shelf> {
        self.ensure_logged_in()?;
        let url = self.endpoint(SHELF_PATH)?;
        let html = self.fetch_page(&url)?;
        let shelf = parse_shelf(&html)?;
        tracing::info!(site = NAME, books = shelf.len(), "read shelf");
        Ok(shelf)
    }

    fn get_wallet(&mut self) -> Result<WalletSnapshot> {
        self.ensure_logged_in()?;
        let url = self.endpoint(WALLET_PATH)?;
        let html = self.fetch_page(&url)?;
        parse_wallet(&html)
    }

    fn get_rank(&mut self, query: &RankQuery) -> Result<RankPage> {
        self.ensure_logged_in()?;
        validate_page(query.page)?;
        let mut url = self.endpoint(&format!(
            "ranking/ranklist/tag/{}/type/{}",
            query.rank_type.as_tag(),
            query.period.as_tag()
        ))?;
        url.query_pairs_mut()
            .append_pair("page", &query.page.to_string());
        let html = self.fetch_page(&url)?;
        let books = parse_rank(&html)?;
        tracing::info!(
            site = NAME,
            rank = query.rank_type.as_tag(),
            period = query.period.as_tag(),
            page = query.page,
            books = books.len(),
            "read rank page"
        );
        Ok(RankPage {
            page: query.page,
            total: books.len(),
            books,
        })
    }

    fn search_book(&mut self, keyword: &str, page: u32) -> Result<SearchPage> {
        self.ensure_logged_in()?;
        validate_text("keyword", keyword)?;
        validate_page(page)?;
        let mut url = self.endpoint("booklibrary/index/str/")?;
        url.path_segments_mut()
            .map_err(|()| SiteError::validation("site url", "cannot carry a path"))?
            .pop_if_empty()
            .push(&format!("{SEARCH_SEGMENT_PREFIX}{}", keyword.trim()));
        url.query_pairs_mut().append_pair("page", &page.to_string());
        let html = self.fetch_page(&url)?;
        let (pages, books) = parse_search(&html)?;
        tracing::info!(site = NAME, page, pages, books = books.len(), "searched books");
        Ok(SearchPage {
            page,
            pages,
            total: books.len(),
            books,
        })
    }

    fn get_book(&mut self, book_id: &str) -> Result<BookDetail> {
        self.ensure_logged_in()?;
        validate_id("book id", book_id)?;
        let url = self.endpoint(&format!("{BOOK_PATH}{book_id}"))?;
        let html = self.fetch_page(&url)?;
        let book = parse_book(&html)?;
        tracing::info!(
            site = NAME,
            book_id,
            volumes = book.book_volume_list.len(),
            chapters = book.chapter_lock.len(),
            "read book detail"
        );
        Ok(book)
    }

    fn favorite_toggle(&mut self, book_id: &str) -> Result<Value> {
        self.ensure_logged_in()?;
        validate_id("book id", book_id)?;
        let url = self.endpoint(FAVORITE_PATH)?;
        let ack = self.post_form(&url, &[("BookID", book_id.to_owned())], None)?;
        tracing::info!(site = NAME, book_id, "toggled favorite");
        Ok(ack)
    }

    fn buy_chapter(&mut self, book_id: &str, chapter_id: &str) -> Result<Value> {
        self.ensure_logged_in()?;
        validate_id("book id", book_id)?;
        validate_id("chapter id", chapter_id)?;
        let url = self.endpoint(BUY_CHAPTER_PATH)?;
        let form = [
            ("BookID", book_id.to_owned()),
            ("ChapterID", chapter_id.to_owned()),
            ("isSingleWsCount", "0".to_owned()),
            ("isAllWsCount", "0".to_owned()),
            ("isMethod", "1".to_owned()),
            ("isAuto", "0".to_owned()),
        ];
        let ack = self.post_form(&url, &form, None)?;
        tracing::info!(site = NAME, book_id, chapter_id, "bought chapter");
        Ok(ack)
    }

    fn get_chapter(&mut self, chapter_id: &str) -> Result<ChapterContent> {
        self.ensure_logged_in()?;
        validate_id("chapter id", chapter_id)?;

        let page_url = self.endpoint(&format!("{READ_CHAPTER_PATH}{chapter_id}"))?;
        let page = self.fetch_page(&page_url)?;
        let nav = parse_reader_nav(&page)?;
        let token = mine_chapter_token(&page).ok_or_else(|| {
            SiteError::extraction(
                page_url.as_str(),
                "chapter token assignment not found in page script",
            )
        })?;

        let json_url = self.endpoint(&format!("{CHAPTER_JSON_PATH}{chapter_id}"))?;
        let form = [
            ("sign", CHAPTER_SIGN.to_owned()),
            (CHAPTER_TOKEN_FIELD, token),
        ];
        let payload = self.post_form(&json_url, &form, Some(&page_url))?;
        let chapter = parse_chapter_payload(&payload, nav)?;
        tracing::info!(
            site = NAME,
            chapter_id,
            lines = chapter.content.len(),
            "read chapter"
        );
        Ok(chapter)
    }

    fn get_line_comments(
        &mut self,
        chapter_id: &str,
        count: u32,
        paragraph_index: u32,
    ) -> Result<LineComments> {
        self.ensure_logged_in()?;
        validate_id("chapter id", chapter_id)?;
        if count == 0 {
            return Err(SiteError::validation("count", "must be >= 1"));
        }
        let url = self.endpoint(LINE_COMMENTS_PATH)?;
        let form = [
            ("page", "1".to_owned()),
            ("count", count.to_string()),
            ("chapter_id", chapter_id.to_owned()),
            ("paragraph_index", paragraph_index.to_string()),
        ];
        let payload = self.post_form(&url, &form, None)?;
        let comments = parse_line_comments(&payload)?;
        Ok(LineComments {
            chapter_id: chapter_id.to_owned(),
            paragraph_index,
            requested: count,
            count: comments.len(),
            comments,
        })
    }

    fn send_line_comment(
        &mut self,
        book_id: &str,
        chapter_id: &str,
        paragraph_index: u32,
        line_text: &str,
        comment_text: &str,
    ) -> Result<Value> {
        self.ensure_logged_in()?;
        validate_id("book id", book_id)?;
        validate_id("chapter id", chapter_id)?;
        validate_text("comment", comment_text)?;
        let url = self.endpoint(LINE_COMMENT_SEND_PATH)?;
        let form = [
            ("BookID", book_id.to_owned()),
            ("ChapterID", chapter_id.to_owned()),
            ("paragraph_index", paragraph_index.to_string()),
            ("chapter_content", line_text.to_owned()),
            ("tsukkomi_content", comment_text.to_owned()),
        ];
        let ack = self.post_form(&url, &form, None)?;
        tracing::info!(site = NAME, book_id, chapter_id, paragraph_index, "sent line comment");
        Ok(ack)
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| SiteError::validation(name, err.to_string()))
}

#[derive(Serialize)]
struct MemberInfo<'a> {
    username: &'a str,
    password: &'a str,
}

/// `saveMemberInfo` cookie value: the URL-encoded JSON the site's own login
/// form stores.
pub fn member_cookie(account: &str, password: &str) -> Result<String> {
    let json = serde_json::to_string(&MemberInfo {
        username: account,
        password,
    })
    .map_err(|err| SiteError::validation("account", err.to_string()))?;
    Ok(url::form_urlencoded::byte_serialize(json.as_bytes()).collect())
}

fn parse_shelf(html: &str) -> Result<Shelf> {
    let doc = Html::parse_document(html);
    let list = require_first(doc.root_element(), "div.favoList", "shelf")?;

    let mut shelf = Shelf::new();
    for row in select_all(list, "li")? {
        if is_separator_row(row) {
            continue;
        }
        let Some((id, title)) = row_link(row, "shelf")? else {
            continue;
        };
        let (last_chapter, last_chapter_id) = match select_first(row, "div.updateChapter a")? {
            Some(link) => (
                text_of(link),
                link.value()
                    .attr("href")
                    .and_then(id_from_href)
                    .unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        shelf.insert(
            title.clone(),
            BookSummary {
                id,
                title,
                cover: first_attr(row, "img", "data-original")?.unwrap_or_default(),
                last_chapter,
                last_chapter_id,
            },
        );
    }
    Ok(shelf)
}

/// Book id and title of a listing row. Rows without a usable book link carry
/// no data and yield `None`.
fn row_link(row: ElementRef<'_>, context: &str) -> Result<Option<(String, String)>> {
    let Some(link) = select_first(row, "a[href]")? else {
        tracing::debug!(context, "skipping row without a book link");
        return Ok(None);
    };
    let Some(id) = link.value().attr("href").and_then(id_from_href) else {
        tracing::debug!(context, "skipping row whose link has no book id");
        return Ok(None);
    };
    let title = link
        .value()
        .attr("title")
        .map(|title| title.trim().to_owned())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| text_of(link));
    Ok(Some((id, title)))
}

struct ListingFields {
    context: &'static str,
    rows: &'static str,
    cover: &'static str,
    author: &'static str,
    favo: &'static str,
    popularity: &'static str,
}

const RANK_FIELDS: ListingFields = ListingFields {
    context: "rank",
    rows: "div.piclist",
    cover: "img",
    author: "div.nicheng",
    favo: "div.shoucang",
    popularity: "div.renqi",
};

const SEARCH_FIELDS: ListingFields = ListingFields {
    context: "search",
    rows: "div.BooklibraryList",
    cover: "img.img1",
    author: "dd.nickname",
    favo: "dd.favo",
    popularity: "dd.hit",
};

fn parse_listing(root: ElementRef<'_>, fields: &ListingFields) -> Result<Vec<ListingEntry>> {
    let list = require_first(root, fields.rows, fields.context)?;
    let mut books = Vec::new();
    for row in select_all(list, "li")? {
        if is_separator_row(row) {
            continue;
        }
        let Some((book_id, book_title)) = row_link(row, fields.context)? else {
            continue;
        };
        books.push(ListingEntry {
            book_id,
            book_title,
            book_cover: first_attr(row, fields.cover, "data-original")?.unwrap_or_default(),
            book_author: first_text(row, fields.author)?,
            book_favo: first_text(row, fields.favo)?,
            book_popularity: first_text(row, fields.popularity)?,
        });
    }
    Ok(books)
}

fn parse_rank(html: &str) -> Result<Vec<ListingEntry>> {
    let doc = Html::parse_document(html);
    parse_listing(doc.root_element(), &RANK_FIELDS)
}

fn parse_search(html: &str) -> Result<(u32, Vec<ListingEntry>)> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let pages = page_count(root, "div.pageInfo")?;
    let books = parse_listing(root, &SEARCH_FIELDS)?;
    Ok((pages, books))
}

fn parse_wallet(html: &str) -> Result<WalletSnapshot> {
    let doc = Html::parse_document(html);
    let top = require_first(doc.root_element(), "div.Top", "wallet")?;
    let counters = select_all(top, "li")?
        .into_iter()
        .map(|li| first_text(li, "em"))
        .collect::<Result<Vec<_>>>()?;
    let [re_ticket, mon_ticket, san, temp_san, ..] = counters.as_slice() else {
        return Err(SiteError::extraction(
            "wallet",
            format!("expected 4 counters, found {}", counters.len()),
        ));
    };
    Ok(WalletSnapshot {
        re_ticket: re_ticket.clone(),
        mon_ticket: mon_ticket.clone(),
        san: san.clone(),
        temp_san: temp_san.clone(),
    })
}

fn parse_book(html: &str) -> Result<BookDetail> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let title_block = require_first(root, "div.title", "book detail")?;
    let labels = match select_first(root, "div.label")? {
        Some(block) => select_all(block, "li")?.into_iter().map(text_of).collect(),
        None => Vec::new(),
    };
    let fonts = match select_first(root, "div.Font")? {
        Some(block) => select_all(block, "span")?.into_iter().map(text_of).collect(),
        None => Vec::new(),
    };
    let rewards = match select_first(root, "ul.Reward")? {
        Some(block) => select_all(block, "li")?.into_iter().map(text_of).collect(),
        None => Vec::new(),
    };
    let nth = |values: &Vec<String>, idx: usize| values.get(idx).cloned().unwrap_or_default();

    let (book_volume_list, chapter_lock) = parse_volumes(root)?;

    Ok(BookDetail {
        book_title: first_text(title_block, "span")?,
        book_author: first_text(title_block, "em")?,
        book_label: labels,
        book_fonts: nth(&fonts, 0),
        book_click: nth(&fonts, 1),
        book_favo: nth(&fonts, 2),
        book_reward: RewardCounters {
            book_mon_ticket: nth(&rewards, 0),
            book_re_ticket: nth(&rewards, 1),
            book_money: nth(&rewards, 2),
            book_extra: nth(&rewards, 3),
        },
        book_cover: first_attr(root, "div.pic img", "data-original")?.unwrap_or_default(),
        book_disc: select_first(root, "div.synopsisCon")?
            .map(|el| el.html())
            .unwrap_or_default(),
        book_volume_list,
        chapter_lock,
    })
}

/// Volume names and chapter lists are sibling blocks paired by position.
fn parse_volumes(
    root: ElementRef<'_>,
) -> Result<(Vec<Volume>, BTreeMap<String, LockState>)> {
    let names = select_all(root, "div.volume_name")?;
    let lists = select_all(root, "div.chapter_list")?;
    if names.len() != lists.len() {
        return Err(SiteError::extraction(
            "book volumes",
            format!(
                "{} volume names but {} chapter lists",
                names.len(),
                lists.len()
            ),
        ));
    }

    let mut volumes = Vec::with_capacity(names.len());
    let mut chapter_lock = BTreeMap::new();
    for (name, list) in names.into_iter().zip(lists) {
        let mut chapter_list = Vec::new();
        for row in select_all(list, "li")? {
            let link = require_first(row, "a", "chapter row")?;
            let href = require_attr(link, "href", "chapter row")?;
            let chapter_id = id_from_href(&href).ok_or_else(|| {
                SiteError::extraction("chapter row", format!("no chapter id in {href:?}"))
            })?;
            let is_lock = lock_state_from_class(row.value().attr("class"));
            chapter_lock.insert(chapter_id.clone(), is_lock);
            chapter_list.push(ChapterEntry {
                chapter_title: text_of(link),
                chapter_id,
                is_lock,
            });
        }
        volumes.push(Volume {
            volume_name: text_of(name),
            chapter_list,
        });
    }
    Ok((volumes, chapter_lock))
}

/// Previous/next chapter ids from the reader page's first and last nav
/// buttons. Missing buttons leave both neighbors absent.
fn parse_reader_nav(html: &str) -> Result<ChapterNav> {
    let doc = Html::parse_document(html);
    let Some(bar) = select_first(doc.root_element(), "div.chapterBtn")? else {
        tracing::debug!("reader page has no chapter navigation");
        return Ok(ChapterNav::default());
    };
    let buttons = select_all(bar, "a")?;
    Ok(ChapterNav {
        prev: nav_target(buttons.first().and_then(|el| el.value().attr("href"))),
        next: nav_target(buttons.last().and_then(|el| el.value().attr("href"))),
    })
}

#[derive(Debug, Deserialize)]
struct ChapterPayload {
    #[serde(deserialize_with = "loose_string")]
    id: String,
    #[serde(rename = "BookID", deserialize_with = "loose_string")]
    book_id: String,
    #[serde(default, deserialize_with = "loose_string")]
    title: String,
    #[serde(rename = "FontCount", default, deserialize_with = "loose_string")]
    font_count: String,
    show_content: Vec<RawLine>,
}

#[derive(Debug, Deserialize)]
struct RawLine {
    #[serde(deserialize_with = "loose_u32")]
    paragraph_index: u32,
    content: String,
    #[serde(default, deserialize_with = "loose_u32")]
    tsukkomi: u32,
}

fn parse_chapter_payload(payload: &Value, nav: ChapterNav) -> Result<ChapterContent> {
    let data = payload
        .get("data")
        .filter(|data| data.as_object().is_some_and(|fields| !fields.is_empty()))
        .ok_or_else(|| SiteError::extraction("chapter payload", "missing `data` object"))?;
    let chapter = ChapterPayload::deserialize(data)
        .map_err(|err| SiteError::extraction("chapter payload", err.to_string()))?;

    let content = chapter
        .show_content
        .into_iter()
        .map(|line| {
            Ok(Line {
                index: line.paragraph_index,
                content: decode_paragraph(&line.content)?,
                tsukkomi: line.tsukkomi,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChapterContent {
        chapter_id: chapter.id,
        book_id: chapter.book_id,
        title: chapter.title,
        font_count: chapter.font_count,
        content,
        nav,
    })
}

#[derive(Debug, Deserialize)]
struct RawLineComment {
    #[serde(rename = "theUser", deserialize_with = "loose_string")]
    user: String,
    #[serde(default, deserialize_with = "loose_string")]
    nickname: String,
    #[serde(default, deserialize_with = "loose_string")]
    tsukkomi_content: String,
    #[serde(rename = "addTime", default, deserialize_with = "loose_string")]
    add_time: String,
}

fn parse_line_comments(payload: &Value) -> Result<Vec<LineComment>> {
    let list = payload
        .pointer("/data/data")
        .ok_or_else(|| SiteError::extraction("line comments", "missing `data.data` list"))?;
    let raw = Vec::<RawLineComment>::deserialize(list)
        .map_err(|err| SiteError::extraction("line comments", err.to_string()))?;
    Ok(raw
        .into_iter()
        .map(|comment| LineComment {
            user_id: comment.user,
            user_name: comment.nickname,
            content: comment.tsukkomi_content,
            add_time: comment.add_time,
        })
        .collect())
}

fn loose_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn loose_u32<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    match Value::deserialize(de)? {
        Value::Number(value) => value
            .as_u64()
            .and_then(|value| u32::try_from(value).ok())
            .ok_or_else(|| D::Error::custom(format!("{value} is not a u32"))),
        Value::String(value) if value.trim().is_empty() => Ok(0),
        Value::String(value) => value
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("{value:?} is not a u32"))),
        Value::Null => Ok(0),
        other => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}
