//! Defensive helpers shared by site adapters.
//!
//! Upstream markup is versionless, so every lookup either tolerates absence
//! (returning an empty value) or reports an `Extraction` error naming the
//! selector that stopped matching. Adapters choose per field which applies.

use std::sync::LazyLock;

use base64::Engine as _;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::error::{Result, SiteError};
use crate::formats::LockState;

/// Class that marks a list row as layout filler rather than data.
pub const SEPARATOR_CLASS: &str = "clear";

/// Class a chapter row carries while it still has to be bought.
pub const LOCKED_CLASS: &str = "lock_fill";

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| SiteError::extraction(css, format!("bad selector: {err}")))
}

pub fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Result<Option<ElementRef<'a>>> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).next())
}

pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).collect())
}

pub fn require_first<'a>(scope: ElementRef<'a>, css: &str, context: &str) -> Result<ElementRef<'a>> {
    select_first(scope, css)?
        .ok_or_else(|| SiteError::extraction(context, format!("no element matches `{css}`")))
}

pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}

/// Trimmed text of the first match, or an empty string when nothing matches.
pub fn first_text(scope: ElementRef<'_>, css: &str) -> Result<String> {
    Ok(select_first(scope, css)?.map(text_of).unwrap_or_default())
}

pub fn first_attr(scope: ElementRef<'_>, css: &str, attr: &str) -> Result<Option<String>> {
    Ok(select_first(scope, css)?
        .and_then(|el| el.value().attr(attr))
        .map(|value| value.trim().to_owned()))
}

pub fn require_attr(el: ElementRef<'_>, attr: &str, context: &str) -> Result<String> {
    el.value()
        .attr(attr)
        .map(|value| value.trim().to_owned())
        .ok_or_else(|| {
            SiteError::extraction(
                context,
                format!("<{}> has no `{attr}` attribute", el.value().name()),
            )
        })
}

/// Last path segment of a link, ignoring any query or fragment.
pub fn id_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    let last = path.rsplit('/').next()?.trim();
    (!last.is_empty()).then(|| last.to_owned())
}

pub fn is_void_link(href: &str) -> bool {
    let compact = href.trim().trim_end_matches(';').to_ascii_lowercase();
    compact == "javascript:void(0)" || compact == "javascript:;" || compact.is_empty()
}

/// Neighbor chapter id behind a navigation control; void links mean "none".
pub fn nav_target(href: Option<&str>) -> Option<String> {
    let href = href?;
    if is_void_link(href) {
        return None;
    }
    id_from_href(href)
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|value| value.split_whitespace().any(|token| token == class))
}

pub fn is_separator_row(el: ElementRef<'_>) -> bool {
    has_class(el, SEPARATOR_CLASS)
}

/// No class at all means free; the locked marker as the first class means
/// locked; any other class means already bought.
pub fn lock_state_from_class(class: Option<&str>) -> LockState {
    match class.and_then(|value| value.split_whitespace().next()) {
        None => LockState::Free,
        Some(LOCKED_CLASS) => LockState::Locked,
        Some(_) => LockState::Unlocked,
    }
}

static CHAPTER_TOKEN_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"MemberSingleChapter.+?;").expect("chapter token pattern compiles")
});

/// Mines the per-request chapter token out of inline script text.
///
/// The token is the value between the last two double quotes of the last
/// `MemberSingleChapter...;` statement on the page. Returns `None` when the
/// page no longer carries that statement.
pub fn mine_chapter_token(page: &str) -> Option<String> {
    let statement = CHAPTER_TOKEN_ASSIGNMENT.find_iter(page).last()?.as_str();
    let mut quoted = statement.rsplit('"');
    quoted.next()?;
    let token = quoted.next()?;
    if statement.matches('"').count() < 2 || token.is_empty() {
        return None;
    }
    Some(token.to_owned())
}

pub fn decode_paragraph(encoded: &str) -> Result<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|err| SiteError::extraction("chapter paragraph", format!("bad base64: {err}")))?;
    let text = String::from_utf8(bytes).map_err(|err| {
        SiteError::extraction("chapter paragraph", format!("not utf-8 after decode: {err}"))
    })?;
    Ok(text)
}

/// Total page count from a page-info block: the third `em` from the end.
/// An absent block means an empty result set.
pub fn page_count(scope: ElementRef<'_>, page_info_css: &str) -> Result<u32> {
    let Some(info) = select_first(scope, page_info_css)? else {
        return Ok(0);
    };
    let ems = select_all(info, "em")?;
    if ems.is_empty() {
        return Ok(0);
    }
    let Some(idx) = ems.len().checked_sub(3) else {
        return Err(SiteError::extraction(
            page_info_css,
            format!("expected at least 3 <em>, found {}", ems.len()),
        ));
    };
    let raw = text_of(ems[idx]);
    raw.parse::<u32>().map_err(|_| {
        SiteError::extraction(page_info_css, format!("page count is not a number: {raw:?}"))
    })
}
