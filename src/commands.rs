use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Context as _;
use serde::Serialize;

use crate::adapter::{RankQuery, SiteAdapter};
use crate::cli::{Command, SessionArgs};
use crate::config::ClientConfig;
use crate::error::SiteError;
use crate::formats::{BookDetail, ShelfCredential, ShelfId};
use crate::registry::Registry;
use crate::session::SessionManager;

#[derive(Debug, Serialize)]
struct SiteListing<'a> {
    name: &'a str,
    base_url: &'a str,
}

/// Runs one command and writes its result to `out` as pretty JSON.
pub fn run(args: SessionArgs, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    let registry = Registry::builtin();

    if let Command::Sites = command {
        let sites = registry
            .sites()
            .map(|entry| SiteListing {
                name: entry.name,
                base_url: entry.base_url.as_str(),
            })
            .collect::<Vec<_>>();
        return write_json(out, &sites);
    }

    let config = ClientConfig::from_env().context("read client config")?;
    let credential = credential(args)?;
    let manager = SessionManager::new(registry, config);
    let session = manager.get_session(credential)?;
    let mut adapter = session.adapter();

    dispatch(&mut **adapter, command, out)
}

fn credential(args: SessionArgs) -> Result<ShelfCredential, SiteError> {
    let account = args
        .account
        .filter(|account| !account.trim().is_empty())
        .ok_or_else(|| SiteError::validation("account", "required (--account or NOVELSHELF_ACCOUNT)"))?;
    let password = args
        .password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| {
            SiteError::validation("password", "required (--password or NOVELSHELF_PASSWORD)")
        })?;
    Ok(ShelfCredential {
        shelf_id: ShelfId::new(args.shelf_id),
        site_url: args.site,
        account,
        password,
    })
}

fn dispatch(
    adapter: &mut dyn SiteAdapter,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::Sites => anyhow::bail!("`sites` does not act on a shelf"),
        Command::Shelf => write_json(out, &adapter.get_shelf()?),
        Command::Wallet => write_json(out, &adapter.get_wallet()?),
        Command::Rank(args) => {
            let query = RankQuery {
                rank_type: args.rank,
                period: args.period,
                page: args.page,
            };
            write_json(out, &adapter.get_rank(&query)?)
        }
        Command::Search(args) => write_json(out, &adapter.search_book(&args.keyword, args.page)?),
        Command::Book {
            book_id,
            lock_codes: false,
        } => write_json(out, &adapter.get_book(&book_id)?),
        Command::Book {
            book_id,
            lock_codes: true,
        } => write_json(out, &legacy_lock_codes(&adapter.get_book(&book_id)?)),
        Command::Favorite { book_id } => write_json(out, &adapter.favorite_toggle(&book_id)?),
        Command::Buy {
            book_id,
            chapter_id,
        } => write_json(out, &adapter.buy_chapter(&book_id, &chapter_id)?),
        Command::Chapter { chapter_id } => write_json(out, &adapter.get_chapter(&chapter_id)?),
        Command::Comments(args) => write_json(
            out,
            &adapter.get_line_comments(&args.chapter_id, args.count, args.index)?,
        ),
        Command::Comment(args) => write_json(
            out,
            &adapter.send_line_comment(
                &args.book_id,
                &args.chapter_id,
                args.index,
                &args.line,
                &args.comment,
            )?,
        ),
    }
}

fn legacy_lock_codes(book: &BookDetail) -> BTreeMap<&str, i8> {
    book.chapter_lock
        .iter()
        .map(|(chapter_id, state)| (chapter_id.as_str(), state.code()))
        .collect()
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("write json output")?;
    writeln!(out).context("write json output")?;
    Ok(())
}
