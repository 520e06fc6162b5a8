use clap::{Args, Parser, Subcommand};

use crate::adapter::{RankPeriod, RankType};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Who to act as. Every command except `sites` needs an account and password.
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Base URL of the site; must match a registered adapter.
    #[arg(
        long,
        global = true,
        env = "NOVELSHELF_SITE",
        default_value = crate::sites::youdu::BASE_URL
    )]
    pub site: String,

    #[arg(long, global = true, env = "NOVELSHELF_ACCOUNT")]
    pub account: Option<String>,

    #[arg(
        long,
        global = true,
        env = "NOVELSHELF_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Shelf id the session is cached under.
    #[arg(long, global = true, env = "NOVELSHELF_SHELF_ID", default_value = "cli")]
    pub shelf_id: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the sites this build has adapters for.
    Sites,
    /// Books on the account's shelf.
    Shelf,
    /// Ticket and currency balances.
    Wallet,
    Rank(RankArgs),
    Search(SearchArgs),
    /// Book metadata and table of contents.
    Book {
        book_id: String,

        /// Print only the chapter id -> legacy lock code map (-1 free, 0 bought, 1 locked).
        #[arg(long)]
        lock_codes: bool,
    },
    /// Favorite a book, or unfavorite it when it already is one.
    Favorite {
        book_id: String,
    },
    Buy {
        book_id: String,
        chapter_id: String,
    },
    /// Decoded chapter text with neighbor chapter ids.
    Chapter {
        chapter_id: String,
    },
    /// Comments attached to one paragraph of a chapter.
    Comments(CommentsArgs),
    /// Attach a comment to one paragraph of a chapter.
    Comment(CommentArgs),
}

#[derive(Debug, Args)]
pub struct RankArgs {
    /// favo, subscribe, recommendeds, hit, pushtickets or monthlytickets.
    #[arg(long, default_value = "favo")]
    pub rank: RankType,

    /// week, month or all.
    #[arg(long, default_value = "week")]
    pub period: RankPeriod,

    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub keyword: String,

    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args)]
pub struct CommentsArgs {
    pub chapter_id: String,

    /// Paragraph index within the chapter.
    #[arg(long, default_value_t = 0)]
    pub index: u32,

    /// Maximum comments to return.
    #[arg(long, default_value_t = 10)]
    pub count: u32,
}

#[derive(Debug, Args)]
pub struct CommentArgs {
    pub book_id: String,

    pub chapter_id: String,

    pub comment: String,

    #[arg(long, default_value_t = 0)]
    pub index: u32,

    /// Text of the paragraph being commented on.
    #[arg(long, default_value = "")]
    pub line: String,
}
