use std::str::FromStr;

use crate::error::SearchError;
use crate::search::predicate::{Expr, Op, OrderTerm};

/// Result orders accepted by the list search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Default,
    Imported,
    Added,
    Edited,
    Updated,
    Archived,
    Relevance,
    Duration,
    Size,
    Newest,
    Oldest,
    Similar,
    Name,
    Title,
    Random,
}

impl FromStr for SortOrder {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => SortOrder::Default,
            "imported" => SortOrder::Imported,
            "added" => SortOrder::Added,
            "edited" => SortOrder::Edited,
            "updated" => SortOrder::Updated,
            "archived" => SortOrder::Archived,
            "relevance" => SortOrder::Relevance,
            "duration" => SortOrder::Duration,
            "size" => SortOrder::Size,
            "newest" => SortOrder::Newest,
            "oldest" => SortOrder::Oldest,
            "similar" => SortOrder::Similar,
            "name" => SortOrder::Name,
            "title" => SortOrder::Title,
            "random" => SortOrder::Random,
            other => return Err(SearchError::BadSortOrder(other.to_string())),
        })
    }
}

/// Unique key that closes every list order so pages never overlap.
pub const TIEBREAKER: &str = "files.id";

impl SortOrder {
    /// Order terms for the list search. `labeled` is set when a label filter
    /// joined `photos_labels`.
    pub fn terms(&self, labeled: bool) -> Vec<OrderTerm> {
        use OrderTerm::{Asc, Desc};
        let mut terms = match self {
            SortOrder::Default | SortOrder::Imported | SortOrder::Added => vec![Desc("photos.created_at")],
            SortOrder::Edited => vec![Desc("photos.edited_at")],
            SortOrder::Updated => vec![Desc("photos.updated_at")],
            SortOrder::Archived => vec![Desc("photos.deleted_at")],
            SortOrder::Relevance if labeled => vec![Desc("photos.photo_quality"), Asc("photos_labels.uncertainty"), Desc("photos.taken_at")],
            SortOrder::Relevance => vec![Desc("photos.photo_quality"), Desc("photos.taken_at")],
            SortOrder::Duration => vec![Desc("photos.photo_duration"), Desc("photos.taken_at")],
            SortOrder::Size => vec![Desc("files.file_size"), Desc("photos.taken_at")],
            SortOrder::Newest => vec![Desc("photos.taken_at")],
            SortOrder::Oldest => vec![Asc("photos.taken_at")],
            SortOrder::Similar => vec![Asc("photos.photo_color"), Asc("photos.cell_id"), Asc("files.file_diff"), Asc("files.photo_id")],
            SortOrder::Name => vec![Asc("photos.photo_path"), Asc("photos.photo_name")],
            SortOrder::Title => vec![Asc("photos.photo_title"), Asc("photos.photo_name")],
            SortOrder::Random => vec![OrderTerm::Random],
        };
        terms.push(Desc(TIEBREAKER));
        terms
    }

    /// Predicates an order needs to be meaningful.
    pub fn predicates(&self) -> Vec<Expr> {
        match self {
            SortOrder::Edited => vec![Expr::not_null("photos.edited_at")],
            SortOrder::Updated => vec![Expr::columns("photos.updated_at", Op::Gt, "photos.created_at")],
            SortOrder::Similar => vec![Expr::gt("files.file_diff", 0)],
            _ => Vec::new(),
        }
    }
}
