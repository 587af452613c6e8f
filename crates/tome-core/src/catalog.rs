//! The catalog query engine.
//!
//! Turns the full book list plus a browse query (search text, category,
//! price bracket, sort order) into the ordered result set and the category
//! facets shown by the storefront. Pure and synchronous: no I/O, no errors.
//! Unrecognised bracket or sort strings fall back to their defaults.

use std::{cmp::Ordering, collections::BTreeSet};

use icu_collator::{Collator, CollatorOptions, Strength};
use serde::Serialize;

use crate::book::Book;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

// ─── Price brackets ──────────────────────────────────────────────────────────

/// A price range filter.
///
/// The two middle brackets are closed at both ends, so a price of exactly 10,
/// 25 or 50 falls into two neighbouring brackets. The storefront has always
/// behaved this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceBracket {
  #[default]
  All,
  /// `price < 10`
  Under10,
  /// `10 <= price <= 25`
  From10To25,
  /// `25 <= price <= 50`
  From25To50,
  /// `price > 50`
  Over50,
}

impl PriceBracket {
  /// Parse a query-string value; anything unrecognised means [`Self::All`].
  pub fn parse_lenient(s: &str) -> Self {
    match s {
      "under10" => Self::Under10,
      "10to25" => Self::From10To25,
      "25to50" => Self::From25To50,
      "over50" => Self::Over50,
      _ => Self::All,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::All => "all",
      Self::Under10 => "under10",
      Self::From10To25 => "10to25",
      Self::From25To50 => "25to50",
      Self::Over50 => "over50",
    }
  }

  pub fn contains(self, price: f64) -> bool {
    match self {
      Self::All => true,
      Self::Under10 => price < 10.0,
      Self::From10To25 => (10.0..=25.0).contains(&price),
      Self::From25To50 => (25.0..=50.0).contains(&price),
      Self::Over50 => price > 50.0,
    }
  }
}

// ─── Sort keys ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
  #[default]
  Title,
  Author,
  PriceLow,
  PriceHigh,
  Newest,
}

impl SortKey {
  /// Parse a query-string value; anything unrecognised means [`Self::Title`].
  pub fn parse_lenient(s: &str) -> Self {
    match s {
      "author" => Self::Author,
      "price-low" => Self::PriceLow,
      "price-high" => Self::PriceHigh,
      "newest" => Self::Newest,
      _ => Self::Title,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Title => "title",
      Self::Author => "author",
      Self::PriceLow => "price-low",
      Self::PriceHigh => "price-high",
      Self::Newest => "newest",
    }
  }

  fn compare(self, a: &Book, b: &Book, collator: Option<&Collator>) -> Ordering {
    match self {
      Self::Title => compare_text(collator, &a.title, &b.title),
      Self::Author => compare_text(collator, &a.author, &b.author),
      Self::PriceLow => a.price.total_cmp(&b.price),
      Self::PriceHigh => b.price.total_cmp(&a.price),
      Self::Newest => b.created_at.cmp(&a.created_at),
    }
  }
}

/// Root-locale collation at secondary strength: accented letters sort with
/// their base letter and case is ignored.
fn text_collator() -> Option<Collator> {
  let mut options = CollatorOptions::new();
  options.strength = Some(Strength::Secondary);
  Collator::try_new(&Default::default(), options).ok()
}

/// Collated ordering; strings that collate equal are ordered by their raw
/// form so the result does not depend on input order.
fn compare_text(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
  let collated = match collator {
    Some(collator) => collator.compare(a, b),
    None => a
      .chars()
      .flat_map(char::to_lowercase)
      .cmp(b.chars().flat_map(char::to_lowercase)),
  };
  collated.then_with(|| a.cmp(b))
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`query`].
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
  /// Case-insensitive substring matched against title, author and
  /// description. Empty or absent matches everything.
  pub text:     Option<String>,
  /// Exact category; `"all"` or empty means no filter.
  pub category: Option<String>,
  pub price:    PriceBracket,
  pub sort:     SortKey,
}

impl CatalogQuery {
  fn needle(&self) -> Option<String> {
    self
      .text
      .as_deref()
      .filter(|t| !t.is_empty())
      .map(str::to_lowercase)
  }

  fn category_filter(&self) -> Option<&str> {
    self
      .category
      .as_deref()
      .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
  }

  /// How many of the category and price filters are set. Search text is
  /// not counted.
  pub fn active_filters(&self) -> usize {
    [self.category_filter().is_some(), self.price != PriceBracket::All]
      .into_iter()
      .filter(|active| *active)
      .count()
  }

  fn matches(&self, book: &Book, needle: Option<&str>) -> bool {
    let text_ok = needle.is_none_or(|n| {
      book.title.to_lowercase().contains(n)
        || book.author.to_lowercase().contains(n)
        || book
          .description
          .as_deref()
          .is_some_and(|d| d.to_lowercase().contains(n))
    });
    let category_ok = self.category_filter().is_none_or(|c| book.category == c);

    text_ok && category_ok && self.price.contains(book.price)
  }
}

/// The output of [`query`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
  pub results:          Vec<Book>,
  /// Distinct categories of the whole catalog, sorted; unaffected by filters.
  pub facet_categories: Vec<String>,
  /// Size of the unfiltered catalog.
  pub total:            usize,
  pub active_filters:   usize,
}

/// Filter, sort and facet `all_books` according to `params`.
///
/// The sort is stable: books with equal keys keep their input order.
pub fn query(all_books: &[Book], params: &CatalogQuery) -> CatalogPage {
  let needle = params.needle();

  let mut results: Vec<Book> = all_books
    .iter()
    .filter(|b| params.matches(b, needle.as_deref()))
    .cloned()
    .collect();
  let collator = matches!(params.sort, SortKey::Title | SortKey::Author)
    .then(text_collator)
    .flatten();
  results.sort_by(|a, b| params.sort.compare(a, b, collator.as_ref()));

  CatalogPage {
    results,
    facet_categories: facet_categories(all_books),
    total: all_books.len(),
    active_filters: params.active_filters(),
  }
}

/// Sorted distinct categories present in `books`.
pub fn facet_categories(books: &[Book]) -> Vec<String> {
  books
    .iter()
    .map(|b| b.category.as_str())
    .collect::<BTreeSet<_>>()
    .into_iter()
    .map(str::to_owned)
    .collect()
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Summary figures for the admin console.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
  pub total_books:   usize,
  pub in_stock:      usize,
  pub categories:    usize,
  /// Zero for an empty catalog.
  pub average_price: f64,
}

impl CatalogStats {
  pub fn compute(books: &[Book]) -> Self {
    let total_books = books.len();
    let average_price = if total_books == 0 {
      0.0
    } else {
      books.iter().map(|b| b.price).sum::<f64>() / total_books as f64
    };

    Self {
      total_books,
      in_stock: books.iter().filter(|b| b.in_stock).count(),
      categories: facet_categories(books).len(),
      average_price,
    }
  }
}
