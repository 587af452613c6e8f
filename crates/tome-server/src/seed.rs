//! The sample catalog loaded into an empty store.

use tome_core::{book::NewBook, store::CatalogStore};

struct Sample {
  title:       &'static str,
  author:      &'static str,
  description: &'static str,
  price:       f64,
  category:    &'static str,
  year:        i32,
  pages:       u32,
  in_stock:    bool,
}

#[rustfmt::skip]
const SAMPLES: &[Sample] = &[
  Sample {
    title: "Pride and Prejudice", author: "Jane Austen",
    description: "Elizabeth Bennet and Mr. Darcy trade first impressions for second thoughts in Regency England.",
    price: 12.99, category: "Classic", year: 1813, pages: 432, in_stock: true,
  },
  Sample {
    title: "The Count of Monte Cristo", author: "Alexandre Dumas",
    description: "A wrongly imprisoned sailor escapes the Château d'If, finds a fortune and plans his revenge.",
    price: 18.99, category: "Adventure", year: 1844, pages: 1276, in_stock: true,
  },
  Sample {
    title: "Wuthering Heights", author: "Emily Brontë",
    description: "Heathcliff and Catherine's love turns to ruin across two generations on the Yorkshire moors.",
    price: 11.99, category: "Romance", year: 1847, pages: 416, in_stock: true,
  },
  Sample {
    title: "The Picture of Dorian Gray", author: "Oscar Wilde",
    description: "A young man stays beautiful while his portrait records every sin.",
    price: 10.99, category: "Fiction", year: 1890, pages: 254, in_stock: true,
  },
  Sample {
    title: "Jane Eyre", author: "Charlotte Brontë",
    description: "An orphaned governess uncovers the secret kept in the attic of Thornfield Hall.",
    price: 13.99, category: "Romance", year: 1847, pages: 500, in_stock: true,
  },
  Sample {
    title: "Frankenstein", author: "Mary Shelley",
    description: "Victor Frankenstein builds a living creature and then abandons it.",
    price: 9.99, category: "Science Fiction", year: 1818, pages: 280, in_stock: true,
  },
  Sample {
    title: "The Mysteries of Udolpho", author: "Ann Radcliffe",
    description: "Emily St. Aubert is held in a sinister Apennine castle full of apparent hauntings.",
    price: 15.99, category: "Mystery", year: 1794, pages: 632, in_stock: false,
  },
  Sample {
    title: "Great Expectations", author: "Charles Dickens",
    description: "The orphan Pip rises to gentility on money from an unknown benefactor.",
    price: 14.99, category: "Classic", year: 1861, pages: 544, in_stock: true,
  },
  Sample {
    title: "The Scarlet Letter", author: "Nathaniel Hawthorne",
    description: "Hester Prynne wears the scarlet A through the judgement of Puritan Boston.",
    price: 8.99, category: "Fiction", year: 1850, pages: 272, in_stock: true,
  },
  Sample {
    title: "Dracula", author: "Bram Stoker",
    description: "Van Helsing and his companions hunt the Count from Transylvania to Whitby and back.",
    price: 12.99, category: "Fantasy", year: 1897, pages: 418, in_stock: true,
  },
  Sample {
    title: "Les Misérables", author: "Victor Hugo",
    description: "Jean Valjean remakes his life while Inspector Javert refuses to let him go.",
    price: 24.99, category: "History", year: 1862, pages: 1488, in_stock: true,
  },
  Sample {
    title: "The Canterbury Tales", author: "Geoffrey Chaucer",
    description: "Pilgrims bound for Canterbury pass the road with stories from every rank of society.",
    price: 16.99, category: "Poetry", year: 1400, pages: 504, in_stock: true,
  },
];

impl Sample {
  fn to_new_book(&self) -> NewBook {
    NewBook {
      description:    Some(self.description.to_owned()),
      price:          self.price,
      category:       self.category.to_owned(),
      published_year: Some(self.year),
      pages:          Some(self.pages),
      in_stock:       self.in_stock,
      ..NewBook::new(self.title, self.author)
    }
  }
}

/// The built-in sample catalog.
pub fn sample_books() -> Vec<NewBook> {
  SAMPLES.iter().map(Sample::to_new_book).collect()
}

/// Insert the sample catalog if the store holds no books.
///
/// Returns the number of books inserted: zero when the catalog was already
/// populated.
pub async fn seed_if_empty<S>(store: &S) -> Result<usize, S::Error>
where
  S: CatalogStore,
{
  let existing = store.list_books().await?.len();
  if existing > 0 {
    tracing::info!(existing, "catalog already populated, skipping seed");
    return Ok(0);
  }

  let books = sample_books();
  let count = books.len();
  for book in books {
    store.create_book(book).await?;
  }
  tracing::info!(count, "seeded sample catalog");
  Ok(count)
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use tome_store_sqlite::SqliteStore;

  use super::*;

  #[tokio::test]
  async fn seeds_an_empty_catalog_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    assert_eq!(seed_if_empty(&store).await.unwrap(), 12);
    assert_eq!(seed_if_empty(&store).await.unwrap(), 0);
    assert_eq!(store.list_books().await.unwrap().len(), 12);
  }

  #[tokio::test]
  async fn populated_catalog_is_left_alone() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .create_book(NewBook::new("Emma", "Jane Austen"))
      .await
      .unwrap();

    assert_eq!(seed_if_empty(&store).await.unwrap(), 0);
    assert_eq!(store.list_books().await.unwrap().len(), 1);
  }

  #[test]
  fn samples_span_the_storefront_categories() {
    let books = sample_books();
    let categories: BTreeSet<&str> =
      books.iter().map(|b| b.category.as_str()).collect();

    assert_eq!(books.len(), 12);
    assert_eq!(categories.len(), 9);
    assert_eq!(books.iter().filter(|b| !b.in_stock).count(), 1);
  }
}
