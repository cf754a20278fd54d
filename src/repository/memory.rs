//! In-process entity store.
//!
//! Mirrors the Postgres schema: the same unique and foreign-key constraint names are
//! reported as `AppError::Integrity`, and deletes follow `relations`.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    relations::{
        DeletePolicy, Relation, ACCOUNT_REFERENCES, AUTHOR_REFERENCES, BOOK_AUTHOR, BOOK_GENRES,
        BOOK_REFERENCES, GENRE_BOOKS, GENRE_REFERENCES, SHELF_BOOKS, SHELF_ENTRIES, SHELF_OWNER,
        SHELF_REFERENCES,
    },
    AccountStore, AuthorStore, BookStore, BookshelfStore, CatalogStore, GenreStore,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        Account, Author, AuthorRecord, AuthorRef, Book, BookMediaField, BookRecord, Bookshelf,
        Genre, GenreRecord,
    },
};

#[derive(Debug, Default)]
struct Sequences {
    author: i32,
    genre: i32,
    book: i32,
    bookshelf: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct Tables {
    seq: Sequences,
    accounts: BTreeMap<i32, Account>,
    authors: BTreeMap<i32, Author>,
    genres: BTreeMap<i32, Genre>,
    /// Stored without relations; see `Tables::hydrate`
    books: BTreeMap<i32, Book>,
    /// (book_id, genre_id)
    book_genres: BTreeSet<(i32, i32)>,
    bookshelves: BTreeMap<i32, Bookshelf>,
    /// (bookshelf_id, book_id)
    bookshelf_books: BTreeSet<(i32, i32)>,
}

fn integrity(constraint: &str) -> AppError {
    AppError::Integrity(constraint.to_string())
}

fn page<T>(rows: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

fn restrict(relation: &Relation, referenced: bool) -> AppResult<()> {
    if referenced {
        return Err(AppError::Conflict(format!(
            "Still referenced through {}",
            relation.name
        )));
    }
    Ok(())
}

impl Tables {
    fn hydrate(&self, book: &Book) -> Book {
        let mut book = book.clone();
        book.author = book
            .author_id
            .and_then(|id| self.authors.get(&id))
            .map(Author::to_ref);
        let mut genres: Vec<Genre> = self
            .book_genres
            .iter()
            .filter(|(book_id, _)| *book_id == book.id)
            .filter_map(|(_, genre_id)| self.genres.get(genre_id).cloned())
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        book.genres = genres;
        book
    }

    fn sorted_books<'a>(&self, books: impl Iterator<Item = &'a Book>) -> Vec<Book> {
        let mut rows: Vec<Book> = books.map(|b| self.hydrate(b)).collect();
        rows.sort_by(|a, b| {
            a.title
                .cmp(&b.title)
                .then(a.author_id.cmp(&b.author_id))
                .then(a.id.cmp(&b.id))
        });
        rows
    }

    fn check_author(&self, id: Option<i32>, record: &AuthorRecord) -> AppResult<()> {
        let others = self.authors.values().filter(|a| Some(a.id) != id);
        for other in others {
            if other.first_name == record.first_name && other.last_name == record.last_name {
                return Err(integrity("authors_name_key"));
            }
            if other.slug == record.slug {
                return Err(integrity("authors_slug_key"));
            }
        }
        if matches!(record.date_of_death, Some(death) if death < record.date_of_birth) {
            return Err(integrity("authors_lifespan_check"));
        }
        Ok(())
    }

    fn check_genre(&self, id: Option<i32>, record: &GenreRecord) -> AppResult<()> {
        for other in self.genres.values().filter(|g| Some(g.id) != id) {
            if other.name == record.name {
                return Err(integrity("genres_name_key"));
            }
            if other.slug == record.slug {
                return Err(integrity("genres_slug_key"));
            }
        }
        Ok(())
    }

    fn check_book(&self, id: Option<i32>, record: &BookRecord) -> AppResult<()> {
        for other in self.books.values().filter(|b| Some(b.id) != id) {
            if other.title == record.title {
                return Err(integrity("books_title_key"));
            }
            if other.slug == record.slug {
                return Err(integrity("books_slug_key"));
            }
        }
        if let Some(author_id) = record.author_id {
            if !self.authors.contains_key(&author_id) {
                return Err(integrity("books_author_id_fkey"));
            }
        }
        if !(0..=5).contains(&record.rating) {
            return Err(integrity("books_rating_check"));
        }
        if record.genre_ids.iter().any(|g| !self.genres.contains_key(g)) {
            return Err(integrity("book_genres_genre_id_fkey"));
        }
        Ok(())
    }

    fn replace_genres(&mut self, book_id: i32, genre_ids: &[i32]) {
        self.book_genres.retain(|(b, _)| *b != book_id);
        self.book_genres
            .extend(genre_ids.iter().map(|genre_id| (book_id, *genre_id)));
    }

    /// Link-table relations cannot be nullified; their columns are part of the key
    fn release_links(
        links: &mut BTreeSet<(i32, i32)>,
        relation: &Relation,
        matches: impl Fn(&(i32, i32)) -> bool,
    ) -> AppResult<()> {
        match relation.policy {
            DeletePolicy::Cascade => {
                links.retain(|link| !matches(link));
                Ok(())
            }
            DeletePolicy::Restrict => restrict(relation, links.iter().any(matches)),
            DeletePolicy::Nullify => Err(AppError::Internal(format!(
                "Relation {} cannot be nullified",
                relation.name
            ))),
        }
    }

    fn release(&mut self, relation: &Relation, id: i32) -> AppResult<()> {
        match *relation {
            r if r == BOOK_AUTHOR => match r.policy {
                DeletePolicy::Nullify => {
                    let now = Utc::now();
                    for book in self.books.values_mut().filter(|b| b.author_id == Some(id)) {
                        book.author_id = None;
                        book.updated_at = now;
                    }
                    Ok(())
                }
                DeletePolicy::Restrict => {
                    restrict(&r, self.books.values().any(|b| b.author_id == Some(id)))
                }
                DeletePolicy::Cascade => {
                    let ids: Vec<i32> = self
                        .books
                        .values()
                        .filter(|b| b.author_id == Some(id))
                        .map(|b| b.id)
                        .collect();
                    for book_id in ids {
                        self.delete_book(book_id)?;
                    }
                    Ok(())
                }
            },
            r if r == BOOK_GENRES => {
                Self::release_links(&mut self.book_genres, &r, |(book_id, _)| *book_id == id)
            }
            r if r == GENRE_BOOKS => {
                Self::release_links(&mut self.book_genres, &r, |(_, genre_id)| *genre_id == id)
            }
            r if r == SHELF_BOOKS => {
                Self::release_links(&mut self.bookshelf_books, &r, |(_, book_id)| *book_id == id)
            }
            r if r == SHELF_ENTRIES => {
                Self::release_links(&mut self.bookshelf_books, &r, |(shelf_id, _)| *shelf_id == id)
            }
            r if r == SHELF_OWNER => {
                let owned = self.bookshelves.values().any(|s| s.account_id == id);
                match r.policy {
                    DeletePolicy::Cascade => {
                        self.bookshelves.retain(|_, s| s.account_id != id);
                        Ok(())
                    }
                    DeletePolicy::Restrict => restrict(&r, owned),
                    DeletePolicy::Nullify => Err(AppError::Internal(format!(
                        "Relation {} cannot be nullified",
                        r.name
                    ))),
                }
            }
            r => Err(AppError::Internal(format!("Unknown relation {}", r.name))),
        }
    }

    fn release_all(&mut self, relations: &[Relation], id: i32) -> AppResult<()> {
        for relation in relations {
            self.release(relation, id)?;
        }
        Ok(())
    }

    fn delete_book(&mut self, id: i32) -> AppResult<()> {
        if !self.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        self.release_all(BOOK_REFERENCES, id)?;
        self.books.remove(&id);
        Ok(())
    }
}

/// Entity store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AuthorStore for MemoryStore {
    async fn author_count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.authors.len() as i64)
    }

    async fn author_list(&self, offset: i64, limit: i64) -> AppResult<Vec<Author>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Author> = tables.authors.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.first_name
                .cmp(&b.first_name)
                .then(a.last_name.cmp(&b.last_name))
                .then(a.id.cmp(&b.id))
        });
        Ok(page(rows, offset, limit))
    }

    async fn author_choices(&self) -> AppResult<Vec<AuthorRef>> {
        Ok(self
            .author_list(0, i64::MAX)
            .await?
            .iter()
            .map(Author::to_ref)
            .collect())
    }

    async fn author_get_by_id(&self, id: i32) -> AppResult<Author> {
        self.tables
            .read()
            .await
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    async fn author_get_by_slug(&self, slug: &str) -> AppResult<Author> {
        self.tables
            .read()
            .await
            .authors
            .values()
            .find(|a| a.slug == slug)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", slug)))
    }

    async fn author_name_taken(
        &self,
        first_name: &str,
        last_name: &str,
        exclude: Option<i32>,
    ) -> AppResult<bool> {
        Ok(self.tables.read().await.authors.values().any(|a| {
            a.first_name == first_name && a.last_name == last_name && Some(a.id) != exclude
        }))
    }

    async fn author_create(&self, record: &AuthorRecord) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        tables.check_author(None, record)?;

        let now = Utc::now();
        let author = Author {
            id: next(&mut tables.seq.author),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            slug: record.slug.clone(),
            date_of_birth: record.date_of_birth,
            date_of_death: record.date_of_death,
            about: record.about.clone(),
            image: None,
            created_at: now,
            updated_at: now,
        };
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn author_update(&self, id: i32, record: &AuthorRecord) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&id) {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }
        tables.check_author(Some(id), record)?;

        let author = tables
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;
        author.first_name = record.first_name.clone();
        author.last_name = record.last_name.clone();
        author.slug = record.slug.clone();
        author.date_of_birth = record.date_of_birth;
        author.date_of_death = record.date_of_death;
        author.about = record.about.clone();
        author.updated_at = Utc::now();
        Ok(author.clone())
    }

    async fn author_set_image(&self, id: i32, image: Option<&str>) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let author = tables
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))?;
        author.image = image.map(str::to_string);
        author.updated_at = Utc::now();
        Ok(())
    }

    async fn author_delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&id) {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }
        tables.release_all(AUTHOR_REFERENCES, id)?;
        tables.authors.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl GenreStore for MemoryStore {
    async fn genre_count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.genres.len() as i64)
    }

    async fn genre_list(&self) -> AppResult<Vec<Genre>> {
        let mut rows: Vec<Genre> = self.tables.read().await.genres.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn genre_get_by_slug(&self, slug: &str) -> AppResult<Genre> {
        self.tables
            .read()
            .await
            .genres
            .values()
            .find(|g| g.slug == slug)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", slug)))
    }

    async fn genre_get_many(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Genre> = ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| tables.genres.get(id).cloned())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn genre_name_taken(&self, name: &str, exclude: Option<i32>) -> AppResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .genres
            .values()
            .any(|g| g.name == name && Some(g.id) != exclude))
    }

    async fn genre_create(&self, record: &GenreRecord) -> AppResult<Genre> {
        let mut tables = self.tables.write().await;
        tables.check_genre(None, record)?;
        let genre = Genre {
            id: next(&mut tables.seq.genre),
            name: record.name.clone(),
            slug: record.slug.clone(),
        };
        tables.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }

    async fn genre_update(&self, id: i32, record: &GenreRecord) -> AppResult<Genre> {
        let mut tables = self.tables.write().await;
        if !tables.genres.contains_key(&id) {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }
        tables.check_genre(Some(id), record)?;
        let genre = Genre {
            id,
            name: record.name.clone(),
            slug: record.slug.clone(),
        };
        tables.genres.insert(id, genre.clone());
        Ok(genre)
    }

    async fn genre_delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.genres.contains_key(&id) {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }
        tables.release_all(GENRE_REFERENCES, id)?;
        tables.genres.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn book_count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.books.len() as i64)
    }

    async fn book_list(&self, offset: i64, limit: i64) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(page(tables.sorted_books(tables.books.values()), offset, limit))
    }

    async fn book_count_by_author(&self, author_id: i32) -> AppResult<i64> {
        Ok(self
            .tables
            .read()
            .await
            .books
            .values()
            .filter(|b| b.author_id == Some(author_id))
            .count() as i64)
    }

    async fn book_list_by_author(
        &self,
        author_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        let rows = tables.sorted_books(
            tables
                .books
                .values()
                .filter(|b| b.author_id == Some(author_id)),
        );
        Ok(page(rows, offset, limit))
    }

    async fn book_get_by_id(&self, id: i32) -> AppResult<Book> {
        let tables = self.tables.read().await;
        tables
            .books
            .get(&id)
            .map(|b| tables.hydrate(b))
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    async fn book_get_by_slug(&self, slug: &str) -> AppResult<Book> {
        let tables = self.tables.read().await;
        tables
            .books
            .values()
            .find(|b| b.slug == slug)
            .map(|b| tables.hydrate(b))
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", slug)))
    }

    async fn book_title_taken(&self, title: &str, exclude: Option<i32>) -> AppResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .books
            .values()
            .any(|b| b.title == title && Some(b.id) != exclude))
    }

    async fn book_create(&self, record: &BookRecord) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        tables.check_book(None, record)?;

        let now = Utc::now();
        let book = Book {
            id: next(&mut tables.seq.book),
            title: record.title.clone(),
            slug: record.slug.clone(),
            author_id: record.author_id,
            about: record.about.clone(),
            rating: record.rating,
            link_to_file: None,
            image: None,
            created_at: now,
            updated_at: now,
            author: None,
            genres: Vec::new(),
        };
        tables.books.insert(book.id, book.clone());
        tables.replace_genres(book.id, &record.genre_ids);
        Ok(tables.hydrate(&book))
    }

    async fn book_update(&self, id: i32, record: &BookRecord) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        tables.check_book(Some(id), record)?;

        let book = tables
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        book.title = record.title.clone();
        book.slug = record.slug.clone();
        book.author_id = record.author_id;
        book.about = record.about.clone();
        book.rating = record.rating;
        book.updated_at = Utc::now();
        let book = book.clone();

        tables.replace_genres(id, &record.genre_ids);
        Ok(tables.hydrate(&book))
    }

    async fn book_set_media(
        &self,
        id: i32,
        field: BookMediaField,
        path: Option<&str>,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let book = tables
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        let value = path.map(str::to_string);
        match field {
            BookMediaField::Image => book.image = value,
            BookMediaField::File => book.link_to_file = value,
        }
        book.updated_at = Utc::now();
        Ok(())
    }

    async fn book_delete(&self, id: i32) -> AppResult<()> {
        self.tables.write().await.delete_book(id)
    }
}

#[async_trait]
impl BookshelfStore for MemoryStore {
    async fn bookshelf_get(&self, account_id: i32) -> AppResult<Option<Bookshelf>> {
        Ok(self
            .tables
            .read()
            .await
            .bookshelves
            .values()
            .find(|s| s.account_id == account_id)
            .cloned())
    }

    async fn bookshelf_get_or_create(&self, account_id: i32) -> AppResult<Bookshelf> {
        let mut tables = self.tables.write().await;
        if let Some(shelf) = tables
            .bookshelves
            .values()
            .find(|s| s.account_id == account_id)
        {
            return Ok(shelf.clone());
        }
        if !tables.accounts.contains_key(&account_id) {
            return Err(integrity("bookshelves_account_id_fkey"));
        }
        let shelf = Bookshelf {
            id: next(&mut tables.seq.bookshelf),
            account_id,
            created_at: Utc::now(),
        };
        tables.bookshelves.insert(shelf.id, shelf.clone());
        Ok(shelf)
    }

    async fn bookshelf_count_books(&self, shelf_id: i32) -> AppResult<i64> {
        Ok(self
            .tables
            .read()
            .await
            .bookshelf_books
            .iter()
            .filter(|(s, _)| *s == shelf_id)
            .count() as i64)
    }

    async fn bookshelf_list_books(
        &self,
        shelf_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        let books = tables
            .bookshelf_books
            .iter()
            .filter(|(s, _)| *s == shelf_id)
            .filter_map(|(_, book_id)| tables.books.get(book_id));
        Ok(page(tables.sorted_books(books), offset, limit))
    }

    async fn bookshelf_contains(&self, shelf_id: i32, book_id: i32) -> AppResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .bookshelf_books
            .contains(&(shelf_id, book_id)))
    }

    async fn bookshelf_add_book(&self, shelf_id: i32, book_id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.bookshelves.contains_key(&shelf_id) {
            return Err(integrity("bookshelf_books_bookshelf_id_fkey"));
        }
        if !tables.books.contains_key(&book_id) {
            return Err(integrity("bookshelf_books_book_id_fkey"));
        }
        tables.bookshelf_books.insert((shelf_id, book_id));
        Ok(())
    }

    async fn bookshelf_remove_book(&self, shelf_id: i32, book_id: i32) -> AppResult<bool> {
        Ok(self
            .tables
            .write()
            .await
            .bookshelf_books
            .remove(&(shelf_id, book_id)))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn account_get(&self, id: i32) -> AppResult<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn account_upsert(&self, id: i32, username: &str) -> AppResult<Account> {
        let mut tables = self.tables.write().await;
        let account = tables.accounts.entry(id).or_insert_with(|| Account {
            id,
            username: username.to_string(),
            created_at: Utc::now(),
        });
        account.username = username.to_string();
        Ok(account.clone())
    }

    async fn account_delete(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&id) {
            return Ok(false);
        }
        let shelf_ids: Vec<i32> = tables
            .bookshelves
            .values()
            .filter(|s| s.account_id == id)
            .map(|s| s.id)
            .collect();
        for shelf_id in shelf_ids {
            tables.release_all(SHELF_REFERENCES, shelf_id)?;
        }
        tables.release_all(ACCOUNT_REFERENCES, id)?;
        tables.accounts.remove(&id);
        Ok(true)
    }
}
