//! What happens to referencing rows when a referenced row is deleted.
//!
//! Both store backends read these tables instead of relying on database cascades,
//! so the memory store and Postgres agree on every delete.

/// Action applied to referencing rows when their target is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Delete the referencing rows too
    Cascade,
    /// Clear the reference and keep the row
    Nullify,
    /// Refuse the delete while references exist
    Restrict,
}

/// A reference from `table.column` to the row being deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub table: &'static str,
    pub column: &'static str,
    pub policy: DeletePolicy,
}

/// Books keep existing without their author
pub const BOOK_AUTHOR: Relation = Relation {
    name: "book.author",
    table: "books",
    column: "author_id",
    policy: DeletePolicy::Nullify,
};

/// Genre links of a deleted book
pub const BOOK_GENRES: Relation = Relation {
    name: "book.genres",
    table: "book_genres",
    column: "book_id",
    policy: DeletePolicy::Cascade,
};

/// Book links of a deleted genre
pub const GENRE_BOOKS: Relation = Relation {
    name: "genre.books",
    table: "book_genres",
    column: "genre_id",
    policy: DeletePolicy::Cascade,
};

/// Shelf entries of a deleted book
pub const SHELF_BOOKS: Relation = Relation {
    name: "bookshelf.books",
    table: "bookshelf_books",
    column: "book_id",
    policy: DeletePolicy::Cascade,
};

/// Entries of a deleted shelf
pub const SHELF_ENTRIES: Relation = Relation {
    name: "bookshelf.entries",
    table: "bookshelf_books",
    column: "bookshelf_id",
    policy: DeletePolicy::Cascade,
};

/// Shelf of a deleted account
pub const SHELF_OWNER: Relation = Relation {
    name: "bookshelf.owner",
    table: "bookshelves",
    column: "account_id",
    policy: DeletePolicy::Cascade,
};

/// References released, in order, before an author row is removed
pub const AUTHOR_REFERENCES: &[Relation] = &[BOOK_AUTHOR];
pub const GENRE_REFERENCES: &[Relation] = &[GENRE_BOOKS];
pub const BOOK_REFERENCES: &[Relation] = &[BOOK_GENRES, SHELF_BOOKS];
pub const SHELF_REFERENCES: &[Relation] = &[SHELF_ENTRIES];
pub const ACCOUNT_REFERENCES: &[Relation] = &[SHELF_OWNER];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_delete_never_cascades_to_books() {
        assert_eq!(BOOK_AUTHOR.policy, DeletePolicy::Nullify);
    }

    #[test]
    fn book_delete_clears_shelves_and_genre_links() {
        assert!(BOOK_REFERENCES
            .iter()
            .all(|r| r.policy == DeletePolicy::Cascade));
        assert!(BOOK_REFERENCES.contains(&SHELF_BOOKS));
    }
}
