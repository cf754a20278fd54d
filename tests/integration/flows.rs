//! Access-gated flows, cascades and pagination

use axum::http::StatusCode;

use readme_catalog::{
    error::SAVE_FAILED,
    models::{author::AUTHOR_EXISTS, genre::GENRE_EXISTS, Action, Capability, Entity},
};

use crate::helpers::{Part, TestApp};

const BOOK_FIELDS: [(&str, &str); 2] = [("title", "Мастер и Маргарита"), ("about", "Роман")];

#[tokio::test]
async fn should_redirect_anonymous_book_create_to_login() {
    let app = TestApp::new();

    let response = app.post_form("/books/add_book", None, &BOOK_FIELDS).await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/users/login/?next=/books/add_book");
    assert_eq!(app.book_count().await, 0);
}

#[tokio::test]
async fn should_forbid_book_create_without_permission() {
    let app = TestApp::new();
    let token = app.token_with(vec![Capability::new(Entity::Author, Action::Add)]);

    let response = app.post_form("/books/add_book", Some(&token), &BOOK_FIELDS).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.book_count().await, 0);
}

#[tokio::test]
async fn should_create_exactly_one_book_with_permission() {
    let app = TestApp::new();
    let token = app.token_with(vec![Capability::new(Entity::Book, Action::Add)]);

    let response = app.post_form("/books/add_book", Some(&token), &BOOK_FIELDS).await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/book/master-i-margarita");
    assert_eq!(app.book_count().await, 1);
}

#[tokio::test]
async fn should_check_permission_before_looking_up_the_book() {
    let app = TestApp::new();
    let token = app.user_token(7);

    let response = app.get("/book/missing/edit", Some(&token)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn should_render_add_book_form_with_choices() {
    let app = TestApp::new();
    app.create_author("Михаил", "Булгаков").await;
    app.create_genre("Роман").await;

    let response = app.get("/books/add_book", Some(&app.admin_token())).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title_name"], "Добавить книгу");
    assert_eq!(response.body["authors"].as_array().map(Vec::len), Some(1));
    assert_eq!(response.body["genres"][0]["name"], "Роман");
}

#[tokio::test]
async fn should_report_missing_fields() {
    let app = TestApp::new();

    let response = app
        .post_form("/books/add_book", Some(&app.admin_token()), &[("about", "Роман")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["fields"]["title"][0], "Обязательное поле.");
    assert_eq!(app.book_count().await, 0);
}

#[tokio::test]
async fn should_reject_duplicate_author() {
    let app = TestApp::new();
    app.create_author("Имя_тест", "Фамилия_тест").await;

    let response = app
        .post_form(
            "/authors/add_author",
            Some(&app.admin_token()),
            &[
                ("first_name", "Имя_тест"),
                ("last_name", "Фамилия_тест"),
                ("date_of_birth", "1998-03-03"),
                ("about", "Снова"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["non_field_errors"][0], AUTHOR_EXISTS);
    assert_eq!(app.author_count().await, 1);
}

#[tokio::test]
async fn should_reject_duplicate_genre() {
    let app = TestApp::new();
    app.create_genre("test_genre").await;

    let response = app
        .post_form("/books/add_genre", Some(&app.admin_token()), &[("name", "test_genre")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["fields"]["name"][0], GENRE_EXISTS);
    assert_eq!(app.genre_count().await, 1);
}

#[tokio::test]
async fn should_fail_save_when_book_titles_share_a_slug() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.create_book(&[("title", "War & Peace"), ("about", "Роман")]).await;

    let response = app
        .post_form(
            "/books/add_book",
            Some(&token),
            &[("title", "War, Peace"), ("about", "Другой роман")],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["non_field_errors"][0], SAVE_FAILED);
    assert_eq!(app.book_count().await, 1);
}

#[tokio::test]
async fn should_fail_save_when_author_names_share_a_slug() {
    let app = TestApp::new();
    app.create_author("Анна Мария", "Иванова").await;

    let response = app
        .post_form(
            "/authors/add_author",
            Some(&app.admin_token()),
            &[
                ("first_name", "Анна"),
                ("last_name", "Мария Иванова"),
                ("date_of_birth", "1998-03-03"),
                ("about", "Другой автор"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["non_field_errors"][0], SAVE_FAILED);
    assert_eq!(app.author_count().await, 1);
}

#[tokio::test]
async fn should_fail_save_when_genre_names_share_a_slug() {
    let app = TestApp::new();
    app.create_genre("Sci-Fi").await;

    let response = app
        .post_form("/books/add_genre", Some(&app.admin_token()), &[("name", "Sci Fi")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["non_field_errors"][0], SAVE_FAILED);
    assert_eq!(app.genre_count().await, 1);
}

#[tokio::test]
async fn should_keep_books_when_their_author_is_deleted() {
    let app = TestApp::new();
    let (author_id, author_slug) = app.create_author("Лев", "Толстой").await;
    let author_id = author_id.to_string();
    let book_slug = app
        .create_book(&[
            ("title", "Война и мир"),
            ("about", "Роман-эпопея"),
            ("author", &author_id),
        ])
        .await;

    let response = app
        .post_form(&format!("/author/{}/delete", author_slug), Some(&app.admin_token()), &[])
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/authors/");

    let detail = app.get(&format!("/book/{}", book_slug), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert!(detail.body["book"]["author_id"].is_null());
    assert!(detail.body["book"]["author"].is_null());
    assert_eq!(app.book_count().await, 1);
    assert_eq!(app.author_count().await, 0);
}

#[tokio::test]
async fn should_show_at_most_three_genres() {
    let app = TestApp::new();
    let mut ids = Vec::new();
    for name in ["Драма", "Антиутопия", "Вестерн", "Готика", "Басня"] {
        ids.push(app.create_genre(name).await.to_string());
    }
    let mut fields = vec![("title", "Сборник"), ("about", "Всё сразу")];
    for id in &ids {
        fields.push(("genres", id.as_str()));
    }
    let slug = app.create_book(&fields).await;

    let detail = app.get(&format!("/book/{}", slug), None).await;
    assert_eq!(detail.body["book"]["genres"].as_array().map(Vec::len), Some(5));
    assert_eq!(detail.body["display_genre"], "Антиутопия, Басня, Вестерн");

    let list = app.get("/books/", None).await;
    assert_eq!(list.body["page"]["items"][0]["genres"], "Антиутопия, Басня, Вестерн");
}

#[tokio::test]
async fn should_move_book_image_when_title_changes() {
    let app = TestApp::new();
    let token = app.admin_token();
    let response = app
        .post_multipart(
            "/books/add_book",
            Some(&token),
            &[
                Part::Text("title", "Old Title"),
                Part::Text("about", "About"),
                Part::File("image", "cover.png", b"png bytes"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND, "{:?}", response.body);

    let detail = app.get("/book/old-title", None).await;
    let old_path = detail.body["book"]["image"].as_str().expect("image").to_string();
    let id = detail.body["book"]["id"].as_i64().expect("id");
    assert_eq!(old_path, format!("books/{}/old-title.png", id));
    assert!(app.media.path().join(&old_path).exists());

    let response = app
        .post_form(
            "/book/old-title/edit",
            Some(&token),
            &[("title", "New Title"), ("about", "About")],
        )
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/book/new-title");

    let detail = app.get("/book/new-title", None).await;
    let new_path = detail.body["book"]["image"].as_str().expect("image").to_string();
    assert_eq!(new_path, format!("books/{}/new-title.png", id));
    assert!(app.media.path().join(&new_path).exists());
    assert!(!app.media.path().join(&old_path).exists());
    assert_eq!(app.get("/book/old-title", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_remove_deleted_book_from_bookshelves() {
    let app = TestApp::new();
    let slug = app.create_book(&BOOK_FIELDS).await;
    let reader = app.user_token(10);

    let response = app.post_form(&format!("/book/{}", slug), Some(&reader), &[]).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), format!("/book/{}", slug));

    let detail = app.get(&format!("/book/{}", slug), Some(&reader)).await;
    assert_eq!(detail.body["on_bookshelf"], true);
    let shelf = app.get("/bookshelf/", Some(&reader)).await;
    assert_eq!(shelf.body["page"]["total"], 1);

    let response = app
        .post_form(&format!("/book/{}/delete", slug), Some(&app.admin_token()), &[])
        .await;
    assert_eq!(response.location(), "/books/");

    let shelf = app.get("/bookshelf/", Some(&reader)).await;
    assert_eq!(shelf.body["page"]["total"], 0);
    assert_eq!(app.book_count().await, 0);
}

#[tokio::test]
async fn should_remove_book_from_bookshelf() {
    let app = TestApp::new();
    let slug = app.create_book(&BOOK_FIELDS).await;
    let reader = app.user_token(11);
    app.post_form(&format!("/book/{}", slug), Some(&reader), &[]).await;

    let response = app
        .post_form(&format!("/bookshelf/{}/remove", slug), Some(&reader), &[])
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/bookshelf/");
    let shelf = app.get("/bookshelf/", Some(&reader)).await;
    assert_eq!(shelf.body["page"]["total"], 0);
    assert_eq!(app.book_count().await, 1);
}

#[tokio::test]
async fn should_delete_bookshelf_with_account() {
    let app = TestApp::new();
    let slug = app.create_book(&BOOK_FIELDS).await;
    let reader = app.user_token(12);
    app.post_form(&format!("/book/{}", slug), Some(&reader), &[]).await;
    assert!(app
        .state
        .services
        .repository
        .bookshelf_get(12)
        .await
        .unwrap()
        .is_some());

    let response = app.post_form("/users/profile/delete/", Some(&reader), &[]).await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/");
    assert!(app
        .state
        .services
        .repository
        .bookshelf_get(12)
        .await
        .unwrap()
        .is_none());
    assert_eq!(app.book_count().await, 1);
}

#[tokio::test]
async fn should_not_mark_books_on_shelf_for_anonymous_visitors() {
    let app = TestApp::new();
    let slug = app.create_book(&BOOK_FIELDS).await;

    let detail = app.get(&format!("/book/{}", slug), None).await;

    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["title_name"], "Мастер и Маргарита");
    assert_eq!(detail.body["on_bookshelf"], false);
}

#[tokio::test]
async fn should_clamp_out_of_range_pages() {
    let app = TestApp::new();
    for i in 0..7 {
        let title = format!("Книга {}", i);
        app.create_book(&[("title", &title), ("about", "Текст")]).await;
    }

    let first = app.get("/books/?page=abc", None).await;
    assert_eq!(first.body["page"]["number"], 1);
    assert_eq!(first.body["page"]["items"].as_array().map(Vec::len), Some(5));
    assert_eq!(first.body["page"]["has_next"], true);

    let last = app.get("/books/?page=99", None).await;
    assert_eq!(last.body["page"]["number"], 2);
    assert_eq!(last.body["page"]["num_pages"], 2);
    assert_eq!(last.body["page"]["items"].as_array().map(Vec::len), Some(2));

    let zero = app.get("/books/?page=0", None).await;
    assert_eq!(zero.body["page"]["number"], 1);
}

#[tokio::test]
async fn should_list_author_books_on_detail_page() {
    let app = TestApp::new();
    let (author_id, slug) = app.create_author("Фёдор", "Достоевский").await;
    let author_id = author_id.to_string();
    app.create_book(&[("title", "Идиот"), ("about", "Роман"), ("author", &author_id)])
        .await;
    app.create_book(&BOOK_FIELDS).await;

    let detail = app.get(&format!("/author/{}", slug), None).await;

    assert_eq!(detail.body["title_name"], "Фёдор Достоевский");
    assert_eq!(detail.body["books"]["total"], 1);
    assert_eq!(detail.body["books"]["items"][0]["title"], "Идиот");
}

#[tokio::test]
async fn should_send_genre_edits_back_to_genre_list() {
    let app = TestApp::new();
    app.create_genre("Поэзия").await;
    let token = app.admin_token();

    let response = app
        .post_form("/genre/poeziia/edit", Some(&token), &[("name", "Лирика")])
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/genres/");

    let response = app.post_form("/genre/lirika/delete", Some(&token), &[]).await;
    assert_eq!(response.location(), "/genres/");
    assert_eq!(app.genre_count().await, 0);
}

#[tokio::test]
async fn should_show_catalog_counts_on_index() {
    let app = TestApp::new();
    app.create_author("Антон", "Чехов").await;
    app.create_book(&BOOK_FIELDS).await;

    let index = app.get("/", None).await;

    assert_eq!(index.body["title_name"], "Главная страница");
    assert_eq!(index.body["num_books"], 1);
    assert_eq!(index.body["num_authors"], 1);
}
