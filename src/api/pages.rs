//! サーバーが直接返すHTMLページ
//!
//! 画面の操作は`static/app.js`が`/api`を呼び出して行う。

use crate::domain::CurrentUser;
use html_escape::{encode_double_quoted_attribute, encode_text};

pub fn login_page(error: Option<&str>, next: &str) -> String {
    let error = error
        .map(|message| format!(r#"<p class="error">{}</p>"#, encode_text(message)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Library - Login</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<main class="login">
<h1>Library</h1>
{error}
<form method="post" action="/login">
<input type="hidden" name="next" value="{next}">
<label>Username <input name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit">Log in</button>
</form>
</main>
</body>
</html>
"#,
        next = encode_double_quoted_attribute(next),
    )
}

/// 書籍一覧・登録・編集・削除・貸出・返却・履歴の画面
pub fn index_page(user: &CurrentUser) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Library</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header>
<h1>Library</h1>
<p>Signed in as <strong>{username}</strong>
<a href="/swagger-ui/">API docs</a>
<a href="/logout">Log out</a></p>
</header>

<section>
<h2>New book</h2>
<form id="form-new-book">
<input name="title" placeholder="Title" required>
<input name="author" placeholder="Author" required>
<input name="year" type="number" placeholder="Year" required>
<button type="submit">Add</button>
</form>
</section>

<section>
<h2>Catalog</h2>
<input id="search-input" type="search" placeholder="Search title or author">
<p id="message" role="status"></p>
<table id="books-table">
<thead><tr>
<th data-sort-by="id">ID</th>
<th data-sort-by="title">Title</th>
<th data-sort-by="author">Author</th>
<th data-sort-by="year">Year</th>
<th>Status</th>
<th>Actions</th>
</tr></thead>
<tbody id="books"></tbody>
</table>
<nav class="pager">
<button id="prev-page" type="button">Previous</button>
<span id="page-info"></span>
<button id="next-page" type="button">Next</button>
</nav>
</section>

<dialog id="edit-dialog">
<form id="form-edit-book" method="dialog">
<h2>Edit book</h2>
<input type="hidden" name="id">
<label>Title <input name="title" required></label>
<label>Author <input name="author" required></label>
<label>Year <input name="year" type="number" required></label>
<button type="submit" value="save">Save</button>
<button type="button" class="close-button">Cancel</button>
</form>
</dialog>

<dialog id="loan-dialog">
<form id="form-loan" method="dialog">
<h2>Lend <span id="loan-book-title"></span></h2>
<input type="hidden" name="book_id">
<label>Borrower <input name="borrower_name" required></label>
<button type="submit" value="lend">Lend</button>
<button type="button" class="close-button">Cancel</button>
</form>
</dialog>

<dialog id="history-dialog">
<h2>Loan history: <span id="history-book-title"></span></h2>
<table>
<thead><tr><th>Borrower</th><th>Loaned</th><th>Returned</th><th></th></tr></thead>
<tbody id="history"></tbody>
</table>
<button type="button" class="close-button">Close</button>
</dialog>

<script src="/static/app.js"></script>
</body>
</html>
"#,
        username = encode_text(&user.username),
    )
}
