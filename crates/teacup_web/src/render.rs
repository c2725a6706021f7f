//! HTML pages.
//!
//! Pages are assembled from strings around a single layout. Every piece of
//! article or user text goes through [`escape_html`] first.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use std::fmt::Write;
use teacup_core::{Article, Page, SearchWindow};
use url::form_urlencoded;

const WEEKDAYS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

pub const TOP_TITLE: &str = "トップ";
pub const DETAIL_TITLE: &str = "投稿詳細";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escape `text` and turn its newlines into `<br>`.
pub fn break_line(text: &str) -> String {
    escape_html(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// `2021-03-01(月) 09:15:00`
pub fn weekday(timestamp: &NaiveDateTime) -> String {
    let day = WEEKDAYS[timestamp.weekday().num_days_from_sunday() as usize];
    format!("{}({}) {}", timestamp.format("%Y-%m-%d"), day, timestamp.format("%H:%M:%S"))
}

pub fn month_title(year: i32, month: u32) -> String {
    format!("{}年{}月", year, month)
}

fn layout(title: &str, body: &str) -> String {
    let title = escape_html(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
<header>
<h1><a href="/">teacup</a></h1>
<form action="/search" method="get">
<input type="search" name="q" placeholder="since:2010-06-01 until:2022-07-31 by:name title:word">
<button type="submit">検索</button>
</form>
</header>
<main>
<h2>{title}</h2>
{body}
</main>
</body>
</html>
"#
    )
}

fn article_summary(out: &mut String, article: &Article) {
    let _ = write!(
        out,
        r#"<article class="entry">
<h3><a href="/post/{id}">{title}</a></h3>
<p class="meta">{author} <span class="addr">{addr}</span> {created}</p>
<div class="body">{body}</div>
</article>
"#,
        id = escape_html(&article.id),
        title = escape_html(&article.title),
        author = escape_html(&article.author_name),
        addr = escape_html(&article.author_remote_addr),
        created = weekday(&article.created_at),
        body = break_line(&article.body),
    );
}

fn article_list(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "<p>該当する投稿はありません。</p>\n".to_string();
    }
    let mut out = String::new();
    for article in articles {
        article_summary(&mut out, article);
    }
    out
}

/// Month links covering the search window, newest first.
fn month_links(window: &SearchWindow) -> String {
    let parse = |value: &str| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
    let (Some(since), Some(until)) = (parse(&window.since), parse(&window.until)) else {
        return String::new();
    };

    let mut out = String::from("<ul class=\"months\">\n");
    let first = since.with_day(1).unwrap_or(since);
    let mut cursor = until.with_day(1).unwrap_or(until);
    while cursor >= first {
        let _ = writeln!(
            out,
            r#"<li><a href="/{y}/{m}">{label}</a></li>"#,
            y = cursor.year(),
            m = cursor.month(),
            label = month_title(cursor.year(), cursor.month()),
        );
        match cursor.checked_sub_months(Months::new(1)) {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    out.push_str("</ul>\n");
    out
}

pub fn top_page(window: &SearchWindow) -> String {
    layout(TOP_TITLE, &month_links(window))
}

pub fn month_page(year: i32, month: u32, articles: &[Article]) -> String {
    layout(&month_title(year, month), &article_list(articles))
}

pub fn detail_page(article: &Article) -> String {
    let mut body = String::new();
    article_summary(&mut body, article);
    layout(DETAIL_TITLE, &body)
}

pub fn pagination_message(page: &Page<Article>) -> String {
    format!("{}件の結果。{}から{}件目を表示中", page.total, page.start(), page.end())
}

fn search_link(query: &str, page: usize) -> String {
    let params = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", query)
        .append_pair("page", &page.to_string())
        .finish();
    format!("/search?{}", params)
}

fn pagination_nav(query: &str, page: &Page<Article>) -> String {
    let mut nav = String::from("<nav class=\"pagination\">\n");
    if page.has_prev() {
        let _ = writeln!(nav, r#"<a rel="prev" href="{}">&laquo;</a>"#, escape_html(&search_link(query, page.page - 1)));
    }
    for n in 1..=page.page_count() {
        if n == page.page {
            let _ = writeln!(nav, r#"<span class="current">{}</span>"#, n);
        } else {
            let _ = writeln!(nav, r#"<a href="{}">{}</a>"#, escape_html(&search_link(query, n)), n);
        }
    }
    if page.has_next() {
        let _ = writeln!(nav, r#"<a rel="next" href="{}">&raquo;</a>"#, escape_html(&search_link(query, page.page + 1)));
    }
    nav.push_str("</nav>\n");
    nav
}

pub fn search_page(query: &str, page: &Page<Article>) -> String {
    let mut body = format!("<p class=\"summary\">{}</p>\n", pagination_message(page));
    body.push_str(&pagination_nav(query, page));
    body.push_str(&article_list(&page.items));
    body.push_str(&pagination_nav(query, page));
    layout(query, &body)
}

pub fn error_page(status: u16, message: &str) -> String {
    layout(&format!("エラー {}", status), &format!("<p>{}</p>\n", escape_html(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teacup_core::TIMESTAMP_FORMAT;

    fn article(id: &str, body: &str) -> Article {
        Article {
            id: id.to_string(),
            title: "<b>title</b>".to_string(),
            author_name: "alice".to_string(),
            author_remote_addr: "203.0.113.9".to_string(),
            body: body.to_string(),
            created_at: NaiveDateTime::parse_from_str("2021-03-01 09:15:00", TIMESTAMP_FORMAT).unwrap(),
        }
    }

    #[test]
    fn test_weekday_format() {
        let ts = NaiveDateTime::parse_from_str("2021-03-01 09:15:00", TIMESTAMP_FORMAT).unwrap();
        assert_eq!(weekday(&ts), "2021-03-01(月) 09:15:00");
        let sunday = NaiveDateTime::parse_from_str("2022-07-31 23:00:00", TIMESTAMP_FORMAT).unwrap();
        assert_eq!(weekday(&sunday), "2022-07-31(日) 23:00:00");
    }

    #[test]
    fn test_break_line_escapes_first() {
        assert_eq!(break_line("a<script>\nb\r\nc"), "a&lt;script&gt;<br>b<br>c");
    }

    #[test]
    fn test_detail_page_escapes_article_text() {
        let html = detail_page(&article("1", "x & y"));
        assert!(html.contains("&lt;b&gt;title&lt;/b&gt;"));
        assert!(html.contains("x &amp; y"));
        assert!(html.contains(DETAIL_TITLE));
        assert!(!html.contains("<b>title</b>"));
    }

    #[test]
    fn test_month_links_cover_window() {
        let html = top_page(&SearchWindow::new("2021-11-15", "2022-02-01"));
        assert!(html.contains(r#"href="/2022/2""#));
        assert!(html.contains(r#"href="/2021/11""#));
        assert!(!html.contains(r#"href="/2021/10""#));
        assert!(html.find("/2022/2").unwrap() < html.find("/2021/11").unwrap());
    }

    #[test]
    fn test_month_links_skip_unparsable_window() {
        let html = top_page(&SearchWindow::new("someday", "2022-02-01"));
        assert!(!html.contains("class=\"months\""));
    }

    #[test]
    fn test_search_page_pagination() {
        let articles: Vec<Article> = (0..30).map(|i| article(&i.to_string(), "hello")).collect();
        let page = Page::new(articles, 2);
        assert_eq!(pagination_message(&page), "30件の結果。26から30件目を表示中");

        let html = search_page("hello by:alice", &page);
        assert!(html.contains("<title>hello by:alice</title>"));
        assert!(html.contains("/search?q=hello+by%3Aalice&amp;page=1"));
        assert!(!html.contains("rel=\"next\""));
    }
}
