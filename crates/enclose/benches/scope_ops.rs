//! Scope Operations Benchmarks
//!
//! Benchmarks for XPath parsing and evaluation, and for entering nested
//! `within` blocks against the in-memory driver.
//!
//! Run with: `cargo bench --bench scope_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use enclose::dom::Dom;
use enclose::prelude::*;
use enclose::xpath;

fn list_page(items: usize) -> String {
    let mut html = String::from("<html><body><div id=\"for_bar\"><ul>");
    for i in 0..items {
        html.push_str(&format!("<li>Item {i}: <a href=\"/item/{i}\">Go</a></li>"));
    }
    html.push_str("</ul></div></body></html>");
    html
}

fn nested_page(levels: usize) -> String {
    let mut html = String::from("<html><body>");
    for level in 0..levels {
        html.push_str(&format!("<div class=\"level\"><span>level {level}</span>"));
    }
    html.push_str(&"</div>".repeat(levels));
    html.push_str("</body></html>");
    html
}

fn form_page(fields: usize) -> String {
    let mut html = String::from("<html><body><form action=\"/form\" method=\"post\">");
    for i in 0..fields {
        html.push_str(&format!(
            "<p><label for=\"field_{i}\">Field {i}</label>\
             <input type=\"text\" id=\"field_{i}\" name=\"field_{i}\"></p>"
        ));
    }
    html.push_str("</form></body></html>");
    html
}

fn session(page: String) -> Session {
    let mut session = Session::new(MemoryDriver::new(Router::new().page("/", page)))
        .with_default_selector(DefaultSelector::isolated(SelectorKind::XPath));
    session.visit("/").unwrap();
    session
}

fn bench_xpath_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("xpath_parsing");

    let expressions = vec![
        ("id", "//div[@id='for_bar']"),
        ("contains", "//li[contains(., 'With Simple HTML')]"),
        ("relative", ".//li[contains(.,'Bar')]"),
        ("position", "//ul/li[last()]"),
        ("union", ".//input[@type='submit'] | .//button"),
        ("label", ".//input[@id=//label[contains(normalize-space(.), 'Name')]/@for]"),
    ];

    for (name, expression) in expressions {
        group.bench_with_input(BenchmarkId::from_parameter(name), &expression, |bench, expr| {
            bench.iter(|| {
                let parsed = xpath::parser::parse(black_box(expr)).unwrap();
                black_box(parsed);
            });
        });
    }

    group.finish();
}

fn bench_xpath_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("xpath_select");

    for items in [10, 100, 1000] {
        let html = scraper::Html::parse_document(&list_page(items));
        let dom = Dom::new(&html);
        let locator = format!("//li[contains(., 'Item {}:')]", items - 1);
        group.bench_with_input(BenchmarkId::from_parameter(items), &locator, |bench, loc| {
            bench.iter(|| {
                let found = xpath::select(&dom, None, black_box(loc)).unwrap();
                black_box(found);
            });
        });
    }

    group.finish();
}

fn bench_within_nesting(c: &mut Criterion) {
    let mut group = c.benchmark_group("within_nesting");

    fn descend(session: &mut Session, remaining: usize) -> EncloseResult<usize> {
        if remaining == 0 {
            return Ok(session.scope_depth());
        }
        session.within(".//div[@class='level']", |s| descend(s, remaining - 1))
    }

    for depth in [1, 4, 16] {
        let mut session = session(nested_page(depth));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |bench, &d| {
            bench.iter(|| {
                let reached = descend(&mut session, black_box(d)).unwrap();
                black_box(reached);
            });
        });
    }

    group.finish();
}

fn bench_scoped_click_link(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoped_click_link");

    for items in [10, 100] {
        let page = list_page(items);
        let app = Router::new()
            .page("/", page)
            .get("/item/0", |_| Response::Html("<p>done</p>".into()));
        let mut session = Session::new(MemoryDriver::new(app))
            .with_default_selector(DefaultSelector::isolated(SelectorKind::XPath));
        group.bench_with_input(BenchmarkId::from_parameter(items), &items, |bench, _| {
            bench.iter(|| {
                session.visit("/").unwrap();
                session
                    .within("//li[contains(., 'Item 0:')]", |s| s.click_link("Go"))
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_fill_in_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_in_scaling");

    for fields in [100, 200, 400, 800] {
        let mut session = session(form_page(fields));
        let locator = format!("Field {}", fields - 1);
        group.bench_with_input(BenchmarkId::from_parameter(fields), &locator, |bench, loc| {
            bench.iter(|| {
                session.fill_in(black_box(loc), "value").unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fill_in_scaling,
    bench_xpath_parsing,
    bench_xpath_select,
    bench_within_nesting,
    bench_scoped_click_link
);
criterion_main!(benches);
