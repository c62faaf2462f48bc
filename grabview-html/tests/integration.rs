//! Page objects over a small fixture document.

use std::sync::Arc;

use grabview_core::{SchemaError, Value};
use grabview_html::{
    Document, Field, PageSchema, as_attr, inner_text, list, nested, parse_href, stripped,
};

const HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Fixture</title></head>
<body>
  <p>  Hello, world!  </p>
  <a class="test-url" href="https://www.python.org/">Python</a>
  <img class="test-img" src="https://www.python.org/static/img/python-logo@2x.png" alt="Python logo">
  <ul>
    <li>Alpha</li>
    <li> Beta </li>
    <li>Gamma</li>
  </ul>
  <div class="languages">
    <div><a href="http://ada">Ada</a><a href="https://java">Java</a></div>
    <div><a href="http://cpp">C++</a></div>
    <div><a href="http://cobol">Cobol</a></div>
    <div><a href="http://d">D</a><a href="http://go">Go</a></div>
  </div>
</body>
</html>"#;

const LANGUAGES: [&str; 6] = ["Ada", "Java", "C++", "Cobol", "D", "Go"];
const LANGUAGE_HREFS: [&str; 6] = [
    "http://ada",
    "https://java",
    "http://cpp",
    "http://cobol",
    "http://d",
    "http://go",
];

fn link(href: &str, label: &str) -> Value {
    Value::map([("href", href), ("label", label)])
}

fn language1() -> Arc<PageSchema> {
    PageSchema::builder("Language1")
        .field("href", Field::select("a").then(as_attr("href")).many())
        .field("label", Field::select("a").then(inner_text()).many())
        .build()
        .unwrap()
}

fn language2() -> Arc<PageSchema> {
    PageSchema::builder("Language2")
        .field("href", Field::this().then(as_attr("href")))
        .field("label", Field::this().then(inner_text()))
        .build()
        .unwrap()
}

fn page_object() -> Arc<PageSchema> {
    PageSchema::builder("PageObject")
        .field("paragraph", Field::select("p").then(inner_text()).then(stripped()))
        .field("link", Field::href(".test-url"))
        .field("image", Field::image(".test-img"))
        .field("items", Field::select("ul > li").then(inner_text()).then(stripped()).many())
        .field("languages", Field::select(".languages a").then(inner_text()).many())
        .field("languages_1", Field::select(".languages").then(nested(language1())))
        .field("languages_2", Field::select(".languages a").then(nested(language2())).many())
        .field(
            "languages_3",
            Field::select(".languages > div")
                .then(list(Field::select("a").then(nested(language2())).many()))
                .many(),
        )
        .field("_invisible", Field::select(".languages a").then(inner_text()).many())
        .property("custom_field", |page| {
            let invisible = page.get("_invisible")?;
            let picked = invisible
                .as_items()
                .unwrap_or_default()
                .iter()
                .enumerate()
                .filter(|(idx, _)| matches!(*idx, 1 | 2 | 4))
                .map(|(_, v)| v.clone())
                .collect::<Vec<_>>();
            Ok(Value::Seq(picked))
        })
        .nested("Language2", language2())
        .build()
        .unwrap()
}

#[test]
fn paragraph() {
    let doc = Document::parse(HTML);
    let page = doc.page(&page_object());
    assert_eq!(page.get("paragraph").unwrap(), Value::from("Hello, world!"));
}

#[test]
fn link_field() {
    let doc = Document::parse(HTML);
    let page = doc.page(&page_object());
    assert_eq!(page.get("link").unwrap(), link("https://www.python.org/", "Python"));
}

#[test]
fn image_field() {
    let doc = Document::parse(HTML);
    let page = doc.page(&page_object());
    assert_eq!(
        page.get("image").unwrap(),
        Value::map([
            ("src", "https://www.python.org/static/img/python-logo@2x.png"),
            ("label", "Python logo"),
        ])
    );
}

#[test]
fn items() {
    let doc = Document::parse(HTML);
    let page = doc.page(&page_object());
    assert_eq!(page.get("items").unwrap(), Value::seq(["Alpha", "Beta", "Gamma"]));
}

#[test]
fn nested_fields() {
    let doc = Document::parse(HTML);
    let page = doc.page(&page_object());

    assert_eq!(page.get("languages").unwrap(), Value::seq(LANGUAGES));
    assert_eq!(
        page.get("languages_1").unwrap(),
        Value::map([
            ("href", Value::seq(LANGUAGE_HREFS)),
            ("label", Value::seq(LANGUAGES)),
        ])
    );
    assert_eq!(
        page.get("languages_2").unwrap(),
        Value::Seq(
            LANGUAGE_HREFS
                .iter()
                .zip(LANGUAGES)
                .map(|(href, label)| link(href, label))
                .collect()
        )
    );
    assert_eq!(
        page.get("languages_3").unwrap(),
        Value::seq([
            Value::seq([link("http://ada", "Ada"), link("https://java", "Java")]),
            Value::seq([link("http://cpp", "C++")]),
            Value::seq([link("http://cobol", "Cobol")]),
            Value::seq([link("http://d", "D"), link("http://go", "Go")]),
        ])
    );
    assert_eq!(page.get("custom_field").unwrap(), Value::seq(["Java", "C++", "D"]));
}

#[test]
fn record_hides_internal_members() {
    let doc = Document::parse(HTML);
    let page = doc.page(&page_object());
    let record = page.as_dict().unwrap();

    assert!(!record.contains_key("_invisible"));
    assert!(!record.contains_key("Language2"));
    assert!(record.contains_key("custom_field"));
    assert_eq!(record.len(), 9);
}

#[test]
fn record_with_constants_and_dynamic_fields() {
    let schema = PageSchema::builder("PageObjectConstant")
        .field("hrefs", Field::select("a").then(as_attr("href")).many())
        .field("labels", Field::select("a").then(inner_text()).many())
        .field("divs", Field::select("div").then(inner_text()).many())
        .constant("constant1", 1)
        .callable("attr_fname", |_| Ok(Value::from("fname")))
        .property("constant2", |_| Ok(Value::Int(2)))
        .ignore_fields(["divs"])
        .build()
        .unwrap();

    let doc = Document::parse(HTML);
    let page = doc.page(&schema);
    let record = page.as_dict().unwrap();

    let mut hrefs = vec!["https://www.python.org/"];
    hrefs.extend(LANGUAGE_HREFS);
    let mut labels = vec!["Python"];
    labels.extend(LANGUAGES);

    let expected = Value::map([
        ("constant1", Value::Int(1)),
        ("constant2", Value::Int(2)),
        ("fname", Value::from("fname")),
        ("hrefs", Value::seq(hrefs)),
        ("labels", Value::seq(labels)),
    ]);
    assert_eq!(Value::Map(record.clone()), expected);
}

#[test]
fn anchor_into_href_record() {
    let doc = Document::parse(r#"<p>See <a href="https://example.org/">Example</a></p>"#);
    let schema = PageSchema::builder("Anchor")
        .field("example", Field::select("a").then(parse_href()))
        .build()
        .unwrap();
    assert_eq!(
        doc.page(&schema).get("example").unwrap(),
        link("https://example.org/", "Example")
    );
}

#[test]
fn exported_fields_are_stable() {
    let schema = page_object();
    let before: Vec<String> = schema.fields().exported().map(String::from).collect();
    let doc = Document::parse(HTML);
    doc.page(&schema).as_dict().unwrap();
    let after: Vec<String> = schema.fields().exported().map(String::from).collect();
    assert_eq!(before, after);
}

#[test]
fn conflicting_config_fails_before_any_page() {
    let err = PageSchema::builder("Conflict")
        .field("a", Field::select("a"))
        .fields(["a"])
        .ignore_fields(["a"])
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::ConflictingFieldConfig { .. }));
}

#[test]
fn missing_match_is_absent_in_record() {
    let schema = PageSchema::builder("Missing")
        .field("table", Field::select("table").then(inner_text()))
        .build()
        .unwrap();
    let doc = Document::parse(HTML);
    let page = doc.page(&schema);
    assert_eq!(page.as_dict().unwrap()["table"], Value::Absent);
}
