use std::sync::Mutex;

use reqwest::Url;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::pipeline::{self, GroupedList};
use crate::record::{GroupKey, Groups, Record};
use crate::render::{self, Container, Element, RenderError, RenderOptions};
use crate::runner::{Options, RecordSource, Runner, RunnerError};
use crate::source::{self, FetchError, FetchRequest, HttpSettings, HttpTransport, Transport, TransportResponse};
use crate::transform::{Grouper, Normalizer, StrategyError};

fn records(value: serde_json::Value) -> Vec<Record> {
    serde_json::from_value(value).unwrap()
}

fn people() -> Vec<Record> {
    records(json!([
        { "last": "Bender", "first": "Ostap" },
        { "last": "Ivanov", "first": "Ivan" },
    ]))
}

fn by_initial(records: &[Record]) -> Groups {
    pipeline::group_by(records, |_, r| {
        r.text("last")
            .and_then(|l| l.chars().next())
            .map(|c| c.to_uppercase().collect::<String>())
    })
}

struct MockTransport {
    response: Result<(u16, String), String>,
    seen: Mutex<Vec<String>>,
}

impl MockTransport {
    fn ok(body: serde_json::Value) -> Self {
        Self::status(200, body.to_string())
    }

    fn status(status: u16, body: String) -> Self {
        Self {
            response: Ok((status, body)),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn rejecting() -> Self {
        Self {
            response: Err("connection refused".to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, FetchError> {
        self.seen.lock().unwrap().push(url.to_string());
        match &self.response {
            Ok((status, body)) => Ok(TransportResponse {
                status: *status,
                body: body.clone().into_bytes(),
            }),
            Err(message) => Err(FetchError::Transport {
                url: url.to_string(),
                message: message.clone(),
            }),
        }
    }
}

#[test]
fn shared_key_renders_one_header_with_two_entries() {
    let raw = records(json!([{ "name": "Ivan Ivanov" }, { "name": "Sergey Ivanov" }]));
    let list = GroupedList::new(raw)
        .normalize(|r| Normalizer::SplitName { field: "name".to_string() }.apply(r))
        .group(by_initial);
    let mut el = Element::new("example1");
    list.render_into(&mut el, &RenderOptions::default()).unwrap();

    let html = el.inner_markup();
    assert_eq!(html.matches(r#"<h2 class="list__header">"#).count(), 1);
    assert!(html.contains(r#"<h2 class="list__header">I</h2>"#));
    assert_eq!(html.matches(r#"<div class="name">"#).count(), 2);
    assert!(html.contains(r#"<span class="name__first">Sergey</span>"#));
}

#[test]
fn grouping_keeps_first_produced_key_order() {
    let list = people();
    let groups = pipeline::group(&list, |_| {
        vec![
            ("z", vec![1]),
            ("a", vec![0]),
            ("m", vec![]),
        ]
    });
    let keys: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn repeated_key_appends_and_keeps_first_position() {
    let groups: Groups = vec![("b", vec![0]), ("a", vec![1]), ("b", vec![2])]
        .into_iter()
        .collect();
    let keys: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["b", "a"]);
    assert_eq!(groups.get(&GroupKey::from("b")), Some(&[0, 2][..]));
}

#[test]
fn empty_input_renders_empty_outer_list() {
    let html = render::render_markup(&[], &Groups::new(), &RenderOptions::default()).unwrap();
    assert_eq!(html, r#"<ul class="list"></ul>"#);
}

#[test]
fn bender_and_ivanov_grouped_by_last_initial() {
    let list = people();
    let groups = by_initial(&list);
    let mut el = Element::new("example1");
    render::render(&mut el, &list, &groups, &RenderOptions::default()).unwrap();

    let expected = concat!(
        r#"<ul class="list">"#,
        r#"<li class="list__item"><h2 class="list__header">B</h2><ul class="list">"#,
        r#"<li class="list__item"><div class="name"><span class="name__first">Ostap</span> <span class="name__last">Bender</span></div></li>"#,
        r#"</ul></li>"#,
        r#"<li class="list__item"><h2 class="list__header">I</h2><ul class="list">"#,
        r#"<li class="list__item"><div class="name"><span class="name__first">Ivan</span> <span class="name__last">Ivanov</span></div></li>"#,
        r#"</ul></li>"#,
        r#"</ul>"#,
    );
    assert_eq!(el.inner_markup(), expected);
    assert_eq!(
        el.to_html(),
        format!(r#"<div id="example1">{expected}</div>"#)
    );
}

#[test]
fn numeric_keys_render_as_numbers() {
    let raw = records(json!([
        { "name": "Ostap Bender", "debt": 100 },
        { "name": "Ignat Delyugin", "debt": 200 },
        { "name": "Maxim Dergachev", "debt": 200 },
    ]));
    let list = GroupedList::new(raw)
        .normalize(|r| Normalizer::parse("split-name").unwrap().apply(r))
        .group(|r| Grouper::parse("field:debt").unwrap().apply(r).unwrap());

    let keys: Vec<GroupKey> = list.groups().keys().cloned().collect();
    assert_eq!(keys, vec![GroupKey::Integer(100), GroupKey::Integer(200)]);
    assert_eq!(list.groups().get(&GroupKey::Integer(200)), Some(&[1, 2][..]));

    let mut el = Element::new("example2");
    list.render_into(&mut el, &RenderOptions::default()).unwrap();
    assert!(el
        .inner_markup()
        .contains(r#"<h2 class="list__header">200</h2>"#));
}

#[test]
fn out_of_range_index_is_an_error_and_leaves_container_untouched() {
    let list = people();
    let groups: Groups = vec![("B", vec![0, 5])].into_iter().collect();
    let mut el = Element::new("list");
    el.replace_inner_markup("previous".to_string());

    let err = render::render(&mut el, &list, &groups, &RenderOptions::default()).unwrap_err();
    assert_eq!(
        err,
        RenderError::IndexOutOfRange {
            group: "B".to_string(),
            index: 5,
            len: 2
        }
    );
    assert_eq!(el.inner_markup(), "previous");
}

#[test]
fn record_without_last_name_is_reported() {
    let list = records(json!([{ "first": "Cher" }]));
    let groups: Groups = vec![("C", vec![0])].into_iter().collect();
    let err = render::render_markup(&list, &groups, &RenderOptions::default()).unwrap_err();
    assert_eq!(
        err,
        RenderError::MissingField {
            index: 0,
            field: "last"
        }
    );
}

#[test]
fn content_is_verbatim_unless_escaping() {
    let list = records(json!([{ "first": "<b>Ivan</b>", "last": "O'Neil & Co" }]));
    let groups: Groups = vec![("<i>", vec![0])].into_iter().collect();

    let raw = render::render_markup(&list, &groups, &RenderOptions::default()).unwrap();
    assert!(raw.contains("<b>Ivan</b>"));
    assert!(raw.contains(r#"<h2 class="list__header"><i></h2>"#));

    let escaped = render::render_markup(&list, &groups, &RenderOptions { escape: true }).unwrap();
    assert!(escaped.contains("&lt;b&gt;Ivan&lt;/b&gt;"));
    assert!(escaped.contains("O&#39;Neil &amp; Co"));
    assert!(escaped.contains(r#"<h2 class="list__header">&lt;i&gt;</h2>"#));
}

#[test]
fn render_with_overrides_current_records_and_groups() {
    let list = GroupedList::new(people()).group(by_initial);
    let other = records(json!([{ "first": "Olga", "last": "Ivushina" }]));
    let groups: Groups = vec![("Olga's", vec![0])].into_iter().collect();

    let mut el = Element::new("list");
    list.render_with(&mut el, Some(other.as_slice()), Some(&groups), &RenderOptions::default())
        .unwrap();
    assert!(el.inner_markup().contains("Ivushina"));
    assert!(!el.inner_markup().contains("Bender"));
}

#[test]
fn query_parameters_are_appended_in_order() {
    let request = FetchRequest::new("https://api.example.com/people")
        .field("first")
        .field("last")
        .sort("last")
        .filter("team", "core")
        .filter("active", "yes");
    let url = request.target_url().unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.example.com/people?fields=first%2Clast&sort=last&team=core&active=yes"
    );
}

#[test]
fn empty_fields_and_sort_are_still_sent() {
    let url = FetchRequest::new("http://localhost/x").target_url().unwrap();
    assert_eq!(url.query(), Some("fields=&sort="));
}

#[test]
fn relative_url_resolves_against_base() {
    let url = FetchRequest::new("/api/people")
        .base_url("https://example.com/app/")
        .target_url()
        .unwrap();
    assert_eq!(url.as_str(), "https://example.com/api/people?fields=&sort=");

    let url = FetchRequest::new("people")
        .base_url("https://example.com/app/")
        .target_url()
        .unwrap();
    assert_eq!(url.as_str(), "https://example.com/people?fields=&sort=");

    assert!(matches!(
        FetchRequest::new("people").base_url("mailto:x@example.com").target_url(),
        Err(FetchError::InvalidUrl { .. })
    ));

    assert!(matches!(
        FetchRequest::new("/api/people").target_url(),
        Err(FetchError::RelativeUrlWithoutBase { .. })
    ));
}

#[test]
fn malformed_parameters_are_rejected() {
    let base = FetchRequest::new("https://api.example.com/people");
    assert!(matches!(
        base.clone().field("first,last").validate(),
        Err(FetchError::InvalidField { .. })
    ));
    assert!(matches!(
        base.clone().sort(" ").validate(),
        Err(FetchError::InvalidSort { .. })
    ));
    assert!(matches!(
        base.clone().filter("fields", "x").validate(),
        Err(FetchError::InvalidFilterKey { .. })
    ));
    assert!(matches!(
        base.clone().filter("", "x").validate(),
        Err(FetchError::InvalidFilterKey { .. })
    ));
    assert!(base.field("first").sort("last").filter("q", "").validate().is_ok());
}

#[tokio::test]
async fn failed_fetch_keeps_records() {
    let transport = MockTransport::rejecting();
    let request = FetchRequest::new("https://api.example.com/people");
    let before = people();

    let list = GroupedList::new(before.clone()).fetch(&transport, &request).await;
    assert_eq!(list.records(), before.as_slice());
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn invalid_request_never_reaches_transport() {
    let transport = MockTransport::ok(json!({ "results": [] }));
    let request = FetchRequest::new("https://api.example.com/people").field("a,b");

    let list = GroupedList::new(people()).fetch(&transport, &request).await;
    assert_eq!(list.records().len(), 2);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn non_success_status_keeps_records() {
    let transport = MockTransport::status(500, r#"{"results": []}"#.to_string());
    let request = FetchRequest::new("https://api.example.com/people");

    let err = source::fetch_records(&transport, &request).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500, .. }));

    let kept = source::fetch_or_keep(&transport, &request, people()).await;
    assert_eq!(kept, people());
}

#[tokio::test]
async fn envelope_without_results_keeps_records() {
    let transport = MockTransport::ok(json!({ "data": [] }));
    let request = FetchRequest::new("https://api.example.com/people");
    let kept = source::fetch_or_keep(&transport, &request, people()).await;
    assert_eq!(kept, people());
}

#[tokio::test]
async fn successful_fetch_replaces_records() {
    let transport = MockTransport::ok(json!({
        "results": [
            { "first": "Petr", "last": "Durov" },
            { "first": "Olga", "last": "Ivushina" },
            { "first": "Ignat", "last": "Delyugin" },
        ]
    }));
    let request = FetchRequest::new("https://api.example.com/people")
        .field("first")
        .sort("last");

    let list = GroupedList::new(people())
        .fetch(&transport, &request)
        .await
        .group(by_initial);
    assert_eq!(list.records().len(), 3);
    let keys: Vec<String> = list.groups().keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["D", "I"]);
    assert_eq!(
        transport.calls(),
        vec!["https://api.example.com/people?fields=first&sort=last".to_string()]
    );
}

async fn serve_once(
    status_line: &'static str,
    body: String,
) -> (String, tokio::task::JoinHandle<String>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&buf)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });
    (format!("http://{addr}"), handle)
}

fn local_settings() -> HttpSettings {
    HttpSettings {
        timeout_seconds: 5,
        ignore_env_proxy: true,
        ..HttpSettings::default()
    }
}

#[tokio::test]
async fn http_transport_fetches_envelope() {
    let body = json!({ "results": [{ "first": "Ivan", "last": "Ivanov" }] }).to_string();
    let (origin, server) = serve_once("200 OK", body).await;

    let transport = HttpTransport::new(&local_settings()).unwrap();
    let request = FetchRequest::new("/people")
        .base_url(origin)
        .field("first")
        .field("last")
        .filter("team", "core");
    let fetched = source::fetch_records(&transport, &request).await.unwrap();

    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].text("last").as_deref(), Some("Ivanov"));
    let request_line = server.await.unwrap();
    assert_eq!(
        request_line,
        "GET /people?fields=first%2Clast&sort=&team=core HTTP/1.1"
    );
}

#[tokio::test]
async fn http_transport_unreachable_keeps_records() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(&local_settings()).unwrap();
    let request = FetchRequest::new(format!("http://{addr}/people"));
    let list = GroupedList::new(people()).fetch(&transport, &request).await;
    assert_eq!(list.records(), people().as_slice());
}

#[test]
fn runner_rejects_bad_options() {
    assert!(Runner::new(Options {
        container_id: "has space".to_string(),
        ..Options::default()
    })
    .is_err());
    assert!(Runner::new(Options {
        fetch: Some(FetchRequest::new("relative/path")),
        ..Options::default()
    })
    .is_err());
    assert!(matches!(
        Runner::new(Options {
            http: HttpSettings {
                timeout_seconds: 0,
                ..HttpSettings::default()
            },
            ..Options::default()
        }),
        Err(RunnerError::InvalidTimeout)
    ));
}

#[tokio::test]
async fn single_word_name_fails_grouping_instead_of_vanishing() {
    let initial = records(json!([{ "name": "Cher" }, { "name": "Ivan Ivanov" }]));
    let runner = Runner::new(Options {
        initial: RecordSource::Inline(initial),
        normalizer: Normalizer::parse("split-name").unwrap(),
        ..Options::default()
    })
    .unwrap();

    let err = runner.run().await.unwrap_err();
    match err {
        RunnerError::Group { source } => assert_eq!(
            source,
            StrategyError::NoGroupKey {
                index: 0,
                field: "last".to_string()
            }
        ),
        other => panic!("unexpected error: {other}"),
    }

    let runner = Runner::new(Options {
        initial: RecordSource::Inline(records(json!([{ "name": "Cher" }]))),
        normalizer: Normalizer::parse("split-name").unwrap(),
        grouper: Grouper::parse("field:first").unwrap(),
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();
    assert_eq!(result.groups.get(&GroupKey::from("Cher")), Some(&[0][..]));
}

#[tokio::test]
async fn runner_falls_back_to_initial_records() {
    let initial = records(json!([
        { "name": "Ostap Bender" },
        { "name": "Ivan Ivanov" },
        { "name": "Sergey Ivanov" },
    ]));
    let runner = Runner::new(Options {
        initial: RecordSource::Inline(initial),
        fetch: Some(FetchRequest::new("https://api.example.com/people")),
        normalizer: Normalizer::parse("split-name").unwrap(),
        grouper: Grouper::parse("initial:last").unwrap(),
        container_id: "example1".to_string(),
        ..Options::default()
    })
    .unwrap();

    let result = runner.run_with(&MockTransport::rejecting()).await.unwrap();
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.groups.len(), 2);
    assert_eq!(
        result.groups.get(&GroupKey::from("I")),
        Some(&[1, 2][..])
    );
    assert!(result.container.to_html().starts_with(r#"<div id="example1"><ul class="list">"#));
}

#[tokio::test]
async fn runner_reads_records_file() {
    let path = std::env::temp_dir().join(format!(
        "grouplist_runner_records_{}.json",
        std::process::id()
    ));
    std::fs::write(
        &path,
        json!([{ "first": "Petr", "last": "Durov" }]).to_string(),
    )
    .unwrap();

    let runner = Runner::new(Options {
        initial: RecordSource::FilePath(path.to_string_lossy().to_string()),
        ..Options::default()
    })
    .unwrap();
    let result = runner.run().await.unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(result.groups.keys().next(), Some(&GroupKey::from("D")));
    assert!(result
        .container
        .inner_markup()
        .contains(r#"<span class="name__last">Durov</span>"#));
}

#[test]
fn json_output_lists_groups_in_order() {
    let list = GroupedList::new(people()).group(by_initial);
    let mut el = Element::new("people");
    list.render_into(&mut el, &RenderOptions::default()).unwrap();

    let out = crate::output::render_json(&el, list.records(), list.groups()).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["container"], "people");
    assert_eq!(value["groups"][0]["key"], "B");
    assert_eq!(value["groups"][1]["indexes"], json!([1]));
    assert_eq!(value["records"][0]["first"], "Ostap");
}

#[test]
fn page_output_embeds_container() {
    let mut el = Element::new("people");
    el.replace_inner_markup(r#"<ul class="list"></ul>"#.to_string());
    let page = String::from_utf8(crate::output::render_page(&el)).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains(r#"<div id="people"><ul class="list"></ul></div>"#));
    assert!(page.contains("<title>people</title>"));
}
