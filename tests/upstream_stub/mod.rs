use std::collections::HashMap;
use std::io::Read as _;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use base64::Engine as _;
use serde_json::{Value, json};

pub const CHAPTER_TOKEN: &str = "tok-5f3a";

#[derive(Debug, Clone)]
pub struct UpstreamStubConfig {
    pub account: String,
    pub password: String,
    /// When false the reader page no longer carries the chapter token script.
    pub reader_has_token: bool,
    /// Delay before answering the shelf page, to widen login races.
    pub shelf_delay: Duration,
}

impl Default for UpstreamStubConfig {
    fn default() -> Self {
        Self {
            account: "alice".to_owned(),
            password: "pw123".to_owned(),
            reader_has_token: true,
            shelf_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
pub struct StubState {
    pub shelf_hits: usize,
    /// "METHOD /path?query" for every request, in arrival order.
    pub requests: Vec<String>,
    /// Last form body posted to each path.
    pub forms: HashMap<String, HashMap<String, String>>,
    /// Forces every request to bounce to the login page.
    pub expired: bool,
}

pub struct UpstreamStub {
    pub base_url: String,
    pub state: Arc<Mutex<StubState>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl UpstreamStub {
    pub fn spawn(config: UpstreamStubConfig) -> Self {
        let server = Arc::new(
            tiny_http::Server::http("127.0.0.1:0").expect("start upstream stub server"),
        );
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/");
        let state = Arc::new(Mutex::new(StubState::default()));
        let expected_cookie = format!(
            "saveMemberInfo={}",
            novelshelf::sites::youdu::member_cookie(&config.account, &config.password)
                .expect("encode member cookie")
        );

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }

                    let request = match server.recv_timeout(Duration::from_millis(50)) {
                        Ok(Some(req)) => req,
                        Ok(None) => continue,
                        Err(_) => break,
                    };

                    // Handled off the accept loop so concurrent clients really overlap.
                    let state = Arc::clone(&state);
                    let config = config.clone();
                    let expected_cookie = expected_cookie.clone();
                    thread::spawn(move || serve(request, &state, &config, &expected_cookie));
                }
            })
        };

        Self {
            base_url,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn shelf_hits(&self) -> usize {
        self.state.lock().expect("stub state").shelf_hits
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().expect("stub state").requests.clone()
    }

    pub fn form(&self, path: &str) -> HashMap<String, String> {
        self.state
            .lock()
            .expect("stub state")
            .forms
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn expire_sessions(&self) {
        self.state.lock().expect("stub state").expired = true;
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    mut request: tiny_http::Request,
    state: &Mutex<StubState>,
    config: &UpstreamStubConfig,
    expected_cookie: &str,
) {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or(&url).to_owned();
    let method = request.method().clone();

    let mut body = String::new();
    let _ = request.as_reader().read_to_string(&mut body);
    let form = url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect::<HashMap<_, _>>();

    let has_cookie = header(&request, "Cookie").is_some_and(|cookies| {
        cookies
            .split(';')
            .any(|cookie| cookie.trim() == expected_cookie)
    });
    let referer = header(&request, "Referer");

    let expired = {
        let mut state = state.lock().expect("stub state");
        state.requests.push(format!("{method} {url}"));
        if method == tiny_http::Method::Post {
            state.forms.insert(path.clone(), form.clone());
        }
        if path == "/user/favobook" {
            state.shelf_hits += 1;
        }
        state.expired
    };

    if path == "/user/login" {
        respond(request, 200, "text/html", "<html><body>login form</body></html>".to_owned());
        return;
    }
    if !has_cookie || expired {
        let location = tiny_http::Header::from_bytes(&b"Location"[..], &b"/user/login"[..])
            .expect("build header");
        let _ = request.respond(
            tiny_http::Response::from_string("")
                .with_status_code(302)
                .with_header(location),
        );
        return;
    }

    match (&method, path.as_str()) {
        (tiny_http::Method::Get, "/user/favobook") => {
            thread::sleep(config.shelf_delay);
            respond(request, 200, "text/html", SHELF_HTML.to_owned());
        }
        (tiny_http::Method::Get, "/user/prepaidrecords") => {
            respond(request, 200, "text/html", WALLET_HTML.to_owned());
        }
        (tiny_http::Method::Get, "/book_detail/12345") => {
            respond(request, 200, "text/html", BOOK_HTML.to_owned());
        }
        (tiny_http::Method::Get, "/readchapter/999") => {
            let page = if config.reader_has_token {
                READER_HTML.replace("{token}", CHAPTER_TOKEN)
            } else {
                READER_HTML_WITHOUT_TOKEN.to_owned()
            };
            respond(request, 200, "text/html", page);
        }
        (tiny_http::Method::Get, path) if path.starts_with("/ranking/ranklist/tag/") => {
            respond(request, 200, "text/html", RANK_HTML.to_owned());
        }
        (tiny_http::Method::Get, path) if path.starts_with("/booklibrary/index/str/") => {
            respond(request, 200, "text/html", SEARCH_HTML.to_owned());
        }
        (tiny_http::Method::Post, "/booklibrary/membersinglechapter/chapter_id/999") => {
            let referer_ok = referer.is_some_and(|value| value.ends_with("/readchapter/999"));
            let form_ok = form.get("sign").map(String::as_str) == Some("a3NvcnQoJHBhcmEpOw==")
                && form.get("caonima").map(String::as_str) == Some(CHAPTER_TOKEN);
            if !referer_ok || !form_ok {
                respond(request, 200, "application/json", json!({ "status": 0, "data": null }).to_string());
                return;
            }
            respond(request, 200, "application/json", chapter_json().to_string());
        }
        (tiny_http::Method::Post, "/booklibrary/tsukkomilist") => {
            let count = form
                .get("count")
                .and_then(|count| count.parse::<usize>().ok())
                .unwrap_or(0);
            let comments = (0..count.min(2))
                .map(|n| {
                    json!({
                        "theUser": 100 + n,
                        "nickname": format!("reader{n}"),
                        "tsukkomi_content": format!("comment {n}"),
                        "addTime": "2020-08-20 12:00:00",
                    })
                })
                .collect::<Vec<_>>();
            respond(
                request,
                200,
                "application/json",
                json!({ "status": 1, "data": { "data": comments } }).to_string(),
            );
        }
        (
            tiny_http::Method::Post,
            "/booklibrary/tsukkomiadd" | "/booklibrary/subscribebookaction" | "/booklibrary/actionfavo",
        ) => {
            respond(
                request,
                200,
                "application/json",
                json!({ "status": 1, "msg": "ok" }).to_string(),
            );
        }
        _ => respond(request, 404, "text/plain", "not found".to_owned()),
    }
}

fn header(request: &tiny_http::Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_owned())
}

fn respond(request: tiny_http::Request, status: u16, content_type: &str, body: String) {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
        .expect("build header");
    let _ = request.respond(
        tiny_http::Response::from_string(body)
            .with_status_code(status)
            .with_header(header),
    );
}

fn chapter_json() -> Value {
    let encode = |text: &str| base64::engine::general_purpose::STANDARD.encode(text);
    json!({
        "status": 1,
        "data": {
            "id": 999,
            "BookID": 12345,
            "title": "Chapter 999",
            "FontCount": "3120",
            "show_content": [
                { "paragraph_index": 0, "content": encode("  The gate was open. "), "tsukkomi": 4 },
                { "paragraph_index": 1, "content": encode("\u{3000}\u{3000}门开着。"), "tsukkomi": "0" },
                { "paragraph_index": 2, "content": encode("Nobody came."), "tsukkomi": 1 },
            ]
        }
    })
}

pub const SHELF_HTML: &str = r#"<html><body>
<div class="favoList"><ul>
  <li>
    <a href="/book_detail/12345" title="The Long Road"><img data-original="https://img.test/12345.jpg"></a>
    <div class="updateChapter"><a href="/readchapter/999">Chapter 999</a></div>
  </li>
  <li class="clear"></li>
  <li>
    <a href="/book_detail/777" title="Salt and Iron"><img data-original="https://img.test/777.jpg"></a>
    <div class="updateChapter"><a href="/readchapter/31">Chapter 31</a></div>
  </li>
  <li class="clear"></li>
</ul></div>
</body></html>"#;

pub const WALLET_HTML: &str = r#"<html><body>
<div class="Top"><ul>
  <li>Recommend <em>12</em></li>
  <li>Monthly <em>3</em></li>
  <li>Coins <em>1,050</em></li>
  <li>Bonus <em>20</em></li>
</ul></div>
</body></html>"#;

pub const RANK_HTML: &str = r#"<html><body>
<div class="piclist"><ul>
  <li><a href="/book_detail/1" title="First"><img data-original="c1"></a><div class="nicheng">Ann</div><div class="shoucang">900</div><div class="renqi">12k</div></li>
  <li><a href="/book_detail/2" title="Second"><img data-original="c2"></a><div class="nicheng">Bo</div><div class="shoucang">800</div><div class="renqi">11k</div></li>
  <li class="clear"></li>
  <li><a href="/book_detail/3" title="Third"><img data-original="c3"></a><div class="nicheng">Cy</div><div class="shoucang">700</div><div class="renqi">10k</div></li>
</ul></div>
</body></html>"#;

pub const SEARCH_HTML: &str = r#"<html><body>
<div class="BooklibraryList"><ul>
  <li><a href="/book_detail/41" title="Dragon Gate"></a><img class="img1" data-original="d41"><dl><dd class="nickname">Dee</dd><dd class="favo">55</dd><dd class="hit">900</dd></dl></li>
  <li class="clear"></li>
  <li><a href="/book_detail/42" title="Dragon Well"></a><img class="img1" data-original="d42"><dl><dd class="nickname">Eve</dd><dd class="favo">21</dd><dd class="hit">300</dd></dl></li>
</ul></div>
<div class="pageInfo"><em>2</em><em>/</em><em>5</em><em>next</em><em>last</em></div>
</body></html>"#;

pub const BOOK_HTML: &str = r#"<html><body>
<div class="pic"><img data-original="https://img.test/12345.jpg"></div>
<div class="title"><span>The Long Road</span><em>Quill</em></div>
<div class="label"><ul><li>Fantasy</li><li>Journey</li></ul></div>
<div class="Font"><span>1.2M</span><span>98765</span><span>4321</span></div>
<ul class="Reward"><li>10</li><li>20</li><li>30</li><li>40</li></ul>
<div class="synopsisCon"><p>A road that never ends.</p></div>
<div class="volume_name">Volume 1</div>
<div class="chapter_list"><ul>
  <li><a href="/readchapter/990">Prologue</a></li>
  <li class="lock_fill"><a href="/readchapter/991">The Gate</a></li>
  <li><a href="/readchapter/992">The Well</a></li>
</ul></div>
<div class="volume_name">Volume 2</div>
<div class="chapter_list"><ul>
  <li class="unlock_fill"><a href="/readchapter/998">Return</a></li>
  <li><a href="/readchapter/999">Open Door</a></li>
</ul></div>
</body></html>"#;

const READER_HTML: &str = r#"<html><body>
<div class="chapterBtn">
  <a href="javascript:void(0);">Previous</a>
  <a href="/book_detail/12345">Contents</a>
  <a href="/readchapter/1000">Next</a>
</div>
<script>
  $.MemberSingleChapter({ chapter: 999, key: "{token}" });
</script>
</body></html>"#;

const READER_HTML_WITHOUT_TOKEN: &str = r#"<html><body>
<div class="chapterBtn">
  <a href="/readchapter/998">Previous</a>
  <a href="/readchapter/1000">Next</a>
</div>
<script>var reader = {};</script>
</body></html>"#;
