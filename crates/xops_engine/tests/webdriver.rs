use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xops_engine::browser::{
    BrowserError, BrowserLauncher, ComposePage, FeedPage, LaunchOptions, WebDriverLauncher, WebDriverPage,
};

const SESSION: &str = "/session/abc";

fn value(v: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": v }))
}

fn driver_error(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({ "value": { "error": code, "message": "nope" } }))
}

async fn open_session(server: &MockServer) -> WebDriverPage {
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(value(json!({ "sessionId": "abc", "capabilities": {} })))
        .mount(server)
        .await;
    let launcher = WebDriverLauncher::new(server.uri()).unwrap();
    let options = LaunchOptions {
        timeout: Duration::from_secs(2),
        ..LaunchOptions::default()
    };
    launcher.launch(&options).await.unwrap()
}

#[tokio::test]
async fn session_navigates_and_reads_the_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/url")))
        .and(body_partial_json(json!({ "url": "https://x.com/dev/status/1" })))
        .respond_with(value(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/url")))
        .respond_with(value(json!("https://x.com/dev/status/1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/source")))
        .respond_with(value(json!("<html><main></main></html>")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/screenshot")))
        .respond_with(value(json!("iVBORw==")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(SESSION))
        .respond_with(value(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let mut page = open_session(&server).await;
    page.goto("https://x.com/dev/status/1").await.unwrap();
    assert_eq!(page.current_url().await.unwrap(), "https://x.com/dev/status/1");
    assert_eq!(page.content().await.unwrap(), "<html><main></main></html>");
    assert_eq!(page.screenshot_png().await.unwrap(), vec![0x89, b'P', b'N', b'G']);
    page.close().await.unwrap();
}

#[tokio::test]
async fn missing_session_id_is_a_launch_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(value(json!({})))
        .mount(&server)
        .await;

    let launcher = WebDriverLauncher::new(server.uri()).unwrap();
    let err = launcher.launch(&LaunchOptions::default()).await.unwrap_err();
    assert!(matches!(err, BrowserError::Launch(_)));
}

#[tokio::test]
async fn waiting_for_absent_selector_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element")))
        .respond_with(driver_error("no such element"))
        .mount(&server)
        .await;

    let mut page = open_session(&server).await;
    let err = page
        .wait_for_selector("article", Duration::from_millis(300))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn fill_clicks_then_types_into_the_element() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element")))
        .respond_with(value(json!({ "element-6066-11e4-a52e-4f735466cecf": "el-1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element/el-1/click")))
        .respond_with(value(json!(null)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element/el-1/value")))
        .and(body_partial_json(json!({ "text": "hello drafts" })))
        .respond_with(value(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let mut page = open_session(&server).await;
    page.fill(r#"div[role="textbox"]"#, "hello drafts").await.unwrap();
}

#[tokio::test]
async fn driver_errors_carry_code_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/title")))
        .respond_with(driver_error("invalid session id"))
        .mount(&server)
        .await;

    let mut page = open_session(&server).await;
    let err = page.title().await.unwrap_err();
    assert_eq!(
        err,
        BrowserError::Driver {
            code: "invalid session id".into(),
            message: "nope".into()
        }
    );
}
