//! Stylesheets and parameters fetched over HTTP.

use crate::helpers::*;
use xslt_callout::core::{Message, VariableMap};
use xslt_callout::ExecutionResult;

fn message() -> VariableMap {
    VariableMap::new().with("message", Message::new("<a/>"))
}

#[test]
fn test_url_stylesheet_fetched_once() {
    let server = StubHttpServer::start(200, &format!("\n{}\n", PLAIN_SHEET));
    let rt = TestRuntime::new();
    let url = server.url("/sheets/order.xsl");
    let callout = rt.callout(&[("xslt", url.as_str())]);

    for _ in 0..3 {
        assert_eq!(callout.execute(&mut message()), ExecutionResult::Success);
    }

    assert_eq!(server.hits(), 1);
    assert!(rt.runtime.url_cache().contains(&url));
    assert_eq!(rt.engine.compile_count(), 1);
}

#[test]
fn test_url_from_placeholder() {
    let server = StubHttpServer::start(200, PLAIN_SHEET);
    let rt = TestRuntime::new();
    let callout = rt.callout(&[("xslt", "{sheet.url}")]);
    let mut ctx = message().with("sheet.url", server.url("/x.xsl").as_str());

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert_eq!(server.hits(), 1);
}

#[test]
fn test_url_not_found() {
    let server = StubHttpServer::start(404, "missing");
    let rt = TestRuntime::new();
    let url = server.url("/gone.xsl");
    let callout = rt.callout(&[("xslt", url.as_str())]);
    let mut ctx = message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    let error = ctx.text("xslt_error").unwrap();
    assert!(error.contains("not found"), "unexpected error: {}", error);
    assert_eq!(rt.runtime.pool().stats().borrowed, 0);

    // failures are not cached
    assert_eq!(callout.execute(&mut message()), ExecutionResult::Abort);
    assert_eq!(server.hits(), 2);
}

#[test]
fn test_url_parameter() {
    let server = StubHttpServer::start(200, "  <rates eur=\"0.9\"/>  ");
    let rt = TestRuntime::new();
    let url = server.url("/rates");
    let callout = rt.callout(&[("xslt", PLAIN_SHEET), ("param_rates", url.as_str())]);
    let mut ctx = message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert_eq!(
        ctx.text("message.content").as_deref(),
        Some("<result><param name=\"rates\"><rates eur=\"0.9\"/></param><a/></result>")
    );
}

#[test]
fn test_unreachable_url() {
    // bind then drop to get a port nobody listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let rt = TestRuntime::new();
    let url = format!("http://127.0.0.1:{}/sheet.xsl", port);
    let callout = rt.callout(&[("xslt", url.as_str())]);
    let mut ctx = message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert!(ctx
        .text("xslt_exception")
        .unwrap()
        .starts_with("fetch error:"));
}
