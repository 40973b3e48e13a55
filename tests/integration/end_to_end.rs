//! Full invocations: configuration, caching, pooling and error publishing.

use crate::helpers::*;
use xslt_callout::core::{Message, MessageContext, Variable, VariableMap};
use xslt_callout::ExecutionResult;

fn order_message() -> VariableMap {
    VariableMap::new().with("message", Message::new("<order id=\"7\"/>"))
}

#[test]
fn test_literal_stylesheet_success() {
    let rt = TestRuntime::new();
    let callout = rt.callout(&[("xslt", PLAIN_SHEET)]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert_eq!(
        ctx.text("message.content").as_deref(),
        Some("<result><order id=\"7\"/></result>")
    );
    assert!(!ctx.contains("xslt_error"));
    assert!(!ctx.contains("xslt_exception"));

    // the message stays a message; only its content changed
    assert!(matches!(ctx.get_variable("message"), Some(Variable::Message(_))));
}

#[test]
fn test_parameters_resolved_and_bound() {
    let rt = TestRuntime::new();
    rt.write_resource("rate.txt", "  0.21\n");
    let callout = rt.callout(&[
        ("xslt", PLAIN_SHEET),
        ("param_currency", "{request.currency}"),
        ("param_rate", "file://rate.txt"),
        ("param_label", "total-{request.currency}"),
        ("output", "transformed"),
    ]);
    let mut ctx = order_message().with("request.currency", "EUR");

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert_eq!(
        ctx.text("transformed").as_deref(),
        Some(
            "<result><param name=\"currency\">EUR</param>\
             <param name=\"label\">total-EUR</param>\
             <param name=\"rate\">0.21</param><order id=\"7\"/></result>"
        )
    );
    // input message untouched when output goes elsewhere
    assert_eq!(ctx.text("message.content").as_deref(), Some("<order id=\"7\"/>"));
}

#[test]
fn test_missing_file_aborts_before_borrowing() {
    let rt = TestRuntime::new();
    let callout = rt.callout(&[("xslt", "file://missing.xsl")]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    let error = ctx.text("xslt_error").expect("xslt_error set");
    assert!(error.contains("not found"), "unexpected error: {}", error);
    assert!(ctx.text("xslt_exception").unwrap().starts_with("fetch error:"));

    let stats = rt.runtime.pool().stats();
    assert_eq!(stats.borrowed, 0);
    assert_eq!(stats.created, 0);
    assert_eq!(rt.engine.compile_count(), 0);
    assert!(!rt.runtime.file_cache().contains("missing.xsl"));
}

#[test]
fn test_missing_file_retried_once_present() {
    let rt = TestRuntime::new();
    let callout = rt.callout(&[("xslt", "file://later.xsl")]);

    assert_eq!(callout.execute(&mut order_message()), ExecutionResult::Abort);

    rt.write_resource("later.xsl", PLAIN_SHEET);
    assert_eq!(callout.execute(&mut order_message()), ExecutionResult::Success);
}

#[test]
fn test_file_stylesheet_from_placeholder() {
    let rt = TestRuntime::new();
    rt.write_resource("order.xsl", &format!("\n{}\n", PLAIN_SHEET));
    let callout = rt.callout(&[("xslt", "file://{sheet}.xsl")]);
    let mut ctx = order_message().with("sheet", "order");

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert!(rt.runtime.file_cache().contains("order.xsl"));
}

#[test]
fn test_compile_failure_reports_additional_information() {
    let rt = TestRuntime::new();
    let broken = sheet(&["broken"]);
    let callout = rt.callout(&[("xslt", broken.as_str())]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.text("xslt_additionalInformation").as_deref(),
        Some("line 3: xsl:tempate is not a known instruction")
    );
    assert_eq!(
        ctx.text("xslt_error").as_deref(),
        Some("stylesheet does not compile")
    );
    assert_eq!(rt.runtime.pool().total_idle(), 0);

    // never pooled, so the next invocation compiles again
    assert_eq!(callout.execute(&mut order_message()), ExecutionResult::Abort);
    assert_eq!(rt.engine.compile_count(), 2);
    assert_eq!(rt.runtime.pool().total_idle(), 0);
}

#[test]
fn test_errors_and_warnings_published() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&[
        "error: undeclared variable $rate",
        "warning: ambiguous rule match",
        "fatal: cannot convert 'abc' to a number",
    ]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str())]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert_eq!(ctx.text("xslt_error_count").as_deref(), Some("2"));
    assert_eq!(
        ctx.text("xslt_error_1").as_deref(),
        Some("Error:undeclared variable $rate")
    );
    assert_eq!(
        ctx.text("xslt_error_2").as_deref(),
        Some("Fatal Error:cannot convert 'abc' to a number")
    );
    assert_eq!(
        ctx.text("xslt_warning_1").as_deref(),
        Some("Warning:ambiguous rule match")
    );
    assert_eq!(
        ctx.text("xslt_exception").as_deref(),
        Some("Encountered 2 errors while transforming")
    );
    // output not written on failure
    assert_eq!(ctx.text("message.content").as_deref(), Some("<order id=\"7\"/>"));
    // a run with diagnostics is still a clean run
    assert_eq!(rt.runtime.pool().total_idle(), 1);
}

#[test]
fn test_warnings_alone_do_not_fail() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&["warning: deprecated construct"]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str())]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert_eq!(
        ctx.text("xslt_warning_1").as_deref(),
        Some("Warning:deprecated construct")
    );
    assert!(!ctx.contains("xslt_error_count"));
}

#[test]
fn test_processor_reused_across_invocations() {
    let rt = TestRuntime::new();
    let callout = rt.callout(&[("xslt", PLAIN_SHEET), ("param_n", "{n}")]);

    for n in 0..5 {
        let mut ctx = order_message().with("n", n.to_string().as_str());
        assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
        // parameters from the previous run never leak into this one
        let out = ctx.text("message.content").unwrap();
        assert!(out.contains(&format!("<param name=\"n\">{}</param>", n)));
        assert_eq!(out.matches("<param").count(), 1);
    }

    assert_eq!(rt.engine.compile_count(), 1);
    assert_eq!(rt.engine.reset_count(), 5);
    let stats = rt.runtime.pool().stats();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.reused, 4);
    assert_eq!(stats.idle, 1);
}

#[test]
fn test_distinct_stylesheets_use_distinct_processors() {
    let rt = TestRuntime::new();
    let first = rt.callout(&[("xslt", PLAIN_SHEET)]);
    let other = sheet(&["warning: second sheet"]);
    let second = rt.callout(&[("xslt", other.as_str())]);

    first.execute(&mut order_message());
    second.execute(&mut order_message());
    first.execute(&mut order_message());

    assert_eq!(rt.engine.compile_count(), 2);
    assert_eq!(rt.runtime.pool().total_idle(), 2);
}

#[test]
fn test_engine_abort_discards_processor() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&["abort"]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str())]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.text("xslt_error").as_deref(),
        Some("run terminated by stylesheet")
    );
    assert_eq!(rt.runtime.pool().total_idle(), 0);
    assert_eq!(rt.runtime.metrics().discarded_count(), 1);
}

#[test]
fn test_engine_panic_is_contained() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&["warning: before the crash", "panic"]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str())]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert_eq!(ctx.text("xslt_error").as_deref(), Some("toy engine crashed"));
    assert!(ctx
        .text("xslt_exception")
        .unwrap()
        .starts_with("unexpected failure:"));
    assert_eq!(
        ctx.text("xslt_warning_1").as_deref(),
        Some("Warning:before the crash")
    );
    assert_eq!(rt.runtime.pool().total_idle(), 0);
    assert_eq!(rt.runtime.metrics().invocation_count("defect"), 1);
}

#[test]
fn test_parameter_panic_is_contained() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&["panic on parameter"]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str()), ("param_a", "1")]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.text("xslt_error").as_deref(),
        Some("toy engine rejected parameter a")
    );
    assert_eq!(rt.runtime.pool().total_idle(), 0);
    assert_eq!(rt.runtime.metrics().invocation_count("defect"), 1);
    assert_eq!(rt.runtime.metrics().discarded_count(), 1);
}

#[test]
fn test_reset_panic_discards_processor() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&["panic on reset"]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str()), ("param_a", "1")]);

    for _ in 0..2 {
        let mut ctx = order_message();
        assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
        assert_eq!(
            ctx.text("message.content").as_deref(),
            Some("<result><param name=\"a\">1</param><order id=\"7\"/></result>")
        );
    }

    let stats = rt.runtime.pool().stats();
    assert_eq!(stats.reset_failures, 2);
    assert_eq!(stats.idle, 0);
    assert_eq!(rt.engine.compile_count(), 2);
}

#[test]
fn test_resolver_install_panic_is_contained() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&["panic on resolver"]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str())]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.text("xslt_error").as_deref(),
        Some("toy engine has no resolver slot")
    );
    assert_eq!(rt.runtime.pool().stats().created, 0);
}

#[test]
fn test_data_uri_documents() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&["document: data:text/xml,<rates><eur>0.9</eur></rates>"]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str())]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert_eq!(
        ctx.text("message.content").as_deref(),
        Some("<result><doc><rates><eur>0.9</eur></rates></doc><order id=\"7\"/></result>")
    );
}

#[test]
fn test_unresolvable_document_is_an_error() {
    let rt = TestRuntime::new();
    let stylesheet = sheet(&["document: lookup.xml"]);
    let callout = rt.callout(&[("xslt", stylesheet.as_str())]);
    let mut ctx = order_message();

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.text("xslt_error_1").as_deref(),
        Some("Error:cannot resolve lookup.xml")
    );
}

#[test]
fn test_engine_selected_by_placeholder() {
    let rt = TestRuntime::new();
    let callout = rt.callout(&[("xslt", PLAIN_SHEET), ("engine", "{engine}")]);

    let mut ctx = order_message().with("engine", "passthrough");
    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert_eq!(ctx.text("message.content").as_deref(), Some("<order id=\"7\"/>"));

    let mut ctx = order_message().with("engine", "fop");
    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Abort);
    assert_eq!(
        ctx.text("xslt_error").as_deref(),
        Some("unknown XSLT engine: fop")
    );

    assert_eq!(rt.engine.compile_count(), 0);
}

#[test]
fn test_string_input_variable() {
    let rt = TestRuntime::new();
    let callout = rt.callout(&[("xslt", PLAIN_SHEET), ("input", "payload")]);
    let mut ctx = VariableMap::new()
        .with("payload", "\n  <invoice/>")
        .with("message", Message::new("<ignored/>"));

    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);
    assert_eq!(
        ctx.text("message.content").as_deref(),
        Some("<result><invoice/></result>")
    );
}
