//! Callouts shared across threads.

use std::sync::{Arc, Barrier};
use std::thread;

use crate::helpers::*;
use xslt_callout::core::{Message, VariableMap};
use xslt_callout::ExecutionResult;

const THREADS: usize = 8;

#[test]
fn test_concurrent_invocations_share_pool() {
    let rt = TestRuntime::new();
    let callout = Arc::new(rt.callout(&[("xslt", PLAIN_SHEET), ("param_worker", "{worker}")]));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let callout = Arc::clone(&callout);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..10 {
                    let mut ctx = VariableMap::new()
                        .with("message", Message::new(format!("<n>{}</n>", round)))
                        .with("worker", worker.to_string().as_str());
                    assert_eq!(callout.execute(&mut ctx), ExecutionResult::Success);

                    let out = ctx.text("message.content").unwrap();
                    assert_eq!(
                        out,
                        format!(
                            "<result><param name=\"worker\">{}</param><n>{}</n></result>",
                            worker, round
                        )
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let stats = rt.runtime.pool().stats();
    assert_eq!(stats.borrowed, (THREADS * 10) as u64);
    // never more processors than concurrent borrowers
    assert!(stats.created >= 1 && stats.created <= THREADS as u64);
    assert_eq!(stats.idle as u64, stats.created);
    assert_eq!(rt.engine.compile_count() as u64, stats.created);
}

#[test]
fn test_concurrent_file_references_load_once() {
    let rt = TestRuntime::new();
    rt.write_resource("shared.xsl", PLAIN_SHEET);
    let callout = Arc::new(rt.callout(&[("xslt", "file://shared.xsl")]));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let callout = Arc::clone(&callout);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ctx = VariableMap::new().with("message", Message::new("<a/>"));
                callout.execute(&mut ctx)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ExecutionResult::Success);
    }

    let cache = rt.runtime.file_cache().stats();
    assert_eq!(cache.loads, 1);
    assert_eq!(cache.entries, 1);
}

#[test]
fn test_failures_in_one_thread_do_not_affect_others() {
    let rt = TestRuntime::new();
    let good = Arc::new(rt.callout(&[("xslt", PLAIN_SHEET)]));
    let crashing = sheet(&["panic"]);
    let bad = Arc::new(rt.callout(&[("xslt", crashing.as_str())]));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let callout = if i % 2 == 0 {
                Arc::clone(&good)
            } else {
                Arc::clone(&bad)
            };
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ctx = VariableMap::new().with("message", Message::new("<a/>"));
                (i, callout.execute(&mut ctx))
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        let expected = if i % 2 == 0 {
            ExecutionResult::Success
        } else {
            ExecutionResult::Abort
        };
        assert_eq!(result, expected);
    }

    let metrics = rt.runtime.metrics();
    assert_eq!(metrics.invocation_count("success"), (THREADS / 2) as u64);
    assert_eq!(metrics.invocation_count("defect"), (THREADS / 2) as u64);
    assert_eq!(metrics.discarded_count(), (THREADS / 2) as u64);
}
