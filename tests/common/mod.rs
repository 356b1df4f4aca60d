#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use hex_lang::session::{RunReport, Session};

/// A `Write` sink whose bytes stay readable after it is handed to a session.
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn session() -> (Session, Capture) {
    let capture = Capture::default();
    (Session::with_output(Box::new(capture.clone())), capture)
}

/// Run `source` in a fresh session, returning printed output and the report.
pub fn run(source: &str) -> (String, RunReport) {
    let (mut session, capture) = session();
    let report = session.run(source);
    (capture.contents(), report)
}

/// Run `source`, asserting it succeeds, and return its printed lines.
pub fn run_ok(source: &str) -> Vec<String> {
    let (output, report) = run(source);
    assert!(
        report.is_ok(),
        "unexpected diagnostics: {:?}",
        report.diagnostics
    );
    output.lines().map(str::to_owned).collect()
}

/// Run `source`, asserting it fails, and return the rendered diagnostics.
pub fn run_err(source: &str) -> (Vec<String>, RunReport) {
    let (_, report) = run(source);
    assert!(!report.is_ok(), "expected {:?} to fail", source);
    let messages = report.diagnostics.iter().map(|e| e.to_string()).collect();
    (messages, report)
}
