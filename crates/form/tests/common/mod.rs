#![allow(dead_code, reason = "each test binary uses a different part of the helpers")]

use bytes::Bytes;
use http::Request;
use http_body::{Body, Frame};
use http_body_util::Full;
use micro_form::{BoxError, Fields, Form, FormValue, Validate};
use serde::Deserialize;
use std::cell::Cell;
use std::convert::Infallible;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

pub const BOUNDARY: &str = "micro-form-boundary";

thread_local! {
    static CONTAINER_CHECKS: Cell<usize> = const { Cell::new(0) };
}

/// Routes crate logs to the test output, once per binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
}

/// Number of `TestForm::validate` calls made on this thread so far
pub fn container_checks() -> usize {
    CONTAINER_CHECKS.with(Cell::get)
}

#[derive(Debug, Default, Deserialize, Form)]
pub struct TestForm {
    pub foo: i32,
    #[form(validate)]
    pub bar: TestField,
    #[serde(flatten)]
    #[form(embed)]
    pub embedded: Option<Box<TestEmbedded>>,
}

impl Validate for TestForm {
    fn validate(&self) -> Result<(), BoxError> {
        CONTAINER_CHECKS.with(|checks| checks.set(checks.get() + 1));
        if self.foo < 1 {
            return Err("f.Foo < 1".into());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TestField(pub i32);

impl Validate for TestField {
    fn validate(&self) -> Result<(), BoxError> {
        if self.0 < 1 {
            return Err("testField < 1".into());
        }
        Ok(())
    }
}

impl Fields for TestField {}

impl FormValue for TestField {
    fn parse(value: &str) -> Result<Self, BoxError> {
        i32::parse(value).map(TestField)
    }
}

#[derive(Debug, Default, Deserialize, Form)]
pub struct TestEmbedded {
    pub baz: i32,
    #[form(nested)]
    pub qux: Option<Box<TestForm>>,
}

impl Validate for TestEmbedded {
    fn validate(&self) -> Result<(), BoxError> {
        if self.baz < 1 {
            return Err("f.Baz < 1".into());
        }
        Ok(())
    }
}

/// The `TestForm` cases as `(name, json body, form pairs, valid)`
pub fn test_form_cases() -> Vec<(&'static str, &'static str, Vec<(&'static str, &'static str)>, bool)> {
    vec![
        ("valid", r#"{"foo":1,"bar":1,"baz":1}"#, vec![("foo", "1"), ("bar", "1"), ("baz", "1")], true),
        ("invalid", r#"{"foo":0,"bar":1,"baz":1}"#, vec![("foo", "0"), ("bar", "1"), ("baz", "1")], false),
        ("field invalid", r#"{"foo":1,"bar":0,"baz":1}"#, vec![("foo", "1"), ("bar", "0"), ("baz", "1")], false),
        ("embedded invalid", r#"{"foo":1,"bar":1,"baz":0}"#, vec![("foo", "1"), ("bar", "1"), ("baz", "0")], false),
        (
            "nested valid",
            r#"{"foo":1,"bar":1,"baz":1,"qux":{"foo":1,"bar":1,"baz":1}}"#,
            vec![("foo", "1"), ("bar", "1"), ("baz", "1"), ("qux.foo", "1"), ("qux.bar", "1"), ("qux.baz", "1")],
            true,
        ),
        (
            "nested invalid",
            r#"{"foo":1,"bar":1,"baz":1,"qux":{"foo":0,"bar":1,"baz":1}}"#,
            vec![("foo", "1"), ("bar", "1"), ("baz", "1"), ("qux.foo", "0"), ("qux.bar", "1"), ("qux.baz", "1")],
            false,
        ),
        (
            "nested field invalid",
            r#"{"foo":1,"bar":1,"baz":1,"qux":{"foo":1,"bar":0,"baz":1}}"#,
            vec![("foo", "1"), ("bar", "1"), ("baz", "1"), ("qux.foo", "1"), ("qux.bar", "0"), ("qux.baz", "1")],
            false,
        ),
        (
            "nested embedded invalid",
            r#"{"foo":1,"bar":1,"baz":1,"qux":{"foo":1,"bar":1,"baz":0}}"#,
            vec![("foo", "1"), ("bar", "1"), ("baz", "1"), ("qux.foo", "1"), ("qux.bar", "1"), ("qux.baz", "0")],
            false,
        ),
    ]
}

pub fn json_request(body: &str) -> Request<Full<Bytes>> {
    request("application/json", body.to_owned())
}

pub fn form_request(pairs: &[(&str, &str)]) -> Request<Full<Bytes>> {
    let body = serde_urlencoded::to_string(pairs).unwrap();
    request("application/x-www-form-urlencoded", body)
}

pub fn multipart_request(pairs: &[(&str, &str)]) -> Request<Full<Bytes>> {
    request(&format!("multipart/form-data; boundary={BOUNDARY}"), multipart_body(pairs))
}

pub fn request(content_type: &str, body: String) -> Request<Full<Bytes>> {
    Request::post("http://localhost").header(http::header::CONTENT_TYPE, content_type).body(Full::new(Bytes::from(body))).unwrap()
}

/// A `multipart/form-data` body with one text part per pair
pub fn multipart_body(pairs: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in pairs {
        body.push_str(&format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

/// A body that must never be read
#[derive(Debug)]
pub struct PanicBody;

impl Body for PanicBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        panic!("the body should not be read")
    }
}

/// A body whose client went away
#[derive(Debug)]
pub struct BrokenBody;

impl Body for BrokenBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(Some(Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer"))))
    }
}
