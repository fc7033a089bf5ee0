//! Running the external XEX resource tool and reading its output.
//!
//! The tool is invoked as `xextool -xa default.xex` from the working
//! directory and prints an XML-ish report on stdout, preceded by a banner.
//! Its output has one known defect: bytes above 0x7F in numeric character
//! references are printed as negative numbers (`&#-5;`), which no XML
//! parser accepts. [`repair_char_refs`] rewrites those before parsing.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;
use xdisc_core::ExtractionError;

/// Name the XEX is written under inside the working directory.
pub const XEX_FILE_NAME: &str = "default.xex";

/// Arguments requesting resource extraction from the persisted XEX.
pub const EXTRACT_ARGS: [&str; 2] = ["-xa", XEX_FILE_NAME];

/// Document path of the title name.
pub const GAME_NAME_PATH: &str = "/XexInfo/GameName";

/// Document path of the base64 encoded title icon.
pub const GAME_ICON_PATH: &str = "/XexInfo/GameIcon";

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// Run the tool against `work_dir/default.xex` and collect its stdout.
///
/// Stdout is drained line by line while the child runs so a large report
/// cannot fill the pipe and stall the tool. Lines are concatenated without
/// their terminators. Blocks until the tool exits; there is no timeout.
pub fn run_tool(tool: &Path, work_dir: &Path) -> Result<String, ExtractionError> {
    if !tool.is_file() {
        return Err(ExtractionError::ToolNotFound(tool.to_path_buf()));
    }

    log::debug!("Running {} {:?} in {}", tool.display(), EXTRACT_ARGS, work_dir.display());
    let mut child = Command::new(tool)
        .args(EXTRACT_ARGS)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ExtractionError::ToolLaunch(e.to_string()))?;

    let mut output = String::new();
    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(line.last(), Some(b'\n' | b'\r')) {
                        line.pop();
                    }
                    output.push_str(&String::from_utf8_lossy(&line));
                }
                Err(e) => {
                    log::warn!("Stopped reading xextool output: {e}");
                    break;
                }
            }
        }
    }

    let status = child
        .wait()
        .map_err(|e| ExtractionError::ToolLaunch(e.to_string()))?;
    log::debug!("xextool exited with {status}, {} bytes of output", output.len());
    Ok(output)
}

// ---------------------------------------------------------------------------
// Output repair
// ---------------------------------------------------------------------------

/// Rewrite every negative numeric character reference `&#-N;` as the
/// unsigned byte with the same two's complement bits, `&#((-N) mod 256);`.
///
/// The result never contains a negative reference, so applying this twice
/// changes nothing.
pub fn repair_char_refs(raw: &str) -> String {
    const OPEN: &str = "&#-";
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find(OPEN) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + OPEN.len()..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();

        if digits > 0 && after.as_bytes().get(digits) == Some(&b';') {
            let _ = write!(out, "&#{};", negative_to_byte(&after[..digits]));
            rest = &after[digits + 1..];
        } else {
            out.push_str(OPEN);
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

/// `(-N) mod 256` for the decimal magnitude `N`, without overflow.
fn negative_to_byte(digits: &str) -> u8 {
    let magnitude = digits
        .bytes()
        .fold(0u32, |acc, d| (acc * 10 + (d - b'0') as u32) % 256);
    ((256 - magnitude) % 256) as u8
}

/// Drop the banner text the tool prints before its XML.
pub fn strip_banner(text: &str) -> Option<&str> {
    text.find('<').map(|start| &text[start..])
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Why the tool output could not be read as a document.
#[derive(Debug, Error)]
pub enum ToolOutputError {
    #[error("no markup in output")]
    NoMarkup,

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("more than one root element")]
    MultipleRoots,

    #[error("text outside the root element")]
    StrayText,
}

#[derive(Debug, Clone)]
struct Element {
    path: String,
    text: String,
}

/// The tool's report, flattened to element paths and their inner text.
///
/// `get("/XexInfo/GameName")` returns the inner text (all descendant text,
/// concatenated) of the first element at that path.
#[derive(Debug, Clone, Default)]
pub struct ToolDocument {
    elements: Vec<Element>,
    first_by_path: HashMap<String, usize>,
}

impl ToolDocument {
    /// Parse repaired tool output; the banner before the first `<` is skipped.
    pub fn parse(text: &str) -> Result<Self, ToolOutputError> {
        let markup = strip_banner(text).ok_or(ToolOutputError::NoMarkup)?;
        let mut reader = Reader::from_str(markup);

        let mut doc = Self::default();
        let mut names: Vec<String> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut saw_root = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if names.is_empty() && saw_root {
                        return Err(ToolOutputError::MultipleRoots);
                    }
                    saw_root = true;
                    names.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    open.push(doc.push_element(&names));
                }
                Event::Empty(e) => {
                    if names.is_empty() && saw_root {
                        return Err(ToolOutputError::MultipleRoots);
                    }
                    saw_root = true;
                    names.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    doc.push_element(&names);
                    names.pop();
                }
                Event::End(_) => {
                    names.pop();
                    open.pop();
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    if open.is_empty() {
                        if !text.trim().is_empty() {
                            return Err(ToolOutputError::StrayText);
                        }
                    } else {
                        doc.append_text(&open, &text);
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    doc.append_text(&open, &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(name) = names.last() {
            return Err(ToolOutputError::Unclosed(name.clone()));
        }
        if !saw_root {
            return Err(ToolOutputError::NoMarkup);
        }
        Ok(doc)
    }

    /// Inner text of the first element at `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.first_by_path
            .get(path)
            .map(|&i| self.elements[i].text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn push_element(&mut self, names: &[String]) -> usize {
        let path = format!("/{}", names.join("/"));
        let index = self.elements.len();
        self.first_by_path.entry(path.clone()).or_insert(index);
        self.elements.push(Element {
            path,
            text: String::new(),
        });
        index
    }

    fn append_text(&mut self, open: &[usize], text: &str) {
        for &i in open {
            self.elements[i].text.push_str(text);
        }
    }

    /// Paths of every element, in document order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.path.as_str())
    }
}

#[cfg(test)]
#[path = "tests/xextool_tests.rs"]
mod tests;
