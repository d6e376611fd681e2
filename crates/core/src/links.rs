//! Link detection for chat messages.
//!
//! Two URL classes are recognised, tested in a fixed order: trivia form
//! links first, shared folder links second. The first class that matches
//! wins, so a message never classifies as both.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::link::LinkKind;

pub const COMMAND_MARKER: &str = "??";

const FORM_PATTERN: &str = r"https://docs\.google\.com/forms/\S*|https://forms\.gle/\S*";
const FOLDER_PATTERN: &str = r"https://drive\.google\.com/drive/folders/\S*\?usp=sharing";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkMatch {
    pub kind: LinkKind,
    pub url: String,
}

fn form_regex() -> &'static Regex {
    static FORM: OnceLock<Regex> = OnceLock::new();
    FORM.get_or_init(|| Regex::new(FORM_PATTERN).expect("form pattern is valid"))
}

fn folder_regex() -> &'static Regex {
    static FOLDER: OnceLock<Regex> = OnceLock::new();
    FOLDER.get_or_init(|| Regex::new(FOLDER_PATTERN).expect("folder pattern is valid"))
}

pub fn classify(text: &str) -> Option<LinkMatch> {
    if let Some(found) = form_regex().find(text) {
        return Some(LinkMatch { kind: LinkKind::Form, url: found.as_str().to_owned() });
    }

    folder_regex()
        .find(text)
        .map(|found| LinkMatch { kind: LinkKind::Folder, url: found.as_str().to_owned() })
}

pub fn is_command(text: &str) -> bool {
    is_command_with_marker(text, COMMAND_MARKER)
}

pub fn is_command_with_marker(text: &str, marker: &str) -> bool {
    text.split_whitespace().next().is_some_and(|token| token.starts_with(marker))
}
