//! Timer settings read from the configuration store.
//!
//! The store itself is written by an external settings screen; this module only
//! reads and validates what it finds there. Validation runs once when settings
//! are loaded, so the state machine never re-checks quota bounds.

use std::collections::HashMap;

use crate::error::{ApiError, FieldError};

pub const DEFAULT_TIMER_SECONDS: u32 = 60;
pub const DEFAULT_VIEW_QUOTA: u32 = 2;
pub const MIN_VIEW_QUOTA: u32 = 2;
pub const MAX_VIEW_QUOTA: u32 = 10;

/// Option names as stored by the settings screen.
pub mod keys {
    pub const ENABLE_COUNTDOWN_TIMER: &str = "enable_countdown_timer";
    pub const SET_COUNT_TIMER: &str = "set_count_timer";
    pub const VIEW_NUMBER_POST: &str = "view_number_post";
    pub const COMPLETION_CODE: &str = "completion_code";
    pub const RANDOM_POST: &str = "random_post";
    pub const POST_URLS: &str = "post_urls";
    pub const START_BUTTON: &str = "start_button";
    pub const MULTIPLE_TAB: &str = "multiple_tab";
    pub const CHECK_CURRENT_PAGE: &str = "check_currentPage";
    pub const SHOW_VISITED_POST_NUM: &str = "show_visited_post_num";
}

/// Read-only key-value view of the configuration store.
pub trait OptionSource {
    fn option(&self, key: &str) -> Option<String>;
}

impl OptionSource for HashMap<String, String> {
    fn option(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Options taken from the process environment as `PDT_<KEY>` (upper-cased).
pub struct EnvOptions;

impl OptionSource for EnvOptions {
    fn option(&self, key: &str) -> Option<String> {
        std::env::var(format!("PDT_{}", key.to_ascii_uppercase())).ok()
    }
}

/// Where the "next" button sends the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Random,
    UrlList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub timer_enabled: bool,
    pub timer_seconds: u32,
    pub view_quota: u32,
    pub completion_code: String,
    pub redirect_mode: RedirectMode,
    pub url_list: Vec<String>,
    pub require_start_button: bool,
    pub suppress_multiple_tabs: bool,
    pub pause_on_hidden_tab: bool,
    pub show_visit_counter: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timer_enabled: true,
            timer_seconds: DEFAULT_TIMER_SECONDS,
            view_quota: DEFAULT_VIEW_QUOTA,
            completion_code: String::new(),
            redirect_mode: RedirectMode::Random,
            url_list: Vec::new(),
            require_start_button: false,
            suppress_multiple_tabs: false,
            pause_on_hidden_tab: false,
            show_visit_counter: false,
        }
    }
}

impl Settings {
    /// Read and validate settings from the configuration store.
    pub fn load(source: &impl OptionSource) -> Result<Self, ApiError> {
        let mut errors = Vec::new();
        let defaults = Settings::default();

        let timer_seconds = match source.option(keys::SET_COUNT_TIMER) {
            Some(raw) => parse_number(&raw, keys::SET_COUNT_TIMER, &mut errors),
            None => Some(defaults.timer_seconds),
        };
        let view_quota = match source.option(keys::VIEW_NUMBER_POST) {
            Some(raw) => parse_number(&raw, keys::VIEW_NUMBER_POST, &mut errors),
            None => Some(defaults.view_quota),
        };

        let flag = |key: &str, default: bool| {
            source
                .option(key)
                .map(|raw| parse_flag(&raw))
                .unwrap_or(default)
        };

        let url_list = source
            .option(keys::POST_URLS)
            .map(|raw| split_url_list(&raw))
            .unwrap_or_default();
        let random_post = flag(keys::RANDOM_POST, url_list.is_empty());

        let settings = Settings {
            timer_enabled: flag(keys::ENABLE_COUNTDOWN_TIMER, defaults.timer_enabled),
            timer_seconds: timer_seconds.unwrap_or(0),
            view_quota: view_quota.unwrap_or(0),
            completion_code: source
                .option(keys::COMPLETION_CODE)
                .map(|code| code.trim().to_string())
                .unwrap_or_default(),
            redirect_mode: if random_post {
                RedirectMode::Random
            } else {
                RedirectMode::UrlList
            },
            url_list,
            require_start_button: flag(keys::START_BUTTON, defaults.require_start_button),
            suppress_multiple_tabs: flag(keys::MULTIPLE_TAB, defaults.suppress_multiple_tabs),
            pause_on_hidden_tab: flag(keys::CHECK_CURRENT_PAGE, defaults.pause_on_hidden_tab),
            show_visit_counter: flag(keys::SHOW_VISITED_POST_NUM, defaults.show_visit_counter),
        };

        if timer_seconds.is_some() && view_quota.is_some() {
            errors.extend(settings.problems());
        }
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }
        Ok(settings)
    }

    /// Every rule the settings screen enforces on save.
    fn problems(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.timer_seconds == 0 {
            errors.push(field_error(
                keys::SET_COUNT_TIMER,
                "The timer must be a positive number.",
            ));
        }
        if !(MIN_VIEW_QUOTA..=MAX_VIEW_QUOTA).contains(&self.view_quota) {
            errors.push(field_error(
                keys::VIEW_NUMBER_POST,
                "Please select a number between 2 and 10 for the view number post.",
            ));
        }

        match (self.redirect_mode, self.url_list.is_empty()) {
            (RedirectMode::Random, false) => errors.push(field_error(
                keys::RANDOM_POST,
                "Please uncheck the \"Show Random post\" option when using custom URLs.",
            )),
            (RedirectMode::UrlList, true) => errors.push(field_error(
                keys::RANDOM_POST,
                "Please check the \"Show Random Post\" option if you are not entering post URLs.",
            )),
            _ => {}
        }
        if !self.url_list.is_empty() && self.url_list.len() != self.view_quota as usize {
            errors.push(field_error(
                keys::POST_URLS,
                "The number of URLs must match the view number post.",
            ));
        }

        errors
    }
}

/// Split a comma separated URL list, trimming entries and dropping empty ones.
pub fn split_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Checkbox-style flag: `1`, `true`, `yes` and `on` are set.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_number(raw: &str, key: &str, errors: &mut Vec<FieldError>) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(field_error(key, "Must be a whole number."));
            None
        }
    }
}

fn field_error(field: &str, message: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.to_string(),
    }
}
