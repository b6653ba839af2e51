// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Terminal output for the polyrank CLI.
//!
//! OneDark colors on dark terminals, One Light on light ones. The theme comes
//! from `POLYRANK_THEME` ("dark" or "light"), then the `COLORFGBG` hint some
//! terminals set, then defaults to dark. `NO_COLOR` and non-TTY stdout turn
//! color off entirely, so piped output is plain text.

use std::sync::OnceLock;

/// Inner width of a box, between the two border characters.
pub const BOX_WIDTH: usize = 72;

// ═══════════════════════════════════════════════════════════════════════════
// THEME
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

static THEME: OnceLock<Theme> = OnceLock::new();

fn detect_theme() -> Theme {
    if let Ok(theme) = std::env::var("POLYRANK_THEME") {
        match theme.to_lowercase().as_str() {
            "light" | "l" => return Theme::Light,
            "dark" | "d" => return Theme::Dark,
            _ => {}
        }
    }
    // "fg;bg": backgrounds 7 and up, except 8, are light
    if let Ok(colorfgbg) = std::env::var("COLORFGBG") {
        if let Some(Ok(bg)) = colorfgbg.split(';').next_back().map(str::parse::<u8>) {
            if bg >= 7 && bg != 8 {
                return Theme::Light;
            }
        }
    }
    Theme::Dark
}

pub fn theme() -> Theme {
    *THEME.get_or_init(detect_theme)
}

fn rgb((r, g, b): (u8, u8, u8)) -> String {
    format!("\x1b[38;2;{};{};{}m", r, g, b)
}

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

/// A palette entry: (OneDark, One Light).
#[derive(Debug, Clone, Copy)]
pub struct Color((u8, u8, u8), (u8, u8, u8));

pub const RED: Color = Color((224, 108, 117), (228, 86, 73));
pub const GREEN: Color = Color((152, 195, 121), (80, 161, 79));
pub const YELLOW: Color = Color((229, 192, 123), (193, 132, 1));
pub const CYAN: Color = Color((86, 182, 194), (1, 132, 188));
pub const GRAY: Color = Color((92, 99, 112), (160, 161, 167));

impl Color {
    pub fn code(self) -> String {
        match theme() {
            Theme::Dark => rgb(self.0),
            Theme::Light => rgb(self.1),
        }
    }
}

pub fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && atty::is(atty::Stream::Stdout)
}

/// `text` in `color` plus `modifiers` when coloring, plain otherwise.
pub fn paint(color: Color, modifiers: &[&str], text: &str) -> String {
    if use_colors() {
        format!("{}{}{}{}", modifiers.join(""), color.code(), text, RESET)
    } else {
        text.to_string()
    }
}

/// Length as displayed, ignoring ANSI escape sequences.
pub fn visible_len(s: &str) -> usize {
    let mut in_escape = false;
    let mut len = 0;
    for c in s.chars() {
        match c {
            '\x1b' => in_escape = true,
            'm' if in_escape => in_escape = false,
            _ if !in_escape => len += 1,
            _ => {}
        }
    }
    len
}

pub fn pad_left(s: &str, width: usize) -> String {
    format!("{}{}", " ".repeat(width.saturating_sub(visible_len(s))), s)
}

pub fn pad_right(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(visible_len(s))))
}

/// Shorten to `max` visible characters with a trailing ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BOXES
// ═══════════════════════════════════════════════════════════════════════════

fn border(s: &str) -> String {
    paint(GRAY, &[], s)
}

/// `│ content        │`
pub fn row(content: &str) {
    let pad = BOX_WIDTH.saturating_sub(visible_len(content) + 1);
    println!("{} {}{}{}", border("│"), content, " ".repeat(pad), border("│"));
}

/// `┌─ LABEL ─────────┐`
pub fn section_top(label: &str) {
    section_line('┌', '┐', label);
}

/// `├─ LABEL ─────────┤`
pub fn section_mid(label: &str) {
    section_line('├', '┤', label);
}

fn section_line(left: char, right: char, label: &str) {
    let label = format!(" {} ", paint(CYAN, &[BOLD], label));
    let fill = BOX_WIDTH.saturating_sub(visible_len(&label) + 1);
    println!(
        "{}{}{}{}",
        border(&format!("{}─", left)),
        label,
        border(&"─".repeat(fill)),
        border(&right.to_string())
    );
}

/// `└─────────────────┘`
pub fn section_bot() {
    println!("{}", border(&format!("└{}┘", "─".repeat(BOX_WIDTH))));
}

// ═══════════════════════════════════════════════════════════════════════════
// FORMATTERS
// ═══════════════════════════════════════════════════════════════════════════

/// A score with enough precision to tell neighbors apart.
pub fn score_value(score: f64) -> String {
    let text = format!("{:>12.6}", score);
    if score > 0.0 {
        paint(GREEN, &[], &text)
    } else {
        paint(GRAY, &[], &text)
    }
}

/// A metric in [0, 1], colored by how good it is.
pub fn metric_value(value: f64) -> String {
    let text = format!("{:>8.4}", value);
    let color = if value >= 0.5 {
        GREEN
    } else if value >= 0.2 {
        YELLOW
    } else {
        RED
    };
    paint(color, &[BOLD], &text)
}

pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn timing_ms(ms: f64) -> String {
    let text = format!("{:.2} ms", ms);
    let color = if ms < 10.0 {
        GREEN
    } else if ms < 100.0 {
        YELLOW
    } else {
        RED
    };
    paint(color, &[], &text)
}
