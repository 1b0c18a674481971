//! Terminal status output.
//!
//! Status lines, spinners and progress bars go to stderr in the configured
//! color theme. Stdout is left to the plan report so it can be piped.

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

pub const BANNER: &str = r#"
      _ _                          _
   __| (_)___  ___ _ __   __ _  ___| | __
  / _` | / __|/ __| '_ \ / _` |/ __| |/ /
 | (_| | \__ \ (__| |_) | (_| | (__|   <
  \__,_|_|___/\___| .__/ \__,_|\___|_|\_\
                  |_|"#;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

pub struct UI {
    pub term: Term,
    pub color_theme: String,
    /// Spinners and bars are hidden when false
    pub show_progress: bool,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            color_theme: "default".to_string(),
            show_progress: true,
        }
    }

    pub fn with_color_theme(mut self, theme: String) -> Self {
        self.color_theme = theme;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Get the console::Style for the configured theme
    fn get_style(&self) -> Style {
        match self.color_theme.as_str() {
            "cyan" => Style::new().cyan(),
            "magenta" => Style::new().magenta(),
            "yellow" => Style::new().yellow(),
            "green" => Style::new().green(),
            "red" => Style::new().red(),
            "blue" => Style::new().blue(),
            _ => Style::new().white(),
        }
    }

    /// Get different shades for status codes based on theme
    /// Returns (info_style, warning_style, error_style, success_style)
    fn get_status_styles(&self) -> (Style, Style, Style, Style) {
        match self.color_theme.as_str() {
            "cyan" => (
                Style::new().cyan(),
                Style::new().color256(51),
                Style::new().color256(87),
                Style::new().color256(123),
            ),
            "magenta" => (
                Style::new().magenta(),
                Style::new().color256(201),
                Style::new().color256(126),
                Style::new().color256(213),
            ),
            "yellow" => (
                Style::new().yellow(),
                Style::new().color256(226),
                Style::new().color256(178),
                Style::new().color256(227),
            ),
            "green" => (
                Style::new().green(),
                Style::new().color256(46),
                Style::new().color256(28),
                Style::new().color256(120),
            ),
            "red" => (
                Style::new().red(),
                Style::new().color256(196),
                Style::new().color256(124),
                Style::new().color256(210),
            ),
            "blue" => (
                Style::new().blue(),
                Style::new().color256(39),
                Style::new().color256(25),
                Style::new().color256(117),
            ),
            _ => (
                Style::new().white(),
                Style::new().color256(255),
                Style::new().color256(250),
                Style::new().color256(255),
            ),
        }
    }

    /// Get bar colors (spinner_color, bar_color) for progress bar templates
    fn get_bar_colors(&self) -> (&str, &str) {
        match self.color_theme.as_str() {
            "cyan" => (".cyan", "bright_cyan/bright_cyan"),
            "magenta" => (".magenta", "bright_magenta/bright_magenta"),
            "yellow" => (".yellow", "bright_yellow/bright_yellow"),
            "green" => (".green", "bright_green/bright_green"),
            "red" => (".red", "bright_red/bright_red"),
            "blue" => (".blue", "bright_blue/bright_blue"),
            _ => (".white", "bright_white/bright_white"),
        }
    }

    /// Print the banner followed by a bold section title
    pub fn print_header(&self, title: &str) -> io::Result<()> {
        let white_bold = Style::new().white().bold();

        self.term
            .write_line(&self.get_style().apply_to(BANNER).bold().to_string())?;
        self.term.write_line("")?;
        self.term
            .write_line(&white_bold.apply_to("=".repeat(70)).to_string())?;
        self.term.write_line(&format!(
            "{} {}",
            self.get_style().apply_to("PLAN:").bold(),
            white_bold.apply_to(title).italic()
        ))?;
        self.term
            .write_line(&white_bold.apply_to("=".repeat(70)).to_string())?;
        Ok(())
    }

    /// Create a spinner for work of unknown length
    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        let (spinner_color, _) = self.get_bar_colors();
        let style = ProgressStyle::default_spinner()
            .template(&format!("{{spinner:{}}} {{msg}}", spinner_color))
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS);
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Create a progress bar with known total
    pub fn create_progress_bar(&self, total: u64, message: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        let (spinner_color, bar_color) = self.get_bar_colors();
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:{}}} {{bar:40.{}}} {{pos}}/{{len}} ({{percent}}%) {{msg}}",
                spinner_color, bar_color
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█ ")
            .tick_chars(TICK_CHARS);
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    fn status_line(&self, tag: &str, style: Style, message: &str) -> io::Result<()> {
        let white_bold = Style::new().white().bold();
        self.term.write_line(&format!(
            "{} {}",
            style.apply_to(tag).bold(),
            white_bold.apply_to(message)
        ))
    }

    /// Print an info message
    pub fn print_info(&self, message: &str) -> io::Result<()> {
        let (info_style, _, _, _) = self.get_status_styles();
        self.status_line("[*]", info_style, message)
    }

    /// Print a success message
    pub fn print_success(&self, message: &str) -> io::Result<()> {
        let (_, _, _, success_style) = self.get_status_styles();
        self.status_line("[✓]", success_style, message)
    }

    /// Print a warning message
    pub fn print_warning(&self, message: &str) -> io::Result<()> {
        let (_, warning_style, _, _) = self.get_status_styles();
        self.status_line("[!] WARNING:", warning_style, message)
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate a path for a progress line, keeping both ends and respecting
/// UTF-8 character boundaries.
pub fn safe_truncate_path(path: &str, max_len: usize) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= max_len || max_len < 5 {
        return path.to_string();
    }

    let keep = max_len - 3;
    let prefix_len = keep / 2;
    let suffix_len = keep - prefix_len;

    let prefix: String = chars.iter().take(prefix_len).collect();
    let suffix: String = chars.iter().skip(chars.len() - suffix_len).collect();

    format!("{}...{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_path_untouched() {
        assert_eq!(safe_truncate_path("/a/b.mkv", 62), "/a/b.mkv");
    }

    #[test]
    fn test_truncate_keeps_both_ends() {
        let path = format!("/media/{}/episode.mkv", "x".repeat(100));
        let short = safe_truncate_path(&path, 40);

        assert_eq!(short.chars().count(), 40);
        assert!(short.starts_with("/media/"));
        assert!(short.ends_with("episode.mkv"));
        assert!(short.contains("..."));
    }

    #[test]
    fn test_truncate_multibyte() {
        let path = "ディスク".repeat(30);
        let short = safe_truncate_path(&path, 20);

        assert_eq!(short.chars().count(), 20);
    }

    #[test]
    fn test_hidden_progress() {
        let ui = UI::new().with_progress(false);

        assert!(ui.create_spinner("scanning").is_hidden());
        assert!(ui.create_progress_bar(10, "staging").is_hidden());
    }
}
