use console::style;

use crate::review::ReviewVerdict;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Rating as filled and empty stars, `unrated` for 0
    pub fn rating(&self, rating: u8) -> String {
        if rating == 0 {
            return style("unrated").dim().to_string();
        }
        let filled = "★".repeat(rating as usize);
        let empty = "☆".repeat(5usize.saturating_sub(rating as usize));
        format!("{}{} {}/5", style(filled).yellow(), empty, rating)
    }

    pub fn verdict(&self, verdict: &ReviewVerdict) {
        self.section("Solutions");
        println!("{}", verdict.solutions);
        if !verdict.skills.is_empty() {
            self.section("Skills");
            println!("{}", verdict.skills);
        }
        self.section("Rating");
        println!("{}", self.rating(verdict.rating));
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
